use std::{cmp::Ordering, fmt, str::FromStr};

use non_empty_string::NonEmptyString;

/// Separator between the segments of an identifier's string form.
pub const SEPARATOR: char = '~';

/// A validated identifier segment (item name or artifact type).
///
/// Segments are non-empty and never contain the [`SEPARATOR`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Segment(NonEmptyString);

impl Segment {
    fn new(s: String) -> Option<Self> {
        if s.contains(SEPARATOR) {
            return None;
        }
        NonEmptyString::new(s).ok().map(Self)
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity of a specification item.
///
/// An identifier is made of a name, an artifact type (e.g. `req`, `dsn`,
/// `utest`) and a revision. The revision may be left unspecified, in which
/// case the identifier acts as a wildcard when used as a reference target.
///
/// The canonical string form is `{TYPE}~{NAME}~{REVISION}`, or
/// `{TYPE}~{NAME}` for an unspecified revision.
///
/// Identifiers are ordered by name, then artifact type, then revision. An
/// unspecified revision sorts before any explicit revision.
///
/// ```
/// use spectrace::Identifier;
///
/// let id = Identifier::new("Req-1", "req", 2).unwrap();
/// assert_eq!(id.to_string(), "req~Req-1~2");
///
/// let wildcard: Identifier = "req~Req-1".parse().unwrap();
/// assert!(wildcard.is_wildcard());
/// assert!(wildcard.matches(&id));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    name: Segment,
    artifact_type: Segment,
    revision: Option<u32>,
}

impl Identifier {
    /// Create an identifier with an explicit revision.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or artifact type is empty or contains the
    /// `~` separator.
    pub fn new(
        name: impl Into<String>,
        artifact_type: impl Into<String>,
        revision: u32,
    ) -> Result<Self, Error> {
        Self::from_parts(name, artifact_type, Some(revision))
    }

    /// Create an identifier whose revision is unspecified.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or artifact type is empty or contains the
    /// `~` separator.
    pub fn any_revision(
        name: impl Into<String>,
        artifact_type: impl Into<String>,
    ) -> Result<Self, Error> {
        Self::from_parts(name, artifact_type, None)
    }

    /// Create an identifier from its parts.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or artifact type is empty or contains the
    /// `~` separator.
    pub fn from_parts(
        name: impl Into<String>,
        artifact_type: impl Into<String>,
        revision: Option<u32>,
    ) -> Result<Self, Error> {
        let name = name.into();
        let artifact_type = artifact_type.into();

        let name = Segment::new(name.clone()).ok_or(Error::Name(name))?;
        let artifact_type = Segment::new(artifact_type.clone())
            .ok_or_else(|| Error::ArtifactType(name.to_string(), artifact_type))?;

        Ok(Self {
            name,
            artifact_type,
            revision,
        })
    }

    /// The item name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// The artifact type.
    #[must_use]
    pub fn artifact_type(&self) -> &str {
        self.artifact_type.as_str()
    }

    /// The revision, or `None` if unspecified.
    #[must_use]
    pub const fn revision(&self) -> Option<u32> {
        self.revision
    }

    /// Whether the revision is unspecified.
    #[must_use]
    pub const fn is_wildcard(&self) -> bool {
        self.revision.is_none()
    }

    /// Revision used when ranking candidates. Unspecified counts as zero.
    pub(crate) fn rank(&self) -> u32 {
        self.revision.unwrap_or_default()
    }

    /// Whether both identifiers share name and artifact type.
    #[must_use]
    pub fn same_item(&self, other: &Self) -> bool {
        self.name == other.name && self.artifact_type == other.artifact_type
    }

    /// Whether this identifier, used as a reference, is satisfied by `other`.
    ///
    /// A wildcard matches any revision of the same item, an explicit revision
    /// requires an exact match.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.same_item(other) && (self.revision.is_none() || self.revision == other.revision)
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.artifact_type.cmp(&other.artifact_type))
            .then_with(|| self.revision.cmp(&other.revision))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.artifact_type, self.name)?;
        if let Some(revision) = self.revision {
            write!(f, "{SEPARATOR}{revision}")?;
        }
        Ok(())
    }
}

/// Errors that can occur when parsing or constructing an [`Identifier`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The name is empty or contains the separator.
    #[error("Invalid identifier name '{0}': must be non-empty and must not contain '~'")]
    Name(String),

    /// The artifact type is empty or contains the separator.
    #[error(
        "Invalid artifact type '{1}' for item '{0}': must be non-empty and must not contain '~'"
    )]
    ArtifactType(String, String),

    /// Malformed string form.
    #[error("Invalid identifier format: {0}")]
    Syntax(String),

    /// The revision segment is not a non-negative integer.
    #[error("Invalid revision in identifier '{0}': expected a non-negative integer, got {1}")]
    Revision(String, String),
}

impl FromStr for Identifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(SEPARATOR).collect();

        match parts.as_slice() {
            [artifact_type, name] => Self::any_revision(*name, *artifact_type),
            [artifact_type, name, revision] => {
                let revision = revision
                    .parse::<u32>()
                    .map_err(|_| Error::Revision(s.to_string(), (*revision).to_string()))?;
                Self::new(*name, *artifact_type, revision)
            }
            _ => Err(Error::Syntax(s.to_string())),
        }
    }
}

impl TryFrom<&str> for Identifier {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value)
    }
}
