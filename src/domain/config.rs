use std::{
    collections::{BTreeMap, BTreeSet},
    io,
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::report::Verbosity;

/// Configuration for tracing.
///
/// The central piece of configuration is the *needs table*: for each artifact
/// type, the set of artifact types that must cover items of that type. The
/// table is merged with the needs each item declares itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Artifact type → artifact types required to cover it.
    needs: BTreeMap<String, BTreeSet<String>>,

    /// Verbosity used by reports when none is given explicitly.
    default_verbosity: Verbosity,
}

/// Errors that can occur when loading or saving a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("Failed to access config file: {0}")]
    Io(#[from] io::Error),
    /// The file is not valid TOML, or has the wrong shape.
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// The configuration could not be serialized.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Artifact types that must cover items of the given type.
    ///
    /// Returns an empty set if the table has no entry for the type.
    #[must_use]
    pub fn needs_for(&self, artifact_type: &str) -> &BTreeSet<String> {
        static EMPTY: BTreeSet<String> = BTreeSet::new();
        self.needs.get(artifact_type).unwrap_or(&EMPTY)
    }

    /// The full needs table.
    #[must_use]
    pub const fn needs(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.needs
    }

    /// Require items of `artifact_type` to be covered by `covering_type`.
    ///
    /// Returns `true` if the rule was added, `false` if it already existed.
    pub fn add_need(&mut self, artifact_type: impl Into<String>, covering_type: impl Into<String>) -> bool {
        self.needs
            .entry(artifact_type.into())
            .or_default()
            .insert(covering_type.into())
    }

    /// Remove a coverage rule.
    ///
    /// Returns `true` if the rule was removed, `false` if it didn't exist.
    pub fn remove_need(&mut self, artifact_type: &str, covering_type: &str) -> bool {
        let Some(covering) = self.needs.get_mut(artifact_type) else {
            return false;
        };
        let removed = covering.remove(covering_type);
        if covering.is_empty() {
            self.needs.remove(artifact_type);
        }
        removed
    }

    /// The verbosity reports use by default.
    #[must_use]
    pub const fn default_verbosity(&self) -> Verbosity {
        self.default_verbosity
    }

    /// Sets the default report verbosity.
    pub const fn set_default_verbosity(&mut self, verbosity: Verbosity) {
        self.default_verbosity = verbosity;
    }

    /// The first empty artifact type found in the needs table, if any.
    pub(crate) fn find_empty_type(&self) -> Option<&str> {
        self.needs.iter().find_map(|(artifact_type, covering)| {
            if artifact_type.is_empty() || covering.iter().any(String::is_empty) {
                Some(artifact_type.as_str())
            } else {
                None
            }
        })
    }
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        needs: BTreeMap<String, BTreeSet<String>>,

        #[serde(default)]
        default_verbosity: Verbosity,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                needs,
                default_verbosity,
            } => Self {
                needs,
                default_verbosity,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            needs: config.needs,
            default_verbosity: config.default_verbosity,
        }
    }
}
