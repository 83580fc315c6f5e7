//! Domain models for specification tracing.
//!
//! This module contains the core domain types: identifiers, specification
//! items, the link model, coverage classification and the resulting trace.

/// Identifier types and parsing.
pub mod identifier;
pub use identifier::{Error as IdentifierError, Identifier};

mod item;
pub use item::{
    Builder as ItemBuilder, EmptyNeedError, ItemStatus, LinkKind, Reference, SpecificationItem,
    UnknownStatusError,
};

mod config;
pub use config::{Config, ConfigError};

/// Links between items and their status.
pub mod link;
pub use link::{Direction, ItemId, Link, LinkId, LinkStatus};

mod coverage;
pub use coverage::Coverage;

mod resolver;

/// The trace: linked items and the aggregate verdict.
pub mod trace;
pub use trace::{LinkedItem, MalformedInputError, Trace, TracedLink};
