//! Specification item tracing
//!
//! Specification items (requirements, designs, implementations, tests, ...)
//! reference each other. This crate resolves those references, classifies
//! each resulting link and computes which of the artifact types an item needs
//! coverage from are actually covered.

pub mod domain;
pub use domain::{
    Config, Coverage, Direction, Identifier, ItemStatus, LinkKind, LinkStatus, LinkedItem,
    MalformedInputError, SpecificationItem, Trace, TracedLink,
};

pub mod export;
pub use export::{ExportRecord, ImportError};

pub mod report;
pub use report::{Newline, ReportFormat, Verbosity};
