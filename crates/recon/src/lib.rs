//! `pogkit-recon`: bundle and category reconciliation engine.
//!
//! Pure engine crate: takes raw table and archive bytes, returns an
//! [`OperationResult`] with the rewritten archive, counts and issues.
//! No filesystem access.

pub mod builders;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod issue;
pub mod model;
pub mod normalize;
pub mod report;

mod append;
mod category;
mod combined;
mod create;
mod expire;

pub use config::EngineConfig;
pub use document::{BundleKind, CategoryDocument, GroupDocument, OfferingEntry};
pub use engine::run;
pub use error::ReconError;
pub use issue::{Issue, IssueKind, Severity};
pub use model::{AddTarget, CreateTarget, Details, OperationRequest, OperationResult, SkipDetail, SkipReason};
