//! metadiff - Reconciliation engine for curated sample metadata
//!
//! A library for comparing two versions of a contributed sample-metadata
//! table with type-aware, tolerance-based field comparison, and for
//! maintaining the per-sample exception overlay (`okexcept`) that marks
//! failing fields as accepted by a curator.

pub mod config;
pub mod diff;
pub mod error;
pub mod model;
pub mod output;
pub mod overlay;
pub mod parser;

pub use config::{JoinMode, Projection, ReconcileOptions, DEFAULT_TOLERANCE};
pub use diff::{reconcile, ReconciliationReport};
pub use error::{MetadiffError, Result};
pub use model::Table;
