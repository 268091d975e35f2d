//! Core types and abstractions

pub mod config;
pub mod error;
pub mod fetch;
pub mod log;
pub mod record;
pub mod weights;

// Re-export main types for cleaner imports
pub use error::{AcquireError, FusionError, StoreError};
pub use fetch::{DocumentFetcher, FetchedDocument};
pub use record::{IndexRecord, IndexUnit};
pub use weights::{FamilyWeights, RouteWeightTable};
