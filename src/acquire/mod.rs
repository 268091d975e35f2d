//! Resilient acquisition: bounded retries per source, ordered fallback across
//! sources.

pub mod chain;
pub mod retry;

pub use chain::{ChainState, FetchAttemptOutcome, SourceChain};
pub use retry::RetryPolicy;
