use super::retry::RetryPolicy;
use crate::core::config::{FamilyConfig, SourceDescriptor};
use crate::core::{AcquireError, DocumentFetcher, IndexRecord};
use crate::extract::{ExtractContext, Extractor};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

/// Result of running one source through its retries.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchAttemptOutcome {
    pub success: bool,
    pub records: Vec<IndexRecord>,
    pub error: Option<String>,
}

impl FetchAttemptOutcome {
    pub fn from_result(result: Result<Vec<IndexRecord>, AcquireError>) -> Self {
        match result {
            Ok(records) => Self {
                success: !records.is_empty(),
                records,
                error: None,
            },
            Err(err) => Self {
                success: false,
                records: Vec::new(),
                error: Some(err.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChainState {
    Pending,
    TryingSource(usize),
    Succeeded(Vec<IndexRecord>),
    Exhausted,
}

impl ChainState {
    /// Leaves `Pending` for the first source, or straight to `Exhausted`
    /// when there is none.
    pub fn start(source_count: usize) -> ChainState {
        if source_count == 0 {
            ChainState::Exhausted
        } else {
            ChainState::TryingSource(0)
        }
    }

    /// Applies the outcome of the source currently being tried. Terminal
    /// states absorb every outcome.
    pub fn advance(self, outcome: FetchAttemptOutcome, source_count: usize) -> ChainState {
        match self {
            ChainState::Pending => ChainState::start(source_count),
            ChainState::TryingSource(_) if outcome.success && !outcome.records.is_empty() => {
                ChainState::Succeeded(outcome.records)
            }
            ChainState::TryingSource(i) if i + 1 < source_count => ChainState::TryingSource(i + 1),
            ChainState::TryingSource(_) => ChainState::Exhausted,
            terminal => terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ChainState::Succeeded(_) | ChainState::Exhausted)
    }
}

/// Ordered sources of one family, tried one after the other until one yields
/// records.
pub struct SourceChain<'a> {
    family: &'a FamilyConfig,
    fetcher: &'a dyn DocumentFetcher,
    retry: RetryPolicy,
    fetched_on: NaiveDate,
}

impl<'a> SourceChain<'a> {
    pub fn new(
        family: &'a FamilyConfig,
        fetcher: &'a dyn DocumentFetcher,
        retry: RetryPolicy,
        fetched_on: NaiveDate,
    ) -> Self {
        Self {
            family,
            fetcher,
            retry,
            fetched_on,
        }
    }

    async fn try_source(
        &self,
        source: &SourceDescriptor,
        ctx: &ExtractContext<'_>,
    ) -> Result<Vec<IndexRecord>, AcquireError> {
        self.retry
            .attempt(
                &source.name,
                move || async move {
                    let document = self.fetcher.fetch(&source.locator).await?;
                    let body = document.into_success(&source.locator)?;
                    source.strategy.extract(&body, ctx)
                },
                |records: &Vec<IndexRecord>| !records.is_empty(),
            )
            .await
    }

    pub async fn run(&self) -> Result<Vec<IndexRecord>, AcquireError> {
        let sources = self.family.ordered_sources();
        let weights = self.family.route_weights();
        let default_unit = self.family.default_unit();

        let mut state = ChainState::start(sources.len());
        while let ChainState::TryingSource(i) = state {
            let source = &sources[i];
            let ctx = ExtractContext {
                source_name: &source.name,
                default_unit,
                route_weights: &weights,
                fetched_on: self.fetched_on,
            };
            debug!(
                "Trying source {}/{} for {}: {}",
                i + 1,
                sources.len(),
                self.family.name,
                source.name
            );

            let outcome = FetchAttemptOutcome::from_result(self.try_source(source, &ctx).await);
            if let Some(error) = &outcome.error {
                warn!("Source {} failed for {}: {}", source.name, self.family.name, error);
            }
            state = state.advance(outcome, sources.len());
        }

        match state {
            ChainState::Succeeded(records) => {
                info!(
                    "Acquired {} {} record(s)",
                    records.len(),
                    self.family.name
                );
                Ok(records)
            }
            _ => Err(AcquireError::ExhaustedSources {
                family: self.family.name.clone(),
                tried: sources.len(),
            }),
        }
    }
}
