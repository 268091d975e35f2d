//! Caller-facing operations tying acquisition, storage and fusion together.

use crate::acquire::{RetryPolicy, SourceChain};
use crate::composite::CompositeSynthesizer;
use crate::core::config::{AppConfig, FamilyConfig};
use crate::core::weights::KNOWN_FAMILIES;
use crate::core::{AcquireError, DocumentFetcher, FusionError, IndexRecord, StoreError};
use crate::fallback::MockFallbackGenerator;
use crate::fusion::{CargoAdjustment, ContainerClass, RateEstimate, RateFusionEngine, route_candidates};
use crate::store::{IndexStore, UpsertReport};
use chrono::NaiveDate;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What one family refresh produced.
#[derive(Debug, Clone)]
pub struct AcquisitionReport {
    pub family: String,
    pub records: Vec<IndexRecord>,
    /// Records are mock data; they were not persisted.
    pub degraded: bool,
    pub stored: Option<UpsertReport>,
    pub store_error: Option<String>,
}

pub struct FreightIndexService {
    config: AppConfig,
    store: IndexStore,
    fetcher: Arc<dyn DocumentFetcher>,
    engine: RateFusionEngine,
    fallback: MockFallbackGenerator,
}

impl FreightIndexService {
    pub fn new(config: AppConfig, store: IndexStore, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        let adjustment = CargoAdjustment::new(
            config.fusion.underweight_discount,
            config.fusion.overweight_premium,
        );
        let max_known_families = if config.families.is_empty() {
            KNOWN_FAMILIES.len()
        } else {
            config.families.len()
        };
        let engine = RateFusionEngine::new(config.fusion.family_weights(), max_known_families)
            .with_adjustment(adjustment);
        let fallback = MockFallbackGenerator::new(adjustment, engine.band());

        Self {
            config,
            store,
            fetcher,
            engine,
            fallback,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    fn family(&self, name: &str) -> Result<&FamilyConfig, AcquireError> {
        self.config
            .family(name)
            .ok_or_else(|| AcquireError::UnknownFamily(name.to_string()))
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.retry.max_retries, self.config.retry_delay())
    }

    /// Runs the family's source chain and completes the result with a
    /// composite entry when the source published none.
    pub async fn acquire(
        &self,
        family: &str,
        today: NaiveDate,
    ) -> Result<Vec<IndexRecord>, AcquireError> {
        let family = self.family(family)?;
        let records = SourceChain::new(family, self.fetcher.as_ref(), self.retry_policy(), today)
            .run()
            .await?;

        let weights = family.route_weights();
        let label = format!("{} Composite", family.name.to_uppercase());
        Ok(CompositeSynthesizer::new(&weights, label).synthesize(records))
    }

    /// Acquires a family and persists the result unless `dry_run`.
    ///
    /// Exhausted sources degrade to mock records, which are returned but never
    /// stored. A storage failure is reported alongside the fresh records
    /// instead of discarding them.
    pub async fn refresh(
        &self,
        family: &str,
        today: NaiveDate,
        dry_run: bool,
    ) -> Result<AcquisitionReport, AcquireError> {
        let (records, degraded) = match self.acquire(family, today).await {
            Ok(records) => (records, false),
            Err(err @ AcquireError::ExhaustedSources { .. }) => {
                warn!("{}; falling back to mock data", err);
                let config = self.family(family)?;
                (self.fallback.records(config, today), true)
            }
            Err(err) => return Err(err),
        };

        let mut report = AcquisitionReport {
            family: family.to_lowercase(),
            records,
            degraded,
            stored: None,
            store_error: None,
        };
        if degraded || dry_run {
            debug!("Not persisting {} records", report.family);
            return Ok(report);
        }

        match self.store.upsert(&report.family, &report.records).await {
            Ok(stored) => report.stored = Some(stored),
            Err(err) => {
                warn!("Failed to persist {} records: {}", report.family, err);
                report.store_error = Some(err.to_string());
            }
        }
        Ok(report)
    }

    pub async fn latest(
        &self,
        family: &str,
        candidates: &[String],
    ) -> Result<Option<IndexRecord>, StoreError> {
        self.store.latest_by_route(family, candidates).await
    }

    /// Latest value of each configured family for the lane, read concurrently.
    /// A family whose read fails counts as having no data.
    pub async fn lane_readings(
        &self,
        origin: &str,
        destination: &str,
    ) -> Vec<(String, Option<f64>)> {
        let candidates = route_candidates(origin, destination);
        let reads = self.config.families.iter().map(|family| {
            let candidates = &candidates;
            async move {
                let name = family.name.to_lowercase();
                let value = match self.store.latest_by_route(&name, candidates).await {
                    Ok(record) => record.map(|r| r.current_index),
                    Err(err) => {
                        warn!("Failed to read latest {} value: {}", name, err);
                        None
                    }
                };
                debug!("Latest {} value for {} -> {}: {:?}", name, origin, destination, value);
                (name, value)
            }
        });
        join_all(reads).await
    }

    /// Fused rate for a lane. Falls back to a baseline estimate when no
    /// family has data.
    pub async fn estimate_rate(
        &self,
        origin: &str,
        destination: &str,
        class: ContainerClass,
        weight_tons: Option<f64>,
    ) -> RateEstimate {
        let readings = self.lane_readings(origin, destination).await;
        match self.engine.estimate(&readings, class, weight_tons) {
            Ok(estimate) => {
                info!(
                    "Estimated {} -> {} at {:.2} from {} families",
                    origin,
                    destination,
                    estimate.point_estimate,
                    estimate.contributing_sources.len()
                );
                estimate
            }
            Err(FusionError::NoSourceData) => {
                self.fallback
                    .baseline_estimate(origin, destination, class, weight_tons)
            }
        }
    }
}
