//! Deterministic stand-in data for when no real index data can be had.

use crate::composite::CompositeSynthesizer;
use crate::core::config::FamilyConfig;
use crate::core::record::{DEFAULT_PUBLICATION_GAP_DAYS, round_to};
use crate::core::weights::COMPOSITE_WEIGHTING;
use crate::core::{IndexRecord, IndexUnit};
use crate::fusion::{BASELINE_SOURCE, CargoAdjustment, ContainerClass, RateEstimate};
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;
use tracing::warn;

const BASELINE_RANGE: Range<f64> = 1200.0..3800.0;
const BASELINE_RELIABILITY: Range<f64> = 0.70..0.90;
/// Largest relative week-on-week move of a mock reading.
const MAX_MOCK_CHANGE: f64 = 0.05;

fn plausible_range(unit: IndexUnit) -> Range<f64> {
    match unit {
        IndexUnit::Points => 800.0..2500.0,
        IndexUnit::PerTeu => 800.0..3000.0,
        IndexUnit::PerFeu => 1500.0..6000.0,
    }
}

/// FNV-1a, stable across runs and platforms.
fn stable_seed(parts: &[&str]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for part in parts {
        for byte in part.to_lowercase().bytes().chain(std::iter::once(0)) {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
    }
    hash
}

pub struct MockFallbackGenerator {
    adjustment: CargoAdjustment,
    band: f64,
}

impl Default for MockFallbackGenerator {
    fn default() -> Self {
        Self::new(CargoAdjustment::default(), 0.2)
    }
}

impl MockFallbackGenerator {
    pub fn new(adjustment: CargoAdjustment, band: f64) -> Self {
        Self { adjustment, band }
    }

    /// Mock readings for every route of the family plus a composite. The same
    /// family and date always produce the same records.
    pub fn records(&self, family: &FamilyConfig, on: NaiveDate) -> Vec<IndexRecord> {
        let weights = family.route_weights();
        let unit = family.default_unit();
        let date_key = on.to_string();
        let mut rng = StdRng::seed_from_u64(stable_seed(&[&family.name, &date_key]));
        let previous_date = on - Duration::days(DEFAULT_PUBLICATION_GAP_DAYS);

        let mut mock = |route: &str, weighting: f64| {
            let current = round_to(rng.gen_range(plausible_range(unit)), 2);
            let change = round_to(current * rng.gen_range(-MAX_MOCK_CHANGE..=MAX_MOCK_CHANGE), 2);
            IndexRecord::from_change(route, unit, current, change, previous_date, on)
                .with_weighting(weighting)
        };
        let label = format!("{} Comprehensive Index", family.name.to_uppercase());

        if weights.is_empty() {
            return vec![mock(&label, COMPOSITE_WEIGHTING)];
        }
        let routes: Vec<IndexRecord> = weights
            .keywords()
            .map(|route| mock(route, weights.weighting_of(route)))
            .collect();

        warn!(
            "Generated {} mock {} record(s) for {}",
            routes.len(),
            family.name,
            on
        );
        CompositeSynthesizer::new(&weights, label).synthesize(routes)
    }

    /// Placeholder estimate for a lane with no index data at all.
    pub fn baseline_estimate(
        &self,
        origin: &str,
        destination: &str,
        class: ContainerClass,
        weight_tons: Option<f64>,
    ) -> RateEstimate {
        let mut rng = StdRng::seed_from_u64(stable_seed(&[origin, destination, class.as_str()]));
        let point = rng.gen_range(BASELINE_RANGE);
        // Floored to two decimals, never reaching 0.9.
        let reliability = ((rng.gen_range(BASELINE_RELIABILITY) * 100.0).floor() / 100.0)
            .clamp(BASELINE_RELIABILITY.start, 0.89);

        warn!(
            "No index data for {} -> {}, using baseline estimate",
            origin, destination
        );
        RateEstimate {
            point_estimate: point,
            min_bound: point * (1.0 - self.band),
            max_bound: point * (1.0 + self.band),
            reliability,
            contributing_sources: [BASELINE_SOURCE.to_string()].into_iter().collect(),
        }
        .scaled(self.adjustment.factor(class, weight_tons))
    }
}
