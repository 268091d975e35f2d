//! Fusion of independent index families into one rate estimate.
//!
//! Each family contributes its latest stored reading for a lane. The engine
//! takes the family-weighted mean as the point estimate, bounds it by one
//! sample standard deviation clamped to a fixed band around the mean, and
//! scores reliability from coverage and dispersion. A cargo-weight factor is
//! applied last, to the point estimate and both bounds alike.

pub mod cargo;
pub mod lanes;

use crate::core::record::round_to;
use crate::core::weights::KNOWN_FAMILIES;
use crate::core::{FamilyWeights, FusionError};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

pub use cargo::{CargoAdjustment, ContainerClass};
pub use lanes::route_candidates;

/// Marks estimates not backed by any index data.
pub const BASELINE_SOURCE: &str = "baseline";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateEstimate {
    pub point_estimate: f64,
    pub min_bound: f64,
    pub max_bound: f64,
    pub reliability: f64,
    pub contributing_sources: BTreeSet<String>,
}

impl RateEstimate {
    pub fn is_degraded(&self) -> bool {
        self.contributing_sources.contains(BASELINE_SOURCE)
    }

    /// Scales the estimate and both bounds by the same factor.
    pub fn scaled(mut self, factor: f64) -> Self {
        self.point_estimate *= factor;
        self.min_bound *= factor;
        self.max_bound *= factor;
        self
    }
}

/// Tunable constants of the fusion heuristics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionParameters {
    /// Reliability of a single, maximally dispersed reading.
    pub reliability_floor: f64,
    /// Reliability gained from full coverage with no dispersion.
    pub reliability_span: f64,
    /// Coefficient of variation at which dispersion stops lowering reliability.
    pub cv_cap: f64,
    /// Maximum relative distance of a bound from the mean.
    pub band: f64,
}

impl Default for FusionParameters {
    fn default() -> Self {
        Self {
            reliability_floor: 0.7,
            reliability_span: 0.3,
            cv_cap: 0.5,
            band: 0.2,
        }
    }
}

pub struct RateFusionEngine {
    family_weights: FamilyWeights,
    max_known_families: usize,
    params: FusionParameters,
    adjustment: CargoAdjustment,
}

impl Default for RateFusionEngine {
    fn default() -> Self {
        Self::new(FamilyWeights::default(), KNOWN_FAMILIES.len())
    }
}

impl RateFusionEngine {
    pub fn new(family_weights: FamilyWeights, max_known_families: usize) -> Self {
        Self {
            family_weights,
            max_known_families: max_known_families.max(1),
            params: FusionParameters::default(),
            adjustment: CargoAdjustment::default(),
        }
    }

    pub fn with_parameters(mut self, params: FusionParameters) -> Self {
        self.params = params;
        self
    }

    pub fn with_adjustment(mut self, adjustment: CargoAdjustment) -> Self {
        self.adjustment = adjustment;
        self
    }

    pub fn adjustment(&self) -> &CargoAdjustment {
        &self.adjustment
    }

    pub fn band(&self) -> f64 {
        self.params.band
    }

    /// Fuses the latest value of each family, before any cargo adjustment.
    pub fn fuse(&self, readings: &[(String, Option<f64>)]) -> Result<RateEstimate, FusionError> {
        let usable: Vec<(&str, f64)> = readings
            .iter()
            .filter_map(|(family, value)| {
                value
                    .filter(|v| v.is_finite() && *v > 0.0)
                    .map(|v| (family.as_str(), v))
            })
            .collect();
        if usable.is_empty() {
            return Err(FusionError::NoSourceData);
        }

        let (weighted_sum, total_weight) =
            usable
                .iter()
                .fold((0.0, 0.0), |(sum, total), (family, value)| {
                    let weight = self.family_weights.weight_of(family);
                    (sum + value * weight, total + weight)
                });
        let mean = weighted_sum / total_weight;
        let values: Vec<f64> = usable.iter().map(|(_, v)| *v).collect();
        let sd = sample_std_dev(&values);

        let band = self.params.band;
        let min_bound = (mean - sd).max(mean * (1.0 - band));
        let max_bound = (mean + sd).min(mean * (1.0 + band));
        let cv = if mean > 0.0 { sd / mean } else { 0.0 };
        let reliability = self.reliability(usable.len(), cv);

        debug!(
            "Fused {} families: mean {:.2}, sd {:.2}, cv {:.3}, reliability {}",
            usable.len(),
            mean,
            sd,
            cv,
            reliability
        );
        Ok(RateEstimate {
            point_estimate: mean,
            min_bound,
            max_bound,
            reliability,
            contributing_sources: usable.iter().map(|(f, _)| f.to_string()).collect(),
        })
    }

    /// Fuses and applies the cargo-weight adjustment.
    pub fn estimate(
        &self,
        readings: &[(String, Option<f64>)],
        class: ContainerClass,
        weight_tons: Option<f64>,
    ) -> Result<RateEstimate, FusionError> {
        let fused = self.fuse(readings)?;
        Ok(fused.scaled(self.adjustment.factor(class, weight_tons)))
    }

    fn reliability(&self, families: usize, cv: f64) -> f64 {
        let p = &self.params;
        let coverage = families as f64 / self.max_known_families as f64;
        let agreement = 1.0 - cv.min(p.cv_cap) / p.cv_cap;
        round_to(p.reliability_floor + p.reliability_span * coverage * agreement, 2)
            .clamp(p.reliability_floor, p.reliability_floor + p.reliability_span)
    }
}

fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}
