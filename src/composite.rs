//! Synthesis of a family's aggregate entry from its route readings.

use crate::core::record::round_to;
use crate::core::weights::COMPOSITE_WEIGHTING;
use crate::core::{IndexRecord, IndexUnit, RouteWeightTable};
use tracing::debug;

pub const COMPOSITE_KEYWORDS: [&str; 4] = ["comprehensive", "composite", "total", "all routes"];

pub fn is_composite_route(route: &str) -> bool {
    let route = route.to_lowercase();
    COMPOSITE_KEYWORDS.iter().any(|k| route.contains(k))
}

pub struct CompositeSynthesizer<'a> {
    weights: &'a RouteWeightTable,
    label: String,
}

impl<'a> CompositeSynthesizer<'a> {
    pub fn new(weights: &'a RouteWeightTable, label: impl Into<String>) -> Self {
        Self {
            weights,
            label: label.into(),
        }
    }

    /// Prepends a composite record unless one is already present.
    ///
    /// Both levels are weighted means of the route levels, rounded to two
    /// decimals, and the change is taken between the rounded levels. With a
    /// total weight of zero the plain arithmetic mean is used.
    pub fn synthesize(&self, mut records: Vec<IndexRecord>) -> Vec<IndexRecord> {
        if records.is_empty() || records.iter().any(|r| is_composite_route(&r.route)) {
            return records;
        }

        let weights: Vec<f64> = records
            .iter()
            .map(|r| self.weights.weight_for(&r.route))
            .collect();
        let total_weight: f64 = weights.iter().sum();
        let mean = |level: fn(&IndexRecord) -> f64| -> f64 {
            if total_weight > 0.0 {
                records
                    .iter()
                    .zip(&weights)
                    .map(|(r, w)| level(r) * w)
                    .sum::<f64>()
                    / total_weight
            } else {
                records.iter().map(level).sum::<f64>() / records.len() as f64
            }
        };

        let current = round_to(mean(|r| r.current_index), 2);
        let previous = round_to(mean(|r| r.previous_index), 2);
        let unit = match records.first().map(|r| r.unit) {
            Some(unit) if records.iter().all(|r| r.unit == unit) => unit,
            _ => IndexUnit::Points,
        };
        let current_date = records.iter().map(|r| r.current_date).max();
        let previous_date = records.iter().map(|r| r.previous_date).max();
        let (Some(current_date), Some(previous_date)) = (current_date, previous_date) else {
            return records;
        };

        let composite = IndexRecord::from_levels(
            self.label.as_str(),
            unit,
            previous,
            current,
            previous_date,
            current_date,
        )
        .with_weighting(COMPOSITE_WEIGHTING);
        debug!(
            "Synthesized {} = {} from {} route(s), total weight {}",
            composite.route,
            composite.current_index,
            records.len(),
            total_weight
        );

        records.insert(0, composite);
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn record(route: &str, previous: f64, current: f64) -> IndexRecord {
        IndexRecord::from_levels(
            route,
            IndexUnit::PerTeu,
            previous,
            current,
            date("2024-05-03"),
            date("2024-05-10"),
        )
    }

    fn table() -> RouteWeightTable {
        [("Europe".to_string(), 20.0), ("Mediterranean".to_string(), 10.0)]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_weighted_composite() {
        let weights = table();
        let synthesizer = CompositeSynthesizer::new(&weights, "Comprehensive Index");
        let records = vec![record("Europe", 1000.0, 1100.0), record("Mediterranean", 1300.0, 1400.0)];

        let out = synthesizer.synthesize(records);
        assert_eq!(out.len(), 3);
        let composite = &out[0];
        assert_eq!(composite.route, "Comprehensive Index");
        // (1100*20 + 1400*10) / 30 = 1200, (1000*20 + 1300*10) / 30 = 1100
        assert_eq!(composite.current_index, 1200.0);
        assert_eq!(composite.previous_index, 1100.0);
        assert_eq!(composite.change, 100.0);
        assert_eq!(composite.weighting, 100.0);
        assert_eq!(composite.unit, IndexUnit::PerTeu);
        assert_eq!(composite.current_date, date("2024-05-10"));
    }

    #[test]
    fn test_change_taken_between_rounded_levels() {
        let weights = table();
        let synthesizer = CompositeSynthesizer::new(&weights, "Composite");
        let records = vec![
            record("Europe", 1000.004, 1000.016),
            record("Mediterranean", 1000.004, 1000.016),
        ];

        let composite = &synthesizer.synthesize(records)[0];
        assert_eq!(composite.current_index, 1000.02);
        assert_eq!(composite.previous_index, 1000.0);
        assert_eq!(composite.change, 0.02);
    }

    #[test]
    fn test_zero_weight_uses_arithmetic_mean() {
        let weights = RouteWeightTable::default();
        let synthesizer = CompositeSynthesizer::new(&weights, "Composite");
        let records = vec![record("Lane A", 900.0, 1000.0), record("Lane B", 1000.0, 1100.0)];

        let first = synthesizer.synthesize(records.clone());
        let second = synthesizer.synthesize(records);
        assert_eq!(first, second);
        assert_eq!(first[0].current_index, 1050.0);
        assert_eq!(first[0].previous_index, 950.0);
    }

    #[test]
    fn test_existing_composite_is_left_alone() {
        let weights = table();
        let synthesizer = CompositeSynthesizer::new(&weights, "Composite");
        let records = vec![record("Europe", 1000.0, 1100.0), record("All Routes", 1.0, 2.0)];

        let out = synthesizer.synthesize(records.clone());
        assert_eq!(out, records);
        assert!(synthesizer.synthesize(Vec::new()).is_empty());
    }

    #[test]
    fn test_mixed_units_fall_back_to_points() {
        let weights = table();
        let synthesizer = CompositeSynthesizer::new(&weights, "Composite");
        let mut feu = record("Mediterranean", 1300.0, 1400.0);
        feu.unit = IndexUnit::PerFeu;

        let out = synthesizer.synthesize(vec![record("Europe", 1000.0, 1100.0), feu]);
        assert_eq!(out[0].unit, IndexUnit::Points);
    }
}
