//! Normalized index records shared by every acquisition strategy.

use anyhow::anyhow;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Most published indices are weekly, so a lone reading is assumed to compare
/// against the week before.
pub const DEFAULT_PUBLICATION_GAP_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexUnit {
    Points,
    PerTeu,
    PerFeu,
}

impl IndexUnit {
    /// Classifies a unit from free text such as a table row or a sentence.
    pub fn classify(text: &str, default: IndexUnit) -> IndexUnit {
        let upper = text.to_uppercase();
        if upper.contains("FEU") {
            IndexUnit::PerFeu
        } else if upper.contains("TEU") {
            IndexUnit::PerTeu
        } else {
            default
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexUnit::Points => "points",
            IndexUnit::PerTeu => "per_teu",
            IndexUnit::PerFeu => "per_feu",
        }
    }
}

impl Display for IndexUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                IndexUnit::Points => "pts",
                IndexUnit::PerTeu => "USD/TEU",
                IndexUnit::PerFeu => "USD/FEU",
            }
        )
    }
}

impl FromStr for IndexUnit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "points" | "pts" => Ok(IndexUnit::Points),
            "per_teu" | "teu" => Ok(IndexUnit::PerTeu),
            "per_feu" | "feu" => Ok(IndexUnit::PerFeu),
            _ => Err(anyhow!("Invalid index unit: {}", s)),
        }
    }
}

/// One published reading of one route of an index family.
///
/// Identity is `(route, current_date)`. `change` always equals
/// `current_index - previous_index` rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub route: String,
    pub unit: IndexUnit,
    pub weighting: f64,
    pub previous_index: f64,
    pub current_index: f64,
    pub change: f64,
    pub previous_date: NaiveDate,
    pub current_date: NaiveDate,
}

impl IndexRecord {
    /// Builds a record from the two published levels.
    pub fn from_levels(
        route: impl Into<String>,
        unit: IndexUnit,
        previous_index: f64,
        current_index: f64,
        previous_date: NaiveDate,
        current_date: NaiveDate,
    ) -> Self {
        Self {
            route: route.into(),
            unit,
            weighting: 0.0,
            previous_index,
            current_index,
            change: round_to(current_index - previous_index, 2),
            previous_date,
            current_date,
        }
    }

    /// Builds a record from a current level and its published change, which is
    /// how most index tables present their data.
    pub fn from_change(
        route: impl Into<String>,
        unit: IndexUnit,
        current_index: f64,
        change: f64,
        previous_date: NaiveDate,
        current_date: NaiveDate,
    ) -> Self {
        Self {
            route: route.into(),
            unit,
            weighting: 0.0,
            previous_index: round_to(current_index - change, 2),
            current_index,
            change: round_to(change, 2),
            previous_date,
            current_date,
        }
    }

    pub fn with_weighting(mut self, weighting: f64) -> Self {
        self.weighting = weighting;
        self
    }
}

/// Publication window of a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadingDates {
    pub previous: NaiveDate,
    pub current: NaiveDate,
}

impl ReadingDates {
    /// Derives the window from the dates found in a document. The earliest
    /// date is the previous reading, the latest the current one.
    pub fn from_found(found: &[NaiveDate], fetched_on: NaiveDate) -> Self {
        let gap = Duration::days(DEFAULT_PUBLICATION_GAP_DAYS);
        match (found.iter().min(), found.iter().max()) {
            (Some(min), Some(max)) if min != max => Self {
                previous: *min,
                current: *max,
            },
            (Some(_), Some(only)) => Self {
                previous: *only - gap,
                current: *only,
            },
            _ => Self {
                previous: fetched_on - gap,
                current: fetched_on,
            },
        }
    }
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
