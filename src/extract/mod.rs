//! Extraction strategies turning one raw document into index records.
//!
//! Two document shapes are supported:
//!
//! | Strategy | Input | Notes |
//! |----------|-------|-------|
//! | [`table::TableExtractor`] | HTML tables | Layered table location, per-row parsing |
//! | [`text::TextExtractor`] | Prose | Keyword-proximate numbers |
//!
//! Both return [`AcquireError::NoDataFound`] when nothing usable is located,
//! which the retry layer treats like a failed fetch.

pub mod markup;
pub mod numeric;
pub mod table;
pub mod text;

use crate::core::{AcquireError, IndexRecord, IndexUnit, RouteWeightTable};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use table::TableExtractor;
pub use text::{TextExtractor, TextRoute};

/// What an extractor knows about the source it is parsing.
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    pub source_name: &'a str,
    pub default_unit: IndexUnit,
    pub route_weights: &'a RouteWeightTable,
    /// Used as the reading date when the document carries none.
    pub fetched_on: NaiveDate,
}

impl ExtractContext<'_> {
    pub(crate) fn no_data(&self) -> AcquireError {
        AcquireError::NoDataFound {
            source_name: self.source_name.to_string(),
        }
    }
}

pub trait Extractor: Send + Sync {
    fn extract(
        &self,
        document: &str,
        ctx: &ExtractContext<'_>,
    ) -> Result<Vec<IndexRecord>, AcquireError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionStrategy {
    Table(TableExtractor),
    Text(TextExtractor),
}

impl ExtractionStrategy {
    pub fn extractor(&self) -> &dyn Extractor {
        match self {
            ExtractionStrategy::Table(t) => t,
            ExtractionStrategy::Text(t) => t,
        }
    }
}

impl Extractor for ExtractionStrategy {
    fn extract(
        &self,
        document: &str,
        ctx: &ExtractContext<'_>,
    ) -> Result<Vec<IndexRecord>, AcquireError> {
        self.extractor().extract(document, ctx)
    }
}
