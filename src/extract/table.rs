use super::markup::{Document, table_rows};
use super::numeric::{
    extract_dates, is_currency_marked, is_pure_numeric, parse_magnitude, parse_signed,
};
use super::{ExtractContext, Extractor};
use crate::core::record::ReadingDates;
use crate::core::{AcquireError, IndexRecord, IndexUnit};
use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

fn default_value_column() -> usize {
    1
}

/// Reads index rows out of an HTML table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableExtractor {
    /// CSS selector of the table or of an element wrapping it.
    pub selector: Option<String>,
    /// Words identifying the right table by content or by its heading.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Column holding the index when no cell looks numeric.
    #[serde(default = "default_value_column")]
    pub value_column: usize,
}

impl Default for TableExtractor {
    fn default() -> Self {
        Self {
            selector: None,
            keywords: Vec::new(),
            value_column: default_value_column(),
        }
    }
}

type TableLocator = for<'a> fn(&TableExtractor, &'a Document) -> Vec<ElementRef<'a>>;

/// Table location strategies, most specific first.
const LOCATORS: [(&str, TableLocator); 4] = [
    ("selector", TableExtractor::by_selector),
    ("keyword content", TableExtractor::by_content),
    ("keyword heading", TableExtractor::by_heading),
    ("every table", TableExtractor::every_table),
];

impl TableExtractor {
    fn by_selector<'a>(&self, doc: &'a Document) -> Vec<ElementRef<'a>> {
        self.selector
            .as_deref()
            .map(|css| doc.tables_matching(css))
            .unwrap_or_default()
    }

    fn by_content<'a>(&self, doc: &'a Document) -> Vec<ElementRef<'a>> {
        doc.tables_containing(&self.keywords)
    }

    fn by_heading<'a>(&self, doc: &'a Document) -> Vec<ElementRef<'a>> {
        doc.tables_after_headings(&self.keywords)
    }

    fn every_table<'a>(&self, doc: &'a Document) -> Vec<ElementRef<'a>> {
        doc.tables()
    }

    /// Column of the index value: the first unsigned number after the label,
    /// else the first currency-marked cell, else the configured column.
    fn index_column(&self, cells: &[String]) -> Option<usize> {
        let data = cells.iter().enumerate().skip(1);
        data.clone()
            .find(|(_, cell)| is_pure_numeric(cell))
            .or_else(|| data.clone().find(|(_, cell)| is_currency_marked(cell)))
            .map(|(i, _)| i)
            .or_else(|| (self.value_column < cells.len()).then_some(self.value_column))
    }

    fn parse_row(
        &self,
        cells: &[String],
        dates: ReadingDates,
        ctx: &ExtractContext<'_>,
    ) -> Option<IndexRecord> {
        let route = cells.first()?.trim();
        if route.is_empty() {
            return None;
        }
        let column = self.index_column(cells)?;
        let current = parse_magnitude(&cells[column])?;
        let change = cells
            .get(column + 1)
            .and_then(|cell| parse_signed(cell))
            .unwrap_or(0.0);
        let unit = IndexUnit::classify(&cells.join(" "), ctx.default_unit);

        Some(
            IndexRecord::from_change(route, unit, current, change, dates.previous, dates.current)
                .with_weighting(ctx.route_weights.weighting_of(route)),
        )
    }

    fn records_from_tables(
        &self,
        tables: &[ElementRef<'_>],
        document_dates: ReadingDates,
        ctx: &ExtractContext<'_>,
    ) -> Vec<IndexRecord> {
        let mut seen = HashSet::new();
        let mut records = Vec::new();

        for table in tables {
            let rows = table_rows(*table);
            let Some(header) = rows.first() else {
                continue;
            };
            let (_, header_dates) = extract_dates(&header.join(" "));
            let dates = if header_dates.is_empty() {
                document_dates
            } else {
                ReadingDates::from_found(&header_dates, ctx.fetched_on)
            };

            for cells in rows.iter().skip(1) {
                if let Some(record) = self.parse_row(cells, dates, ctx)
                    && seen.insert(record.route.clone())
                {
                    records.push(record);
                }
            }
        }
        records
    }
}

impl Extractor for TableExtractor {
    fn extract(
        &self,
        document: &str,
        ctx: &ExtractContext<'_>,
    ) -> Result<Vec<IndexRecord>, AcquireError> {
        let doc = Document::parse(document);
        let (_, found_dates) = extract_dates(&doc.text());
        let document_dates = ReadingDates::from_found(&found_dates, ctx.fetched_on);

        for (name, locate) in LOCATORS {
            let tables = locate(self, &doc);
            if tables.is_empty() {
                continue;
            }
            let records = self.records_from_tables(&tables, document_dates, ctx);
            if !records.is_empty() {
                debug!(
                    "Located {} table(s) by {} in {}, {} record(s)",
                    tables.len(),
                    name,
                    ctx.source_name,
                    records.len()
                );
                return Ok(records);
            }
        }
        Err(ctx.no_data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RouteWeightTable;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn extract(extractor: &TableExtractor, html: &str) -> Result<Vec<IndexRecord>, AcquireError> {
        let weights = RouteWeightTable::for_family("scfi");
        let ctx = ExtractContext {
            source_name: "test",
            default_unit: IndexUnit::PerTeu,
            route_weights: &weights,
            fetched_on: date("2024-06-01"),
        };
        extractor.extract(html, &ctx)
    }

    #[test]
    fn test_simple_row() {
        let html = r#"<table>
            <tr><th>Route</th><th>Index</th><th>Change</th></tr>
            <tr><td>Europe</td><td>1,030</td><td>-20</td></tr>
        </table>"#;
        let records = extract(&TableExtractor::default(), html).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].route, "Europe");
        assert_eq!(records[0].current_index, 1030.0);
        assert_eq!(records[0].change, -20.0);
        assert_eq!(records[0].previous_index, 1050.0);
        assert_eq!(records[0].weighting, 20.0);
        assert_eq!(records[0].current_date, date("2024-06-01"));
        assert_eq!(records[0].previous_date, date("2024-05-25"));
    }

    #[test]
    fn test_selector_takes_precedence() {
        let html = r#"
            <table class="decoy"><tr><th>SCFI</th></tr><tr><td>Bunker</td><td>600</td></tr></table>
            <table class="scfi">
              <tr><th>Route</th><th>Unit</th><th>2024-05-03</th><th>2024-05-10</th></tr>
              <tr><td>USWC (base port)</td><td>USD/FEU</td><td>4,100</td><td>+150</td></tr>
              <tr><td></td><td>USD/FEU</td><td>1</td><td>2</td></tr>
              <tr><td>Mediterranean</td><td>USD/TEU</td><td>n/a</td><td></td></tr>
            </table>"#;
        let extractor = TableExtractor {
            selector: Some("table.scfi".to_string()),
            keywords: vec!["SCFI".to_string()],
            value_column: 2,
        };
        let records = extract(&extractor, html).unwrap();

        assert_eq!(records.len(), 1);
        let uswc = &records[0];
        assert_eq!(uswc.current_index, 4100.0);
        assert_eq!(uswc.change, 150.0);
        assert_eq!(uswc.unit, IndexUnit::PerFeu);
        assert_eq!(uswc.previous_date, date("2024-05-03"));
        assert_eq!(uswc.current_date, date("2024-05-10"));
    }

    #[test]
    fn test_falls_through_to_keyword_content() {
        let html = r#"
            <table><tr><th>Weather</th></tr><tr><td>Sunny</td><td>none</td></tr></table>
            <table><tr><th>SCFI routes</th></tr><tr><td>Persian Gulf</td><td>1,450.5</td><td>+12.5</td></tr></table>"#;
        let extractor = TableExtractor {
            selector: Some("table.missing".to_string()),
            keywords: vec!["scfi".to_string()],
            value_column: 1,
        };
        let records = extract(&extractor, html).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].route, "Persian Gulf");
        assert_eq!(records[0].current_index, 1450.5);
        assert_eq!(records[0].change, 12.5);
    }

    #[test]
    fn test_table_after_heading() {
        let html = r#"
            <h2>Freight Index</h2>
            <table>
              <tr><td>Line</td><td>Rate</td><td>Delta</td></tr>
              <tr><td>Korea</td><td>$ 180</td><td>▼ 4</td></tr>
            </table>"#;
        let extractor = TableExtractor {
            selector: None,
            keywords: vec!["freight index".to_string()],
            value_column: 1,
        };
        let records = extract(&extractor, html).unwrap();

        assert_eq!(records[0].route, "Korea");
        assert_eq!(records[0].current_index, 180.0);
        assert_eq!(records[0].change, -4.0);
    }

    #[test]
    fn test_fixed_column_fallback_and_dedup() {
        let html = r#"<table>
            <tr><th>Route</th><th>Level</th></tr>
            <tr><td>Europe</td><td>approx. 990 pts</td></tr>
            <tr><td>Europe</td><td>approx. 995 pts</td></tr>
        </table>"#;
        let records = extract(&TableExtractor::default(), html).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].current_index, 990.0);
        assert_eq!(records[0].change, 0.0);
    }

    #[test]
    fn test_default_matches_empty_config() {
        let from_config: TableExtractor = serde_yaml::from_str("{}").unwrap();
        let default = TableExtractor::default();

        assert_eq!(from_config.value_column, default.value_column);
        assert_eq!(default.value_column, 1);
        assert!(default.selector.is_none());
        assert!(default.keywords.is_empty());
    }

    #[test]
    fn test_no_table_is_no_data() {
        let result = extract(&TableExtractor::default(), "<p>Nothing here</p>");
        assert!(matches!(result, Err(AcquireError::NoDataFound { .. })));

        let header_only = "<table><tr><th>Route</th><th>Index</th></tr></table>";
        let result = extract(&TableExtractor::default(), header_only);
        assert!(matches!(result, Err(AcquireError::NoDataFound { .. })));
    }
}
