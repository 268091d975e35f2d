use super::markup::Document;
use super::numeric::{extract_dates, find_number, find_signed_number};
use super::{ExtractContext, Extractor};
use crate::core::record::ReadingDates;
use crate::core::{AcquireError, IndexRecord, IndexUnit};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Max bytes between a keyword and its index value.
const INDEX_WINDOW: usize = 120;
/// Max bytes after the index value searched for a signed change.
const CHANGE_WINDOW: usize = 80;

/// A route reported in prose, recognised by any of its keywords.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRoute {
    pub route: String,
    pub keywords: Vec<String>,
}

/// Reads index figures out of free text such as news articles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextExtractor {
    /// Restricts the text to the elements matched by this CSS selector.
    pub selector: Option<String>,
    pub routes: Vec<TextRoute>,
}

fn floor_boundary(text: &str, mut index: usize) -> usize {
    index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn occurrences(haystack: &str, keywords: &[String]) -> Vec<(usize, usize)> {
    let mut found: Vec<(usize, usize)> = keywords
        .iter()
        .map(|k| k.trim().to_ascii_lowercase())
        .filter(|k| !k.is_empty())
        .flat_map(|k| {
            haystack
                .match_indices(k.as_str())
                .map(|(pos, m)| (pos, pos + m.len()))
                .collect::<Vec<_>>()
        })
        .collect();
    found.sort_unstable();
    found
}

impl TextExtractor {
    fn read_route(
        &self,
        route: &TextRoute,
        text: &str,
        lowered: &str,
        dates: ReadingDates,
        ctx: &ExtractContext<'_>,
    ) -> Option<IndexRecord> {
        let other_keywords: Vec<String> = self
            .routes
            .iter()
            .filter(|r| r.route != route.route)
            .flat_map(|r| r.keywords.iter().cloned())
            .collect();
        let others = occurrences(lowered, &other_keywords);

        occurrences(lowered, &route.keywords)
            .into_iter()
            .find_map(|(kw_start, kw_end)| {
                let window_end = floor_boundary(text, kw_end + INDEX_WINDOW);
                let index = find_number(&text[kw_end..window_end])?;
                let value_end = kw_end + index.end;

                let next_keyword = others
                    .iter()
                    .map(|(start, _)| *start)
                    .find(|start| *start >= value_end)
                    .unwrap_or(text.len());
                let change_end =
                    floor_boundary(text, (value_end + CHANGE_WINDOW).min(next_keyword));
                let change = find_signed_number(&text[value_end..change_end]).unwrap_or(0.0);
                let unit = IndexUnit::classify(&text[kw_start..change_end], ctx.default_unit);

                Some(
                    IndexRecord::from_change(
                        route.route.as_str(),
                        unit,
                        index.magnitude,
                        change,
                        dates.previous,
                        dates.current,
                    )
                    .with_weighting(ctx.route_weights.weighting_of(&route.route)),
                )
            })
    }
}

impl Extractor for TextExtractor {
    fn extract(
        &self,
        document: &str,
        ctx: &ExtractContext<'_>,
    ) -> Result<Vec<IndexRecord>, AcquireError> {
        let doc = Document::parse(document);
        let scoped = self
            .selector
            .as_deref()
            .map(|css| doc.text_of(css))
            .filter(|text| !text.is_empty());
        let text = scoped.unwrap_or_else(|| doc.text());

        let (masked, found_dates) = extract_dates(&text);
        let dates = ReadingDates::from_found(&found_dates, ctx.fetched_on);
        // ASCII lowering keeps byte offsets aligned with `masked`.
        let lowered = masked.to_ascii_lowercase();

        let records: Vec<IndexRecord> = self
            .routes
            .iter()
            .filter_map(|route| self.read_route(route, &masked, &lowered, dates, ctx))
            .collect();

        if records.is_empty() {
            return Err(ctx.no_data());
        }
        debug!(
            "Read {} record(s) from prose in {}",
            records.len(),
            ctx.source_name
        );
        Ok(records)
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

    fn route(name: &str, keywords: &[&str]) -> TextRoute {
        TextRoute {
            route: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn extract(extractor: &TextExtractor, html: &str) -> Result<Vec<IndexRecord>, AcquireError> {
        let weights = RouteWeightTable::for_family("wci");
        let ctx = ExtractContext {
            source_name: "news",
            default_unit: IndexUnit::PerFeu,
            route_weights: &weights,
            fetched_on: date("2024-06-01"),
        };
        extractor.extract(html, &ctx)
    }

    #[test]
    fn test_keyword_number_and_change() {
        let html = r#"<article><p>Published 2024-05-16.</p>
            <p>The World Container Index composite fell to $3,432 per 40ft container, -21.5 on the week.
            Shanghai to Rotterdam rates reached 4,100 USD/FEU (+2% week on week).</p></article>"#;
        let extractor = TextExtractor {
            selector: None,
            routes: vec![
                route("WCI Composite", &["composite"]),
                route("Shanghai - Rotterdam", &["rotterdam"]),
            ],
        };
        let records = extract(&extractor, html).unwrap();

        assert_eq!(records.len(), 2);
        let composite = &records[0];
        assert_eq!(composite.route, "WCI Composite");
        assert_eq!(composite.current_index, 3432.0);
        assert_eq!(composite.change, -21.5);
        assert_eq!(composite.weighting, 100.0);
        assert_eq!(composite.current_date, date("2024-05-16"));
        assert_eq!(composite.previous_date, date("2024-05-09"));

        let rotterdam = &records[1];
        assert_eq!(rotterdam.current_index, 4100.0);
        // Percentages are not absolute changes.
        assert_eq!(rotterdam.change, 0.0);
        assert_eq!(rotterdam.unit, IndexUnit::PerFeu);
        assert_eq!(rotterdam.weighting, 25.0);
    }

    #[test]
    fn test_change_does_not_leak_into_next_route() {
        let text = "<p>Genoa 2,950 while New York -120 to 3,300</p>";
        let extractor = TextExtractor {
            selector: None,
            routes: vec![route("Genoa", &["genoa"]), route("New York", &["new york"])],
        };
        let records = extract(&extractor, text).unwrap();

        assert_eq!(records[0].current_index, 2950.0);
        assert_eq!(records[0].change, 0.0);
        assert_eq!(records[1].current_index, 120.0);
    }

    #[test]
    fn test_date_range_is_not_a_change() {
        let extractor = TextExtractor {
            selector: None,
            routes: vec![route("WCI Composite", &["composite"])],
        };
        let records = extract(
            &extractor,
            "<p>The composite stood at 3,432 for the week of May 9-16.</p>",
        )
        .unwrap();

        assert_eq!(records[0].current_index, 3432.0);
        assert_eq!(records[0].change, 0.0);
        assert_eq!(records[0].previous_index, 3432.0);
    }

    #[test]
    fn test_selector_scopes_text() {
        let html = r#"<div class="ad">Composite deals from 99!</div>
            <div class="body">The composite index stands at 1,875.40, +3.2 points.</div>"#;
        let extractor = TextExtractor {
            selector: Some("div.body".to_string()),
            routes: vec![route("Composite", &["composite"])],
        };
        let records = extract(&extractor, html).unwrap();

        assert_eq!(records[0].current_index, 1875.4);
        assert_eq!(records[0].change, 3.2);
    }

    #[test]
    fn test_missing_keyword_is_no_data() {
        let extractor = TextExtractor {
            selector: None,
            routes: vec![route("Composite", &["composite"])],
        };
        let result = extract(&extractor, "<p>Markets were quiet, 42 ships waited.</p>");
        assert!(matches!(result, Err(AcquireError::NoDataFound { .. })));
    }
}
