//! Markup queries shared by the extraction strategies.

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

const HEADINGS: &str = "h1, h2, h3, h4, h5, h6";
const HIDDEN_TEXT_PARENTS: [&str; 3] = ["script", "style", "noscript"];

/// How far up from a heading the following-sibling search may climb.
const HEADING_ANCESTOR_DEPTH: usize = 3;

fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            warn!("Ignoring invalid selector '{}': {}", css, e);
            None
        }
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn contains_keyword(text: &str, keywords: &[String]) -> bool {
    let text = text.to_lowercase();
    keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .any(|k| text.contains(&k.to_lowercase()))
}

pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn owning_table(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "table")
}

/// Cell texts per row, header row included. Rows of nested tables are skipped.
pub fn table_rows(table: ElementRef<'_>) -> Vec<Vec<String>> {
    let Some(row_sel) = selector("tr") else {
        return Vec::new();
    };
    table
        .select(&row_sel)
        .filter(|row| owning_table(*row).is_some_and(|t| t.id() == table.id()))
        .map(|row| {
            row.children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                .map(element_text)
                .collect()
        })
        .collect()
}

/// A parsed HTML document.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(raw: &str) -> Self {
        Self {
            html: Html::parse_document(raw),
        }
    }

    pub fn select(&self, css: &str) -> Vec<ElementRef<'_>> {
        selector(css)
            .map(|sel| self.html.select(&sel).collect())
            .unwrap_or_default()
    }

    pub fn tables(&self) -> Vec<ElementRef<'_>> {
        self.select("table")
    }

    /// Tables matched by `css`, or nested inside an element it matches.
    pub fn tables_matching(&self, css: &str) -> Vec<ElementRef<'_>> {
        let Some(table_sel) = selector("table") else {
            return Vec::new();
        };
        self.select(css)
            .into_iter()
            .flat_map(|el| {
                if el.value().name() == "table" {
                    vec![el]
                } else {
                    el.select(&table_sel).collect()
                }
            })
            .collect()
    }

    pub fn tables_containing(&self, keywords: &[String]) -> Vec<ElementRef<'_>> {
        self.tables()
            .into_iter()
            .filter(|table| contains_keyword(&element_text(*table), keywords))
            .collect()
    }

    /// The nearest table following each heading that mentions a keyword.
    pub fn tables_after_headings(&self, keywords: &[String]) -> Vec<ElementRef<'_>> {
        let Some(table_sel) = selector("table") else {
            return Vec::new();
        };
        let mut found: Vec<ElementRef<'_>> = Vec::new();
        for heading in self.select(HEADINGS) {
            if !contains_keyword(&element_text(heading), keywords) {
                continue;
            }
            if let Some(table) = following_table(heading, &table_sel)
                && !found.iter().any(|t| t.id() == table.id())
            {
                found.push(table);
            }
        }
        found
    }

    /// Visible text of the whole document.
    pub fn text(&self) -> String {
        visible_text(self.html.root_element())
    }

    /// Visible text of the elements matched by `css`.
    pub fn text_of(&self, css: &str) -> String {
        let parts: Vec<String> = self.select(css).into_iter().map(visible_text).collect();
        parts.join(" ")
    }
}

fn following_table<'a>(start: ElementRef<'a>, table_sel: &Selector) -> Option<ElementRef<'a>> {
    let mut anchor = start;
    for _ in 0..HEADING_ANCESTOR_DEPTH {
        for sibling in anchor.next_siblings().filter_map(ElementRef::wrap) {
            if sibling.value().name() == "table" {
                return Some(sibling);
            }
            if let Some(nested) = sibling.select(table_sel).next() {
                return Some(nested);
            }
        }
        anchor = anchor.parent().and_then(ElementRef::wrap)?;
    }
    None
}

fn visible_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(ElementRef::wrap)
            .is_some_and(|p| HIDDEN_TEXT_PARENTS.contains(&p.value().name()));
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    collapse_whitespace(&out)
}
