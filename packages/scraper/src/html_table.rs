//! HTML table extraction.
//!
//! Locates a `<table>` by position in the document and flattens it into a
//! header row plus string cells. `colspan` cells are repeated so every row
//! lines up with the header.

use scraper::{ElementRef, Html, Selector};

use crate::ScrapeError;

/// A table flattened to strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlTable {
    /// Cell texts of the first row.
    pub headers: Vec<String>,
    /// Cell texts of every following row.
    pub rows: Vec<Vec<String>>,
}

impl HtmlTable {
    /// Returns the index of the first header equal to `name`.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Removes every column whose header is in `names`.
    pub fn drop_columns(&mut self, names: &[&str]) {
        let keep: Vec<bool> = self
            .headers
            .iter()
            .map(|h| !names.contains(&h.as_str()))
            .collect();

        let filter = |cells: &mut Vec<String>| {
            let mut i = 0;
            cells.retain(|_| {
                let kept = keep.get(i).copied().unwrap_or(true);
                i += 1;
                kept
            });
        };

        filter(&mut self.headers);
        for row in &mut self.rows {
            filter(row);
        }
    }
}

/// Parses a CSS selector string, returning a [`ScrapeError`] on failure.
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] if the selector is invalid.
pub fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector)
        .map_err(|e| ScrapeError::Parse(format!("invalid CSS selector '{selector}': {e}")))
}

/// Returns an element's text with whitespace runs collapsed to one space.
#[must_use]
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts the `index`-th (zero-based) `<table>` in document order.
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] if the document has fewer tables or the
/// table has no rows.
pub fn nth_table(document: &Html, index: usize) -> Result<HtmlTable, ScrapeError> {
    let table_sel = parse_selector("table")?;
    let row_sel = parse_selector("tr")?;
    let cell_sel = parse_selector("th, td")?;

    let table = document.select(&table_sel).nth(index).ok_or_else(|| {
        ScrapeError::Parse(format!("document has no table at position {index}"))
    })?;

    let mut rows = table
        .select(&row_sel)
        .map(|row| expand_row(row, &cell_sel))
        .filter(|cells| !cells.is_empty());

    let headers = rows
        .next()
        .ok_or_else(|| ScrapeError::Parse(format!("table {index} has no rows")))?;

    Ok(HtmlTable {
        headers,
        rows: rows.collect(),
    })
}

fn expand_row(row: ElementRef<'_>, cell_sel: &Selector) -> Vec<String> {
    let mut cells = Vec::new();
    for cell in row.select(cell_sel) {
        let span = cell
            .value()
            .attr("colspan")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);
        let text = element_text(cell);
        cells.extend(std::iter::repeat_n(text, span));
    }
    cells
}
