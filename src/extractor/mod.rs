pub mod cleaner;
pub mod model;
pub mod rules;

#[cfg(test)]
mod tests;

pub use model::{Extraction, PageMetadata, RawMatch};
pub use rules::{FieldRule, PostProcess, RuleSet};

use tracing::{debug, warn};

use crate::page::{Page, PageError, Row};

/// Applies `rules` to `page`.
///
/// A missing root selector is not an error: the page is treated as empty and
/// the caller decides what an empty run means. A row that fails to read is
/// dropped on its own; the rest of the batch is kept.
pub fn extract(rules: &RuleSet, page: &dyn Page) -> Extraction {
    if let Err(e) = page.wait_for_selector(&rules.root, rules.wait_timeout) {
        warn!(url = %page.url(), error = %e, "row selector never appeared, treating page as empty");
        return Extraction::default();
    }

    let rows = match page.rows(&rules.root) {
        Ok(rows) => rows,
        Err(e) => {
            warn!(url = %page.url(), error = %e, "failed to select rows");
            return Extraction::default();
        }
    };

    let mut extraction = Extraction {
        rows: Vec::with_capacity(rows.len()),
        metadata: PageMetadata {
            period: read_period(rules, page),
        },
        skipped_rows: 0,
    };

    for (index, row) in rows.iter().enumerate() {
        match extract_row(rules, row.as_ref(), page) {
            Ok(raw) => extraction.rows.push(raw),
            Err(e) => {
                warn!(row = index, error = %e, "skipping unreadable row");
                extraction.skipped_rows += 1;
            }
        }
    }

    debug!(
        rows = extraction.rows.len(),
        skipped = extraction.skipped_rows,
        "extraction finished"
    );
    extraction
}

fn extract_row(rules: &RuleSet, row: &dyn Row, page: &dyn Page) -> Result<RawMatch, PageError> {
    let mut raw = RawMatch::new();
    for field in &rules.fields {
        let value = match &field.attribute {
            Some(attribute) => row.attr(&field.selector, attribute)?,
            None => row.text(&field.selector)?,
        };
        raw.insert(
            field.name.clone(),
            value.map(|v| cleaner::apply(field.process, v, page.url())),
        );
    }
    Ok(raw)
}

fn read_period(rules: &RuleSet, page: &dyn Page) -> String {
    let Some(selector) = rules.period.as_deref() else {
        return String::new();
    };
    match page.text(selector) {
        Ok(text) => text
            .map(|t| cleaner::normalize_whitespace(&t))
            .unwrap_or_default(),
        Err(e) => {
            warn!(selector, error = %e, "failed to read page period");
            String::new()
        }
    }
}
