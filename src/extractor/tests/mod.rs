use std::{fs, time::Duration};
use url::Url;

use crate::extractor::{FieldRule, RuleSet, extract};
use crate::page::{HtmlPage, Page, PageError, Row};
use crate::sources::{google_finance, investing, marketwatch};

fn fixture_page(name: &str, url: &str) -> HtmlPage {
    let html = fs::read_to_string(format!("src/extractor/tests/fixtures/{name}"))
        .expect("Failed to read test fixture");
    HtmlPage::parse(Url::parse(url).unwrap(), &html)
}

#[test]
fn test_extract_marketwatch_calendar() {
    let source = marketwatch::definition();
    let page = fixture_page("marketwatch_calendar.html", marketwatch::URL);

    let extraction = extract(&source.rules, &page);

    assert_eq!(extraction.rows.len(), 3);
    assert_eq!(extraction.skipped_rows, 0);
    assert_eq!(extraction.metadata.period, "Oct. 13 - Oct. 17, 2025");

    let first = &extraction.rows[0];
    assert_eq!(first.get("event"), Some("Consumer price index"));
    assert_eq!(first.get("actual"), Some("0.4%"));

    // Retail sales has no actual cell yet
    let second = &extraction.rows[1];
    assert!(second.contains("actual"));
    assert_eq!(second.get("actual"), None);
    assert_eq!(second.get("forecast"), Some("0.2%"));
}

#[test]
fn test_extract_investing_earnings() {
    let source = investing::definition();
    let page = fixture_page("investing_earnings.html", investing::URL);

    let extraction = extract(&source.rules, &page);

    assert_eq!(extraction.rows.len(), 3);
    assert_eq!(
        extraction.metadata.period,
        "This Week: 13/10/2025 - 17/10/2025"
    );
    assert_eq!(extraction.rows[0].get("country"), Some("United States"));
    assert_eq!(extraction.rows[0].get("symbol"), Some("JPM"));
    assert_eq!(extraction.rows[1].get("company_name"), Some("ASML Holding"));
    assert_eq!(extraction.rows[1].get("symbol"), None);
    assert_eq!(extraction.rows[2].get("market_cap"), Some("381.43B"));
}

#[test]
fn test_extract_google_finance_resolves_links() {
    let source = google_finance::definition();
    let page = fixture_page("google_finance.html", "https://www.google.com/finance/");

    let extraction = extract(&source.rules, &page);

    assert_eq!(extraction.rows.len(), 2);
    let first = &extraction.rows[0];
    assert_eq!(first.get("source"), Some("Reuters"));
    assert_eq!(
        first.get("link"),
        Some("https://www.google.com/finance/article/fed-minutes")
    );
    assert_eq!(first.get("image"), Some("https://img.example.com/fed.jpg"));
    assert_eq!(extraction.rows[1].get("image"), None);
    assert_eq!(extraction.metadata.period, "");
}

#[test]
fn test_missing_root_selector_yields_empty_result() {
    let source = investing::definition();
    let page = fixture_page("empty.html", investing::URL);

    let extraction = extract(&source.rules, &page);

    assert!(extraction.is_empty());
    assert_eq!(extraction.metadata.period, "");
}

#[test]
fn test_period_is_empty_when_rows_are_missing() {
    // The period element exists but the table does not: nothing is reported.
    let html = r#"<div class="calendar-range">Oct 13 - Oct 17</div>"#;
    let page = HtmlPage::parse(Url::parse(marketwatch::URL).unwrap(), html);

    let extraction = extract(&marketwatch::definition().rules, &page);

    assert!(extraction.is_empty());
    assert_eq!(extraction.metadata.period, "");
}

#[test]
fn test_invalid_field_selector_skips_rows() {
    let rules = RuleSet::new("tr").with_field(FieldRule::text("bad", "td[["));
    let page = HtmlPage::parse(
        Url::parse("https://example.com").unwrap(),
        "<table><tr><td>1</td></tr><tr><td>2</td></tr></table>",
    );

    let extraction = extract(&rules, &page);

    assert!(extraction.is_empty());
    assert_eq!(extraction.skipped_rows, 2);
}

/// Wraps a real page and makes attribute reads on one row fail.
struct FaultyPage {
    inner: HtmlPage,
    broken_row: usize,
}

struct FaultyRow<'a> {
    inner: Box<dyn Row + 'a>,
    broken: bool,
}

impl Row for FaultyRow<'_> {
    fn text(&self, selector: &str) -> Result<Option<String>, PageError> {
        self.inner.text(selector)
    }

    fn attr(&self, selector: &str, name: &str) -> Result<Option<String>, PageError> {
        if self.broken {
            return Err(PageError::Element("detached node".to_string()));
        }
        self.inner.attr(selector, name)
    }
}

impl Page for FaultyPage {
    fn url(&self) -> &Url {
        self.inner.url()
    }

    fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), PageError> {
        self.inner.wait_for_selector(selector, timeout)
    }

    fn rows<'a>(&'a self, selector: &str) -> Result<Vec<Box<dyn Row + 'a>>, PageError> {
        Ok(self
            .inner
            .rows(selector)?
            .into_iter()
            .enumerate()
            .map(|(index, inner)| {
                Box::new(FaultyRow {
                    inner,
                    broken: index == self.broken_row,
                }) as Box<dyn Row + 'a>
            })
            .collect())
    }

    fn text(&self, selector: &str) -> Result<Option<String>, PageError> {
        self.inner.text(selector)
    }
}

#[test]
fn test_one_broken_row_costs_one_row() {
    let rules = investing::definition().rules;
    let healthy = fixture_page("investing_earnings.html", investing::URL);
    let baseline = extract(&rules, &healthy).rows.len();

    let faulty = FaultyPage {
        inner: fixture_page("investing_earnings.html", investing::URL),
        broken_row: 1,
    };
    let extraction = extract(&rules, &faulty);

    assert_eq!(extraction.rows.len(), baseline - 1);
    assert_eq!(extraction.skipped_rows, 1);
    assert_eq!(extraction.rows[0].get("symbol"), Some("JPM"));
    assert_eq!(extraction.rows[1].get("symbol"), Some("BAC"));
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_extract_never_panics(html in ".*") {
            let page = HtmlPage::parse(Url::parse("https://example.com").unwrap(), &html);
            let _ = extract(&marketwatch::definition().rules, &page);
        }
    }
}
