//! Read-only view over a rendered page.
//!
//! The extractor never touches markup directly; it walks [`Page`] and [`Row`]
//! so any engine that can answer "wait for this selector", "give me the rows"
//! and "text/attribute under this sub-selector" can drive it. [`HtmlPage`] is
//! the `scraper`-backed implementation used for fetched documents.

use scraper::{ElementRef, Html, Selector};
use std::{cell::RefCell, collections::HashMap, time::Duration};
use thiserror::Error;
use url::Url;

use crate::fetcher::PageResponse;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("timed out after {timeout:?} waiting for '{selector}'")]
    Timeout { selector: String, timeout: Duration },

    #[error("element access failed: {0}")]
    Element(String),
}

pub trait Page {
    /// Address the page was finally served from, used to resolve relative links.
    fn url(&self) -> &Url;

    /// Blocks until `selector` matches at least one element or `timeout` elapses.
    fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), PageError>;

    /// Every element matched by `selector`, in document order.
    fn rows<'a>(&'a self, selector: &str) -> Result<Vec<Box<dyn Row + 'a>>, PageError>;

    /// Text content of the first element matched by `selector`.
    fn text(&self, selector: &str) -> Result<Option<String>, PageError>;
}

/// One repeated element on a page. An empty sub-selector addresses the row
/// element itself.
pub trait Row {
    fn text(&self, selector: &str) -> Result<Option<String>, PageError>;

    fn attr(&self, selector: &str, name: &str) -> Result<Option<String>, PageError>;
}

/// A fully parsed static document.
///
/// Not `Send`: build it after the last `.await` and drop it before the next.
pub struct HtmlPage {
    url: Url,
    document: Html,
    selectors: RefCell<HashMap<String, Selector>>,
}

impl HtmlPage {
    pub fn parse(url: Url, html: &str) -> Self {
        Self {
            url,
            document: Html::parse_document(html),
            selectors: RefCell::new(HashMap::new()),
        }
    }

    pub fn from_response(response: &PageResponse) -> Self {
        Self::parse(response.url_final.clone(), &response.body_utf8)
    }

    fn selector(&self, selector: &str) -> Result<Selector, PageError> {
        if let Some(parsed) = self.selectors.borrow().get(selector) {
            return Ok(parsed.clone());
        }
        let parsed = Selector::parse(selector).map_err(|e| PageError::InvalidSelector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })?;
        self.selectors
            .borrow_mut()
            .insert(selector.to_string(), parsed.clone());
        Ok(parsed)
    }
}

impl Page for HtmlPage {
    fn url(&self) -> &Url {
        &self.url
    }

    fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), PageError> {
        // A parsed document never changes, so a miss now is a miss at the deadline.
        let parsed = self.selector(selector)?;
        if self.document.select(&parsed).next().is_some() {
            Ok(())
        } else {
            Err(PageError::Timeout {
                selector: selector.to_string(),
                timeout,
            })
        }
    }

    fn rows<'a>(&'a self, selector: &str) -> Result<Vec<Box<dyn Row + 'a>>, PageError> {
        let parsed = self.selector(selector)?;
        Ok(self
            .document
            .select(&parsed)
            .map(|element| Box::new(HtmlRow { page: self, element }) as Box<dyn Row + 'a>)
            .collect())
    }

    fn text(&self, selector: &str) -> Result<Option<String>, PageError> {
        let parsed = self.selector(selector)?;
        Ok(self.document.select(&parsed).next().map(element_text))
    }
}

struct HtmlRow<'a> {
    page: &'a HtmlPage,
    element: ElementRef<'a>,
}

impl HtmlRow<'_> {
    fn target(&self, selector: &str) -> Result<Option<ElementRef<'_>>, PageError> {
        if selector.trim().is_empty() {
            return Ok(Some(self.element));
        }
        let parsed = self.page.selector(selector)?;
        Ok(self.element.select(&parsed).next())
    }
}

impl Row for HtmlRow<'_> {
    fn text(&self, selector: &str) -> Result<Option<String>, PageError> {
        Ok(self.target(selector)?.map(element_text))
    }

    fn attr(&self, selector: &str, name: &str) -> Result<Option<String>, PageError> {
        Ok(self
            .target(selector)?
            .and_then(|element| element.value().attr(name).map(str::to_string)))
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}
