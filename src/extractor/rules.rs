use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::fetcher::types::duration_secs;

/// How a matched value is cleaned before it is recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostProcess {
    /// Trim and collapse runs of whitespace into single spaces.
    #[default]
    Text,
    /// Keep the value exactly as matched.
    Raw,
    /// Trim and resolve against the page URL.
    Url,
}

/// Where one column's value lives inside a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub name: String,
    /// Sub-selector relative to the row. Empty targets the row element.
    #[serde(default)]
    pub selector: String,
    /// Read this attribute instead of the text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(default)]
    pub process: PostProcess,
}

impl FieldRule {
    pub fn text(name: &str, selector: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
            attribute: None,
            process: PostProcess::Text,
        }
    }

    pub fn attr(name: &str, selector: &str, attribute: &str) -> Self {
        Self {
            attribute: Some(attribute.to_string()),
            ..Self::text(name, selector)
        }
    }

    #[must_use]
    pub fn with_process(mut self, process: PostProcess) -> Self {
        self.process = process;
        self
    }
}

/// Declarative description of one source's page layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Selects the repeated row elements. Also the selector waited on.
    pub root: String,
    pub fields: Vec<FieldRule>,
    /// Page-level element holding the visible period or date range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(
        default = "default_wait_timeout",
        with = "duration_secs",
        rename = "wait_timeout_secs"
    )]
    pub wait_timeout: Duration,
}

fn default_wait_timeout() -> Duration {
    Duration::from_secs(30)
}

impl RuleSet {
    pub fn new(root: &str) -> Self {
        Self {
            root: root.to_string(),
            fields: Vec::new(),
            period: None,
            wait_timeout: default_wait_timeout(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldRule) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_period(mut self, selector: &str) -> Self {
        self.period = Some(selector.to_string());
        self
    }

    #[must_use]
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }
}
