use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::extractor::rules::PostProcess;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

pub fn apply(process: PostProcess, value: String, base_url: &Url) -> String {
    match process {
        PostProcess::Raw => value,
        PostProcess::Text => normalize_whitespace(&value),
        PostProcess::Url => resolve_link(value.trim(), base_url),
    }
}

/// Calendar cells are full of layout whitespace; keep words, drop the rest.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Absolute form of `link`; left as-is if it cannot be joined.
pub fn resolve_link(link: &str, base_url: &Url) -> String {
    if link.is_empty() {
        return String::new();
    }
    match base_url.join(link) {
        Ok(absolute) => absolute.to_string(),
        Err(_) => link.to_string(),
    }
}
