//! Google Finance top stories.

use std::time::Duration;
use url::Url;

use crate::{
    extractor::{FieldRule, PostProcess, RuleSet},
    fetcher::FetchOptions,
    sources::SourceDefinition,
    validator::ValidationRules,
};

pub const NAME: &str = "google_finance";
pub const URL: &str = "https://www.google.com/finance";
pub const COLUMNS: [&str; 5] = ["title", "source", "time", "link", "image"];

pub fn definition() -> SourceDefinition {
    let rules = RuleSet::new("div.yY3Lee")
        .with_field(FieldRule::text("title", "div.Yfwt5"))
        .with_field(FieldRule::attr("source", "", "data-article-source-name"))
        .with_field(FieldRule::text("time", "div.Adak"))
        .with_field(FieldRule::attr("link", "a", "href").with_process(PostProcess::Url))
        .with_field(FieldRule::attr("image", "img", "src").with_process(PostProcess::Url))
        .with_wait_timeout(Duration::from_secs(30));

    SourceDefinition {
        name: NAME.to_string(),
        url: Url::parse(URL).expect("valid google finance url"),
        fetch: FetchOptions::default()
            .with_header("Accept-Language", "en-US,en;q=0.9")
            .with_timeout(Duration::from_secs(30))
            .with_javascript(true),
        rules,
        columns: COLUMNS.iter().map(|c| c.to_string()).collect(),
        file_stem: "google_finance_top_stories".to_string(),
        metadata_stem: "google_finance_metadata".to_string(),
        latest_file: "latest_top_stories.csv".to_string(),
        period_key: "period".to_string(),
        validation: ValidationRules::new(&["title", "link"], &["title"]),
    }
}
