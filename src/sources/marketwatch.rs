//! MarketWatch economic calendar.

use std::time::Duration;
use url::Url;

use crate::{
    extractor::{FieldRule, RuleSet},
    fetcher::FetchOptions,
    sources::SourceDefinition,
    validator::ValidationRules,
};

pub const NAME: &str = "marketwatch";
pub const URL: &str = "https://www.marketwatch.com/economy-politics/calendar";
pub const COLUMNS: [&str; 6] = ["date", "time", "event", "actual", "forecast", "previous"];

pub fn definition() -> SourceDefinition {
    let rules = COLUMNS
        .iter()
        .fold(
            RuleSet::new("table.calendar__table tr.calendar__row"),
            |rules, column| {
                rules.with_field(FieldRule::text(
                    column,
                    &format!(".calendar__cell--{column}"),
                ))
            },
        )
        .with_period(".calendar-range")
        .with_wait_timeout(Duration::from_secs(60));

    SourceDefinition {
        name: NAME.to_string(),
        url: Url::parse(URL).expect("valid marketwatch url"),
        fetch: FetchOptions::default()
            .with_header("Accept-Language", "en-US,en;q=0.9")
            .with_header("Referer", "https://www.marketwatch.com/")
            .with_timeout(Duration::from_secs(60))
            .with_javascript(true),
        rules,
        columns: COLUMNS.iter().map(|c| c.to_string()).collect(),
        file_stem: "marketwatch_economic_data".to_string(),
        metadata_stem: "marketwatch_metadata".to_string(),
        latest_file: "latest_economic_data.csv".to_string(),
        period_key: "date_range".to_string(),
        validation: ValidationRules::new(&COLUMNS, &["event"]),
    }
}
