//! Investing.com earnings calendar.

use std::time::Duration;
use url::Url;

use crate::{
    extractor::{FieldRule, RuleSet},
    fetcher::FetchOptions,
    sources::SourceDefinition,
    validator::ValidationRules,
};

pub const NAME: &str = "investing";
pub const URL: &str = "https://www.investing.com/earnings-calendar/";
pub const COLUMNS: [&str; 9] = [
    "date",
    "country",
    "company_name",
    "symbol",
    "eps_forecast",
    "eps_actual",
    "revenue_forecast",
    "revenue_actual",
    "market_cap",
];

pub fn definition() -> SourceDefinition {
    let rules = RuleSet::new(".earningsCalendarDiv table tbody tr")
        .with_field(FieldRule::text("date", ".theDay"))
        .with_field(FieldRule::attr("country", "td:nth-child(2) span", "title"))
        .with_field(FieldRule::text("company_name", "td.symbolColumn a"))
        .with_field(FieldRule::text("symbol", "td.symbolColumn span"))
        .with_field(FieldRule::text("eps_forecast", "td.eps.bold"))
        .with_field(FieldRule::text("eps_actual", "td.actual.bold"))
        .with_field(FieldRule::text("revenue_forecast", "td.rev.bold"))
        .with_field(FieldRule::text("revenue_actual", "td.actualRev.bold"))
        .with_field(FieldRule::text("market_cap", "td.marketCap"))
        .with_period(".currentDateView")
        .with_wait_timeout(Duration::from_secs(90));

    SourceDefinition {
        name: NAME.to_string(),
        url: Url::parse(URL).expect("valid investing url"),
        fetch: FetchOptions::default()
            .with_header("Accept-Language", "en-US,en;q=0.9")
            .with_header("Referer", "https://www.investing.com/")
            .with_cookie("adBlockerNewUserDomains", "1633094489")
            .with_timeout(Duration::from_secs(90))
            .with_javascript(true),
        rules,
        columns: COLUMNS.iter().map(|c| c.to_string()).collect(),
        file_stem: "investing_earnings_data".to_string(),
        metadata_stem: "investing_metadata".to_string(),
        latest_file: "latest_earnings_data.csv".to_string(),
        period_key: "period".to_string(),
        validation: ValidationRules::new(&["date", "company_name", "symbol"], &["symbol"]),
    }
}
