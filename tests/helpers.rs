#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use marketcal::{jobs::Clock, sources::SourceDefinition};
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

pub const EARNINGS_PAGE: &str =
    include_str!("../src/extractor/tests/fixtures/investing_earnings.html");
pub const CALENDAR_PAGE: &str =
    include_str!("../src/extractor/tests/fixtures/marketwatch_calendar.html");
pub const EMPTY_PAGE: &str = include_str!("../src/extractor/tests/fixtures/empty.html");

/// Points `source` at `route` on the mock server.
pub fn served_from(mut source: SourceDefinition, server: &MockServer, route: &str) -> SourceDefinition {
    source.url = Url::parse(&format!("{}{}", server.uri(), route)).unwrap();
    source
}

pub async fn serve_html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body.as_bytes().to_vec(), "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

pub async fn serve_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// 2025-10-14 at the given local wall-clock time.
pub fn local_time(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 10, 14)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
