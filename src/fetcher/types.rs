use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::{StatusCode, header::HeaderMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Charset {
    Utf8,
    Windows1252,
    ShiftJis,
    Gb2312,
    Big5,
    Other(String),
}

impl Charset {
    pub fn from_encoding(encoding: &'static encoding_rs::Encoding) -> Self {
        use std::ptr;

        if ptr::eq(encoding, encoding_rs::UTF_8) {
            Self::Utf8
        } else if ptr::eq(encoding, encoding_rs::WINDOWS_1252) {
            Self::Windows1252
        } else if ptr::eq(encoding, encoding_rs::SHIFT_JIS) {
            Self::ShiftJis
        } else if ptr::eq(encoding, encoding_rs::GBK) || ptr::eq(encoding, encoding_rs::GB18030) {
            Self::Gb2312
        } else if ptr::eq(encoding, encoding_rs::BIG5) {
            Self::Big5
        } else {
            Self::Other(encoding.name().to_string())
        }
    }
}

/// Per-source request settings handed to the page loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    #[serde(with = "duration_secs", rename = "timeout_secs")]
    pub timeout: Duration,
    /// The page needs script execution to render its rows. Loaders that cannot
    /// run scripts fetch the static markup instead.
    pub javascript: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
            timeout: Duration::from_secs(30),
            javascript: false,
        }
    }
}

impl FetchOptions {
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_javascript(mut self, javascript: bool) -> Self {
        self.javascript = javascript;
        self
    }

    /// Cookies rendered as a single `Cookie` header value, or `None` when empty.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

pub(crate) mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[derive(Debug)]
pub struct PageResponse {
    pub url_final: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body_raw: Bytes,
    pub body_utf8: String,
    pub charset: Charset,
    pub fetched_at: DateTime<Utc>,
}

impl PageResponse {
    /// Wraps already-decoded markup, e.g. a saved page or a test fixture.
    pub fn from_html(url: Url, html: impl Into<String>) -> Self {
        let body_utf8 = html.into();
        Self {
            url_final: url,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body_raw: Bytes::from(body_utf8.clone()),
            body_utf8,
            charset: Charset::Utf8,
            fetched_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_header_joins_pairs() {
        let options = FetchOptions::default()
            .with_cookie("PHPSESSID", "abc")
            .with_cookie("adBlockerNewUserDomains", "1");
        assert_eq!(
            options.cookie_header().as_deref(),
            Some("PHPSESSID=abc; adBlockerNewUserDomains=1")
        );
        assert_eq!(FetchOptions::default().cookie_header(), None);
    }

    #[test]
    fn test_fetch_options_deserialize_defaults() {
        let options: FetchOptions =
            serde_json::from_str(r#"{"timeout_secs": 90, "javascript": true}"#).unwrap();
        assert_eq!(options.timeout, Duration::from_secs(90));
        assert!(options.javascript);
        assert!(options.headers.is_empty());
    }

    #[test]
    fn test_latin1_labels_resolve_to_windows_1252() {
        for label in [&b"iso-8859-1"[..], b"latin1", b"windows-1252"] {
            let encoding = encoding_rs::Encoding::for_label(label).unwrap();
            assert_eq!(Charset::from_encoding(encoding), Charset::Windows1252);
        }
        assert_eq!(
            Charset::from_encoding(encoding_rs::ISO_8859_2),
            Charset::Other("ISO-8859-2".to_string())
        );
    }
}
