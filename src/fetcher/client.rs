use crate::fetcher::{
    errors::{FetchError, is_transient_status},
    decode::process_response,
    types::{FetchOptions, PageResponse},
};
use async_trait::async_trait;
use reqwest::{
    Client, ClientBuilder,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Source of rendered pages. The extraction pipeline only ever talks to a
/// loader through this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageLoader: Send + Sync {
    async fn load(&self, url: &Url, options: &FetchOptions) -> Result<PageResponse, FetchError>;
}

/// Loader backed by a plain HTTP client. It does not execute scripts.
#[derive(Clone)]
pub struct HttpPageLoader {
    client: Client,
}

impl HttpPageLoader {
    pub fn new() -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .default_headers({
                let mut headers = HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    HeaderValue::from_static(
                        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                    ),
                );
                headers
            })
            .build()
            .map_err(|e| FetchError::Unknown(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageLoader for HttpPageLoader {
    #[instrument(skip_all, fields(url = %url))]
    async fn load(&self, url: &Url, options: &FetchOptions) -> Result<PageResponse, FetchError> {
        if options.javascript {
            debug!("source expects script rendering; fetching static markup");
        }

        let response = self
            .client
            .get(url.clone())
            .headers(request_headers(options)?)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        // Check content length before downloading
        if let Some(content_length) = response.content_length()
            && content_length > MAX_BODY_SIZE
        {
            return Err(FetchError::BodyTooLarge(content_length));
        }

        let final_url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();

        if !status.is_success() {
            return Err(FetchError::Http {
                status,
                transient: is_transient_status(status),
            });
        }

        let content_type = headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        let body_bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Io(e.to_string()))?;

        // Content-Length may have been missing
        if body_bytes.len() as u64 > MAX_BODY_SIZE {
            return Err(FetchError::BodyTooLarge(body_bytes.len() as u64));
        }

        process_response(final_url, status, headers, body_bytes, &content_type)
    }
}

fn request_headers(options: &FetchOptions) -> Result<HeaderMap, FetchError> {
    let mut map = HeaderMap::new();
    for (name, value) in &options.headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| FetchError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| FetchError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        map.insert(header_name, header_value);
    }
    if let Some(cookie) = options.cookie_header() {
        let value = HeaderValue::from_str(&cookie).map_err(|e| FetchError::InvalidHeader {
            name: "cookie".to_string(),
            reason: e.to_string(),
        })?;
        map.insert(reqwest::header::COOKIE, value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_headers_include_cookie() {
        let options = FetchOptions::default()
            .with_header("Accept-Language", "en-US,en;q=0.9")
            .with_cookie("PHPSESSID", "abc");
        let headers = request_headers(&options).unwrap();
        assert_eq!(headers["accept-language"], "en-US,en;q=0.9");
        assert_eq!(headers[reqwest::header::COOKIE], "PHPSESSID=abc");
    }

    #[test]
    fn test_request_headers_reject_bad_name() {
        let options = FetchOptions::default().with_header("bad header", "x");
        assert!(matches!(
            request_headers(&options),
            Err(FetchError::InvalidHeader { .. })
        ));
    }
}
