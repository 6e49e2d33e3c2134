//! Turns a downloaded body into UTF-8 markup.
//!
//! Charset resolution order: byte-order mark, `Content-Type` header,
//! `<meta charset>` / `http-equiv` declarations in the first 4KB, then
//! `chardetng` guessing.

use crate::fetcher::{
    errors::FetchError,
    types::{Charset, PageResponse},
};
use bytes::Bytes;
use chrono::Utc;
use encoding_rs::Encoding;
use regex::Regex;
use reqwest::{StatusCode, header::HeaderMap};
use std::sync::LazyLock;
use url::Url;

const SNIFF_WINDOW: usize = 4096;

static HEADER_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static MARKUP_CHARSET: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap(),
        Regex::new(r#"(?i)<meta\s+[^>]*?http-equiv\s*=\s*["']?content-type["']?[^>]*?content\s*=\s*["']?[^"'>]*?charset\s*=\s*([^"'\s;/>]+)"#).unwrap(),
    ]
});

pub fn process_response(
    url_final: Url,
    status: StatusCode,
    headers: HeaderMap,
    body_bytes: Bytes,
    content_type: &str,
) -> Result<PageResponse, FetchError> {
    let encoding = resolve_encoding(content_type, &body_bytes);
    let body_utf8 = decode_body(&body_bytes, encoding)?;

    Ok(PageResponse {
        url_final,
        status,
        headers,
        body_raw: body_bytes,
        body_utf8,
        charset: Charset::from_encoding(encoding),
        fetched_at: Utc::now(),
    })
}

fn resolve_encoding(content_type: &str, body: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(body) {
        return encoding;
    }

    if let Some(encoding) = label_from(&HEADER_CHARSET, content_type) {
        return encoding;
    }

    let window = &body[..body.len().min(SNIFF_WINDOW)];
    let head = String::from_utf8_lossy(window);
    if let Some(encoding) = MARKUP_CHARSET
        .iter()
        .find_map(|pattern| label_from(pattern, &head))
    {
        return encoding;
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(window, body.len() <= SNIFF_WINDOW);
    detector.guess(None, true)
}

fn label_from(pattern: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let label = pattern.captures(haystack)?.get(1)?.as_str().to_lowercase();
    Encoding::for_label(label.as_bytes())
}

/// Decodes `body` strictly; malformed sequences are an error rather than
/// silently replaced, so a mislabelled page never lands in a snapshot.
pub fn decode_body(body: &[u8], encoding: &'static Encoding) -> Result<String, FetchError> {
    let (decoded, used, had_errors) = encoding.decode(body);
    if had_errors {
        return Err(FetchError::Charset(format!(
            "failed to decode content as {}",
            used.name()
        )));
    }
    Ok(decoded.into_owned())
}
