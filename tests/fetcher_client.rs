use marketcal::fetcher::{Charset, FetchError, FetchOptions, HttpPageLoader, PageLoader};
use std::time::Duration;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

fn url(server: &MockServer, route: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), route)).unwrap()
}

async fn load(server: &MockServer, route: &str, options: &FetchOptions) -> Result<marketcal::fetcher::PageResponse, FetchError> {
    HttpPageLoader::new()
        .unwrap()
        .load(&url(server, route), options)
        .await
}

#[tokio::test]
async fn test_load_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendar"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(
                    "<html><head><title>Calendar</title></head><body>CPI</body></html>".as_bytes(),
                )
                .insert_header("Content-Type", "text/html; charset=utf-8"),
        )
        .mount(&mock_server)
        .await;

    let result = load(&mock_server, "/calendar", &FetchOptions::default())
        .await
        .unwrap();

    assert!(result.status.is_success());
    assert!(result.body_utf8.contains("CPI"));
    assert_eq!(result.charset, Charset::Utf8);
    assert_eq!(result.url_final, url(&mock_server, "/calendar"));
}

#[tokio::test]
async fn test_load_sends_source_headers_and_cookies() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/earnings-calendar/"))
        .and(header("accept-language", "en-US,en;q=0.9"))
        .and(header("cookie", "adBlockerNewUserDomains=1; gdpr=0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes("<html><body>ok</body></html>".as_bytes())
                .insert_header("Content-Type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let options = FetchOptions::default()
        .with_header("Accept-Language", "en-US,en;q=0.9")
        .with_cookie("gdpr", "0")
        .with_cookie("adBlockerNewUserDomains", "1");

    let result = load(&mock_server, "/earnings-calendar/", &options).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_load_404_is_not_transient() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notfound"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let result = load(&mock_server, "/notfound", &FetchOptions::default()).await;

    match result {
        Err(e @ FetchError::Http { status, .. }) => {
            assert_eq!(status.as_u16(), 404);
            assert!(!e.is_transient());
        }
        _ => panic!("Expected HTTP 404 error"),
    }
}

#[tokio::test]
async fn test_load_503_is_transient() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/error"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let result = load(&mock_server, "/error", &FetchOptions::default()).await;

    match result {
        Err(e @ FetchError::Http { status, .. }) => {
            assert_eq!(status.as_u16(), 503);
            assert!(e.is_transient());
        }
        _ => panic!("Expected HTTP 503 error"),
    }
}

#[tokio::test]
async fn test_load_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes("<html></html>".as_bytes())
                .insert_header("Content-Type", "text/html")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let options = FetchOptions::default().with_timeout(Duration::from_millis(100));
    let result = load(&mock_server, "/slow", &options).await;

    match result {
        Err(e @ FetchError::RequestTimeout) => assert!(e.is_transient()),
        other => panic!("Expected request timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_load_follows_redirect() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/economy-politics/calendar"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/final"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/final"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes("<html><body>Final page</body></html>".as_bytes())
                .insert_header("Content-Type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let result = load(
        &mock_server,
        "/economy-politics/calendar",
        &FetchOptions::default(),
    )
    .await
    .unwrap();

    assert!(result.body_utf8.contains("Final page"));
    assert!(result.url_final.as_str().ends_with("/final"));
}

#[tokio::test]
async fn test_load_gzip_compression() {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    let original_content =
        "<html><head><title>Compressed</title></head><body>Top stories</body></html>";

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(original_content.as_bytes()).unwrap();
    let compressed_data = encoder.finish().unwrap();

    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gzipped"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(compressed_data)
                .insert_header("Content-Type", "text/html; charset=utf-8")
                .insert_header("Content-Encoding", "gzip"),
        )
        .mount(&mock_server)
        .await;

    let result = load(&mock_server, "/gzipped", &FetchOptions::default())
        .await
        .unwrap();

    assert!(result.body_utf8.contains("Top stories"));
}

#[tokio::test]
async fn test_load_decodes_declared_charset() {
    let mock_server = MockServer::start().await;

    // "Société Générale" in windows-1252
    let mut body = b"<html><body>Soci".to_vec();
    body.push(0xE9);
    body.extend_from_slice(b"t");
    body.push(0xE9);
    body.extend_from_slice(b" G");
    body.push(0xE9);
    body.extend_from_slice(b"n");
    body.push(0xE9);
    body.extend_from_slice(b"rale</body></html>");

    Mock::given(method("GET"))
        .and(path("/legacy"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body)
                .insert_header("Content-Type", "text/html; charset=windows-1252"),
        )
        .mount(&mock_server)
        .await;

    let result = load(&mock_server, "/legacy", &FetchOptions::default())
        .await
        .unwrap();

    assert!(result.body_utf8.contains("Société Générale"));
    assert_eq!(result.charset, Charset::Windows1252);
}

#[tokio::test]
async fn test_load_unsupported_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/image"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF])
                .insert_header("Content-Type", "image/jpeg"),
        )
        .mount(&mock_server)
        .await;

    let result = load(&mock_server, "/image", &FetchOptions::default()).await;

    match result {
        Err(FetchError::UnsupportedContentType(content_type)) => {
            assert_eq!(content_type, "image/jpeg");
        }
        _ => panic!("Expected UnsupportedContentType error"),
    }
}

#[tokio::test]
async fn test_load_body_too_large() {
    let mock_server = MockServer::start().await;

    let large_body = "x".repeat(6 * 1024 * 1024);

    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(large_body.as_bytes())
                .insert_header("Content-Type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let result = load(&mock_server, "/large", &FetchOptions::default()).await;

    match result {
        Err(FetchError::BodyTooLarge(size)) => {
            assert_eq!(size, 6 * 1024 * 1024);
        }
        _ => panic!("Expected BodyTooLarge error"),
    }
}

#[test]
fn test_error_transient_classification() {
    assert!(!FetchError::InvalidUrl(url::ParseError::EmptyHost).is_transient());
    assert!(!FetchError::BodyTooLarge(1000).is_transient());
    assert!(!FetchError::UnsupportedContentType("image/png".to_string()).is_transient());
    assert!(!FetchError::Charset("Invalid encoding".to_string()).is_transient());

    assert!(FetchError::Dns("DNS failure".to_string()).is_transient());
    assert!(FetchError::ConnectTimeout.is_transient());
    assert!(FetchError::RequestTimeout.is_transient());

    assert!(
        !FetchError::Http {
            status: reqwest::StatusCode::FORBIDDEN,
            transient: false
        }
        .is_transient()
    );
    assert!(
        FetchError::Http {
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
            transient: true
        }
        .is_transient()
    );
}
