use flate2::read::MultiGzDecoder;
use futures::StreamExt;
use std::io::Read;
use std::time::Duration;
use thiserror::Error;

/// Compressed response bodies beyond this size abort the fetch.
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB
/// Cap on the decompressed document, so a gzip bomb cannot exhaust memory.
const MAX_DECOMPRESSED_SIZE: u64 = 50 * 1024 * 1024; // 50MB

/// Errors that can occur while retrieving and decompressing the feed body.
///
/// Every variant is terminal for the current fetch cycle: the pipeline makes
/// exactly one attempt and the caller clears shared state on failure.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Proxy address could not be turned into a usable proxy
    #[error("Invalid proxy address: {0}")]
    Proxy(#[source] reqwest::Error),
    /// HTTP client construction failed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    /// Network-level error (DNS, connection, TLS, timeout, body read)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Compressed response body exceeded the size limit
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// Body was not valid gzip, or decompression failed partway through
    #[error("Invalid gzip body: {0}")]
    Gzip(#[source] std::io::Error),
    /// Decompressed payload exceeded the size limit
    #[error("Decompressed feed too large (exceeds {0} bytes)")]
    DecompressedTooLarge(u64),
}

/// Fetch the feed document at `url` and return its decompressed bytes.
///
/// The request advertises `Accept-Encoding: gzip` and the body is expected
/// to come back compressed; it is inflated here rather than by reqwest so a
/// corrupt body is diagnosed instead of silently passed along. A non-empty
/// `proxy` address routes the request through that proxy; proxy or client
/// construction failures are fetch failures like any other. One attempt, no
/// retries — the caller decides when to try again.
pub async fn fetch_feed(
    url: &str,
    proxy: Option<&str>,
    timeout: Duration,
) -> Result<Vec<u8>, FetchError> {
    let client = build_client(proxy, timeout)?;

    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT_ENCODING, "gzip")
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    let body = read_limited_bytes(response, MAX_BODY_SIZE).await?;
    let contents = decompress(&body)?;

    tracing::debug!(
        compressed = body.len(),
        decompressed = contents.len(),
        "Fetched feed body"
    );

    Ok(contents)
}

/// Build a one-shot client: direct, or routed through `proxy` when given.
///
/// An empty proxy address means a direct connection.
fn build_client(proxy: Option<&str>, timeout: Duration) -> Result<reqwest::Client, FetchError> {
    let mut builder = reqwest::Client::builder().timeout(timeout);

    if let Some(addr) = proxy.filter(|addr| !addr.is_empty()) {
        let proxy = reqwest::Proxy::all(addr).map_err(FetchError::Proxy)?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(FetchError::Client)
}

/// Stream the response body into memory, refusing anything over `limit`.
async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: trust a Content-Length that already exceeds the limit
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

/// Inflate a gzip body, bounded by [`MAX_DECOMPRESSED_SIZE`].
///
/// A body of several back-to-back members (legal per RFC 1952) decodes to
/// the concatenation of all of them. Trailing bytes that do not start
/// another member are an error, never silently dropped.
fn decompress(body: &[u8]) -> Result<Vec<u8>, FetchError> {
    let mut decoder = MultiGzDecoder::new(body).take(MAX_DECOMPRESSED_SIZE + 1);
    let mut contents = Vec::new();
    decoder.read_to_end(&mut contents).map_err(FetchError::Gzip)?;

    if contents.len() as u64 > MAX_DECOMPRESSED_SIZE {
        return Err(FetchError::DecompressedTooLarge(MAX_DECOMPRESSED_SIZE));
    }

    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[tokio::test]
    async fn test_fetch_decompresses_gzip_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("Accept-Encoding", "gzip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip(b"{\"entries\": []}")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let bytes = fetch_feed(&format!("{}/feed.json", mock_server.uri()), None, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(bytes, b"{\"entries\": []}");
    }

    #[tokio::test]
    async fn test_non_gzip_body_is_rejected() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("plain json, no gzip"))
            .mount(&mock_server)
            .await;

        let err = fetch_feed(&mock_server.uri(), None, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Gzip(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_truncated_gzip_body_is_rejected() {
        let body = gzip(b"a reasonably long payload that compresses to something");
        let truncated = &body[..body.len() / 2];

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(truncated.to_vec()))
            .mount(&mock_server)
            .await;

        let err = fetch_feed(&mock_server.uri(), None, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Gzip(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_trailing_garbage_after_gzip_is_rejected() {
        // A valid member followed by junk must fail the fetch, not quietly
        // decode to the first member
        let mut body = gzip(b"{\"entries\": []}");
        body.extend_from_slice(b"junk after the gzip trailer");

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&mock_server)
            .await;

        let err = fetch_feed(&mock_server.uri(), None, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Gzip(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_concatenated_gzip_members_decode_fully() {
        // RFC 1952 allows several members back to back; the payload is their
        // concatenation, not just the first member
        let mut body = gzip(b"{\"entries\": [");
        body.extend_from_slice(&gzip(b"]}"));

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&mock_server)
            .await;

        let bytes = fetch_feed(&mock_server.uri(), None, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(bytes, b"{\"entries\": []}");
    }

    #[tokio::test]
    async fn test_http_error_status_fails_without_retry() {
        let mock_server = MockServer::start().await;
        // expect(1) doubles as the no-retry check: a second attempt would
        // fail mock verification on drop
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let err = fetch_feed(&mock_server.uri(), None, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus(500)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_not_found_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let err = fetch_feed(&mock_server.uri(), None, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus(404)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_connection_failure_is_network_error() {
        // Port 1 is reserved and essentially never bound
        let err = fetch_feed("http://127.0.0.1:1/feed.json", None, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_invalid_proxy_address_is_a_fetch_failure() {
        let err = fetch_feed(
            "http://127.0.0.1:1/feed.json",
            Some("not a proxy address"),
            TIMEOUT,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FetchError::Proxy(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_empty_proxy_address_means_direct() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip(b"{}")))
            .mount(&mock_server)
            .await;

        let bytes = fetch_feed(&mock_server.uri(), Some(""), TIMEOUT)
            .await
            .unwrap();
        assert_eq!(bytes, b"{}");
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; MAX_BODY_SIZE + 1]))
            .mount(&mock_server)
            .await;

        let err = fetch_feed(&mock_server.uri(), None, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::ResponseTooLarge(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_gzip_bomb_is_rejected() {
        // ~50MB of zeros compresses to a few tens of KB
        let bomb = gzip(&vec![0u8; (MAX_DECOMPRESSED_SIZE + 1) as usize]);

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(bomb))
            .mount(&mock_server)
            .await;

        let err = fetch_feed(&mock_server.uri(), None, TIMEOUT)
            .await
            .unwrap_err();
        assert!(
            matches!(err, FetchError::DecompressedTooLarge(_)),
            "got {err:?}"
        );
    }
}
