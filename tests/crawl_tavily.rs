// tests/crawl_tavily.rs
//
// Search-API fetcher against a local stand-in for the Tavily endpoint.

use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use report_pipeline::crawl::{FetchStatus, Fetcher, TavilyClient};

/// Read one HTTP request and return its body.
async fn read_request(sock: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = sock.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return Vec::new();
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let len = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + len {
        let n = sock.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    buf[header_end..].to_vec()
}

/// Answer every POST with `status` and a JSON `body` after `delay`. Request
/// bodies are forwarded on the returned channel.
async fn serve(
    status: &'static str,
    body: &'static str,
    delay: Duration,
) -> (String, mpsc::UnboundedReceiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        loop {
            let Ok((mut sock, _)) = listener.accept().await else {
                return;
            };
            let tx = tx.clone();
            tokio::spawn(async move {
                let req = read_request(&mut sock).await;
                let _ = tx.send(req);
                tokio::time::sleep(delay).await;
                let resp = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = sock.write_all(resp.as_bytes()).await;
                let _ = sock.shutdown().await;
            });
        }
    });
    (format!("http://{addr}/search"), rx)
}

fn client(endpoint: &str, timeout: Duration) -> TavilyClient {
    TavilyClient::new("tvly-test".into(), timeout)
        .expect("client")
        .with_endpoint(endpoint)
}

#[tokio::test]
async fn search_request_carries_key_and_flags() {
    let (endpoint, mut requests) = serve(
        "200 OK",
        r#"{"answer":"Rates held at 5.25%.","results":[{"title":"Fed decision","content":"snippet","raw_content":"raw page"}]}"#,
        Duration::ZERO,
    )
    .await;

    let res = client(&endpoint, Duration::from_secs(5))
        .fetch("https://news.test/fed")
        .await;
    assert_eq!(res.status, FetchStatus::Success);
    assert_eq!(res.url, "https://news.test/fed");
    assert_eq!(res.title, "Fed decision");
    assert_eq!(res.content, "Rates held at 5.25%.");

    let body: Value = serde_json::from_slice(&requests.recv().await.expect("request")).unwrap();
    assert_eq!(body["api_key"], "tvly-test");
    assert_eq!(body["query"], "https://news.test/fed");
    assert_eq!(body["search_depth"], "basic");
    assert_eq!(body["include_answer"], true);
    assert_eq!(body["include_raw_content"], true);
}

#[tokio::test]
async fn raw_content_is_used_without_an_answer() {
    let (endpoint, _requests) = serve(
        "200 OK",
        r#"{"answer":"","results":[{"title":"Page","content":"snippet","raw_content":"full page text"}]}"#,
        Duration::ZERO,
    )
    .await;

    let res = client(&endpoint, Duration::from_secs(5)).fetch("https://a.test").await;
    assert_eq!(res.status, FetchStatus::Success);
    assert_eq!(res.content, "full page text");
}

#[tokio::test]
async fn error_status_names_the_search_api() {
    let (endpoint, _requests) =
        serve("500 Internal Server Error", r#"{"detail":"boom"}"#, Duration::ZERO).await;

    let res = client(&endpoint, Duration::from_secs(5)).fetch("https://a.test").await;
    assert_eq!(res.status, FetchStatus::Failed);
    assert_eq!(
        res.error.as_deref(),
        Some("Tavily API error 500 Internal Server Error")
    );
    assert!(res.content.is_empty());
}

#[tokio::test]
async fn slow_search_reports_timeout() {
    let (endpoint, _requests) =
        serve("200 OK", r#"{"answer":"late"}"#, Duration::from_secs(3)).await;

    let res = client(&endpoint, Duration::from_millis(200)).fetch("https://a.test").await;
    assert_eq!(res.status, FetchStatus::Failed);
    assert_eq!(res.error.as_deref(), Some("Timeout"));
}

#[tokio::test]
async fn malformed_json_is_a_failed_fetch() {
    let (endpoint, _requests) = serve("200 OK", "{not json", Duration::ZERO).await;

    let res = client(&endpoint, Duration::from_secs(5)).fetch("https://a.test").await;
    assert_eq!(res.status, FetchStatus::Failed);
    let err = res.error.expect("decode error detail");
    assert_ne!(err, "Timeout");
    assert!(err.contains("decoding"), "unexpected error: {err}");
}

#[tokio::test]
async fn empty_results_fail_without_detail() {
    let (endpoint, _requests) = serve("200 OK", r#"{"results":[]}"#, Duration::ZERO).await;

    let res = client(&endpoint, Duration::from_secs(5)).fetch("https://a.test").await;
    assert_eq!(res.status, FetchStatus::Failed);
    assert!(res.error.is_none());
}
