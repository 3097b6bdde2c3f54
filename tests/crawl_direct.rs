// tests/crawl_direct.rs
//
// Direct page fetch against a throwaway local HTTP server.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use report_pipeline::crawl::{fetch_all, DirectFetcher, FetchStatus, Fetcher};

/// Serve every connection with `status` and `body`, after `delay`.
async fn serve(status: &'static str, body: &'static str, delay: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        loop {
            let Ok((mut sock, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = sock.read(&mut buf).await;
                tokio::time::sleep(delay).await;
                let resp = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: text/html; charset=utf-8\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = sock.write_all(resp.as_bytes()).await;
                let _ = sock.shutdown().await;
            });
        }
    });
    format!("http://{addr}/page")
}

fn fetcher(timeout: Duration) -> DirectFetcher {
    DirectFetcher::new(timeout, 5000).expect("client")
}

#[tokio::test]
async fn html_page_becomes_visible_text() {
    let url = serve(
        "200 OK",
        "<html><head><title>Quarterly update</title></head><body><script>track()</script><p>Revenue &amp; margin up.</p></body></html>",
        Duration::ZERO,
    )
    .await;

    let res = fetcher(Duration::from_secs(5)).fetch(&url).await;
    assert_eq!(res.status, FetchStatus::Success);
    assert_eq!(res.title, "Quarterly update");
    assert_eq!(res.content, "Revenue & margin up.");
    assert!(res.error.is_none());
}

#[tokio::test]
async fn error_status_is_a_failed_fetch() {
    let url = serve("404 Not Found", "missing", Duration::ZERO).await;
    let res = fetcher(Duration::from_secs(5)).fetch(&url).await;
    assert_eq!(res.status, FetchStatus::Failed);
    assert_eq!(res.error.as_deref(), Some("HTTP 404 Not Found"));
    assert!(res.content.is_empty());
}

#[tokio::test]
async fn slow_server_reports_timeout() {
    let url = serve("200 OK", "<p>late</p>", Duration::from_secs(3)).await;
    let res = fetcher(Duration::from_millis(200)).fetch(&url).await;
    assert_eq!(res.status, FetchStatus::Failed);
    assert_eq!(res.error.as_deref(), Some("Timeout"));
}

#[tokio::test]
async fn page_without_text_fails_without_detail() {
    let url = serve("200 OK", "<html><body><script>x()</script></body></html>", Duration::ZERO).await;
    let res = fetcher(Duration::from_secs(5)).fetch(&url).await;
    assert_eq!(res.status, FetchStatus::Failed);
    assert!(res.error.is_none());
}

#[tokio::test]
async fn fetch_all_keeps_input_order_and_isolates_failures() {
    let ok = serve("200 OK", "<p>fine content</p>", Duration::from_millis(100)).await;
    let bad = serve("500 Internal Server Error", "boom", Duration::ZERO).await;
    let f = fetcher(Duration::from_secs(5));

    let results = fetch_all(&f, &[ok.as_str(), bad.as_str(), "not a url"]).await;
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].url, ok);
    assert!(results[0].is_success());
    assert_eq!(results[1].error.as_deref(), Some("HTTP 500 Internal Server Error"));
    assert!(!results[2].is_success());
}
