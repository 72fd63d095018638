//! Exercises `GitlabProvider` against a one-shot local HTTP server.

use gitlab_focus_host_data::{EpicRef, GitlabProvider, HostDataError, HostDataProvider};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Reads one HTTP/1.1 request, headers and `Content-Length` body.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.expect("read request");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                return text;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

/// Serves a single canned response and hands back the raw request.
async fn serve_once(status_line: &'static str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let body = body.to_string();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.expect("write response");
        let _ = socket.shutdown().await;
        request
    });

    (format!("http://{addr}"), handle)
}

fn provider(origin: &str) -> GitlabProvider {
    let client = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("client");
    GitlabProvider::with_client(&format!("{origin}/acme/app/-/issues/1"), client)
        .expect("provider")
        .with_csrf_token("csrf-123")
}

#[tokio::test]
async fn fetch_labels_requests_json_suffix_and_decodes_labels() {
    let (origin, server) = serve_once(
        "200 OK",
        r##"{"project_id": 17, "labels": [
            {"id": 1, "title": "bug", "color": "#FF0000", "text_color": "#FFFFFF", "description": "Broken"},
            {"id": 2, "title": "area::backend", "color": "#F0AD4E", "text_color": "#333333", "description": null}
        ]}"##,
    )
    .await;

    let labels = provider(&origin)
        .fetch_labels("/acme/app/-/issues/42")
        .await
        .expect("labels");

    let request = server.await.expect("server task");
    assert!(request.starts_with("GET /acme/app/-/issues/42.json HTTP/1.1"), "{request}");
    assert!(request.to_lowercase().contains("x-csrf-token: csrf-123"));
    assert!(request.to_lowercase().contains("accept: application/json"));

    assert_eq!(labels.project_id, Some(17));
    let titles: Vec<_> = labels.labels.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(titles, ["bug", "area::backend"]);
    assert_eq!(labels.labels[1].project_id, Some(17));
}

#[tokio::test]
async fn fetch_labels_reports_http_errors() {
    let (origin, server) = serve_once("404 Not Found", r#"{"message":"404 Not found"}"#).await;

    let err = provider(&origin)
        .fetch_labels("/acme/app/-/issues/404")
        .await
        .expect_err("404 should fail");

    server.await.expect("server task");
    assert!(matches!(err, HostDataError::Status { status: 404, .. }), "{err}");
}

#[tokio::test]
async fn fetch_descendant_counts_posts_graphql_query() {
    let (origin, server) = serve_once(
        "200 OK",
        r#"{"data":{"group":{"epic":{"descendantWeightSum":{"openedIssues":3,"closedIssues":7}}}}}"#,
    )
    .await;
    let epic = EpicRef {
        origin: origin.clone(),
        group_path: "acme/platform".to_string(),
        epic_iid: 12,
    };

    let counts = provider(&origin)
        .fetch_descendant_counts(&epic)
        .await
        .expect("counts");

    let request = server.await.expect("server task");
    assert!(request.starts_with("POST /api/graphql HTTP/1.1"), "{request}");
    assert!(request.contains(r#""groupFullPath":"acme/platform""#));
    assert!(request.contains(r#""epicIid":"12""#));
    assert_eq!(counts.opened_issues, 3);
    assert_eq!(counts.closed_issues, 7);
}
