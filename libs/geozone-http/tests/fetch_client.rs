//! ResilientFetchClient against a local axum server

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use geozone_domain::ports::TextFetcher;
use geozone_domain::ResolveError;
use geozone_http::{FetchClientConfig, NetworkPath, ResilientFetchClient};

async fn spawn_upstream() -> SocketAddr {
    let app = Router::new()
        .route("/ok", get(|| async { r#"{"status": "ok"}"# }))
        .route(
            "/xml",
            get(|| async { "<OpenAPI_ServiceResponse><returnAuthMsg>SERVICE_KEY_IS_NOT_REGISTERED_ERROR</returnAuthMsg></OpenAPI_ServiceResponse>" }),
        )
        .route(
            "/unavailable",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "try later") }),
        )
        .route(
            "/relay",
            get(|params: Query<HashMap<String, String>>| async move {
                format!("relayed:{}", params.get("target").cloned().unwrap_or_default())
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(paths: Vec<NetworkPath>) -> ResilientFetchClient {
    ResilientFetchClient::new(FetchClientConfig {
        paths,
        timeout: Duration::from_secs(5),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_direct_success_returns_raw_text() {
    let addr = spawn_upstream().await;
    let client = client(vec![NetworkPath::Direct]);

    let body = client.fetch_text(&format!("http://{}/ok", addr)).await.unwrap();
    assert_eq!(body, r#"{"status": "ok"}"#);

    // XML envelopes with HTTP 200 are handed back untouched for the caller to sniff
    let xml = client.fetch_text(&format!("http://{}/xml", addr)).await.unwrap();
    assert!(xml.starts_with("<OpenAPI_ServiceResponse>"));
}

#[tokio::test]
async fn test_non_2xx_falls_back_to_relay_and_remembers_it() {
    let addr = spawn_upstream().await;
    let client = client(vec![
        NetworkPath::Direct,
        NetworkPath::relay(format!("http://{}/relay?target={{url}}", addr)),
    ]);

    let upstream = format!("http://{}/unavailable", addr);
    let body = client.fetch_text(&upstream).await.unwrap();
    assert_eq!(body, format!("relayed:{}", upstream));
    assert_eq!(client.preferred_path(), 1);

    // The relay now goes first, even though direct would succeed
    let ok = format!("http://{}/ok", addr);
    let body = client.fetch_text(&ok).await.unwrap();
    assert_eq!(body, format!("relayed:{}", ok));
}

#[tokio::test]
async fn test_all_paths_failing_reports_last_error_without_secrets() {
    let addr = spawn_upstream().await;
    let client = client(vec![
        NetworkPath::Direct,
        NetworkPath::relay(format!("http://{}/unavailable?target={{url}}", addr)),
    ]);

    let err = client
        .fetch_text(&format!("http://{}/unavailable?serviceKey=top-secret", addr))
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    match err {
        ResolveError::AllPathsFailed { url, attempts, last } => {
            assert_eq!(attempts, 2);
            assert!(last.contains("503"), "{}", last);
            assert!(!url.contains("top-secret"), "{}", url);
            assert!(url.contains("serviceKey=***"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_refused_is_a_failed_path() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);

    let client = client(vec![NetworkPath::Direct]);
    let err = client
        .fetch_text(&format!("http://{}/ok", dead))
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::AllPathsFailed { attempts: 1, .. }));
}
