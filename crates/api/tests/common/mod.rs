//! Shared helpers for API integration tests.
//!
//! Mirrors the router construction in `main.rs` so integration tests
//! exercise the same middleware stack (CORS, request ID, timeout,
//! panic recovery) that production uses. The converter is a fake shell
//! script driven through `bash`, so the tests need no Python install.

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use planserve_api::config::ServerConfig;
use planserve_api::routes;
use planserve_api::state::AppState;

/// Fake converter understanding just enough of the real CLI to honor
/// `-o` and `--stats-output`. It prints the phrases the progress
/// estimator matches on, writes a tiny drawing, and records stats.
pub const FAKE_CONVERTER: &str = r#"
out=""
stats=""
while [ "$#" -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    --stats-output) stats="$2"; shift 2 ;;
    *) shift ;;
  esac
done
echo "Parsing OSM data..."
echo "Processing 120 nodes..."
echo "Processing 40 ways..."
echo "Generating DXF..."
printf 'DXF-BYTES' > "$out"
printf '{"nodes":120,"ways":40,"relations":3,"layers":7}' > "$stats"
"#;

/// Fake converter that fails the way a real conversion does: a
/// diagnostic on stderr and a non-zero exit code.
pub const FAILING_CONVERTER: &str = "echo \"bad geometry\" >&2\nexit 1\n";

/// Build a test `ServerConfig` rooted in `workdir`.
///
/// Uses `bash` as the only runtime candidate so the fake shell
/// converter runs through the same probe-and-launch path as the real
/// Python one.
pub fn test_config(workdir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        upload_dir: workdir.join("uploads"),
        output_dir: workdir.join("output"),
        converter_script: workdir.join("convert.sh"),
        runtime_candidates: vec!["bash".to_string()],
        history_capacity: 5,
    }
}

/// Write the fixture tree under `workdir`: upload and output
/// directories, the converter script, and a sample input file.
pub fn write_fixtures(workdir: &Path, converter_body: &str) {
    std::fs::create_dir_all(workdir.join("uploads")).unwrap();
    std::fs::create_dir_all(workdir.join("output")).unwrap();
    std::fs::write(workdir.join("convert.sh"), converter_body).unwrap();
    std::fs::write(workdir.join("uploads").join("site.osm"), "<osm/>").unwrap();
}

/// Build the full application router with all middleware layers.
pub fn build_test_app(config: ServerConfig) -> Router {
    let state = AppState::new(config);

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// Issue a GET request against the app.
pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Issue a POST request with a JSON body against the app.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body into raw bytes.
pub async fn body_bytes(response: Response) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}

/// Poll the status endpoint until the job reaches a terminal state,
/// returning the final record snapshot.
pub async fn poll_until_terminal(app: &Router, job_id: &str) -> serde_json::Value {
    for _ in 0..200 {
        let response = get(app.clone(), &format!("/api/v1/conversions/{job_id}")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let status = json["data"]["status"].as_str().unwrap_or_default().to_string();
        if status == "completed" || status == "error" {
            return json["data"].clone();
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("job {job_id} did not reach a terminal state in time");
}
