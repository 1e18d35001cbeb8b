//! Integration tests for Drishti API endpoints.
//!
//! These tests verify the full request/response cycle through the HTTP API.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum_test::TestServer;
use chrono::{NaiveDate, NaiveDateTime};
use tower::ServiceExt;

// Import from the drishti crate
use drishti::api::{AppState, router};
use drishti::config::{MapProvider, SimulationConfig};
use drishti::feed::SnapshotFeed;

fn ten_am() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2028, 4, 9)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

fn test_state(config: SimulationConfig, map_provider: MapProvider) -> AppState {
    AppState {
        feed: SnapshotFeed::seeded(config, 2028, ten_am()),
        map_provider,
    }
}

fn create_test_server() -> TestServer {
    let state = test_state(SimulationConfig::default(), MapProvider::Leaflet);
    TestServer::new(router(state)).unwrap()
}

fn create_advising_server() -> TestServer {
    let config = SimulationConfig {
        advisory_probability: 1.0,
        ..SimulationConfig::default()
    };
    TestServer::new(router(test_state(config, MapProvider::Leaflet))).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_health_via_oneshot() {
    let app = router(test_state(SimulationConfig::default(), MapProvider::Leaflet));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_snapshot_structure() {
    let server = create_test_server();

    let response = server.get("/snapshot").await;

    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert!(body["totalCrowd"].as_u64().unwrap() >= 3_000_000);
    assert_eq!(body["systemStatus"], "Operational");
    assert!(
        ["low", "medium", "high", "critical"].contains(&body["alertLevel"].as_str().unwrap())
    );

    let sectors: Vec<&str> = body["sectors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(sectors, ["S1", "S2", "S3", "S4"]);

    let checkpoints = body["checkpoints"].as_array().unwrap();
    assert_eq!(checkpoints.len(), 20);
    let low_stock = checkpoints
        .iter()
        .filter(|cp| cp["status"] == "low-stock")
        .count();
    assert_eq!(body["lowStockItems"].as_u64().unwrap() as usize, low_stock);

    let sos = body["sosAlerts"].as_array().unwrap();
    assert_eq!(body["activeSOS"].as_u64().unwrap() as usize, sos.len());

    assert_eq!(body["pilgrimPaths"]["type"], "FeatureCollection");
    assert_eq!(body["pilgrimPaths"]["features"].as_array().unwrap().len(), 500);
    assert_eq!(
        body["crowdPredictions"].as_array().unwrap().len(),
        sectors.len()
    );
}

#[tokio::test]
async fn test_refresh_bumps_generation() {
    let server = create_test_server();

    let first: serde_json::Value = server.post("/snapshot/refresh").await.json();
    let second: serde_json::Value = server.post("/snapshot/refresh").await.json();

    assert_eq!(first["generation"], 1);
    assert_eq!(second["generation"], 2);

    let snapshot: serde_json::Value = server.get("/snapshot").await.json();
    assert_eq!(snapshot["totalCrowd"], second["totalCrowd"]);
}

#[tokio::test]
async fn test_get_kpis() {
    let server = create_test_server();

    let response = server.get("/snapshot/kpis").await;

    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let snapshot: serde_json::Value = server.get("/snapshot").await.json();
    assert_eq!(
        body["threatLevel"].as_str().unwrap(),
        snapshot["alertLevel"].as_str().unwrap().to_uppercase()
    );
    assert_eq!(body["responseSlaSeconds"], snapshot["avgResponseTime"]);
    assert!(body["warnings"].is_object());
}

#[tokio::test]
async fn test_get_analytics() {
    let server = create_test_server();

    let response = server.get("/analytics").await;

    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["density"].as_array().unwrap().len(), 4);
    assert_eq!(body["hourlyCrowd"].as_array().unwrap().len(), 12);
    assert_eq!(body["responseTimes"][0]["t"], "06:00");
}

#[tokio::test]
async fn test_choke_points_sorted() {
    let server = create_test_server();

    let body: serde_json::Value = server.get("/crowd-control/choke-points").await.json();

    let risks: Vec<f64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["riskScore"].as_f64().unwrap())
        .collect();
    assert!(!risks.is_empty());
    assert!(risks.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_logistics_levels() {
    let server = create_test_server();

    let body: serde_json::Value = server.get("/logistics").await.json();

    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 4);
    assert_eq!(items[0]["name"], "Water (Liters)");
    assert!(items[0]["fillPct"].as_f64().unwrap() <= 100.0);
}

#[tokio::test]
async fn test_markers() {
    let server = create_test_server();

    let body: serde_json::Value = server.get("/markers").await.json();

    let markers = body.as_array().unwrap();
    assert_eq!(markers.len(), 150);
    assert_eq!(markers[0].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_get_feature() {
    let server = create_test_server();

    let response = server.get("/features/checkpoint/CP-001").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["kind"], "checkpoint");
    assert_eq!(body["feature"]["id"], "CP-001");

    let response = server.get("/features/sector/S2").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["feature"]["name"], "Mangalnath Zone");
}

#[tokio::test]
async fn test_get_feature_errors() {
    let server = create_test_server();

    server
        .get("/features/drone/DR-01")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .get("/features/checkpoint/CP-999")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_no_pending_advisory() {
    let server = create_test_server();

    server
        .get("/advisories/pending")
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_advisory_approve_workflow() {
    let server = create_advising_server();

    // 1. Refresh raises an advisory
    let report: serde_json::Value = server.post("/snapshot/refresh").await.json();
    let id = report["advisory"]["id"].as_str().unwrap().to_string();

    // 2. It is pending
    let response = server.get("/advisories/pending").await;
    response.assert_status_ok();
    let pending: serde_json::Value = response.json();
    assert_eq!(pending["id"], id.as_str());

    // 3. Approve it
    let response = server.post(&format!("/advisories/{}/approve", id)).await;
    response.assert_status_ok();
    let outcome: serde_json::Value = response.json();
    assert_eq!(outcome["decision"], "approve");
    assert_eq!(outcome["notice"], "success");
    assert!(
        outcome["message"]
            .as_str()
            .unwrap()
            .ends_with("has been approved and executed.")
    );

    // 4. Nothing left pending, second resolution fails
    server
        .get("/advisories/pending")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .post(&format!("/advisories/{}/reject", id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_advisory_reject() {
    let server = create_advising_server();

    let report: serde_json::Value = server.post("/snapshot/refresh").await.json();
    let id = report["advisory"]["id"].as_str().unwrap().to_string();

    let outcome: serde_json::Value = server
        .post(&format!("/advisories/{}/reject", id))
        .await
        .json();
    assert_eq!(outcome["notice"], "info");
    assert!(outcome["message"].as_str().unwrap().ends_with("was rejected."));
}

#[tokio::test]
async fn test_advisory_bad_id() {
    let server = create_test_server();

    server
        .post("/advisories/not-a-uuid/approve")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_map_provider() {
    let leaflet: serde_json::Value = create_test_server().get("/map/provider").await.json();
    assert_eq!(leaflet["provider"], "leaflet");

    let mapbox = TestServer::new(router(test_state(
        SimulationConfig::default(),
        MapProvider::Mapbox,
    )))
    .unwrap();
    let body: serde_json::Value = mapbox.get("/map/provider").await.json();
    assert_eq!(body["provider"], "mapbox");
}

#[test]
fn test_initial_snapshot_outside_server() {
    let feed = SnapshotFeed::seeded(SimulationConfig::default(), 7, ten_am());

    let snapshot = tokio_test::block_on(feed.current());

    // Peak hour baseline: 8,000,000 - 500,000 ..= 8,000,000 + 1,000,000
    assert!((7_500_000..=9_000_000).contains(&snapshot.total_crowd));
    assert!(snapshot.checkpoints.iter().all(|cp| {
        cp.id.len() == 6 && cp.id.starts_with("CP-") && cp.id[3..].chars().all(|c| c.is_ascii_digit())
    }));
}
