//! HTTP API handlers for Drishti.
//!
//! Every read handler serves the feed's current snapshot, or a view derived
//! from it. The only writes are forcing a refresh and resolving the pending
//! AI advisory; neither lets a client alter a snapshot's contents.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::advisory::{Advisory, AdvisoryOutcome, Decision};
use crate::aggregation::{
    AnalyticsReport, KpiSummary, LogisticsLevel, choke_points_by_risk, compute_kpis,
    logistics_levels,
};
use crate::config::MapProvider;
use crate::feed::{RefreshReport, SnapshotFeed, local_now};
use crate::geo::LonLat;
use crate::model::{ChokePoint, Snapshot};
use crate::selection::{FeatureKind, SelectedFeature};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub feed: SnapshotFeed,
    pub map_provider: MapProvider,
}

/// Build the router with every endpoint and request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/snapshot", get(get_snapshot))
        .route("/snapshot/refresh", post(refresh_snapshot))
        .route("/snapshot/kpis", get(get_kpis))
        .route("/analytics", get(get_analytics))
        .route("/crowd-control/choke-points", get(get_choke_points))
        .route("/logistics", get(get_logistics))
        .route("/markers", get(get_markers))
        .route("/features/:kind/:id", get(get_feature))
        .route("/advisories/pending", get(get_pending_advisory))
        .route("/advisories/:id/approve", post(approve_advisory))
        .route("/advisories/:id/reject", post(reject_advisory))
        .route("/map/provider", get(get_map_provider))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /snapshot - The current snapshot.
///
/// # Response
///
/// ```json
/// {
///     "totalCrowd": 8250000,
///     "alertLevel": "high",
///     "systemStatus": "Operational",
///     "activeSOS": 7,
///     "sectors": [ ... ],
///     "checkpoints": [ ... ],
///     ...
/// }
/// ```
#[instrument(skip(state))]
pub async fn get_snapshot(State(state): State<AppState>) -> Json<Snapshot> {
    let snapshot = state.feed.current().await;
    Json(Snapshot::clone(&snapshot))
}

/// POST /snapshot/refresh - Replace the snapshot immediately.
///
/// Runs the same step as the refresh timer, advisory roll included.
#[instrument(skip(state))]
pub async fn refresh_snapshot(State(state): State<AppState>) -> Json<RefreshReport> {
    let report = state.feed.refresh(local_now()).await;
    info!(
        generation = report.generation,
        total_crowd = report.total_crowd,
        advisory = report.advisory.is_some(),
        "Snapshot refreshed on request"
    );
    Json(report)
}

/// GET /snapshot/kpis - Headline figures for the KPI ribbon.
#[instrument(skip(state))]
pub async fn get_kpis(State(state): State<AppState>) -> Json<KpiSummary> {
    let snapshot = state.feed.current().await;
    let kpis = compute_kpis(&snapshot);
    info!(
        threat = %kpis.threat_level,
        crush_risk = kpis.crush_risk_index,
        warnings = kpis.warnings.any(),
        "KPIs queried"
    );
    Json(kpis)
}

/// GET /analytics - Density forecasts and illustrative hourly series.
#[instrument(skip(state))]
pub async fn get_analytics(State(state): State<AppState>) -> Json<AnalyticsReport> {
    Json(state.feed.analytics().await)
}

/// GET /crowd-control/choke-points - Choke points, riskiest first.
#[instrument(skip(state))]
pub async fn get_choke_points(State(state): State<AppState>) -> Json<Vec<ChokePoint>> {
    let snapshot = state.feed.current().await;
    Json(choke_points_by_risk(&snapshot))
}

/// GET /logistics - Stock items with fill levels.
#[instrument(skip(state))]
pub async fn get_logistics(State(state): State<AppState>) -> Json<Vec<LogisticsLevel>> {
    let snapshot = state.feed.current().await;
    Json(logistics_levels(&snapshot))
}

/// GET /markers - Jittered pilgrim marker positions.
#[instrument(skip(state))]
pub async fn get_markers(State(state): State<AppState>) -> Json<Vec<LonLat>> {
    Json(state.feed.markers().await)
}

/// GET /features/:kind/:id - Resolve a selected map feature.
///
/// `kind` is one of `checkpoint`, `sector`, `sos-alert`, `choke-point`.
/// Returns `400` for an unknown kind and `404` when nothing has that id.
///
/// # Response
///
/// ```json
/// {
///     "kind": "checkpoint",
///     "feature": { "id": "CP-004", "inventory": { ... }, ... }
/// }
/// ```
#[instrument(skip(state))]
pub async fn get_feature(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<SelectedFeature>, StatusCode> {
    let kind: FeatureKind = kind.parse().map_err(|e| {
        warn!(error = %e, "Invalid feature kind");
        StatusCode::BAD_REQUEST
    })?;

    let snapshot = state.feed.current().await;
    match snapshot.select(kind, &id) {
        Some(feature) => {
            info!(kind = %kind, id = %id, "Feature selected");
            Ok(Json(feature))
        }
        None => {
            warn!(kind = %kind, id = %id, "Feature not found");
            Err(StatusCode::NOT_FOUND)
        }
    }
}

/// GET /advisories/pending - The advisory awaiting a decision.
///
/// Returns `204 No Content` when nothing is pending.
#[instrument(skip(state))]
pub async fn get_pending_advisory(
    State(state): State<AppState>,
) -> Result<Json<Advisory>, StatusCode> {
    state
        .feed
        .pending_advisory()
        .await
        .map(Json)
        .ok_or(StatusCode::NO_CONTENT)
}

/// POST /advisories/:id/approve - Approve and execute the pending advisory.
#[instrument(skip(state))]
pub async fn approve_advisory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AdvisoryOutcome>, StatusCode> {
    resolve(&state, id, Decision::Approve).await
}

/// POST /advisories/:id/reject - Reject the pending advisory.
#[instrument(skip(state))]
pub async fn reject_advisory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AdvisoryOutcome>, StatusCode> {
    resolve(&state, id, Decision::Reject).await
}

async fn resolve(
    state: &AppState,
    id: Uuid,
    decision: Decision,
) -> Result<Json<AdvisoryOutcome>, StatusCode> {
    match state.feed.resolve_advisory(id, decision).await {
        Ok(outcome) => {
            info!(
                advisory_id = %id,
                decision = ?decision,
                "Advisory resolved"
            );
            Ok(Json(outcome))
        }
        Err(e) => {
            warn!(advisory_id = %id, error = %e, "Failed to resolve advisory");
            Err(StatusCode::NOT_FOUND)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MapProviderResponse {
    pub provider: MapProvider,
}

/// GET /map/provider - Which map backend the dashboard should use.
pub async fn get_map_provider(State(state): State<AppState>) -> Json<MapProviderResponse> {
    Json(MapProviderResponse {
        provider: state.map_provider,
    })
}
