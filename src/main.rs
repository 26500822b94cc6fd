//! NopeNet — network intrusion detection demo backend.
//!
//! Serves the dashboard REST API, a WebSocket event stream, the simulated
//! network scanner and the security chat assistant. All data is synthetic and
//! in-memory; restarting the process reseeds everything.

mod chat;
mod config;
mod detector;
mod error;
mod realtime;
mod scan;
mod store;

use std::sync::Arc;

use axum::{
    extract::{
        ws::WebSocketUpgrade,
        Path, Query, State,
    },
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use chat::ChatBridge;
use config::Config;
use detector::{DetectionBackend, Detector, TrafficRecord, TrafficVerdict};
use error::{ApiError, ApiResult};
use realtime::{Hub, EVENT_INTRUSION_UPDATED};
use store::{
    AttackDistribution, DatasetInfoResponse, IntrusionPage, IntrusionWithType, MemStore,
    RecentAttackTypeItem, ScanResult, SecurityInfoItem, Stats, TimeRange,
};

const BROADCAST_CAPACITY: usize = 256;

// ──────────────────────────────────────────────────────────────────────────────
// Application state
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct AppState {
    store: Arc<MemStore>,
    hub: Hub,
    chat: Arc<ChatBridge>,
    detector: Detector,
}

impl AppState {
    fn new(config: &Config) -> Self {
        Self {
            store: Arc::new(MemStore::new()),
            hub: Hub::new(BROADCAST_CAPACITY),
            chat: Arc::new(ChatBridge::new(config.chat_api.clone())),
            detector: Detector::from_config(
                config.detector_script.clone(),
                config.detector_timeout,
            ),
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Request shapes
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DistributionQuery {
    time_range: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntrusionsQuery {
    page: Option<usize>,
    limit: Option<usize>,
    attack_type: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusUpdateBody {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatBody {
    message: Option<String>,
    session_id: Option<String>,
    context: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeBody {
    traffic_data: Option<Vec<TrafficRecord>>,
    traffic: Option<Vec<TrafficRecord>>,
}

// ──────────────────────────────────────────────────────────────────────────────
// Dashboard handlers
// ──────────────────────────────────────────────────────────────────────────────

/// GET /api/stats — the dashboard stats singleton.
async fn get_stats(State(state): State<AppState>) -> ApiResult<Stats> {
    Ok(Json(state.store.get_stats()))
}

/// GET /api/attacks/distribution?timeRange= — per-type counts over a trailing
/// window. Defaults to `month`; unknown ranges are a 400.
async fn get_attack_distribution(
    State(state): State<AppState>,
    Query(query): Query<DistributionQuery>,
) -> ApiResult<AttackDistribution> {
    let range = match query.time_range.as_deref() {
        None => TimeRange::Month,
        Some(raw) => TimeRange::parse(raw).ok_or_else(|| {
            ApiError::BadRequest(
                "Invalid time range. Must be one of: day, week, month".to_string(),
            )
        })?,
    };
    Ok(Json(state.store.attack_distribution(range)))
}

/// GET /api/attacks/recent — per-type totals with a mock trend percentage.
async fn get_recent_attack_types(
    State(state): State<AppState>,
) -> ApiResult<Vec<RecentAttackTypeItem>> {
    Ok(Json(state.store.recent_attack_types()))
}

/// GET /api/intrusions?page=&limit=&attackType=&status= — paginated listing,
/// newest first.
async fn list_intrusions(
    State(state): State<AppState>,
    Query(query): Query<IntrusionsQuery>,
) -> ApiResult<IntrusionPage> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(5);
    Ok(Json(state.store.list_intrusions(
        page,
        limit,
        query.attack_type.as_deref(),
        query.status.as_deref(),
    )))
}

/// GET /api/intrusions/:id — one intrusion with display fields.
async fn get_intrusion(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<IntrusionWithType> {
    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid intrusion ID".to_string()))?;
    state
        .store
        .intrusion_by_id(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Intrusion not found".to_string()))
}

/// PATCH /api/intrusions/:id — update the status field and notify connected
/// clients.
async fn update_intrusion_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusUpdateBody>,
) -> ApiResult<IntrusionWithType> {
    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid intrusion ID".to_string()))?;
    let status = body
        .status
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing status field".to_string()))?;

    state
        .store
        .update_intrusion_status(id, status.clone())
        .ok_or_else(|| ApiError::NotFound("Intrusion not found".to_string()))?;

    state
        .hub
        .broadcast(EVENT_INTRUSION_UPDATED, &json!({ "id": id, "status": status }));

    // Re-read so the response carries the derived display fields.
    state
        .store
        .intrusion_by_id(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Intrusion not found".to_string()))
}

/// GET /api/education/attacks — attack taxonomy joined with security tips.
async fn get_education_info(
    State(state): State<AppState>,
) -> ApiResult<Vec<SecurityInfoItem>> {
    Ok(Json(state.store.education_info()))
}

/// GET /api/dataset/info — training dataset and model performance constants.
async fn get_dataset_info(State(state): State<AppState>) -> ApiResult<DatasetInfoResponse> {
    Ok(Json(state.store.dataset_info()))
}

// ──────────────────────────────────────────────────────────────────────────────
// Scan handlers
// ──────────────────────────────────────────────────────────────────────────────

/// POST /api/scan/network — run one simulated scan and return its result.
async fn scan_network(State(state): State<AppState>) -> ApiResult<ScanResult> {
    let result = scan::run_scan(&state.store, &state.hub, &state.detector).await;
    Ok(Json(result))
}

/// GET /api/scan/latest — the most recent scan result, if any scan has run.
async fn latest_scan(State(state): State<AppState>) -> ApiResult<ScanResult> {
    state
        .store
        .latest_scan()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No scan has been run yet".to_string()))
}

// ──────────────────────────────────────────────────────────────────────────────
// Chat and analysis handlers
// ──────────────────────────────────────────────────────────────────────────────

/// POST /api/chat — one chat turn. The session id comes from the body, then
/// the `x-session-id` header, then a generated value.
async fn post_chat(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    Json(body): Json<ChatBody>,
) -> ApiResult<Value> {
    let message = body
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing message field".to_string()))?;

    let session_id = body
        .session_id
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-session-id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let reply = state
        .chat
        .chat(&state.store, &session_id, &message, body.context.as_ref())
        .await;

    Ok(Json(json!({ "sessionId": session_id, "response": reply })))
}

/// POST /api/analyze/traffic — score a traffic batch with the external
/// detector; a failed or unconfigured detector degrades to randomized
/// verdicts in the same shape rather than an error.
async fn analyze_traffic(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeBody>,
) -> ApiResult<Value> {
    let records = body
        .traffic_data
        .or(body.traffic)
        .ok_or_else(|| ApiError::BadRequest("Missing trafficData field".to_string()))?;

    let results = match state.detector.try_detect(&records).await {
        Ok(verdicts) => verdicts,
        Err(err) => {
            tracing::debug!(error = %err, "detector unavailable, returning randomized verdicts");
            random_verdicts(records.len())
        }
    };

    Ok(Json(json!({ "results": results })))
}

/// Randomized stand-in verdicts, one per input record.
fn random_verdicts(count: usize) -> Vec<TrafficVerdict> {
    const ATTACK_NAMES: [&str; 5] = [
        "DoS Attack",
        "Probe Attack",
        "R2L Attack",
        "U2R Attack",
        "Unknown",
    ];
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let is_attack = rng.gen_bool(0.3);
            TrafficVerdict {
                is_attack,
                attack_type: if is_attack {
                    ATTACK_NAMES.choose(&mut rng).unwrap().to_string()
                } else {
                    "Normal Traffic".to_string()
                },
                confidence: rng.gen_range(60..=99),
            }
        })
        .collect()
}

// ──────────────────────────────────────────────────────────────────────────────
// WebSocket
// ──────────────────────────────────────────────────────────────────────────────

/// GET /ws — upgrade to the realtime event stream.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| realtime::handle_socket(socket, state.hub.clone()))
}

// ──────────────────────────────────────────────────────────────────────────────
// Router and entry point
// ──────────────────────────────────────────────────────────────────────────────

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/stats", get(get_stats))
        .route("/api/attacks/distribution", get(get_attack_distribution))
        .route("/api/attacks/recent", get(get_recent_attack_types))
        .route("/api/intrusions", get(list_intrusions))
        .route(
            "/api/intrusions/:id",
            get(get_intrusion).patch(update_intrusion_status),
        )
        .route("/api/education/attacks", get(get_education_info))
        .route("/api/dataset/info", get(get_dataset_info))
        .route("/api/scan/network", post(scan_network))
        .route("/api/scan/latest", get(latest_scan))
        .route("/api/chat", post(post_chat))
        .route("/api/analyze/traffic", post(analyze_traffic))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    info!("NopeNet intrusion detection server");
    info!(
        chat_api = config.chat_api.is_some(),
        detector = config.detector_script.is_some(),
        "optional capabilities"
    );

    let state = AppState::new(&config);

    let app = build_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}");
    info!("WebSocket endpoint at ws://{addr}/ws");

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_app() -> Router {
        build_router(AppState::new(&Config::default()))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let response = test_app()
            .oneshot(Request::get("/api/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["totalRequests"], 1500);
        assert_eq!(json["attacksDetected"], 250);
        assert_eq!(json["modelAccuracy"], 85);
    }

    #[tokio::test]
    async fn test_distribution_default_and_invalid_range() {
        let app = test_app();

        let ok = app
            .clone()
            .oneshot(
                Request::get("/api/attacks/distribution")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        let json = body_json(ok).await;
        assert_eq!(json["timeRange"], "month");
        assert_eq!(json["distribution"].as_array().unwrap().len(), 5);

        let bad = app
            .oneshot(
                Request::get("/api/attacks/distribution?timeRange=year")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        let json = body_json(bad).await;
        assert_eq!(
            json["message"],
            "Invalid time range. Must be one of: day, week, month"
        );
    }

    #[tokio::test]
    async fn test_intrusions_defaults() {
        let response = test_app()
            .oneshot(Request::get("/api/intrusions").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["page"], 1);
        assert_eq!(json["total"], 50);
        assert_eq!(json["pages"], 10);
        assert!(json["intrusions"].as_array().unwrap().len() <= 5);
    }

    #[tokio::test]
    async fn test_intrusions_combined_filters() {
        let response = test_app()
            .oneshot(
                Request::get("/api/intrusions?page=1&limit=5&attackType=dos&status=blocked")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["page"], 1);
        let items = json["intrusions"].as_array().unwrap();
        assert!(items.len() <= 5);
        for item in items {
            assert!(item["attackType"]
                .as_str()
                .unwrap()
                .to_lowercase()
                .contains("dos"));
            assert_eq!(item["status"].as_str().unwrap().to_lowercase(), "blocked");
        }
    }

    #[tokio::test]
    async fn test_intrusion_by_id_validation() {
        let app = test_app();

        let bad = app
            .clone()
            .oneshot(
                Request::get("/api/intrusions/not-a-number")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let missing = app
            .oneshot(
                Request::get("/api/intrusions/99999")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_patch_status_roundtrip() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(
                Request::patch("/api/intrusions/1")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"status":"Resolved"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "Resolved");
        assert_eq!(json["statusClass"], "bg-green-500/20 text-green-400");

        let missing_status = app
            .oneshot(
                Request::patch("/api/intrusions/1")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(missing_status.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_patch_status_broadcasts_update() {
        let state = AppState::new(&Config::default());
        let mut rx = state.hub.subscribe();
        let app = build_router(state);

        app.oneshot(
            Request::patch("/api/intrusions/2")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"status":"Blocked"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

        let frame: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(frame["type"], "intrusion_updated");
        assert_eq!(frame["data"]["id"], 2);
        assert_eq!(frame["data"]["status"], "Blocked");
    }

    #[tokio::test]
    async fn test_education_and_dataset_endpoints() {
        let app = test_app();

        let education = app
            .clone()
            .oneshot(
                Request::get("/api/education/attacks")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(education.status(), StatusCode::OK);
        let json = body_json(education).await;
        assert_eq!(json.as_array().unwrap().len(), 5);

        let dataset = app
            .oneshot(
                Request::get("/api/dataset/info")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(dataset.status(), StatusCode::OK);
        let json = body_json(dataset).await;
        assert_eq!(json["datasetInfo"]["name"], "KDD Cup 1999");
        assert_eq!(json["models"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_scan_latest_404_until_scan_runs() {
        let app = test_app();

        let empty = app
            .clone()
            .oneshot(Request::get("/api/scan/latest").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(empty.status(), StatusCode::NOT_FOUND);

        let scan = app
            .clone()
            .oneshot(
                Request::post("/api/scan/network")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(scan.status(), StatusCode::OK);
        let scan_json = body_json(scan).await;

        let latest = app
            .oneshot(Request::get("/api/scan/latest").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(latest.status(), StatusCode::OK);
        let latest_json = body_json(latest).await;
        assert_eq!(latest_json["id"], scan_json["id"]);
    }

    #[tokio::test]
    async fn test_chat_canned_reply_and_session_fallbacks() {
        let app = test_app();

        // Session id from the header when the body has none.
        let response = app
            .clone()
            .oneshot(
                Request::post("/api/chat")
                    .header("content-type", "application/json")
                    .header("x-session-id", "header-session")
                    .body(Body::from(r#"{"message":"Tell me about DoS attacks"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["sessionId"], "header-session");
        assert!(json["response"]
            .as_str()
            .unwrap()
            .starts_with("A Denial of Service (DoS) attack"));

        // Body session id wins over the header.
        let response = app
            .clone()
            .oneshot(
                Request::post("/api/chat")
                    .header("content-type", "application/json")
                    .header("x-session-id", "header-session")
                    .body(Body::from(
                        r#"{"message":"hello","sessionId":"body-session"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["sessionId"], "body-session");

        // No message is a 400.
        let bad = app
            .oneshot(
                Request::post("/api/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_analyze_traffic_falls_back_without_detector() {
        let body = r#"{"trafficData":[
            {"sourceIp":"10.0.0.1","destPort":80,"protocol":"tcp","bytes":1200,"packets":4,"durationMs":35},
            {"sourceIp":"10.0.0.2","destPort":22,"protocol":"tcp","bytes":400,"packets":2,"durationMs":10}
        ]}"#;

        let response = test_app()
            .oneshot(
                Request::post("/api/analyze/traffic")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let results = json["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        for verdict in results {
            assert!(verdict["isAttack"].is_boolean());
            assert!(verdict["attackType"].is_string());
            let confidence = verdict["confidence"].as_i64().unwrap();
            assert!((0..=100).contains(&confidence));
        }
    }

    #[tokio::test]
    async fn test_analyze_traffic_accepts_traffic_alias() {
        let body = r#"{"traffic":[
            {"sourceIp":"10.0.0.3","destPort":443,"protocol":"tcp","bytes":900,"packets":3,"durationMs":20}
        ]}"#;

        let response = test_app()
            .oneshot(
                Request::post("/api/analyze/traffic")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["results"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_analyze_traffic_missing_body_field() {
        let response = test_app()
            .oneshot(
                Request::post("/api/analyze/traffic")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = test_app()
            .oneshot(
                Request::get("/api/intrusions/99999")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["error"], true);
        assert_eq!(json["status"], 404);
        assert_eq!(json["message"], "Intrusion not found");
    }
}
