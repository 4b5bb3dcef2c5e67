//! Healthtrack REST API
//!
//! HTTP API layer for Healthtrack, built with Axum. Every `/api/v1`
//! route acts on behalf of the user named in the `X-User-Id` header.
//!
//! # Endpoints
//!
//! ## Records
//! - `/api/v1/profile` - The caller's profile (GET, PUT)
//! - `/api/v1/foods` - Food catalogue (public and custom foods), `/foods/search`
//! - `/api/v1/meals` - Meals with composition, `/meals/daily`, `/meals/weekly`
//! - `/api/v1/health-logs` - Daily health logs, `/daily`, `/weekly`, `/monthly`
//! - `/api/v1/sleep` - Sleep logs, `/weekly`, `/monthly`
//!
//! ## Analytics
//! - `GET /api/v1/analytics/health-trends`
//! - `GET /api/v1/analytics/food-correlations`
//! - `GET /api/v1/analytics/sleep-analysis`
//! - `GET /api/v1/analytics/symptom-triggers`
//!
//! ## Export
//! - `GET /api/v1/export/{health-data,sleep-data,meal-data,all-data}`
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,no_run
//! use healthtrack::api::{serve, ApiConfig, AppState};
//! use healthtrack::store::SqliteStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(SqliteStore::open("./healthtrack.db")?);
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::new(store, config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod identity;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use identity::CurrentUser;
pub use state::{ApiConfig, AppState};

use axum::{
    http::HeaderValue,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Profile routes
        .route(
            "/profile",
            get(routes::profile::get_profile).put(routes::profile::update_profile),
        )
        // Food routes
        .route(
            "/foods",
            get(routes::foods::list_foods).post(routes::foods::create_food),
        )
        .route("/foods/search", get(routes::foods::search_foods))
        .route(
            "/foods/:id",
            get(routes::foods::get_food)
                .put(routes::foods::update_food)
                .delete(routes::foods::delete_food),
        )
        // Meal routes
        .route(
            "/meals",
            get(routes::meals::list_meals).post(routes::meals::create_meal),
        )
        .route("/meals/daily", get(routes::meals::daily_meals))
        .route("/meals/daily/:date", get(routes::meals::daily_meals))
        .route("/meals/weekly", get(routes::meals::weekly_meals))
        .route("/meals/weekly/:date", get(routes::meals::weekly_meals))
        .route(
            "/meals/:id",
            get(routes::meals::get_meal)
                .put(routes::meals::update_meal)
                .delete(routes::meals::delete_meal),
        )
        // Health log routes
        .route(
            "/health-logs",
            get(routes::health_logs::list_health_logs).post(routes::health_logs::create_health_log),
        )
        .route("/health-logs/daily", get(routes::health_logs::daily_health_log))
        .route("/health-logs/daily/:date", get(routes::health_logs::daily_health_log))
        .route("/health-logs/weekly", get(routes::health_logs::weekly_health_logs))
        .route("/health-logs/weekly/:date", get(routes::health_logs::weekly_health_logs))
        .route("/health-logs/monthly", get(routes::health_logs::monthly_health_logs))
        .route("/health-logs/monthly/:date", get(routes::health_logs::monthly_health_logs))
        .route(
            "/health-logs/:id",
            get(routes::health_logs::get_health_log)
                .put(routes::health_logs::update_health_log)
                .delete(routes::health_logs::delete_health_log),
        )
        // Sleep routes
        .route(
            "/sleep",
            get(routes::sleep::list_sleep_logs).post(routes::sleep::create_sleep_log),
        )
        .route("/sleep/weekly", get(routes::sleep::weekly_sleep_logs))
        .route("/sleep/weekly/:date", get(routes::sleep::weekly_sleep_logs))
        .route("/sleep/monthly", get(routes::sleep::monthly_sleep_logs))
        .route("/sleep/monthly/:date", get(routes::sleep::monthly_sleep_logs))
        .route(
            "/sleep/:id",
            get(routes::sleep::get_sleep_log)
                .put(routes::sleep::update_sleep_log)
                .delete(routes::sleep::delete_sleep_log),
        )
        // Analytics routes
        .route("/analytics/health-trends", get(routes::analytics::health_trends))
        .route("/analytics/food-correlations", get(routes::analytics::food_correlations))
        .route("/analytics/sleep-analysis", get(routes::analytics::sleep_analysis))
        .route("/analytics/symptom-triggers", get(routes::analytics::symptom_triggers))
        // Export routes
        .route("/export/health-data", get(routes::export::export_health_data))
        .route("/export/sleep-data", get(routes::export::export_sleep_data))
        .route("/export/meal-data", get(routes::export::export_meal_data))
        .route("/export/all-data", get(routes::export::export_all_data));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let timeout = Duration::from_millis(state.config.request_timeout_ms);

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// CORS for the configured origins, permissive when none are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Healthtrack API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Healthtrack API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use chrono::{Days, Utc};
    use tempfile::tempdir;
    use tower::util::ServiceExt;

    const USER: &str = "1";

    fn create_test_app() -> Router {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let state = AppState::new(store, ApiConfig::default());
        build_router(state)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("X-User-Id", USER)
            .body(Body::empty())
            .unwrap()
    }

    fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("X-User-Id", USER)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = create_test_app();

        for uri in ["/health/live", "/health/ready", "/health"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health-logs")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_duplicate_health_log_conflict() {
        let app = create_test_app();
        let log = serde_json::json!({
            "date": "2024-03-01",
            "physical_feeling": 3,
            "mental_feeling": 4
        });

        let response = app
            .clone()
            .oneshot(post("/api/v1/health-logs", log.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(post("/api/v1/health-logs", log))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "DUPLICATE_DATE");
        assert_eq!(
            body["error"]["message"],
            "A health log for this date already exists."
        );
    }

    #[tokio::test]
    async fn test_invalid_score_rejected() {
        let app = create_test_app();

        let response = app
            .oneshot(post(
                "/api/v1/health-logs",
                serde_json::json!({
                    "date": "2024-03-01",
                    "physical_feeling": 9,
                    "mental_feeling": 4
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_path_date() {
        let app = create_test_app();

        let response = app
            .oneshot(get("/api/v1/health-logs/daily/2024-31-01"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["message"], "Invalid date format. Use YYYY-MM-DD");
    }

    #[tokio::test]
    async fn test_daily_health_log_not_found() {
        let app = create_test_app();

        let response = app
            .oneshot(get("/api/v1/health-logs/daily/2024-03-01"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_food_search_requires_query() {
        let app = create_test_app();

        let response = app
            .clone()
            .oneshot(get("/api/v1/foods/search"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(post("/api/v1/foods", serde_json::json!({"name": "Greek Yogurt"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(get("/api/v1/foods/search?query=yogurt"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_triggers_end_to_end() {
        let app = create_test_app();
        let today = Utc::now().date_naive();
        let yesterday = today.checked_sub_days(Days::new(1)).unwrap();

        let response = app
            .clone()
            .oneshot(post("/api/v1/foods", serde_json::json!({"name": "Dairy"})))
            .await
            .unwrap();
        let food_id = json_body(response).await["id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(post(
                "/api/v1/meals",
                serde_json::json!({
                    "date_time": format!("{}T12:00:00Z", yesterday),
                    "meal_type": "lunch",
                    "foods": [{"food_id": food_id, "amount": 150}]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(post(
                "/api/v1/health-logs",
                serde_json::json!({
                    "date": today.to_string(),
                    "physical_feeling": 1,
                    "mental_feeling": 2
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(get("/api/v1/analytics/symptom-triggers"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!([{"food": "Dairy", "count": 1}])
        );

        let response = app
            .oneshot(get("/api/v1/analytics/food-correlations?days=7"))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(
            body[0]["foods_eaten_previous_day"],
            serde_json::json!([{"name": "Dairy", "amount": "150.00"}])
        );
    }

    #[tokio::test]
    async fn test_analytics_days_bounds() {
        let app = create_test_app();

        let response = app
            .clone()
            .oneshot(get("/api/v1/analytics/sleep-analysis?days=0"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(get("/api/v1/analytics/sleep-analysis"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["average_duration"], 0.0);
        assert_eq!(body["quality_trend"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_health_trends_single_field() {
        let app = create_test_app();
        let today = Utc::now().date_naive();

        app.clone()
            .oneshot(post(
                "/api/v1/health-logs",
                serde_json::json!({
                    "date": today.to_string(),
                    "physical_feeling": 4,
                    "mental_feeling": 2,
                    "weight": 68.4
                }),
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(get("/api/v1/analytics/health-trends?days=7&field=weight"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!([{"date": today.to_string(), "value": 68.4}])
        );
    }

    #[tokio::test]
    async fn test_on_disk_store_serves_requests() {
        let dir = tempdir().unwrap();
        let store = Arc::new(SqliteStore::open(dir.path().join("api.db")).unwrap());
        let app = build_router(AppState::new(store, ApiConfig::default()));

        let response = app
            .oneshot(get("/api/v1/export/all-data"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["user"], 1);
        assert_eq!(body["meals"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_all_data_export_creates_empty_profile() {
        let app = create_test_app();

        let response = app
            .clone()
            .oneshot(get("/api/v1/export/all-data"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let profile = json_body(response).await["profile"].clone();
        assert_eq!(profile["user"], 1);
        for field in ["medical_conditions", "allergies", "dietary_restrictions", "goals"] {
            assert_eq!(profile[field], "", "{}", field);
        }

        // The exported profile is the one served afterwards
        let response = app.oneshot(get("/api/v1/profile")).await.unwrap();
        assert_eq!(json_body(response).await["id"], profile["id"]);
    }

    #[tokio::test]
    async fn test_profile_update_keeps_omitted_fields() {
        let app = create_test_app();

        let put = |body: serde_json::Value| {
            Request::builder()
                .method("PUT")
                .uri("/api/v1/profile")
                .header("X-User-Id", USER)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        };

        let response = app
            .clone()
            .oneshot(put(serde_json::json!({"allergies": "shellfish"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(put(serde_json::json!({"goals": "sleep 8 hours"})))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["allergies"], "shellfish");
        assert_eq!(body["goals"], "sleep 8 hours");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/profile")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
