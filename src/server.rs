use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::catalog::CatalogSource;
use crate::comparison::{build_comparison, ComparisonMatrix};
use crate::config::Config;
use crate::optimizer::{
    collect_teams, compute_optimal_combination, parse_teams, CoverageFailure,
    CoverageRequirement, OptimizerOptions, PackageCombination, PriceBasis,
};

#[derive(Clone)]
pub struct ApiState {
    config: Config,
    catalog: Arc<dyn CatalogSource>,
}

impl ApiState {
    pub fn new(config: Config, catalog: Arc<dyn CatalogSource>) -> Self {
        Self { config, catalog }
    }
}

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<CoverageFailure>,
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    reason: Option<CoverageFailure>,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            reason: None,
            message: message.into(),
        }
    }

    fn internal(error: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            reason: None,
            message: error.to_string(),
        }
    }

    fn coverage(failure: CoverageFailure) -> Self {
        let status = match failure {
            CoverageFailure::EmptyTeamSet => StatusCode::BAD_REQUEST,
            CoverageFailure::NoGamesFound => StatusCode::NOT_FOUND,
            CoverageFailure::CannotCoverAllGames => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self {
            status,
            reason: Some(failure),
            message: failure.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            reason: self.reason,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub fn router(state: ApiState) -> Router {
    let cors = cors_layer(&state.config.server.allowed_origins);
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/packages/optimal-combination",
            get(optimal_combination),
        )
        .route("/api/comparison", get(comparison))
        .route("/v1/config", get(show_config))
        .layer(cors)
        .with_state(state)
}

pub async fn run_server(state: ApiState, bind: SocketAddr) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("REST API listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn show_config(State(state): State<ApiState>) -> Json<ApiResponse<Config>> {
    ok(state.config)
}

async fn optimal_combination(
    State(state): State<ApiState>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<PackageCombination> {
    let (teams, options) = parse_request(&params, &state.config.optimizer)?;
    let combination = compute_optimal_combination(state.catalog.as_ref(), &teams, &options)
        .map_err(ApiError::internal)?
        .map_err(ApiError::coverage)?;
    Ok(ok(combination))
}

async fn comparison(
    State(state): State<ApiState>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<ComparisonMatrix> {
    let (teams, options) = parse_comparison_request(&params, &state.config.optimizer)?;
    let matrix = build_comparison(state.catalog.as_ref(), &teams, &options)
        .map_err(ApiError::internal)?
        .map_err(ApiError::coverage)?;
    Ok(ok(matrix))
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}

fn team_values(params: &[(String, String)]) -> impl Iterator<Item = &str> {
    params
        .iter()
        .filter(|(key, _)| key == "teams")
        .map(|(_, value)| value.as_str())
}

/// `teams` may repeat; each value is one exact team label.
fn parse_request(
    params: &[(String, String)],
    defaults: &OptimizerOptions,
) -> std::result::Result<(BTreeSet<String>, OptimizerOptions), ApiError> {
    let teams = collect_teams(team_values(params));
    if teams.is_empty() {
        return Err(ApiError::coverage(CoverageFailure::EmptyTeamSet));
    }
    Ok((teams, parse_options(params, defaults)?))
}

/// `teams` is optional here and values are split on commas.
fn parse_comparison_request(
    params: &[(String, String)],
    defaults: &OptimizerOptions,
) -> std::result::Result<(BTreeSet<String>, OptimizerOptions), ApiError> {
    let teams = parse_teams(team_values(params));
    Ok((teams, parse_options(params, defaults)?))
}

fn parse_options(
    params: &[(String, String)],
    defaults: &OptimizerOptions,
) -> std::result::Result<OptimizerOptions, ApiError> {
    let mut options = *defaults;
    for (key, value) in params {
        match key.as_str() {
            "coverage" => {
                options.coverage = CoverageRequirement::from_str(value)
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
            }
            "price_basis" => {
                options.price_basis = PriceBasis::from_str(value)
                    .map_err(|e| ApiError::bad_request(e.to_string()))?;
            }
            _ => {}
        }
    }
    Ok(options)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("ignoring invalid CORS origin {origin:?}: {e}");
                None
            }
        })
        .collect::<Vec<_>>();
    layer.allow_origin(AllowOrigin::list(origins))
}
