//! REST API for warehouse pick routing.
//!
//! Provides endpoints for:
//! - Warehouse layout retrieval
//! - Route solving, visualization and straight-line comparison
//! - Demo order generation
//! - Swagger UI at /q/swagger-ui

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::demo_data::{statistics, OrderGenerator};
use crate::dto::{
    CompareResponse, ComparedRouteDto, DemoOrderDto, DemoOrdersResponse, ErrorResponse,
    LayoutResponse, OrderStatisticsDto, PickListRequest, RoutePointDto, ShelfCountDto,
    SolveResponse, VisualizeResponse,
};
use crate::error::PickError;
use crate::planner::PickPlanner;

/// Default number of generated demo orders.
const DEFAULT_DEMO_ORDERS: usize = 10;

/// Upper bound on generated demo orders per request.
const MAX_DEMO_ORDERS: usize = 500;

const DEFAULT_DEMO_SEED: u64 = 42;

/// Spread of the hourly order count in time-of-day generation.
const ORDERS_PER_HOUR_STD: f64 = 2.0;

/// Longest time-of-day window, one week.
const MAX_DEMO_HOURS: u32 = 24 * 7;

/// Application state shared across handlers.
pub struct AppState {
    pub planner: PickPlanner,
}

impl AppState {
    pub fn new(planner: PickPlanner) -> Self {
        Self { planner }
    }
}

/// Creates the API router with CORS and Swagger UI enabled.
pub fn create_router(planner: PickPlanner) -> Router {
    let state = Arc::new(AppState::new(planner));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & Info
        .route("/health", get(health))
        .route("/info", get(info))
        // Warehouse
        .route("/api/layout", get(get_layout))
        // Routing
        .route("/api/solve", post(solve))
        .route("/api/visualize", post(visualize))
        .route("/api/compare", post(compare))
        // Demo data
        .route("/demo-orders", get(demo_orders))
        // Swagger UI at /q/swagger-ui (Quarkus-style path)
        .merge(SwaggerUi::new("/q/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Errors
// ============================================================================

/// Failure of a request handler.
#[derive(Debug)]
pub enum ApiError {
    Pick(PickError),
    /// Request body or query string the extractors rejected.
    InvalidRequest { status: StatusCode, message: String },
    /// The blocking planner task panicked or was cancelled.
    Internal(String),
}

impl From<PickError> for ApiError {
    fn from(err: PickError) -> Self {
        ApiError::Pick(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl ApiError {
    /// HTTP status for this failure.
    ///
    /// ```
    /// use axum::http::StatusCode;
    /// use warehouse_picking::api::ApiError;
    /// use warehouse_picking::error::PickError;
    ///
    /// let err = ApiError::from(PickError::UnknownSku("Z1".into()));
    /// assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    /// ```
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Pick(PickError::UnknownSku(_)) => StatusCode::BAD_REQUEST,
            ApiError::Pick(PickError::UnreachableStop { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidRequest { status, .. } => *status,
            ApiError::Pick(PickError::NoPathFound { .. }) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::Pick(err) => ErrorResponse {
                error: err.kind().to_string(),
                message: err.to_string(),
            },
            ApiError::InvalidRequest { message, .. } => ErrorResponse {
                error: "InvalidRequest".to_string(),
                message: message.clone(),
            },
            ApiError::Internal(message) => ErrorResponse {
                error: "Internal".to_string(),
                message: message.clone(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

/// Runs a planner call on the blocking pool.
async fn run_planner<T, F>(state: &Arc<AppState>, job: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&PickPlanner) -> Result<T, PickError> + Send + 'static,
{
    let state = Arc::clone(state);
    let result = tokio::task::spawn_blocking(move || job(&state.planner))
        .await
        .map_err(|e| {
            tracing::error!("Planner task failed: {}", e);
            ApiError::Internal(e.to_string())
        })?;
    Ok(result?)
}

// ============================================================================
// Health & Info
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Status indicator ("UP" when healthy).
    pub status: &'static str,
}

/// GET /health - Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

/// Application info response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    /// Application name.
    pub name: &'static str,
    /// Application version.
    pub version: &'static str,
    /// Routing engine description.
    pub solver_engine: &'static str,
}

/// GET /info - Application info endpoint.
#[utoipa::path(
    get,
    path = "/info",
    responses((status = 200, description = "Application info", body = InfoResponse))
)]
async fn info() -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "Warehouse Picking",
        version: env!("CARGO_PKG_VERSION"),
        solver_engine: "A* + Held-Karp / 2-opt",
    })
}

// ============================================================================
// Warehouse
// ============================================================================

/// GET /api/layout - Grid, shelf registry and depot.
#[utoipa::path(
    get,
    path = "/api/layout",
    responses((status = 200, description = "Warehouse layout", body = LayoutResponse))
)]
async fn get_layout(State(state): State<Arc<AppState>>) -> Json<LayoutResponse> {
    Json(LayoutResponse::from(state.planner.warehouse().as_ref()))
}

// ============================================================================
// Routing
// ============================================================================

/// POST /api/solve - Shortest walking route through the pick list.
#[utoipa::path(
    post,
    path = "/api/solve",
    request_body = PickListRequest,
    responses(
        (status = 200, description = "Route found", body = SolveResponse),
        (status = 400, description = "Unknown SKU or malformed body", body = ErrorResponse),
        (status = 422, description = "A shelf cannot be reached", body = ErrorResponse)
    )
)]
async fn solve(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PickListRequest>, JsonRejection>,
) -> Result<Json<SolveResponse>, ApiError> {
    let Json(request) = payload?;
    let route = run_planner(&state, move |planner| planner.solve(&request.pick_list)).await?;
    Ok(Json(route.into()))
}

/// POST /api/visualize - Route plus direction annotations and stop markers.
#[utoipa::path(
    post,
    path = "/api/visualize",
    request_body = PickListRequest,
    responses(
        (status = 200, description = "Route found", body = VisualizeResponse),
        (status = 400, description = "Unknown SKU or malformed body", body = ErrorResponse),
        (status = 422, description = "A shelf cannot be reached", body = ErrorResponse)
    )
)]
async fn visualize(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PickListRequest>, JsonRejection>,
) -> Result<Json<VisualizeResponse>, ApiError> {
    let Json(request) = payload?;
    let vis = run_planner(&state, move |planner| planner.visualize(&request.pick_list)).await?;
    Ok(Json(vis.into()))
}

/// POST /api/compare - Obstacle-aware ordering versus straight-line ordering.
#[utoipa::path(
    post,
    path = "/api/compare",
    request_body = PickListRequest,
    responses(
        (status = 200, description = "Both orderings", body = CompareResponse),
        (status = 400, description = "Unknown SKU or malformed body", body = ErrorResponse),
        (status = 422, description = "A shelf cannot be reached", body = ErrorResponse)
    )
)]
async fn compare(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PickListRequest>, JsonRejection>,
) -> Result<Json<CompareResponse>, ApiError> {
    let Json(request) = payload?;
    let cmp = run_planner(&state, move |planner| planner.compare(&request.pick_list)).await?;
    Ok(Json(cmp.into()))
}

// ============================================================================
// Demo Data
// ============================================================================

/// Query of GET /demo-orders.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DemoOrdersQuery {
    /// Number of orders, or mean orders per hour when `hours` is set.
    pub count: Option<usize>,
    /// RNG seed; equal seeds give equal orders.
    pub seed: Option<u64>,
    /// Spread orders over this many hours from today's midnight.
    pub hours: Option<u32>,
}

/// GET /demo-orders - Popularity-weighted random pick lists.
#[utoipa::path(
    get,
    path = "/demo-orders",
    params(DemoOrdersQuery),
    responses(
        (status = 200, description = "Generated orders", body = DemoOrdersResponse),
        (status = 400, description = "Malformed query string", body = ErrorResponse)
    )
)]
async fn demo_orders(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DemoOrdersQuery>, QueryRejection>,
) -> Result<Json<DemoOrdersResponse>, ApiError> {
    let Query(query) = query?;
    let start = chrono::Local::now().date_naive().and_time(NaiveTime::default());
    let response =
        run_planner(&state, move |planner| Ok(generate_demo_orders(planner, &query, start))).await?;
    Ok(Json(response))
}

fn generate_demo_orders(
    planner: &PickPlanner,
    query: &DemoOrdersQuery,
    start: NaiveDateTime,
) -> DemoOrdersResponse {
    let seed = query.seed.unwrap_or(DEFAULT_DEMO_SEED);
    let count = query.count.unwrap_or(DEFAULT_DEMO_ORDERS).min(MAX_DEMO_ORDERS);
    let mut generator = OrderGenerator::new(planner.warehouse().shelves(), seed);

    let orders = match query.hours {
        Some(hours) => generator.generate_time_based(
            start,
            hours.min(MAX_DEMO_HOURS),
            count as f64,
            ORDERS_PER_HOUR_STD,
            MAX_DEMO_ORDERS,
        ),
        None => generator.generate_batch(count),
    };

    let stats = statistics(&orders).map(OrderStatisticsDto::from);
    DemoOrdersResponse {
        seed,
        orders: orders.into_iter().map(DemoOrderDto::from).collect(),
        statistics: stats,
    }
}

// ============================================================================
// OpenAPI
// ============================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        info,
        get_layout,
        solve,
        visualize,
        compare,
        demo_orders,
    ),
    components(schemas(
        HealthResponse,
        InfoResponse,
        LayoutResponse,
        PickListRequest,
        SolveResponse,
        VisualizeResponse,
        RoutePointDto,
        CompareResponse,
        ComparedRouteDto,
        ErrorResponse,
        DemoOrdersResponse,
        DemoOrderDto,
        OrderStatisticsDto,
        ShelfCountDto,
    ))
)]
struct ApiDoc;
