//! HTTP API for point lookups.
//!
//! `GET /` (or `POST /`) takes a JSON body `{"lat": .., "lon": ..}`.
//! `GET /v1/reverse?lat=..&lon=..` takes the same fields as query parameters.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::models::Resolution;
use crate::pip::GeocodeResolver;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LocationRequest {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LocationResponse {
    #[serde(rename = "errorMessage")]
    pub error_message: String,
    pub city: String,
    pub state: String,
    #[serde(rename = "communityID")]
    pub community_id: String,
}

impl LocationResponse {
    fn error(message: impl Into<String>) -> Self {
        Self {
            error_message: message.into(),
            ..Default::default()
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    states: usize,
    regions: usize,
    skipped_missing_name: usize,
    skipped_unresolvable_state: usize,
}

type ApiResponse = (StatusCode, Json<LocationResponse>);

/// Build the router around a shared resolver
pub fn router(resolver: Arc<GeocodeResolver>) -> Router {
    Router::new()
        .route("/", get(body_handler).post(body_handler))
        .route("/health", get(health_handler))
        .route("/v1/reverse", get(reverse_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(resolver)
}

async fn health_handler(State(resolver): State<Arc<GeocodeResolver>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        states: resolver.states().len(),
        regions: resolver.regions().len(),
        skipped_missing_name: resolver.report().missing_name,
        skipped_unresolvable_state: resolver.report().unresolvable_state,
    })
}

/// Lookup with a JSON body. The content type is not checked.
async fn body_handler(State(resolver): State<Arc<GeocodeResolver>>, body: Bytes) -> ApiResponse {
    match serde_json::from_slice::<LocationRequest>(&body) {
        Ok(req) => locate(&resolver, req),
        Err(e) => bad_request(e.to_string()),
    }
}

async fn reverse_handler(
    State(resolver): State<Arc<GeocodeResolver>>,
    query: Result<Query<LocationRequest>, QueryRejection>,
) -> ApiResponse {
    match query {
        Ok(Query(req)) => locate(&resolver, req),
        Err(e) => bad_request(e.body_text()),
    }
}

fn bad_request(message: String) -> ApiResponse {
    (StatusCode::BAD_REQUEST, Json(LocationResponse::error(message)))
}

/// Map a resolution to a status and body
fn locate(resolver: &GeocodeResolver, req: LocationRequest) -> ApiResponse {
    debug!("req: {:?}", req);

    if !req.lat.is_finite() || !req.lon.is_finite() {
        return bad_request(format!(
            "Invalid coordinates Lat: {}, Long: {}",
            req.lat, req.lon
        ));
    }

    match resolver.resolve(req.lat, req.lon) {
        Resolution::Resolved(region) => match &region.community_id {
            Some(community_id) => (
                StatusCode::OK,
                Json(LocationResponse {
                    error_message: String::new(),
                    city: region.name.clone(),
                    state: region.state.clone(),
                    community_id: community_id.clone(),
                }),
            ),
            None => {
                error!("Region {}, {} has no community id", region.name, region.state);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(LocationResponse::error(format!(
                        "Region {}, {} has no community ID",
                        region.name, region.state
                    ))),
                )
            }
        },
        Resolution::NotFoundState => (
            StatusCode::NOT_FOUND,
            Json(LocationResponse::error(format!(
                "Could not find a location within the United States at Lat: {}, Long: {}",
                req.lat, req.lon
            ))),
        ),
        Resolution::NotFoundRegion { state } => (
            StatusCode::NOT_FOUND,
            Json(LocationResponse {
                error_message: format!(
                    "Could not find a city or county within {} at Lat: {}, Long: {}",
                    state, req.lat, req.lon
                ),
                state,
                ..Default::default()
            }),
        ),
    }
}
