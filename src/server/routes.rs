//! HTTP API routes
//!
//! One session per mounted location picker. Resolution endpoints wait for
//! the lookup to finish and return the outcome together with the
//! notifications that request produced. Every notification is also kept in
//! the session's recent history.

use crate::coord::{Position, ReferencePoint};
use crate::error::Error;
use crate::geo::GeoProvider;
use crate::resolve::{
    AddressObservation, EngineSnapshot, EventLog, ForwardOutcome, ReverseOutcome, TimedEvent,
};
use crate::server::state::{AppState, Session};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Create the API router
pub fn create_router<P>(state: Arc<AppState<P>>) -> Router
where
    P: GeoProvider + Clone + 'static,
{
    Router::new()
        .route("/api/status", get(status_handler::<P>))
        .route("/api/distance", get(distance_handler::<P>))
        .route("/api/sessions", post(create_session_handler::<P>))
        .route(
            "/api/sessions/:id",
            get(session_handler::<P>).delete(delete_session_handler::<P>),
        )
        .route("/api/sessions/:id/events", get(events_handler::<P>))
        .route("/api/sessions/:id/geocode", post(geocode_handler::<P>))
        .route("/api/sessions/:id/click", post(click_handler::<P>))
        .route("/api/sessions/:id/address", post(address_handler::<P>))
        .with_state(state)
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl ApiError {
    fn session_not_found(id: &Uuid) -> Self {
        ApiError {
            error: format!("No session {}", id),
            code: "SESSION_NOT_FOUND".to_string(),
            status: StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let (code, status) = match &err {
            Error::InvalidCoordinates(_) => ("INVALID_COORDINATES", StatusCode::BAD_REQUEST),
            Error::InvalidAddress(_) => ("INVALID_ADDRESS", StatusCode::BAD_REQUEST),
            Error::Config(_) => ("CONFIG_ERROR", StatusCode::INTERNAL_SERVER_ERROR),
            _ => ("INTERNAL_ERROR", StatusCode::INTERNAL_SERVER_ERROR),
        };
        ApiError {
            error: err.to_string(),
            code: code.to_string(),
            status,
        }
    }
}

async fn find_session<P>(state: &AppState<P>, id: Uuid) -> Result<Arc<Session<P>>, ApiError>
where
    P: GeoProvider + Clone,
{
    state
        .session(&id)
        .await
        .ok_or_else(|| ApiError::session_not_found(&id))
}

/// Status response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub running: bool,
    pub version: String,
    pub reference: ReferencePoint,
    pub sessions: usize,
    pub uptime_secs: u64,
}

/// Server status endpoint
///
/// GET /api/status
async fn status_handler<P>(State(state): State<Arc<AppState<P>>>) -> Json<StatusResponse>
where
    P: GeoProvider + Clone,
{
    Json(StatusResponse {
        running: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        reference: state.reference().clone(),
        sessions: state.session_count().await,
        uptime_secs: state.uptime_secs(),
    })
}

#[derive(Debug, Deserialize)]
pub struct DistanceQuery {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DistanceResponse {
    pub position: Position,
    pub reference: ReferencePoint,
    pub distance_km: f64,
}

/// Distance from a position to the reference point
///
/// GET /api/distance?lat=..&lng=..
async fn distance_handler<P>(
    State(state): State<Arc<AppState<P>>>,
    Query(query): Query<DistanceQuery>,
) -> Result<Json<DistanceResponse>, ApiError>
where
    P: GeoProvider + Clone,
{
    let position = Position::checked(query.lat, query.lng)?;
    let reference = state.reference().clone();

    Ok(Json(DistanceResponse {
        position,
        distance_km: reference.distance_km(position),
        reference,
    }))
}

/// Mount request: optional values from a stored profile
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub snapshot: EngineSnapshot,
    pub events: Vec<TimedEvent>,
}

/// Mount a location picker
///
/// POST /api/sessions
async fn create_session_handler<P>(
    State(state): State<Arc<AppState<P>>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError>
where
    P: GeoProvider + Clone,
{
    let position = match (req.lat, req.lng) {
        (Some(lat), Some(lng)) => Some(Position::checked(lat, lng)?),
        (None, None) => None,
        _ => {
            return Err(Error::InvalidCoordinates(
                "lat and lng must be given together".to_string(),
            )
            .into())
        }
    };

    let (id, session) = state.open_session(position, req.address).await;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            id,
            snapshot: session.snapshot().await,
            events: session.listener().drain(),
        }),
    ))
}

/// Current session state
///
/// GET /api/sessions/:id
async fn session_handler<P>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<EngineSnapshot>, ApiError>
where
    P: GeoProvider + Clone,
{
    let session = find_session(&state, id).await?;
    Ok(Json(session.snapshot().await))
}

/// Unmount a location picker
///
/// DELETE /api/sessions/:id
async fn delete_session_handler<P>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
    P: GeoProvider + Clone,
{
    if state.close_session(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::session_not_found(&id))
    }
}

/// Take the session's recent notifications
///
/// GET /api/sessions/:id/events
async fn events_handler<P>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TimedEvent>>, ApiError>
where
    P: GeoProvider + Clone,
{
    let session = find_session(&state, id).await?;
    Ok(Json(session.listener().drain()))
}

/// Outcome of a resolution plus what this request reported
#[derive(Debug, Serialize)]
pub struct ResolutionResponse<T> {
    pub outcome: T,
    pub snapshot: EngineSnapshot,
    pub events: Vec<TimedEvent>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeRequest {
    pub address: String,
    /// Monotonic counter bumped on each explicit lookup request
    pub trigger: u64,
}

/// Resolve an address to a position
///
/// POST /api/sessions/:id/geocode
async fn geocode_handler<P>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<GeocodeRequest>,
) -> Result<Json<ResolutionResponse<ForwardOutcome>>, ApiError>
where
    P: GeoProvider + Clone,
{
    let session = find_session(&state, id).await?;
    let events = EventLog::new();
    let outcome = session
        .resolve_address_to_position_with(&req.address, req.trigger, &events)
        .await;

    Ok(Json(ResolutionResponse {
        outcome,
        snapshot: session.snapshot().await,
        events: events.drain(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ClickRequest {
    pub lat: f64,
    pub lng: f64,
}

/// Resolve a map click to an address
///
/// POST /api/sessions/:id/click
async fn click_handler<P>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ClickRequest>,
) -> Result<Json<ResolutionResponse<ReverseOutcome>>, ApiError>
where
    P: GeoProvider + Clone,
{
    let position = Position::checked(req.lat, req.lng)?;
    let session = find_session(&state, id).await?;
    let events = EventLog::new();
    let outcome = session
        .resolve_position_to_address_with(position, &events)
        .await;

    Ok(Json(ResolutionResponse {
        outcome,
        snapshot: session.snapshot().await,
        events: events.drain(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct AddressRequest {
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct AddressResponse {
    pub observation: AddressObservation,
    pub snapshot: EngineSnapshot,
}

/// Report a change of the address field
///
/// POST /api/sessions/:id/address
async fn address_handler<P>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddressRequest>,
) -> Result<Json<AddressResponse>, ApiError>
where
    P: GeoProvider + Clone,
{
    let session = find_session(&state, id).await?;
    let observation = session.observe_address_change(&req.address).await;

    Ok(Json(AddressResponse {
        observation,
        snapshot: session.snapshot().await,
    }))
}
