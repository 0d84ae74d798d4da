use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use tracing::info;

use crate::engine::assignment::parse_id;
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::event::DispatchEvent;
use crate::models::handler::{Handler, HandlerStatus, DEFAULT_RATING};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/handlers", post(create_handler).get(list_handlers))
        .route("/handlers/:id", get(get_handler))
        .route("/handlers/:id/location", patch(update_handler_location))
        .route("/handlers/:id/availability", patch(update_handler_availability))
        .route("/handlers/:id/status", patch(update_handler_status))
}

#[derive(Deserialize)]
pub struct CreateHandlerRequest {
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub rating: Option<f64>,
    pub available: Option<bool>,
    pub location: Option<GeoPoint>,
}

#[derive(Deserialize)]
pub struct ListHandlersQuery {
    pub skill: Option<String>,
    pub available: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: GeoPoint,
}

#[derive(Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub available: bool,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: HandlerStatus,
}

async fn create_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateHandlerRequest>,
) -> Result<Json<Handler>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    let rating = payload.rating.unwrap_or(DEFAULT_RATING);
    if !rating.is_finite() {
        return Err(AppError::BadRequest("rating must be a number".to_string()));
    }

    let mut handler = Handler::new(payload.name.trim());
    handler.skills = payload
        .skills
        .into_iter()
        .map(|skill| skill.trim().to_string())
        .filter(|skill| !skill.is_empty())
        .collect();
    handler.rating = rating.clamp(0.0, 5.0);
    handler.available = payload.available.unwrap_or(true);
    handler.location = payload.location;

    state.store.save_handler(handler.clone())?;
    info!(handler_id = %handler.id, skills = handler.skills.len(), "handler registered");

    Ok(Json(handler))
}

async fn list_handlers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListHandlersQuery>,
) -> Result<Json<Vec<Handler>>, AppError> {
    let handlers = state
        .store
        .list_handlers()?
        .into_iter()
        .filter(|handler| match &query.skill {
            Some(skill) => handler.skills.iter().any(|s| s == skill),
            None => true,
        })
        .filter(|handler| match query.available {
            Some(available) => handler.available == available,
            None => true,
        })
        .collect();

    Ok(Json(handlers))
}

async fn get_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Handler>, AppError> {
    Ok(Json(load_handler(&state, &id)?))
}

async fn update_handler_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Handler>, AppError> {
    let id = parse_id(&id, "handler")?;
    let location = payload.location;
    let handler = state
        .store
        .update_handler(id, &mut |h| h.location = Some(location))?;

    if let Some(job) = state.store.current_job_for_handler(handler.id)? {
        state.publish(DispatchEvent::HandlerLocation {
            handler_id: handler.id,
            customer_id: job.customer_id,
            booking_id: job.id,
            location: payload.location,
        });
    }

    Ok(Json(handler))
}

async fn update_handler_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Handler>, AppError> {
    let id = parse_id(&id, "handler")?;
    let handler = state
        .store
        .update_handler(id, &mut |h| h.available = payload.available)?;

    Ok(Json(handler))
}

async fn update_handler_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Handler>, AppError> {
    let id = parse_id(&id, "handler")?;
    let handler = state
        .store
        .update_handler(id, &mut |h| h.status = payload.status)?;

    info!(handler_id = %handler.id, status = ?handler.status, "handler status changed");
    Ok(Json(handler))
}

fn load_handler(state: &AppState, raw_id: &str) -> Result<Handler, AppError> {
    let id = parse_id(raw_id, "handler")?;
    state
        .store
        .get_handler(id)?
        .ok_or_else(|| AppError::NotFound(format!("handler {id} not found")))
}
