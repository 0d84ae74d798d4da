use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::assignment::parse_id;
use crate::error::AppError;
use crate::models::service::Service;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/services", post(create_service).get(list_services))
        .route("/services/:id", get(get_service))
}

#[derive(Deserialize)]
pub struct CreateServiceRequest {
    pub category: String,
    pub name: String,
    pub description: Option<String>,
    pub fixed_price: f64,
    pub estimated_duration: u32,
}

#[derive(Deserialize)]
pub struct ListServicesQuery {
    pub category: Option<String>,
}

async fn create_service(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateServiceRequest>,
) -> Result<Json<Service>, AppError> {
    if payload.category.trim().is_empty() {
        return Err(AppError::BadRequest("category cannot be empty".to_string()));
    }
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }
    if !payload.fixed_price.is_finite() || payload.fixed_price < 0.0 {
        return Err(AppError::BadRequest(
            "fixed_price must be a non-negative number".to_string(),
        ));
    }

    let service = Service {
        id: Uuid::new_v4(),
        category: payload.category.trim().to_string(),
        name: payload.name.trim().to_string(),
        description: payload.description,
        fixed_price: payload.fixed_price,
        estimated_duration: payload.estimated_duration,
        created_at: Utc::now(),
    };

    state.store.save_service(service.clone())?;
    Ok(Json(service))
}

async fn list_services(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListServicesQuery>,
) -> Result<Json<Vec<Service>>, AppError> {
    let services = state
        .store
        .list_services()?
        .into_iter()
        .filter(|service| match &query.category {
            Some(category) => service.category == *category,
            None => true,
        })
        .collect();

    Ok(Json(services))
}

async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Service>, AppError> {
    let id = parse_id(&id, "service")?;
    let service = state
        .store
        .get_service(id)?
        .ok_or_else(|| AppError::NotFound(format!("service {id} not found")))?;

    Ok(Json(service))
}
