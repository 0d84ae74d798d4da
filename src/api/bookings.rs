use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post, put};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::assignment::parse_id;
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::assignment::{AssignmentOutcome, BatchAssignment, BatchSummary};
use crate::models::booking::{Booking, BookingStatus};
use crate::models::event::DispatchEvent;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking).get(list_bookings))
        .route("/bookings/bulk", post(create_bookings_bulk))
        .route("/bookings/pending", get(list_pending_bookings))
        .route("/bookings/assign-pending", post(assign_pending))
        .route("/bookings/:id", get(get_booking))
        .route("/bookings/:id/status", patch(update_booking_status))
        .route("/bookings/:id/assign", post(assign_booking))
        .route("/bookings/:id/handler", put(assign_booking_manually))
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub location: GeoPoint,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub service_category: Option<String>,
}

#[derive(Deserialize)]
pub struct BulkCreateRequest {
    pub bookings: Vec<CreateBookingRequest>,
}

#[derive(Serialize)]
pub struct BulkCreateResponse {
    pub bookings: Vec<Booking>,
    pub summary: BatchSummary,
}

#[derive(Deserialize)]
pub struct ListBookingsQuery {
    pub customer_id: Option<Uuid>,
    pub handler_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

#[derive(Deserialize)]
pub struct ManualAssignRequest {
    pub handler_id: String,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = build_booking(&state, payload)?;
    state.store.save_booking(booking.clone())?;

    info!(booking_id = %booking.id, service_id = %booking.service_id, "booking created");
    Ok(Json(booking))
}

/// Creates every booking up front, then tries to place each one. Bookings
/// nobody can take are escalated on the event feed.
async fn create_bookings_bulk(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BulkCreateRequest>,
) -> Result<Json<BulkCreateResponse>, AppError> {
    if payload.bookings.is_empty() {
        return Err(AppError::BadRequest("bookings cannot be empty".to_string()));
    }

    let created = payload
        .bookings
        .into_iter()
        .map(|request| build_booking(&state, request))
        .collect::<Result<Vec<Booking>, AppError>>()?;

    for booking in &created {
        state.store.save_booking(booking.clone())?;
    }

    let mut summary = BatchSummary::default();
    for booking in &created {
        match state.engine.assign_handler(&booking.id.to_string()) {
            Ok(outcome) => {
                if let Some(assignment) = publish_outcome(&state, &outcome) {
                    summary.assignments.push(assignment);
                }
            }
            Err(err) => {
                warn!(booking_id = %booking.id, error = %err, "bulk booking left unassigned");
            }
        }
    }
    summary.assigned_count = summary.assignments.len();

    let bookings = created
        .iter()
        .map(|booking| {
            state
                .store
                .get_booking(booking.id)
                .map(|stored| stored.unwrap_or_else(|| booking.clone()))
        })
        .collect::<Result<Vec<Booking>, AppError>>()?;

    info!(
        created = bookings.len(),
        assigned = summary.assigned_count,
        "bulk bookings created"
    );

    Ok(Json(BulkCreateResponse { bookings, summary }))
}

async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state
        .store
        .list_bookings()?
        .into_iter()
        .filter(|b| query.customer_id.is_none_or(|id| b.customer_id == id))
        .filter(|b| query.handler_id.is_none_or(|id| b.handler_id == Some(id)))
        .filter(|b| query.status.is_none_or(|status| b.status == status))
        .collect();

    Ok(Json(bookings))
}

async fn list_pending_bookings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.store.pending_unassigned_bookings()?))
}

async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let id = parse_id(&id, "booking")?;
    let booking = state
        .store
        .get_booking(id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id} not found")))?;

    Ok(Json(booking))
}

async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Booking>, AppError> {
    let id = parse_id(&id, "booking")?;
    if payload.status == BookingStatus::Confirmed {
        return Err(AppError::BadRequest(
            "bookings are confirmed by assigning a handler".to_string(),
        ));
    }

    let booking = state
        .store
        .transition_booking(id, payload.status, Utc::now())?;

    if booking.status == BookingStatus::Completed {
        if let Some(handler_id) = booking.handler_id {
            let bumped = state.store.update_handler(handler_id, &mut |h| {
                h.total_jobs = h.total_jobs.saturating_add(1)
            });
            match bumped {
                Ok(_) | Err(AppError::NotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }
    }

    state.publish(DispatchEvent::BookingStatusChanged {
        booking_id: booking.id,
        customer_id: booking.customer_id,
        status: booking.status,
    });
    info!(booking_id = %booking.id, status = booking.status.as_str(), "booking status changed");

    Ok(Json(booking))
}

async fn assign_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AssignmentOutcome>, AppError> {
    let outcome = state.engine.assign_handler(&id)?;
    publish_outcome(&state, &outcome);
    Ok(Json(outcome))
}

async fn assign_booking_manually(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<ManualAssignRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.engine.assign_manually(&id, &payload.handler_id)?;

    if let Some(handler_id) = booking.handler_id {
        let handler_name = state
            .store
            .get_handler(handler_id)?
            .map(|handler| handler.name)
            .unwrap_or_default();
        state.publish(DispatchEvent::Assigned {
            booking_id: booking.id,
            handler_id,
            handler_name,
            score: None,
        });
    }

    Ok(Json(booking))
}

async fn assign_pending(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BatchSummary>, AppError> {
    let run = state.engine.batch_assign_pending()?;

    for assignment in &run.summary.assignments {
        state.publish(DispatchEvent::Assigned {
            booking_id: assignment.booking_id,
            handler_id: assignment.handler_id,
            handler_name: assignment.handler_name.clone(),
            score: Some(assignment.score),
        });
    }
    for outcome in &run.unmatched {
        publish_outcome(&state, outcome);
    }

    Ok(Json(run.summary))
}

fn build_booking(state: &AppState, request: CreateBookingRequest) -> Result<Booking, AppError> {
    let service = state.store.get_service(request.service_id)?.ok_or_else(|| {
        AppError::NotFound(format!("service {} not found", request.service_id))
    })?;

    let service_category = request
        .service_category
        .map(|category| category.trim().to_string())
        .filter(|category| !category.is_empty())
        .unwrap_or_else(|| service.category.clone());

    Ok(Booking {
        id: Uuid::new_v4(),
        service_id: service.id,
        customer_id: request.customer_id,
        handler_id: None,
        service_name: service.name,
        service_price: service.fixed_price,
        service_category: Some(service_category),
        status: BookingStatus::Pending,
        location: request.location,
        scheduled_time: request.scheduled_time,
        notes: request.notes,
        assigned_at: None,
        started_at: None,
        completed_at: None,
        created_at: Utc::now(),
    })
}

/// Publishes the event for an engine outcome, escalating unmatched demand.
/// Returns the batch entry when a handler was assigned.
fn publish_outcome(state: &AppState, outcome: &AssignmentOutcome) -> Option<BatchAssignment> {
    match outcome {
        AssignmentOutcome::Assigned {
            booking_id,
            handler_id,
            handler_name,
            score,
            ..
        } => {
            state.publish(DispatchEvent::Assigned {
                booking_id: *booking_id,
                handler_id: *handler_id,
                handler_name: handler_name.clone(),
                score: Some(*score),
            });
            Some(BatchAssignment {
                booking_id: *booking_id,
                handler_id: *handler_id,
                handler_name: handler_name.clone(),
                score: *score,
            })
        }
        AssignmentOutcome::NoMatch {
            booking_id,
            category,
            best_score,
            ..
        } => {
            warn!(booking_id = %booking_id, category = %category, "unmatched booking escalated");
            state.publish(DispatchEvent::Unmatched {
                booking_id: *booking_id,
                category: category.clone(),
                best_score: *best_score,
            });
            None
        }
    }
}
