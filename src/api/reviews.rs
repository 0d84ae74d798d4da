use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::engine::assignment::parse_id;
use crate::error::AppError;
use crate::models::booking::BookingStatus;
use crate::models::review::{average_rating, Review};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reviews", post(create_review))
        .route("/handlers/:id/reviews", get(list_handler_reviews))
}

#[derive(Deserialize)]
pub struct CreateReviewRequest {
    pub booking_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
}

/// Records a review for a completed booking and refreshes the handler's
/// rating, which feeds straight back into assignment scoring.
async fn create_review(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<Json<Review>, AppError> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest(
            "rating must be between 1 and 5".to_string(),
        ));
    }

    let booking = state.store.get_booking(payload.booking_id)?.ok_or_else(|| {
        AppError::NotFound(format!("booking {} not found", payload.booking_id))
    })?;

    if booking.status != BookingStatus::Completed {
        return Err(AppError::BadRequest(
            "can only review completed bookings".to_string(),
        ));
    }
    let handler_id = booking.handler_id.ok_or_else(|| {
        AppError::BadRequest("booking was completed without a handler".to_string())
    })?;

    let review = Review {
        id: Uuid::new_v4(),
        booking_id: booking.id,
        customer_id: booking.customer_id,
        handler_id,
        rating: payload.rating,
        comment: payload.comment,
        created_at: Utc::now(),
    };
    state.store.insert_review(review.clone())?;

    let reviews = state.store.reviews_for_handler(handler_id)?;
    if let Some(rating) = average_rating(&reviews) {
        match state.store.update_handler(handler_id, &mut |h| h.rating = rating) {
            Ok(_) => {
                info!(handler_id = %handler_id, rating, reviews = reviews.len(), "handler rating updated");
            }
            Err(AppError::NotFound(_)) => {}
            Err(err) => return Err(err),
        }
    }

    Ok(Json(review))
}

async fn list_handler_reviews(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Review>>, AppError> {
    let id = parse_id(&id, "handler")?;
    Ok(Json(state.store.reviews_for_handler(id)?))
}
