use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::booking::{Booking, BookingStatus};
use crate::models::handler::Handler;
use crate::models::review::Review;
use crate::models::service::Service;
use crate::store::Store;

#[derive(Default)]
pub struct MemoryStore {
    handlers: DashMap<Uuid, Handler>,
    services: DashMap<Uuid, Service>,
    bookings: DashMap<Uuid, Booking>,
    /// Keyed by booking id: one review per booking.
    reviews: DashMap<Uuid, Review>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn save_handler(&self, handler: Handler) -> Result<(), AppError> {
        self.handlers.insert(handler.id, handler);
        Ok(())
    }

    fn update_handler(
        &self,
        id: Uuid,
        apply: &mut dyn FnMut(&mut Handler),
    ) -> Result<Handler, AppError> {
        let mut handler = self
            .handlers
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("handler {id} not found")))?;

        apply(handler.value_mut());
        handler.updated_at = Utc::now();

        Ok(handler.clone())
    }

    fn get_handler(&self, id: Uuid) -> Result<Option<Handler>, AppError> {
        Ok(self.handlers.get(&id).map(|entry| entry.value().clone()))
    }

    fn list_handlers(&self) -> Result<Vec<Handler>, AppError> {
        let mut handlers: Vec<Handler> = self
            .handlers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        handlers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(handlers)
    }

    fn active_handlers(&self) -> Result<Vec<Handler>, AppError> {
        let mut handlers = self.list_handlers()?;
        handlers.retain(Handler::is_active);
        Ok(handlers)
    }

    fn save_service(&self, service: Service) -> Result<(), AppError> {
        self.services.insert(service.id, service);
        Ok(())
    }

    fn get_service(&self, id: Uuid) -> Result<Option<Service>, AppError> {
        Ok(self.services.get(&id).map(|entry| entry.value().clone()))
    }

    fn list_services(&self) -> Result<Vec<Service>, AppError> {
        let mut services: Vec<Service> = self
            .services
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        services.sort_by(|a, b| a.category.cmp(&b.category).then(a.name.cmp(&b.name)));
        Ok(services)
    }

    fn save_booking(&self, booking: Booking) -> Result<(), AppError> {
        self.bookings.insert(booking.id, booking);
        Ok(())
    }

    fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        Ok(self.bookings.get(&id).map(|entry| entry.value().clone()))
    }

    fn list_bookings(&self) -> Result<Vec<Booking>, AppError> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(bookings)
    }

    fn pending_unassigned_bookings(&self) -> Result<Vec<Booking>, AppError> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|entry| entry.value().is_awaiting_assignment())
            .map(|entry| entry.value().clone())
            .collect();
        bookings.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(bookings)
    }

    fn count_active_jobs(&self, handler_id: Uuid) -> Result<usize, AppError> {
        Ok(self
            .bookings
            .iter()
            .filter(|entry| {
                let booking = entry.value();
                booking.handler_id == Some(handler_id) && booking.status.is_active_job()
            })
            .count())
    }

    fn current_job_for_handler(&self, handler_id: Uuid) -> Result<Option<Booking>, AppError> {
        Ok(self
            .bookings
            .iter()
            .find(|entry| {
                let booking = entry.value();
                booking.handler_id == Some(handler_id)
                    && matches!(
                        booking.status,
                        BookingStatus::Confirmed | BookingStatus::InProgress
                    )
            })
            .map(|entry| entry.value().clone()))
    }

    fn assign_if_unassigned(
        &self,
        booking_id: Uuid,
        handler_id: Uuid,
        assigned_at: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        // The entry guard holds the shard lock, so check and write are atomic.
        let mut booking = self
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;

        if !booking.is_awaiting_assignment() {
            return Err(AppError::Conflict(format!(
                "booking {booking_id} is no longer awaiting assignment"
            )));
        }

        booking.handler_id = Some(handler_id);
        booking.status = BookingStatus::Confirmed;
        booking.assigned_at = Some(assigned_at);

        Ok(booking.clone())
    }

    fn transition_booking(
        &self,
        booking_id: Uuid,
        next: BookingStatus,
        at: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        let mut booking = self
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;

        if !booking.status.can_transition_to(next) {
            return Err(AppError::BadRequest(format!(
                "cannot move booking from {} to {}",
                booking.status.as_str(),
                next.as_str()
            )));
        }

        if next == BookingStatus::Confirmed && booking.handler_id.is_none() {
            return Err(AppError::BadRequest(
                "a booking is confirmed by assigning a handler".to_string(),
            ));
        }

        booking.status = next;
        match next {
            BookingStatus::InProgress => booking.started_at = Some(at),
            BookingStatus::Completed => booking.completed_at = Some(at),
            _ => {}
        }

        Ok(booking.clone())
    }

    fn insert_review(&self, review: Review) -> Result<(), AppError> {
        match self.reviews.entry(review.booking_id) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "booking {} already has a review",
                review.booking_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(review);
                Ok(())
            }
        }
    }

    fn reviews_for_handler(&self, handler_id: Uuid) -> Result<Vec<Review>, AppError> {
        let mut reviews: Vec<Review> = self
            .reviews
            .iter()
            .filter(|entry| entry.value().handler_id == handler_id)
            .map(|entry| entry.value().clone())
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }
}
