//! Persistence seam for the dispatch service.
//!
//! Everything the engine and the API read or write goes through [`Store`], so
//! a deployment can swap the in-memory backend for a real database and tests
//! can inject their own fixtures.

pub mod memory;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::booking::{Booking, BookingStatus};
use crate::models::handler::Handler;
use crate::models::review::Review;
use crate::models::service::Service;

pub use memory::MemoryStore;

pub trait Store: Send + Sync {
    fn save_handler(&self, handler: Handler) -> Result<(), AppError>;
    /// Edits the stored handler in place, so concurrent field updates do not
    /// overwrite each other. Returns the updated record.
    fn update_handler(
        &self,
        id: Uuid,
        apply: &mut dyn FnMut(&mut Handler),
    ) -> Result<Handler, AppError>;
    fn get_handler(&self, id: Uuid) -> Result<Option<Handler>, AppError>;
    fn list_handlers(&self) -> Result<Vec<Handler>, AppError>;
    /// Handlers with status active, regardless of skills or location.
    fn active_handlers(&self) -> Result<Vec<Handler>, AppError>;

    fn save_service(&self, service: Service) -> Result<(), AppError>;
    fn get_service(&self, id: Uuid) -> Result<Option<Service>, AppError>;
    fn list_services(&self) -> Result<Vec<Service>, AppError>;

    fn save_booking(&self, booking: Booking) -> Result<(), AppError>;
    fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, AppError>;
    /// Newest first.
    fn list_bookings(&self) -> Result<Vec<Booking>, AppError>;
    /// Pending bookings without a handler, oldest first.
    fn pending_unassigned_bookings(&self) -> Result<Vec<Booking>, AppError>;
    /// Bookings referencing the handler whose status counts as workload.
    fn count_active_jobs(&self, handler_id: Uuid) -> Result<usize, AppError>;
    /// A confirmed or in-progress booking the handler is currently working.
    fn current_job_for_handler(&self, handler_id: Uuid) -> Result<Option<Booking>, AppError>;

    /// Assigns the handler only if the booking is still pending and unassigned,
    /// moving it to confirmed. Fails with `Conflict` otherwise.
    fn assign_if_unassigned(
        &self,
        booking_id: Uuid,
        handler_id: Uuid,
        assigned_at: DateTime<Utc>,
    ) -> Result<Booking, AppError>;

    /// Applies a lifecycle transition, stamping start and completion times.
    fn transition_booking(
        &self,
        booking_id: Uuid,
        next: BookingStatus,
        at: DateTime<Utc>,
    ) -> Result<Booking, AppError>;

    /// Inserts the review unless its booking already has one (`Conflict`).
    fn insert_review(&self, review: Review) -> Result<(), AppError>;
    fn reviews_for_handler(&self, handler_id: Uuid) -> Result<Vec<Review>, AppError>;
}
