use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::scoring::{clears_threshold, compute_score, rank_candidates, Candidate, JobSite};
use crate::error::AppError;
use crate::models::assignment::{AssignmentOutcome, BatchAssignment, BatchSummary};
use crate::models::booking::Booking;
use crate::models::service::Service;
use crate::observability::metrics::Metrics;
use crate::store::Store;

/// Result of a sweep: the caller-facing summary plus the bookings that found
/// nobody, so the caller can escalate them.
#[derive(Debug, Clone, Default)]
pub struct BatchRun {
    pub summary: BatchSummary,
    pub unmatched: Vec<AssignmentOutcome>,
}

/// Picks the best-scoring active handler for pending bookings.
///
/// Every decision re-reads handlers and workloads from the store, so a failed
/// attempt can be retried as often as needed. The final write is conditional
/// on the booking still being unassigned.
#[derive(Clone)]
pub struct AssignmentEngine {
    store: Arc<dyn Store>,
    metrics: Metrics,
    min_score: f64,
}

impl AssignmentEngine {
    pub fn new(store: Arc<dyn Store>, metrics: Metrics, min_score: f64) -> Self {
        Self {
            store,
            metrics,
            min_score,
        }
    }

    pub fn assign_handler(&self, booking_id: &str) -> Result<AssignmentOutcome, AppError> {
        let start = Instant::now();
        let result = self.try_assign(booking_id);
        self.record(&result, start);
        result
    }

    fn try_assign(&self, booking_id: &str) -> Result<AssignmentOutcome, AppError> {
        let booking_id = parse_id(booking_id, "booking")?;

        let booking = self
            .store
            .get_booking(booking_id)?
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;
        let service = self.store.get_service(booking.service_id)?.ok_or_else(|| {
            AppError::NotFound(format!("service {} not found", booking.service_id))
        })?;

        if !booking.is_awaiting_assignment() {
            return Err(AppError::Conflict(format!(
                "booking {booking_id} is {} and cannot be auto-assigned",
                booking.status.as_str()
            )));
        }

        self.assign_loaded(&booking, &service)
    }

    /// Sweeps every pending, unassigned booking. Lookup misses and per-booking
    /// failures are skipped; only failing to list the pending set is fatal.
    pub fn batch_assign_pending(&self) -> Result<BatchRun, AppError> {
        let pending = self.store.pending_unassigned_bookings()?;
        let total = pending.len();
        self.metrics.pending_bookings.set(total as i64);

        let mut run = BatchRun::default();

        for booking in pending {
            let service = match self.store.get_service(booking.service_id) {
                Ok(Some(service)) => service,
                Ok(None) => {
                    debug!(booking_id = %booking.id, service_id = %booking.service_id, "skipping booking with unknown service");
                    continue;
                }
                Err(err) => {
                    warn!(booking_id = %booking.id, error = %err, "service lookup failed during sweep");
                    continue;
                }
            };

            let start = Instant::now();
            let result = self.assign_loaded(&booking, &service);
            self.record(&result, start);

            match result {
                Ok(AssignmentOutcome::Assigned {
                    booking_id,
                    handler_id,
                    handler_name,
                    score,
                    ..
                }) => run.summary.assignments.push(BatchAssignment {
                    booking_id,
                    handler_id,
                    handler_name,
                    score,
                }),
                Ok(no_match) => run.unmatched.push(no_match),
                Err(AppError::Conflict(reason)) => {
                    debug!(booking_id = %booking.id, %reason, "booking taken by a concurrent assignment");
                }
                Err(err) => {
                    warn!(booking_id = %booking.id, error = %err, "assignment failed during sweep");
                }
            }
        }

        run.summary.assigned_count = run.summary.assignments.len();
        self.metrics
            .pending_bookings
            .set((total - run.summary.assigned_count) as i64);

        info!(
            pending = total,
            assigned = run.summary.assigned_count,
            unmatched = run.unmatched.len(),
            "pending sweep finished"
        );

        Ok(run)
    }

    /// Operator override: puts a specific active handler on a booking that is
    /// still waiting, bypassing the score.
    pub fn assign_manually(&self, booking_id: &str, handler_id: &str) -> Result<Booking, AppError> {
        let booking_id = parse_id(booking_id, "booking")?;
        let handler_id = parse_id(handler_id, "handler")?;

        let handler = self
            .store
            .get_handler(handler_id)?
            .ok_or_else(|| AppError::NotFound(format!("handler {handler_id} not found")))?;
        if !handler.is_active() {
            return Err(AppError::BadRequest(format!(
                "handler {handler_id} is inactive"
            )));
        }

        let booking = self
            .store
            .assign_if_unassigned(booking_id, handler_id, Utc::now())?;

        info!(booking_id = %booking_id, handler_id = %handler_id, "booking assigned manually");
        Ok(booking)
    }

    fn assign_loaded(
        &self,
        booking: &Booking,
        service: &Service,
    ) -> Result<AssignmentOutcome, AppError> {
        let category = booking
            .service_category
            .as_deref()
            .filter(|category| !category.trim().is_empty())
            .unwrap_or(&service.category);
        let site = JobSite {
            category,
            location: Some(&booking.location),
        };

        let handlers = self.store.active_handlers()?;
        let mut candidates = handlers
            .iter()
            .map(|handler| {
                let active_jobs = self.store.count_active_jobs(handler.id)?;
                Ok(compute_score(handler, &site, active_jobs))
            })
            .collect::<Result<Vec<Candidate>, AppError>>()?;

        rank_candidates(&mut candidates);

        let best = match candidates.into_iter().next() {
            Some(best) if clears_threshold(best.score, self.min_score) => best,
            best => {
                let best_score = best.map(|candidate| candidate.score);
                info!(
                    booking_id = %booking.id,
                    category,
                    candidates = handlers.len(),
                    best_score,
                    "no suitable handler found"
                );
                return Ok(AssignmentOutcome::NoMatch {
                    booking_id: booking.id,
                    no_match: true,
                    category: category.to_string(),
                    best_score,
                    message: no_match_message(handlers.len(), self.min_score),
                });
            }
        };

        self.store
            .assign_if_unassigned(booking.id, best.handler_id, Utc::now())?;

        self.metrics
            .handler_active_jobs
            .with_label_values(&[&best.handler_id.to_string()])
            .set((best.active_jobs + 1) as f64);

        info!(
            booking_id = %booking.id,
            handler_id = %best.handler_id,
            score = best.score,
            distance_miles = best.distance_miles,
            "handler assigned"
        );

        Ok(AssignmentOutcome::Assigned {
            booking_id: booking.id,
            handler_id: best.handler_id,
            handler_name: best.handler_name,
            score: best.score,
            distance_miles: round_to_cents(best.distance_miles),
            score_breakdown: best.breakdown,
        })
    }

    fn record(&self, result: &Result<AssignmentOutcome, AppError>, start: Instant) {
        let outcome = match result {
            Ok(AssignmentOutcome::Assigned { .. }) => "assigned",
            Ok(AssignmentOutcome::NoMatch { .. }) => "no_match",
            Err(AppError::Conflict(_)) => "conflict",
            Err(AppError::NotFound(_) | AppError::BadRequest(_)) => "rejected",
            Err(AppError::Internal(_)) => "error",
        };
        self.metrics
            .observe_assignment(outcome, start.elapsed().as_secs_f64());
    }
}

pub fn parse_id(raw: &str, kind: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("invalid {kind} id: {raw}")))
}

fn no_match_message(candidates: usize, min_score: f64) -> String {
    if candidates == 0 {
        "no suitable handler found: no active handlers".to_string()
    } else {
        format!("no suitable handler found: no candidate scored above {min_score}")
    }
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
