use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    #[serde(alias = "accepted")]
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Statuses that count toward a handler's workload.
    pub fn is_active_job(self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::InProgress
        )
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;

        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, InProgress)
                | (Confirmed, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub handler_id: Option<Uuid>,
    pub service_name: String,
    pub service_price: f64,
    /// Category copied from the service at creation, or supplied by the caller.
    pub service_category: Option<String>,
    pub status: BookingStatus,
    pub location: GeoPoint,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_awaiting_assignment(&self) -> bool {
        self.status == BookingStatus::Pending && self.handler_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::BookingStatus::{self, *};

    #[test]
    fn workload_statuses() {
        assert!(Pending.is_active_job());
        assert!(Confirmed.is_active_job());
        assert!(InProgress.is_active_job());
        assert!(!Completed.is_active_job());
        assert!(!Cancelled.is_active_job());
    }

    #[test]
    fn terminal_statuses_cannot_move() {
        let all = [Pending, Confirmed, InProgress, Completed, Cancelled];
        for next in all {
            assert!(!Completed.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn cancel_is_allowed_until_completion() {
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(InProgress));
    }

    #[test]
    fn accepted_is_read_as_confirmed() {
        let status: BookingStatus = serde_json::from_str("\"accepted\"").unwrap();
        assert_eq!(status, Confirmed);
        assert_eq!(serde_json::to_string(&InProgress).unwrap(), "\"in_progress\"");
    }
}
