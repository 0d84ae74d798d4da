use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::booking::BookingStatus;

/// Live dispatch feed published to websocket subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchEvent {
    Assigned {
        booking_id: Uuid,
        handler_id: Uuid,
        handler_name: String,
        /// Absent for manual operator assignments.
        score: Option<f64>,
    },
    /// No handler cleared the acceptance threshold; operators should step in.
    Unmatched {
        booking_id: Uuid,
        category: String,
        best_score: Option<f64>,
    },
    BookingStatusChanged {
        booking_id: Uuid,
        customer_id: Uuid,
        status: BookingStatus,
    },
    HandlerLocation {
        handler_id: Uuid,
        customer_id: Uuid,
        booking_id: Uuid,
        location: GeoPoint,
    },
}
