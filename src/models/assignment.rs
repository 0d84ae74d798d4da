use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skill_score: f64,
    pub proximity_score: f64,
    pub rating_score: f64,
    pub availability_score: f64,
    pub workload_penalty: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.skill_score + self.proximity_score + self.rating_score + self.availability_score
            - self.workload_penalty
    }
}

/// Result of one single-booking assignment attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AssignmentOutcome {
    Assigned {
        booking_id: Uuid,
        handler_id: Uuid,
        handler_name: String,
        score: f64,
        distance_miles: f64,
        score_breakdown: ScoreBreakdown,
    },
    NoMatch {
        booking_id: Uuid,
        no_match: bool,
        category: String,
        best_score: Option<f64>,
        message: String,
    },
}

impl AssignmentOutcome {
    pub fn is_assigned(&self) -> bool {
        matches!(self, AssignmentOutcome::Assigned { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchAssignment {
    pub booking_id: Uuid,
    pub handler_id: Uuid,
    pub handler_name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub assigned_count: usize,
    pub assignments: Vec<BatchAssignment>,
}
