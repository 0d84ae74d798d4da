use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;

/// Rating given to a handler until their first review lands.
pub const DEFAULT_RATING: f64 = 5.0;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HandlerStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Handler {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default = "default_rating")]
    pub rating: f64,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub status: HandlerStatus,
    #[serde(default)]
    pub total_jobs: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Handler {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            skills: Vec::new(),
            location: None,
            rating: DEFAULT_RATING,
            available: true,
            status: HandlerStatus::Active,
            total_jobs: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == HandlerStatus::Active
    }
}

fn default_rating() -> f64 {
    DEFAULT_RATING
}

fn default_available() -> bool {
    true
}
