use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub category: String,
    pub name: String,
    pub description: Option<String>,
    pub fixed_price: f64,
    /// Minutes.
    pub estimated_duration: u32,
    pub created_at: DateTime<Utc>,
}
