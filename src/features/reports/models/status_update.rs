use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row for one status transition in a report's timeline.
#[derive(Debug, Clone, FromRow)]
pub struct StatusUpdate {
    pub id: i32,
    pub report_id: i32,
    pub old_status: Option<String>,
    pub new_status: String,
    pub notes: Option<String>,
    pub updated_by: Option<i32>,
    pub updated_at: DateTime<Utc>,
}
