use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row for a submitted civic-issue report.
#[derive(Debug, Clone, FromRow)]
pub struct Report {
    pub id: i32,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: String,
    /// Submitter network address. Stored for abuse handling, never serialized.
    pub reporter_ip: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolver_notes: Option<String>,
    pub admin_notes: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub twitter_posted: bool,
    pub twitter_post_id: Option<String>,
}

/// Data for inserting a new report. Status is always forced to "pending"
/// by the store, regardless of what the caller supplies elsewhere.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: String,
    pub reporter_ip: Option<String>,
}

/// Full-record replacement for an existing report (no partial patch).
/// `reporter_ip` and `created_at` are preserved from the stored row.
#[derive(Debug, Clone)]
pub struct UpdateReport {
    pub id: i32,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: String,
    pub status: String,
    pub verified_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolver_notes: Option<String>,
    pub admin_notes: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub twitter_posted: bool,
    pub twitter_post_id: Option<String>,
}

/// A report with its eagerly loaded image and timeline collections.
#[derive(Debug, Clone)]
pub struct ReportWithRelations {
    pub report: Report,
    pub images: Vec<super::Image>,
    pub timeline: Vec<super::StatusUpdate>,
}
