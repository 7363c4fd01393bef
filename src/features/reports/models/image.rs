use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row for an image attached to a report. The upload and
/// moderation pipelines that populate this table live outside this service;
/// reports only read the rows back.
#[derive(Debug, Clone, FromRow)]
pub struct Image {
    pub id: i32,
    pub report_id: i32,
    pub storage_url: String,
    pub storage_public_id: String,
    pub image_type: String,
    pub moderation_status: String,
    pub moderation_notes: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub moderated_at: Option<DateTime<Utc>>,
    pub moderated_by: Option<i32>,
}
