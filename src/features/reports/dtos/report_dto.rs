use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::reports::models::{Image, ReportWithRelations, StatusUpdate};

/// Payload for report submission. Only fields relevant to submission are
/// accepted; the category is additionally checked against the database in
/// the handler.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReportDto {
    #[validate(length(min = 1, message = "category is required"))]
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub description: String,
}

/// Response for a successful submission.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateReportResponseDto {
    pub id: i32,
    pub share_url: String,
    pub message: String,
}

/// Full report representation for update requests. This is a whole-record
/// replace, not a patch; the path id wins over anything in the body, and
/// unknown fields (id, created_at, nested collections) are ignored.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateReportDto {
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolver_notes: Option<String>,
    #[serde(default)]
    pub admin_notes: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub twitter_posted: bool,
    #[serde(default)]
    pub twitter_post_id: Option<String>,
}

fn default_status() -> String {
    "pending".to_string()
}

/// Response DTO for an image attached to a report.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImageResponseDto {
    pub id: i32,
    pub report_id: i32,
    pub storage_url: String,
    pub storage_public_id: String,
    pub image_type: String,
    pub moderation_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderation_notes: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderated_by: Option<i32>,
}

impl From<Image> for ImageResponseDto {
    fn from(i: Image) -> Self {
        Self {
            id: i.id,
            report_id: i.report_id,
            storage_url: i.storage_url,
            storage_public_id: i.storage_public_id,
            image_type: i.image_type,
            moderation_status: i.moderation_status,
            moderation_notes: i.moderation_notes,
            uploaded_at: i.uploaded_at,
            moderated_at: i.moderated_at,
            moderated_by: i.moderated_by,
        }
    }
}

/// Response DTO for one timeline entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusUpdateResponseDto {
    pub id: i32,
    pub report_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_status: Option<String>,
    pub new_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

impl From<StatusUpdate> for StatusUpdateResponseDto {
    fn from(u: StatusUpdate) -> Self {
        Self {
            id: u.id,
            report_id: u.report_id,
            old_status: u.old_status,
            new_status: u.new_status,
            notes: u.notes,
            updated_by: u.updated_by,
            updated_at: u.updated_at,
        }
    }
}

/// Full report representation returned by get/list/update. The submitter
/// network address is intentionally absent.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportResponseDto {
    pub id: i32,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolver_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub twitter_posted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_post_id: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageResponseDto>,
    #[serde(default)]
    pub timeline: Vec<StatusUpdateResponseDto>,
}

impl From<ReportWithRelations> for ReportResponseDto {
    fn from(r: ReportWithRelations) -> Self {
        let report = r.report;
        Self {
            id: report.id,
            category: report.category,
            latitude: report.latitude,
            longitude: report.longitude,
            description: report.description,
            status: report.status,
            created_at: report.created_at,
            verified_at: report.verified_at,
            started_at: report.started_at,
            resolved_at: report.resolved_at,
            resolver_notes: report.resolver_notes,
            admin_notes: report.admin_notes,
            state: report.state,
            city: report.city,
            twitter_posted: report.twitter_posted,
            twitter_post_id: report.twitter_post_id,
            images: r.images.into_iter().map(Into::into).collect(),
            timeline: r.timeline.into_iter().map(Into::into).collect(),
        }
    }
}
