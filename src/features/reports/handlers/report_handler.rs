use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::reports::dtos::{
    CreateReportDto, CreateReportResponseDto, ReportResponseDto, UpdateReportDto,
};
use crate::features::reports::models::{NewReport, ReportWithRelations, UpdateReport};
use crate::features::reports::services::ReportStore;

/// State for report handlers
#[derive(Clone)]
pub struct ReportState {
    pub store: Arc<dyn ReportStore>,
    /// Base URL for shareable report links, e.g. "https://civicfix.example".
    pub public_base_url: Arc<str>,
}

impl ReportState {
    pub fn new(store: Arc<dyn ReportStore>, public_base_url: &str) -> Self {
        Self {
            store,
            public_base_url: Arc::from(public_base_url.trim_end_matches('/')),
        }
    }

    fn share_url(&self, id: i32) -> String {
        format!("{}/reports/{}", self.public_base_url, id)
    }
}

/// Parse a path segment as a report id.
fn parse_report_id(raw: &str) -> Result<i32> {
    raw.parse::<i32>()
        .map_err(|_| AppError::InvalidInput("Invalid report ID".to_string()))
}

/// Best-effort client address from proxy headers. Falls back to nothing
/// rather than trusting the socket peer, which is the proxy in deployment.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        })
}

/// Submit a new report
#[utoipa::path(
    post,
    path = "/reports",
    request_body = CreateReportDto,
    responses(
        (status = 201, description = "Report created", body = CreateReportResponseDto),
        (status = 400, description = "Validation error"),
        (status = 500, description = "Internal error")
    ),
    tag = "reports"
)]
pub async fn create_report(
    State(state): State<ReportState>,
    headers: HeaderMap,
    AppJson(dto): AppJson<CreateReportDto>,
) -> Result<(StatusCode, Json<CreateReportResponseDto>)> {
    if let Err(e) = dto.validate() {
        tracing::error!("POST /reports - validation failed: {}", e);
        return Err(AppError::InvalidInput(e.to_string()));
    }

    if dto.latitude < -90.0 || dto.latitude > 90.0 || dto.longitude < -180.0 || dto.longitude > 180.0
    {
        tracing::error!(
            "POST /reports - invalid coordinates: lat={}, lng={}",
            dto.latitude,
            dto.longitude
        );
        return Err(AppError::Validation(
            "Invalid latitude or longitude.".to_string(),
        ));
    }

    if !state.store.category_exists(&dto.category).await? {
        tracing::error!("POST /reports - category not found: {}", dto.category);
        return Err(AppError::Validation("Invalid category.".to_string()));
    }

    let report = state
        .store
        .create_report(NewReport {
            category: dto.category,
            latitude: dto.latitude,
            longitude: dto.longitude,
            description: dto.description,
            reporter_ip: client_ip(&headers),
        })
        .await?;

    tracing::info!("POST /reports - created report {}", report.id);

    Ok((
        StatusCode::CREATED,
        Json(CreateReportResponseDto {
            share_url: state.share_url(report.id),
            id: report.id,
            message: "Report submitted successfully".to_string(),
        }),
    ))
}

/// Get a report by id, with images and timeline
#[utoipa::path(
    get,
    path = "/reports/{id}",
    params(
        ("id" = i32, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report found", body = ReportResponseDto),
        (status = 400, description = "Invalid report ID"),
        (status = 404, description = "Report not found")
    ),
    tag = "reports"
)]
pub async fn get_report(
    State(state): State<ReportState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ReportResponseDto>> {
    let id = parse_report_id(&raw_id).inspect_err(|_| {
        tracing::error!("GET /reports/{{id}} - invalid report ID: {}", raw_id);
    })?;

    match state.store.get_report(id).await? {
        Some(report) => Ok(Json(report.into())),
        None => {
            tracing::info!("GET /reports/{{id}} - report not found (id={})", id);
            Err(AppError::NotFound("Report not found".to_string()))
        }
    }
}

/// List all reports
#[utoipa::path(
    get,
    path = "/reports",
    responses(
        (status = 200, description = "All reports", body = Vec<ReportResponseDto>),
        (status = 500, description = "Internal error")
    ),
    tag = "reports"
)]
pub async fn list_reports(
    State(state): State<ReportState>,
) -> Result<Json<Vec<ReportResponseDto>>> {
    let reports = state.store.list_reports().await?;
    let dtos: Vec<ReportResponseDto> = reports.into_iter().map(Into::into).collect();
    Ok(Json(dtos))
}

/// Replace a report (full-record save)
#[utoipa::path(
    put,
    path = "/reports/{id}",
    params(
        ("id" = i32, Path, description = "Report ID")
    ),
    request_body = UpdateReportDto,
    responses(
        (status = 200, description = "Saved report", body = ReportResponseDto),
        (status = 400, description = "Invalid report ID or body"),
        (status = 500, description = "Internal error")
    ),
    tag = "reports"
)]
pub async fn update_report(
    State(state): State<ReportState>,
    Path(raw_id): Path<String>,
    AppJson(dto): AppJson<UpdateReportDto>,
) -> Result<Json<ReportResponseDto>> {
    let id = parse_report_id(&raw_id).inspect_err(|_| {
        tracing::error!("PUT /reports/{{id}} - invalid report ID: {}", raw_id);
    })?;

    // Path id wins over whatever the body carries.
    let saved = state
        .store
        .update_report(UpdateReport {
            id,
            category: dto.category,
            latitude: dto.latitude,
            longitude: dto.longitude,
            description: dto.description,
            status: dto.status,
            verified_at: dto.verified_at,
            started_at: dto.started_at,
            resolved_at: dto.resolved_at,
            resolver_notes: dto.resolver_notes,
            admin_notes: dto.admin_notes,
            state: dto.state,
            city: dto.city,
            twitter_posted: dto.twitter_posted,
            twitter_post_id: dto.twitter_post_id,
        })
        .await?;

    tracing::info!("PUT /reports/{{id}} - saved report {}", saved.id);

    // Re-read so the response carries the collections, including any
    // timeline entry this save just appended.
    let full = state
        .store
        .get_report(saved.id)
        .await?
        .unwrap_or(ReportWithRelations {
            report: saved,
            images: Vec::new(),
            timeline: Vec::new(),
        });

    Ok(Json(full.into()))
}

/// Delete a report
#[utoipa::path(
    delete,
    path = "/reports/{id}",
    params(
        ("id" = i32, Path, description = "Report ID")
    ),
    responses(
        (status = 204, description = "Report deleted"),
        (status = 400, description = "Invalid report ID"),
        (status = 500, description = "Internal error")
    ),
    tag = "reports"
)]
pub async fn delete_report(
    State(state): State<ReportState>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_report_id(&raw_id).inspect_err(|_| {
        tracing::error!("DELETE /reports/{{id}} - invalid report ID: {}", raw_id);
    })?;

    // Deleting an absent id is a no-op, kept idempotent on purpose.
    if state.store.delete_report(id).await? {
        tracing::info!("DELETE /reports/{{id}} - deleted report {}", id);
    } else {
        tracing::info!("DELETE /reports/{{id}} - nothing to delete (id={})", id);
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{test_router, FailingReportStore, InMemoryReportStore};
    use axum_test::TestServer;
    use fake::{faker::lorem::en::Sentence, Fake};
    use serde_json::{json, Value};

    fn server_with(store: InMemoryReportStore) -> TestServer {
        TestServer::new(test_router(Arc::new(store))).unwrap()
    }

    fn default_server() -> TestServer {
        server_with(InMemoryReportStore::with_categories(&["potholes"]))
    }

    #[test]
    fn parses_numeric_report_ids_only() {
        assert_eq!(parse_report_id("42").unwrap(), 42);
        assert!(parse_report_id("abc").is_err());
        assert!(parse_report_id("4.2").is_err());
        assert!(parse_report_id("").is_err());
    }

    #[test]
    fn client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        headers.insert("x-real-ip", "198.51.100.2".parse().unwrap());
        assert_eq!(client_ip(&headers), Some("203.0.113.9".to_string()));

        headers.remove("x-forwarded-for");
        assert_eq!(client_ip(&headers), Some("198.51.100.2".to_string()));

        headers.remove("x-real-ip");
        assert_eq!(client_ip(&headers), None);
    }

    #[tokio::test]
    async fn create_report_round_trips() {
        let server = default_server();

        let res = server
            .post("/reports")
            .json(&json!({
                "category": "potholes",
                "latitude": 12.97,
                "longitude": 77.59,
                "description": "deep pothole"
            }))
            .await;

        res.assert_status(StatusCode::CREATED);
        let body: Value = res.json();
        let id = body["id"].as_i64().unwrap();
        assert!(id > 0);
        assert_eq!(body["message"], "Report submitted successfully");
        assert_eq!(
            body["share_url"],
            format!("http://localhost:3000/reports/{}", id)
        );

        let fetched = server.get(&format!("/reports/{}", id)).await;
        fetched.assert_status_ok();
        let report: Value = fetched.json();
        assert_eq!(report["category"], "potholes");
        assert_eq!(report["latitude"], 12.97);
        assert_eq!(report["longitude"], 77.59);
        assert_eq!(report["description"], "deep pothole");
        assert_eq!(report["status"], "pending");
        assert_eq!(report["images"], json!([]));
        assert_eq!(report["timeline"], json!([]));
    }

    #[tokio::test]
    async fn create_report_never_exposes_reporter_ip() {
        let server = default_server();

        let res = server
            .post("/reports")
            .add_header("x-forwarded-for", "203.0.113.9")
            .json(&json!({
                "category": "potholes",
                "latitude": 1.0,
                "longitude": 2.0
            }))
            .await;
        res.assert_status(StatusCode::CREATED);
        let id = res.json::<Value>()["id"].as_i64().unwrap();

        let body = server.get(&format!("/reports/{}", id)).await.text();
        assert!(!body.contains("203.0.113.9"));
        assert!(!body.contains("reporter_ip"));
    }

    #[tokio::test]
    async fn create_rejects_out_of_range_coordinates() {
        let server = default_server();

        for (lat, lng) in [(200.0, 77.59), (-91.0, 0.0), (0.0, 180.5), (45.0, -181.0)] {
            let res = server
                .post("/reports")
                .json(&json!({
                    "category": "potholes",
                    "latitude": lat,
                    "longitude": lng
                }))
                .await;

            res.assert_status(StatusCode::BAD_REQUEST);
            let body: Value = res.json();
            assert_eq!(body["error"], "VALIDATION_ERROR");
            assert_eq!(body["details"], "Invalid latitude or longitude.");
        }
    }

    #[tokio::test]
    async fn create_rejects_unknown_and_inactive_categories() {
        let store = InMemoryReportStore::with_categories(&["potholes"]);
        let server = server_with(store);

        for category in ["sinkholes", "garbage_heap"] {
            let res = server
                .post("/reports")
                .json(&json!({
                    "category": category,
                    "latitude": 12.97,
                    "longitude": 77.59
                }))
                .await;

            res.assert_status(StatusCode::BAD_REQUEST);
            let body: Value = res.json();
            assert_eq!(body["error"], "VALIDATION_ERROR");
            assert_eq!(body["details"], "Invalid category.");
        }

        // No insert happened for either rejection.
        let list: Value = server.get("/reports").await.json();
        assert_eq!(list.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn create_rejects_missing_fields_as_invalid_input() {
        let server = default_server();

        let res = server
            .post("/reports")
            .json(&json!({"category": "potholes", "latitude": 12.97}))
            .await;
        res.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(res.json::<Value>()["error"], "INVALID_INPUT");

        let res = server
            .post("/reports")
            .json(&json!({"category": "", "latitude": 1.0, "longitude": 2.0}))
            .await;
        res.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(res.json::<Value>()["error"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn get_report_maps_absent_to_404_and_bad_id_to_400() {
        let server = default_server();

        let res = server.get("/reports/999999").await;
        res.assert_status(StatusCode::NOT_FOUND);
        let body: Value = res.json();
        assert_eq!(body["error"], "NOT_FOUND");
        assert_eq!(body["details"], "Report not found");

        let res = server.get("/reports/abc").await;
        res.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = res.json();
        assert_eq!(body["error"], "INVALID_INPUT");
        assert_eq!(body["details"], "Invalid report ID");
    }

    #[tokio::test]
    async fn list_returns_every_persisted_report() {
        let server = default_server();

        let empty: Value = server.get("/reports").await.json();
        assert_eq!(empty, json!([]));

        for i in 0..3 {
            let description: String = Sentence(3..8).fake();
            server
                .post("/reports")
                .json(&json!({
                    "category": "potholes",
                    "latitude": 10.0 + i as f64,
                    "longitude": 20.0 + i as f64,
                    "description": description
                }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let list: Value = server.get("/reports").await.json();
        let reports = list.as_array().unwrap();
        assert_eq!(reports.len(), 3);
        for report in reports {
            assert!(report["images"].is_array());
            assert!(report["timeline"].is_array());
        }
    }

    #[tokio::test]
    async fn update_replaces_record_and_appends_timeline_on_status_change() {
        let server = default_server();

        let created: Value = server
            .post("/reports")
            .json(&json!({
                "category": "potholes",
                "latitude": 12.97,
                "longitude": 77.59,
                "description": "deep pothole"
            }))
            .await
            .json();
        let id = created["id"].as_i64().unwrap();

        let res = server
            .put(&format!("/reports/{}", id))
            .json(&json!({
                "category": "potholes",
                "latitude": 12.97,
                "longitude": 77.59,
                "description": "patched over",
                "status": "verified"
            }))
            .await;
        res.assert_status_ok();
        let saved: Value = res.json();
        assert_eq!(saved["id"], id);
        assert_eq!(saved["description"], "patched over");
        assert_eq!(saved["status"], "verified");

        let timeline = saved["timeline"].as_array().unwrap();
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0]["old_status"], "pending");
        assert_eq!(timeline[0]["new_status"], "verified");

        // Saving again without a status change appends nothing.
        let res = server
            .put(&format!("/reports/{}", id))
            .json(&json!({
                "category": "potholes",
                "latitude": 12.97,
                "longitude": 77.59,
                "description": "patched over",
                "status": "verified"
            }))
            .await;
        res.assert_status_ok();
        assert_eq!(res.json::<Value>()["timeline"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_rejects_bad_id_and_malformed_body() {
        let server = default_server();

        let res = server
            .put("/reports/abc")
            .json(&json!({"category": "potholes", "latitude": 1.0, "longitude": 2.0}))
            .await;
        res.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(res.json::<Value>()["error"], "INVALID_INPUT");

        let res = server.put("/reports/1").json(&json!({"category": 7})).await;
        res.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(res.json::<Value>()["error"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let server = default_server();

        let created: Value = server
            .post("/reports")
            .json(&json!({
                "category": "potholes",
                "latitude": 1.0,
                "longitude": 2.0
            }))
            .await
            .json();
        let id = created["id"].as_i64().unwrap();

        let res = server.delete(&format!("/reports/{}", id)).await;
        res.assert_status(StatusCode::NO_CONTENT);
        assert!(res.text().is_empty());

        server
            .get(&format!("/reports/{}", id))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        // Second delete of the same id behaves the same way.
        server
            .delete(&format!("/reports/{}", id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .delete("/reports/abc")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn storage_failures_return_generic_500_bodies() {
        let server = TestServer::new(test_router(Arc::new(FailingReportStore))).unwrap();

        for res in [
            server.get("/reports").await,
            server.get("/reports/1").await,
            server
                .post("/reports")
                .json(&json!({"category": "potholes", "latitude": 1.0, "longitude": 2.0}))
                .await,
            server.delete("/reports/1").await,
        ] {
            res.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
            let body: Value = res.json();
            assert_eq!(body["error"], "INTERNAL_ERROR");
            assert_eq!(body["details"], "Database error occurred");
            // The driver's "closed pool" text must not leak into the body.
            assert!(!res.text().to_lowercase().contains("pool"));
        }

        // Non-database internal failures stay just as generic.
        let res = server
            .put("/reports/1")
            .json(&json!({"category": "potholes", "latitude": 1.0, "longitude": 2.0}))
            .await;
        res.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = res.json();
        assert_eq!(body["error"], "INTERNAL_ERROR");
        assert_eq!(body["details"], "Internal server error");
        assert!(!res.text().contains("backend unavailable"));
    }

    #[tokio::test]
    async fn create_after_upsert_with_fresh_id_does_not_collide() {
        let server = default_server();

        // Save through the update path with a client-chosen id.
        let res = server
            .put("/reports/42")
            .json(&json!({"category": "potholes", "latitude": 1.0, "longitude": 2.0}))
            .await;
        res.assert_status_ok();
        assert_eq!(res.json::<Value>()["id"], 42);

        // A subsequent create must draw an id past the one just claimed.
        let res = server
            .post("/reports")
            .json(&json!({"category": "potholes", "latitude": 3.0, "longitude": 4.0}))
            .await;
        res.assert_status(StatusCode::CREATED);
        let id = res.json::<Value>()["id"].as_i64().unwrap();
        assert!(id > 42);
    }
}
