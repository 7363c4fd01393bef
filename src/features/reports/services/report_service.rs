use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::{
    Image, NewReport, Report, ReportWithRelations, StatusUpdate, UpdateReport,
};

const REPORT_COLUMNS: &str = "id, category, latitude, longitude, description, reporter_ip, \
     status, created_at, verified_at, started_at, resolved_at, resolver_notes, admin_notes, \
     state, city, twitter_posted, twitter_post_id";

/// Capability contract for report persistence.
///
/// Handlers depend on this trait rather than a concrete store so the HTTP
/// layer can be exercised against an in-memory implementation in tests.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// True iff an active category row matches `name`.
    async fn category_exists(&self, name: &str) -> Result<bool>;

    /// Insert a new report with status forced to "pending". Returns the
    /// stored row with its generated id and creation timestamp.
    async fn create_report(&self, new: NewReport) -> Result<Report>;

    /// Fetch a report with its image and timeline collections eagerly
    /// loaded. `None` is the explicit not-found, distinct from `Err`.
    async fn get_report(&self, id: i32) -> Result<Option<ReportWithRelations>>;

    /// All reports with their collections eagerly loaded. No pagination,
    /// filtering, or sorting; row order is whatever the store yields.
    async fn list_reports(&self) -> Result<Vec<ReportWithRelations>>;

    /// Upsert by primary key (full-record save). When the save changes an
    /// existing report's status, a timeline entry is appended in the same
    /// transaction.
    async fn update_report(&self, update: UpdateReport) -> Result<Report>;

    /// Delete by primary key. Returns whether a row was removed; dependent
    /// image and timeline rows go with it (cascade).
    async fn delete_report(&self, id: i32) -> Result<bool>;
}

/// PostgreSQL-backed report store.
pub struct PgReportService {
    pool: PgPool,
}

impl PgReportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_images(&self, report_ids: &[i32]) -> Result<HashMap<i32, Vec<Image>>> {
        let images = sqlx::query_as::<_, Image>(
            "SELECT id, report_id, storage_url, storage_public_id, image_type, \
             moderation_status, moderation_notes, uploaded_at, moderated_at, moderated_by \
             FROM images WHERE report_id = ANY($1) ORDER BY id",
        )
        .bind(report_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load report images: {:?}", e);
            AppError::Database(e)
        })?;

        let mut by_report: HashMap<i32, Vec<Image>> = HashMap::new();
        for image in images {
            by_report.entry(image.report_id).or_default().push(image);
        }
        Ok(by_report)
    }

    async fn load_timelines(&self, report_ids: &[i32]) -> Result<HashMap<i32, Vec<StatusUpdate>>> {
        let updates = sqlx::query_as::<_, StatusUpdate>(
            "SELECT id, report_id, old_status, new_status, notes, updated_by, updated_at \
             FROM status_updates WHERE report_id = ANY($1) ORDER BY id",
        )
        .bind(report_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load report timelines: {:?}", e);
            AppError::Database(e)
        })?;

        let mut by_report: HashMap<i32, Vec<StatusUpdate>> = HashMap::new();
        for update in updates {
            by_report.entry(update.report_id).or_default().push(update);
        }
        Ok(by_report)
    }

    async fn with_relations(&self, reports: Vec<Report>) -> Result<Vec<ReportWithRelations>> {
        if reports.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = reports.iter().map(|r| r.id).collect();
        let mut images = self.load_images(&ids).await?;
        let mut timelines = self.load_timelines(&ids).await?;

        Ok(reports
            .into_iter()
            .map(|report| {
                let id = report.id;
                ReportWithRelations {
                    report,
                    images: images.remove(&id).unwrap_or_default(),
                    timeline: timelines.remove(&id).unwrap_or_default(),
                }
            })
            .collect())
    }
}

#[async_trait]
impl ReportStore for PgReportService {
    async fn category_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM categories WHERE name = $1 AND is_active = TRUE",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check category existence: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(count > 0)
    }

    async fn create_report(&self, new: NewReport) -> Result<Report> {
        let sql = format!(
            "INSERT INTO reports (category, latitude, longitude, description, reporter_ip, status) \
             VALUES ($1, $2, $3, $4, $5, 'pending') \
             RETURNING {REPORT_COLUMNS}"
        );

        let report = sqlx::query_as::<_, Report>(&sql)
            .bind(&new.category)
            .bind(new.latitude)
            .bind(new.longitude)
            .bind(&new.description)
            .bind(&new.reporter_ip)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create report: {:?}", e);
                AppError::Database(e)
            })?;

        tracing::info!(
            "Created report {} (category: {})",
            report.id,
            report.category
        );

        Ok(report)
    }

    async fn get_report(&self, id: i32) -> Result<Option<ReportWithRelations>> {
        let sql = format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1");

        let report = sqlx::query_as::<_, Report>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get report: {:?}", e);
                AppError::Database(e)
            })?;

        match report {
            Some(report) => Ok(self.with_relations(vec![report]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_reports(&self) -> Result<Vec<ReportWithRelations>> {
        let sql = format!("SELECT {REPORT_COLUMNS} FROM reports");

        let reports = sqlx::query_as::<_, Report>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list reports: {:?}", e);
                AppError::Database(e)
            })?;

        self.with_relations(reports).await
    }

    async fn update_report(&self, update: UpdateReport) -> Result<Report> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to begin report save transaction: {:?}", e);
            AppError::Database(e)
        })?;

        // Prior status decides whether this save appends a timeline entry.
        let old_status: Option<String> =
            sqlx::query_scalar("SELECT status FROM reports WHERE id = $1")
                .bind(update.id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to read current report status: {:?}", e);
                    AppError::Database(e)
                })?;

        let sql = format!(
            "INSERT INTO reports (id, category, latitude, longitude, description, status, \
             verified_at, started_at, resolved_at, resolver_notes, admin_notes, state, city, \
             twitter_posted, twitter_post_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             ON CONFLICT (id) DO UPDATE SET \
             category = EXCLUDED.category, latitude = EXCLUDED.latitude, \
             longitude = EXCLUDED.longitude, description = EXCLUDED.description, \
             status = EXCLUDED.status, verified_at = EXCLUDED.verified_at, \
             started_at = EXCLUDED.started_at, resolved_at = EXCLUDED.resolved_at, \
             resolver_notes = EXCLUDED.resolver_notes, admin_notes = EXCLUDED.admin_notes, \
             state = EXCLUDED.state, city = EXCLUDED.city, \
             twitter_posted = EXCLUDED.twitter_posted, \
             twitter_post_id = EXCLUDED.twitter_post_id \
             RETURNING {REPORT_COLUMNS}"
        );

        let report = sqlx::query_as::<_, Report>(&sql)
            .bind(update.id)
            .bind(&update.category)
            .bind(update.latitude)
            .bind(update.longitude)
            .bind(&update.description)
            .bind(&update.status)
            .bind(update.verified_at)
            .bind(update.started_at)
            .bind(update.resolved_at)
            .bind(&update.resolver_notes)
            .bind(&update.admin_notes)
            .bind(&update.state)
            .bind(&update.city)
            .bind(update.twitter_posted)
            .bind(&update.twitter_post_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to save report: {:?}", e);
                AppError::Database(e)
            })?;

        // Keep the id sequence ahead of client-chosen ids, otherwise a later
        // insert can draw an id this save already claimed.
        if old_status.is_none() {
            sqlx::query(
                "SELECT setval('reports_id_seq', \
                 GREATEST((SELECT COALESCE(MAX(id), 1) FROM reports), \
                          (SELECT last_value FROM reports_id_seq)))",
            )
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to advance report id sequence: {:?}", e);
                AppError::Database(e)
            })?;
        }

        if let Some(old) = old_status {
            if old != report.status {
                sqlx::query(
                    "INSERT INTO status_updates (report_id, old_status, new_status) \
                     VALUES ($1, $2, $3)",
                )
                .bind(report.id)
                .bind(&old)
                .bind(&report.status)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to append status update: {:?}", e);
                    AppError::Database(e)
                })?;

                tracing::info!(
                    "Report {} status changed: {} -> {}",
                    report.id,
                    old,
                    report.status
                );
            }
        }

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit report save: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(report)
    }

    async fn delete_report(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reports WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete report: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(result.rows_affected() > 0)
    }
}
