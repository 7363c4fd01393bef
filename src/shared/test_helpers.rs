#[cfg(test)]
use std::collections::BTreeMap;
#[cfg(test)]
use std::sync::{Arc, Mutex};

#[cfg(test)]
use async_trait::async_trait;
#[cfg(test)]
use axum::Router;
#[cfg(test)]
use chrono::Utc;

#[cfg(test)]
use crate::core::error::{AppError, Result};
#[cfg(test)]
use crate::features::categories::models::Category;
#[cfg(test)]
use crate::features::categories::routes as categories_routes;
#[cfg(test)]
use crate::features::categories::CategoryStore;
#[cfg(test)]
use crate::features::reports::models::{
    NewReport, Report, ReportWithRelations, StatusUpdate, UpdateReport,
};
#[cfg(test)]
use crate::features::reports::routes as reports_routes;
#[cfg(test)]
use crate::features::reports::{ReportState, ReportStore};

#[cfg(test)]
pub const TEST_BASE_URL: &str = "http://localhost:3000";

/// In-memory `ReportStore` mirroring the SQL store's semantics, so handler
/// tests run without a database.
#[cfg(test)]
pub struct InMemoryReportStore {
    categories: Vec<String>,
    inner: Mutex<StoreInner>,
}

#[cfg(test)]
#[derive(Default)]
struct StoreInner {
    next_report_id: i32,
    next_update_id: i32,
    reports: BTreeMap<i32, Report>,
    timelines: BTreeMap<i32, Vec<StatusUpdate>>,
}

#[cfg(test)]
impl InMemoryReportStore {
    pub fn with_categories(active: &[&str]) -> Self {
        Self {
            categories: active.iter().map(|c| c.to_string()).collect(),
            inner: Mutex::new(StoreInner::default()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn category_exists(&self, name: &str) -> Result<bool> {
        Ok(self.categories.iter().any(|c| c == name))
    }

    async fn create_report(&self, new: NewReport) -> Result<Report> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_report_id += 1;
        let report = Report {
            id: inner.next_report_id,
            category: new.category,
            latitude: new.latitude,
            longitude: new.longitude,
            description: new.description,
            reporter_ip: new.reporter_ip,
            status: "pending".to_string(),
            created_at: Utc::now(),
            verified_at: None,
            started_at: None,
            resolved_at: None,
            resolver_notes: None,
            admin_notes: None,
            state: None,
            city: None,
            twitter_posted: false,
            twitter_post_id: None,
        };
        inner.reports.insert(report.id, report.clone());
        Ok(report)
    }

    async fn get_report(&self, id: i32) -> Result<Option<ReportWithRelations>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.reports.get(&id).map(|report| ReportWithRelations {
            report: report.clone(),
            images: Vec::new(),
            timeline: inner.timelines.get(&id).cloned().unwrap_or_default(),
        }))
    }

    async fn list_reports(&self) -> Result<Vec<ReportWithRelations>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .reports
            .values()
            .map(|report| ReportWithRelations {
                report: report.clone(),
                images: Vec::new(),
                timeline: inner
                    .timelines
                    .get(&report.id)
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn update_report(&self, update: UpdateReport) -> Result<Report> {
        let mut inner = self.inner.lock().unwrap();
        let existing = inner.reports.get(&update.id).cloned();

        let report = Report {
            id: update.id,
            category: update.category,
            latitude: update.latitude,
            longitude: update.longitude,
            description: update.description,
            reporter_ip: existing.as_ref().and_then(|r| r.reporter_ip.clone()),
            status: update.status,
            created_at: existing
                .as_ref()
                .map(|r| r.created_at)
                .unwrap_or_else(Utc::now),
            verified_at: update.verified_at,
            started_at: update.started_at,
            resolved_at: update.resolved_at,
            resolver_notes: update.resolver_notes,
            admin_notes: update.admin_notes,
            state: update.state,
            city: update.city,
            twitter_posted: update.twitter_posted,
            twitter_post_id: update.twitter_post_id,
        };

        // Fresh ids written through the update path must not be handed out
        // again by create_report, matching the SQL store's sequence advance.
        if existing.is_none() {
            inner.next_report_id = inner.next_report_id.max(update.id);
        }

        if let Some(old) = existing {
            if old.status != report.status {
                inner.next_update_id += 1;
                let entry = StatusUpdate {
                    id: inner.next_update_id,
                    report_id: report.id,
                    old_status: Some(old.status),
                    new_status: report.status.clone(),
                    notes: None,
                    updated_by: None,
                    updated_at: Utc::now(),
                };
                inner.timelines.entry(report.id).or_default().push(entry);
            }
        }

        inner.reports.insert(report.id, report.clone());
        Ok(report)
    }

    async fn delete_report(&self, id: i32) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        inner.timelines.remove(&id);
        Ok(inner.reports.remove(&id).is_some())
    }
}

/// Store whose every operation fails the way a lost database does. Lets
/// handler tests check what a 500 response actually discloses.
#[cfg(test)]
pub struct FailingReportStore;

#[cfg(test)]
#[async_trait]
impl ReportStore for FailingReportStore {
    // Category checks pass so writes reach the failing persistence calls.
    async fn category_exists(&self, _name: &str) -> Result<bool> {
        Ok(true)
    }

    async fn create_report(&self, _new: NewReport) -> Result<Report> {
        Err(AppError::Database(sqlx::Error::PoolClosed))
    }

    async fn get_report(&self, _id: i32) -> Result<Option<ReportWithRelations>> {
        Err(AppError::Database(sqlx::Error::PoolClosed))
    }

    async fn list_reports(&self) -> Result<Vec<ReportWithRelations>> {
        Err(AppError::Database(sqlx::Error::PoolClosed))
    }

    async fn update_report(&self, _update: UpdateReport) -> Result<Report> {
        Err(AppError::Internal(
            "report store backend unavailable".to_string(),
        ))
    }

    async fn delete_report(&self, _id: i32) -> Result<bool> {
        Err(AppError::Database(sqlx::Error::PoolClosed))
    }
}

/// In-memory `CategoryStore` mirroring the SQL store's filtering and
/// ordering.
#[cfg(test)]
pub struct InMemoryCategoryStore {
    categories: Vec<Category>,
}

#[cfg(test)]
impl InMemoryCategoryStore {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }
}

#[cfg(test)]
#[async_trait]
impl CategoryStore for InMemoryCategoryStore {
    async fn list_active(&self) -> Result<Vec<Category>> {
        let mut active: Vec<Category> = self
            .categories
            .iter()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(active)
    }
}

/// Router over the reports feature backed by the given store.
#[cfg(test)]
pub fn test_router(store: Arc<dyn ReportStore>) -> Router {
    reports_routes::routes(ReportState::new(store, TEST_BASE_URL))
}

/// Router over the categories feature backed by the given store.
#[cfg(test)]
pub fn categories_test_router(store: Arc<dyn CategoryStore>) -> Router {
    categories_routes::routes(store)
}
