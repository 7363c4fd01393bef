use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::categories::models::Category;

/// Capability contract for category lookups. Same seam as the report store,
/// so the handler can run against an in-memory implementation in tests.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// All active categories in display order (sort_order, then name).
    async fn list_active(&self) -> Result<Vec<Category>>;
}

/// PostgreSQL-backed category store.
pub struct PgCategoryService {
    pool: PgPool,
}

impl PgCategoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryStore for PgCategoryService {
    async fn list_active(&self) -> Result<Vec<Category>> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, name_hi, description, icon_class, is_active, sort_order \
             FROM categories WHERE is_active = TRUE ORDER BY sort_order, name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list categories: {:?}", e);
            AppError::Database(e)
        })
    }
}
