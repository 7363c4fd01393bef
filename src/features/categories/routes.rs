use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::categories::handlers::category_handler;
use crate::features::categories::services::CategoryStore;

/// Create routes for the categories feature (public, read-only)
pub fn routes(store: Arc<dyn CategoryStore>) -> Router {
    Router::new()
        .route("/categories", get(category_handler::list_categories))
        .with_state(store)
}
