use axum::{
    routing::{get, post},
    Router,
};

use crate::features::reports::handlers::{report_handler, ReportState};

/// Create routes for the reports feature
pub fn routes(state: ReportState) -> Router {
    Router::new()
        .route(
            "/reports",
            post(report_handler::create_report).get(report_handler::list_reports),
        )
        .route(
            "/reports/{id}",
            get(report_handler::get_report)
                .put(report_handler::update_report)
                .delete(report_handler::delete_report),
        )
        .with_state(state)
}
