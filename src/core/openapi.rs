use utoipa::{Modify, OpenApi};

use crate::core::error::ErrorBody;
use crate::features::categories::{dtos as categories_dtos, handlers as categories_handlers};
use crate::features::reports::{dtos as reports_dtos, handlers as reports_handlers};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Reports
        reports_handlers::report_handler::create_report,
        reports_handlers::report_handler::get_report,
        reports_handlers::report_handler::list_reports,
        reports_handlers::report_handler::update_report,
        reports_handlers::report_handler::delete_report,
        // Categories (public)
        categories_handlers::category_handler::list_categories,
    ),
    components(
        schemas(
            ErrorBody,
            // Reports
            reports_dtos::CreateReportDto,
            reports_dtos::CreateReportResponseDto,
            reports_dtos::UpdateReportDto,
            reports_dtos::ReportResponseDto,
            reports_dtos::ImageResponseDto,
            reports_dtos::StatusUpdateResponseDto,
            // Categories
            categories_dtos::CategoryResponseDto,
        )
    ),
    tags(
        (name = "reports", description = "Citizen-submitted civic issue reports"),
        (name = "categories", description = "Report categories (public)"),
    ),
    info(
        title = "CivicFix API",
        version = "0.1.0",
        description = "Civic-issue reporting API",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
