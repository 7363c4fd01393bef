mod report_service;

pub use report_service::{PgReportService, ReportStore};
