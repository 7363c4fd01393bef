mod image;
mod report;
mod status_update;

pub use image::Image;
pub use report::{NewReport, Report, ReportWithRelations, UpdateReport};
pub use status_update::StatusUpdate;
