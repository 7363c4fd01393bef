mod report_dto;

pub use report_dto::{
    CreateReportDto, CreateReportResponseDto, ImageResponseDto, ReportResponseDto,
    StatusUpdateResponseDto, UpdateReportDto,
};
