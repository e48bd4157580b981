//! Output rendering: report assembly and JSON serialization.

mod json;
mod report;

pub use json::{outline_json, report_json, to_json, JsonFormat, OutlineDocument, OutlineItem};
pub use report::{processing_timestamp, ReportBuilder};
