//! Data model shared by the analysis stages.
//!
//! [`RawLine`] is the extractor boundary; everything downstream of it
//! (classification, outline assembly, ranking, reporting) is expressed in
//! the types defined here.

mod line;
mod outline;
mod report;
mod request;

pub use line::{BBox, ClassifiedLine, DocumentId, LineLevel, RawLine};
pub use outline::{Heading, Outline, OutlineEntry};
pub use report::{
    ExtractedSection, HeadingRef, RankedSection, Report, ReportMetadata, SubsectionAnalysis,
    SubsectionSummary,
};
pub use request::{AnalysisRequest, DocumentRef, JobToBeDone, Persona};
