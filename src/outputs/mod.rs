//! Output generation for JSON artifacts and the text report.
//!
//! # Submodules
//!
//! - [`report`]: Renders an `AnalysisResult` into the fixed-layout text report
//! - [`json`]: Writes the analysis, the collected articles and the report to disk

pub mod json;
pub mod report;
