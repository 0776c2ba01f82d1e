//! Markdown notes for a month of on-call planning.

pub mod notes;

pub use notes::{ReportPaths, build_report};
