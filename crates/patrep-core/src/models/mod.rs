//! Data models for the report pipeline.

pub mod config;
pub mod record;
pub mod report;

pub use config::{OutputFormat, PatrepConfig};
pub use record::{BoundingBox, SourceRef, TextLineRecord, NATIVE_TEXT_SCORE};
pub use report::{LegendRow, MatchResult, PatternSpec, SummaryRow};
