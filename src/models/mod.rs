//! Data models for doblock.

mod file_record;
mod working_set;

pub use file_record::{file_name_of, Confidence, ExtractionOutcome, FileRecord, DOB_NOT_FOUND};
pub use working_set::WorkingSet;
