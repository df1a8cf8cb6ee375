//! HTML report of a protection batch.
//!
//! One entry per file: name, screenshot, extracted DOB, password, detection
//! method, output file and the text evidence.

use std::path::{Path, PathBuf};

use askama::Template;
use chrono::{DateTime, Local};
use thiserror::Error;

use crate::models::{FileRecord, WorkingSet};
use crate::utils::highlight_match;

/// Errors from report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Report row for a single file.
pub struct ReportEntry {
    pub file_name: String,
    pub screenshot: Option<String>,
    pub dob: String,
    pub password: String,
    pub detection: String,
    pub output_file: String,
    pub encrypt_error: Option<String>,
    /// Escaped text context with the match highlighted.
    pub context_html: Option<String>,
}

impl From<&FileRecord> for ReportEntry {
    fn from(record: &FileRecord) -> Self {
        let context_html = record
            .text_context()
            .map(|ctx| highlight_match(ctx, record.raw_match().unwrap_or_default()));

        Self {
            file_name: record.file_name.clone(),
            screenshot: record.screenshot.clone(),
            dob: record.dob().unwrap_or("Not found").to_string(),
            password: if record.has_password() {
                record.password.clone()
            } else {
                "N/A".to_string()
            },
            detection: record
                .confidence
                .map(|c| c.as_str())
                .unwrap_or("Manual")
                .to_string(),
            output_file: record
                .output_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "Pending".to_string()),
            encrypt_error: record.encrypt_error.clone(),
            context_html,
        }
    }
}

#[derive(Template)]
#[template(path = "report.html")]
pub struct ReportTemplate {
    pub generated: String,
    pub entries: Vec<ReportEntry>,
}

/// Render the report for every record in the set.
pub fn generate_report_html(
    set: &WorkingSet,
    generated_at: DateTime<Local>,
) -> Result<String, ReportError> {
    let template = ReportTemplate {
        generated: generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        entries: set.iter().map(ReportEntry::from).collect(),
    };
    Ok(template.render()?)
}

/// File name for a report generated at `generated_at`.
pub fn report_file_name(generated_at: DateTime<Local>) -> String {
    format!("protection_report_{}.html", generated_at.timestamp_millis())
}

/// Render and write the report into `output_dir`, returning its path.
pub async fn save_report(set: &WorkingSet, output_dir: &Path) -> Result<PathBuf, ReportError> {
    let now = Local::now();
    let html = generate_report_html(set, now)?;

    tokio::fs::create_dir_all(output_dir).await?;
    let path = output_dir.join(report_file_name(now));
    tokio::fs::write(&path, html).await?;
    tracing::info!("Wrote report to {}", path.display());
    Ok(path)
}
