//! Extraction orchestrator.
//!
//! Files are processed strictly one at a time, in input order. Each file goes
//! `Queued -> Parsing -> {Matched | NotFound | ParseError}` and always yields a
//! record: no per-file failure aborts the batch. Progress is reported through
//! events so the UI stays out of this module.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use crate::extraction::{
    extract_from_fragments, ExtractionError, ExtractionResult, PageRasterizer, PageTextSource,
    PasswordError,
};
use crate::models::{file_name_of, ExtractionOutcome, FileRecord, DOB_NOT_FOUND};

/// Events emitted while a batch is processed.
#[derive(Debug, Clone)]
pub enum ProcessingEvent {
    /// A file was dequeued; `index` is zero-based.
    FileStarted {
        index: usize,
        total: usize,
        file_name: String,
    },
    /// A file reached a terminal state.
    FileFinished {
        index: usize,
        file_name: String,
        outcome: ExtractionOutcome,
        has_screenshot: bool,
    },
    /// Every file has been processed.
    BatchComplete {
        matched: usize,
        not_found: usize,
        failed: usize,
    },
}

/// Why a file produced no extraction.
#[derive(Debug, thiserror::Error)]
pub enum DobLookupError {
    /// The PDF could not be read or parsed.
    #[error(transparent)]
    Parse(#[from] ExtractionError),
    /// A captured date did not split into day, month and year.
    #[error(transparent)]
    MalformedDate(#[from] PasswordError),
}

/// Runs the extraction pipeline over files.
pub struct ExtractionService {
    text_source: Box<dyn PageTextSource>,
    rasterizer: Box<dyn PageRasterizer>,
}

impl ExtractionService {
    /// Create a service from a text source and a rasterizer.
    pub fn new(text_source: Box<dyn PageTextSource>, rasterizer: Box<dyn PageRasterizer>) -> Self {
        Self {
            text_source,
            rasterizer,
        }
    }

    /// Extract page 1 text from `pdf_data` and look for a DOB.
    ///
    /// Consumes the buffer. `Ok(None)` means no pattern matched.
    pub async fn extract_dob(
        &self,
        pdf_data: Vec<u8>,
    ) -> Result<Option<ExtractionResult>, DobLookupError> {
        let fragments = self.text_source.first_page_fragments(pdf_data).await?;
        tracing::debug!("Extracted {} text fragments from page 1", fragments.len());
        Ok(extract_from_fragments(&fragments)?)
    }

    /// Build the record for one file from its bytes.
    ///
    /// Text extraction and rendering each receive their own copy of the bytes.
    pub async fn process_bytes(&self, file_path: PathBuf, pdf_data: Vec<u8>) -> FileRecord {
        let lookup = self.extract_dob(pdf_data.clone()).await;

        // Unparseable files get no screenshot
        if matches!(lookup, Err(DobLookupError::Parse(_))) {
            return build_record(file_path, pdf_data, lookup, None);
        }

        let screenshot = match self.rasterizer.render_header(pdf_data.clone()).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("Screenshot failed for {}: {}", file_path.display(), e);
                None
            }
        };

        build_record(file_path, pdf_data, lookup, screenshot)
    }

    /// Read a file from disk and process it.
    pub async fn process_file(&self, file_path: &Path) -> FileRecord {
        match tokio::fs::read(file_path).await {
            Ok(pdf_data) => self.process_bytes(file_path.to_path_buf(), pdf_data).await,
            Err(e) => {
                tracing::warn!("Could not read {}: {}", file_path.display(), e);
                FileRecord::parse_error(file_path.to_path_buf(), e.to_string())
            }
        }
    }

    /// Process files sequentially, in order, reporting progress on `event_tx`.
    pub async fn process_files(
        &self,
        file_paths: &[PathBuf],
        event_tx: Option<mpsc::Sender<ProcessingEvent>>,
    ) -> Vec<FileRecord> {
        let total = file_paths.len();
        let mut records = Vec::with_capacity(total);
        let (mut matched, mut not_found, mut failed) = (0, 0, 0);

        for (index, file_path) in file_paths.iter().enumerate() {
            let file_name = file_name_of(file_path);
            send(
                &event_tx,
                ProcessingEvent::FileStarted {
                    index,
                    total,
                    file_name: file_name.clone(),
                },
            )
            .await;

            let record = self.process_file(file_path).await;
            tracing::debug!("{}: {}", file_name, record.outcome.as_str());
            match record.outcome {
                ExtractionOutcome::Matched => matched += 1,
                ExtractionOutcome::NotFound => not_found += 1,
                ExtractionOutcome::ParseError => failed += 1,
            }

            send(
                &event_tx,
                ProcessingEvent::FileFinished {
                    index,
                    file_name,
                    outcome: record.outcome,
                    has_screenshot: record.screenshot.is_some(),
                },
            )
            .await;
            records.push(record);
        }

        tracing::info!(
            "Processed {} files: {} matched, {} without DOB, {} unreadable",
            total,
            matched,
            not_found,
            failed
        );
        send(
            &event_tx,
            ProcessingEvent::BatchComplete {
                matched,
                not_found,
                failed,
            },
        )
        .await;

        records
    }
}

/// Record for a file whose bytes were read, given the DOB lookup result.
///
/// A lookup that failed for any reason other than parsing lands on the
/// NotFound branch with the failure as its error.
fn build_record(
    file_path: PathBuf,
    pdf_data: Vec<u8>,
    lookup: Result<Option<ExtractionResult>, DobLookupError>,
    screenshot: Option<String>,
) -> FileRecord {
    match lookup {
        Ok(Some(extraction)) => FileRecord::matched(file_path, pdf_data, extraction, screenshot),
        Ok(None) => FileRecord::not_found(file_path, pdf_data, screenshot, DOB_NOT_FOUND),
        Err(DobLookupError::Parse(e)) => {
            tracing::warn!("Could not parse {}: {}", file_path.display(), e);
            FileRecord::parse_error(file_path, e.to_string())
        }
        Err(e) => {
            tracing::warn!("Discarding DOB for {}: {}", file_path.display(), e);
            FileRecord::not_found(file_path, pdf_data, screenshot, e.to_string())
        }
    }
}

async fn send(event_tx: &Option<mpsc::Sender<ProcessingEvent>>, event: ProcessingEvent) {
    if let Some(tx) = event_tx {
        let _ = tx.send(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extraction() -> ExtractionResult {
        ExtractionResult {
            dob: "01/02/2015".to_string(),
            password: "01022015".to_string(),
            text_context: "DOB: 1/2/2015".to_string(),
            raw_match: "DOB: 1/2/2015".to_string(),
            coordinates: None,
        }
    }

    fn shot() -> Option<String> {
        Some("data:image/png;base64,AAAA".to_string())
    }

    #[test]
    fn test_malformed_date_becomes_not_found() {
        let lookup = Err(DobLookupError::MalformedDate(PasswordError::InvalidDob(
            "1990".to_string(),
        )));
        let record = build_record(PathBuf::from("/in/a.pdf"), b"%PDF".to_vec(), lookup, shot());

        assert_eq!(record.outcome, ExtractionOutcome::NotFound);
        assert_eq!(record.password, "");
        assert!(record.extraction.is_none());
        assert_eq!(record.error.as_deref(), Some("Invalid DOB: 1990"));
        assert_eq!(record.screenshot, shot());
        assert_eq!(record.pdf_data.as_deref(), Some(b"%PDF".as_slice()));
    }

    #[test]
    fn test_parse_failure_drops_bytes_and_screenshot() {
        let lookup = Err(DobLookupError::Parse(ExtractionError::ExtractionFailed(
            "pdftotext failed: Syntax Error".to_string(),
        )));
        let record = build_record(PathBuf::from("bad.pdf"), b"junk".to_vec(), lookup, shot());

        assert_eq!(record.outcome, ExtractionOutcome::ParseError);
        assert!(record.pdf_data.is_none());
        assert!(record.screenshot.is_none());
        assert_eq!(
            record.error.as_deref(),
            Some("Extraction failed: pdftotext failed: Syntax Error")
        );
    }

    #[test]
    fn test_lookup_branches() {
        let matched = build_record(PathBuf::from("a.pdf"), Vec::new(), Ok(Some(extraction())), None);
        assert_eq!(matched.outcome, ExtractionOutcome::Matched);
        assert_eq!(matched.password, "01022015");

        let missing = build_record(PathBuf::from("b.pdf"), Vec::new(), Ok(None), shot());
        assert_eq!(missing.outcome, ExtractionOutcome::NotFound);
        assert_eq!(missing.error.as_deref(), Some(DOB_NOT_FOUND));
        assert!(missing.screenshot.is_some());
    }
}
