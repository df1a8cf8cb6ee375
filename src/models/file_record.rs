//! Per-file extraction record.
//!
//! A record is either on the success branch (extraction populated) or the
//! failure branch (error populated), never both. The screenshot is
//! independent of either branch.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::extraction::{ExtractionResult, Rect};

/// Error recorded when no DOB pattern matched.
pub const DOB_NOT_FOUND: &str = "Could not find DOB";

/// How a record's password was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Derived from a DOB found in the page text.
    Text,
    /// Typed by the user for a file with no extraction.
    Manual,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Text => "text",
            Confidence::Manual => "manual",
        }
    }
}

/// Terminal state of a file's extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionOutcome {
    Matched,
    NotFound,
    ParseError,
}

impl ExtractionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionOutcome::Matched => "matched",
            ExtractionOutcome::NotFound => "not_found",
            ExtractionOutcome::ParseError => "parse_error",
        }
    }
}

/// One input file in the working set.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    pub file_path: PathBuf,
    pub file_name: String,
    /// Raw file bytes, kept for later consumers. Absent after a parse error.
    #[serde(skip)]
    pub pdf_data: Option<Vec<u8>>,
    pub extraction: Option<ExtractionResult>,
    pub password: String,
    /// Header screenshot as a PNG data URL.
    pub screenshot: Option<String>,
    pub confidence: Option<Confidence>,
    pub error: Option<String>,
    pub outcome: ExtractionOutcome,
    pub output_path: Option<PathBuf>,
    pub encrypt_error: Option<String>,
    #[serde(skip)]
    password_edited: bool,
}

/// Display name for a path: its final component.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

impl FileRecord {
    fn base(file_path: PathBuf, outcome: ExtractionOutcome) -> Self {
        Self {
            file_name: file_name_of(&file_path),
            file_path,
            pdf_data: None,
            extraction: None,
            password: String::new(),
            screenshot: None,
            confidence: None,
            error: None,
            outcome,
            output_path: None,
            encrypt_error: None,
            password_edited: false,
        }
    }

    /// Record for a file whose DOB was found.
    pub fn matched(
        file_path: PathBuf,
        pdf_data: Vec<u8>,
        extraction: ExtractionResult,
        screenshot: Option<String>,
    ) -> Self {
        Self {
            pdf_data: Some(pdf_data),
            password: extraction.password.clone(),
            extraction: Some(extraction),
            screenshot,
            confidence: Some(Confidence::Text),
            ..Self::base(file_path, ExtractionOutcome::Matched)
        }
    }

    /// Record for a readable file with no usable DOB.
    pub fn not_found(
        file_path: PathBuf,
        pdf_data: Vec<u8>,
        screenshot: Option<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            pdf_data: Some(pdf_data),
            screenshot,
            error: Some(error.into()),
            ..Self::base(file_path, ExtractionOutcome::NotFound)
        }
    }

    /// Record for a file that could not be read or parsed.
    pub fn parse_error(file_path: PathBuf, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::base(file_path, ExtractionOutcome::ParseError)
        }
    }

    pub fn dob(&self) -> Option<&str> {
        self.extraction.as_ref().map(|e| e.dob.as_str())
    }

    pub fn text_context(&self) -> Option<&str> {
        self.extraction.as_ref().map(|e| e.text_context.as_str())
    }

    pub fn raw_match(&self) -> Option<&str> {
        self.extraction.as_ref().map(|e| e.raw_match.as_str())
    }

    pub fn coordinates(&self) -> Option<Rect> {
        self.extraction.as_ref().and_then(|e| e.coordinates)
    }

    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }

    /// Whether the user has changed the password since extraction.
    pub fn password_edited(&self) -> bool {
        self.password_edited
    }

    /// Replace the password with a user-supplied value.
    ///
    /// Files without an extraction become `Manual` once a password is typed.
    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
        self.password_edited = true;
        if self.extraction.is_none() {
            self.confidence = if self.password.is_empty() {
                None
            } else {
                Some(Confidence::Manual)
            };
        }
    }

    /// Directory of the input file.
    pub fn input_dir(&self) -> PathBuf {
        match self.file_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}
