//! Page-1 text extraction with word positions using `pdftotext -bbox`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;

use super::{TextFragment, DEFAULT_FRAGMENT_HEIGHT};

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle command output, extracting stdout on success or returning appropriate error.
fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ExtractionError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractionError::ExtractionFailed(format!(
                    "{}: {}",
                    error_prefix,
                    stderr.trim()
                )))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

/// Source of positioned page-1 text.
///
/// Implementations take ownership of the PDF bytes.
#[async_trait]
pub trait PageTextSource: Send + Sync {
    /// Extract the text fragments of page 1, in extractor order.
    async fn first_page_fragments(
        &self,
        pdf_data: Vec<u8>,
    ) -> Result<Vec<TextFragment>, ExtractionError>;
}

/// Text extractor backed by Poppler's `pdftotext`.
pub struct PdftotextExtractor {
    binary: PathBuf,
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("pdftotext"),
        }
    }
}

impl PdftotextExtractor {
    /// Create an extractor using `pdftotext` from PATH.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `pdftotext` binary.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

#[async_trait]
impl PageTextSource for PdftotextExtractor {
    async fn first_page_fragments(
        &self,
        pdf_data: Vec<u8>,
    ) -> Result<Vec<TextFragment>, ExtractionError> {
        let temp_dir = TempDir::new()?;
        let input = temp_dir.path().join("input.pdf");
        tokio::fs::write(&input, pdf_data).await?;

        tracing::debug!("Running {} -bbox on page 1", self.binary.display());
        let output = Command::new(&self.binary)
            .args(["-bbox", "-f", "1", "-l", "1", "-enc", "UTF-8"])
            .arg(&input)
            .arg("-") // Output to stdout
            .output()
            .await;

        let html = handle_cmd_output(output, "pdftotext (install poppler-utils)", "pdftotext failed")?;
        Ok(parse_bbox_html(&html))
    }
}

static WORD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("word").unwrap());

/// Parse the XHTML written by `pdftotext -bbox` into fragments.
///
/// Words with no text or unreadable coordinates are skipped.
pub fn parse_bbox_html(html: &str) -> Vec<TextFragment> {
    let document = Html::parse_document(html);

    document
        .select(&WORD_SELECTOR)
        .filter_map(|word| {
            let text: String = word.text().collect();
            if text.is_empty() {
                return None;
            }

            // The HTML parser lowercases attribute names (xMin -> xmin).
            let coord = |name: &str| word.value().attr(name)?.parse::<f64>().ok();
            let (x_min, y_min) = (coord("xmin")?, coord("ymin")?);
            let (x_max, y_max) = (coord("xmax")?, coord("ymax")?);

            let height = y_max - y_min;
            Some(TextFragment {
                text,
                x: x_min,
                y: y_min,
                width: x_max - x_min,
                height: if height > 0.0 {
                    height
                } else {
                    DEFAULT_FRAGMENT_HEIGHT
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
<title></title>
<meta name="Producer" content="Skia/PDF m120"/>
</head>
<body>
<doc>
  <page width="612.000000" height="792.000000">
    <word xMin="72.000000" yMin="70.000000" xMax="110.500000" yMax="82.000000">Patient</word>
    <word xMin="114.000000" yMin="70.000000" xMax="140.000000" yMax="82.000000">DOB:</word>
    <word xMin="144.000000" yMin="70.000000" xMax="190.000000" yMax="70.000000">1/2/2015</word>
    <word xMin="200.000000" yMin="70.000000" xMax="220.000000" yMax="82.000000">A&amp;E</word>
    <word xMin="bad" yMin="70.000000" xMax="220.000000" yMax="82.000000">skipped</word>
    <word xMin="230.000000" yMin="70.000000" xMax="240.000000" yMax="82.000000"></word>
  </page>
</doc>
</body>
</html>
"#;

    #[test]
    fn test_parse_bbox_html() {
        let frags = parse_bbox_html(SAMPLE);
        let texts: Vec<&str> = frags.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["Patient", "DOB:", "1/2/2015", "A&E"]);

        assert_eq!(frags[0].x, 72.0);
        assert_eq!(frags[0].y, 70.0);
        assert_eq!(frags[0].width, 38.5);
        assert_eq!(frags[0].height, 12.0);
    }

    #[test]
    fn test_zero_height_uses_default() {
        let frags = parse_bbox_html(SAMPLE);
        assert_eq!(frags[2].height, DEFAULT_FRAGMENT_HEIGHT);
    }

    #[test]
    fn test_parse_empty_document() {
        assert!(parse_bbox_html("").is_empty());
        assert!(parse_bbox_html("<html><body><doc></doc></body></html>").is_empty());
    }

    #[test]
    fn test_handle_cmd_output_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let result = handle_cmd_output(Err(err), "pdftotext", "pdftotext failed");
        assert!(matches!(result, Err(ExtractionError::ToolNotFound(t)) if t == "pdftotext"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_tool_not_found() {
        let extractor = PdftotextExtractor::new().with_binary("doblock-no-such-pdftotext");
        let result = extractor.first_page_fragments(b"%PDF-1.4".to_vec()).await;
        assert!(matches!(result, Err(ExtractionError::ToolNotFound(_))));
    }
}
