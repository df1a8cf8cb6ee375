//! DOB extraction pipeline.
//!
//! Turns the first page of a PDF into a date of birth and a derived password:
//! - `text`: positioned text fragments via `pdftotext -bbox` (Poppler)
//! - `matcher`: prioritized DOB label patterns over the page text
//! - `password`: `DDMMYYYY` password derivation
//! - `evidence`: on-page coordinates backing a match
//! - `render`: cropped header screenshot via `pdftoppm` (Poppler)
//!
//! Buffers handed to [`PageTextSource`] or [`PageRasterizer`] are consumed.
//! Callers that need the same bytes twice must pass independent copies.

mod evidence;
mod matcher;
mod password;
mod render;
mod text;
mod tools;

use serde::{Deserialize, Serialize};

pub use evidence::locate_evidence;
pub use matcher::{find_dob, join_fragments, DobMatch, DobRule, CONTEXT_WINDOW};
pub use password::{format_dob, generate_password, PasswordError};
pub use render::{
    crop_header, png_data_url, PageRasterizer, PdftoppmRasterizer, RenderError,
    DEFAULT_CROP_FRACTION, DEFAULT_RENDER_DPI,
};
pub use text::{parse_bbox_html, ExtractionError, PageTextSource, PdftotextExtractor};
pub use tools::{check_binary, check_tools};

/// Height used when the extractor reports a zero-height box.
pub const DEFAULT_FRAGMENT_HEIGHT: f64 = 12.0;

/// A positioned run of text on page 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl TextFragment {
    /// Bounding box of this fragment.
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// On-page box in PDF points, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Outcome of a successful DOB extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Canonical `DD/MM/YYYY` date of birth.
    pub dob: String,
    /// Password derived from the date.
    pub password: String,
    /// Text surrounding the match, for review.
    pub text_context: String,
    /// Exact substring the rule matched.
    pub raw_match: String,
    /// Fragment box used to anchor the screenshot, if any.
    pub coordinates: Option<Rect>,
}

/// Run the matcher, generator and locator over already-extracted fragments.
///
/// Returns `Ok(None)` when no rule matches. A captured date that does not split
/// into three parts surfaces as [`PasswordError`].
pub fn extract_from_fragments(
    fragments: &[TextFragment],
) -> Result<Option<ExtractionResult>, PasswordError> {
    let full_text = join_fragments(fragments);
    let Some(m) = find_dob(&full_text) else {
        return Ok(None);
    };

    let password = generate_password(&m.date)?;
    let dob = format_dob(&m.date)?;
    let coordinates = locate_evidence(&m.date, fragments);

    tracing::debug!(
        "DOB matched by {}: {:?} -> {}",
        m.rule.as_str(),
        m.raw_match,
        dob
    );

    Ok(Some(ExtractionResult {
        dob,
        password,
        text_context: m.text_context,
        raw_match: m.raw_match,
        coordinates,
    }))
}
