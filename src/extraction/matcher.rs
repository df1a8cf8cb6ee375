//! DOB label matching over page text.
//!
//! Rules are tried in a fixed priority order and the first rule with any
//! match wins, regardless of where other rules would match in the text.
//! More specific labels come first so that documents carrying several
//! date-like labels next to the DOB (e.g. "Age") resolve to the right value.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::TextFragment;

/// Characters of context kept on each side of a match.
pub const CONTEXT_WINDOW: usize = 80;

/// Label pattern that produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DobRule {
    /// `DOB: 01/02/2003`
    DobColon,
    /// `DOB | Age: 01/02/2003`
    DobPipeAge,
    /// `DOB` then `:`, `-` or `|`, any of `/ - .` as date separators
    DobSeparator,
    /// `Date of Birth` then `:`, `-` or `|`
    DateOfBirth,
    /// `D.O.B.` with optional periods and spaces
    DottedDob,
}

impl DobRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            DobRule::DobColon => "dob_colon",
            DobRule::DobPipeAge => "dob_pipe_age",
            DobRule::DobSeparator => "dob_separator",
            DobRule::DateOfBirth => "date_of_birth",
            DobRule::DottedDob => "dotted_dob",
        }
    }
}

/// Ordered `(rule, pattern, capture group)` triples.
static DOB_PATTERNS: LazyLock<Vec<(DobRule, Regex, usize)>> = LazyLock::new(|| {
    vec![
        (
            DobRule::DobColon,
            Regex::new(r"(?i)DOB\s*:\s*([0-9]{1,2}/[0-9]{1,2}/[0-9]{4})").unwrap(),
            1,
        ),
        (
            DobRule::DobPipeAge,
            Regex::new(r"(?i)DOB\s*\|\s*Age\s*:\s*([0-9]{1,2}/[0-9]{1,2}/[0-9]{4})").unwrap(),
            1,
        ),
        (
            DobRule::DobSeparator,
            Regex::new(r"(?i)DOB\s*[:\-|]\s*([0-9]{1,2}[/\-.][0-9]{1,2}[/\-.][0-9]{4})").unwrap(),
            1,
        ),
        (
            DobRule::DateOfBirth,
            Regex::new(
                r"(?i)Date\s+of\s+Birth\s*[:\-|]\s*([0-9]{1,2}[/\-.][0-9]{1,2}[/\-.][0-9]{4})",
            )
            .unwrap(),
            1,
        ),
        (
            DobRule::DottedDob,
            Regex::new(
                r"(?i)D\.?\s*O\.?\s*B\.?\s*[:\-|]\s*([0-9]{1,2}[/\-.][0-9]{1,2}[/\-.][0-9]{4})",
            )
            .unwrap(),
            1,
        ),
    ]
});

/// A DOB found in page text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DobMatch {
    /// Rule that matched.
    pub rule: DobRule,
    /// Captured date with `-` and `.` separators replaced by `/`.
    pub date: String,
    /// Full matched substring, label included.
    pub raw_match: String,
    /// Up to [`CONTEXT_WINDOW`] characters either side of the match, trimmed.
    pub text_context: String,
    /// Byte range of `raw_match` within the searched text.
    pub span: Range<usize>,
}

/// Concatenate fragment text with single spaces, in extractor order.
pub fn join_fragments(fragments: &[TextFragment]) -> String {
    fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Find the DOB in `text` using the highest-priority rule that matches.
pub fn find_dob(text: &str) -> Option<DobMatch> {
    DOB_PATTERNS.iter().find_map(|(rule, pattern, group)| {
        let caps = pattern.captures(text)?;
        let whole = caps.get(0)?;
        let date = caps.get(*group)?.as_str().replace(['-', '.'], "/");

        Some(DobMatch {
            rule: *rule,
            date,
            raw_match: whole.as_str().to_string(),
            text_context: context_around(text, whole.range()).to_string(),
            span: whole.range(),
        })
    })
}

/// Slice of `text` spanning `span` plus up to [`CONTEXT_WINDOW`] characters on
/// each side, clipped to the text and trimmed.
fn context_around(text: &str, span: Range<usize>) -> &str {
    let start = text[..span.start]
        .char_indices()
        .rev()
        .nth(CONTEXT_WINDOW - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let end = text[span.end..]
        .char_indices()
        .nth(CONTEXT_WINDOW)
        .map(|(i, _)| span.end + i)
        .unwrap_or(text.len());

    text[start..end].trim()
}
