//! Maps a matched date back to on-page coordinates.
//!
//! Fragment boundaries rarely line up with the full date, so any fragment
//! carrying a DOB label is accepted as a crop anchor too. On documents with
//! several DOB labels (a guardian's, say) this can point at the wrong one.

use std::sync::LazyLock;

use regex::Regex;

use super::{Rect, TextFragment};

static DOB_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)DOB").unwrap());

/// Box of the first fragment containing `date` or a DOB label.
pub fn locate_evidence(date: &str, fragments: &[TextFragment]) -> Option<Rect> {
    fragments
        .iter()
        .find(|f| f.text.contains(date) || DOB_LABEL.is_match(&f.text))
        .map(TextFragment::rect)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(text: &str, x: f64) -> TextFragment {
        TextFragment {
            text: text.to_string(),
            x,
            y: 100.0,
            width: 30.0,
            height: 12.0,
        }
    }

    #[test]
    fn test_finds_date_fragment() {
        let frags = vec![frag("Born", 0.0), frag("1/2/2015", 40.0)];
        let rect = locate_evidence("1/2/2015", &frags).unwrap();
        assert_eq!(rect.x, 40.0);
    }

    #[test]
    fn test_falls_back_to_label() {
        let frags = vec![frag("Name", 0.0), frag("dob", 50.0), frag("1/2", 80.0)];
        let rect = locate_evidence("1/2/2015", &frags).unwrap();
        assert_eq!(rect.x, 50.0);
    }

    #[test]
    fn test_first_candidate_wins() {
        // Guardian label precedes the patient's date.
        let frags = vec![frag("Guardian DOB", 0.0), frag("1/2/2015", 90.0)];
        let rect = locate_evidence("1/2/2015", &frags).unwrap();
        assert_eq!(rect.x, 0.0);
    }

    #[test]
    fn test_none_when_nothing_matches() {
        let frags = vec![frag("Invoice", 0.0)];
        assert!(locate_evidence("1/2/2015", &frags).is_none());
        assert!(locate_evidence("1/2/2015", &[]).is_none());
    }
}
