//! HTML escaping utilities.

/// Escape HTML special characters for safe rendering.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Escape `context` and wrap the first occurrence of `needle` in a
/// `<span class="highlight">`.
pub fn highlight_match(context: &str, needle: &str) -> String {
    let escaped = html_escape(context);
    if needle.is_empty() {
        return escaped;
    }
    let needle = html_escape(needle);
    escaped.replacen(
        &needle,
        &format!("<span class=\"highlight\">{}</span>", needle),
        1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape_basic() {
        assert_eq!(html_escape("hello"), "hello");
        assert_eq!(html_escape("<script>"), "&lt;script&gt;");
        assert_eq!(html_escape("a & b"), "a &amp; b");
        assert_eq!(html_escape("\"quoted\""), "&quot;quoted&quot;");
    }

    #[test]
    fn test_highlight_match() {
        assert_eq!(
            highlight_match("Name <x> DOB: 1/2/2015 Age", "DOB: 1/2/2015"),
            "Name &lt;x&gt; <span class=\"highlight\">DOB: 1/2/2015</span> Age"
        );
    }

    #[test]
    fn test_highlight_first_only() {
        assert_eq!(
            highlight_match("DOB DOB", "DOB"),
            "<span class=\"highlight\">DOB</span> DOB"
        );
    }

    #[test]
    fn test_highlight_missing_needle() {
        assert_eq!(highlight_match("a & b", "zzz"), "a &amp; b");
        assert_eq!(highlight_match("a & b", ""), "a &amp; b");
    }
}
