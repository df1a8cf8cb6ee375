//! External tool discovery.

use std::path::Path;

/// Check if a binary is available, either as a path or in PATH.
pub fn check_binary(name: impl AsRef<Path>) -> bool {
    let name = name.as_ref();
    if name.components().count() > 1 {
        return name.is_file();
    }
    which::which(name).is_ok()
}

/// Availability of each external tool, in display order.
pub fn check_tools<'a>(tools: &[(&'a str, &'a Path)]) -> Vec<(&'a str, bool)> {
    tools
        .iter()
        .map(|(label, path)| (*label, check_binary(path)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary() {
        assert!(!check_binary("doblock-definitely-not-a-real-tool"));
        assert!(!check_binary("/nonexistent/dir/pdftotext"));
    }

    #[test]
    fn test_check_tools_keeps_order() {
        let a = Path::new("doblock-missing-a");
        let b = Path::new("doblock-missing-b");
        let status = check_tools(&[("a", a), ("b", b)]);
        assert_eq!(status, vec![("a", false), ("b", false)]);
    }
}
