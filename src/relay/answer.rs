//! Post-processing of raw model output.

use std::sync::LazyLock;

use regex::Regex;

/// Matches a complete `<think>...</think>` span, lazily and across newlines.
static THINK_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid think regex"));

/// Remove every reasoning segment and trim the remainder.
///
/// An opening `<think>` without a matching close is left in place along with
/// everything after it.
pub fn strip_think(raw: &str) -> String {
    THINK_SEGMENT.replace_all(raw, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_segment() {
        assert_eq!(strip_think("<think>reasoning</think>42"), "42");
    }

    #[test]
    fn test_multiline_and_multiple_segments() {
        let raw = "<think>\nstep 1\nstep 2\n</think>\nHello <think>again\n</think> world\n";
        assert_eq!(strip_think(raw), "Hello  world");
    }

    #[test]
    fn test_no_markers_only_trimmed() {
        assert_eq!(strip_think("  plain answer\n"), "plain answer");
    }

    #[test]
    fn test_unterminated_marker_left_intact() {
        assert_eq!(
            strip_think("answer <think>never closed"),
            "answer <think>never closed"
        );
    }

    #[test]
    fn test_closed_then_unterminated() {
        assert_eq!(
            strip_think("<think>a</think>ok <think>dangling"),
            "ok <think>dangling"
        );
    }

    #[test]
    fn test_only_think() {
        assert_eq!(strip_think("<think>all reasoning</think>"), "");
    }
}
