//! Character-budget truncation shared by the summarizer and prompt builders.

/// Truncate `s` to at most `max` characters, marking the cut with an ellipsis.
///
/// Operates on characters, not bytes, so multi-byte text is never split
/// mid-codepoint. Truncation is a hard token-budget safeguard applied before
/// every generation call.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_string_untouched() {
        assert_eq!(truncate("Hanoi", 10), "Hanoi");
        assert_eq!(truncate("Hanoi", 5), "Hanoi");
    }

    #[test]
    fn test_long_string_gets_ellipsis() {
        let out = truncate("Hoan Kiem Lake", 8);
        assert_eq!(out, "Hoan Ki…");
        assert_eq!(out.chars().count(), 8);
    }

    #[test]
    fn test_multibyte_safe() {
        // Vietnamese place names carry combining diacritics
        let out = truncate("Hồ Hoàn Kiếm, Hà Nội", 10);
        assert_eq!(out.chars().count(), 10);
        assert!(out.ends_with('…'));
    }
}
