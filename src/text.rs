//! Hypothesis Normalization
//!
//! Canonical form used for display, dedup and delivery of recognized text.

/// Case-insensitive canonical form of a hypothesis
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
}

/// Suppresses repeated display of the same hypothesis within a segment.
#[derive(Debug, Default)]
pub struct HypothesisFilter {
    last_emitted: String,
}

impl HypothesisFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize `raw` and return it if it should be shown.
    ///
    /// Comparison and storage both use the normalized form, so case-only
    /// changes never re-emit.
    pub fn accept(&mut self, raw: &str) -> Option<&str> {
        let text = normalize(raw);
        if text.is_empty() || text == self.last_emitted {
            return None;
        }
        self.last_emitted = text;
        Some(&self.last_emitted)
    }

    pub fn last_emitted(&self) -> &str {
        &self.last_emitted
    }

    /// Forget the previous segment's text
    pub fn clear(&mut self) {
        self.last_emitted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_only() {
        assert_eq!(normalize("Hello World"), "hello world");
        assert_eq!(normalize("  MIXED  "), "  mixed  ");
        assert_eq!(normalize("ÉCOLE"), "école");
    }

    #[test]
    fn test_filter_emits_growing_hypotheses_once() {
        let mut filter = HypothesisFilter::new();
        let shown: Vec<String> = ["he", "hello", "hello"]
            .iter()
            .filter_map(|h| filter.accept(h).map(str::to_string))
            .collect();
        assert_eq!(shown, vec!["he", "hello"]);
    }

    #[test]
    fn test_case_only_change_is_suppressed() {
        let mut filter = HypothesisFilter::new();
        assert_eq!(filter.accept("HELLO"), Some("hello"));
        assert_eq!(filter.accept("Hello"), None);
        assert_eq!(filter.last_emitted(), "hello");
    }

    #[test]
    fn test_empty_is_never_emitted() {
        let mut filter = HypothesisFilter::new();
        assert_eq!(filter.accept(""), None);
        assert_eq!(filter.last_emitted(), "");
    }

    #[test]
    fn test_clear_allows_repeat_in_next_segment() {
        let mut filter = HypothesisFilter::new();
        assert!(filter.accept("stop").is_some());
        filter.clear();
        assert!(filter.accept("stop").is_some());
    }
}
