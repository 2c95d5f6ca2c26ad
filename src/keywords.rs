//! Watch-list keyword matching.

use unicode_normalization::UnicodeNormalization;

/// Lowercase then NFKD-decompose, so `ＴＭＧ`, `Tmg` and `tmg` compare equal.
pub fn normalize(text: &str) -> String {
    text.to_lowercase().nfkd().collect()
}

/// Case-insensitive, Unicode-normalized substring matcher over a fixed list.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    /// (original keyword, normalized form), in configuration order
    keywords: Vec<(String, String)>,
}

impl KeywordMatcher {
    /// Build a matcher. Blank keywords are dropped: they would match everything.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .map(|k| {
                let normalized = normalize(&k);
                (k, normalized)
            })
            .collect();
        Self { keywords }
    }

    /// First configured keyword contained in `text`.
    pub fn find(&self, text: &str) -> Option<&str> {
        let haystack = normalize(text);
        self.keywords
            .iter()
            .find(|(_, needle)| haystack.contains(needle.as_str()))
            .map(|(original, _)| original.as_str())
    }

    /// Keywords as configured, for building per-keyword queries.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(|(original, _)| original.as_str())
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}
