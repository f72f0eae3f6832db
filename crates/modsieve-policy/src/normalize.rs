//! Content normalization applied before rule matching
//!
//! Strips the characters people use to sneak tokens past filters (zalgo
//! combining marks, invisible formatting characters) and expands spoiler
//! markup so every plain-text interpretation of the message is searched.

use regex::Regex;

use modsieve_core::{Error, Result};

const VARIATION_SELECTORS: &str = r"\u{FE00}-\u{FE0F}\u{E0100}-\u{E01EF}";

/// Precompiled normalization patterns; build once, reuse per event
#[derive(Debug)]
pub struct ContentNormalizer {
    invisible: Regex,
    zalgo: Regex,
    spoiler: Regex,
}

impl ContentNormalizer {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::config(format!("bad normalizer pattern: {e}")))
        };

        Ok(Self {
            invisible: compile(&format!(
                r"[[{VARIATION_SELECTORS}\p{{Unassigned}}\p{{Format}}\p{{Control}}]--[\s]]"
            ))?,
            zalgo: compile(&format!(
                r"[[\p{{Nonspacing_Mark}}\p{{Enclosing_Mark}}]--[{VARIATION_SELECTORS}]]"
            ))?,
            spoiler: compile(r"(?s)\|\|.+?\|\|")?,
        })
    }

    /// Produce the normalized form of `text`: spoilers expanded, then zalgo
    /// and invisible characters removed.
    pub fn normalize(&self, text: &str) -> String {
        let text = self.expand_spoilers(text);
        self.clean_input(&text)
    }

    /// Remove zalgo and invisible characters from `text`.
    // For future consideration: remove characters in the Mc, Sk, and Lm
    // categories too. Normalising with form C first would avoid stripping
    // legit diacritics, but would open a bypass route.
    pub fn clean_input(&self, text: &str) -> String {
        let no_zalgo = self.zalgo.replace_all(text, "");
        self.invisible.replace_all(&no_zalgo, "").into_owned()
    }

    /// Return a string containing all interpretations of a spoilered message:
    /// the segments outside spoilers, then the spoilered segments, then the
    /// full original text.
    pub fn expand_spoilers(&self, text: &str) -> String {
        let mut outside: Vec<&str> = Vec::new();
        let mut spoilers: Vec<&str> = Vec::new();
        let mut last = 0;
        for found in self.spoiler.find_iter(text) {
            outside.push(&text[last..found.start()]);
            spoilers.push(found.as_str());
            last = found.end();
        }
        if spoilers.is_empty() {
            return text.to_string();
        }
        outside.push(&text[last..]);

        let mut expanded = String::with_capacity(text.len() * 2);
        for segment in outside.iter().chain(spoilers.iter()) {
            expanded.push_str(segment);
        }
        expanded.push_str(text);
        expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_untouched() {
        let normalizer = ContentNormalizer::new().unwrap();
        assert_eq!(normalizer.normalize("hello world"), "hello world");
    }

    #[test]
    fn zalgo_marks_are_stripped() {
        let normalizer = ContentNormalizer::new().unwrap();
        // "bad" with combining marks layered on.
        let zalgo = "b\u{0336}a\u{0321}d\u{0353}";
        assert_eq!(normalizer.clean_input(zalgo), "bad");
    }

    #[test]
    fn invisible_characters_are_stripped_but_whitespace_kept() {
        let normalizer = ContentNormalizer::new().unwrap();
        let hidden = "ba\u{200B}d wo\u{200D}rd";
        assert_eq!(normalizer.clean_input(hidden), "bad word");
    }

    #[test]
    fn spoilers_expand_to_every_interpretation() {
        let normalizer = ContentNormalizer::new().unwrap();
        let expanded = normalizer.expand_spoilers("a||b||c");
        // Outside segments, spoilered segments, then the original text.
        assert_eq!(expanded, "ac||b||a||b||c");
    }

    #[test]
    fn no_spoilers_means_no_expansion() {
        let normalizer = ContentNormalizer::new().unwrap();
        assert_eq!(normalizer.expand_spoilers("abc"), "abc");
    }
}
