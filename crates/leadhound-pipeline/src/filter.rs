// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whole-word keyword pre-filter.
//!
//! All keywords compile into one case-insensitive alternation. Boundaries
//! are only anchored on sides where the keyword starts or ends with a word
//! character, so `dev` never matches inside `develop` while `c++` still
//! matches `c++ dev`.

use leadhound_core::{LeadhoundError, Message};
use regex::{Regex, RegexBuilder};
use tracing::{info, warn};

pub struct KeywordFilter {
    keywords: Vec<String>,
    pattern: Option<Regex>,
    /// Keyword index behind each capture group, in group order.
    groups: Vec<usize>,
}

impl KeywordFilter {
    /// Compiles the keyword list. Blank entries are ignored; an empty list
    /// admits every message.
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Result<Self, LeadhoundError> {
        let keywords: Vec<String> = keywords
            .iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        if keywords.is_empty() {
            warn!("empty keyword list, every message will be classified");
            return Ok(Self {
                keywords,
                pattern: None,
                groups: Vec::new(),
            });
        }

        // Longest first so overlapping keywords prefer the most specific one.
        let mut groups: Vec<usize> = (0..keywords.len()).collect();
        groups.sort_by_key(|&i| std::cmp::Reverse(keywords[i].len()));
        let alternation = groups
            .iter()
            .map(|&i| format!("({})", anchored(&keywords[i])))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .build()
            .map_err(|e| LeadhoundError::Config(format!("invalid keyword pattern: {e}")))?;

        info!(count = keywords.len(), "keyword filter compiled");
        Ok(Self {
            keywords,
            pattern: Some(pattern),
            groups,
        })
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Returns the configured keyword behind the leftmost whole-word match.
    pub fn find_keyword(&self, text: &str) -> Option<&str> {
        let captures = self.pattern.as_ref()?.captures(text)?;
        let group = (1..captures.len()).find(|&g| captures.get(g).is_some())?;
        let keyword = *self.groups.get(group - 1)?;
        Some(self.keywords[keyword].as_str())
    }

    /// True when the message should be classified. Attaches the matched
    /// keyword to the message.
    pub fn is_relevant(&self, message: &mut Message) -> bool {
        if self.pattern.is_none() {
            return true;
        }
        match self.find_keyword(&message.content) {
            Some(keyword) => {
                message.keyword = Some(keyword.to_string());
                true
            }
            None => false,
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn anchored(keyword: &str) -> String {
    let escaped = regex::escape(keyword);
    let start = if keyword.starts_with(is_word_char) { r"\b" } else { "" };
    let end = if keyword.ends_with(is_word_char) { r"\b" } else { "" };
    format!("{start}{escaped}{end}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadhound_test_utils::fixtures;
    use tracing_test::traced_test;

    fn filter(keywords: &[&str]) -> KeywordFilter {
        KeywordFilter::new(keywords).unwrap()
    }

    #[test]
    fn matches_whole_words() {
        let f = filter(&["hiring"]);
        let mut msg = fixtures::message(1, 1, "We are HIRING now");
        assert!(f.is_relevant(&mut msg));
        assert_eq!(msg.keyword.as_deref(), Some("hiring"));
    }

    #[test]
    fn ignores_substrings_of_longer_words() {
        let f = filter(&["dev"]);
        let mut msg = fixtures::message(1, 1, "we develop features");
        assert!(!f.is_relevant(&mut msg));
        assert_eq!(msg.keyword, None);
    }

    #[test]
    fn multi_word_and_symbol_keywords() {
        let f = filter(&["paid gig", "c++"]);
        assert_eq!(f.find_keyword("any paid gig around?"), Some("paid gig"));
        assert_eq!(f.find_keyword("need a c++ dev"), Some("c++"));
        assert_eq!(f.find_keyword("unpaid gigs only"), None);
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let f = filter(&["node.js"]);
        assert_eq!(f.find_keyword("looking for node.js help"), Some("node.js"));
        assert_eq!(f.find_keyword("looking for nodexjs help"), None);
    }

    #[test]
    fn returns_leftmost_keyword_as_configured() {
        let f = filter(&["Freelance", "hiring"]);
        assert_eq!(f.find_keyword("hiring a FREELANCE dev"), Some("hiring"));
        assert_eq!(f.find_keyword("freelance, hiring"), Some("Freelance"));
    }

    #[test]
    fn case_folded_match_maps_back_to_keyword() {
        // Regex folding treats final and medial sigma alike; lowercasing does not.
        let f = filter(&["ΣΚΟΠΟΣ", "hiring"]);
        assert_eq!(f.find_keyword("ο σκοποσ μας"), Some("ΣΚΟΠΟΣ"));
        assert_eq!(f.find_keyword("ο ΣΚΟΠΟΣ μας"), Some("ΣΚΟΠΟΣ"));
    }

    #[traced_test]
    #[test]
    fn empty_list_admits_everything() {
        let f = filter(&[]);
        let mut msg = fixtures::message(1, 1, "anything at all");
        assert!(f.is_relevant(&mut msg));
        assert_eq!(msg.keyword, None);
        assert!(logs_contain("empty keyword list"));
    }

    #[test]
    fn blank_keywords_are_dropped() {
        let f = filter(&["  ", "rust "]);
        assert_eq!(f.keywords(), ["rust".to_string()]);
    }

    proptest::proptest! {
        #[test]
        fn keyword_glued_to_letters_never_matches(prefix in "[a-z]{1,5}", suffix in "[a-z]{1,5}") {
            let f = filter(&["dev"]);
            let glued = format!("{prefix}dev{suffix}");
            proptest::prop_assert_eq!(f.find_keyword(&glued), None);
        }
    }
}
