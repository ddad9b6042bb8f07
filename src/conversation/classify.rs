//! Location-relevance classification of chat messages

use crate::persona::LOCATION_KEYWORDS;
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

static LOCATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives: Vec<String> = LOCATION_KEYWORDS.iter().map(|k| regex::escape(k)).collect();
    RegexBuilder::new(&alternatives.join("|"))
        .case_insensitive(true)
        .build()
        .expect("keyword pattern is valid")
});

/// Whether a message should be grounded on the caller's live position.
///
/// Plain substring match, so "somewhere" counts as mentioning "where".
pub fn is_location_relevant(text: &str) -> bool {
    LOCATION_PATTERN.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_questions() {
        assert!(is_location_relevant("Where are you located?"));
        assert!(is_location_relevant("Is there a cafe NEAR your office"));
        assert!(is_location_relevant("what's your address"));
        assert!(is_location_relevant("Best agencies in KAMPALA?"));
        assert!(is_location_relevant("help me find a printer"));
    }

    #[test]
    fn test_other_questions() {
        assert!(!is_location_relevant("Do you build mobile apps?"));
        assert!(!is_location_relevant("How much is a logo?"));
        assert!(!is_location_relevant(""));
    }

    #[test]
    fn test_substring_semantics() {
        assert!(is_location_relevant("Take me somewhere nice"));
        assert!(is_location_relevant("Relocation services?"));
    }
}
