//! Quick-tag vocabulary embedded in remnant comments.
//!
//! Matching is a case-sensitive substring test. That is only sound because
//! the vocabulary is tiny and every tag starts with `#`; a larger or free-form
//! vocabulary would need word-boundary matching.

use smallvec::SmallVec;

use crate::constants::DEFAULT_TAGS;

/// Inline capacity for the tags found in a single comment.
pub type TagHits = SmallVec<[usize; 4]>;

/// Ordered, closed set of tag strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagVocabulary {
    tags: Vec<String>,
}

impl TagVocabulary {
    #[must_use]
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Vocabulary indices of every tag occurring in `comment`, each at most once.
    #[must_use]
    pub fn hits(&self, comment: &str) -> TagHits {
        self.tags
            .iter()
            .enumerate()
            .filter(|(_, tag)| comment.contains(tag.as_str()))
            .map(|(index, _)| index)
            .collect()
    }
}

impl Default for TagVocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_TAGS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_vocabulary_has_six_tags() {
        let vocab = TagVocabulary::default();
        assert_eq!(vocab.len(), 6);
        assert!(vocab.contains("#ミリ残し"));
        assert!(!vocab.contains("ミリ残し"));
    }

    #[test]
    fn one_comment_can_hit_several_tags() {
        let vocab = TagVocabulary::default();
        let hits = vocab.hits("#ワンパンミス からの #狩り漏れ");
        assert_eq!(hits.as_slice(), &[0, 2]);
    }

    #[test]
    fn repeated_tag_counts_once() {
        let vocab = TagVocabulary::default();
        assert_eq!(vocab.hits("#あきらめた #あきらめた").as_slice(), &[5]);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let vocab = TagVocabulary::new(["#Miss"]);
        assert!(vocab.hits("#miss").is_empty());
        assert_eq!(vocab.hits("late #Miss!").as_slice(), &[0]);
    }
}
