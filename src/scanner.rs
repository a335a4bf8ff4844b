//! Content scanner: multi-category substring counting.
//!
//! The scanner is a pure function over decoded text and the process-wide
//! [`Lexicon`]. It never fails; garbage or empty input yields an all-zero
//! vector.

use crate::models::Lexicon;

/// Scores `text` against every category of `lexicon`.
///
/// Returns one count per category, in lexicon order. The text is lowercased
/// once; each category's count is the sum over its keywords of the number
/// of non-overlapping occurrences of that keyword anywhere in the lowered
/// text. Matching is raw substring search, not tokenized word match, so a
/// keyword may match inside a larger word.
#[must_use]
pub fn score(text: &str, lexicon: &Lexicon) -> Vec<u64> {
    let lowered = text.to_lowercase();
    lexicon
        .iter()
        .map(|category| {
            category
                .keywords()
                .iter()
                .map(|keyword| {
                    u64::try_from(lowered.matches(keyword.as_str()).count()).unwrap_or(u64::MAX)
                })
                .sum()
        })
        .collect()
}
