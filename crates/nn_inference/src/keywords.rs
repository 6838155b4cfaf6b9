//! Lexicon matching and frequency heuristics used when the model is unavailable.

use std::collections::HashMap;

use nn_core::KeywordIndicators;
use once_cell::sync::Lazy;
use regex::Regex;

pub const LEFT_LEANING: &[&str] = &["progressive", "social justice", "inequality", "corporate greed"];
pub const RIGHT_LEANING: &[&str] = &["traditional values", "law and order", "free market", "patriot"];
pub const EMOTIONAL: &[&str] = &["shocking", "outrageous", "devastating", "alarming", "crisis"];

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "was", "are", "been", "be", "have", "has", "had", "do", "does", "did",
    "will", "would", "should", "could", "may", "might", "must", "can", "this", "that", "these",
    "those",
];

static TIME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\d{4}-\d{2}-\d{2}",
        r"\d{1,2}/\d{1,2}/\d{2,4}",
        r"(?i)(january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{1,2}",
        r"(?i)(yesterday|today|tomorrow|last week|next week)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static SENTENCE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

fn matches_in(lower: &str, lexicon: &[&str]) -> Vec<String> {
    lexicon
        .iter()
        .filter(|term| lower.contains(*term))
        .map(|term| term.to_string())
        .collect()
}

/// Case-insensitive substring match of every lexicon term, in lexicon order.
pub fn analyze_keywords(content: &str) -> KeywordIndicators {
    let lower = content.to_lowercase();
    KeywordIndicators {
        left_leaning: matches_in(&lower, LEFT_LEANING),
        right_leaning: matches_in(&lower, RIGHT_LEANING),
        emotional: matches_in(&lower, EMOTIONAL),
    }
}

/// Lowercases and replaces everything that is not an ASCII word character
/// or whitespace with a space, then splits on whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Sums weights per word and returns the `limit` heaviest. Ties keep the
/// order in which words were first seen.
pub fn rank_by_frequency<I>(weighted: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = (String, usize)>,
{
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for (word, weight) in weighted {
        let count = counts.entry(word.clone()).or_insert_with(|| {
            order.push(word);
            0
        });
        *count += weight;
    }

    let mut ranked: Vec<(String, usize)> = order
        .into_iter()
        .map(|w| {
            let count = counts.get(&w).copied().unwrap_or(0);
            (w, count)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.into_iter().take(limit).map(|(w, _)| w).collect()
}

/// Most frequent words longer than three characters, stop words removed.
pub fn extract_keywords(content: &str, limit: usize) -> Vec<String> {
    let words = tokenize(content)
        .into_iter()
        .filter(|w| w.len() > 3 && !STOP_WORDS.contains(&w.as_str()))
        .map(|w| (w, 1));
    rank_by_frequency(words, limit)
}

/// Sentences between 21 and 199 characters, split on runs of `.`, `!`, `?`.
pub fn extract_sentences(content: &str) -> Vec<String> {
    SENTENCE_BREAK
        .split(content)
        .map(str::trim)
        .filter(|s| {
            let len = s.chars().count();
            len > 20 && len < 200
        })
        .map(str::to_string)
        .collect()
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Dates and relative time words, grouped by pattern.
pub fn extract_time_references(content: &str) -> Vec<String> {
    TIME_PATTERNS
        .iter()
        .flat_map(|re| re.find_iter(content).map(|m| m.as_str().to_string()))
        .collect()
}

/// Cuts `text` to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_keywords_lexicon_order() {
        let found = analyze_keywords(
            "A CRISIS of Inequality: progressive groups decry the shocking free market crisis.",
        );
        assert_eq!(found.left_leaning, vec!["progressive", "inequality"]);
        assert_eq!(found.right_leaning, vec!["free market"]);
        assert_eq!(found.emotional, vec!["shocking", "crisis"]);
        assert_eq!(found.all().len(), 5);
    }

    #[test]
    fn test_analyze_keywords_is_deterministic() {
        let text = "patriot law and order traditional values";
        assert_eq!(analyze_keywords(text), analyze_keywords(text));
        assert_eq!(
            analyze_keywords(text).right_leaning,
            vec!["traditional values", "law and order", "patriot"]
        );
    }

    #[test]
    fn test_extract_keywords_ranks_by_frequency() {
        let text = "Budget talks stall. The budget vote, budget deadline and talks continue; senate waits.";
        let keywords = extract_keywords(text, 3);
        assert_eq!(keywords, vec!["budget", "talks", "stall"]);
    }

    #[test]
    fn test_extract_keywords_drops_short_and_stop_words() {
        let keywords = extract_keywords("the cat sat on those mats with these hats", 10);
        assert_eq!(keywords, vec!["mats", "hats"]);
    }

    #[test]
    fn test_tokenize_replaces_punctuation() {
        assert_eq!(tokenize("Hello, world! It's 2024."), vec!["hello", "world", "it", "s", "2024"]);
    }

    #[test]
    fn test_extract_sentences_length_bounds() {
        let long = "x".repeat(250);
        let text = format!("Short one. This sentence is long enough to keep! {}? Another fine sentence here...", long);
        let sentences = extract_sentences(&text);
        assert_eq!(
            sentences,
            vec!["This sentence is long enough to keep", "Another fine sentence here"]
        );
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words("  one two\tthree\nfour "), 4);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn test_extract_time_references() {
        let refs = extract_time_references(
            "On 2024-01-15 officials met; by 1/16/2024 and March 3 talks resumed. Yesterday they agreed.",
        );
        assert_eq!(refs, vec!["2024-01-15", "1/16/2024", "March 3", "Yesterday"]);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
