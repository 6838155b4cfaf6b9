use nn_core::{Article, ContentDetection};
use nn_inference::keywords::{rank_by_frequency, tokenize, truncate_chars};

pub const MIN_CONTENT_LENGTH: usize = 200;
pub const MIN_TITLE_LENGTH: usize = 10;
const TOPIC_CONTENT_CHARS: usize = 300;
const TOPIC_CHARS: usize = 200;
const SEARCH_TEXT_CHARS: usize = 500;
const SEARCH_KEYWORDS: usize = 5;
const TITLE_WEIGHT: usize = 3;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "was", "are", "been", "be", "have", "has", "had", "do", "does", "did",
    "will", "would", "should", "could", "may", "might", "must", "can", "this", "that", "these",
    "those", "it", "its", "they", "them",
];

/// Wider list used when building search queries from a headline.
const SEARCH_STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "was", "are", "were", "been", "be", "have", "has", "had", "do", "does",
    "did", "will", "would", "could", "should", "may", "might", "must", "can", "this", "that",
    "these", "those", "i", "you", "he", "she", "it", "we", "they", "what", "which", "who",
    "when", "where", "why", "how", "all", "each", "every", "both", "few", "more", "most",
    "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than", "too",
    "very", "s", "t", "just", "don", "now", "says", "said",
];

/// Decides whether a page is worth analyzing and what to search for.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentDetector;

impl ContentDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn is_news_article(&self, article: &Article) -> bool {
        article.content.chars().count() >= MIN_CONTENT_LENGTH
            && article.title.chars().count() >= MIN_TITLE_LENGTH
    }

    /// Title plus the opening of the body, used as the related-article query.
    pub fn extract_main_topic(&self, article: &Article) -> String {
        let opening = truncate_chars(&article.content, TOPIC_CONTENT_CHARS);
        let combined = format!("{} {}", article.title.trim(), opening.trim())
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        truncate_chars(&combined, TOPIC_CHARS).to_string()
    }

    /// Most frequent words of `content`, stop words and short words removed.
    pub fn extract_keywords(&self, content: &str, max: usize) -> Vec<String> {
        let words = tokenize(content)
            .into_iter()
            .filter(|w| w.len() > 2 && !STOP_WORDS.contains(&w.as_str()))
            .map(|w| (w, 1));
        rank_by_frequency(words, max)
    }

    pub fn detect(&self, article: &Article) -> ContentDetection {
        ContentDetection {
            is_news: self.is_news_article(article),
            main_topic: self.extract_main_topic(article),
            keywords: self.extract_keywords(&article.content, 10),
        }
    }

    /// Search terms from a headline and the start of the text; headline
    /// words count three times.
    pub fn extract_search_keywords(&self, title: &str, text: &str) -> Vec<String> {
        let significant =
            |w: &String| w.len() > 2 && !SEARCH_STOP_WORDS.contains(&w.as_str());

        let title_words = tokenize(title)
            .into_iter()
            .filter(significant)
            .map(|w| (w, TITLE_WEIGHT));
        let text_words = tokenize(truncate_chars(text, SEARCH_TEXT_CHARS))
            .into_iter()
            .filter(significant)
            .map(|w| (w, 1));

        rank_by_frequency(title_words.chain(text_words), SEARCH_KEYWORDS)
    }
}
