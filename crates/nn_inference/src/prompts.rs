use nn_core::{Article, NarrativeComparison};
use serde::Serialize;

use crate::keywords::truncate_chars;

pub const BIAS_CONTENT_CHARS: usize = 3000;
pub const NARRATIVE_CONTENT_CHARS: usize = 2000;
pub const SUMMARY_CONTENT_CHARS: usize = 2500;
const EXCERPT_CHARS: usize = 1500;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptSource<'a> {
    id: usize,
    source: &'a str,
    title: &'a str,
    content: &'a str,
    bias_direction: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    bias_score: Option<f64>,
}

fn sources_json(articles: &[Article], content_chars: usize, with_score: bool) -> String {
    let sources: Vec<PromptSource> = articles
        .iter()
        .enumerate()
        .map(|(i, a)| PromptSource {
            id: i + 1,
            source: &a.source,
            title: &a.title,
            content: truncate_chars(&a.content, content_chars),
            bias_direction: a.bias_direction().map(|d| d.as_str()).unwrap_or("unknown"),
            bias_score: with_score.then(|| a.bias_score()),
        })
        .collect();
    serde_json::to_string_pretty(&sources).unwrap_or_else(|_| "[]".to_string())
}

fn excerpts(articles: &[Article], chars: usize) -> String {
    articles
        .iter()
        .map(|a| format!("{}: {}", a.source, truncate_chars(&a.content, chars)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn bias_prompt(article: &Article) -> String {
    let content = truncate_chars(&article.content, BIAS_CONTENT_CHARS);
    let ellipsis = if content.len() < article.content.len() { "..." } else { "" };
    format!(
        r#"You are an expert media bias analyst. Analyze this news article for bias.

ARTICLE DETAILS:
Title: {title}
Source: {source}
Content: {content} {ellipsis}

ANALYSIS REQUIRED:
1. Overall bias score (0.0 = completely neutral, 1.0 = extremely biased)
2. Bias direction (left-leaning, right-leaning, neutral, sensationalist)
3. List of loaded/emotional words used
4. Framing techniques detected (e.g., one-sided quotes, missing context)
5. Source credibility assessment
6. Specific examples of bias in the text

Respond in this EXACT JSON format:
{{
  "biasScore": 0.0-1.0,
  "biasDirection": "neutral|left-leaning|right-leaning|sensationalist",
  "loadedWords": ["word1", "word2"],
  "framingTechniques": [
    {{
      "type": "technique name",
      "example": "specific text from article",
      "explanation": "why this is biased"
    }}
  ],
  "sourceCredibility": "high|medium|low",
  "credibilityFactors": ["factor1", "factor2"],
  "overallAssessment": "brief 2-3 sentence summary",
  "recommendations": ["what's missing", "what to verify"]
}}"#,
        title = article.title,
        source = article.source,
        content = content,
        ellipsis = ellipsis,
    )
}

pub fn narrative_prompt(articles: &[Article]) -> String {
    format!(
        r#"You are an expert media analyst. Compare how these different news sources cover the same story.

SOURCES TO COMPARE:
{sources}

ANALYSIS REQUIRED:
1. What facts do ALL sources agree on? (consensus points)
2. What details vary between sources? (differences)
3. What unique angles does each source emphasize? (unique perspectives)
4. What information is missing from some sources but present in others?
5. Overall narrative consistency score (0.0 = completely different stories, 1.0 = identical coverage)

Respond in this EXACT JSON format:
{{
  "consensusPoints": ["fact that all sources agree on"],
  "differences": [
    {{
      "aspect": "what differs",
      "sourceViews": {{"Source 1": "their perspective", "Source 2": "their perspective"}}
    }}
  ],
  "uniqueAngles": [
    {{"source": "Source Name", "angle": "unique perspective they emphasize", "example": "specific quote or detail"}}
  ],
  "missingInformation": [
    {{"info": "what's missing", "presentIn": ["Source 1"], "absentFrom": ["Source 2"]}}
  ],
  "narrativeConsistency": 0.0-1.0,
  "overallSummary": "2-3 sentence summary of how coverage differs",
  "trustworthinessRanking": [
    {{"source": "Source Name", "score": 0.0-1.0, "reasoning": "why this score"}}
  ]
}}"#,
        sources = sources_json(articles, NARRATIVE_CONTENT_CHARS, false),
    )
}

pub fn missing_context_prompt(articles: &[Article], topic: &str) -> String {
    let sources = articles
        .iter()
        .enumerate()
        .map(|(i, a)| {
            format!(
                "Source {} ({}): {}",
                i + 1,
                a.source,
                truncate_chars(&a.content, EXCERPT_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        r#"These news sources are covering: "{topic}"

{sources}

What important context or background information is missing from one or more sources that readers should know?

Respond with JSON:
{{
  "missingContext": [
    {{"context": "what's missing", "importance": "high|medium|low", "absentFrom": ["Source names"]}}
  ]
}}"#
    )
}

pub fn summary_prompt(articles: &[Article], narrative: Option<&NarrativeComparison>) -> String {
    let context = narrative
        .map(|n| {
            format!(
                "\nNARRATIVE COMPARISON CONTEXT:\n- Consensus points: {}\n- Consistency score: {}\n",
                n.common_points.join(", "),
                n.narrative_consistency
            )
        })
        .unwrap_or_default();

    format!(
        r#"You are a professional neutral journalist. Create an unbiased summary of this story based on multiple sources.

SOURCES:
{sources}
{context}
REQUIREMENTS:
1. Write a neutral, factual summary (200-400 words)
2. Only include facts that appear in multiple sources
3. Clearly separate verified facts from disputed claims
4. DO NOT use loaded language or emotional words
5. Present all perspectives fairly
6. Highlight what sources agree vs disagree on
7. Note any crucial missing information

Respond in this EXACT JSON format:
{{
  "neutralSummary": "Balanced summary paragraph here",
  "consensusFacts": ["Fact confirmed by multiple sources"],
  "disputedPoints": [
    {{"claim": "What's being disputed", "sources": {{"Supporting": ["Source A"], "Opposing": ["Source C"]}}}}
  ],
  "verifiedDetails": {{
    "who": "Key people/entities involved",
    "what": "What happened",
    "when": "Timeline",
    "where": "Location",
    "why": "Stated reasons/motivations",
    "how": "How it unfolded"
  }},
  "missingInfo": ["What information is unclear or absent from all sources"],
  "confidence": 0.0-1.0,
  "recommendedAction": "What readers should verify independently"
}}"#,
        sources = sources_json(articles, SUMMARY_CONTENT_CHARS, true),
        context = context,
    )
}

pub fn focused_summary_prompt(articles: &[Article], focus: &str) -> String {
    format!(
        r#"Based on these articles, provide a focused summary about: "{focus}"

{excerpts}

Create a brief (100-200 words) neutral summary specifically about {focus}.
Only include verified information from the sources.

Respond with JSON:
{{
  "focusedSummary": "summary text",
  "relevantFacts": ["fact 1", "fact 2"],
  "sourceAttribution": {{"Fact": ["Sources that mention it"]}}
}}"#,
        excerpts = excerpts(articles, EXCERPT_CHARS),
    )
}

pub fn timeline_prompt(articles: &[Article]) -> String {
    format!(
        r#"Create a timeline of events based on these articles:

{excerpts}

Extract key events in chronological order. Respond with JSON:
{{
  "timeline": [
    {{"date": "when it happened (or 'unknown')", "event": "what happened", "sources": ["which sources mention it"]}}
  ]
}}"#,
        excerpts = excerpts(articles, NARRATIVE_CONTENT_CHARS),
    )
}

pub fn quotes_prompt(articles: &[Article]) -> String {
    format!(
        r#"Extract the most important direct quotes from these articles:

{excerpts}

Find quotes that:
1. Come from credible sources
2. Add important context
3. Are not inflammatory/biased

Respond with JSON:
{{
  "quotes": [
    {{"text": "the quote", "speaker": "who said it", "source": "which article", "context": "why it matters"}}
  ]
}}"#,
        excerpts = excerpts(articles, NARRATIVE_CONTENT_CHARS),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bias_prompt_truncates_content() {
        let long = Article::new("https://a.com/x", "Title", "é".repeat(3500), Some("A".into()));
        let prompt = bias_prompt(&long);
        assert!(prompt.contains(&format!("{} ...", "é".repeat(3000))));
        assert!(!prompt.contains(&"é".repeat(3001)));

        let short = Article::new("https://a.com/y", "Title", "Short body", Some("A".into()));
        assert!(bias_prompt(&short).contains("Content: Short body \n"));
    }

    #[test]
    fn test_narrative_prompt_lists_sources() {
        let articles = vec![
            Article::new("https://a.com/1", "One", "Body one", Some("A".into())),
            Article::new("https://b.com/2", "Two", "Body two", Some("B".into())),
        ];
        let prompt = narrative_prompt(&articles);
        assert!(prompt.contains("\"id\": 2"));
        assert!(prompt.contains("\"biasDirection\": \"unknown\""));
        assert!(!prompt.contains("biasScore\": 0"));
    }

    #[test]
    fn test_summary_prompt_includes_narrative_context() {
        let articles = vec![Article::new("https://a.com/1", "One", "Body", Some("A".into()))];
        let without = summary_prompt(&articles, None);
        assert!(!without.contains("NARRATIVE COMPARISON CONTEXT"));
        assert!(without.contains("\"biasScore\": 0.0"));
    }
}
