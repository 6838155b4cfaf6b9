use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

/// Reads `null` as the type's default. Pair with `#[serde(default)]` so an
/// absent field reads the same way.
pub fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A news article as seen by the analyzers. Identity is the URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub url: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bias_analysis: Option<BiasAnalysis>,
}

impl Article {
    /// Builds an article, falling back to the URL host when no source name is known.
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        source: Option<String>,
    ) -> Self {
        let url = url.into();
        let source = source
            .filter(|s| !s.trim().is_empty())
            .or_else(|| host_name(&url))
            .unwrap_or_else(|| "unknown".to_string());
        Self {
            url,
            title: title.into(),
            content: content.into(),
            source,
            published_at: None,
            bias_analysis: None,
        }
    }

    pub fn with_bias(mut self, analysis: BiasAnalysis) -> Self {
        self.bias_analysis = Some(analysis);
        self
    }

    pub fn bias_direction(&self) -> Option<BiasDirection> {
        self.bias_analysis.as_ref().map(|b| b.bias_direction)
    }

    pub fn bias_score(&self) -> f64 {
        self.bias_analysis.as_ref().map(|b| b.bias_score).unwrap_or(0.0)
    }
}

/// Host name of a URL as written, `www.` included.
pub fn host_name(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
}

/// Raw output of the page scraper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub url: String,
    pub title: String,
    pub text: String,
}

impl From<ScrapedPage> for Article {
    fn from(page: ScrapedPage) -> Self {
        Article::new(page.url, page.title, page.text, None)
    }
}

/// A search hit returned by a news search adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedArticle {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BiasDirection {
    Neutral,
    LeftLeaning,
    RightLeaning,
    Sensationalist,
}

impl BiasDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            BiasDirection::Neutral => "neutral",
            BiasDirection::LeftLeaning => "left-leaning",
            BiasDirection::RightLeaning => "right-leaning",
            BiasDirection::Sensationalist => "sensationalist",
        }
    }
}

impl fmt::Display for BiasDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceCredibility {
    High,
    Medium,
    Low,
    #[serde(other)]
    Unknown,
}

impl Default for SourceCredibility {
    fn default() -> Self {
        Self::Medium
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisMethod {
    AiPowered,
    KeywordBased,
    Fallback,
}

impl AnalysisMethod {
    pub fn is_ai(&self) -> bool {
        matches!(self, AnalysisMethod::AiPowered)
    }
}

impl fmt::Display for AnalysisMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AnalysisMethod::AiPowered => "ai-powered",
            AnalysisMethod::KeywordBased => "keyword-based",
            AnalysisMethod::Fallback => "fallback",
        })
    }
}

/// Lexicon matches per category, in lexicon order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordIndicators {
    pub left_leaning: Vec<String>,
    pub right_leaning: Vec<String>,
    pub emotional: Vec<String>,
}

impl KeywordIndicators {
    pub fn all(&self) -> Vec<String> {
        self.left_leaning
            .iter()
            .chain(&self.right_leaning)
            .chain(&self.emotional)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FramingTechnique {
    #[serde(rename = "type", default, deserialize_with = "nullable")]
    pub kind: String,
    #[serde(default, deserialize_with = "nullable")]
    pub example: String,
    #[serde(default, deserialize_with = "nullable")]
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiasAnalysis {
    pub bias_score: f64,
    pub bias_direction: BiasDirection,
    pub loaded_words: Vec<String>,
    pub framing_techniques: Vec<FramingTechnique>,
    pub source_credibility: SourceCredibility,
    pub credibility_factors: Vec<String>,
    pub overall_assessment: String,
    pub recommendations: Vec<String>,
    pub method: AnalysisMethod,
    pub keyword_indicators: KeywordIndicators,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeDifference {
    #[serde(default, deserialize_with = "nullable")]
    pub aspect: String,
    #[serde(default, deserialize_with = "nullable")]
    pub source_views: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueAngle {
    #[serde(default, deserialize_with = "nullable")]
    pub source: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub angle: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub example: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub unique_keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingInformation {
    #[serde(default, deserialize_with = "nullable")]
    pub info: String,
    #[serde(default, deserialize_with = "nullable")]
    pub present_in: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub absent_from: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrustRanking {
    #[serde(default, deserialize_with = "nullable")]
    pub source: String,
    #[serde(default, deserialize_with = "nullable")]
    pub score: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub name: String,
    pub url: String,
    pub bias_score: f64,
}

impl From<&Article> for SourceRef {
    fn from(article: &Article) -> Self {
        Self {
            name: article.source.clone(),
            url: article.url.clone(),
            bias_score: article.bias_score(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeComparison {
    pub common_points: Vec<String>,
    pub differences: Vec<NarrativeDifference>,
    pub unique_angles: Vec<UniqueAngle>,
    pub missing_information: Vec<MissingInformation>,
    pub narrative_consistency: f64,
    pub overall_summary: String,
    pub trustworthiness_ranking: Vec<TrustRanking>,
    pub method: AnalysisMethod,
    pub source_count: usize,
    pub sources: Vec<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisputedPoint {
    pub claim: String,
    pub supporting: Vec<String>,
    pub opposing: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifiedDetails {
    #[serde(default, deserialize_with = "nullable")]
    pub who: String,
    #[serde(default, deserialize_with = "nullable")]
    pub what: String,
    #[serde(default, deserialize_with = "nullable")]
    pub when: String,
    #[serde(rename = "where", default, deserialize_with = "nullable")]
    pub location: String,
    #[serde(default, deserialize_with = "nullable")]
    pub why: String,
    #[serde(default, deserialize_with = "nullable")]
    pub how: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeutralSummary {
    pub summary: String,
    pub consensus_facts: Vec<String>,
    pub disputed_points: Vec<DisputedPoint>,
    pub verified_details: VerifiedDetails,
    pub missing_info: Vec<String>,
    pub confidence: f64,
    pub recommended_action: String,
    pub word_count: usize,
    pub generated_at: DateTime<Utc>,
    pub method: AnalysisMethod,
    pub sources_used: usize,
}

/// A cached value with the time it was written and the fingerprint it was keyed by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub url: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub bias_score: f64,
    pub sources: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub auto_detect: bool,
    pub show_bias_score: bool,
    pub min_sources: usize,
    pub preferred_sources: Vec<String>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            auto_detect: true,
            show_bias_score: true,
            min_sources: 3,
            preferred_sources: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Idle,
    Analyzing,
    Complete,
    Error,
}

/// Progress of the most recent pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisState {
    pub status: AnalysisStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Box<AnalysisResult>>,
}

impl AnalysisState {
    pub fn idle() -> Self {
        Self {
            status: AnalysisStatus::Idle,
            url: None,
            timestamp: Utc::now(),
            error: None,
            result: None,
        }
    }

    pub fn analyzing(url: impl Into<String>) -> Self {
        Self {
            status: AnalysisStatus::Analyzing,
            url: Some(url.into()),
            ..Self::idle()
        }
    }

    pub fn complete(result: AnalysisResult) -> Self {
        Self {
            status: AnalysisStatus::Complete,
            url: Some(result.article.url.clone()),
            result: Some(Box::new(result)),
            ..Self::idle()
        }
    }

    pub fn failed(url: Option<String>, error: impl Into<String>) -> Self {
        Self {
            status: AnalysisStatus::Error,
            url,
            error: Some(error.into()),
            ..Self::idle()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDetection {
    pub is_news: bool,
    pub main_topic: String,
    pub keywords: Vec<String>,
}

/// Everything one pipeline run produced for the reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub article: Article,
    pub related_articles: Vec<Article>,
    pub detection: ContentDetection,
    pub narrative: Option<NarrativeComparison>,
    pub summary: NeutralSummary,
    pub bias_label: String,
    pub completed_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn source_count(&self) -> usize {
        1 + self.related_articles.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub bytes_used: usize,
    pub megabytes_used: String,
    pub quota_mb: usize,
}
