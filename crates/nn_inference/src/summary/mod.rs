use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use nn_core::{
    nullable, AnalysisMethod, Article, Error, LanguageModel, NarrativeComparison, NeutralSummary, Result,
    VerifiedDetails,
};
use nn_storage::{CacheKind, StorageManager};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::decode::{clamp_score, decode, SummaryResponse};
use crate::keywords::{count_words, extract_sentences, truncate_chars};
use crate::prompts::{focused_summary_prompt, quotes_prompt, summary_prompt, timeline_prompt};

const MAX_TOKENS: u32 = 3000;
const FALLBACK_SENTENCES: usize = 5;
const FALLBACK_CHARS: usize = 500;
const FALLBACK_CONFIDENCE: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusedSummary {
    pub summary: String,
    pub facts: Vec<String>,
    pub attribution: BTreeMap<String, Vec<String>>,
    pub focus: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FocusedResponse {
    focused_summary: String,
    #[serde(default, deserialize_with = "nullable")]
    relevant_facts: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    source_attribution: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    #[serde(default, deserialize_with = "nullable")]
    pub date: String,
    #[serde(default, deserialize_with = "nullable")]
    pub event: String,
    #[serde(default, deserialize_with = "nullable")]
    pub sources: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default, deserialize_with = "nullable")]
    timeline: Vec<TimelineEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyQuote {
    #[serde(default, deserialize_with = "nullable")]
    pub text: String,
    #[serde(default, deserialize_with = "nullable")]
    pub speaker: String,
    #[serde(default, deserialize_with = "nullable")]
    pub source: String,
    #[serde(default, deserialize_with = "nullable")]
    pub context: String,
}

#[derive(Debug, Deserialize)]
struct QuotesResponse {
    #[serde(default, deserialize_with = "nullable")]
    quotes: Vec<KeyQuote>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuality {
    pub length: bool,
    pub has_consensus: bool,
    pub has_multiple_sources: bool,
    pub high_confidence: bool,
    pub method: AnalysisMethod,
    pub overall: f64,
    pub recommendation: String,
}

/// Writes one neutral account of a story from several sources.
#[derive(Clone)]
pub struct CrossSummaryGenerator {
    model: Arc<dyn LanguageModel>,
    storage: StorageManager,
}

impl fmt::Debug for CrossSummaryGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrossSummaryGenerator")
            .field("model", &self.model.name())
            .finish()
    }
}

impl CrossSummaryGenerator {
    pub fn new(model: Arc<dyn LanguageModel>, storage: StorageManager) -> Self {
        Self { model, storage }
    }

    pub async fn generate_neutral_summary(
        &self,
        articles: &[Article],
        narrative: Option<&NarrativeComparison>,
    ) -> Result<NeutralSummary> {
        info!("✍️ Generating neutral summary from {} sources", articles.len());

        if articles.is_empty() {
            return Err(Error::NoArticles);
        }

        let key = articles
            .iter()
            .map(|a| a.url.as_str())
            .collect::<Vec<_>>()
            .join("|");

        match self
            .storage
            .get_cached_analysis::<NeutralSummary>(CacheKind::Summary, &key)
            .await
        {
            Ok(Some(cached)) => {
                debug!("📦 Using cached summary");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to read summary cache: {}", e),
        }

        match self.generate_with_ai(articles, narrative).await {
            Ok(summary) => {
                if let Err(e) = self
                    .storage
                    .cache_analysis(CacheKind::Summary, &key, &summary)
                    .await
                {
                    warn!("Failed to cache summary: {}", e);
                }
                Ok(summary)
            }
            Err(e) => {
                warn!("Summary generation failed, using sentence overlap: {}", e);
                Ok(get_fallback_summary(articles))
            }
        }
    }

    async fn generate_with_ai(
        &self,
        articles: &[Article],
        narrative: Option<&NarrativeComparison>,
    ) -> Result<NeutralSummary> {
        let value = self
            .model
            .send_prompt_json(&summary_prompt(articles, narrative), MAX_TOKENS)
            .await?;
        let response: SummaryResponse = decode(value)?;

        Ok(NeutralSummary {
            word_count: count_words(&response.neutral_summary),
            summary: response.neutral_summary,
            consensus_facts: response.consensus_facts,
            disputed_points: response.disputed_points.into_iter().map(Into::into).collect(),
            verified_details: response.verified_details,
            missing_info: response.missing_info,
            confidence: clamp_score(&response.confidence),
            recommended_action: response.recommended_action,
            generated_at: Utc::now(),
            method: AnalysisMethod::AiPowered,
            sources_used: articles.len(),
        })
    }

    async fn ask<T: DeserializeOwned>(&self, prompt: &str, max_tokens: u32) -> Result<T> {
        let value = self.model.send_prompt_json(prompt, max_tokens).await?;
        decode(value)
    }

    /// A short summary about one aspect of the story, or `None` without a model.
    pub async fn generate_focused_summary(
        &self,
        articles: &[Article],
        focus: &str,
    ) -> Option<FocusedSummary> {
        match self
            .ask::<FocusedResponse>(&focused_summary_prompt(articles, focus), 1500)
            .await
        {
            Ok(r) => Some(FocusedSummary {
                summary: r.focused_summary,
                facts: r.relevant_facts,
                attribution: r.source_attribution,
                focus: focus.to_string(),
            }),
            Err(e) => {
                warn!("Focused summary generation failed: {}", e);
                None
            }
        }
    }

    pub async fn generate_timeline_summary(&self, articles: &[Article]) -> Vec<TimelineEvent> {
        match self.ask::<TimelineResponse>(&timeline_prompt(articles), 2000).await {
            Ok(r) => r.timeline,
            Err(e) => {
                warn!("Timeline generation failed: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn extract_key_quotes(&self, articles: &[Article]) -> Vec<KeyQuote> {
        match self.ask::<QuotesResponse>(&quotes_prompt(articles), 1500).await {
            Ok(r) => r.quotes,
            Err(e) => {
                warn!("Quote extraction failed: {}", e);
                Vec::new()
            }
        }
    }
}

/// Summary built from sentences that appear in more than one article.
pub fn get_fallback_summary(articles: &[Article]) -> NeutralSummary {
    let mut order: Vec<String> = Vec::new();
    let mut seen_in: HashMap<String, usize> = HashMap::new();
    for article in articles {
        let mut in_article = HashSet::new();
        for sentence in extract_sentences(&article.content) {
            let normalized = sentence.to_lowercase();
            if !in_article.insert(normalized.clone()) {
                continue;
            }
            let count = seen_in.entry(normalized.clone()).or_insert_with(|| {
                order.push(normalized);
                0
            });
            *count += 1;
        }
    }

    let mut common: Vec<(String, usize)> = order
        .into_iter()
        .filter_map(|s| {
            let count = seen_in.get(&s).copied().unwrap_or(0);
            (count > 1).then_some((s, count))
        })
        .collect();
    common.sort_by(|a, b| b.1.cmp(&a.1));
    let common: Vec<String> = common
        .into_iter()
        .take(FALLBACK_SENTENCES)
        .map(|(s, _)| s)
        .collect();

    let summary = if common.is_empty() {
        articles
            .first()
            .map(|a| truncate_chars(&a.content, FALLBACK_CHARS).to_string())
            .unwrap_or_default()
    } else {
        common.join(" ")
    };

    NeutralSummary {
        word_count: count_words(&summary),
        summary,
        consensus_facts: common,
        disputed_points: Vec::new(),
        verified_details: VerifiedDetails::default(),
        missing_info: vec!["Detailed analysis unavailable - AI service required".to_string()],
        confidence: FALLBACK_CONFIDENCE,
        recommended_action: "Read multiple sources independently".to_string(),
        generated_at: Utc::now(),
        method: AnalysisMethod::Fallback,
        sources_used: articles.len(),
    }
}

pub fn assess_summary_quality(summary: &NeutralSummary) -> SummaryQuality {
    let length = summary.word_count > 50 && summary.word_count < 600;
    let has_consensus = !summary.consensus_facts.is_empty();
    let has_multiple_sources = summary.sources_used >= 2;
    let high_confidence = summary.confidence > 0.6;

    let passed = [length, has_consensus, has_multiple_sources, high_confidence]
        .iter()
        .filter(|v| **v)
        .count();
    let overall = passed as f64 / 4.0;

    SummaryQuality {
        length,
        has_consensus,
        has_multiple_sources,
        high_confidence,
        method: summary.method,
        overall,
        recommendation: if overall > 0.7 {
            "Summary is reliable".to_string()
        } else {
            "Read original sources for better understanding".to_string()
        },
    }
}

pub fn confidence_label(confidence: f64) -> &'static str {
    if confidence > 0.8 {
        "Very High"
    } else if confidence > 0.6 {
        "High"
    } else if confidence > 0.4 {
        "Moderate"
    } else if confidence > 0.2 {
        "Low"
    } else {
        "Very Low"
    }
}
