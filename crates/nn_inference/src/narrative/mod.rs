use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use nn_core::{
    nullable, AnalysisMethod, Article, Error, LanguageModel, NarrativeComparison, Result,
    SourceRef, TrustRanking, UniqueAngle,
};
use nn_storage::{CacheKind, StorageManager};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::decode::{clamp_score, decode, NarrativeResponse};
use crate::keywords::{extract_keywords, extract_time_references};
use crate::prompts::{missing_context_prompt, narrative_prompt};

pub const MIN_SOURCES: usize = 2;
const KEYWORDS_PER_SOURCE: usize = 50;
const UNIQUE_KEYWORDS_PER_SOURCE: usize = 10;
const MAX_TOKENS: u32 = 3000;
const CONTEXT_MAX_TOKENS: u32 = 1500;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingContext {
    #[serde(default, deserialize_with = "nullable")]
    pub context: String,
    #[serde(default, deserialize_with = "nullable")]
    pub importance: String,
    #[serde(default, deserialize_with = "nullable")]
    pub absent_from: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MissingContextResponse {
    #[serde(default, deserialize_with = "nullable")]
    missing_context: Vec<MissingContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceTimeline {
    pub source: String,
    pub mentions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineComparison {
    pub timelines: Vec<SourceTimeline>,
    pub chronology_consistent: bool,
}

/// Compares how several outlets cover one story.
#[derive(Clone)]
pub struct NarrativeAnalyzer {
    model: Arc<dyn LanguageModel>,
    storage: StorageManager,
}

impl fmt::Debug for NarrativeAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NarrativeAnalyzer")
            .field("model", &self.model.name())
            .finish()
    }
}

fn fingerprint(articles: &[Article]) -> String {
    articles
        .iter()
        .map(|a| a.url.as_str())
        .collect::<Vec<_>>()
        .join("|")
}

impl NarrativeAnalyzer {
    pub fn new(model: Arc<dyn LanguageModel>, storage: StorageManager) -> Self {
        Self { model, storage }
    }

    /// Fails only when fewer than two articles are given; model trouble
    /// degrades to [`get_basic_comparison`].
    pub async fn compare_narratives(&self, articles: &[Article]) -> Result<NarrativeComparison> {
        info!("📊 Comparing narratives across {} sources", articles.len());

        if articles.len() < MIN_SOURCES {
            return Err(Error::InsufficientSources {
                required: MIN_SOURCES,
                found: articles.len(),
            });
        }

        let key = fingerprint(articles);
        match self
            .storage
            .get_cached_analysis::<NarrativeComparison>(CacheKind::Narrative, &key)
            .await
        {
            Ok(Some(cached)) => {
                debug!("📦 Using cached narrative comparison");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to read narrative cache: {}", e),
        }

        match self.compare_with_ai(articles).await {
            Ok(comparison) => {
                if let Err(e) = self
                    .storage
                    .cache_analysis(CacheKind::Narrative, &key, &comparison)
                    .await
                {
                    warn!("Failed to cache narrative comparison: {}", e);
                }
                Ok(comparison)
            }
            Err(e) => {
                warn!("Narrative comparison failed, using keyword overlap: {}", e);
                Ok(get_basic_comparison(articles))
            }
        }
    }

    async fn compare_with_ai(&self, articles: &[Article]) -> Result<NarrativeComparison> {
        let value = self
            .model
            .send_prompt_json(&narrative_prompt(articles), MAX_TOKENS)
            .await?;
        let response: NarrativeResponse = decode(value)?;

        Ok(NarrativeComparison {
            common_points: response.consensus_points,
            differences: response.differences,
            unique_angles: response.unique_angles,
            missing_information: response.missing_information,
            narrative_consistency: clamp_score(&response.narrative_consistency),
            overall_summary: response.overall_summary,
            trustworthiness_ranking: response
                .trustworthiness_ranking
                .into_iter()
                .map(TrustRanking::from)
                .collect(),
            method: AnalysisMethod::AiPowered,
            source_count: articles.len(),
            sources: articles.iter().map(SourceRef::from).collect(),
            analyzed_at: Some(Utc::now()),
        })
    }

    /// Asks the model what background some sources leave out. Empty when the
    /// model is unavailable.
    pub async fn identify_missing_context(
        &self,
        articles: &[Article],
        topic: &str,
    ) -> Vec<MissingContext> {
        let result = async {
            let value = self
                .model
                .send_prompt_json(&missing_context_prompt(articles, topic), CONTEXT_MAX_TOKENS)
                .await?;
            decode::<MissingContextResponse>(value)
        }
        .await;

        match result {
            Ok(response) => response.missing_context,
            Err(e) => {
                warn!("Failed to identify missing context: {}", e);
                Vec::new()
            }
        }
    }
}

/// Keyword overlap comparison used when the model is unavailable.
pub fn get_basic_comparison(articles: &[Article]) -> NarrativeComparison {
    let keywords: Vec<Vec<String>> = articles
        .iter()
        .map(|a| extract_keywords(&a.content, KEYWORDS_PER_SOURCE))
        .collect();
    let sets: Vec<HashSet<&str>> = keywords
        .iter()
        .map(|words| words.iter().map(String::as_str).collect())
        .collect();

    let mut seen = HashSet::new();
    let common: Vec<String> = keywords
        .iter()
        .flatten()
        .filter(|w| seen.insert(w.as_str()))
        .filter(|w| sets.iter().all(|s| s.contains(w.as_str())))
        .cloned()
        .collect();

    let unique_angles = articles
        .iter()
        .zip(&keywords)
        .map(|(article, words)| UniqueAngle {
            source: article.source.clone(),
            unique_keywords: words
                .iter()
                .filter(|w| sets.iter().filter(|s| s.contains(w.as_str())).count() == 1)
                .take(UNIQUE_KEYWORDS_PER_SOURCE)
                .cloned()
                .collect(),
            ..Default::default()
        })
        .collect();

    NarrativeComparison {
        common_points: if common.is_empty() {
            vec!["Limited overlap detected".to_string()]
        } else {
            common
        },
        differences: Vec::new(),
        unique_angles,
        missing_information: Vec::new(),
        narrative_consistency: keyword_overlap(&sets),
        overall_summary: "Basic keyword analysis (AI analysis unavailable)".to_string(),
        trustworthiness_ranking: Vec::new(),
        method: AnalysisMethod::KeywordBased,
        source_count: articles.len(),
        sources: articles.iter().map(SourceRef::from).collect(),
        analyzed_at: Some(Utc::now()),
    }
}

/// Mean pairwise Jaccard similarity, rounded to two decimals.
fn keyword_overlap(sets: &[HashSet<&str>]) -> f64 {
    if sets.len() < 2 {
        return 0.0;
    }

    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..sets.len() {
        for j in (i + 1)..sets.len() {
            let intersection = sets[i].intersection(&sets[j]).count();
            let union = sets[i].union(&sets[j]).count();
            if union > 0 {
                total += intersection as f64 / union as f64;
            }
            pairs += 1;
        }
    }

    ((total / pairs as f64) * 100.0).round() / 100.0
}

pub fn compare_timelines(articles: &[Article]) -> TimelineComparison {
    let timelines: Vec<SourceTimeline> = articles
        .iter()
        .map(|a| SourceTimeline {
            source: a.source.clone(),
            mentions: extract_time_references(&a.content),
        })
        .collect();
    TimelineComparison {
        chronology_consistent: !timelines.is_empty(),
        timelines,
    }
}

pub fn consistency_label(score: f64) -> &'static str {
    if score > 0.8 {
        "Very Consistent"
    } else if score > 0.6 {
        "Mostly Consistent"
    } else if score > 0.4 {
        "Somewhat Varied"
    } else if score > 0.2 {
        "Significantly Different"
    } else {
        "Completely Different"
    }
}
