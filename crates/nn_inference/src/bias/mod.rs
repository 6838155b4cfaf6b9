use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use nn_core::{
    AnalysisMethod, Article, BiasAnalysis, BiasDirection, LanguageModel, Result,
    SourceCredibility,
};
use nn_storage::{CacheKind, StorageManager};
use tracing::{debug, info, warn};

use crate::decode::{clamp_score, decode, BiasResponse};
use crate::keywords::analyze_keywords;
use crate::prompts::bias_prompt;

const MAX_TOKENS: u32 = 2000;

/// Scores a single article for bias, preferring the model and falling back
/// to lexicon counts.
#[derive(Clone)]
pub struct BiasDetector {
    model: Arc<dyn LanguageModel>,
    storage: StorageManager,
}

impl fmt::Debug for BiasDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BiasDetector")
            .field("model", &self.model.name())
            .finish()
    }
}

impl BiasDetector {
    pub fn new(model: Arc<dyn LanguageModel>, storage: StorageManager) -> Self {
        Self { model, storage }
    }

    /// Never fails: a cache hit, a fresh model analysis, or the keyword fallback.
    pub async fn analyze_article(&self, article: &Article) -> BiasAnalysis {
        info!("🔍 Analyzing bias for: {}", article.title);

        match self
            .storage
            .get_cached_analysis::<BiasAnalysis>(CacheKind::Bias, &article.url)
            .await
        {
            Ok(Some(cached)) => {
                debug!("📦 Using cached bias analysis for {}", article.url);
                return cached;
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to read bias cache for {}: {}", article.url, e),
        }

        match self.detect_with_ai(article).await {
            Ok(mut analysis) => {
                analysis.keyword_indicators = analyze_keywords(&article.content);
                analysis.analyzed_at = Some(Utc::now());
                if let Err(e) = self
                    .storage
                    .cache_analysis(CacheKind::Bias, &article.url, &analysis)
                    .await
                {
                    warn!("Failed to cache bias analysis for {}: {}", article.url, e);
                }
                analysis
            }
            Err(e) => {
                warn!("Bias detection failed for {}, using keyword analysis: {}", article.url, e);
                get_fallback_analysis(article)
            }
        }
    }

    async fn detect_with_ai(&self, article: &Article) -> Result<BiasAnalysis> {
        let value = self
            .model
            .send_prompt_json(&bias_prompt(article), MAX_TOKENS)
            .await?;
        let response: BiasResponse = decode(value)?;

        Ok(BiasAnalysis {
            bias_score: clamp_score(&response.bias_score),
            bias_direction: response.direction()?,
            loaded_words: response.loaded_words,
            framing_techniques: response.framing_techniques,
            source_credibility: response.source_credibility.unwrap_or_default(),
            credibility_factors: response.credibility_factors,
            overall_assessment: response.overall_assessment,
            recommendations: response.recommendations,
            method: AnalysisMethod::AiPowered,
            keyword_indicators: Default::default(),
            analyzed_at: None,
        })
    }

    /// Analyzes every article concurrently. Results keep the input order.
    pub async fn analyze_batch(&self, articles: &[Article]) -> Vec<BiasAnalysis> {
        info!("🔍 Batch analyzing {} articles for bias", articles.len());
        join_all(articles.iter().map(|a| self.analyze_article(a))).await
    }
}

/// Lexicon-only analysis. A direction needs a margin of three matches over
/// the opposite side; sensationalism needs more than five emotional terms.
pub fn get_fallback_analysis(article: &Article) -> BiasAnalysis {
    let indicators = analyze_keywords(&article.content);
    let left = indicators.left_leaning.len();
    let right = indicators.right_leaning.len();
    let emotional = indicators.emotional.len();

    let (bias_direction, bias_score) = if left > right + 2 {
        (BiasDirection::LeftLeaning, (0.5 + left as f64 * 0.05).min(0.8))
    } else if right > left + 2 {
        (BiasDirection::RightLeaning, (0.5 + right as f64 * 0.05).min(0.8))
    } else if emotional > 5 {
        (BiasDirection::Sensationalist, (0.4 + emotional as f64 * 0.04).min(0.7))
    } else {
        (BiasDirection::Neutral, 0.0)
    };

    BiasAnalysis {
        bias_score,
        bias_direction,
        loaded_words: indicators.all(),
        framing_techniques: Vec::new(),
        source_credibility: SourceCredibility::Unknown,
        credibility_factors: Vec::new(),
        overall_assessment: "Basic keyword analysis (AI analysis unavailable)".to_string(),
        recommendations: vec!["Enable AI analysis for detailed bias detection".to_string()],
        method: AnalysisMethod::KeywordBased,
        keyword_indicators: indicators,
        analyzed_at: None,
    }
}

pub fn bias_label(score: f64) -> &'static str {
    if score < 0.2 {
        "Minimal Bias"
    } else if score < 0.4 {
        "Slight Bias"
    } else if score < 0.6 {
        "Moderate Bias"
    } else if score < 0.8 {
        "Significant Bias"
    } else {
        "Extreme Bias"
    }
}
