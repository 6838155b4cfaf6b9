use nn_core::{AnalysisResult, Article};
use nn_inference::narrative::{compare_timelines, consistency_label, MissingContext, TimelineComparison};
use nn_inference::summary::{
    assess_summary_quality, confidence_label, FocusedSummary, KeyQuote, SummaryQuality,
    TimelineEvent,
};
use nn_inference::Analyzers;
use serde::Serialize;

/// Optional extras computed on top of a finished analysis.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Details {
    pub timeline: Vec<TimelineEvent>,
    pub quotes: Vec<KeyQuote>,
    pub missing_context: Vec<MissingContext>,
    pub time_references: TimelineComparison,
    pub quality: SummaryQuality,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focused: Option<FocusedSummary>,
}

pub fn all_articles(result: &AnalysisResult) -> Vec<Article> {
    std::iter::once(result.article.clone())
        .chain(result.related_articles.iter().cloned())
        .collect()
}

pub async fn details(analyzers: &Analyzers, result: &AnalysisResult, focus: Option<&str>) -> Details {
    let articles = all_articles(result);

    let missing_context = async {
        if articles.len() < nn_inference::narrative::MIN_SOURCES {
            Vec::new()
        } else {
            analyzers
                .narrative
                .identify_missing_context(&articles, &result.detection.main_topic)
                .await
        }
    };
    let focused = async {
        match focus {
            Some(focus) => analyzers.summary.generate_focused_summary(&articles, focus).await,
            None => None,
        }
    };
    let (timeline, quotes, missing_context, focused) = tokio::join!(
        analyzers.summary.generate_timeline_summary(&articles),
        analyzers.summary.extract_key_quotes(&articles),
        missing_context,
        focused,
    );

    Details {
        timeline,
        quotes,
        missing_context,
        time_references: compare_timelines(&articles),
        quality: assess_summary_quality(&result.summary),
        focused,
    }
}

pub fn print_result(result: &AnalysisResult) {
    let article = &result.article;
    println!("📰 {}", article.title);
    println!("   {} ({})", article.source, article.url);

    if let Some(bias) = &article.bias_analysis {
        println!(
            "⚖️  {} ({:.2}, {}, {})",
            result.bias_label, bias.bias_score, bias.bias_direction, bias.method
        );
        if !bias.loaded_words.is_empty() {
            println!("   Loaded words: {}", bias.loaded_words.join(", "));
        }
        if !bias.overall_assessment.is_empty() {
            println!("   {}", bias.overall_assessment);
        }
    }

    if !result.related_articles.is_empty() {
        println!();
        println!("🔗 Related coverage:");
        for related in &result.related_articles {
            println!(
                "   - {} [{}] bias {:.2}: {}",
                related.source,
                related
                    .bias_direction()
                    .map(|d| d.as_str())
                    .unwrap_or("unknown"),
                related.bias_score(),
                related.title
            );
        }
    }

    if let Some(narrative) = &result.narrative {
        println!();
        println!(
            "📊 Narratives: {} ({:.2}, {})",
            consistency_label(narrative.narrative_consistency),
            narrative.narrative_consistency,
            narrative.method
        );
        for point in &narrative.common_points {
            println!("   • {}", point);
        }
    }

    let summary = &result.summary;
    println!();
    println!(
        "✍️  Neutral summary ({} confidence, {})",
        confidence_label(summary.confidence),
        summary.method
    );
    println!("{}", summary.summary);
    if !summary.consensus_facts.is_empty() {
        println!();
        println!("✅ Consensus:");
        for fact in &summary.consensus_facts {
            println!("   • {}", fact);
        }
    }
    for point in &summary.disputed_points {
        println!(
            "❓ {} (for: {}; against: {})",
            point.claim,
            point.supporting.join(", "),
            point.opposing.join(", ")
        );
    }
    if !summary.recommended_action.is_empty() {
        println!("👉 {}", summary.recommended_action);
    }
}

pub fn print_details(details: &Details) {
    println!();
    println!(
        "🧪 Summary quality {:.0}%: {}",
        details.quality.overall * 100.0,
        details.quality.recommendation
    );

    if let Some(focused) = &details.focused {
        println!();
        println!("🎯 {}: {}", focused.focus, focused.summary);
    }
    if !details.timeline.is_empty() {
        println!();
        println!("🕒 Timeline:");
        for event in &details.timeline {
            println!("   {}: {} ({})", event.date, event.event, event.sources.join(", "));
        }
    } else {
        for source in &details.time_references.timelines {
            if !source.mentions.is_empty() {
                println!("🕒 {}: {}", source.source, source.mentions.join(", "));
            }
        }
    }
    if !details.quotes.is_empty() {
        println!();
        println!("💬 Key quotes:");
        for quote in &details.quotes {
            println!("   \"{}\" ({}, {})", quote.text, quote.speaker, quote.source);
        }
    }
    if !details.missing_context.is_empty() {
        println!();
        println!("🧩 Missing context:");
        for item in &details.missing_context {
            println!(
                "   [{}] {} (absent from: {})",
                item.importance,
                item.context,
                item.absent_from.join(", ")
            );
        }
    }
}
