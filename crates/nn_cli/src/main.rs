use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use nn_core::{AnalysisResult, Article, ArticleSearch, Error, Result};
use nn_scrapers::{AnalysisPipeline, HtmlScraper, NewsApiSearch, NoopSearch, PipelineConfig};
use nn_storage::StorageManager;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod report;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compare news coverage across outlets and write a neutral summary", long_about = None)]
pub struct Cli {
    /// Storage backend: memory, or sqlite when built with that feature
    #[arg(long, default_value = "memory")]
    storage: String,
    #[arg(long)]
    storage_path: Option<String>,
    #[arg(long, default_value = "deepseek", help = "Model to use for analysis. Available models: deepseek (default), offline")]
    model: String,
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long)]
    model_url: Option<String>,
    #[arg(long)]
    model_name: Option<String>,
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    news_api_key: Option<String>,
    /// Related articles to compare against (3 to 5)
    #[arg(long, default_value_t = 5)]
    max_sources: usize,
    /// Analyze pages even when they do not look like news articles
    #[arg(long)]
    skip_detection: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone, Default)]
struct OutputArgs {
    /// Print the result as JSON
    #[arg(long)]
    json: bool,
    /// Also extract a timeline, key quotes and missing context
    #[arg(long)]
    details: bool,
    /// Write an extra summary focused on this aspect of the story
    #[arg(long)]
    focus: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Scrape a page and analyze it against related coverage
    Analyze {
        url: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Analyze an article stored in a local text file
    AnalyzeFile {
        path: PathBuf,
        #[arg(long)]
        title: String,
        /// URL the article was published at, used for caching and filtering
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        source: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show recent analyses
    History {
        #[arg(long)]
        clear: bool,
    },
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Show storage usage
    Stats,
    /// Serve the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
}

#[derive(clap::Subcommand, Debug)]
enum CacheCommands {
    /// Remove every cached analysis
    Clear,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn create_search(api_key: Option<&str>) -> Result<Arc<dyn ArticleSearch>> {
    match api_key.filter(|k| !k.trim().is_empty()) {
        Some(key) => Ok(Arc::new(NewsApiSearch::new(key)?)),
        None => {
            warn!("⚠️ No NEWS_API_KEY configured, related coverage search is disabled");
            Ok(Arc::new(NoopSearch))
        }
    }
}

async fn build_pipeline(cli: &Cli, storage: StorageManager) -> Result<AnalysisPipeline> {
    let config = nn_inference::Config {
        model: cli.model.clone(),
        api_key: cli.api_key.clone(),
        model_name: cli.model_name.clone(),
        inference_config: nn_inference::InferenceConfig {
            model_url: cli.model_url.clone(),
        },
    };
    let model = nn_inference::create_model(Some(config)).await?;
    let search = create_search(cli.news_api_key.as_deref())?;
    info!("🦗 Related coverage from {}", search.name());

    let pipeline_config = PipelineConfig {
        max_related: cli.max_sources,
        require_news: !cli.skip_detection,
    };
    Ok(
        AnalysisPipeline::new(Arc::new(HtmlScraper::new()?), search, model, storage)
            .with_config(pipeline_config),
    )
}

/// `file://` URL of `path`, so local articles get a stable cache identity.
fn file_url(path: &Path) -> Result<String> {
    let absolute = std::fs::canonicalize(path)?;
    url::Url::from_file_path(&absolute)
        .map(|u| u.to_string())
        .map_err(|_| Error::InvalidUrl(absolute.display().to_string()))
}

async fn read_article(
    path: &Path,
    title: String,
    url: Option<String>,
    source: Option<String>,
) -> Result<Article> {
    let content = tokio::fs::read_to_string(path).await?;
    let url = match url {
        Some(url) => url,
        None => file_url(path)?,
    };
    Ok(Article::new(url, title, content, source))
}

async fn output(pipeline: &AnalysisPipeline, result: &AnalysisResult, args: &OutputArgs) -> Result<()> {
    let details = if args.details || args.focus.is_some() {
        Some(report::details(pipeline.analyzers(), result, args.focus.as_deref()).await)
    } else {
        None
    };

    if args.json {
        let value = match &details {
            Some(details) => serde_json::json!({ "result": result, "details": details }),
            None => serde_json::to_value(result)?,
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        report::print_result(result);
        if let Some(details) = &details {
            report::print_details(details);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let store = nn_storage::create_storage(cli.storage.as_str(), cli.storage_path.as_deref()).await?;
    let storage = StorageManager::new(store);
    info!("💾 Storage initialized (using {})", cli.storage);

    match &cli.command {
        Commands::Analyze { url, output: args } => {
            let pipeline = build_pipeline(&cli, storage).await?;
            let result = pipeline.run(url).await?;
            output(&pipeline, &result, args).await?;
        }
        Commands::AnalyzeFile {
            path,
            title,
            url,
            source,
            output: args,
        } => {
            let pipeline = build_pipeline(&cli, storage).await?;
            let article = read_article(path, title.clone(), url.clone(), source.clone()).await?;
            let result = pipeline.analyze_article(article).await?;
            output(&pipeline, &result, args).await?;
        }
        Commands::History { clear } => {
            if *clear {
                storage.clear_history().await?;
                println!("History cleared");
            } else {
                let history = storage.get_history().await?;
                if history.is_empty() {
                    println!("No analyses yet");
                }
                for entry in history {
                    println!(
                        "{}  {:.2}  {} sources  {} ({})",
                        entry.timestamp.format("%Y-%m-%d %H:%M"),
                        entry.bias_score,
                        entry.sources,
                        entry.title,
                        entry.url
                    );
                }
            }
        }
        Commands::Cache {
            command: CacheCommands::Clear,
        } => {
            let removed = storage.clear_all_cache().await?;
            println!("Removed {} cached analyses", removed);
        }
        Commands::Stats => {
            let stats = storage.get_storage_stats().await?;
            println!(
                "{} bytes ({} MB of {} MB)",
                stats.bytes_used, stats.megabytes_used, stats.quota_mb
            );
        }
        Commands::Serve { addr } => {
            let pipeline = build_pipeline(&cli, storage).await?;
            nn_web::serve(*addr, nn_web::AppState::new(pipeline)).await?;
        }
    }

    Ok(())
}
