use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use nn_core::{Error, Result, ScrapedPage, Scraper};
use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

pub mod jsonld;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; news-neutralizer/0.1)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Containers tried in order; the first with enough text wins.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "[role='main']",
    "main",
    ".article-content",
    ".post-content",
    ".entry-content",
    "#content",
    ".content",
];
const SKIPPED: &str = "script, style, nav, header, footer, aside, .ad, .advertisement";
const MIN_CONTAINER_CHARS: usize = 100;

/// Generic page scraper working on any news site.
#[derive(Debug, Clone)]
pub struct HtmlScraper {
    client: Client,
}

impl HtmlScraper {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Scraping(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Scraper for HtmlScraper {
    async fn scrape_page(&self, url: &str) -> Result<ScrapedPage> {
        let parsed = utils::parse_url(url)?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| Error::Scraping(format!("Failed to fetch {}: {}", url, e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Scraping(format!("{} answered with {}", url, status)));
        }
        let html = response
            .text()
            .await
            .map_err(|e| Error::Scraping(format!("Failed to read {}: {}", url, e)))?;

        let page = extract_page(url, &html)?;
        debug!("Scraped {} ({} chars)", url, page.text.chars().count());
        Ok(page)
    }
}

/// Pulls the title and readable text out of an HTML document.
pub fn extract_page(url: &str, html: &str) -> Result<ScrapedPage> {
    let document = Html::parse_document(html);
    let structured = jsonld::extract_article(&document).unwrap_or_default();

    let title = match utils::extract_text(&document, "title")? {
        Some(title) => title,
        None => utils::extract_attr(&document, "meta[property='og:title']", "content")?
            .or(structured.headline)
            .or(utils::extract_text(&document, "h1")?)
            .unwrap_or_default(),
    };

    let text = match structured.article_body {
        Some(body) if body.chars().count() > MIN_CONTAINER_CHARS => body,
        _ => main_text(&document)?,
    };

    Ok(ScrapedPage {
        url: url.to_string(),
        title,
        text,
    })
}

fn main_text(document: &Html) -> Result<String> {
    let skipped = utils::selector(SKIPPED)?;

    for candidate in CONTENT_SELECTORS {
        let selector = utils::selector(candidate)?;
        if let Some(element) = document.select(&selector).next() {
            let text = visible_text(element, &skipped);
            if text.chars().count() > MIN_CONTAINER_CHARS {
                return Ok(text);
            }
        }
    }

    let body = utils::selector("body")?;
    Ok(document
        .select(&body)
        .next()
        .map(|element| visible_text(element, &skipped))
        .unwrap_or_default())
}

/// Text of `element` minus everything inside nodes matching `skipped`.
fn visible_text(element: ElementRef<'_>, skipped: &Selector) -> String {
    let hidden: HashSet<_> = element.select(skipped).map(|e| e.id()).collect();

    let mut out = String::new();
    for node in element.descendants() {
        if let Node::Text(text) = node.value() {
            if node.ancestors().any(|a| hidden.contains(&a.id())) {
                continue;
            }
            out.push_str(text);
            out.push(' ');
        }
    }
    utils::collapse_whitespace(&out)
}

/// Common utilities for scrapers
pub(crate) mod utils {
    use super::*;
    use url::Url;

    /// Only absolute http(s) URLs can be fetched.
    pub fn parse_url(url: &str) -> Result<Url> {
        let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            other => Err(Error::InvalidUrl(format!("{}: unsupported scheme {}", url, other))),
        }
    }

    pub fn selector(selector: &str) -> Result<Selector> {
        Selector::parse(selector)
            .map_err(|e| Error::Scraping(format!("Invalid selector {}: {}", selector, e)))
    }

    /// Collapsed text of the first match, `None` when absent or blank.
    pub fn extract_text(document: &Html, selector: &str) -> Result<Option<String>> {
        let selector = self::selector(selector)?;
        Ok(document
            .select(&selector)
            .map(|el| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
            .find(|text| !text.is_empty()))
    }

    pub fn extract_attr(document: &Html, selector: &str, attr: &str) -> Result<Option<String>> {
        let selector = self::selector(selector)?;
        Ok(document
            .select(&selector)
            .filter_map(|el| el.value().attr(attr))
            .map(collapse_whitespace)
            .find(|text| !text.is_empty()))
    }

    pub fn collapse_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(words: usize) -> String {
        vec!["reporting"; words].join(" ")
    }

    #[test]
    fn test_article_container_wins() {
        let html = format!(
            r#"<html><head><title> Council   approves budget </title>
            <style>.x {{ color: red }}</style></head>
            <body>
              <nav>Home Sports Weather</nav>
              <article>
                <header>Byline banner</header>
                <p>{}</p>
                <script>track()</script>
                <div class="ad">Buy now</div>
              </article>
              <footer>Copyright</footer>
            </body></html>"#,
            paragraph(30)
        );

        let page = extract_page("https://news.example.com/a", &html).unwrap();
        assert_eq!(page.title, "Council approves budget");
        assert_eq!(page.text, paragraph(30));
        assert_eq!(page.url, "https://news.example.com/a");
    }

    #[test]
    fn test_short_container_falls_through_to_body() {
        let html = format!(
            r#"<html><body>
              <article>Too short</article>
              <div class="story"><p>{}</p></div>
              <aside>Related links</aside>
            </body></html>"#,
            paragraph(25)
        );

        let page = extract_page("https://news.example.com/b", &html).unwrap();
        assert_eq!(page.text, format!("Too short {}", paragraph(25)));
        assert_eq!(page.title, "");
    }

    #[test]
    fn test_title_fallbacks() {
        let html = r#"<html><head><meta property="og:title" content="From OpenGraph"></head>
            <body><h1>From heading</h1></body></html>"#;
        assert_eq!(extract_page("https://x.com", html).unwrap().title, "From OpenGraph");

        let html = "<html><body><h1> From   heading </h1></body></html>";
        assert_eq!(extract_page("https://x.com", html).unwrap().title, "From heading");
    }

    #[test]
    fn test_json_ld_body_preferred() {
        let body = paragraph(40);
        let html = format!(
            r#"<html><head>
              <script type="application/ld+json">{{"@type": "NewsArticle", "headline": "Structured headline", "articleBody": "{}"}}</script>
            </head><body><main>Subscribe to our newsletter</main></body></html>"#,
            body
        );

        let page = extract_page("https://x.com/c", &html).unwrap();
        assert_eq!(page.text, body);
        assert_eq!(page.title, "Structured headline");
    }

    #[test]
    fn test_parse_url_rejects_non_http() {
        assert!(matches!(utils::parse_url("not a url"), Err(Error::InvalidUrl(_))));
        assert!(matches!(utils::parse_url("ftp://x.com/a"), Err(Error::InvalidUrl(_))));
        assert!(utils::parse_url("https://x.com/a").is_ok());
    }

    #[tokio::test]
    async fn test_scrape_invalid_url() {
        let scraper = HtmlScraper::new().unwrap();
        let result = scraper.scrape_page("javascript:alert(1)").await;
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
