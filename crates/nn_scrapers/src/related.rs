use std::collections::HashSet;

use nn_core::{Article, ArticleSearch, Error, RelatedArticle, Result};
use nn_inference::keywords::truncate_chars;
use tracing::{debug, info, warn};
use url::Url;

pub const MAX_CONTENT_CHARS: usize = 8000;

/// Lowercased host with any leading `www.` removed.
pub fn extract_domain(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| Error::InvalidUrl(format!("{}: no host", url)))?
        .to_lowercase();
    Ok(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}

/// Asks `search` for coverage of `query` from other outlets. Over-fetches
/// to make up for filtering; a failing search yields no results.
pub async fn find_related_articles(
    search: &dyn ArticleSearch,
    query: &str,
    original_url: &str,
    limit: usize,
) -> Vec<RelatedArticle> {
    let original_domain = match extract_domain(original_url) {
        Ok(domain) => Some(domain),
        Err(e) => {
            warn!("Not filtering by domain: {}", e);
            None
        }
    };

    let candidates = match search.search(query, limit * 2).await {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!("{} search failed: {}", search.name(), e);
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut related = Vec::new();
    for candidate in candidates {
        if related.len() >= limit {
            break;
        }
        if seen.contains(&candidate.url) {
            continue;
        }
        let domain = match extract_domain(&candidate.url) {
            Ok(domain) => domain,
            Err(e) => {
                debug!("Dropping search result: {}", e);
                continue;
            }
        };
        if original_domain.as_deref() == Some(domain.as_str()) {
            debug!("Filtering out same domain: {}", domain);
            continue;
        }
        seen.insert(candidate.url.clone());
        related.push(candidate);
    }

    info!("Found {} unique related articles", related.len());
    related
}

/// Turns search hits into articles, using the description when the
/// provider has no body text.
pub fn normalize_related(items: Vec<RelatedArticle>, max: usize) -> Vec<Article> {
    items
        .into_iter()
        .take(max)
        .map(|item| {
            let body = item
                .content
                .filter(|c| !c.trim().is_empty())
                .or(item.description)
                .unwrap_or_default();
            let content = truncate_chars(body.trim(), MAX_CONTENT_CHARS).to_string();
            let mut article = Article::new(item.url, item.title, content, item.source);
            article.published_at = item.published_at;
            article
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedSearch(Result<Vec<RelatedArticle>>);

    #[async_trait]
    impl ArticleSearch for FixedSearch {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<RelatedArticle>> {
            match &self.0 {
                Ok(items) => Ok(items.clone()),
                Err(_) => Err(Error::Upstream("search down".into())),
            }
        }
    }

    fn hit(url: &str) -> RelatedArticle {
        RelatedArticle {
            url: url.to_string(),
            title: format!("Story at {}", url),
            source: None,
            description: None,
            content: None,
            published_at: None,
        }
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://WWW.Example.com/a").unwrap(), "example.com");
        assert_eq!(extract_domain("https://news.example.com").unwrap(), "news.example.com");
        assert!(matches!(extract_domain("nope"), Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_same_domain_and_duplicates_removed() {
        let search = FixedSearch(Ok(vec![
            hit("https://www.a.com/1"),
            hit("https://b.com/2"),
            hit("https://www.a.com/3"),
            hit("https://b.com/2"),
        ]));

        let related = find_related_articles(&search, "q", "https://a.com/x", 5).await;
        let urls: Vec<_> = related.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://b.com/2"]);
    }

    #[tokio::test]
    async fn test_limit_and_malformed_urls() {
        let search = FixedSearch(Ok(vec![
            hit("not a url"),
            hit("https://b.com/1"),
            hit("https://c.com/1"),
            hit("https://d.com/1"),
        ]));

        let related = find_related_articles(&search, "q", "https://a.com/x", 2).await;
        let urls: Vec<_> = related.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://b.com/1", "https://c.com/1"]);
    }

    #[tokio::test]
    async fn test_invalid_original_disables_domain_filter() {
        let search = FixedSearch(Ok(vec![hit("https://a.com/1")]));
        let related = find_related_articles(&search, "q", "file.txt", 3).await;
        assert_eq!(related.len(), 1);
    }

    #[tokio::test]
    async fn test_search_failure_is_empty() {
        let search = FixedSearch(Err(Error::Upstream("down".into())));
        assert!(find_related_articles(&search, "q", "https://a.com/x", 3).await.is_empty());
    }

    #[test]
    fn test_normalize_related() {
        let mut with_content = hit("https://b.com/1");
        with_content.content = Some(format!("  {}  ", "é".repeat(9000)));
        with_content.source = Some("Bee News".into());

        let mut with_description = hit("https://www.c.com/2");
        with_description.content = Some("   ".into());
        with_description.description = Some("Short description".into());
        with_description.published_at = Some("2024-03-01".into());

        let articles = normalize_related(vec![with_content, with_description, hit("https://d.com/3")], 2);
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].content.chars().count(), MAX_CONTENT_CHARS);
        assert_eq!(articles[0].source, "Bee News");
        assert_eq!(articles[1].content, "Short description");
        assert_eq!(articles[1].source, "www.c.com");
        assert_eq!(articles[1].published_at.as_deref(), Some("2024-03-01"));
    }
}
