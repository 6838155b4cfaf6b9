use scraper::{Html, Selector};
use serde_json::Value;

/// Article metadata published as schema.org JSON-LD.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonLdArticle {
    pub headline: Option<String>,
    pub article_body: Option<String>,
}

impl JsonLdArticle {
    fn is_empty(&self) -> bool {
        self.headline.is_none() && self.article_body.is_none()
    }
}

/// Returns the first JSON-LD node carrying a `headline` or an `articleBody`.
/// Nodes nested in arrays or an `@graph` are searched too.
pub fn extract_article(document: &Html) -> Option<JsonLdArticle> {
    let script_selector = Selector::parse("script[type='application/ld+json']").ok()?;

    document
        .select(&script_selector)
        .filter_map(|script| {
            serde_json::from_str::<Value>(script.text().collect::<String>().trim()).ok()
        })
        .find_map(|json| find_article(&json))
}

fn find_article(value: &Value) -> Option<JsonLdArticle> {
    match value {
        Value::Array(items) => items.iter().find_map(find_article),
        Value::Object(obj) => {
            let found = JsonLdArticle {
                headline: non_empty(obj.get("headline")),
                article_body: non_empty(obj.get("articleBody")),
            };
            if !found.is_empty() {
                return Some(found);
            }
            obj.get("@graph").and_then(find_article)
        }
        _ => None,
    }
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(|v| v.as_str())
        .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_article_from_graph() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@type": "Organization", "name": "Daily"}</script>
            <script type="application/ld+json">
              {"@context": "https://schema.org", "@graph": [
                {"@type": "WebPage"},
                {"@type": "NewsArticle", "headline": "  Council   votes ", "articleBody": "The council voted."}
              ]}
            </script>
        </head><body></body></html>"#;

        let article = extract_article(&Html::parse_document(html)).unwrap();
        assert_eq!(article.headline.as_deref(), Some("Council votes"));
        assert_eq!(article.article_body.as_deref(), Some("The council voted."));
    }

    #[test]
    fn test_invalid_or_missing_json_ld() {
        let html = r#"<html><head>
            <script type="application/ld+json">{not json</script>
            <script type="application/ld+json">[{"@type": "NewsArticle", "headline": ""}]</script>
        </head></html>"#;
        assert_eq!(extract_article(&Html::parse_document(html)), None);
    }
}
