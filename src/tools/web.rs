//! Web search tool backed by DuckDuckGo's HTML endpoint.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use super::{html_decode, required_str, strip_tags, Tool, ToolError};

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";

/// Search the web (DuckDuckGo HTML, no API key needed).
pub struct WebSearch {
    http: reqwest::Client,
    default_results: usize,
}

impl WebSearch {
    pub fn new(http: reqwest::Client, default_results: usize) -> Self {
        Self {
            http,
            default_results,
        }
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub href: String,
    pub body: String,
}

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for a query. Returns a JSON list of results with title, href (the page URL) and body (a snippet)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "max_results": {
                    "type": "integer",
                    "description": format!("Maximum number of results to return (default: {})", self.default_results)
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let query = required_str(&args, "query")?;
        let max_results = args["max_results"]
            .as_u64()
            .map(|n| n as usize)
            .filter(|n| *n > 0)
            .unwrap_or(self.default_results);

        tracing::info!(query = %query, max_results, "Searching the web");

        let url = format!("{}?q={}", SEARCH_URL, urlencoding::encode(query));
        let html = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let results = extract_ddg_results(&html, max_results);
        tracing::debug!(query = %query, found = results.len(), "Search finished");

        if results.is_empty() {
            return Ok(format!("No results found for: {}", query));
        }
        Ok(format!("{:#}", json!(results)))
    }
}

/// Extract search results from DuckDuckGo HTML.
fn extract_ddg_results(html: &str, limit: usize) -> Vec<SearchResult> {
    use regex::Regex;
    use std::sync::LazyLock;

    static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?s)<a[^>]*class="result__a"[^>]*>(.*?)</a>"#).unwrap()
    });
    static HREF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"href="([^"]*)""#).unwrap());
    static SNIPPET_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?s)class="result__snippet"[^>]*>(.*?)</(?:a|div|td)>"#).unwrap()
    });

    let mut results = Vec::new();

    for chunk in html.split("result__body").skip(1) {
        if results.len() >= limit {
            break;
        }

        let Some(link) = LINK_RE.captures(chunk) else {
            continue;
        };
        let title = strip_tags(&link[1]);
        let href = HREF_RE
            .captures(&link[0])
            .map(|c| resolve_result_url(&html_decode(&c[1])))
            .unwrap_or_default();

        if title.is_empty() || href.is_empty() {
            continue;
        }

        let body = SNIPPET_RE
            .captures(chunk)
            .map(|c| strip_tags(&c[1]))
            .unwrap_or_default();

        results.push(SearchResult { title, href, body });
    }

    results
}

/// DuckDuckGo wraps result links in a redirect (`//duckduckgo.com/l/?uddg=<target>`).
fn resolve_result_url(raw: &str) -> String {
    let absolute = if raw.starts_with("//") {
        format!("https:{}", raw)
    } else {
        raw.to_string()
    };

    match url::Url::parse(&absolute) {
        Ok(parsed) => parsed
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned())
            .unwrap_or(absolute),
        Err(_) => absolute,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<div class="result results_links results_links_deep web-result">
  <div class="links_main links_deep result__body">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.oracle.com%2Fnews%2F&amp;rut=abc">Oracle <b>News</b> &amp; Updates</a>
    </h2>
    <a class="result__snippet" href="//duckduckgo.com/l/?uddg=x">Latest <b>Oracle</b> announcements.</a>
  </div>
</div>
<div class="result results_links web-result">
  <div class="links_main result__body">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a" href="https://example.com/direct">Direct link</a>
    </h2>
  </div>
</div>
<div class="result results_links web-result">
  <div class="links_main result__body">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a" href="https://example.com/third">Third</a>
    </h2>
  </div>
</div>
"#;

    #[test]
    fn extracts_titles_links_and_snippets() {
        let results = extract_ddg_results(PAGE, 5);
        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0],
            SearchResult {
                title: "Oracle News & Updates".to_string(),
                href: "https://www.oracle.com/news/".to_string(),
                body: "Latest Oracle announcements.".to_string(),
            }
        );
        assert_eq!(results[1].href, "https://example.com/direct");
        assert_eq!(results[1].body, "");
    }

    #[test]
    fn respects_result_limit() {
        assert_eq!(extract_ddg_results(PAGE, 2).len(), 2);
    }

    #[test]
    fn empty_page_has_no_results() {
        assert!(extract_ddg_results("<html></html>", 5).is_empty());
    }

    #[test]
    fn resolve_keeps_plain_urls() {
        assert_eq!(resolve_result_url("https://a.example/x?y=1"), "https://a.example/x?y=1");
    }
}
