//! Article reading tool: fetch a news page and extract its text.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use super::{html_decode, required_str, strip_tags, Tool, ToolError};

/// Blocks that never hold article text.
const NOISE_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "form", "svg",
];

/// Read a web article and return its title, authors, date and text.
pub struct ReadArticle {
    http: reqwest::Client,
    max_chars: usize,
}

impl ReadArticle {
    pub fn new(http: reqwest::Client, max_chars: usize) -> Self {
        Self { http, max_chars }
    }
}

/// What could be pulled out of an article page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Article {
    pub url: String,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub publish_date: Option<String>,
    pub text: String,
}

#[async_trait]
impl Tool for ReadArticle {
    fn name(&self) -> &str {
        "read_article"
    }

    fn description(&self) -> &str {
        "Read an article from a URL. Returns JSON with the article title, authors, publish_date and text. Use it on links returned by web_search."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL of the article"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let url = required_str(&args, "url")?;
        let parsed = url::Url::parse(url)
            .map_err(|e| ToolError::InvalidArguments(format!("Invalid url '{}': {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ToolError::InvalidArguments(format!(
                "Unsupported url scheme: {}",
                parsed.scheme()
            )));
        }

        tracing::info!(url = %url, "Reading article");

        let response = self.http.get(parsed).send().await?;
        let status = response.status();

        // Left to the model to skip, as instructed.
        if !status.is_success() {
            tracing::debug!(url = %url, status = %status, "Article not available");
            return Ok(format!("Could not read {}: HTTP error {}", url, status));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();

        let body = response.text().await?;

        let mut article = if content_type.is_empty() || content_type.contains("html") {
            extract_article(&body)
        } else {
            Article {
                text: body,
                ..Article::default()
            }
        };
        article.url = url.to_string();
        article.text = truncate_chars(&article.text, self.max_chars);

        tracing::debug!(url = %url, chars = article.text.len(), "Article extracted");

        Ok(format!("{:#}", json!(article)))
    }
}

/// Extract article metadata and body text from an HTML page.
pub fn extract_article(html: &str) -> Article {
    let meta = meta_content(html);

    let title = ["og:title", "twitter:title", "headline"]
        .iter()
        .find_map(|k| meta.get(*k).cloned())
        .or_else(|| first_tag_text(html, "title"))
        .or_else(|| first_tag_text(html, "h1"));

    let mut authors: Vec<String> = Vec::new();
    for key in ["author", "article:author", "byl", "parsely-author"] {
        if let Some(value) = meta.get(key) {
            let name = value.trim_start_matches("By ").trim_start_matches("by ").to_string();
            if !name.is_empty() && !name.starts_with("http") && !authors.contains(&name) {
                authors.push(name);
            }
        }
    }

    let publish_date = [
        "article:published_time",
        "datepublished",
        "date",
        "pubdate",
        "og:published_time",
    ]
    .iter()
    .find_map(|k| meta.get(*k).cloned());

    let mut cleaned = html.to_string();
    for tag in NOISE_TAGS {
        cleaned = remove_blocks(&cleaned, tag);
    }
    let region = tag_inner(&cleaned, "article")
        .or_else(|| tag_inner(&cleaned, "main"))
        .unwrap_or(cleaned.as_str());

    let text = paragraphs(region);
    let text = if text.is_empty() {
        strip_tags(region)
    } else {
        text
    };

    Article {
        url: String::new(),
        title,
        authors,
        publish_date,
        text,
    }
}

/// Collect `<meta>` tags into a lowercase name -> content map (first wins).
fn meta_content(html: &str) -> HashMap<String, String> {
    use regex::Regex;
    use std::sync::LazyLock;

    static META_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<meta\s[^>]*>").unwrap());
    static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"([\w:-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
    });

    let mut out = HashMap::new();
    for tag in META_RE.find_iter(html) {
        let mut key = None;
        let mut content = None;
        for cap in ATTR_RE.captures_iter(tag.as_str()) {
            let value = cap
                .get(2)
                .or_else(|| cap.get(3))
                .map(|m| html_decode(m.as_str()).trim().to_string())
                .unwrap_or_default();
            match cap[1].to_ascii_lowercase().as_str() {
                "property" | "name" | "itemprop" => key = Some(value.to_ascii_lowercase()),
                "content" => content = Some(value),
                _ => {}
            }
        }
        if let (Some(k), Some(c)) = (key, content) {
            if !c.is_empty() {
                out.entry(k).or_insert(c);
            }
        }
    }
    out
}

/// Remove every `<tag ...>...</tag>` block (case-insensitive).
fn remove_blocks(html: &str, tag: &str) -> String {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    // ASCII lowercasing keeps byte offsets aligned with `html`.
    let lower = html.to_ascii_lowercase();

    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    while let Some(start) = find_open_tag(&lower, &open, pos) {
        out.push_str(&html[pos..start]);
        match lower[start..].find(&close) {
            Some(end) => pos = start + end + close.len(),
            None => {
                pos = html.len();
                break;
            }
        }
    }
    out.push_str(&html[pos..]);
    out
}

/// Find `<tag` followed by a delimiter, so `<header` doesn't match `<head`.
fn find_open_tag(lower: &str, open: &str, from: usize) -> Option<usize> {
    let mut search = from;
    while let Some(rel) = lower[search..].find(open) {
        let start = search + rel;
        let next = lower[start + open.len()..].chars().next();
        if matches!(next, Some(c) if c == '>' || c == '/' || c.is_whitespace()) {
            return Some(start);
        }
        search = start + open.len();
    }
    None
}

/// Inner HTML of the first `<tag>` element.
fn tag_inner<'a>(html: &'a str, tag: &str) -> Option<&'a str> {
    let lower = html.to_ascii_lowercase();
    let start = find_open_tag(&lower, &format!("<{}", tag), 0)?;
    let body_start = start + lower[start..].find('>')? + 1;
    let body_end = body_start + lower[body_start..].find(&format!("</{}>", tag))?;
    Some(&html[body_start..body_end])
}

fn first_tag_text(html: &str, tag: &str) -> Option<String> {
    tag_inner(html, tag)
        .map(strip_tags)
        .filter(|t| !t.is_empty())
}

/// Text of every `<p>` in the region, one paragraph per block.
fn paragraphs(region: &str) -> String {
    use regex::Regex;
    use std::sync::LazyLock;

    static P_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<p(?:\s[^>]*)?>(.*?)</p>").unwrap());

    P_RE.captures_iter(region)
        .map(|c| strip_tags(&c[1]))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!(
            "{}... [content truncated, showing first {} chars]",
            &text[..idx],
            max_chars
        ),
        None => text.to_string(),
    }
}
