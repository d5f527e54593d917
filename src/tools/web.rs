//! Web search and fetch back-ends.
//!
//! Search back-ends sit behind the `SearchProvider` trait so the Search
//! subagent can be wired with any primary/secondary pair and tests can
//! inject scripted providers. All providers return a flat text block ready
//! for LLM consumption.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::OnceLock;

/// Maximum number of characters returned by `fetch_url`.
const FETCH_CAP: usize = 20_000;

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Search and return a text summary of up to `max_results` results.
    async fn search(&self, query: &str, max_results: usize) -> Result<String, String>;
}

/// Tavily search API client (primary web search).
pub struct TavilyClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TavilyClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, "https://api.tavily.com".to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
    #[serde(default)]
    images: Vec<TavilyImage>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct TavilyImage {
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
}

#[async_trait]
impl SearchProvider for TavilyClient {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<String, String> {
        let body = json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": max_results,
            "include_images": true,
            "include_image_descriptions": true,
        });

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Tavily request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Tavily request failed: {}", response.status()));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to decode Tavily response: {}", e))?;

        if parsed.results.is_empty() {
            return Err(format!("Tavily returned no results for '{}'", query));
        }

        let mut lines = Vec::new();
        for result in &parsed.results {
            lines.push(format!(
                "Title: {}\nURL: {}\nContent: {}\n",
                result.title, result.url, result.content
            ));
        }
        for image in &parsed.images {
            if !image.url.is_empty() {
                lines.push(format!(
                    "Image: {}\nDescription: {}\n",
                    image.url, image.description
                ));
            }
        }
        Ok(lines.join("\n"))
    }
}

/// DuckDuckGo instant-answer API client (fallback web search).
pub struct DuckDuckGoClient {
    client: Client,
    base_url: String,
}

impl DuckDuckGoClient {
    pub fn new() -> Self {
        Self::with_base_url("https://api.duckduckgo.com".to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }
}

impl Default for DuckDuckGoClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct DdgResponse {
    #[serde(rename = "Heading", default)]
    heading: String,
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<DdgTopic>,
}

#[derive(Deserialize)]
struct DdgTopic {
    #[serde(rename = "Text", default)]
    text: String,
    #[serde(rename = "FirstURL", default)]
    first_url: String,
    #[serde(rename = "Topics", default)]
    topics: Vec<DdgTopic>,
}

#[async_trait]
impl SearchProvider for DuckDuckGoClient {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<String, String> {
        let url = format!(
            "{}/?q={}&format=json&no_html=1",
            self.base_url,
            urlencoding::encode(query)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("DuckDuckGo request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("DuckDuckGo request failed: {}", response.status()));
        }

        let parsed: DdgResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to decode DuckDuckGo response: {}", e))?;

        let mut lines = Vec::new();
        if !parsed.abstract_text.is_empty() {
            lines.push(format!(
                "Title: {}\nURL: {}\nContent: {}\n",
                parsed.heading, parsed.abstract_url, parsed.abstract_text
            ));
        }

        let mut flat = Vec::new();
        flatten_topics(&parsed.related_topics, &mut flat);
        for topic in flat.into_iter().take(max_results) {
            lines.push(format!("Content: {}\nURL: {}\n", topic.0, topic.1));
        }

        if lines.is_empty() {
            return Err(format!("DuckDuckGo returned no results for '{}'", query));
        }
        Ok(lines.join("\n"))
    }
}

fn flatten_topics(topics: &[DdgTopic], out: &mut Vec<(String, String)>) {
    for topic in topics {
        if !topic.text.is_empty() {
            out.push((topic.text.clone(), topic.first_url.clone()));
        }
        flatten_topics(&topic.topics, out);
    }
}

/// Wikipedia search API client.
pub struct WikipediaClient {
    client: Client,
    base_url: String,
}

impl WikipediaClient {
    pub fn new() -> Self {
        Self::with_base_url("https://en.wikipedia.org".to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }
}

impl Default for WikipediaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct WikiResponse {
    #[serde(default)]
    query: Option<WikiQuery>,
}

#[derive(Deserialize)]
struct WikiQuery {
    #[serde(default)]
    search: Vec<WikiHit>,
}

#[derive(Deserialize)]
struct WikiHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

fn tag_stripper() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("tag regex is valid"))
}

#[async_trait]
impl SearchProvider for WikipediaClient {
    fn name(&self) -> &str {
        "wikipedia"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<String, String> {
        let url = format!(
            "{}/w/api.php?action=query&list=search&srsearch={}&srlimit={}&format=json",
            self.base_url,
            urlencoding::encode(query),
            max_results
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("Wikipedia request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Wikipedia request failed: {}", response.status()));
        }

        let parsed: WikiResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to decode Wikipedia response: {}", e))?;

        let hits = parsed.query.map(|q| q.search).unwrap_or_default();
        let lines: Vec<String> = hits
            .iter()
            .map(|hit| {
                let snippet = tag_stripper().replace_all(&hit.snippet, "");
                format!("{}: {}", hit.title, snippet)
            })
            .collect();
        Ok(lines.join("\n"))
    }
}

/// Fetch a URL and return its textual content, capped to keep prompts sane.
pub async fn fetch_url(client: &Client, url: &str) -> Result<String, String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| format!("Failed to fetch '{}': {}", url, e))?;

    if !response.status().is_success() {
        return Err(format!("Failed to fetch '{}': {}", url, response.status()));
    }

    let mut text = response
        .text()
        .await
        .map_err(|e| format!("Failed to read body of '{}': {}", url, e))?;
    if text.len() > FETCH_CAP {
        let mut cut = FETCH_CAP;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    Ok(text)
}
