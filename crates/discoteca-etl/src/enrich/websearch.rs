//! Web search genre heuristic.
//!
//! Queries DuckDuckGo's HTML endpoint (no key needed) with phrases such as
//! "<artist> <title> genre" and scans the result page for the first genre
//! keyword.

use std::time::Duration;

use reqwest::Client;

use crate::enrich::http_client;
use crate::error::{EnrichError, EnrichResult};
use crate::resolve::keywords::KeywordTable;

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";
const SOURCE_NAME: &str = "web search";

// The HTML endpoint serves an empty page to unknown agents.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Web search client.
#[derive(Debug, Clone)]
pub struct WebSearchClient {
    http: Client,
}

impl WebSearchClient {
    pub fn new() -> EnrichResult<Self> {
        Ok(Self {
            http: http_client(BROWSER_USER_AGENT, Duration::from_secs(10))?,
        })
    }

    /// Fetch the lowercased result page for a query.
    pub async fn search(&self, query: &str) -> EnrichResult<String> {
        let body = self
            .http
            .get(SEARCH_URL)
            .query(&[("q", query)])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| EnrichError::http(SOURCE_NAME, e))?
            .text()
            .await
            .map_err(|e| EnrichError::parse(SOURCE_NAME, e))?;
        Ok(body.to_lowercase())
    }

    /// Try each query in turn and return the first keyword match.
    ///
    /// A failed query is logged and the next one tried; the last error is
    /// returned only if every query failed.
    pub async fn find_genre(
        &self,
        queries: &[String],
        keywords: &KeywordTable,
    ) -> EnrichResult<Option<String>> {
        let mut last_error = None;
        let mut any_succeeded = false;

        for query in queries {
            match self.search(query).await {
                Ok(page) => {
                    any_succeeded = true;
                    if let Some(genre) = keywords.find(&strip_tags(&page)) {
                        return Ok(Some(genre.to_string()));
                    }
                }
                Err(e) => {
                    log::debug!("Web search for '{}' failed: {}", query, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !any_succeeded => Err(e),
            _ => Ok(None),
        }
    }
}

/// Search phrases for a song, most specific first.
pub fn queries(artist: Option<&str>, title: &str) -> Vec<String> {
    match artist {
        Some(artist) => vec![
            format!("{artist} {title} genre"),
            format!("{artist} {title} music genre"),
            format!("{artist} genre"),
        ],
        None => vec![format!("{title} song genre")],
    }
}

/// Drop markup so attribute values and class names never match.
fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queries() {
        let q = queries(Some("Deadmau5"), "Strobe");
        assert_eq!(q[0], "Deadmau5 Strobe genre");
        assert_eq!(q.len(), 3);

        let q = queries(None, "Strobe");
        assert_eq!(q, vec!["Strobe song genre".to_string()]);
    }

    #[test]
    fn test_strip_tags() {
        let html = r#"<div class="result house">Strobe is a <b>progressive house</b> track</div>"#;
        let text = strip_tags(html);
        assert!(!text.contains("class"));
        assert!(text.contains("progressive house"));
        assert_eq!(
            KeywordTable::new().find(&text),
            Some("Progressive House")
        );
    }
}
