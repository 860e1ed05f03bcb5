//! Static extraction strategies: one HTTP GET, fixed pattern parsing.
//!
//! Not a browser — these recipes work on sites that embed their media
//! metadata in the initial HTML. Two recipe families exist: inline
//! `html5player` setter calls (regex) and JSON-LD `VideoObject` blocks
//! (scraper + serde_json).

use crate::engine::chromium::USER_AGENT;
use crate::model::{ExtractionResult, Quality, UNTITLED};
use anyhow::{bail, Context, Result};
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

/// Timeout for one static fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Plain HTTP client used by the static strategies.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Client with a realistic browser user-agent and bounded timeout.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// GET a page body as text. Non-2xx is a hard failure.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("GET {url} returned status {status}");
        }
        resp.text().await.context("failed to read response body")
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract via inline `html5player` setter calls in a page script.
pub async fn player_script(client: &HttpClient, page_url: &str) -> Result<ExtractionResult> {
    debug!("using player-script strategy for {page_url}");
    let body = client.get_text(page_url).await?;
    Ok(parse_player_script(&body))
}

/// Extract via a JSON-LD `VideoObject` block in the page head.
pub async fn json_ld(client: &HttpClient, page_url: &str) -> Result<ExtractionResult> {
    debug!("using JSON-LD strategy for {page_url}");
    let body = client.get_text(page_url).await?;
    parse_json_ld(&body)
}

fn player_script_regexes() -> &'static (Regex, Regex, Regex) {
    static REGEXES: OnceLock<(Regex, Regex, Regex)> = OnceLock::new();
    REGEXES.get_or_init(|| {
        (
            Regex::new(r"html5player\.setVideoTitle\('(.+?)'\);").expect("title regex is valid"),
            Regex::new(r"html5player\.setVideoUrlPoster\('(.+?)'\);")
                .expect("poster regex is valid"),
            Regex::new(r"html5player\.setVideoHLS\('(.+?)'\);").expect("hls regex is valid"),
        )
    })
}

/// Pull title, poster, and HLS playlist out of inline player setup code.
///
/// Missing fields degrade: title falls back to the sentinel, poster to
/// none, and a missing playlist yields empty qualities (the dispatch
/// boundary treats that as failure).
fn parse_player_script(body: &str) -> ExtractionResult {
    let (title_re, poster_re, hls_re) = player_script_regexes();

    let capture = |re: &Regex| {
        re.captures(body)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    };

    let title = capture(title_re).unwrap_or_else(|| UNTITLED.to_string());
    let thumbnail = capture(poster_re);
    let qualities = capture(hls_re)
        .map(|url| {
            vec![Quality {
                label: "HLS Playlist".to_string(),
                url,
            }]
        })
        .unwrap_or_default();

    ExtractionResult {
        title,
        qualities,
        thumbnail,
    }
}

/// Parse the first JSON-LD block carrying a video object.
///
/// A page without any parsable JSON-LD is a hard failure; a block
/// without `contentUrl` yields empty qualities.
fn parse_json_ld(body: &str) -> Result<ExtractionResult> {
    let document = Html::parse_document(body);
    let sel = Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid selector");

    for element in document.select(&sel) {
        let text = element.inner_html();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        let Ok(value) = serde_json::from_str::<Value>(text) else {
            continue;
        };
        if let Some(video) = find_video_object(&value) {
            return Ok(result_from_video_object(video));
        }
    }

    bail!("could not find video JSON-LD data in the page")
}

/// Locate a video-bearing object, descending into `@graph` arrays.
fn find_video_object(value: &Value) -> Option<&Value> {
    if let Some(graph) = value.get("@graph").and_then(|g| g.as_array()) {
        return graph.iter().find_map(find_video_object);
    }
    let is_video = value.get("@type").and_then(|t| t.as_str()) == Some("VideoObject")
        || value.get("contentUrl").is_some();
    if is_video && value.is_object() {
        Some(value)
    } else {
        None
    }
}

fn result_from_video_object(video: &Value) -> ExtractionResult {
    let get = |key: &str| {
        video
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    };

    let title = get("name").unwrap_or_else(|| UNTITLED.to_string());
    let thumbnail = get("thumbnailUrl");
    let qualities = get("contentUrl")
        .filter(|u| !u.is_empty())
        .map(|url| {
            vec![Quality {
                label: "HLS Playlist".to_string(),
                url,
            }]
        })
        .unwrap_or_default();

    ExtractionResult {
        title,
        qualities,
        thumbnail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PLAYER_FIXTURE: &str = r#"<html><body><script>
        html5player.setVideoTitle('Sunset Over Water');
        html5player.setVideoUrlPoster('https://img.example/poster.jpg');
        html5player.setVideoHLS('https://cdn.example/hls/master.m3u8');
    </script></body></html>"#;

    const JSONLD_FIXTURE: &str = r#"<html><head>
        <script type="application/ld+json">{
            "@type": "VideoObject",
            "name": "Mountain Timelapse",
            "thumbnailUrl": "https://img.example/thumb.jpg",
            "contentUrl": "https://cdn.example/video/master.m3u8"
        }</script>
    </head><body></body></html>"#;

    #[test]
    fn test_player_script_full_page() {
        let r = parse_player_script(PLAYER_FIXTURE);
        assert_eq!(r.title, "Sunset Over Water");
        assert_eq!(r.thumbnail.as_deref(), Some("https://img.example/poster.jpg"));
        assert_eq!(r.qualities.len(), 1);
        assert_eq!(r.qualities[0].label, "HLS Playlist");
        assert_eq!(r.qualities[0].url, "https://cdn.example/hls/master.m3u8");
    }

    #[test]
    fn test_player_script_missing_patterns_falls_back() {
        let r = parse_player_script("<html><body>nothing here</body></html>");
        assert_eq!(r.title, UNTITLED);
        assert!(r.thumbnail.is_none());
        assert!(r.qualities.is_empty());
    }

    #[test]
    fn test_json_ld_content_url_becomes_hls_playlist() {
        let r = parse_json_ld(JSONLD_FIXTURE).unwrap();
        assert_eq!(r.title, "Mountain Timelapse");
        assert_eq!(
            r.qualities,
            vec![Quality {
                label: "HLS Playlist".to_string(),
                url: "https://cdn.example/video/master.m3u8".to_string(),
            }]
        );
    }

    #[test]
    fn test_json_ld_inside_graph_array() {
        let body = r#"<script type="application/ld+json">{
            "@graph": [
                {"@type": "WebPage", "name": "wrapper"},
                {"@type": "VideoObject", "name": "Inner", "contentUrl": "https://c.example/x.m3u8"}
            ]
        }</script>"#;
        let r = parse_json_ld(body).unwrap();
        assert_eq!(r.title, "Inner");
        assert_eq!(r.qualities[0].url, "https://c.example/x.m3u8");
    }

    #[test]
    fn test_json_ld_without_content_url_yields_empty_qualities() {
        let body = r#"<script type="application/ld+json">
            {"@type": "VideoObject", "name": "No Stream", "contentUrl": ""}
        </script>"#;
        let r = parse_json_ld(body).unwrap();
        assert_eq!(r.title, "No Stream");
        assert!(r.qualities.is_empty());
    }

    #[test]
    fn test_json_ld_absent_is_hard_failure() {
        assert!(parse_json_ld("<html><body></body></html>").is_err());
    }

    #[tokio::test]
    async fn test_fetch_and_parse_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/video/123"))
            .respond_with(ResponseTemplate::new(200).set_body_string(JSONLD_FIXTURE))
            .mount(&server)
            .await;

        let client = HttpClient::new();
        let r = json_ld(&client, &format!("{}/video/123", server.uri()))
            .await
            .unwrap();
        assert_eq!(r.title, "Mountain Timelapse");
    }

    #[tokio::test]
    async fn test_non_2xx_is_hard_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = HttpClient::new();
        let err = player_script(&client, &server.uri()).await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}
