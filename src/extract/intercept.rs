//! The adaptive interception strategy.
//!
//! Drives a real browser session, watches every network response, pokes
//! the page to surface lazily-loaded media, then ranks what was
//! captured. This is the slow, heavyweight path — the registry only
//! routes a site here when no static recipe works.

use crate::engine::{EngineSession, MediaEngine, NetworkExchange};
use crate::error::ExtractError;
use crate::model::{rank_candidates, Candidate, ExtractionResult, UNTITLED};
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// URL markers that flag a response as probable media.
const MEDIA_EXTENSIONS: &[&str] = &[".m3u8", ".mp4", ".webm"];

/// Content-type markers that flag a response as probable media.
const MEDIA_TYPES: &[&str] = &["video", "mpegurl", "octet-stream"];

/// Tunable knobs for one interception run.
///
/// The selector list is configuration, not logic: its order encodes
/// which page affordances are tried first, and sites outside the
/// original target set may want a different priority.
#[derive(Debug, Clone)]
pub struct InterceptConfig {
    /// Hard bound on navigation; exceeding it is terminal.
    pub navigation_timeout: Duration,
    /// Wait after navigation/click for triggered network activity.
    pub settle_window: Duration,
    /// Per-selector bound for the interaction heuristic.
    pub click_timeout: Duration,
    /// Candidates at or below this size are tracking pixels, beacons,
    /// or thumbnails — drop them.
    pub min_candidate_size: u64,
    /// How many ranked qualities to return.
    pub max_qualities: usize,
    /// Click targets tried in order; first hit stops the heuristic.
    pub click_selectors: Vec<String>,
}

impl Default for InterceptConfig {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(90),
            settle_window: Duration::from_secs(15),
            click_timeout: Duration::from_secs(3),
            min_candidate_size: 100_000,
            max_qualities: 3,
            click_selectors: vec![
                // Explicit download buttons (e.g. stock-footage sites)
                "button[data-test-id='download-button-main']".to_string(),
                // Embedded player containers
                "div[id*='player']".to_string(),
                "div[class*='player']".to_string(),
                "video".to_string(),
            ],
        }
    }
}

/// Run the interception strategy against one page.
///
/// The session is closed on every exit path, success or failure, so
/// concurrent extractions never leak browser pages.
pub async fn extract(
    engine: &dyn MediaEngine,
    page_url: &str,
    config: &InterceptConfig,
) -> Result<ExtractionResult, ExtractError> {
    info!("using interception strategy for {page_url}");
    let mut session = engine
        .new_session()
        .await
        .map_err(|e| ExtractError::ExtractionFailed(format!("{e:#}")))?;

    let outcome = drive(&mut *session, page_url, config).await;

    if let Err(e) = session.close().await {
        debug!("session close failed: {e:#}");
    }
    outcome
}

async fn drive(
    session: &mut dyn EngineSession,
    page_url: &str,
    config: &InterceptConfig,
) -> Result<ExtractionResult, ExtractError> {
    // Subscribe before navigation so early network activity is not missed.
    let events = session
        .network_events()
        .await
        .map_err(|e| ExtractError::ExtractionFailed(format!("{e:#}")))?;

    let captured: Arc<Mutex<Vec<Candidate>>> = Arc::new(Mutex::new(Vec::new()));
    let collector = tokio::spawn(capture(events, Arc::clone(&captured), config.min_candidate_size));

    let nav = tokio::time::timeout(config.navigation_timeout, session.navigate(page_url)).await;
    match nav {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            collector.abort();
            return Err(ExtractError::ExtractionFailed(format!("{e:#}")));
        }
        Err(_) => {
            collector.abort();
            return Err(ExtractError::NavigationTimeout(
                config.navigation_timeout.as_millis() as u64,
            ));
        }
    }

    let title = session
        .title()
        .await
        .ok()
        .flatten()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    // Interaction heuristic: first selector that resolves gets clicked,
    // then we stop. Misses are expected site variability, not failures.
    for selector in &config.click_selectors {
        match tokio::time::timeout(config.click_timeout, session.click(selector)).await {
            Ok(Ok(())) => {
                info!("clicked element: {selector}");
                break;
            }
            Ok(Err(e)) => debug!("selector {selector} unusable: {e:#}"),
            Err(_) => debug!("selector {selector} timed out"),
        }
    }

    // Let any click-triggered (or merely delayed) requests land.
    debug!(
        "settling {}ms to capture media links",
        config.settle_window.as_millis()
    );
    tokio::time::sleep(config.settle_window).await;

    // Stop capture before draining — the buffer is never read while the
    // collector can still push into it.
    collector.abort();
    let _ = collector.await;
    let candidates = std::mem::take(&mut *captured.lock().await);

    if candidates.is_empty() {
        info!("no media candidates captured for {page_url}");
        return Ok(ExtractionResult {
            title,
            qualities: Vec::new(),
            thumbnail: None,
        });
    }

    let qualities = rank_candidates(candidates, config.max_qualities);
    Ok(ExtractionResult {
        title,
        qualities,
        thumbnail: None,
    })
}

/// Whether a network exchange plausibly carries playable media.
fn is_media_exchange(exchange: &NetworkExchange) -> bool {
    let by_url = MEDIA_EXTENSIONS.iter().any(|ext| exchange.url.contains(ext));
    let by_type = MEDIA_TYPES
        .iter()
        .any(|marker| exchange.content_type.contains(marker));
    by_url || by_type
}

/// Buffer media candidates from the event stream until aborted.
///
/// Duplicate URLs keep their largest observed size (ranged requests for
/// the same resource report different lengths).
async fn capture(
    mut events: BoxStream<'static, NetworkExchange>,
    sink: Arc<Mutex<Vec<Candidate>>>,
    min_size: u64,
) {
    while let Some(exchange) = events.next().await {
        if !is_media_exchange(&exchange) {
            continue;
        }
        let size = exchange.content_length.unwrap_or(0);
        if size <= min_size {
            debug!("discarding small candidate {} ({size} bytes)", exchange.url);
            continue;
        }
        info!(
            "intercepted media candidate: {} ({:.2} KB)",
            exchange.url,
            size as f64 / 1024.0
        );
        let mut sink = sink.lock().await;
        if let Some(existing) = sink.iter_mut().find(|c| c.url == exchange.url) {
            existing.size = existing.size.max(size);
        } else {
            sink.push(Candidate {
                url: exchange.url,
                size,
                content_type: exchange.content_type,
            });
        }
    }
}
