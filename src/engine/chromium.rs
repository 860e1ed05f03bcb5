//! Chromium-based engine using chromiumoxide.

use super::{EngineSession, MediaEngine, NetworkExchange};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::network::EventResponseReceived;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::page::Page;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// User-agent presented by every session.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. QUARRY_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("QUARRY_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.quarry/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".quarry/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".quarry/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".quarry/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".quarry/chromium/chrome-linux64/chrome"),
                home.join(".quarry/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH
    if let Ok(path) = which::which("google-chrome") {
        return Some(path);
    }
    if let Ok(path) = which::which("chromium") {
        return Some(path);
    }
    if let Ok(path) = which::which("chromium-browser") {
        return Some(path);
    }

    // 4. Common macOS locations
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium-based media engine.
pub struct ChromiumEngine {
    browser: Arc<Browser>,
    /// Cleared by the handler task when the CDP connection drops.
    alive: Arc<AtomicBool>,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumEngine {
    /// Launch a headless Chromium instance.
    pub async fn launch() -> Result<Self> {
        let chrome_path = find_chromium()
            .context("Chromium not found. Set QUARRY_CHROMIUM_PATH or install google-chrome.")?;

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--autoplay-policy=no-user-gesture-required")
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        // Spawn the CDP handler task. Its stream ends when the Chromium
        // process dies or the websocket drops, so stream exhaustion is
        // the disconnect signal.
        let alive = Arc::new(AtomicBool::new(true));
        let handler_alive = Arc::clone(&alive);
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
            handler_alive.store(false, Ordering::SeqCst);
        });

        Ok(Self {
            browser: Arc::new(browser),
            alive,
            active_count: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Open a session inside a dedicated browser context, so concurrent
    /// extractions share no cookies, cache, or observer state.
    async fn create_session(&self) -> Result<ChromiumSession> {
        let context = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await
            .context("failed to create browser context")?;
        let context_id = context.result.browser_context_id.clone();

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build target params: {e}"))?;
        let page = self
            .browser
            .new_page(target)
            .await
            .context("failed to create new page")?;

        page.set_user_agent(USER_AGENT)
            .await
            .context("failed to set user-agent")?;

        self.active_count.fetch_add(1, Ordering::Relaxed);

        Ok(ChromiumSession {
            page,
            browser: Arc::clone(&self.browser),
            context_id,
            active_count: Arc::clone(&self.active_count),
        })
    }
}

#[async_trait]
impl MediaEngine for ChromiumEngine {
    async fn new_session(&self) -> Result<Box<dyn EngineSession>> {
        Ok(Box::new(self.create_session().await?))
    }

    fn is_connected(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn active_sessions(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }

    async fn shutdown(&self) -> Result<()> {
        // Browser process exits when the Browser handle is dropped
        Ok(())
    }
}

/// One Chromium page inside its own browser context.
pub struct ChromiumSession {
    page: Page,
    browser: Arc<Browser>,
    context_id: BrowserContextId,
    active_count: Arc<AtomicUsize>,
}

#[async_trait]
impl EngineSession for ChromiumSession {
    async fn network_events(&self) -> Result<BoxStream<'static, NetworkExchange>> {
        let events = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .context("failed to subscribe to network events")?;

        let stream = events.map(|ev| NetworkExchange {
            url: ev.response.url.clone(),
            content_type: ev.response.mime_type.to_lowercase(),
            content_length: content_length_of(ev.response.headers.inner()),
        });

        Ok(stream.boxed())
    }

    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| anyhow::anyhow!("navigation failed: {e}"))?;
        // Wait until the page reaches its load milestone
        let _ = self.page.wait_for_navigation().await;
        Ok(())
    }

    async fn title(&self) -> Result<Option<String>> {
        self.page.get_title().await.context("failed to get title")
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.page
            .find_element(selector)
            .await
            .map_err(|e| anyhow::anyhow!("element '{selector}' not found: {e}"))?
            .click()
            .await
            .map_err(|e| anyhow::anyhow!("click on '{selector}' failed: {e}"))?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        let _ = self.page.close().await;
        // Disposing the context drops its cookies and cache with it
        let _ = self
            .browser
            .execute(DisposeBrowserContextParams {
                browser_context_id: self.context_id,
            })
            .await;
        Ok(())
    }
}

/// Read a content-length out of CDP response headers.
///
/// CDP delivers headers as a JSON object with original header casing;
/// values are strings, but proxies occasionally produce bare numbers.
fn content_length_of(headers: &serde_json::Value) -> Option<u64> {
    let value = headers
        .get("content-length")
        .or_else(|| headers.get("Content-Length"))?;
    match value {
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Number(n) => n.as_u64(),
        _ => None,
    }
}
