//! The dispatch boundary: URL in, normalized result or classified
//! error out.
//!
//! Owns the shared resources every strategy needs — the browser engine
//! lease and the plain HTTP client — so nothing lives in module-level
//! globals.

use crate::engine::lease::EngineLease;
use crate::error::ExtractError;
use crate::extract::intercept::{self, InterceptConfig};
use crate::extract::static_html::{self, HttpClient};
use crate::model::ExtractionResult;
use crate::registry::{self, Strategy};
use tracing::info;
use url::Url;

/// Resolves a URL to a strategy and runs it.
pub struct Extractor {
    lease: EngineLease,
    http: HttpClient,
    intercept: InterceptConfig,
}

impl Extractor {
    pub fn new() -> Self {
        Self {
            lease: EngineLease::new(),
            http: HttpClient::new(),
            intercept: InterceptConfig::default(),
        }
    }

    /// Build with explicit parts (tests inject a scripted engine here).
    pub fn with_parts(lease: EngineLease, http: HttpClient, intercept: InterceptConfig) -> Self {
        Self {
            lease,
            http,
            intercept,
        }
    }

    /// Resolve, extract, validate.
    ///
    /// Every fault a strategy can raise leaves here as one of the
    /// [`ExtractError`] kinds — nothing propagates unclassified.
    pub async fn handle(&self, raw_url: &str) -> Result<ExtractionResult, ExtractError> {
        let url = Url::parse(raw_url).map_err(|_| ExtractError::InvalidInput)?;
        let host = registry::site_identity(&url).ok_or(ExtractError::InvalidInput)?;

        let strategy =
            registry::strategy_for(&host).ok_or(ExtractError::UnsupportedSite(host.clone()))?;

        self.run(strategy, raw_url, &host).await
    }

    /// Run one resolved strategy and validate its output.
    async fn run(
        &self,
        strategy: Strategy,
        raw_url: &str,
        host: &str,
    ) -> Result<ExtractionResult, ExtractError> {
        let result = match strategy {
            Strategy::PlayerScript => static_html::player_script(&self.http, raw_url)
                .await
                .map_err(ExtractError::from)?,
            Strategy::JsonLd => static_html::json_ld(&self.http, raw_url)
                .await
                .map_err(ExtractError::from)?,
            Strategy::Intercept => {
                let engine = self.lease.acquire().await.map_err(ExtractError::from)?;
                intercept::extract(&*engine, raw_url, &self.intercept).await?
            }
        };

        // A strategy that finishes without qualities still failed.
        if !result.has_qualities() {
            return Err(ExtractError::NoQualitiesFound);
        }

        info!("scraped '{}' from {host} via {strategy:?}", result.title);
        Ok(result)
    }

    /// Whether the browser engine is currently running, and how many
    /// sessions it has open.
    pub async fn engine_status(&self) -> (bool, usize) {
        match self.lease.peek().await {
            Some(engine) => (engine.is_connected(), engine.active_sessions()),
            None => (false, 0),
        }
    }

    /// Release the shared engine. Called once at process shutdown.
    pub async fn shutdown(&self) {
        self.lease.release().await;
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}
