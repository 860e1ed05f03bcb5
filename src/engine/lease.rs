//! Lazy, single-flight ownership of the shared browser engine.
//!
//! The engine process is heavyweight, so it is only launched when the
//! first interception request needs it and then shared by every
//! concurrent extraction. Cold-start acquisition is serialized behind a
//! write lock so concurrent callers never launch two engine processes;
//! once the handle exists, acquisition is a read-lock clone.

use super::chromium::ChromiumEngine;
use super::MediaEngine;
use anyhow::Result;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

type Launcher = Box<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn MediaEngine>>> + Send + Sync>;

/// Owns the process-wide browser engine handle.
pub struct EngineLease {
    slot: RwLock<Option<Arc<dyn MediaEngine>>>,
    launcher: Launcher,
}

impl EngineLease {
    /// A lease that launches headless Chromium on first acquire.
    pub fn new() -> Self {
        Self::with_launcher(Box::new(|| {
            Box::pin(async {
                let engine = ChromiumEngine::launch().await?;
                Ok(Arc::new(engine) as Arc<dyn MediaEngine>)
            })
        }))
    }

    /// A lease with a custom launch path (used by tests).
    pub fn with_launcher(launcher: Launcher) -> Self {
        Self {
            slot: RwLock::new(None),
            launcher,
        }
    }

    /// Get the live engine handle, launching it if necessary.
    ///
    /// Idempotent: a connected handle is returned as-is. A failed launch
    /// leaves the slot empty so a later call can retry.
    pub async fn acquire(&self) -> Result<Arc<dyn MediaEngine>> {
        {
            let slot = self.slot.read().await;
            if let Some(engine) = slot.as_ref() {
                if engine.is_connected() {
                    return Ok(Arc::clone(engine));
                }
            }
        }

        // Cold start (or reconnect): the write lock is held across the
        // launch so concurrent callers wait for this one instead of
        // spawning their own engine process.
        let mut slot = self.slot.write().await;
        if let Some(engine) = slot.as_ref() {
            if engine.is_connected() {
                return Ok(Arc::clone(engine));
            }
        }

        info!("launching browser engine");
        let engine = (self.launcher)().await?;
        *slot = Some(Arc::clone(&engine));
        info!("browser engine running");
        Ok(engine)
    }

    /// The current handle, if one is live. Never launches.
    pub async fn peek(&self) -> Option<Arc<dyn MediaEngine>> {
        self.slot.read().await.clone()
    }

    /// Shut down the engine if it was ever launched. Safe to call when
    /// nothing was acquired.
    pub async fn release(&self) {
        let mut slot = self.slot.write().await;
        if let Some(engine) = slot.take() {
            if let Err(e) = engine.shutdown().await {
                warn!("engine shutdown failed: {e:#}");
            } else {
                info!("browser engine shut down");
            }
        }
    }
}

impl Default for EngineLease {
    fn default() -> Self {
        Self::new()
    }
}
