//! Splash gate: show the intro screen at most once per session.

use std::sync::Arc;

use agripulse_core::SessionStore;

/// Default session-marker key.
pub const SPLASH_MARKER_KEY: &str = "agripulse_splash_shown";

/// Reads and writes the "splash already shown" marker.
#[derive(Clone)]
pub struct SplashGate {
    store: Arc<dyn SessionStore>,
    key: String,
}

impl std::fmt::Debug for SplashGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplashGate").field("key", &self.key).finish()
    }
}

impl SplashGate {
    pub fn new(store: Arc<dyn SessionStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Whether the splash should be shown, i.e. the marker is not set.
    ///
    /// A store that cannot be read counts as "not shown".
    pub fn should_show(&self) -> bool {
        match self.store.get(&self.key) {
            Ok(Some(true)) => false,
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, key = %self.key, "Failed to read splash marker");
                true
            }
        }
    }

    /// Mark the splash as shown. Store failures are logged and ignored.
    pub fn dismiss(&self) {
        if let Err(e) = self.store.set(&self.key, true) {
            tracing::warn!(error = %e, key = %self.key, "Failed to write splash marker");
        }
    }
}
