//! Shared health state for the /health endpoint.
//! Updated by startup, the catalog handlers and the ActionLogger.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Shared health metrics. Updated by service components, read by API.
#[derive(Default)]
pub struct HealthState {
    /// True once the asset source has delivered the catalog.
    pub catalog_loaded: AtomicBool,
    /// Number of market intents consumed by the ActionLogger.
    pub actions_logged: AtomicU64,
    /// Number of pipeline runs served.
    pub queries_served: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_catalog_loaded(&self, v: bool) {
        self.catalog_loaded.store(v, Ordering::Relaxed);
    }

    pub fn inc_actions_logged(&self) {
        self.actions_logged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_queries_served(&self) {
        self.queries_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn catalog_loaded(&self) -> bool {
        self.catalog_loaded.load(Ordering::Relaxed)
    }

    pub fn actions_logged(&self) -> u64 {
        self.actions_logged.load(Ordering::Relaxed)
    }

    pub fn queries_served(&self) -> u64 {
        self.queries_served.load(Ordering::Relaxed)
    }
}
