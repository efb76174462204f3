//! Collaborators whose timing the test controls.

use async_trait::async_trait;
use sc_core::collaborators::base::Narrator;
use sc_core::error::StageError;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Narrator that blocks every call until the test releases it.
#[allow(dead_code)]
#[derive(Default)]
pub struct GatedNarrator {
    entered: Notify,
    release: Notify,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl GatedNarrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until a call is blocked inside the narrator.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let one blocked call finish.
    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Narrator for GatedNarrator {
    async fn narrate(&self, text: &str, _language: &str) -> Result<String, StageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(format!("Narration: {text}"))
    }
}
