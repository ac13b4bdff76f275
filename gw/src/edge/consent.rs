//! Consent latch and the stdin watcher
//!
//! The kiosk's consent control is a key wired to the edge device's console.
//! The watcher latches presses; the control loop is the only consumer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

/// One-bit press latch, single writer (the watcher) single consumer (the loop)
#[derive(Debug, Default)]
pub struct ConsentLatch {
    pressed: AtomicBool,
}

impl ConsentLatch {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn press(&self) {
        self.pressed.store(true, Ordering::SeqCst);
    }

    /// Consume a pending press, if any
    pub fn take(&self) -> bool {
        self.pressed.swap(false, Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.pressed.store(false, Ordering::SeqCst);
    }
}

/// Watch stdin for the consent key; every line latches one press
pub async fn watch_stdin(latch: Arc<ConsentLatch>) {
    info!("consent watcher ready, press Enter to consent");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(_)) = lines.next_line().await {
        debug!("consent press latched");
        latch.press();
    }
    warn!("stdin closed, consent watcher exiting");
}
