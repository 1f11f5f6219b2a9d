//! Shutdown coordination.

use std::sync::Arc;

use tokio::sync::watch;

/// Coordinator for graceful shutdown.
///
/// Long-running tasks [`wait`](Self::wait) and stop when
/// [`trigger`](Self::trigger) fires. A wait that starts after the trigger
/// returns at once.
#[derive(Debug, Clone)]
pub struct Shutdown {
    fired: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (fired, _) = watch::channel(false);
        Self {
            fired: Arc::new(fired),
        }
    }

    /// Resolve once shutdown has been triggered.
    pub async fn wait(&self) {
        let mut rx = self.fired.subscribe();
        // Err means the sender is gone, which only happens after drop.
        let _ = rx.wait_for(|fired| *fired).await;
    }

    pub fn trigger(&self) {
        self.fired.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.fired.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
