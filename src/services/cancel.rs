use std::sync::Arc;
use tokio::sync::watch;

/// External cancellation signal for a running batch.
///
/// Once raised it stays raised. Cloning shares the same signal.
#[derive(Clone)]
pub struct CancellationSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the signal has been raised.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns once raised.
        let _ = rx.wait_for(|raised| *raised).await;
    }
}
