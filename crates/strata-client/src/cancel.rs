//! Cooperative cancellation threaded through every command.
//!
//! The controller checks the token before dispatching each batch chunk; the
//! command runner is responsible for aborting in-flight network I/O when the
//! token trips mid-request.

use tokio::sync::watch;

/// Owner side of a cancellation signal.
#[derive(Debug)]
pub struct CancellationSource {
    tx: watch::Sender<bool>,
}

impl CancellationSource {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Hand out a token observing this source.
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            rx: Some(self.tx.subscribe()),
        }
    }

    /// Trip the signal. Idempotent, and latches even while no token is
    /// alive, so tokens handed out later still observe it.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side of a cancellation signal.
#[derive(Clone, Debug)]
pub struct CancellationToken {
    rx: Option<watch::Receiver<bool>>,
}

impl CancellationToken {
    /// A token that never trips, for callers without a cancellation story.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Resolves once cancellation is requested; pends forever on a `never()`
    /// token or after the source is dropped without cancelling.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }
}
