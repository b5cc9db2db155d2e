use std::sync::Arc;

use tokio::sync::watch;

use crate::config::{RequestConfig, Timeout};

pub const NOT_ABORTABLE: &str = "This request cannot be aborted because the [timeout] property was already being used.";

/// One shot cancellation source. It is created unresolved and only [`Deferred::resolve`] resolves it.
#[derive(Debug, Clone)]
pub struct Deferred {
    sender: Arc<watch::Sender<bool>>,
}
impl Default for Deferred {
    fn default() -> Self {
        let (tx, _) = watch::channel(false);
        Self { sender: Arc::new(tx) }
    }
}
impl Deferred {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn signal(&self) -> CancelSignal {
        CancelSignal { receiver: self.sender.subscribe() }
    }

    pub fn resolve(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_resolved(&self) -> bool {
        *self.sender.borrow()
    }
}

/// Awaitable half of a [`Deferred`].
#[derive(Debug, Clone)]
pub struct CancelSignal {
    receiver: watch::Receiver<bool>,
}
impl CancelSignal {
    /// Completes once the [`Deferred`] is resolved. Never completes when every [`Deferred`] is dropped unresolved.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        let resolved = receiver.wait_for(|cancelled| *cancelled).await.is_ok();
        if !resolved {
            std::future::pending::<()>().await
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// Handle that cancels an in-flight request.
///
/// It owns its [`Deferred`], so a copy detached from the pending request keeps working. Aborting a request that
/// has already settled has no effect.
#[derive(Debug, Clone, Default)]
pub struct Abort {
    deferred: Option<Deferred>,
}
impl Abort {
    /// Install a cancellation token into the timeout slot of `config`. When the slot is already occupied the
    /// returned handle cannot abort anything.
    pub fn hook(config: &mut RequestConfig) -> Self {
        if config.timeout.is_some() {
            return Self::noop();
        }

        let deferred = Deferred::new();
        config.timeout = Some(Timeout::Signal(deferred.signal()));
        Self { deferred: Some(deferred) }
    }

    pub fn noop() -> Self {
        Self { deferred: None }
    }

    pub fn abort(&self) {
        match &self.deferred {
            Some(deferred) => {
                tracing::debug!("abort request");
                deferred.resolve()
            }
            None => tracing::warn!("{}", NOT_ABORTABLE),
        }
    }

    pub fn deferred(&self) -> Option<&Deferred> {
        self.deferred.as_ref()
    }

    pub fn is_abortable(&self) -> bool {
        self.deferred.is_some()
    }
}
