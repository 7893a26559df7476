//! Cooperative shutdown

use tokio::sync::watch;

/// Handle for triggering shutdown
#[derive(Clone)]
pub struct ShutdownHandle {
    sender: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Create a new shutdown handle
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    /// Trigger shutdown
    ///
    /// Returns `true` only for the call that actually flipped the state.
    pub fn trigger(&self) -> bool {
        self.sender.send_if_modified(|triggered| {
            if *triggered {
                false
            } else {
                *triggered = true;
                true
            }
        })
    }

    /// Check if shutdown has been triggered
    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// Get a signal that can be handed to tasks
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.sender.subscribe(),
        }
    }

    /// Trigger shutdown when the process receives Ctrl-C
    ///
    /// Must be called from within a Tokio runtime.
    pub fn trigger_on_ctrl_c(&self) -> tokio::task::JoinHandle<()> {
        let handle = self.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Received Ctrl-C, shutting down");
                    handle.trigger();
                }
                Err(e) => tracing::warn!("Unable to listen for Ctrl-C: {}", e),
            }
        })
    }
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Signal for detecting shutdown (cloneable, can be passed to tasks)
#[derive(Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Check if shutdown has been triggered (non-blocking)
    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Wait for shutdown to be triggered
    ///
    /// Returns immediately if already triggered. If every handle is dropped
    /// without triggering, this never completes.
    pub async fn wait(&mut self) {
        if self.receiver.wait_for(|triggered| *triggered).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Future that completes when shutdown is triggered, for use in `select!`
    pub fn notified(&mut self) -> impl std::future::Future<Output = ()> + '_ {
        async move {
            self.wait().await;
        }
    }
}
