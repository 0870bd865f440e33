//! Shutdown signalling.
//!
//! A [`ShutdownTrigger`] flips a shared flag once; every cloned [`Shutdown`]
//! handle observes it. OS signals (SIGINT, SIGTERM) are wired to the trigger
//! by [`listen_for_signals`].

use std::future;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::Result;

/// Create a connected trigger/handle pair.
pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

/// Sending half: requests shutdown.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Request shutdown. Returns `true` only for the first request.
    pub fn trigger(&self) -> bool {
        self.tx.send_if_modified(|requested| {
            if *requested {
                false
            } else {
                *requested = true;
                true
            }
        })
    }
}

/// Receiving half: observed by the polling loop.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// A handle whose trigger is already gone, so it never fires.
    pub fn never() -> Self {
        channel().1
    }

    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until shutdown is requested.
    ///
    /// If every trigger is dropped without firing, this never resolves.
    pub async fn requested(&mut self) {
        let observed = self.rx.wait_for(|requested| *requested).await.map(|_| ());
        if observed.is_err() {
            future::pending::<()>().await;
        }
    }
}

/// Spawn a task that fires `trigger` on SIGINT or SIGTERM.
///
/// Repeated signals are ignored after the first.
pub fn listen_for_signals(trigger: ShutdownTrigger) -> Result<JoinHandle<()>> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;

        Ok(tokio::spawn(async move {
            loop {
                let name = tokio::select! {
                    _ = interrupt.recv() => "SIGINT",
                    _ = terminate.recv() => "SIGTERM",
                };
                if trigger.trigger() {
                    log::info!("{} received, shutting down...", name);
                } else {
                    log::debug!("{} received again, shutdown already in progress", name);
                }
            }
        }))
    }

    #[cfg(not(unix))]
    {
        Ok(tokio::spawn(async move {
            loop {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                if trigger.trigger() {
                    log::info!("Ctrl-C received, shutting down...");
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_trigger_fires_once() {
        let (trigger, shutdown) = channel();
        assert!(!shutdown.is_requested());
        assert!(trigger.trigger());
        assert!(!trigger.trigger());
        assert!(shutdown.is_requested());
    }

    #[tokio::test]
    async fn test_requested_resolves_after_trigger() {
        let (trigger, mut shutdown) = channel();
        let waiter = tokio::spawn(async move { shutdown.requested().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        trigger.trigger();

        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("shutdown not observed")
            .unwrap();
    }

    #[tokio::test]
    async fn test_never_handle_stays_pending() {
        let mut shutdown = Shutdown::never();
        assert!(!shutdown.is_requested());
        let waited =
            tokio::time::timeout(Duration::from_millis(50), shutdown.requested()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_requested_resolves_when_already_triggered() {
        let (trigger, mut shutdown) = channel();
        trigger.trigger();
        tokio::time::timeout(Duration::from_secs(1), shutdown.requested())
            .await
            .expect("already-triggered shutdown not observed");
    }
}
