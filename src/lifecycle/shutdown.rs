//! Shutdown broadcast shared by the server, the reload task and the SIGHUP
//! listener.

use std::future::Future;

use tokio::sync::broadcast;

/// Cloneable handle; every clone triggers the same broadcast.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Tell every subscriber to stop. A no-op when nobody is listening.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Trigger once `signal` resolves, from a background task.
    pub fn trigger_on<F>(&self, signal: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = self.clone();
        tokio::spawn(async move {
            signal.await;
            handle.trigger();
        });
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_trigger_reaches_all_subscribers() {
        let shutdown = Shutdown::new();
        let mut server = shutdown.subscribe();
        let mut reloader = shutdown.clone().subscribe();

        shutdown.trigger();
        assert!(server.recv().await.is_ok());
        assert!(reloader.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_trigger_on_waits_for_signal() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        let (signal_tx, signal_rx) = oneshot::channel::<()>();

        shutdown.trigger_on(async move {
            let _ = signal_rx.await;
        });
        assert!(rx.try_recv().is_err());

        signal_tx.send(()).unwrap();
        assert!(rx.recv().await.is_ok());
    }
}
