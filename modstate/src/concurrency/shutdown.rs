use tokio::sync::watch;

/// Sending half of the shutdown channel.
///
/// Shutdown is only observed between chunks: a chunk that already started runs to completion so
/// that the persisted cursor always points at a chunk boundary.
#[derive(Debug, Clone)]
pub struct ShutdownTx(watch::Sender<()>);

impl ShutdownTx {
    /// Asks every subscribed receiver to stop.
    pub fn shutdown(&self) -> Result<(), watch::error::SendError<()>> {
        self.0.send(())
    }

    pub fn subscribe(&self) -> ShutdownRx {
        self.0.subscribe()
    }
}

pub type ShutdownRx = watch::Receiver<()>;

/// Returns whether a shutdown was requested on `rx`.
///
/// A dropped sender is not a shutdown request, the batch keeps going.
pub fn is_shutdown_requested(rx: &ShutdownRx) -> bool {
    rx.has_changed().unwrap_or(false)
}

pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, rx) = watch::channel(());
    (ShutdownTx(tx), rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_is_observed_by_subscribers() {
        let (tx, rx) = create_shutdown_channel();
        let late_rx = tx.subscribe();

        assert!(!is_shutdown_requested(&rx));
        tx.shutdown().unwrap();
        assert!(is_shutdown_requested(&rx));
        assert!(is_shutdown_requested(&late_rx));
    }

    #[test]
    fn dropped_sender_is_not_a_shutdown() {
        let (tx, rx) = create_shutdown_channel();
        drop(tx);

        assert!(!is_shutdown_requested(&rx));
    }
}
