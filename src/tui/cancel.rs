use log::debug;
use tokio::sync::watch;

/// Observes an external request to cancel a running prompt.
///
/// Clone it freely; every clone sees the same cancellation.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    receiver: watch::Receiver<bool>,
}

/// Handle to trigger cancellation
#[derive(Debug)]
pub struct CancellationHandle {
    sender: watch::Sender<bool>,
}

impl CancellationToken {
    /// Create a new cancellation token and its handle
    pub fn new() -> (Self, CancellationHandle) {
        let (tx, rx) = watch::channel(false);
        (Self { receiver: rx }, CancellationHandle { sender: tx })
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once cancellation is requested.
    ///
    /// If the handle is dropped without cancelling, this never resolves.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        while !*receiver.borrow_and_update() {
            if receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl CancellationHandle {
    /// Signal cancellation to all associated tokens
    pub fn cancel(&self) {
        debug!("Prompt cancellation requested");
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Duration, sleep, timeout};

    #[tokio::test]
    async fn test_cancellation_token_basic() {
        let (token, handle) = CancellationToken::new();
        assert!(!token.is_cancelled());

        handle.cancel();

        assert!(token.is_cancelled());
        let result = timeout(Duration::from_millis(100), token.cancelled()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_clones_share_cancellation() {
        let (token, handle) = CancellationToken::new();
        let other = token.clone();

        handle.cancel();

        assert!(other.is_cancelled());
        let result = timeout(Duration::from_millis(100), other.cancelled()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_cancellation_token_async_wait() {
        let (token, handle) = CancellationToken::new();

        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            handle.cancel();
        });

        token.cancelled().await;
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropped_handle_never_cancels() {
        let (token, handle) = CancellationToken::new();
        drop(handle);

        let result = timeout(Duration::from_millis(50), token.cancelled()).await;
        assert!(result.is_err());
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_cancelled_resolves_under_block_on() {
        let (token, handle) = CancellationToken::new();
        handle.cancel();
        tokio_test::block_on(token.cancelled());
        assert!(handle.is_cancelled());
    }
}
