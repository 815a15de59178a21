//! A connected WebSocket client and its write half.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::SplitSink;
use futures::SinkExt;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;
use warp::ws::{Message, WebSocket};

use crate::error::TransportError;
use crate::protocol::Response;

/// Write half of a client connection.
///
/// Implemented for the warp WebSocket sink; tests provide in-memory sinks.
#[async_trait]
pub trait MessageSink: Send {
    /// Send one text frame
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), TransportError>;
}

#[async_trait]
impl MessageSink for SplitSink<WebSocket, Message> {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.send(Message::text(text)).await.map_err(TransportError::from)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        SinkExt::close(self).await.map_err(TransportError::from)
    }
}

/// A registered client.
///
/// Both the connection's own request loop and the broadcast engine write to
/// the same subscriber, so every write goes through one async mutex. Each
/// send, including the wait for that mutex, is bounded by `send_timeout`.
/// Closing flips a watch flag so the read loop can stop waiting on a peer
/// that will never speak again.
pub struct Subscriber {
    id: Uuid,
    remote: Option<SocketAddr>,
    sink: Mutex<Box<dyn MessageSink>>,
    closed: watch::Sender<bool>,
    send_timeout: Duration,
}

impl Subscriber {
    pub fn new(
        sink: impl MessageSink + 'static,
        remote: Option<SocketAddr>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            remote,
            sink: Mutex::new(Box::new(sink)),
            closed: watch::Sender::new(false),
            send_timeout,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn remote(&self) -> Option<SocketAddr> {
        self.remote
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves once [`close`](Self::close) has been called
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        // The sender lives in `self`, so this only ends on `true`.
        let _ = rx.wait_for(|closed| *closed).await;
    }

    /// Send a pre-encoded text frame
    pub async fn send_text(&self, text: String) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let send = async {
            let mut sink = self.sink.lock().await;
            // Re-check under the lock, close() may have won the race.
            if self.is_closed() {
                return Err(TransportError::Closed);
            }
            sink.send_text(text).await
        };

        match tokio::time::timeout(self.send_timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.send_timeout)),
        }
    }

    /// Encode and send a response envelope
    pub async fn send_response(&self, response: &Response) -> Result<(), TransportError> {
        let text = response.to_json()?;
        self.send_text(text).await
    }

    /// Mark the subscriber closed and close the socket.
    ///
    /// Only the first call touches the socket; later sends fail with
    /// [`TransportError::Closed`].
    pub async fn close(&self) {
        if self.closed.send_replace(true) {
            return;
        }
        let close = async {
            let mut sink = self.sink.lock().await;
            sink.close().await
        };
        if let Ok(Err(e)) = tokio::time::timeout(self.send_timeout, close).await {
            tracing::debug!(id = %self.id, error = %e, "error closing connection");
        }
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("remote", &self.remote)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory sinks shared by the crate's unit tests.

    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    /// Collects every frame; can be switched to fail or stall
    #[derive(Clone, Default)]
    pub struct MemorySink {
        pub frames: Arc<Mutex<Vec<String>>>,
        pub fail: Arc<AtomicBool>,
        pub stall: Arc<AtomicBool>,
        pub closed: Arc<AtomicBool>,
    }

    impl MemorySink {
        pub fn frames(&self) -> Vec<String> {
            self.frames.lock().clone()
        }

        pub fn set_failing(&self) {
            self.fail.store(true, Ordering::SeqCst);
        }

        pub fn set_stalled(&self) {
            self.stall.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl MessageSink for MemorySink {
        async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
            if self.stall.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(TransportError::WebSocket("broken pipe".to_string()));
            }
            self.frames.lock().push(text);
            Ok(())
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    pub fn subscriber() -> (Arc<Subscriber>, MemorySink) {
        let sink = MemorySink::default();
        let subscriber = Subscriber::new(sink.clone(), None, Duration::from_secs(1));
        (Arc::new(subscriber), sink)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::testing::{subscriber, MemorySink};
    use super::*;

    #[tokio::test]
    async fn test_send_and_close() {
        let (sub, sink) = subscriber();
        sub.send_text("one".to_string()).await.unwrap();
        assert_eq!(sink.frames(), vec!["one"]);

        sub.close().await;
        assert!(sub.is_closed());
        assert!(sink.closed.load(Ordering::SeqCst));
        assert!(matches!(
            sub.send_text("two".to_string()).await,
            Err(TransportError::Closed)
        ));
        assert_eq!(sink.frames().len(), 1);
    }

    #[tokio::test]
    async fn test_send_failure_is_reported() {
        let (sub, sink) = subscriber();
        sink.set_failing();
        assert!(matches!(
            sub.send_text("x".to_string()).await,
            Err(TransportError::WebSocket(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_deadline() {
        let sink = MemorySink::default();
        sink.set_stalled();
        let sub = Subscriber::new(sink, None, Duration::from_secs(10));

        let err = sub.send_text("x".to_string()).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(d) if d == Duration::from_secs(10)));
    }

    #[test]
    fn test_close_touches_socket_once() {
        tokio_test::block_on(async {
            let (sub, sink) = subscriber();
            sub.close().await;
            sink.closed.store(false, Ordering::SeqCst);

            sub.close().await;
            assert!(!sink.closed.load(Ordering::SeqCst));
        });
    }

    #[tokio::test]
    async fn test_closed_wakes_waiters() {
        let (sub, _) = subscriber();
        let waiter = tokio::spawn({
            let sub = sub.clone();
            async move { sub.closed().await }
        });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        sub.close().await;
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter released")
            .unwrap();

        // Already closed: resolves immediately.
        tokio::time::timeout(Duration::from_millis(50), sub.closed())
            .await
            .expect("closed subscriber resolves at once");
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let (a, _) = subscriber();
        let (b, _) = subscriber();
        assert_ne!(a.id(), b.id());
    }
}
