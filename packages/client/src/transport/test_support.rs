//! Transport test helpers: in-memory connectors and event recorders.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::{ListenerError, TransportError};

use super::connector::{Connector, Frame, Link};

/// Gateway side of an in-memory connection.
pub struct PeerEnd {
    pub url: String,
    from_client: mpsc::UnboundedReceiver<Frame>,
    to_client: mpsc::UnboundedSender<Frame>,
}

impl PeerEnd {
    pub async fn next_frame(&mut self) -> Option<Frame> {
        self.from_client.recv().await
    }

    /// Next text frame parsed as JSON
    pub async fn next_json(&mut self) -> Value {
        loop {
            match self.from_client.recv().await {
                Some(Frame::Text(text)) => return serde_json::from_str(&text).unwrap(),
                Some(Frame::Close { .. }) => continue,
                None => panic!("client side closed"),
            }
        }
    }

    pub fn send_text(&self, text: &str) {
        self.to_client.send(Frame::Text(text.to_string())).unwrap();
    }

    pub fn send_close(&self, code: u16, reason: &str) {
        self.to_client
            .send(Frame::Close {
                code,
                reason: reason.to_string(),
            })
            .unwrap();
    }

    pub fn split(
        self,
    ) -> (
        mpsc::UnboundedReceiver<Frame>,
        mpsc::UnboundedSender<Frame>,
    ) {
        (self.from_client, self.to_client)
    }
}

/// Connector whose connections are handed to the test as [`PeerEnd`]s.
pub struct MemoryConnector {
    peers: mpsc::UnboundedSender<PeerEnd>,
}

impl MemoryConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PeerEnd>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { peers: tx }, rx)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn open(&self, url: &str) -> Result<Link, TransportError> {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        self.peers
            .send(PeerEnd {
                url: url.to_string(),
                from_client: outgoing_rx,
                to_client: incoming_tx,
            })
            .map_err(|_| TransportError::Connect("test dropped the peer channel".to_string()))?;
        Ok(Link {
            outgoing: outgoing_tx,
            incoming: incoming_rx,
        })
    }
}

/// Connector that refuses every attempt.
#[derive(Default)]
pub struct FailingConnector {
    attempts: AtomicUsize,
}

impl FailingConnector {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FailingConnector {
    async fn open(&self, _url: &str) -> Result<Link, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(TransportError::Connect("connection refused".to_string()))
    }
}

/// Listener that forwards every payload to the returned receiver.
pub fn recorder() -> (
    impl Fn(&Value) -> Result<(), ListenerError> + Send + Sync + 'static,
    mpsc::UnboundedReceiver<Value>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let listener = move |value: &Value| {
        tx.send(value.clone())
            .map_err(|e| ListenerError::new(e.to_string()))
    };
    (listener, rx)
}
