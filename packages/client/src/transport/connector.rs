//! Physical transport behind the client.
//!
//! A [`Connector`] opens one connection and exposes it as a pair of channels,
//! so the transport state machine never touches the socket directly.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        Message,
        protocol::{CloseFrame, frame::coding::CloseCode},
    },
};

use katagami_shared::protocol::close_code;

use crate::error::TransportError;

/// Application-level frame exchanged with the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Close { code: u16, reason: String },
}

/// One open connection.
///
/// Sending fails once the connection is gone. The incoming side yields a final
/// `Frame::Close` (or ends) when the connection closes.
pub struct Link {
    pub outgoing: mpsc::UnboundedSender<Frame>,
    pub incoming: mpsc::UnboundedReceiver<Frame>,
}

#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a connection to `url`. Resolves once the connection is usable.
    async fn open(&self, url: &str) -> Result<Link, TransportError>;
}

/// WebSocket connector backed by `tokio-tungstenite`.
#[derive(Debug, Default, Clone)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn open(&self, url: &str) -> Result<Link, TransportError> {
        let (ws_stream, _response) = connect_async(url)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<Frame>();
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel::<Frame>();

        // Writer: frames from the transport to the socket
        tokio::spawn(async move {
            while let Some(frame) = outgoing_rx.recv().await {
                let (message, last) = match frame {
                    Frame::Text(text) => (Message::Text(text.into()), false),
                    Frame::Close { code, reason } => (
                        Message::Close(Some(CloseFrame {
                            code: CloseCode::from(code),
                            reason: reason.into(),
                        })),
                        true,
                    ),
                };
                if let Err(e) = write.send(message).await {
                    tracing::debug!("WebSocket write failed: {}", e);
                    break;
                }
                if last {
                    break;
                }
            }
        });

        // Reader: socket frames to the transport
        tokio::spawn(async move {
            let close = loop {
                match read.next().await {
                    Some(Ok(Message::Text(text))) => {
                        if incoming_tx.send(Frame::Text(text.to_string())).is_err() {
                            return;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        break match frame {
                            Some(frame) => Frame::Close {
                                code: u16::from(frame.code),
                                reason: frame.reason.to_string(),
                            },
                            None => Frame::Close {
                                code: close_code::NORMAL_CLOSURE,
                                reason: String::new(),
                            },
                        };
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        break Frame::Close {
                            code: close_code::ABNORMAL_CLOSURE,
                            reason: e.to_string(),
                        };
                    }
                    None => {
                        break Frame::Close {
                            code: close_code::ABNORMAL_CLOSURE,
                            reason: String::new(),
                        };
                    }
                }
            };
            let _ = incoming_tx.send(close);
        });

        Ok(Link {
            outgoing: outgoing_tx,
            incoming: incoming_rx,
        })
    }
}
