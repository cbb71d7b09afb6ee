//! Error types for the canvas client.

use thiserror::Error;

/// Transport-level errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The gateway address or credential could not be turned into a URL
    #[error("invalid gateway url: {0}")]
    InvalidUrl(String),

    /// Opening the connection failed
    #[error("connection error: {0}")]
    Connect(String),
}

/// Asset loading errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected status {0}")]
    Status(u16),

    /// The response was not an image
    #[error("unexpected content type '{0}'")]
    NotAnImage(String),
}

/// Error returned by an event listener
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Invalid command line typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}', type 'help'")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("'{0}' is not a number")]
    InvalidNumber(String),
}

/// Errors of the interactive client
#[derive(Debug, Error)]
pub enum ClientError {
    /// The mold API could not be reached or answered with an error
    #[error("mold api error: {0}")]
    MoldApi(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Automatic reconnection gave up
    #[error("gave up reconnecting to the gateway")]
    ReconnectFailed,
}
