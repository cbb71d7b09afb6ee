//! UseCase errors.

use thiserror::Error;

use crate::domain::{MessagePushError, RepositoryError};

/// 接続処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("no credential supplied")]
    MissingCredential,

    #[error("credential rejected")]
    InvalidCredential,

    #[error("failed to register connection: {0}")]
    Registration(#[from] RepositoryError),

    #[error("failed to encode message: {0}")]
    Serialization(String),
}

/// 切断処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisconnectError {
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),
}

/// 中継処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("unknown message type '{0}'")]
    UnknownType(String),

    #[error("sender connection '{0}' not found")]
    UnknownConnection(String),

    #[error("failed to encode message: {0}")]
    Serialization(String),

    #[error(transparent)]
    Push(#[from] MessagePushError),
}
