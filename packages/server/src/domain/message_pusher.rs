//! MessagePusher trait 定義
//!
//! 接続中のクライアントへのメッセージ送信を抽象化します。
//! 具体的な実装（WebSocket など）は Infrastructure 層が提供します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{error::MessagePushError, value_object::ConnectionId};

/// Frame queued for one connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// JSON text frame
    Text(String),
    /// Transport-level liveness probe
    Ping,
    /// Close frame; the writer stops after sending it
    Close { code: u16, reason: String },
}

/// クライアントへの送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<Outbound>;

/// MessagePusher trait
///
/// UseCase 層はこの trait に依存し、送信手段の具体的な実装には依存しない。
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントの送信チャンネルを登録
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// クライアントの送信チャンネルを登録解除
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 特定のクライアントにフレームを送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        outbound: Outbound,
    ) -> Result<(), MessagePushError>;

    /// 複数のクライアントにテキストを送信
    ///
    /// 一部の宛先への送信失敗はログに記録するだけで、残りの宛先への送信は継続する。
    /// 戻り値は実際に送信できた宛先の数。
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<usize, MessagePushError>;
}
