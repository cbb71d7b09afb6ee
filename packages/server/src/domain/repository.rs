//! Repository trait 定義
//!
//! ゲートウェイが必要とする接続・ルーム状態へのアクセスを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! 各操作は一つの排他区間で完結するため、接続登録とルーム参加のような複合操作が
//! 他のメッセージ処理と交互に実行されることはありません。

use async_trait::async_trait;

use super::{
    entity::{Connection, LivenessCheck},
    error::RepositoryError,
    value_object::{ConnectionId, RoomName},
};

/// Gateway Repository trait
#[async_trait]
pub trait GatewayRepository: Send + Sync {
    /// 接続を登録し、接続に記録されたルームに参加させる
    async fn register(&self, connection: Connection) -> Result<(), RepositoryError>;

    /// 接続をルームから退出させ（空になったルームは削除）、接続を削除する
    async fn unregister(&self, connection_id: &ConnectionId) -> Option<Connection>;

    /// 接続を取得
    async fn get_connection(&self, connection_id: &ConnectionId) -> Option<Connection>;

    /// 送信者と同じルームにいる送信者以外の接続 ID を取得
    async fn get_broadcast_targets(&self, connection_id: &ConnectionId) -> Vec<ConnectionId>;

    /// 接続中の全ての接続を取得（ID 順）
    async fn get_connections(&self) -> Vec<Connection>;

    /// 存在するルーム名を取得
    async fn get_room_names(&self) -> Vec<RoomName>;

    /// 生存確認への応答を記録（接続が存在しなければ false）
    async fn mark_alive(&self, connection_id: &ConnectionId) -> bool;

    /// 生存確認を実行（接続が存在しなければ None）
    async fn check_liveness(&self, connection_id: &ConnectionId) -> Option<LivenessCheck>;

    /// 接続数を取得
    async fn count_connections(&self) -> usize;
}
