//! UseCase: クライアント切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectClientUseCase::execute() メソッド
//! - 切断通知、ルームからの退出、接続の削除
//!
//! ### なぜこのテストが必要か
//! - 残りの参加者に `user_left` が届くことを確認
//! - 最後の参加者が切断した場合にルームが削除されることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者の切断と通知
//! - エッジケース：最後の参加者の切断（通知対象なし、ルーム削除）
//! - 異常系：既に削除済みの接続の切断試行

use std::sync::Arc;

use katagami_shared::protocol::ServerMessage;

use crate::domain::{Connection, ConnectionId, GatewayRepository, MessagePusher};

use super::error::DisconnectError;

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    /// Repository（接続・ルーム状態の抽象化）
    repository: Arc<dyn GatewayRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectClientUseCase {
    /// 新しい DisconnectClientUseCase を作成
    pub fn new(
        repository: Arc<dyn GatewayRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// クライアント切断を実行
    ///
    /// 1. ルームから退出（空になったルームは削除）し、接続を削除
    /// 2. 同じルームの残りの参加者に `user_left` をブロードキャスト
    /// 3. MessagePusher から登録解除
    ///
    /// # Returns
    ///
    /// * `Ok(Connection)` - 削除された接続
    /// * `Err(DisconnectError)` - 接続が存在しない
    pub async fn execute(&self, connection_id: &ConnectionId) -> Result<Connection, DisconnectError> {
        // 1. ルーム退出と接続の削除（通知先は削除前に確定する）
        let targets = self.repository.get_broadcast_targets(connection_id).await;
        let removed = self
            .repository
            .unregister(connection_id)
            .await
            .ok_or_else(|| DisconnectError::ConnectionNotFound(connection_id.to_string()))?;

        // 2. user_left の通知
        let left = ServerMessage::UserLeft {
            user_id: removed.identity.user_id,
            email: removed.identity.email.clone(),
        };
        match left.to_json() {
            Ok(json) => {
                if let Err(e) = self.message_pusher.broadcast(targets, &json).await {
                    tracing::warn!("Failed to broadcast user_left: {}", e);
                }
            }
            Err(e) => tracing::error!("Failed to encode user_left: {}", e),
        }

        // 3. 送信チャンネルの登録解除
        self.message_pusher.unregister_client(connection_id).await;

        tracing::info!(
            "Client '{}' ({}) disconnected from room '{}'",
            connection_id,
            removed.identity.email,
            removed.room
        );
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::{
        cid, create_test_message_pusher, create_test_repository, drain_messages,
        register_test_connection,
    };

    #[tokio::test]
    async fn test_disconnect_notifies_remaining_members() {
        // テスト項目: 切断すると同じルームの残りの参加者に user_left が届く
        // given (前提条件):
        let repository = create_test_repository();
        let pusher = create_test_message_pusher();
        let mut alice_rx =
            register_test_connection(&repository, &pusher, "alice", 1, "main").await;
        let mut bob_rx = register_test_connection(&repository, &pusher, "bob", 2, "main").await;
        let usecase = DisconnectClientUseCase::new(repository.clone(), pusher.clone());

        // when (操作):
        let result = usecase.execute(&cid("bob")).await;

        // then (期待する結果):
        assert_eq!(result.map(|c| c.identity.user_id), Ok(2));
        assert_eq!(
            drain_messages(&mut alice_rx),
            vec![ServerMessage::UserLeft {
                user_id: 2,
                email: "user2@example.com".to_string(),
            }]
        );
        assert!(drain_messages(&mut bob_rx).is_empty());
        assert_eq!(repository.count_connections().await, 1);
    }

    #[tokio::test]
    async fn test_disconnect_last_member_removes_room() {
        // テスト項目: 最後の参加者が切断するとルームが削除される
        // given (前提条件):
        let repository = create_test_repository();
        let pusher = create_test_message_pusher();
        let _alice_rx =
            register_test_connection(&repository, &pusher, "alice", 1, "main").await;
        let usecase = DisconnectClientUseCase::new(repository.clone(), pusher.clone());

        // when (操作):
        usecase.execute(&cid("alice")).await.unwrap();

        // then (期待する結果):
        assert!(repository.get_room_names().await.is_empty());
        assert_eq!(repository.count_connections().await, 0);
    }

    #[tokio::test]
    async fn test_disconnect_unknown_connection() {
        // テスト項目: 存在しない接続の切断はエラーになる
        // given (前提条件):
        let usecase =
            DisconnectClientUseCase::new(create_test_repository(), create_test_message_pusher());

        // when (操作):
        let result = usecase.execute(&cid("ghost")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(DisconnectError::ConnectionNotFound("ghost".to_string()))
        );
    }
}
