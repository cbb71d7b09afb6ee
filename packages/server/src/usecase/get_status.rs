//! UseCase: ゲートウェイの状態取得

use std::sync::Arc;

use crate::domain::{Connection, GatewayRepository};

/// 状態取得のユースケース
pub struct GetStatusUseCase {
    repository: Arc<dyn GatewayRepository>,
}

impl GetStatusUseCase {
    /// 新しい GetStatusUseCase を作成
    pub fn new(repository: Arc<dyn GatewayRepository>) -> Self {
        Self { repository }
    }

    /// 接続中の全ての接続を ID 順で取得
    pub async fn execute(&self) -> Vec<Connection> {
        self.repository.get_connections().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::{
        create_test_message_pusher, create_test_repository, register_test_connection,
    };

    #[tokio::test]
    async fn test_get_status_lists_connections() {
        // テスト項目: 接続中のクライアントが ID 順で返される
        // given (前提条件):
        let repository = create_test_repository();
        let pusher = create_test_message_pusher();
        let _b = register_test_connection(&repository, &pusher, "bob", 2, "main").await;
        let _a = register_test_connection(&repository, &pusher, "alice", 1, "main").await;
        let usecase = GetStatusUseCase::new(repository.clone());

        // when (操作):
        let connections = usecase.execute().await;

        // then (期待する結果):
        let ids: Vec<String> = connections.iter().map(|c| c.id.to_string()).collect();
        assert_eq!(ids, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_get_status_empty() {
        // テスト項目: 接続がない場合は空
        let usecase = GetStatusUseCase::new(create_test_repository());
        assert!(usecase.execute().await.is_empty());
    }
}
