//! UseCase: 生存確認（ハートビート）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - HeartbeatUseCase::acknowledge() / check() メソッド
//! - run_liveness_monitor() による周期的な生存確認
//!
//! ### なぜこのテストが必要か
//! - 応答しない接続が 2 周期以内に切断されることを保証
//! - 応答している接続が切断されないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：probe に応答し続ける接続
//! - 異常系：probe に応答しない接続（close 4000）
//! - エッジケース：既に切断された接続の監視（監視タスクが終了する）

use std::{sync::Arc, time::Duration};

use katagami_shared::protocol::close_code;

use crate::domain::{ConnectionId, GatewayRepository, LivenessCheck, MessagePusher, Outbound};

/// 生存確認の失敗で接続を閉じるときの理由
const LIVENESS_TIMEOUT_REASON: &str = "liveness timeout";

/// 一回の生存確認の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessVerdict {
    /// probe を送信した
    Probed,
    /// 応答がなかったため close を送信した
    Terminated,
    /// 接続が既に存在しない
    Gone,
}

/// 生存確認のユースケース
pub struct HeartbeatUseCase {
    /// Repository（接続・ルーム状態の抽象化）
    repository: Arc<dyn GatewayRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl HeartbeatUseCase {
    /// 新しい HeartbeatUseCase を作成
    pub fn new(
        repository: Arc<dyn GatewayRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// probe への応答（pong）を記録する
    pub async fn acknowledge(&self, connection_id: &ConnectionId) -> bool {
        self.repository.mark_alive(connection_id).await
    }

    /// 一回分の生存確認を実行する
    ///
    /// 前回の probe に応答済みなら新しい probe を送り、未応答なら close 4000 を送る。
    /// close の送信後の後始末は接続ハンドラの切断処理が行う。
    pub async fn check(&self, connection_id: &ConnectionId) -> LivenessVerdict {
        let Some(check) = self.repository.check_liveness(connection_id).await else {
            return LivenessVerdict::Gone;
        };

        match check {
            LivenessCheck::Probe => {
                if let Err(e) = self
                    .message_pusher
                    .push_to(connection_id, Outbound::Ping)
                    .await
                {
                    tracing::debug!("Failed to probe '{}': {}", connection_id, e);
                    return LivenessVerdict::Gone;
                }
                tracing::trace!("Probed client '{}'", connection_id);
                LivenessVerdict::Probed
            }
            LivenessCheck::Unresponsive => {
                tracing::warn!(
                    "Client '{}' did not answer the liveness probe, closing",
                    connection_id
                );
                let close = Outbound::Close {
                    code: close_code::LIVENESS_TIMEOUT,
                    reason: LIVENESS_TIMEOUT_REASON.to_string(),
                };
                if let Err(e) = self.message_pusher.push_to(connection_id, close).await {
                    tracing::debug!("Failed to close '{}': {}", connection_id, e);
                }
                LivenessVerdict::Terminated
            }
        }
    }
}

/// 接続ごとの生存確認ループ
///
/// 最初の確認は接続から `period` 後に行う。close を送信したか、接続が消えた時点で終了する。
pub async fn run_liveness_monitor(
    usecase: Arc<HeartbeatUseCase>,
    connection_id: ConnectionId,
    period: Duration,
) {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    loop {
        interval.tick().await;
        match usecase.check(&connection_id).await {
            LivenessVerdict::Probed => continue,
            LivenessVerdict::Terminated | LivenessVerdict::Gone => break,
        }
    }
    tracing::debug!("Liveness monitor for '{}' stopped", connection_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::{
        cid, create_test_message_pusher, create_test_repository, register_test_connection,
    };
    use tokio::time::Instant;

    const PERIOD: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn test_check_probes_live_connection() {
        // テスト項目: 応答済みの接続には probe が送られる
        // given (前提条件):
        let repository = create_test_repository();
        let pusher = create_test_message_pusher();
        let mut rx = register_test_connection(&repository, &pusher, "alice", 1, "main").await;
        let usecase = HeartbeatUseCase::new(repository.clone(), pusher.clone());

        // when (操作):
        let verdict = usecase.check(&cid("alice")).await;

        // then (期待する結果):
        assert_eq!(verdict, LivenessVerdict::Probed);
        assert_eq!(rx.try_recv(), Ok(Outbound::Ping));
    }

    #[tokio::test]
    async fn test_check_terminates_unresponsive_connection() {
        // テスト項目: probe に応答しないまま次の確認を迎えると close 4000 が送られる
        // given (前提条件):
        let repository = create_test_repository();
        let pusher = create_test_message_pusher();
        let mut rx = register_test_connection(&repository, &pusher, "alice", 1, "main").await;
        let usecase = HeartbeatUseCase::new(repository.clone(), pusher.clone());
        usecase.check(&cid("alice")).await;
        let _ = rx.try_recv();

        // when (操作):
        let verdict = usecase.check(&cid("alice")).await;

        // then (期待する結果):
        assert_eq!(verdict, LivenessVerdict::Terminated);
        assert_eq!(
            rx.try_recv(),
            Ok(Outbound::Close {
                code: close_code::LIVENESS_TIMEOUT,
                reason: LIVENESS_TIMEOUT_REASON.to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_acknowledge_keeps_connection_alive() {
        // テスト項目: probe に応答した接続は次の確認でも probe される
        // given (前提条件):
        let repository = create_test_repository();
        let pusher = create_test_message_pusher();
        let mut rx = register_test_connection(&repository, &pusher, "alice", 1, "main").await;
        let usecase = HeartbeatUseCase::new(repository.clone(), pusher.clone());
        usecase.check(&cid("alice")).await;

        // when (操作):
        let acknowledged = usecase.acknowledge(&cid("alice")).await;
        let verdict = usecase.check(&cid("alice")).await;

        // then (期待する結果):
        assert!(acknowledged);
        assert_eq!(verdict, LivenessVerdict::Probed);
        assert_eq!(rx.try_recv(), Ok(Outbound::Ping));
        assert_eq!(rx.try_recv(), Ok(Outbound::Ping));
    }

    #[tokio::test]
    async fn test_check_unknown_connection() {
        // テスト項目: 存在しない接続の確認は Gone を返す
        // given (前提条件):
        let usecase = HeartbeatUseCase::new(create_test_repository(), create_test_message_pusher());

        // when (操作):
        let verdict = usecase.check(&cid("ghost")).await;
        let acknowledged = usecase.acknowledge(&cid("ghost")).await;

        // then (期待する結果):
        assert_eq!(verdict, LivenessVerdict::Gone);
        assert!(!acknowledged);
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_closes_silent_connection_within_two_periods() {
        // テスト項目: probe に応答しない接続は 1 周期目で probe、2 周期目で close 4000 を受け取る
        // given (前提条件):
        let repository = create_test_repository();
        let pusher = create_test_message_pusher();
        let mut rx = register_test_connection(&repository, &pusher, "alice", 1, "main").await;
        let usecase = Arc::new(HeartbeatUseCase::new(repository.clone(), pusher.clone()));
        let start = Instant::now();

        // when (操作):
        let monitor = tokio::spawn(run_liveness_monitor(usecase, cid("alice"), PERIOD));

        // then (期待する結果):
        assert_eq!(rx.recv().await, Some(Outbound::Ping));
        let probed_at = start.elapsed();
        assert!(probed_at >= PERIOD && probed_at < PERIOD + Duration::from_secs(1));

        let closed = rx.recv().await;
        let closed_at = start.elapsed();
        assert_eq!(
            closed,
            Some(Outbound::Close {
                code: close_code::LIVENESS_TIMEOUT,
                reason: LIVENESS_TIMEOUT_REASON.to_string(),
            })
        );
        assert!(closed_at >= PERIOD * 2 && closed_at < PERIOD * 2 + Duration::from_secs(1));
        monitor.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_keeps_responsive_connection() {
        // テスト項目: 毎回応答する接続は切断されない
        // given (前提条件):
        let repository = create_test_repository();
        let pusher = create_test_message_pusher();
        let mut rx = register_test_connection(&repository, &pusher, "alice", 1, "main").await;
        let usecase = Arc::new(HeartbeatUseCase::new(repository.clone(), pusher.clone()));

        // when (操作):
        let monitor = tokio::spawn(run_liveness_monitor(
            usecase.clone(),
            cid("alice"),
            PERIOD,
        ));
        let mut frames = Vec::new();
        for _ in 0..3 {
            let frame = rx.recv().await;
            usecase.acknowledge(&cid("alice")).await;
            frames.push(frame);
        }

        // then (期待する結果):
        assert_eq!(frames, vec![Some(Outbound::Ping); 3]);
        assert!(!monitor.is_finished());
        monitor.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_stops_when_connection_is_gone() {
        // テスト項目: 接続が削除されると監視タスクは終了する
        // given (前提条件):
        let repository = create_test_repository();
        let usecase = Arc::new(HeartbeatUseCase::new(
            repository.clone(),
            create_test_message_pusher(),
        ));

        // when (操作):
        let monitor = tokio::spawn(run_liveness_monitor(usecase, cid("ghost"), PERIOD));

        // then (期待する結果):
        assert!(monitor.await.is_ok());
    }
}
