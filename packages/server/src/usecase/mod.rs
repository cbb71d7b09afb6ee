//! UseCase 層
//!
//! ゲートウェイの各操作（接続・切断・中継・生存確認・状態取得・停止）を実装します。
//! 各 UseCase は Repository と MessagePusher の trait にのみ依存します。

mod connect_client;
mod disconnect_client;
mod error;
mod get_status;
mod heartbeat;
mod relay_event;
mod shutdown;

pub use connect_client::ConnectClientUseCase;
pub use disconnect_client::DisconnectClientUseCase;
pub use error::{ConnectError, DisconnectError, RelayError};
pub use get_status::GetStatusUseCase;
pub use heartbeat::{HeartbeatUseCase, LivenessVerdict, run_liveness_monitor};
pub use relay_event::{RelayEventUseCase, RelayOutcome};
pub use shutdown::ShutdownUseCase;

#[cfg(test)]
pub(crate) mod test_support;
