//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use katagami_shared::protocol::UserId;

/// One connected client in the status report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedClientDto {
    pub id: String,
    pub user_id: UserId,
    pub email: String,
    pub room: String,
}

/// Response of `GET /ws-status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatusDto {
    pub status: String,
    pub connected_clients: usize,
    pub clients: Vec<ConnectedClientDto>,
}
