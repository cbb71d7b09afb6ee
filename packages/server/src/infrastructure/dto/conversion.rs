//! Conversion logic between DTOs and domain entities.

use crate::domain::Connection;
use crate::infrastructure::dto::http::{ConnectedClientDto, GatewayStatusDto};

impl From<Connection> for ConnectedClientDto {
    fn from(connection: Connection) -> Self {
        Self {
            id: connection.id.into_string(),
            user_id: connection.identity.user_id,
            email: connection.identity.email,
            room: connection.room.as_str().to_string(),
        }
    }
}

impl From<Vec<Connection>> for GatewayStatusDto {
    fn from(connections: Vec<Connection>) -> Self {
        let clients: Vec<ConnectedClientDto> =
            connections.into_iter().map(ConnectedClientDto::from).collect();
        Self {
            status: "active".to_string(),
            connected_clients: clients.len(),
            clients,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, RoomName};
    use katagami_shared::protocol::UserIdentity;

    #[test]
    fn test_connections_to_status_dto() {
        // テスト項目: 接続一覧がステータス DTO に変換される
        // given (前提条件):
        let connections = vec![Connection::new(
            ConnectionId::new("client_1_abc".to_string()).unwrap(),
            UserIdentity::new(7, "bob@example.com"),
            RoomName::default(),
            1000,
        )];

        // when (操作):
        let dto: GatewayStatusDto = connections.into();

        // then (期待する結果):
        assert_eq!(dto.status, "active");
        assert_eq!(dto.connected_clients, 1);
        assert_eq!(
            dto.clients[0],
            ConnectedClientDto {
                id: "client_1_abc".to_string(),
                user_id: 7,
                email: "bob@example.com".to_string(),
                room: "main".to_string(),
            }
        );
    }

    #[test]
    fn test_status_dto_wire_format() {
        // テスト項目: ステータス DTO が camelCase でシリアライズされる
        // given (前提条件):
        let dto = GatewayStatusDto::from(Vec::new());

        // when (操作):
        let value = serde_json::to_value(&dto).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            serde_json::json!({"status": "active", "connectedClients": 0, "clients": []})
        );
    }
}
