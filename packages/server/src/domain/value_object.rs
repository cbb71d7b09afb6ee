//! Value objects.

use std::fmt;

use serde::{Deserialize, Serialize};

use katagami_shared::id::generate_id;

use super::error::ValueObjectError;

/// Maximum room name length in bytes.
pub const ROOM_NAME_MAX_LEN: usize = 64;

/// Identifier of one live connection, unique for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::ConnectionIdEmpty);
        }
        Ok(Self(value))
    }

    /// Generate a fresh `client_<millis>_<suffix>` id.
    pub fn generate() -> Self {
        Self(generate_id("client"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ConnectionId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomName(String);

impl RoomName {
    /// Room every connection joins unless configured otherwise.
    pub const DEFAULT: &'static str = "main";

    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::RoomNameEmpty);
        }
        if trimmed.len() > ROOM_NAME_MAX_LEN {
            return Err(ValueObjectError::RoomNameTooLong(trimmed.len()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RoomName {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl TryFrom<String> for RoomName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_rejects_empty() {
        // テスト項目: 空文字列の接続 ID は作成できない
        // given (前提条件):
        let value = String::new();

        // when (操作):
        let result = ConnectionId::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::ConnectionIdEmpty));
    }

    #[test]
    fn test_connection_id_generate_is_unique() {
        // テスト項目: 生成された接続 ID は client_ で始まり、互いに異なる
        // given (前提条件):

        // when (操作):
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();

        // then (期待する結果):
        assert!(a.as_str().starts_with("client_"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_room_name_validation() {
        // テスト項目: ルーム名は前後の空白を除去し、空・長すぎる名前を拒否する
        // given (前提条件):
        let too_long = "x".repeat(ROOM_NAME_MAX_LEN + 1);

        // when (操作):
        let trimmed = RoomName::new("  lobby ".to_string());
        let empty = RoomName::new("   ".to_string());
        let long = RoomName::new(too_long);

        // then (期待する結果):
        assert_eq!(trimmed.unwrap().as_str(), "lobby");
        assert_eq!(empty, Err(ValueObjectError::RoomNameEmpty));
        assert_eq!(
            long,
            Err(ValueObjectError::RoomNameTooLong(ROOM_NAME_MAX_LEN + 1))
        );
    }

    #[test]
    fn test_room_name_default_is_main() {
        // テスト項目: デフォルトのルーム名は main
        assert_eq!(RoomName::default().as_str(), "main");
    }
}
