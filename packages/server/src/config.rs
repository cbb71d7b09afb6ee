//! Gateway runtime settings.

use std::time::Duration;

use crate::domain::RoomName;

/// Default period between liveness probes.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Settings shared by every connection handled by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Room every new connection joins.
    pub default_room: RoomName,
    /// A peer that misses one probe is closed after at most two periods.
    pub heartbeat_interval: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            default_room: RoomName::default(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // テスト項目: デフォルト設定はルーム "main"、30 秒周期
        let config = GatewayConfig::default();
        assert_eq!(config.default_room.as_str(), "main");
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
    }
}
