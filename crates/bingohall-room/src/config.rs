//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for a [`HallEngine`](crate::HallEngine).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Player count at which a room arms its countdown.
    pub min_players_to_start: u32,

    /// Time between arming the countdown and the scheduled game start.
    pub countdown: Duration,

    /// Number of cards generated into each room's pool.
    pub card_pool_size: usize,

    /// Capacity used when a room is created without an explicit limit.
    pub default_max_players: u32,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players_to_start: 2,
            countdown: Duration::from_secs(60),
            card_pool_size: 100,
            default_max_players: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.min_players_to_start, 2);
        assert_eq!(config.countdown, Duration::from_secs(60));
        assert_eq!(config.card_pool_size, 100);
        assert_eq!(config.default_max_players, 100);
    }
}
