use shared::{DEFAULT_MATCH_DURATION_MS, DEFAULT_ROOM_CAPACITY, LOBBY_CONFIRM_MS, LOBBY_WAITING_MS};
use std::time::Duration;

/// Tunables shared by the lobby, registry and rooms. Built once in `main`
/// from CLI arguments and passed down explicitly so tests can run with
/// shortened timers and small rooms.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub room_capacity: usize,
    pub match_duration: Duration,
    pub waiting_duration: Duration,
    pub confirm_duration: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            room_capacity: DEFAULT_ROOM_CAPACITY,
            match_duration: Duration::from_millis(DEFAULT_MATCH_DURATION_MS),
            waiting_duration: Duration::from_millis(LOBBY_WAITING_MS),
            confirm_duration: Duration::from_millis(LOBBY_CONFIRM_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_game_rules() {
        let config = GameConfig::default();
        assert_eq!(config.room_capacity, 30);
        assert_eq!(config.match_duration, Duration::from_secs(300));
        assert_eq!(config.waiting_duration, Duration::from_secs(60));
        assert_eq!(config.confirm_duration, Duration::from_secs(15));
    }
}
