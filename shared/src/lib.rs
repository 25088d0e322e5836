use serde::{Deserialize, Serialize};

pub const WORLD_SIZE: f32 = 2500.0;
pub const FOOD_MARGIN: f32 = 100.0;
pub const SPAWN_MARGIN: f32 = 150.0;
pub const SEGMENT_SPACING: f32 = 8.0;
pub const HEAD_RADIUS: f32 = SEGMENT_SPACING / 2.0;
pub const PLAYER_COLLISION_RADIUS: f32 = 16.0;
pub const MIN_SEGMENTS: usize = 5;
pub const MAX_SEGMENTS: usize = 50;
pub const GROWTH_FOOD_THRESHOLD: u32 = 3;
pub const FOOD_COUNT: usize = 375;

pub const DEFAULT_ROOM_CAPACITY: usize = 30;
pub const DEFAULT_MATCH_DURATION_MS: u64 = 5 * 60 * 1000;
pub const INVULNERABILITY_MS: u64 = 10_000;
pub const KILL_DEDUP_MS: u64 = 1_000;
pub const KILL_CLAIM_COOLDOWN_MS: u64 = 200;

pub const LOBBY_WAITING_MS: u64 = 60_000;
pub const LOBBY_CONFIRM_MS: u64 = 15_000;
pub const LOBBY_BROADCAST_MS: u64 = 1_000;

pub const ACK_MIN_INTERVAL_MS: u64 = 120;
pub const ACK_DISPLACEMENT: f32 = 10.0;

pub const PRIZE_PER_PLAYER: f64 = 3.0;
pub const PRIZE_WEIGHTS: [f64; 3] = [0.50, 0.30, 0.20];

pub const DEFAULT_PLAYER_COLOR: u32 = 0x00ffcc;

/// Room-unique colors handed out in order; random fallback once exhausted.
pub const PLAYER_COLORS: [u32; 15] = [
    0x00ffcc, 0xff6b6b, 0x4ecdc4, 0x45b7d1, 0x96ceb4, 0xfeca57, 0xff9ff3, 0x54a0ff, 0x5f27cd,
    0x00d2d3, 0xff9f43, 0x10ac84, 0xee5a24, 0x0abde3, 0xc44569,
];

pub const FOOD_COLORS: [u32; 5] = [0x00ffcc, 0xff6600, 0x0099ff, 0xff0066, 0x66ff00];

/// One point of a player's trailing body chain. Index 0 is the head and
/// always equals the player's current position.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct SegmentPoint {
    pub x: f32,
    pub y: f32,
}

impl SegmentPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &SegmentPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FoodItem {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub color: u32,
    pub size: f32,
}

/// Sanitized per-player view included in room snapshots.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlayerSnapshot {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub segments: Vec<SegmentPoint>,
    pub segment_count: usize,
    pub kills: u32,
    pub is_alive: bool,
    pub color: u32,
    pub is_invulnerable: bool,
    pub wallet_address: Option<String>,
}

/// Full authoritative room state as broadcast to clients.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GameSnapshot {
    pub players: Vec<PlayerSnapshot>,
    pub food: Vec<FoodItem>,
    pub is_active: bool,
    pub time_remaining_ms: u64,
    pub prize_pool: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum LobbyStateTag {
    Idle,
    Gathering,
    Waiting,
    Confirming,
}

/// Lobby status broadcast to every lobby member on each mutation and once
/// per second while a phase timer runs.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LobbyStatus {
    pub players: usize,
    pub lobby_state: LobbyStateTag,
    pub max_players: usize,
    pub confirmed_count: usize,
    pub time_remaining_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LeaderboardEntry {
    pub player_id: u32,
    pub wallet_address: Option<String>,
    pub kills: u32,
    pub survived: bool,
}

/// One winner's cut of the prize pool.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PrizeShare {
    pub wallet_address: String,
    pub player_id: u32,
    pub position: usize,
    pub kills: u32,
    pub prize: f64,
    pub percentage: f64,
}

/// Whitelisted mutable fields a client may push onto its own player.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlayerUpdateData {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub segments: Option<Vec<SegmentPoint>>,
    pub input_sequence: u32,
}

/// Server-authoritative position echoed back in throttled acks.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerPosition {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub input_sequence: u32,
    pub server_timestamp: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    // Client -> server
    Connect {
        client_version: u32,
    },
    JoinLobby {
        wallet_address: Option<String>,
        reservation_id: Option<u64>,
    },
    LeaveLobby,
    ConfirmJoin,
    JoinGame {
        wallet_address: Option<String>,
        reservation_id: Option<u64>,
    },
    PlayerUpdate {
        data: PlayerUpdateData,
    },
    /// Deprecated client-side kill claim. Accepted and ignored; kills are
    /// computed exclusively on the server.
    KillClaim {
        victim_id: u32,
    },
    Ping {
        timestamp: u64,
    },
    Disconnect,

    // Server -> client
    Connected {
        client_id: u32,
    },
    LobbyUpdate {
        status: LobbyStatus,
    },
    MatchCanceled {
        message: String,
    },
    MatchFailed {
        message: String,
    },
    LifeRefunded {
        message: String,
    },
    GameJoined {
        player_id: u32,
        room_id: u32,
        game_state: GameSnapshot,
    },
    PlayerJoined {
        player: PlayerSnapshot,
    },
    PlayerLeft {
        player_id: u32,
    },
    PlayerUpdated {
        player_id: u32,
        data: PlayerUpdateData,
    },
    PlayerUpdateAck {
        player_id: u32,
        server_position: ServerPosition,
    },
    PlayerKilled {
        killer_id: u32,
        victim_id: u32,
        game_state: GameSnapshot,
    },
    FoodCreated {
        new_food: Vec<FoodItem>,
    },
    TimerUpdate {
        time_remaining_ms: u64,
        elapsed_ms: u64,
    },
    GameState {
        game_state: GameSnapshot,
    },
    GameEnded {
        final_leaderboard: Vec<LeaderboardEntry>,
        prize_distribution: Vec<PrizeShare>,
        survivors: usize,
    },
    Pong {
        timestamp: u64,
    },
    Error {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_segment_point_distance() {
        let a = SegmentPoint::new(0.0, 0.0);
        let b = SegmentPoint::new(3.0, 4.0);
        assert_approx_eq!(a.distance_to(&b), 5.0, 0.0001);
        assert_approx_eq!(b.distance_to(&a), 5.0, 0.0001);
        assert_approx_eq!(a.distance_to(&a), 0.0, 0.0001);
    }

    #[test]
    fn test_color_palette_unique() {
        for i in 0..PLAYER_COLORS.len() {
            for j in (i + 1)..PLAYER_COLORS.len() {
                assert_ne!(PLAYER_COLORS[i], PLAYER_COLORS[j]);
            }
        }
        assert_eq!(PLAYER_COLORS[0], DEFAULT_PLAYER_COLOR);
    }

    #[test]
    fn test_prize_weights_sum_to_one() {
        let total: f64 = PRIZE_WEIGHTS.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_packet_serialization_join_lobby() {
        let packet = Packet::JoinLobby {
            wallet_address: Some("0xabc123".to_string()),
            reservation_id: Some(77),
        };
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::JoinLobby {
                wallet_address,
                reservation_id,
            } => {
                assert_eq!(wallet_address.as_deref(), Some("0xabc123"));
                assert_eq!(reservation_id, Some(77));
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_lobby_update() {
        let packet = Packet::LobbyUpdate {
            status: LobbyStatus {
                players: 3,
                lobby_state: LobbyStateTag::Waiting,
                max_players: DEFAULT_ROOM_CAPACITY,
                confirmed_count: 0,
                time_remaining_ms: 42_000,
            },
        };

        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::LobbyUpdate { status } => {
                assert_eq!(status.players, 3);
                assert_eq!(status.lobby_state, LobbyStateTag::Waiting);
                assert_eq!(status.max_players, 30);
                assert_eq!(status.time_remaining_ms, 42_000);
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_game_state() {
        let packet = Packet::GameState {
            game_state: GameSnapshot {
                players: vec![PlayerSnapshot {
                    id: 1,
                    x: 1250.0,
                    y: 1250.0,
                    angle: 0.0,
                    segments: vec![SegmentPoint::new(1250.0, 1250.0)],
                    segment_count: 1,
                    kills: 2,
                    is_alive: true,
                    color: DEFAULT_PLAYER_COLOR,
                    is_invulnerable: false,
                    wallet_address: Some("0xdead".to_string()),
                }],
                food: vec![FoodItem {
                    id: 9,
                    x: 700.0,
                    y: 800.0,
                    color: 0xff6600,
                    size: 4.5,
                }],
                is_active: true,
                time_remaining_ms: 120_000,
                prize_pool: 6.0,
            },
        };

        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::GameState { game_state } => {
                assert_eq!(game_state.players.len(), 1);
                assert_eq!(game_state.players[0].segments[0].x, 1250.0);
                assert_eq!(game_state.food.len(), 1);
                assert_eq!(game_state.food[0].id, 9);
                assert!(game_state.is_active);
                assert_approx_eq!(game_state.prize_pool, 6.0, 1e-9);
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_game_ended() {
        let packet = Packet::GameEnded {
            final_leaderboard: vec![
                LeaderboardEntry {
                    player_id: 1,
                    wallet_address: Some("0xaaa".to_string()),
                    kills: 3,
                    survived: true,
                },
                LeaderboardEntry {
                    player_id: 2,
                    wallet_address: Some("0xbbb".to_string()),
                    kills: 5,
                    survived: false,
                },
            ],
            prize_distribution: vec![PrizeShare {
                wallet_address: "0xaaa".to_string(),
                player_id: 1,
                position: 1,
                kills: 3,
                prize: 6.0,
                percentage: 100.0,
            }],
            survivors: 1,
        };

        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::GameEnded {
                final_leaderboard,
                prize_distribution,
                survivors,
            } => {
                assert_eq!(final_leaderboard.len(), 2);
                assert!(final_leaderboard[0].survived);
                assert_eq!(prize_distribution.len(), 1);
                assert_eq!(prize_distribution[0].position, 1);
                assert_eq!(survivors, 1);
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_player_update_data_roundtrip() {
        let data = PlayerUpdateData {
            x: 300.0,
            y: 400.0,
            angle: 1.57,
            segments: Some(vec![
                SegmentPoint::new(300.0, 400.0),
                SegmentPoint::new(292.0, 400.0),
            ]),
            input_sequence: 12,
        };

        let serialized = bincode::serialize(&data).unwrap();
        let deserialized: PlayerUpdateData = bincode::deserialize(&serialized).unwrap();

        assert_eq!(deserialized.x, 300.0);
        assert_eq!(deserialized.input_sequence, 12);
        assert_eq!(deserialized.segments.unwrap().len(), 2);
    }
}
