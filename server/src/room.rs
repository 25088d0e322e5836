//! Authoritative room state and the per-tick simulation: invulnerability
//! expiry, head-vs-body collisions, kill resolution with a dedup window,
//! food consumption and growth, and the match timer.
//!
//! `Room::tick` is fully synchronous and returns the events the server loop
//! must act on (broadcasts, ledger calls). Nothing in here ever suspends,
//! so one tick always completes before the next mutation of the room.

use crate::config::GameConfig;
use crate::player::Player;
use log::{debug, info};
use rand::Rng;
use shared::{
    FoodItem, GameSnapshot, PlayerUpdateData, FOOD_COLORS, FOOD_COUNT, FOOD_MARGIN,
    GROWTH_FOOD_THRESHOLD, HEAD_RADIUS, KILL_DEDUP_MS, PLAYER_COLLISION_RADIUS, PLAYER_COLORS,
    PRIZE_PER_PLAYER, WORLD_SIZE,
};
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::time::{Duration, Instant};

/// Timer updates are re-broadcast at most this often.
const TIMER_BROADCAST_MS: u64 = 1_000;

/// Pellet size ranges for the starting field and for replacements.
const INITIAL_FOOD_SIZE: Range<f32> = 3.0..6.0;
const RESPAWN_FOOD_SIZE: Range<f32> = 4.0..8.0;

/// Outcome of one simulation tick, in the order it was produced.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    /// A collision was resolved into a kill this tick (at most one per tick).
    Kill {
        killer_id: u32,
        victim_id: u32,
        killer_reservation: Option<u64>,
        victim_wallet: Option<String>,
    },
    /// A food item was consumed and replaced; carries only the replacement.
    FoodCreated { new_food: FoodItem },
    TimerUpdate {
        time_remaining_ms: u64,
        elapsed_ms: u64,
    },
    /// The match clock ran out; end-of-match processing happens outside the
    /// tick.
    MatchEnded,
}

#[derive(Debug)]
pub struct Room {
    pub id: u32,
    pub players: HashMap<u32, Player>,
    pub food: Vec<FoodItem>,
    pub is_active: bool,
    start_time: Option<Instant>,
    capacity: usize,
    match_duration: Duration,
    /// Short-lived (killer, victim) keys suppressing re-entrant kill
    /// processing within the cooldown window.
    kill_locks: HashMap<(u32, u32), Instant>,
    next_food_id: u64,
    last_timer_broadcast: Option<Instant>,
}

impl Room {
    pub fn new(id: u32, config: &GameConfig) -> Self {
        let mut room = Room {
            id,
            players: HashMap::new(),
            food: Vec::new(),
            is_active: false,
            start_time: None,
            capacity: config.room_capacity,
            match_duration: config.match_duration,
            kill_locks: HashMap::new(),
            next_food_id: 0,
            last_timer_broadcast: None,
        };
        room.food = room.generate_food(FOOD_COUNT);
        room
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.capacity
    }

    /// Adds a player with a room-unique color where possible. Returns false
    /// when the room is at capacity. The first player starts the match clock.
    pub fn add_player(
        &mut self,
        player_id: u32,
        wallet_address: Option<String>,
        reservation_id: Option<u64>,
        now: Instant,
    ) -> bool {
        if self.is_full() || self.players.contains_key(&player_id) {
            return false;
        }

        let color = self.available_color();
        let player = Player::spawn(player_id, color, wallet_address, reservation_id, now);
        info!(
            "Room {}: player {} spawned at ({:.0}, {:.0})",
            self.id, player_id, player.x, player.y
        );
        self.players.insert(player_id, player);

        if self.players.len() == 1 && !self.is_active {
            self.start(now);
        }
        true
    }

    /// Starts the match clock and regenerates the food field.
    pub fn start(&mut self, now: Instant) {
        self.is_active = true;
        self.start_time = Some(now);
        self.food = self.generate_food(FOOD_COUNT);
        info!(
            "Room {}: match started with {} food items",
            self.id,
            self.food.len()
        );
    }

    /// Removes a player. An emptied room deactivates and drops its clock.
    pub fn remove_player(&mut self, player_id: u32) -> Option<Player> {
        let removed = self.players.remove(&player_id);
        if self.players.is_empty() {
            self.is_active = false;
            self.start_time = None;
        }
        removed
    }

    /// Applies a whitelisted client update to a living player.
    pub fn update_player(&mut self, player_id: u32, data: &PlayerUpdateData) {
        if let Some(player) = self.players.get_mut(&player_id) {
            if player.is_alive {
                player.apply_update(data);
            }
        }
    }

    /// Runs one simulation step. Order matters: invulnerability expiry feeds
    /// the collision check, a kill scatters food before the food check, and
    /// the timer runs last.
    pub fn tick(&mut self, now: Instant) -> Vec<RoomEvent> {
        let mut events = Vec::new();
        if !self.is_active || self.players.is_empty() {
            return events;
        }

        self.kill_locks
            .retain(|_, locked_at| now.duration_since(*locked_at).as_millis() < KILL_DEDUP_MS as u128);

        for player in self.players.values_mut() {
            if player.update_invulnerability(now) {
                debug!("Room {}: player {} invulnerability ended", self.id, player.id);
            }
        }

        if let Some((killer_id, victim_id)) = self.find_collision() {
            if self.kill_player(victim_id, killer_id, now) {
                let killer_reservation = self
                    .players
                    .get(&killer_id)
                    .and_then(|p| p.reservation_id);
                let victim_wallet = self
                    .players
                    .get(&victim_id)
                    .and_then(|p| p.wallet_address.clone());
                events.push(RoomEvent::Kill {
                    killer_id,
                    victim_id,
                    killer_reservation,
                    victim_wallet,
                });
            }
        }

        events.extend(self.check_food_collisions());
        events.extend(self.update_timer(now));
        events
    }

    /// Scans each alive head against every segment of every other alive
    /// player and reports the first valid hit as (killer, victim). Stops at
    /// the first hit so at most one kill resolves per tick. Invulnerability
    /// protects both parties symmetrically.
    fn find_collision(&self) -> Option<(u32, u32)> {
        let mut ids: Vec<u32> = self
            .players
            .values()
            .filter(|p| p.is_alive)
            .map(|p| p.id)
            .collect();
        ids.sort_unstable();

        for &pid in &ids {
            let player = self.players.get(&pid)?;
            let head = player.head();

            for &oid in &ids {
                if oid == pid {
                    continue;
                }
                let other = match self.players.get(&oid) {
                    Some(o) => o,
                    None => continue,
                };

                for segment in &other.segments {
                    if head.distance_to(segment) < PLAYER_COLLISION_RADIUS {
                        if player.is_invulnerable || other.is_invulnerable {
                            debug!(
                                "Room {}: collision {} vs {} blocked by invulnerability",
                                self.id, pid, oid
                            );
                            continue;
                        }
                        return Some((oid, pid));
                    }
                }
            }
        }
        None
    }

    /// Resolves a kill once per (killer, victim) pair per cooldown window:
    /// marks the victim dead, credits the killer and scatters the victim's
    /// body as food.
    pub fn kill_player(&mut self, victim_id: u32, killer_id: u32, now: Instant) -> bool {
        if victim_id == killer_id {
            return false;
        }
        let key = (killer_id, victim_id);
        if let Some(locked_at) = self.kill_locks.get(&key) {
            if now.duration_since(*locked_at).as_millis() < KILL_DEDUP_MS as u128 {
                return false;
            }
        }
        if !self.players.contains_key(&killer_id) {
            return false;
        }

        let victim_segments = match self.players.get_mut(&victim_id) {
            Some(victim) if victim.is_alive => {
                victim.is_alive = false;
                victim.segments.clone()
            }
            _ => return false,
        };
        let victim_color = self
            .players
            .get(&victim_id)
            .map(|p| p.color)
            .unwrap_or(shared::DEFAULT_PLAYER_COLOR);

        if let Some(killer) = self.players.get_mut(&killer_id) {
            killer.kills += 1;
        }
        self.kill_locks.insert(key, now);

        info!(
            "Room {}: player {} killed {} ({} segments scattered)",
            self.id,
            killer_id,
            victim_id,
            victim_segments.len()
        );

        let mut rng = rand::thread_rng();
        for segment in &victim_segments {
            for _ in 0..3 {
                let id = self.next_food_id;
                self.next_food_id += 1;
                self.food.push(FoodItem {
                    id,
                    x: segment.x + (rng.gen::<f32>() - 0.5) * 40.0,
                    y: segment.y + (rng.gen::<f32>() - 0.5) * 40.0,
                    color: victim_color,
                    size: rng.gen_range(4.0..8.0),
                });
            }
        }
        true
    }

    /// Head-vs-food overlap test for every alive player. Each consumed item
    /// is replaced one-for-one so the food count stays roughly constant.
    fn check_food_collisions(&mut self) -> Vec<RoomEvent> {
        let mut events = Vec::new();
        let mut ids: Vec<u32> = self
            .players
            .values()
            .filter(|p| p.is_alive)
            .map(|p| p.id)
            .collect();
        ids.sort_unstable();

        for pid in ids {
            let head = match self.players.get(&pid) {
                Some(p) if p.is_alive && !p.segments.is_empty() => p.head(),
                _ => continue,
            };

            // Walk backwards so replacements appended at the end are not
            // re-tested within this pass.
            let mut i = self.food.len();
            while i > 0 {
                i -= 1;
                let overlap = {
                    let item = &self.food[i];
                    head.distance_to(&shared::SegmentPoint::new(item.x, item.y))
                        < HEAD_RADIUS + item.size
                };
                if !overlap {
                    continue;
                }

                self.food.remove(i);

                if let Some(player) = self.players.get_mut(&pid) {
                    player.food_eaten_count += 1;
                    if player.food_eaten_count >= GROWTH_FOOD_THRESHOLD {
                        if player.grow() {
                            debug!(
                                "Room {}: player {} grew to {} segments",
                                self.id,
                                pid,
                                player.segments.len()
                            );
                        }
                        player.food_eaten_count = 0;
                    }
                }

                let new_food = self.spawn_food_item(RESPAWN_FOOD_SIZE);
                self.food.push(new_food.clone());
                events.push(RoomEvent::FoodCreated { new_food });
            }
        }
        events
    }

    /// Checks the match clock; emits a timer update roughly once per second
    /// and MatchEnded exactly once when time runs out.
    fn update_timer(&mut self, now: Instant) -> Vec<RoomEvent> {
        let mut events = Vec::new();
        let start = match self.start_time {
            Some(start) => start,
            None => return events,
        };

        let elapsed = now.duration_since(start);
        let remaining = self.match_duration.saturating_sub(elapsed);

        if remaining.is_zero() {
            if self.is_active {
                info!("Room {}: match time ended", self.id);
                self.is_active = false;
                events.push(RoomEvent::MatchEnded);
            }
            return events;
        }

        let due = self
            .last_timer_broadcast
            .map_or(true, |at| now.duration_since(at).as_millis() >= TIMER_BROADCAST_MS as u128);
        if due {
            self.last_timer_broadcast = Some(now);
            events.push(RoomEvent::TimerUpdate {
                time_remaining_ms: remaining.as_millis() as u64,
                elapsed_ms: elapsed.as_millis() as u64,
            });
        }
        events
    }

    pub fn time_remaining_ms(&self, now: Instant) -> u64 {
        match self.start_time {
            Some(start) => self
                .match_duration
                .saturating_sub(now.duration_since(start))
                .as_millis() as u64,
            None => 0,
        }
    }

    pub fn prize_pool(&self) -> f64 {
        self.players.len() as f64 * PRIZE_PER_PLAYER
    }

    /// Full sanitized snapshot for broadcast.
    pub fn snapshot(&self, now: Instant) -> GameSnapshot {
        GameSnapshot {
            players: self.players.values().map(|p| p.snapshot()).collect(),
            food: self.food.clone(),
            is_active: self.is_active,
            time_remaining_ms: self.time_remaining_ms(now),
            prize_pool: self.prize_pool(),
        }
    }

    /// First palette color not used by a current member; random palette pick
    /// once all are taken.
    fn available_color(&self) -> u32 {
        let used: HashSet<u32> = self.players.values().map(|p| p.color).collect();
        for &color in PLAYER_COLORS.iter() {
            if !used.contains(&color) {
                return color;
            }
        }
        let mut rng = rand::thread_rng();
        PLAYER_COLORS[rng.gen_range(0..PLAYER_COLORS.len())]
    }

    // The initial field uses smaller pellets than the ones respawned after
    // a pickup or scattered from a kill.
    fn spawn_food_item(&mut self, size_range: Range<f32>) -> FoodItem {
        let mut rng = rand::thread_rng();
        let id = self.next_food_id;
        self.next_food_id += 1;
        FoodItem {
            id,
            x: rng.gen_range(FOOD_MARGIN..WORLD_SIZE - FOOD_MARGIN),
            y: rng.gen_range(FOOD_MARGIN..WORLD_SIZE - FOOD_MARGIN),
            color: FOOD_COLORS[rng.gen_range(0..FOOD_COLORS.len())],
            size: rng.gen_range(size_range),
        }
    }

    fn generate_food(&mut self, count: usize) -> Vec<FoodItem> {
        (0..count)
            .map(|_| self.spawn_food_item(INITIAL_FOOD_SIZE))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{SegmentPoint, MAX_SEGMENTS, MIN_SEGMENTS};

    fn test_config() -> GameConfig {
        GameConfig {
            room_capacity: 4,
            match_duration: Duration::from_secs(300),
            ..GameConfig::default()
        }
    }

    fn place(room: &mut Room, id: u32, x: f32, y: f32, invulnerable: bool) {
        let player = room.players.get_mut(&id).unwrap();
        player.x = x;
        player.y = y;
        player.segments = (0..MIN_SEGMENTS)
            .map(|i| SegmentPoint::new(x - i as f32 * 8.0, y))
            .collect();
        player.is_invulnerable = invulnerable;
    }

    #[test]
    fn test_capacity_enforced() {
        let now = Instant::now();
        let mut room = Room::new(1, &test_config());

        for id in 0..4 {
            assert!(room.add_player(id, None, None, now));
        }
        assert!(room.is_full());
        assert!(!room.add_player(99, None, None, now));
        assert_eq!(room.len(), 4);
    }

    #[test]
    fn test_first_player_starts_match() {
        let now = Instant::now();
        let mut room = Room::new(1, &test_config());
        assert!(!room.is_active);

        room.add_player(1, None, None, now);
        assert!(room.is_active);
        assert_eq!(room.food.len(), FOOD_COUNT);
    }

    #[test]
    fn test_empty_room_deactivates() {
        let now = Instant::now();
        let mut room = Room::new(1, &test_config());
        room.add_player(1, None, None, now);
        room.remove_player(1);

        assert!(!room.is_active);
        assert_eq!(room.time_remaining_ms(now), 0);
    }

    #[test]
    fn test_head_matches_position_after_update() {
        let now = Instant::now();
        let mut room = Room::new(1, &test_config());
        room.add_player(1, None, None, now);

        room.update_player(
            1,
            &PlayerUpdateData {
                x: 800.0,
                y: 900.0,
                angle: 1.0,
                segments: None,
                input_sequence: 1,
            },
        );

        let player = room.players.get(&1).unwrap();
        assert_eq!(player.segments[0], SegmentPoint::new(800.0, 900.0));
    }

    #[test]
    fn test_dead_player_update_ignored() {
        let now = Instant::now();
        let mut room = Room::new(1, &test_config());
        room.add_player(1, None, None, now);
        room.add_player(2, None, None, now);
        room.kill_player(1, 2, now);

        let before_x = room.players.get(&1).unwrap().x;
        room.update_player(
            1,
            &PlayerUpdateData {
                x: 200.0,
                y: 200.0,
                angle: 0.0,
                segments: None,
                input_sequence: 1,
            },
        );
        assert_eq!(room.players.get(&1).unwrap().x, before_x);
    }

    #[test]
    fn test_collision_resolves_single_kill() {
        let now = Instant::now();
        let mut room = Room::new(1, &test_config());
        room.add_player(1, Some("0xaaa".into()), Some(1), now);
        room.add_player(2, Some("0xbbb".into()), Some(2), now);
        room.add_player(3, Some("0xccc".into()), Some(3), now);

        // All three heads stacked: still only one kill per tick
        place(&mut room, 1, 1000.0, 1000.0, false);
        place(&mut room, 2, 1000.0, 1000.0, false);
        place(&mut room, 3, 1000.0, 1000.0, false);

        let food_before = room.food.len();
        let events = room.tick(now);
        let kills: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, RoomEvent::Kill { .. }))
            .collect();
        assert_eq!(kills.len(), 1);

        // Lowest id scans first, its head hits player 2's body
        match kills[0] {
            RoomEvent::Kill {
                killer_id,
                victim_id,
                ..
            } => {
                assert_eq!(*killer_id, 2);
                assert_eq!(*victim_id, 1);
            }
            _ => unreachable!(),
        }

        assert!(!room.players.get(&1).unwrap().is_alive);
        assert_eq!(room.players.get(&2).unwrap().kills, 1);
        // Victim body scattered as 3 food per segment
        assert!(room.food.len() >= food_before + 3 * MIN_SEGMENTS);
    }

    #[test]
    fn test_invulnerability_blocks_collision_symmetrically() {
        let now = Instant::now();
        let mut room = Room::new(1, &test_config());
        room.add_player(1, None, None, now);
        room.add_player(2, None, None, now);

        place(&mut room, 1, 1000.0, 1000.0, true);
        place(&mut room, 2, 1000.0, 1000.0, false);

        let events = room.tick(now);
        assert!(!events.iter().any(|e| matches!(e, RoomEvent::Kill { .. })));
        assert!(room.players.get(&1).unwrap().is_alive);
        assert!(room.players.get(&2).unwrap().is_alive);
    }

    #[test]
    fn test_kill_dedup_window() {
        let now = Instant::now();
        let mut room = Room::new(1, &test_config());
        room.add_player(1, None, None, now);
        room.add_player(2, None, None, now);

        assert!(room.kill_player(1, 2, now));
        // Revive the victim to isolate the dedup lock
        room.players.get_mut(&1).unwrap().is_alive = true;

        assert!(!room.kill_player(1, 2, now + Duration::from_millis(500)));
        assert!(room.kill_player(1, 2, now + Duration::from_millis(1100)));
    }

    #[test]
    fn test_self_kill_rejected() {
        let now = Instant::now();
        let mut room = Room::new(1, &test_config());
        room.add_player(1, None, None, now);
        assert!(!room.kill_player(1, 1, now));
    }

    #[test]
    fn test_food_eaten_and_replenished() {
        let now = Instant::now();
        let mut room = Room::new(1, &test_config());
        room.add_player(1, None, None, now);
        place(&mut room, 1, 1000.0, 1000.0, false);

        // Clear the field and plant one item within head reach
        room.food.clear();
        room.food.push(FoodItem {
            id: 1000,
            x: 1003.0,
            y: 1000.0,
            color: 0xff6600,
            size: 4.0,
        });

        let events = room.tick(now);
        let created: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, RoomEvent::FoodCreated { .. }))
            .collect();
        assert_eq!(created.len(), 1);

        // One consumed, one spawned: count restored
        assert_eq!(room.food.len(), 1);
        assert_ne!(room.food[0].id, 1000);
        assert_eq!(room.players.get(&1).unwrap().food_eaten_count, 1);
        // Threshold is 3: no growth yet
        assert_eq!(room.players.get(&1).unwrap().segments.len(), MIN_SEGMENTS);
    }

    #[test]
    fn test_initial_food_smaller_than_replacements() {
        let now = Instant::now();
        let mut room = Room::new(1, &test_config());
        room.add_player(1, None, None, now);

        // The starting field is all small pellets
        assert!(room
            .food
            .iter()
            .all(|item| (3.0..6.0).contains(&item.size)));

        place(&mut room, 1, 1000.0, 1000.0, false);
        room.food.clear();
        room.food.push(FoodItem {
            id: 1000,
            x: 1003.0,
            y: 1000.0,
            color: 0xff6600,
            size: 4.0,
        });
        room.tick(now);

        // The replacement for an eaten pellet comes from the larger range
        assert_eq!(room.food.len(), 1);
        assert!((4.0..8.0).contains(&room.food[0].size));
    }

    #[test]
    fn test_growth_after_three_food() {
        let now = Instant::now();
        let mut room = Room::new(1, &test_config());
        room.add_player(1, None, None, now);

        for _ in 0..3 {
            place(&mut room, 1, 1000.0, 1000.0, false);
            room.food.clear();
            room.food.push(FoodItem {
                id: 0,
                x: 1000.0,
                y: 1000.0,
                color: 0,
                size: 4.0,
            });
            room.tick(now);
        }

        let player = room.players.get(&1).unwrap();
        assert_eq!(player.segments.len(), MIN_SEGMENTS + 1);
        assert_eq!(player.food_eaten_count, 0);
    }

    #[test]
    fn test_segment_cap_survives_overfeeding() {
        let now = Instant::now();
        let mut room = Room::new(1, &test_config());
        room.add_player(1, None, None, now);
        room.players.get_mut(&1).unwrap().segments =
            vec![SegmentPoint::new(1000.0, 1000.0); MAX_SEGMENTS];

        for _ in 0..9 {
            place_food_at_head(&mut room);
            room.tick(now);
        }
        assert_eq!(room.players.get(&1).unwrap().segments.len(), MAX_SEGMENTS);
    }

    fn place_food_at_head(room: &mut Room) {
        let head = {
            let p = room.players.get_mut(&1).unwrap();
            p.x = 1000.0;
            p.y = 1000.0;
            p.follow_segments();
            p.head()
        };
        room.food.clear();
        room.food.push(FoodItem {
            id: 0,
            x: head.x,
            y: head.y,
            color: 0,
            size: 4.0,
        });
    }

    #[test]
    fn test_match_ends_once() {
        let now = Instant::now();
        let config = GameConfig {
            room_capacity: 4,
            match_duration: Duration::from_millis(50),
            ..GameConfig::default()
        };
        let mut room = Room::new(1, &config);
        room.add_player(1, None, None, now);

        let later = now + Duration::from_millis(100);
        let events = room.tick(later);
        assert!(events.iter().any(|e| matches!(e, RoomEvent::MatchEnded)));
        assert!(!room.is_active);

        // Inactive room no longer ticks
        assert!(room.tick(later + Duration::from_millis(16)).is_empty());
    }

    #[test]
    fn test_timer_update_cadence() {
        let now = Instant::now();
        let mut room = Room::new(1, &test_config());
        room.add_player(1, None, None, now);
        room.food.clear();

        let events = room.tick(now + Duration::from_millis(16));
        assert!(events
            .iter()
            .any(|e| matches!(e, RoomEvent::TimerUpdate { .. })));

        // Next tick within the same second stays quiet
        let events = room.tick(now + Duration::from_millis(32));
        assert!(!events
            .iter()
            .any(|e| matches!(e, RoomEvent::TimerUpdate { .. })));

        let events = room.tick(now + Duration::from_millis(1100));
        assert!(events
            .iter()
            .any(|e| matches!(e, RoomEvent::TimerUpdate { .. })));
    }

    #[test]
    fn test_unique_colors_until_palette_exhausted() {
        let now = Instant::now();
        let config = GameConfig {
            room_capacity: 20,
            ..GameConfig::default()
        };
        let mut room = Room::new(1, &config);
        for id in 0..15 {
            room.add_player(id, None, None, now);
        }

        let colors: HashSet<u32> = room.players.values().map(|p| p.color).collect();
        assert_eq!(colors.len(), 15);

        // 16th player still gets a palette color
        room.add_player(100, None, None, now);
        assert!(PLAYER_COLORS.contains(&room.players.get(&100).unwrap().color));
    }

    #[test]
    fn test_snapshot_shape() {
        let now = Instant::now();
        let mut room = Room::new(1, &test_config());
        room.add_player(1, Some("0xaaa".into()), None, now);

        let snapshot = room.snapshot(now);
        assert_eq!(snapshot.players.len(), 1);
        assert!(snapshot.is_active);
        assert_eq!(snapshot.food.len(), FOOD_COUNT);
        assert!(snapshot.time_remaining_ms > 0);
        assert!((snapshot.prize_pool - PRIZE_PER_PLAYER).abs() < 1e-9);

        let p = &snapshot.players[0];
        assert_eq!(p.segments[0].x, p.x);
        assert_eq!(p.segments[0].y, p.y);
    }
}
