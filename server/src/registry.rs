//! Room ownership and placement. A cached default room keeps the common
//! join path O(1); confirmed lobby cohorts always get a fresh room so the
//! whole cohort lands together.

use crate::config::GameConfig;
use crate::room::Room;
use log::{debug, info};
use std::collections::HashMap;
use std::time::Instant;

pub struct RoomRegistry {
    rooms: HashMap<u32, Room>,
    /// Room currently preferred for open joins; revalidated on every use.
    default_room_id: Option<u32>,
    /// player id -> room id, for message routing.
    room_index: HashMap<u32, u32>,
    next_room_id: u32,
    config: GameConfig,
}

impl RoomRegistry {
    pub fn new(config: GameConfig) -> Self {
        RoomRegistry {
            rooms: HashMap::new(),
            default_room_id: None,
            room_index: HashMap::new(),
            next_room_id: 1,
            config,
        }
    }

    pub fn room(&self, room_id: u32) -> Option<&Room> {
        self.rooms.get(&room_id)
    }

    pub fn room_mut(&mut self, room_id: u32) -> Option<&mut Room> {
        self.rooms.get_mut(&room_id)
    }

    pub fn room_of(&self, player_id: u32) -> Option<u32> {
        self.room_index.get(&player_id).copied()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn player_count(&self) -> usize {
        self.room_index.len()
    }

    pub fn rooms_mut(&mut self) -> impl Iterator<Item = &mut Room> {
        self.rooms.values_mut()
    }

    /// Picks the room for an open join: the cached default if it still
    /// exists and has spare capacity, otherwise any room with room for one
    /// more (adopted as the new default), otherwise a fresh room.
    pub fn find_or_create_room(&mut self) -> u32 {
        if let Some(default_id) = self.default_room_id {
            match self.rooms.get(&default_id) {
                Some(room) if !room.is_full() => {
                    debug!(
                        "Reusing default room {} ({}/{})",
                        default_id,
                        room.len(),
                        self.config.room_capacity
                    );
                    return default_id;
                }
                _ => {
                    debug!("Default room {} full or gone, invalidating", default_id);
                    self.default_room_id = None;
                }
            }
        }

        for (&room_id, room) in &self.rooms {
            if !room.is_full() {
                info!("Adopting room {} as new default", room_id);
                self.default_room_id = Some(room_id);
                return room_id;
            }
        }

        let room_id = self.create_room();
        self.default_room_id = Some(room_id);
        info!("Created new default room {}", room_id);
        room_id
    }

    /// Always creates a fresh room; used for confirmed lobby cohorts, which
    /// never share the open-join default.
    pub fn create_room(&mut self) -> u32 {
        let room_id = self.next_room_id;
        self.next_room_id += 1;
        self.rooms.insert(room_id, Room::new(room_id, &self.config));
        room_id
    }

    /// Seats a player in a room. Returns false if the room is missing or
    /// full; the index is only updated on success.
    pub fn add_player(
        &mut self,
        room_id: u32,
        player_id: u32,
        wallet_address: Option<String>,
        reservation_id: Option<u64>,
        now: Instant,
    ) -> bool {
        let seated = match self.rooms.get_mut(&room_id) {
            Some(room) => room.add_player(player_id, wallet_address, reservation_id, now),
            None => false,
        };
        if seated {
            self.room_index.insert(player_id, room_id);
        }
        seated
    }

    /// Drops a room that ended up with no members (a cohort that fell apart
    /// before seating). Rooms with players are left alone.
    pub fn drop_if_empty(&mut self, room_id: u32) {
        if self.rooms.get(&room_id).is_some_and(|room| room.is_empty()) {
            self.rooms.remove(&room_id);
            if self.default_room_id == Some(room_id) {
                self.default_room_id = None;
            }
            info!("Room {} dropped before anyone was seated", room_id);
        }
    }

    /// Removes a player and drops the room once it is empty. Rooms own no
    /// timers, so dropping the map entry is all the cleanup there is.
    pub fn remove_player(&mut self, player_id: u32) -> Option<u32> {
        let room_id = self.room_index.remove(&player_id)?;
        let emptied = match self.rooms.get_mut(&room_id) {
            Some(room) => {
                room.remove_player(player_id);
                room.is_empty()
            }
            None => false,
        };
        if emptied {
            self.rooms.remove(&room_id);
            if self.default_room_id == Some(room_id) {
                self.default_room_id = None;
            }
            info!("Room {} emptied and dropped", room_id);
        }
        Some(room_id)
    }
}
