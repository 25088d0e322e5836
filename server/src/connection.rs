//! Connection tracking for the UDP server
//!
//! This module owns the mapping between network addresses and player ids,
//! including:
//! - Connection lifecycle (connect, disconnect, timeout)
//! - Throttling of position acknowledgments so movement updates do not
//!   echo back at the full tick rate
//! - Rate limiting of client kill claims
//!
//! Everything here is transport bookkeeping; game state lives in the rooms.

use log::info;
use shared::{ACK_DISPLACEMENT, ACK_MIN_INTERVAL_MS, KILL_CLAIM_COOLDOWN_MS};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Clients that stay silent this long are dropped.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// A connected client and its throttling state
#[derive(Debug)]
pub struct Connection {
    /// Unique client identifier assigned by the server
    pub id: u32,
    /// Network address for sending responses
    pub addr: SocketAddr,
    /// Last time we received any packet from this client
    pub last_seen: Instant,
    /// When the last position acknowledgment was sent, if any
    last_ack: Option<(Instant, f32, f32)>,
    /// When the last kill claim from this client was accepted for rate
    /// limiting purposes
    last_kill_claim: Option<Instant>,
}

impl Connection {
    pub fn new(id: u32, addr: SocketAddr, now: Instant) -> Self {
        Self {
            id,
            addr,
            last_seen: now,
            last_ack: None,
            last_kill_claim: None,
        }
    }

    /// Returns true if no packets have arrived within the timeout window.
    pub fn is_timed_out(&self, now: Instant, timeout: Duration) -> bool {
        now.duration_since(self.last_seen) > timeout
    }
}

/// Tracks all connected clients for the server
///
/// Assigns sequential ids, enforces the connection capacity limit, and
/// answers the per-client throttling questions the packet handlers ask.
pub struct ConnectionManager {
    /// Connected clients indexed by their unique ID
    connections: HashMap<u32, Connection>,
    /// Next available client ID for new connections
    next_client_id: u32,
    /// Maximum number of concurrent connections allowed
    max_connections: usize,
}

impl ConnectionManager {
    pub fn new(max_connections: usize) -> Self {
        Self {
            connections: HashMap::new(),
            next_client_id: 1,
            max_connections,
        }
    }

    /// Attempts to register a new connection
    ///
    /// Returns Some(client_id) if successful, None if the server is at
    /// capacity. Each client gets a unique ID and is associated with its
    /// network address for response routing.
    pub fn add_client(&mut self, addr: SocketAddr, now: Instant) -> Option<u32> {
        if self.connections.len() >= self.max_connections {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.connections
            .insert(client_id, Connection::new(client_id, addr, now));

        Some(client_id)
    }

    /// Removes a connection, returning true if it existed. Handles both
    /// explicit disconnects and timeout cleanup.
    pub fn remove_client(&mut self, client_id: u32) -> bool {
        if let Some(connection) = self.connections.remove(&client_id) {
            info!("Client {} disconnected", connection.id);
            true
        } else {
            false
        }
    }

    /// Finds a client ID by its network address
    ///
    /// Used to associate incoming packets with existing connections.
    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<u32> {
        self.connections
            .iter()
            .find(|(_, connection)| connection.addr == addr)
            .map(|(id, _)| *id)
    }

    pub fn addr_of(&self, client_id: u32) -> Option<SocketAddr> {
        self.connections.get(&client_id).map(|c| c.addr)
    }

    /// Refreshes the activity timestamp for a client.
    pub fn touch(&mut self, client_id: u32, now: Instant) {
        if let Some(connection) = self.connections.get_mut(&client_id) {
            connection.last_seen = now;
        }
    }

    /// Decides whether a movement update deserves an acknowledgment
    ///
    /// An ack goes out when enough time has passed since the previous one,
    /// or when the player has moved far enough (manhattan distance) that
    /// the client should re-sync regardless of elapsed time. The first
    /// update after connecting is always acknowledged.
    pub fn should_ack(&mut self, client_id: u32, x: f32, y: f32, now: Instant) -> bool {
        let connection = match self.connections.get_mut(&client_id) {
            Some(c) => c,
            None => return false,
        };

        let send = match connection.last_ack {
            None => true,
            Some((at, last_x, last_y)) => {
                now.duration_since(at).as_millis() >= ACK_MIN_INTERVAL_MS as u128
                    || (x - last_x).abs() + (y - last_y).abs() > ACK_DISPLACEMENT
            }
        };
        if send {
            connection.last_ack = Some((now, x, y));
        }
        send
    }

    /// Rate limits kill claims from a client. Claims are ignored by the
    /// authoritative simulation either way; this only bounds the handling
    /// cost of a misbehaving client.
    pub fn allow_kill_claim(&mut self, client_id: u32, now: Instant) -> bool {
        let connection = match self.connections.get_mut(&client_id) {
            Some(c) => c,
            None => return false,
        };

        match connection.last_kill_claim {
            Some(at) if now.duration_since(at).as_millis() < KILL_CLAIM_COOLDOWN_MS as u128 => {
                false
            }
            _ => {
                connection.last_kill_claim = Some(now);
                true
            }
        }
    }

    /// Checks for and removes timed-out clients
    ///
    /// Returns the removed client IDs so the caller can clean up lobby and
    /// room state for them.
    pub fn check_timeouts(&mut self, now: Instant) -> Vec<u32> {
        let timed_out: Vec<u32> = self
            .connections
            .iter()
            .filter(|(_, connection)| connection.is_timed_out(now, CLIENT_TIMEOUT))
            .map(|(id, _)| *id)
            .collect();

        for client_id in &timed_out {
            self.remove_client(*client_id);
        }

        timed_out
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    #[test]
    fn test_add_and_find_client() {
        let now = Instant::now();
        let mut manager = ConnectionManager::new(2);

        let id1 = manager.add_client(test_addr(), now).unwrap();
        let id2 = manager.add_client(test_addr2(), now).unwrap();
        assert_eq!(id1, 1);
        assert_eq!(id2, 2);
        assert_eq!(manager.len(), 2);

        assert_eq!(manager.find_client_by_addr(test_addr()), Some(id1));
        assert_eq!(manager.addr_of(id2), Some(test_addr2()));

        let unknown: SocketAddr = "192.168.1.1:9999".parse().unwrap();
        assert_eq!(manager.find_client_by_addr(unknown), None);
    }

    #[test]
    fn test_capacity_limit() {
        let now = Instant::now();
        let mut manager = ConnectionManager::new(1);

        assert!(manager.add_client(test_addr(), now).is_some());
        assert!(manager.add_client(test_addr2(), now).is_none());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_remove_client() {
        let now = Instant::now();
        let mut manager = ConnectionManager::new(2);
        let id = manager.add_client(test_addr(), now).unwrap();

        assert!(manager.remove_client(id));
        assert!(!manager.remove_client(id));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_timeout_removes_silent_clients() {
        let now = Instant::now();
        let mut manager = ConnectionManager::new(2);
        let id1 = manager.add_client(test_addr(), now).unwrap();
        let id2 = manager.add_client(test_addr2(), now).unwrap();

        manager.touch(id2, now + Duration::from_secs(4));

        let timed_out = manager.check_timeouts(now + Duration::from_secs(6));
        assert_eq!(timed_out, vec![id1]);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.addr_of(id2), Some(test_addr2()));
    }

    #[test]
    fn test_first_ack_always_sent() {
        let now = Instant::now();
        let mut manager = ConnectionManager::new(2);
        let id = manager.add_client(test_addr(), now).unwrap();

        assert!(manager.should_ack(id, 100.0, 100.0, now));
    }

    #[test]
    fn test_ack_suppressed_for_small_recent_moves() {
        let now = Instant::now();
        let mut manager = ConnectionManager::new(2);
        let id = manager.add_client(test_addr(), now).unwrap();
        manager.should_ack(id, 100.0, 100.0, now);

        // 16 ms later, 4 px of manhattan movement: below both thresholds
        assert!(!manager.should_ack(id, 102.0, 102.0, now + Duration::from_millis(16)));
    }

    #[test]
    fn test_ack_after_interval_elapsed() {
        let now = Instant::now();
        let mut manager = ConnectionManager::new(2);
        let id = manager.add_client(test_addr(), now).unwrap();
        manager.should_ack(id, 100.0, 100.0, now);

        assert!(manager.should_ack(id, 101.0, 100.0, now + Duration::from_millis(150)));
    }

    #[test]
    fn test_ack_on_large_displacement() {
        let now = Instant::now();
        let mut manager = ConnectionManager::new(2);
        let id = manager.add_client(test_addr(), now).unwrap();
        manager.should_ack(id, 100.0, 100.0, now);

        // Only 10 ms elapsed, but 12 px of manhattan movement
        assert!(manager.should_ack(id, 106.0, 106.0, now + Duration::from_millis(10)));
    }

    #[test]
    fn test_kill_claim_rate_limit() {
        let now = Instant::now();
        let mut manager = ConnectionManager::new(2);
        let id = manager.add_client(test_addr(), now).unwrap();

        assert!(manager.allow_kill_claim(id, now));
        assert!(!manager.allow_kill_claim(id, now + Duration::from_millis(100)));
        assert!(manager.allow_kill_claim(id, now + Duration::from_millis(301)));
    }

    #[test]
    fn test_unknown_client_is_never_acked() {
        let now = Instant::now();
        let mut manager = ConnectionManager::new(2);
        assert!(!manager.should_ack(99, 0.0, 0.0, now));
        assert!(!manager.allow_kill_claim(99, now));
    }
}
