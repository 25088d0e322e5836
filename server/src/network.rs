//! Server network layer: UDP transport tasks, packet handling and the
//! tick-driven coordination of lobby, rooms and ledger.

use crate::config::GameConfig;
use crate::connection::ConnectionManager;
use crate::ledger::{LedgerError, LedgerHandle};
use crate::lobby::{Lobby, LobbyEntry, LobbyEvent};
use crate::prize;
use crate::registry::RoomRegistry;
use crate::room::RoomEvent;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{FoodItem, Packet, PlayerUpdateData, ServerPosition, WORLD_SIZE};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, MissedTickBehavior};

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    ClientTimeout {
        client_id: u32,
    },
    /// The ledger answered a match reservation request for a confirmed
    /// cohort.
    MatchReservation {
        cohort: Vec<LobbyEntry>,
        result: Result<u64, LedgerError>,
    },
    #[allow(dead_code)]
    Shutdown,
}

/// Messages sent from the main loop to the network sender task
#[derive(Debug)]
pub enum GameMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    /// One serialization, many recipients; used for room and lobby
    /// broadcasts.
    SendToMany {
        packet: Packet,
        addrs: Vec<SocketAddr>,
    },
}

/// A movement update claiming a position outside the world is dropped
/// before it reaches authoritative state.
fn in_world_bounds(x: f32, y: f32) -> bool {
    x.is_finite()
        && y.is_finite()
        && (0.0..=WORLD_SIZE).contains(&x)
        && (0.0..=WORLD_SIZE).contains(&y)
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis()
        .min(u64::MAX as u128) as u64
}

/// Main server coordinating networking, matchmaking and room simulation
pub struct Server {
    socket: Arc<UdpSocket>,
    connections: Arc<RwLock<ConnectionManager>>,
    lobby: Lobby,
    registry: RoomRegistry,
    ledger: LedgerHandle,
    tick_duration: Duration,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        tick_duration: Duration,
        max_clients: usize,
        config: GameConfig,
        ledger: LedgerHandle,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            connections: Arc::new(RwLock::new(ConnectionManager::new(max_clients))),
            lobby: Lobby::new(&config),
            registry: RoomRegistry::new(config),
            ledger,
            tick_duration,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    /// Spawns the task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 8192];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns the task that drains the outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::SendToMany { packet, addrs } => {
                        match serialize(&packet) {
                            Ok(data) => {
                                for addr in addrs {
                                    if let Err(e) = socket.send_to(&data, addr).await {
                                        error!("Failed to send to {}: {}", addr, e);
                                    }
                                }
                            }
                            Err(e) => error!("Failed to serialize broadcast packet: {}", e),
                        }
                    }
                }
            }
        });
    }

    /// Spawns the task that monitors client timeouts
    fn spawn_timeout_checker(&self) {
        let connections = Arc::clone(&self.connections);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut guard = connections.write().await;
                    guard.check_timeouts(Instant::now())
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        break;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    async fn send_to_players(&self, packet: Packet, player_ids: &[u32]) {
        let addrs = {
            let connections = self.connections.read().await;
            player_ids
                .iter()
                .filter_map(|id| connections.addr_of(*id))
                .collect::<Vec<_>>()
        };
        if addrs.is_empty() {
            return;
        }
        if let Err(e) = self.game_tx.send(GameMessage::SendToMany { packet, addrs }) {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    /// All members of a room, for broadcasting.
    fn room_member_ids(&self, room_id: u32) -> Vec<u32> {
        self.registry
            .room(room_id)
            .map(|room| room.players.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Room members except one, for relaying a player's own update.
    fn room_member_ids_except(&self, room_id: u32, except: u32) -> Vec<u32> {
        self.registry
            .room(room_id)
            .map(|room| {
                room.players
                    .keys()
                    .copied()
                    .filter(|id| *id != except)
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn client_id_for(&self, addr: SocketAddr) -> Option<u32> {
        let connections = self.connections.read().await;
        connections.find_client_by_addr(addr)
    }

    /// Processes one incoming packet
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        let now = Instant::now();

        if let Some(client_id) = self.client_id_for(addr).await {
            let mut connections = self.connections.write().await;
            connections.touch(client_id, now);
        }

        match packet {
            Packet::Connect { client_version } => {
                info!(
                    "Client connecting from {} (version: {})",
                    addr, client_version
                );

                // A reconnect from the same address replaces the old session
                if let Some(existing_id) = self.client_id_for(addr).await {
                    info!("Removing existing client {} from {}", existing_id, addr);
                    self.handle_departure(existing_id, now).await;
                    let mut connections = self.connections.write().await;
                    connections.remove_client(existing_id);
                }

                let client_id = {
                    let mut connections = self.connections.write().await;
                    connections.add_client(addr, now)
                };

                match client_id {
                    Some(client_id) => {
                        self.send_packet(Packet::Connected { client_id }, addr);
                    }
                    None => {
                        self.send_packet(
                            Packet::Error {
                                message: "Server full".to_string(),
                            },
                            addr,
                        );
                    }
                }
            }

            Packet::JoinLobby {
                wallet_address,
                reservation_id,
            } => {
                let client_id = match self.client_id_for(addr).await {
                    Some(id) => id,
                    None => return,
                };

                match self.lobby.join(client_id, wallet_address, reservation_id, now) {
                    Ok(events) => self.dispatch_lobby_events(events).await,
                    Err(e) => self.send_packet(
                        Packet::Error {
                            message: e.to_string(),
                        },
                        addr,
                    ),
                }
            }

            Packet::LeaveLobby => {
                if let Some(client_id) = self.client_id_for(addr).await {
                    self.leave_lobby(client_id, now).await;
                }
            }

            Packet::ConfirmJoin => {
                if let Some(client_id) = self.client_id_for(addr).await {
                    let events = self.lobby.confirm(client_id, now);
                    self.dispatch_lobby_events(events).await;
                }
            }

            Packet::JoinGame {
                wallet_address,
                reservation_id,
            } => {
                let client_id = match self.client_id_for(addr).await {
                    Some(id) => id,
                    None => return,
                };
                self.seat_player(client_id, wallet_address, reservation_id, now)
                    .await;
            }

            Packet::PlayerUpdate { data } => {
                let client_id = match self.client_id_for(addr).await {
                    Some(id) => id,
                    None => return,
                };
                self.handle_player_update(client_id, addr, data, now).await;
            }

            Packet::KillClaim { victim_id } => {
                let client_id = match self.client_id_for(addr).await {
                    Some(id) => id,
                    None => return,
                };
                let allowed = {
                    let mut connections = self.connections.write().await;
                    connections.allow_kill_claim(client_id, now)
                };
                if allowed {
                    // Kills resolve exclusively from the server-side collision
                    // scan; claims are only logged
                    debug!(
                        "Ignoring kill claim from client {} against {}",
                        client_id, victim_id
                    );
                }
            }

            Packet::Ping { timestamp } => {
                self.send_packet(Packet::Pong { timestamp }, addr);
            }

            Packet::Disconnect => {
                if let Some(client_id) = self.client_id_for(addr).await {
                    self.handle_departure(client_id, now).await;
                    let mut connections = self.connections.write().await;
                    connections.remove_client(client_id);
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// Puts a player into a running room: the direct-join and rejoin path.
    /// Players arriving from a confirmed cohort are seated by
    /// `handle_reservation` instead.
    async fn seat_player(
        &mut self,
        client_id: u32,
        wallet_address: Option<String>,
        reservation_id: Option<u64>,
        now: Instant,
    ) {
        // A rejoin from a player already in a room re-sends the current
        // state instead of seating them twice
        if let Some(room_id) = self.registry.room_of(client_id) {
            let snapshot = match self.registry.room(room_id) {
                Some(room) => room.snapshot(now),
                None => return,
            };
            let rejoined = snapshot
                .players
                .iter()
                .find(|p| p.id == client_id)
                .cloned();
            if let Some(player) = rejoined {
                let others = self.room_member_ids_except(room_id, client_id);
                self.send_to_players(Packet::PlayerJoined { player }, &others)
                    .await;
            }
            if let Some(addr) = self.addr_of(client_id).await {
                self.send_packet(
                    Packet::GameJoined {
                        player_id: client_id,
                        room_id,
                        game_state: snapshot,
                    },
                    addr,
                );
            }
            return;
        }

        let room_id = self.registry.find_or_create_room();
        if !self
            .registry
            .add_player(room_id, client_id, wallet_address, reservation_id, now)
        {
            if let Some(addr) = self.addr_of(client_id).await {
                self.send_packet(
                    Packet::Error {
                        message: "Room is full".to_string(),
                    },
                    addr,
                );
            }
            return;
        }

        let snapshot = match self.registry.room(room_id) {
            Some(room) => room.snapshot(now),
            None => return,
        };
        let joined = snapshot
            .players
            .iter()
            .find(|p| p.id == client_id)
            .cloned();

        if let Some(player) = joined {
            let others = self.room_member_ids_except(room_id, client_id);
            self.send_to_players(Packet::PlayerJoined { player }, &others)
                .await;
        }
        if let Some(addr) = self.addr_of(client_id).await {
            self.send_packet(
                Packet::GameJoined {
                    player_id: client_id,
                    room_id,
                    game_state: snapshot,
                },
                addr,
            );
        }
    }

    async fn handle_player_update(
        &mut self,
        client_id: u32,
        addr: SocketAddr,
        data: PlayerUpdateData,
        now: Instant,
    ) {
        let room_id = match self.registry.room_of(client_id) {
            Some(id) => id,
            None => return,
        };
        if !in_world_bounds(data.x, data.y) {
            debug!(
                "Dropping out-of-bounds update from client {} ({:.0}, {:.0})",
                client_id, data.x, data.y
            );
            return;
        }

        if let Some(room) = self.registry.room_mut(room_id) {
            room.update_player(client_id, &data);
        }

        let should_ack = {
            let mut connections = self.connections.write().await;
            connections.should_ack(client_id, data.x, data.y, now)
        };
        if should_ack {
            let server_position = self
                .registry
                .room(room_id)
                .and_then(|room| room.players.get(&client_id))
                .map(|player| ServerPosition {
                    x: player.x,
                    y: player.y,
                    angle: player.angle,
                    input_sequence: data.input_sequence,
                    server_timestamp: unix_millis(),
                });
            if let Some(server_position) = server_position {
                self.send_packet(
                    Packet::PlayerUpdateAck {
                        player_id: client_id,
                        server_position,
                    },
                    addr,
                );
            }
        }

        let others = self.room_member_ids_except(room_id, client_id);
        self.send_to_players(
            Packet::PlayerUpdated {
                player_id: client_id,
                data,
            },
            &others,
        )
        .await;
    }

    /// Lobby and room cleanup for a departing client (disconnect or
    /// timeout). The connection entry itself is removed by the caller.
    async fn handle_departure(&mut self, client_id: u32, now: Instant) {
        self.leave_lobby(client_id, now).await;

        if let Some(room_id) = self.registry.remove_player(client_id) {
            info!("Player {} left room {}", client_id, room_id);
            let remaining = self.room_member_ids(room_id);
            self.send_to_players(
                Packet::PlayerLeft {
                    player_id: client_id,
                },
                &remaining,
            )
            .await;
        }
    }

    async fn leave_lobby(&mut self, client_id: u32, now: Instant) {
        let (removed, events) = self.lobby.leave(client_id, now);
        if let Some(entry) = removed {
            // Leaving the queue releases the player's stake
            self.ledger.reset_player(entry.wallet_address);
        }
        self.dispatch_lobby_events(events).await;
    }

    async fn dispatch_lobby_events(&mut self, events: Vec<LobbyEvent>) {
        for event in events {
            match event {
                LobbyEvent::Status(status) => {
                    let members = self.lobby.member_ids();
                    self.send_to_players(Packet::LobbyUpdate { status }, &members)
                        .await;
                }
                LobbyEvent::MatchReady { cohort } => {
                    self.request_reservation(cohort);
                }
                LobbyEvent::Canceled {
                    confirmed,
                    unconfirmed,
                } => {
                    let all_ids: Vec<u32> = confirmed
                        .iter()
                        .chain(unconfirmed.iter())
                        .map(|e| e.player_id)
                        .collect();
                    self.send_to_players(
                        Packet::MatchCanceled {
                            message: "Not enough players confirmed.".to_string(),
                        },
                        &all_ids,
                    )
                    .await;

                    let confirmed_ids: Vec<u32> =
                        confirmed.iter().map(|e| e.player_id).collect();
                    self.send_to_players(
                        Packet::LifeRefunded {
                            message: "Match canceled. Your life was not consumed.".to_string(),
                        },
                        &confirmed_ids,
                    )
                    .await;

                    for entry in unconfirmed {
                        self.ledger.reset_player(entry.wallet_address);
                    }
                }
                LobbyEvent::ConfirmationAborted { remaining } => {
                    self.send_to_players(
                        Packet::MatchCanceled {
                            message: "A player left during confirmation.".to_string(),
                        },
                        &remaining,
                    )
                    .await;
                }
            }
        }
    }

    /// Asks the ledger to lock the cohort's stakes. The answer comes back
    /// into the main loop as a MatchReservation message so the simulation
    /// never waits on the ledger.
    fn request_reservation(&self, cohort: Vec<LobbyEntry>) {
        let wallets: Vec<String> = cohort.iter().map(|e| e.wallet_address.clone()).collect();
        let reservation_ids: Vec<u64> = cohort.iter().filter_map(|e| e.reservation_id).collect();
        let rx = self.ledger.start_match(wallets, reservation_ids);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let result = match rx.await {
                Ok(result) => result,
                Err(_) => Err(LedgerError::Unreachable),
            };
            let _ = server_tx.send(ServerMessage::MatchReservation { cohort, result });
        });
    }

    /// Seats a confirmed cohort into a fresh room, or unwinds the match if
    /// the ledger refused the reservation.
    async fn handle_reservation(
        &mut self,
        cohort: Vec<LobbyEntry>,
        result: Result<u64, LedgerError>,
        now: Instant,
    ) {
        let reservation_id = match result {
            Ok(id) => id,
            Err(e) => {
                warn!("Match reservation failed for cohort: {}", e);
                let ids: Vec<u32> = cohort.iter().map(|e| e.player_id).collect();
                for entry in &cohort {
                    self.ledger.reset_player(entry.wallet_address.clone());
                }
                self.send_to_players(
                    Packet::MatchFailed {
                        message: "Could not reserve the match. Your life was not consumed."
                            .to_string(),
                    },
                    &ids,
                )
                .await;
                return;
            }
        };

        // A cohort always gets a room of its own, never the shared default
        let room_id = self.registry.create_room();
        info!(
            "Seating cohort of {} into room {} (reservation {})",
            cohort.len(),
            room_id,
            reservation_id
        );

        let mut seated = Vec::new();
        for entry in cohort {
            let connected = self.addr_of(entry.player_id).await.is_some();
            if !connected {
                // Dropped between confirming and seating: release the stake
                self.ledger.reset_player(entry.wallet_address);
                continue;
            }
            if self.registry.add_player(
                room_id,
                entry.player_id,
                Some(entry.wallet_address),
                Some(reservation_id),
                now,
            ) {
                seated.push(entry.player_id);
            }
        }

        if seated.is_empty() {
            self.registry.drop_if_empty(room_id);
            return;
        }

        let snapshot = match self.registry.room(room_id) {
            Some(room) => room.snapshot(now),
            None => return,
        };
        for player_id in seated {
            if let Some(addr) = self.addr_of(player_id).await {
                self.send_packet(
                    Packet::GameJoined {
                        player_id,
                        room_id,
                        game_state: snapshot.clone(),
                    },
                    addr,
                );
            }
        }
    }

    async fn addr_of(&self, client_id: u32) -> Option<SocketAddr> {
        let connections = self.connections.read().await;
        connections.addr_of(client_id)
    }

    /// One simulation tick: advance every room, turn the resulting events
    /// into broadcasts and ledger calls, then drive the lobby timers.
    async fn tick(&mut self, now: Instant) {
        let mut per_room: Vec<(u32, Vec<RoomEvent>)> = Vec::new();
        for room in self.registry.rooms_mut() {
            let events = room.tick(now);
            if !events.is_empty() {
                per_room.push((room.id, events));
            }
        }

        for (room_id, events) in per_room {
            self.dispatch_room_events(room_id, events, now).await;
        }

        // Full state broadcast for every running room
        let snapshots: Vec<(u32, shared::GameSnapshot)> = self
            .registry
            .rooms_mut()
            .filter(|room| room.is_active && !room.is_empty())
            .map(|room| (room.id, room.snapshot(now)))
            .collect();
        for (room_id, game_state) in snapshots {
            let members = self.room_member_ids(room_id);
            self.send_to_players(Packet::GameState { game_state }, &members)
                .await;
        }

        let lobby_events = self.lobby.poll(now);
        self.dispatch_lobby_events(lobby_events).await;
    }

    async fn dispatch_room_events(&mut self, room_id: u32, events: Vec<RoomEvent>, now: Instant) {
        let members = self.room_member_ids(room_id);
        let mut new_food: Vec<FoodItem> = Vec::new();
        let mut ended = false;

        for event in events {
            match event {
                RoomEvent::Kill {
                    killer_id,
                    victim_id,
                    killer_reservation,
                    victim_wallet,
                } => {
                    let game_state = match self.registry.room(room_id) {
                        Some(room) => room.snapshot(now),
                        None => continue,
                    };
                    self.send_to_players(
                        Packet::PlayerKilled {
                            killer_id,
                            victim_id,
                            game_state,
                        },
                        &members,
                    )
                    .await;

                    if let (Some(reservation), Some(wallet)) =
                        (killer_reservation, victim_wallet.clone())
                    {
                        self.ledger.record_kill(reservation, wallet);
                    }
                    if let Some(wallet) = victim_wallet {
                        // Death releases the victim's stake
                        self.ledger.reset_player(wallet);
                    }
                }
                RoomEvent::FoodCreated { new_food: item } => {
                    new_food.push(item);
                }
                RoomEvent::TimerUpdate {
                    time_remaining_ms,
                    elapsed_ms,
                } => {
                    self.send_to_players(
                        Packet::TimerUpdate {
                            time_remaining_ms,
                            elapsed_ms,
                        },
                        &members,
                    )
                    .await;
                }
                RoomEvent::MatchEnded => ended = true,
            }
        }

        if !new_food.is_empty() {
            self.send_to_players(Packet::FoodCreated { new_food }, &members)
                .await;
        }
        if ended {
            self.end_match(room_id).await;
        }
    }

    /// Settles a finished match: leaderboard, payouts, the final broadcast,
    /// and the teardown of the room.
    async fn end_match(&mut self, room_id: u32) {
        let (final_leaderboard, prize_distribution, survivors, member_wallets) = {
            let room = match self.registry.room(room_id) {
                Some(room) => room,
                None => return,
            };
            let leaderboard = prize::final_leaderboard(room);
            let distribution = prize::calculate_distribution(&leaderboard, room.prize_pool());
            let survivors = leaderboard.iter().filter(|e| e.survived).count();
            let wallets: Vec<String> = room
                .players
                .values()
                .filter_map(|p| p.wallet_address.clone())
                .collect();
            (leaderboard, distribution, survivors, wallets)
        };

        info!(
            "Room {}: match over, {} survivors, {} prize shares",
            room_id,
            survivors,
            prize_distribution.len()
        );

        self.ledger.distribute_prizes(prize_distribution.clone());
        for wallet in member_wallets {
            // Every participant's stake entry is cleared for the next match
            self.ledger.reset_player(wallet);
        }

        let members = self.room_member_ids(room_id);
        self.send_to_players(
            Packet::GameEnded {
                final_leaderboard,
                prize_distribution,
                survivors,
            },
            &members,
        )
        .await;

        for player_id in members {
            self.registry.remove_player(player_id);
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ClientTimeout { client_id }) => {
                            info!("Client {} timed out", client_id);
                            self.handle_departure(client_id, Instant::now()).await;
                        },
                        Some(ServerMessage::MatchReservation { cohort, result }) => {
                            self.handle_reservation(cohort, result, Instant::now()).await;
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    self.tick(Instant::now()).await;
                },
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::sync::mpsc;

    #[test]
    fn test_world_bounds_check() {
        assert!(in_world_bounds(0.0, 0.0));
        assert!(in_world_bounds(WORLD_SIZE, WORLD_SIZE));
        assert!(in_world_bounds(1250.0, 42.0));

        assert!(!in_world_bounds(-1.0, 100.0));
        assert!(!in_world_bounds(100.0, WORLD_SIZE + 0.5));
        assert!(!in_world_bounds(f32::NAN, 100.0));
        assert!(!in_world_bounds(f32::INFINITY, 100.0));
    }

    #[test]
    fn test_server_message_creation() {
        let packet = Packet::Connect { client_version: 1 };
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080);

        let msg = ServerMessage::PacketReceived {
            packet: packet.clone(),
            addr,
        };

        match msg {
            ServerMessage::PacketReceived { packet: p, addr: a } => {
                assert_eq!(a, addr);
                match p {
                    Packet::Connect { client_version } => assert_eq!(client_version, 1),
                    _ => panic!("Unexpected packet type"),
                }
            }
            _ => panic!("Unexpected message type"),
        }
    }

    #[test]
    fn test_game_message_send_to_many() {
        let addrs: Vec<SocketAddr> = vec![
            "127.0.0.1:9001".parse().unwrap(),
            "127.0.0.1:9002".parse().unwrap(),
        ];
        let msg = GameMessage::SendToMany {
            packet: Packet::PlayerLeft { player_id: 7 },
            addrs: addrs.clone(),
        };

        match msg {
            GameMessage::SendToMany {
                packet: Packet::PlayerLeft { player_id },
                addrs: a,
            } => {
                assert_eq!(player_id, 7);
                assert_eq!(a, addrs);
            }
            _ => panic!("Unexpected message shape"),
        }
    }

    #[test]
    fn test_channel_communication() {
        let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();

        tx.send(ServerMessage::PacketReceived {
            packet: Packet::Ping { timestamp: 99 },
            addr,
        })
        .unwrap();

        match rx.try_recv().unwrap() {
            ServerMessage::PacketReceived {
                packet: Packet::Ping { timestamp },
                addr: a,
            } => {
                assert_eq!(timestamp, 99);
                assert_eq!(a, addr);
            }
            _ => panic!("Unexpected message type"),
        }
    }

    #[test]
    fn test_unix_millis_is_monotonic_enough() {
        let a = unix_millis();
        let b = unix_millis();
        assert!(b >= a);
        assert!(a > 1_600_000_000_000); // after 2020
    }

    #[test]
    fn test_packet_serialization_roundtrip() {
        let packets = vec![
            Packet::Connect { client_version: 1 },
            Packet::LeaveLobby,
            Packet::ConfirmJoin,
            Packet::Disconnect,
            Packet::Pong { timestamp: 123 },
            Packet::PlayerLeft { player_id: 4 },
        ];

        for packet in packets {
            let data = serialize(&packet).unwrap();
            let back: Packet = deserialize(&data).unwrap();
            match (&packet, &back) {
                (Packet::Connect { .. }, Packet::Connect { .. }) => {}
                (Packet::LeaveLobby, Packet::LeaveLobby) => {}
                (Packet::ConfirmJoin, Packet::ConfirmJoin) => {}
                (Packet::Disconnect, Packet::Disconnect) => {}
                (Packet::Pong { .. }, Packet::Pong { .. }) => {}
                (Packet::PlayerLeft { .. }, Packet::PlayerLeft { .. }) => {}
                _ => panic!("Packet type mismatch after roundtrip"),
            }
        }
    }
}
