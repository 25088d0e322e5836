//! Pre-match lobby state machine. Wallet-bearing players gather here, sit
//! through a waiting countdown and a confirmation window, and either get
//! handed off as a cohort for a fresh room or cleared out with a refund
//! notice.
//!
//! Timers are plain values owned by the current phase, polled from the
//! server loop. A state transition replaces the phase and drops its
//! deadline and broadcast cadence together, so a "cancelled timer" cannot
//! fire into a later state: there is nothing left to fire.

use crate::config::GameConfig;
use log::info;
use shared::{LobbyStateTag, LobbyStatus, LOBBY_BROADCAST_MS};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    #[error("Wallet address is required to join the lobby.")]
    MissingWallet,
    #[error("You are already in the lobby.")]
    DuplicateWallet,
    #[error("The lobby is full.")]
    LobbyFull,
}

#[derive(Debug, Clone)]
pub struct LobbyEntry {
    pub player_id: u32,
    pub wallet_address: String,
    pub reservation_id: Option<u64>,
    pub confirmed: bool,
}

/// Deadline plus broadcast cadence for one lobby phase, cancelled as a unit
/// when the phase changes.
#[derive(Debug)]
struct PhaseTimer {
    started: Instant,
    duration: Duration,
    last_broadcast: Instant,
}

impl PhaseTimer {
    fn new(now: Instant, duration: Duration) -> Self {
        PhaseTimer {
            started: now,
            duration,
            last_broadcast: now,
        }
    }

    fn expired(&self, now: Instant) -> bool {
        now.duration_since(self.started) >= self.duration
    }

    fn remaining_ms(&self, now: Instant) -> u64 {
        self.duration
            .saturating_sub(now.duration_since(self.started))
            .as_millis() as u64
    }

    fn should_broadcast(&mut self, now: Instant) -> bool {
        if now.duration_since(self.last_broadcast).as_millis() >= LOBBY_BROADCAST_MS as u128 {
            self.last_broadcast = now;
            true
        } else {
            false
        }
    }
}

#[derive(Debug)]
enum LobbyPhase {
    Idle,
    Gathering,
    Waiting(PhaseTimer),
    Confirming(PhaseTimer),
}

/// What the server loop must do after a lobby mutation or poll.
#[derive(Debug)]
pub enum LobbyEvent {
    /// Send the status to every current member.
    Status(LobbyStatus),
    /// Confirmation window closed with >= 2 confirmations: reserve the
    /// match with the ledger and seat this cohort on success. The lobby is
    /// already cleared.
    MatchReady { cohort: Vec<LobbyEntry> },
    /// Confirmation window closed with < 2 confirmations. Confirmed members
    /// get a no-stake-consumed notice, unconfirmed ones a best-effort
    /// ledger reset; everyone was dropped from the lobby.
    Canceled {
        confirmed: Vec<LobbyEntry>,
        unconfirmed: Vec<LobbyEntry>,
    },
    /// Membership fell below two mid-confirmation; notify the remainder.
    ConfirmationAborted { remaining: Vec<u32> },
}

pub struct Lobby {
    entries: HashMap<u32, LobbyEntry>,
    phase: LobbyPhase,
    capacity: usize,
    waiting_duration: Duration,
    confirm_duration: Duration,
}

impl Lobby {
    pub fn new(config: &GameConfig) -> Self {
        Lobby {
            entries: HashMap::new(),
            phase: LobbyPhase::Idle,
            capacity: config.room_capacity,
            waiting_duration: config.waiting_duration,
            confirm_duration: config.confirm_duration,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, player_id: u32) -> bool {
        self.entries.contains_key(&player_id)
    }

    pub fn member_ids(&self) -> Vec<u32> {
        self.entries.keys().copied().collect()
    }

    /// Admits a wallet-bearing player. A missing wallet, a wallet already
    /// present or a full lobby are protocol errors; nothing is mutated on
    /// rejection. Capping membership at the room capacity guarantees a
    /// confirmed cohort always fits the room it is seated into.
    pub fn join(
        &mut self,
        player_id: u32,
        wallet_address: Option<String>,
        reservation_id: Option<u64>,
        now: Instant,
    ) -> Result<Vec<LobbyEvent>, JoinError> {
        let wallet = match wallet_address {
            Some(w) if !w.is_empty() => w,
            _ => return Err(JoinError::MissingWallet),
        };
        if self.entries.values().any(|e| e.wallet_address == wallet) {
            return Err(JoinError::DuplicateWallet);
        }
        if self.entries.len() >= self.capacity {
            return Err(JoinError::LobbyFull);
        }

        info!(
            "Player {} ({}) joined lobby ({} -> {})",
            player_id,
            wallet,
            self.entries.len(),
            self.entries.len() + 1
        );
        self.entries.insert(
            player_id,
            LobbyEntry {
                player_id,
                wallet_address: wallet,
                reservation_id,
                confirmed: false,
            },
        );

        if self.entries.len() == 1 {
            self.phase = LobbyPhase::Gathering;
        } else if self.entries.len() >= self.capacity
            && !matches!(self.phase, LobbyPhase::Confirming(_))
        {
            // Full lobby skips the waiting countdown entirely
            self.enter_confirming(now);
        } else if matches!(self.phase, LobbyPhase::Idle | LobbyPhase::Gathering) {
            info!("Lobby reached 2 players, starting waiting timer");
            self.phase = LobbyPhase::Waiting(PhaseTimer::new(now, self.waiting_duration));
        }

        Ok(vec![LobbyEvent::Status(self.status(now))])
    }

    /// Removes a member (leave or disconnect). A leave from an empty lobby
    /// or for an unknown player is a no-op. Dropping below two members
    /// cancels whichever phase timer is active.
    pub fn leave(&mut self, player_id: u32, now: Instant) -> (Option<LobbyEntry>, Vec<LobbyEvent>) {
        let removed = match self.entries.remove(&player_id) {
            Some(entry) => entry,
            None => return (None, Vec::new()),
        };
        info!(
            "Player {} left lobby ({} remaining)",
            player_id,
            self.entries.len()
        );

        let mut events = Vec::new();
        if self.entries.len() < 2 {
            let next_phase = if self.entries.len() == 1 {
                LobbyPhase::Gathering
            } else {
                LobbyPhase::Idle
            };
            if matches!(self.phase, LobbyPhase::Confirming(_)) {
                info!("Membership dropped below 2 during confirmation, canceling match");
                events.push(LobbyEvent::ConfirmationAborted {
                    remaining: self.member_ids(),
                });
            }
            self.phase = next_phase;
        }

        events.push(LobbyEvent::Status(self.status(now)));
        (Some(removed), events)
    }

    /// Marks a member as confirmed. Only effective during the confirmation
    /// window.
    pub fn confirm(&mut self, player_id: u32, now: Instant) -> Vec<LobbyEvent> {
        if !matches!(self.phase, LobbyPhase::Confirming(_)) {
            return Vec::new();
        }
        match self.entries.get_mut(&player_id) {
            Some(entry) => {
                entry.confirmed = true;
                info!("Player {} confirmed join", player_id);
                vec![LobbyEvent::Status(self.status(now))]
            }
            None => Vec::new(),
        }
    }

    /// Drives the active phase timer. Called every server tick; emits a
    /// status broadcast at most once per second and resolves expired
    /// phases. Polling while Idle or Gathering is a no-op.
    pub fn poll(&mut self, now: Instant) -> Vec<LobbyEvent> {
        match &mut self.phase {
            LobbyPhase::Waiting(timer) => {
                if timer.expired(now) {
                    if self.entries.len() >= 2 {
                        self.enter_confirming(now);
                        vec![LobbyEvent::Status(self.status(now))]
                    } else {
                        // leave() downgrades before this can fire; guard anyway
                        self.phase = if self.entries.len() == 1 {
                            LobbyPhase::Gathering
                        } else {
                            LobbyPhase::Idle
                        };
                        Vec::new()
                    }
                } else if timer.should_broadcast(now) {
                    vec![LobbyEvent::Status(self.status(now))]
                } else {
                    Vec::new()
                }
            }
            LobbyPhase::Confirming(timer) => {
                if timer.expired(now) {
                    self.resolve_confirmation()
                } else if timer.should_broadcast(now) {
                    vec![LobbyEvent::Status(self.status(now))]
                } else {
                    Vec::new()
                }
            }
            LobbyPhase::Idle | LobbyPhase::Gathering => Vec::new(),
        }
    }

    /// Current status as broadcast to members. Raw Idle is never exposed
    /// while members are present; they see Gathering until a timer phase
    /// starts.
    pub fn status(&self, now: Instant) -> LobbyStatus {
        let lobby_state = match self.entries.len() {
            0 => LobbyStateTag::Idle,
            1 => LobbyStateTag::Gathering,
            _ => match &self.phase {
                LobbyPhase::Waiting(_) => LobbyStateTag::Waiting,
                LobbyPhase::Confirming(_) => LobbyStateTag::Confirming,
                _ => LobbyStateTag::Gathering,
            },
        };
        let time_remaining_ms = match &self.phase {
            LobbyPhase::Waiting(timer) | LobbyPhase::Confirming(timer) => timer.remaining_ms(now),
            _ => 0,
        };
        LobbyStatus {
            players: self.entries.len(),
            lobby_state,
            max_players: self.capacity,
            confirmed_count: self.entries.values().filter(|e| e.confirmed).count(),
            time_remaining_ms,
        }
    }

    fn enter_confirming(&mut self, now: Instant) {
        info!(
            "Lobby entering confirmation window ({} members)",
            self.entries.len()
        );
        self.phase = LobbyPhase::Confirming(PhaseTimer::new(now, self.confirm_duration));
    }

    /// Confirmation window closed: the lobby is emptied either way and the
    /// outcome depends on how many members confirmed.
    fn resolve_confirmation(&mut self) -> Vec<LobbyEvent> {
        let (confirmed, unconfirmed): (Vec<LobbyEntry>, Vec<LobbyEntry>) = self
            .entries
            .drain()
            .map(|(_, entry)| entry)
            .partition(|e| e.confirmed);
        self.phase = LobbyPhase::Idle;

        if confirmed.len() >= 2 {
            info!(
                "Confirmation window closed with {} confirmed players, reserving match",
                confirmed.len()
            );
            vec![LobbyEvent::MatchReady { cohort: confirmed }]
        } else {
            info!(
                "Confirmation window closed with {} confirmed players, canceling",
                confirmed.len()
            );
            vec![LobbyEvent::Canceled {
                confirmed,
                unconfirmed,
            }]
        }
    }
}
