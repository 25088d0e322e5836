//! # Arena Game Server Library
//!
//! Authoritative backend for the real-time multiplayer arena game. The
//! server owns every gameplay decision: clients stream movement updates and
//! render what they are told, while collisions, kills, growth, timers and
//! payouts are computed exclusively here.
//!
//! ## Core Responsibilities
//!
//! ### Matchmaking
//! Players queue in a wallet-gated lobby that moves through gathering,
//! waiting and confirmation phases. A confirmed cohort has its stakes
//! locked with the external ledger before being seated together in a fresh
//! room.
//!
//! ### Room Simulation
//! Each room runs a fixed-rate simulation over its players and food field:
//! head-versus-body collision scanning, kill resolution with a dedup
//! window, food consumption driving segment growth, and a match countdown.
//!
//! ### Settlement
//! When a match clock expires the server ranks survivors, splits the prize
//! pool by placement, and hands the payout to the ledger gateway. All
//! ledger traffic runs on a worker task so the simulation never blocks on
//! the network.
//!
//! ## Module Organization
//!
//! - [`config`]: runtime tunables shared by lobby, registry and rooms
//! - [`connection`]: UDP address bookkeeping, timeouts and throttling
//! - [`ledger`]: asynchronous gateway to the external stake ledger
//! - [`lobby`]: the pre-match matchmaking state machine
//! - [`network`]: transport tasks, packet handling and the main loop
//! - [`player`]: per-player state and segment mechanics
//! - [`prize`]: leaderboard ranking and prize pool distribution
//! - [`registry`]: room lookup, default-room reuse and player placement
//! - [`room`]: the authoritative per-room simulation

pub mod config;
pub mod connection;
pub mod ledger;
pub mod lobby;
pub mod network;
pub mod player;
pub mod prize;
pub mod registry;
pub mod room;
