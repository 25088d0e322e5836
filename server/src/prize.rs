//! End-of-match ranking and prize split: survivors first by kills, a
//! 50/30/20 weight walk over kill-count groups, ties splitting evenly,
//! nothing past position three.

use crate::room::Room;
use log::info;
use shared::{LeaderboardEntry, PrizeShare, PRIZE_WEIGHTS};
use std::collections::HashSet;

/// Final ranking: survivors sorted by kills descending, then eliminated
/// players sorted by kills descending.
pub fn final_leaderboard(room: &Room) -> Vec<LeaderboardEntry> {
    let mut survivors: Vec<LeaderboardEntry> = Vec::new();
    let mut eliminated: Vec<LeaderboardEntry> = Vec::new();

    for player in room.players.values() {
        let entry = LeaderboardEntry {
            player_id: player.id,
            wallet_address: player.wallet_address.clone(),
            kills: player.kills,
            survived: player.is_alive,
        };
        if player.is_alive {
            survivors.push(entry);
        } else {
            eliminated.push(entry);
        }
    }

    survivors.sort_by(|a, b| b.kills.cmp(&a.kills).then(a.player_id.cmp(&b.player_id)));
    eliminated.sort_by(|a, b| b.kills.cmp(&a.kills).then(a.player_id.cmp(&b.player_id)));

    survivors.extend(eliminated);
    survivors
}

/// Splits the pool across the leaderboard. Only survivors are eligible, a
/// wallet collects at most once, and the position weights stop after
/// position three with no redistribution past it. When fewer winners than
/// prize positions exist, the consumed weights are scaled up so the winners
/// present take the whole pool (a sole winner collects 100%).
pub fn calculate_distribution(leaderboard: &[LeaderboardEntry], pool: f64) -> Vec<PrizeShare> {
    let mut distributions = Vec::new();
    if leaderboard.is_empty() {
        return distributions;
    }

    // Eliminated players never win, whatever their kill count. Entries
    // without a wallet cannot be paid out.
    let mut seen_wallets: HashSet<&str> = HashSet::new();
    let mut eligible: Vec<&LeaderboardEntry> = Vec::new();
    for entry in leaderboard.iter().filter(|e| e.survived) {
        match entry.wallet_address.as_deref() {
            Some(wallet) if seen_wallets.insert(wallet) => eligible.push(entry),
            Some(wallet) => {
                info!(
                    "Duplicate wallet {} (player {}) skipped in prize split",
                    wallet, entry.player_id
                );
            }
            None => {}
        }
    }

    if eligible.is_empty() {
        info!("No eligible survivors, no prize distribution");
        return distributions;
    }

    // Group by kill count; ties share one group. `eligible` is already in
    // descending kill order, so groups come out highest first.
    let mut groups: Vec<Vec<&LeaderboardEntry>> = Vec::new();
    for entry in eligible {
        match groups.last_mut() {
            Some(group) if group[0].kills == entry.kills => group.push(entry),
            _ => groups.push(vec![entry]),
        }
    }

    let mut position = 0usize;
    let mut consumed_weight = 0.0_f64;
    for group in groups {
        if position >= PRIZE_WEIGHTS.len() {
            break;
        }

        // A tied group spanning several positions takes the sum of their
        // weights, split evenly.
        let group_weight: f64 = PRIZE_WEIGHTS
            .iter()
            .skip(position)
            .take(group.len())
            .sum();
        let individual_share = group_weight / group.len() as f64;
        consumed_weight += group_weight;

        for entry in &group {
            let wallet = match entry.wallet_address.as_deref() {
                Some(wallet) => wallet.to_string(),
                None => continue,
            };
            distributions.push(PrizeShare {
                wallet_address: wallet,
                player_id: entry.player_id,
                position: position + 1,
                kills: entry.kills,
                prize: pool * individual_share,
                percentage: individual_share * 100.0,
            });
        }

        position += group.len();
    }

    // Fewer winners than prize positions leaves weight on the table; scale
    // the shares so the winners present take the whole pool.
    if consumed_weight > 0.0 && consumed_weight < 1.0 {
        let scale = 1.0 / consumed_weight;
        for share in &mut distributions {
            share.prize *= scale;
            share.percentage *= scale;
        }
    }

    distributions
}
