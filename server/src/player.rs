//! Server-side player entity: spawn placement, whitelisted client updates
//! and the segment-following body constraint.

use rand::Rng;
use shared::{
    PlayerSnapshot, PlayerUpdateData, SegmentPoint, INVULNERABILITY_MS, MAX_SEGMENTS, MIN_SEGMENTS,
    SEGMENT_SPACING, SPAWN_MARGIN, WORLD_SIZE,
};
use std::time::{Duration, Instant};

/// Authoritative player state. Owned exclusively by one room; mutation goes
/// through the room's operations only.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    /// Body chain; `segments[0]` always equals `(x, y)`.
    pub segments: Vec<SegmentPoint>,
    pub kills: u32,
    pub is_alive: bool,
    pub color: u32,
    pub wallet_address: Option<String>,
    pub reservation_id: Option<u64>,
    pub join_time: Instant,
    pub spawn_time: Instant,
    pub is_invulnerable: bool,
    pub food_eaten_count: u32,
}

impl Player {
    /// Spawns a player at a random position away from the world edges with
    /// the minimum body length trailing to the left.
    pub fn spawn(
        id: u32,
        color: u32,
        wallet_address: Option<String>,
        reservation_id: Option<u64>,
        now: Instant,
    ) -> Self {
        let mut rng = rand::thread_rng();
        let x = rng.gen_range(SPAWN_MARGIN..WORLD_SIZE - SPAWN_MARGIN);
        let y = rng.gen_range(SPAWN_MARGIN..WORLD_SIZE - SPAWN_MARGIN);

        let mut segments = Vec::with_capacity(MIN_SEGMENTS);
        for i in 0..MIN_SEGMENTS {
            segments.push(SegmentPoint::new(x - i as f32 * SEGMENT_SPACING, y));
        }

        Player {
            id,
            x,
            y,
            angle: 0.0,
            segments,
            kills: 0,
            is_alive: true,
            color,
            wallet_address,
            reservation_id,
            join_time: now,
            spawn_time: now,
            is_invulnerable: true,
            food_eaten_count: 0,
        }
    }

    pub fn head(&self) -> SegmentPoint {
        SegmentPoint::new(self.x, self.y)
    }

    /// Applies a client update. Only the whitelisted fields (x, y, angle,
    /// segments) are taken; anything else the client sends never reaches
    /// authoritative state. The head segment is re-pinned afterwards.
    pub fn apply_update(&mut self, data: &PlayerUpdateData) {
        if !data.x.is_finite() || !data.y.is_finite() || !data.angle.is_finite() {
            return;
        }

        self.x = data.x;
        self.y = data.y;
        self.angle = data.angle;

        if let Some(segments) = &data.segments {
            if segments.iter().all(|s| s.x.is_finite() && s.y.is_finite()) {
                self.segments = segments.iter().take(MAX_SEGMENTS).copied().collect();
            }
        }

        self.follow_segments();
    }

    /// Pins the head to the current position, then pulls each segment to
    /// exactly `SEGMENT_SPACING` behind its predecessor when it has drifted
    /// farther than that. One pass per update; not iterated to convergence.
    pub fn follow_segments(&mut self) {
        if self.segments.is_empty() {
            self.segments.push(SegmentPoint::new(self.x, self.y));
            return;
        }

        self.segments[0].x = self.x;
        self.segments[0].y = self.y;

        for i in 1..self.segments.len() {
            let prev = self.segments[i - 1];
            let curr = self.segments[i];

            let dx = prev.x - curr.x;
            let dy = prev.y - curr.y;
            let distance = (dx * dx + dy * dy).sqrt();

            if distance > SEGMENT_SPACING {
                let ratio = SEGMENT_SPACING / distance;
                self.segments[i].x = prev.x - dx * ratio;
                self.segments[i].y = prev.y - dy * ratio;
            }
        }
    }

    /// Appends one body segment at the tail position. Returns false once the
    /// cap is reached.
    pub fn grow(&mut self) -> bool {
        if self.segments.len() >= MAX_SEGMENTS {
            return false;
        }
        let tail = *self
            .segments
            .last()
            .unwrap_or(&SegmentPoint::new(self.x, self.y));
        self.segments.push(tail);
        true
    }

    /// Clears invulnerability once the grace period since spawn has passed.
    /// Returns true on the transition tick.
    pub fn update_invulnerability(&mut self, now: Instant) -> bool {
        if self.is_invulnerable
            && now.duration_since(self.spawn_time) >= Duration::from_millis(INVULNERABILITY_MS)
        {
            self.is_invulnerable = false;
            return true;
        }
        false
    }

    /// Snapshot with defensive defaults: an invalid position is replaced by
    /// the world center and the head segment is forced onto the position.
    pub fn snapshot(&self) -> PlayerSnapshot {
        let center = WORLD_SIZE / 2.0;
        let x = if self.x.is_finite() { self.x } else { center };
        let y = if self.y.is_finite() { self.y } else { center };

        let mut segments = self.segments.clone();
        if let Some(head) = segments.first_mut() {
            head.x = x;
            head.y = y;
        }

        PlayerSnapshot {
            id: self.id,
            x,
            y,
            angle: self.angle,
            segment_count: segments.len(),
            segments,
            kills: self.kills,
            is_alive: self.is_alive,
            color: self.color,
            is_invulnerable: self.is_invulnerable,
            wallet_address: self.wallet_address.clone(),
        }
    }
}
