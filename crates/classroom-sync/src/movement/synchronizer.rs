//! Local stepping and remote smoothing.

use std::collections::HashMap;
use std::time::Duration;

use tracing::trace;

use classroom_common::{ParticipantId, Position};
use classroom_config::{MovementConfig, RoomBounds};

use super::input::{Direction, HeldKeys};

/// Latest target and smoothed render position of one remote participant.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RemoteTrack {
    target: Position,
    rendered: Position,
}

/// Owns self's position and every remote participant's position track.
///
/// Membership checks are the caller's job: `apply_remote` stores whatever
/// it is given, so the Room Controller only calls it for registered ids.
#[derive(Debug)]
pub struct MovementSynchronizer {
    speed: f32,
    lerp_factor: f32,
    bounds: RoomBounds,
    spawn: Position,
    waiting_area: Position,

    local: Position,
    keys: HeldKeys,
    suspended: bool,
    remote: HashMap<ParticipantId, RemoteTrack>,
}

impl MovementSynchronizer {
    pub fn new(config: &MovementConfig) -> Self {
        let spawn = Position::from(config.spawn);
        Self {
            speed: config.speed,
            lerp_factor: config.lerp_factor,
            bounds: config.bounds.clone(),
            spawn,
            waiting_area: Position::from(config.waiting_area),
            local: spawn,
            keys: HeldKeys::default(),
            suspended: false,
            remote: HashMap::new(),
        }
    }

    // -- local ---------------------------------------------------------------

    pub fn set_key(&mut self, direction: Direction, pressed: bool) {
        self.keys.set(direction, pressed);
    }

    pub fn release_all_keys(&mut self) {
        self.keys.clear();
    }

    /// While suspended (a modal input has focus) held keys do not move self.
    pub fn set_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
        if suspended {
            self.keys.clear();
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn local_position(&self) -> Position {
        self.local
    }

    /// Put self back on the spawn point and drop held keys.
    pub fn reset_local(&mut self) {
        self.local = self.spawn;
        self.keys.clear();
        self.suspended = false;
    }

    /// Advance self by the held keys over `elapsed`. Returns the new position
    /// only if it changed, i.e. when there is something to broadcast.
    pub fn tick(&mut self, elapsed: Duration) -> Option<Position> {
        if self.suspended || !self.keys.any() {
            return None;
        }

        let (dx, dz) = self.keys.vector();
        let step = self.speed * elapsed.as_secs_f32();
        let candidate = Position::new(
            (self.local.x + dx * step).clamp(self.bounds.min_x, self.bounds.max_x),
            self.local.y,
            (self.local.z + dz * step).clamp(self.bounds.min_z, self.bounds.max_z),
        );

        if candidate == self.local {
            return None;
        }
        self.local = candidate;
        Some(candidate)
    }

    // -- remote --------------------------------------------------------------

    /// Store a received sample as the participant's target. The first sample
    /// starts the rendered position at the waiting area. Non-finite samples
    /// are dropped.
    pub fn apply_remote(&mut self, id: &ParticipantId, position: Position) -> bool {
        if !position.is_finite() {
            trace!(participant = %id, "Dropping non-finite position sample");
            return false;
        }
        let waiting_area = self.waiting_area;
        self.remote
            .entry(id.clone())
            .and_modify(|track| track.target = position)
            .or_insert(RemoteTrack {
                target: position,
                rendered: waiting_area,
            });
        true
    }

    /// One render tick of exponential smoothing toward each target.
    pub fn interpolate(&mut self) {
        let k = self.lerp_factor;
        for track in self.remote.values_mut() {
            let r = track.rendered;
            let t = track.target;
            track.rendered = Position::new(
                r.x + (t.x - r.x) * k,
                r.y + (t.y - r.y) * k,
                r.z + (t.z - r.z) * k,
            );
        }
    }

    pub fn target_position(&self, id: &ParticipantId) -> Option<Position> {
        self.remote.get(id).map(|track| track.target)
    }

    pub fn rendered_position(&self, id: &ParticipantId) -> Option<Position> {
        self.remote.get(id).map(|track| track.rendered)
    }

    /// Where a participant without any sample yet is drawn.
    pub fn waiting_area(&self) -> Position {
        self.waiting_area
    }

    pub fn remove(&mut self, id: &ParticipantId) -> bool {
        self.remote.remove(id).is_some()
    }

    pub fn clear_remote(&mut self) {
        self.remote.clear();
    }

    pub fn remote_count(&self) -> usize {
        self.remote.len()
    }
}
