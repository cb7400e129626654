//! Movement and interpolation configuration types.

use serde::{Deserialize, Serialize};

/// Axis-aligned walkable area of the room. `y` is not bounded; it stays fixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Default for RoomBounds {
    fn default() -> Self {
        Self {
            min_x: -10.0,
            max_x: 10.0,
            min_z: -8.0,
            max_z: 12.0,
        }
    }
}

impl RoomBounds {
    pub fn contains(&self, x: f32, z: f32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_z..=self.max_z).contains(&z)
    }
}

/// Local movement loop and remote smoothing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Movement tick cadence in milliseconds (~30 Hz).
    pub tick_interval_ms: u32,
    /// Walking speed in room units per second.
    pub speed: f32,
    /// Fraction of the remaining distance covered per render tick.
    pub lerp_factor: f32,
    pub bounds: RoomBounds,
    /// Where the local participant appears after joining.
    pub spawn: [f32; 3],
    /// Where remote participants are drawn before their first position sample.
    pub waiting_area: [f32; 3],
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 33,
            speed: 5.0,
            lerp_factor: 0.1,
            bounds: RoomBounds::default(),
            spawn: [0.0, 0.75, 4.0],
            waiting_area: [-5.0, 0.75, 8.0],
        }
    }
}
