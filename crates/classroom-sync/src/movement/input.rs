//! Held-key intent.

use std::str::FromStr;

/// One of the four walking directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Forward,
        Direction::Backward,
        Direction::Left,
        Direction::Right,
    ];

    /// Map a key name to a direction. Accepts WASD (either case) and the
    /// arrow key names.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "w" | "W" | "ArrowUp" => Some(Self::Forward),
            "s" | "S" | "ArrowDown" => Some(Self::Backward),
            "a" | "A" | "ArrowLeft" => Some(Self::Left),
            "d" | "D" | "ArrowRight" => Some(Self::Right),
            _ => None,
        }
    }

    /// Unit step on the floor plane as `(dx, dz)`. Forward is -z.
    pub fn delta(self) -> (f32, f32) {
        match self {
            Self::Forward => (0.0, -1.0),
            Self::Backward => (0.0, 1.0),
            Self::Left => (-1.0, 0.0),
            Self::Right => (1.0, 0.0),
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Forward => 0,
            Self::Backward => 1,
            Self::Left => 2,
            Self::Right => 3,
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(dir) = Self::from_key(s) {
            return Ok(dir);
        }
        match s.to_ascii_lowercase().as_str() {
            "forward" | "up" => Ok(Self::Forward),
            "backward" | "back" | "down" => Ok(Self::Backward),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

/// Which direction keys are currently held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldKeys([bool; 4]);

impl HeldKeys {
    pub fn set(&mut self, direction: Direction, pressed: bool) {
        self.0[direction.index()] = pressed;
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        self.0[direction.index()]
    }

    pub fn clear(&mut self) {
        self.0 = [false; 4];
    }

    pub fn any(&self) -> bool {
        self.0.iter().any(|held| *held)
    }

    /// Summed direction vector. Opposite keys cancel; diagonals are not
    /// normalized.
    pub fn vector(&self) -> (f32, f32) {
        Direction::ALL
            .iter()
            .filter(|dir| self.is_held(**dir))
            .fold((0.0, 0.0), |(x, z), dir| {
                let (dx, dz) = dir.delta();
                (x + dx, z + dz)
            })
    }
}
