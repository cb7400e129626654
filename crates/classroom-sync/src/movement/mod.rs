//! Movement synchronizer: held-key stepping of self inside the room box,
//! and smoothed rendering of remote participants toward their latest sample.

mod input;
mod synchronizer;

pub use input::{Direction, HeldKeys};
pub use synchronizer::MovementSynchronizer;
