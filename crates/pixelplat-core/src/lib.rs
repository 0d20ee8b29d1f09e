//! Pixelplat Core - pixel-perfect platformer physics
//!
//! This crate contains the platform-independent player physics simulation:
//! - Collision masks with O(1) area and ground queries (summed-area tables
//!   and ground maps)
//! - Obstacles, the per-frame obstacle map, and probe sensors
//! - The fixed-step physics actor: an 18-state machine with rotation-aware
//!   movement modes, sticky ground and terrain-following angles
//!
//! Rendering, input devices, audio and level loading live elsewhere: the
//! core takes an input snapshot and an obstacle map, and reports back
//! through queries and observer events.

pub mod actor;
pub mod collision;
pub mod error;
pub mod input;
pub mod types;

// Re-export core types at crate root for convenience
pub use types::{vec2, Point2, Vec2};

// Re-export key types from submodules
pub use actor::{MovMode, PhysicsActor, PhysicsEvent, State, Tunables, HARD_CAPSPEED};
pub use collision::{
    CollisionMask, GroundDirection, Layer, Obstacle, ObstacleFlags, ObstacleMap, PixelSource,
    Sensor,
};
pub use error::{PhysicsError, Result};
pub use input::{Button, InputSnapshot};
