//! Collision detection: masks, obstacles, the per-frame obstacle map and
//! the actor's probe sensors.

mod mask;
mod obstacle;
mod obstacle_map;
mod sensor;

pub use mask::{CollisionMask, GroundDirection, PixelSource, CLOUD_HEIGHT, MASK_MAX_SIZE};
pub use obstacle::{Layer, Obstacle, ObstacleFlags};
pub use obstacle_map::ObstacleMap;
pub use sensor::Sensor;
