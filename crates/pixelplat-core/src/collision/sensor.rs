//! Sensors: oriented probe segments attached to the physics actor.
//!
//! A sensor is an oriented segment [head -> tail] in actor-local
//! coordinates, with head.x == tail.x (vertical) or head.y == tail.y
//! (horizontal). Diagonal sensors are unrepresentable: the constructors
//! take a single coordinate for the shared axis. The tail is the probing
//! end; the head is the reference end.
//!
//! Sensors rotate into world space according to the actor's movement mode
//! (0, 90, 180 or 270 degrees clockwise around the actor position).

use crate::actor::MovMode;
use crate::collision::{Layer, Obstacle, ObstacleMap};
use crate::types::{Point2, Vec2};

#[derive(Debug, Clone)]
pub struct Sensor {
    local_head: Point2,
    local_tail: Point2,
    enabled: bool,
}

impl Sensor {
    /// Create a horizontal sensor at height y, from head_x to tail_x.
    pub fn horizontal(y: i32, head_x: i32, tail_x: i32) -> Self {
        Self {
            local_head: Point2::new(head_x, y),
            local_tail: Point2::new(tail_x, y),
            enabled: true,
        }
    }

    /// Create a vertical sensor at column x, from head_y to tail_y.
    pub fn vertical(x: i32, head_y: i32, tail_y: i32) -> Self {
        Self {
            local_head: Point2::new(x, head_y),
            local_tail: Point2::new(x, tail_y),
            enabled: true,
        }
    }

    /// The head of the sensor relative to the actor; not rotated.
    #[inline]
    pub fn local_head(&self) -> Point2 {
        self.local_head
    }

    /// The tail of the sensor relative to the actor; not rotated.
    #[inline]
    pub fn local_tail(&self) -> Point2 {
        self.local_tail
    }

    /// Will the sensor detect collisions?
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the sensor.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// The sensor segment in world space, rotated according to the movement
    /// mode. Returns (head, tail); the endpoints are NOT sorted.
    pub fn world_segment(&self, actor_position: Vec2, mm: MovMode) -> (Point2, Point2) {
        let origin = actor_position.to_point();
        let head = mm.rotate(self.local_head);
        let tail = mm.rotate(self.local_tail);
        (origin + head, origin + tail)
    }

    /// The head of the sensor in world space.
    #[inline]
    pub fn head(&self, actor_position: Vec2, mm: MovMode) -> Point2 {
        self.world_segment(actor_position, mm).0
    }

    /// The tail of the sensor in world space.
    #[inline]
    pub fn tail(&self, actor_position: Vec2, mm: MovMode) -> Point2 {
        self.world_segment(actor_position, mm).1
    }

    /// Find an obstacle that collides with the sensor. Returns None if
    /// there is no such obstacle or if the sensor is disabled.
    pub fn check<'m>(
        &self,
        actor_position: Vec2,
        mm: MovMode,
        layer_filter: Layer,
        map: &ObstacleMap<'m>,
    ) -> Option<&'m Obstacle> {
        if !self.enabled {
            return None;
        }

        let (head, tail) = self.world_segment(actor_position, mm);
        map.best_obstacle_at(
            head.x.min(tail.x),
            head.y.min(tail.y),
            head.x.max(tail.x),
            head.y.max(tail.y),
            mm,
            layer_filter,
        )
    }

    /// Check if the sensor is overlapping a specific obstacle.
    pub fn overlaps_obstacle(
        &self,
        actor_position: Vec2,
        mm: MovMode,
        layer_filter: Layer,
        obstacle: &Obstacle,
    ) -> bool {
        let (head, tail) = self.world_segment(actor_position, mm);

        obstacle.matches_layer(layer_filter)
            && obstacle.collides_with_segment(
                head.x.min(tail.x),
                head.y.min(tail.y),
                head.x.max(tail.x),
                head.y.max(tail.y),
            )
    }

    /// A segment that starts at the tail of the sensor and grows outward
    /// along the sensor orientation, with the given length. A negative
    /// length grows from the tail back towards the head. Returns
    /// (extended_head, extended_tail).
    pub fn extend(
        &self,
        actor_position: Vec2,
        mm: MovMode,
        extended_length: i32,
    ) -> (Point2, Point2) {
        let (head, tail) = self.world_segment(actor_position, mm);

        /* normalized direction: (0,-1), (1,0), (0,1), (-1,0), or zero for
           a point sensor, which will not be extended */
        let delta = tail - head;
        let dir = Point2::new(delta.x.signum(), delta.y.signum());
        debug_assert!(dir.x * dir.x + dir.y * dir.y <= 1);

        let lambda = match extended_length {
            l if l > 0 => l - 1,
            l if l < 0 => l + 1,
            _ => 0,
        };

        let extended_head = tail;
        let extended_tail = Point2::new(
            extended_head.x + dir.x * lambda,
            extended_head.y + dir.y * lambda,
        );
        (extended_head, extended_tail)
    }
}
