//! Obstacles: positioned collision masks.
//!
//! An obstacle may be anything "physical": a non-passable brick or a custom
//! collider spawned by script. The physics engine works with obstacles only.

use std::sync::Arc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::collision::{CollisionMask, GroundDirection};
use crate::types::Point2;

bitflags! {
    /// Obstacle behavior flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ObstacleFlags: u8 {
        /// one-way platform
        const CLOUD = 0x1;
        /// horizontally flipped
        const HFLIP = 0x2;
        /// vertically flipped
        const VFLIP = 0x4;
        /// possibly moving / not static
        const NON_STATIC = 0x8;
    }
}

/// Obstacle layer. The actor collides with obstacles of its own layer and
/// with the default layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Layer {
    #[default]
    Default,
    Green,
    Yellow,
}

/// A collision mask placed at a world position. The mask is shared and
/// immutable; obstacles are owned by whoever spawned them (brick table,
/// script object) and the obstacle map only borrows them for one frame.
#[derive(Debug, Clone)]
pub struct Obstacle {
    position: Point2,
    width: i32,
    height: i32,
    layer: Layer,
    flags: ObstacleFlags,
    mask: Arc<CollisionMask>,
}

impl Obstacle {
    pub fn new(mask: Arc<CollisionMask>, position: Point2, layer: Layer, flags: ObstacleFlags) -> Self {
        let width = mask.width();
        let height = mask.height();

        Self {
            position,
            width,
            height,
            layer,
            flags,
            mask,
        }
    }

    /// Position in world coordinates.
    #[inline]
    pub fn position(&self) -> Point2 {
        self.position
    }

    /// Reposition the obstacle (moving platforms).
    pub fn set_position(&mut self, position: Point2) {
        self.position = position;
    }

    /// Is it solid, as opposed to a one-way cloud?
    #[inline]
    pub fn is_solid(&self) -> bool {
        !self.flags.contains(ObstacleFlags::CLOUD)
    }

    /// Not a moving obstacle?
    #[inline]
    pub fn is_static(&self) -> bool {
        !self.flags.contains(ObstacleFlags::NON_STATIC)
    }

    /// Width of the bounding box.
    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height of the bounding box.
    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// Layer filter rule: a default-layer obstacle is always eligible, a
    /// default filter matches everything, otherwise the layers must agree.
    #[inline]
    pub fn matches_layer(&self, filter: Layer) -> bool {
        self.layer == Layer::Default || filter == Layer::Default || filter == self.layer
    }

    /// Mirror mask-local coordinates according to the flip flags.
    #[inline]
    fn flip(&self, x: i32, y: i32) -> (i32, i32) {
        let x = if self.flags.contains(ObstacleFlags::HFLIP) {
            self.width - x - 1
        } else {
            x
        };
        let y = if self.flags.contains(ObstacleFlags::VFLIP) {
            self.height - y - 1
        } else {
            y
        };
        (x, y)
    }

    /// Find the ground position, given (x, y) in world coordinates.
    ///
    /// If the ground direction is up or down, this returns the absolute y
    /// position of the ground; if left or right, the absolute x position.
    pub fn ground_position(&self, x: i32, y: i32, direction: GroundDirection) -> i32 {
        /* no need to perform any clipping */
        let (x, y) = self.flip(x - self.position.x, y - self.position.y);

        /* flip the ground direction */
        let hflip = self.flags.contains(ObstacleFlags::HFLIP);
        let vflip = self.flags.contains(ObstacleFlags::VFLIP);
        let direction = if (hflip && !direction.is_vertical()) || (vflip && direction.is_vertical())
        {
            direction.flipped()
        } else {
            direction
        };

        /* get the absolute ground position */
        if direction.is_vertical() {
            let gnd = self.mask.locate_ground(x, y, direction);
            let (_, gnd) = self.flip(x, gnd);
            self.position.y + gnd
        } else {
            let gnd = self.mask.locate_ground(x, y, direction);
            let (gnd, _) = self.flip(gnd, y);
            self.position.x + gnd
        }
    }

    /// Pixel-perfect collision between the obstacle and a sensor segment.
    /// (x1, y1, x2, y2) are world coordinates with x1 <= x2 and y1 <= y2;
    /// the segment is vertical (x1 == x2), horizontal (y1 == y2) or a point.
    pub fn collides_with_segment(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> bool {
        /* this needs to be highly performant */
        let o_x1 = self.position.x;
        let o_y1 = self.position.y;
        let o_x2 = o_x1 + self.width;
        let o_y2 = o_y1 + self.height;

        /* bounding box rejection */
        if !(x1 < o_x2 && x2 >= o_x1 && y1 < o_y2 && y2 >= o_y1) {
            return false;
        }

        let flipped = self
            .flags
            .intersects(ObstacleFlags::HFLIP | ObstacleFlags::VFLIP);

        if y1 != y2 {
            /* vertical sensor */
            if x1 >= o_x1 && x1 < o_x2 {
                /* change of coordinates */
                let sy1 = y1.max(o_y1) - o_y1;
                let sy2 = y2.min(o_y2 - 1) - o_y1;
                let sx = x1 - o_x1;

                if !flipped {
                    return self.mask.area_test(sx, sy1, sx, sy2);
                }

                let (fx, fy1) = self.flip(sx, sy1);
                let (_, fy2) = self.flip(sx, sy2);
                return self.mask.area_test(fx, fy1.min(fy2), fx, fy1.max(fy2));
            }
        } else if x1 != x2 {
            /* horizontal sensor */
            if y1 >= o_y1 && y1 < o_y2 {
                let sx1 = x1.max(o_x1) - o_x1;
                let sx2 = x2.min(o_x2 - 1) - o_x1;
                let sy = y1 - o_y1;

                if !flipped {
                    return self.mask.area_test(sx1, sy, sx2, sy);
                }

                let (fx1, fy) = self.flip(sx1, sy);
                let (fx2, _) = self.flip(sx2, sy);
                return self.mask.area_test(fx1.min(fx2), fy, fx1.max(fx2), fy);
            }
        } else {
            /* single pixel; in bounds after the rejection test above */
            let (fx, fy) = self.flip(x1 - o_x1, y1 - o_y1);
            return self.mask.at(fx, fy);
        }

        false
    }

    /// Collision with a point in world space.
    #[inline]
    pub fn point_collision(&self, point: Point2) -> bool {
        self.collides_with_segment(point.x, point.y, point.x, point.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionMask;

    fn ramp() -> Arc<CollisionMask> {
        // 4x4: solid lower-left triangle, ascending to the left
        //   #...
        //   ##..
        //   ###.
        //   ####
        struct Tri;
        impl crate::collision::PixelSource for Tri {
            fn width(&self) -> i32 {
                4
            }
            fn height(&self) -> i32 {
                4
            }
            fn is_transparent(&self, x: i32, y: i32) -> bool {
                x > y
            }
        }
        Arc::new(CollisionMask::from_image(&Tri, 0, 0, 4, 4).unwrap())
    }

    #[test]
    fn test_segment_collision_translates_to_world() {
        let obstacle = Obstacle::new(ramp(), Point2::new(100, 50), Layer::Default, ObstacleFlags::empty());

        // vertical segment through the solid column x=100
        assert!(obstacle.collides_with_segment(100, 45, 100, 60));
        // vertical segment right of the triangle's top, above the slope
        assert!(!obstacle.collides_with_segment(103, 45, 103, 52));
        assert!(obstacle.collides_with_segment(103, 45, 103, 53));
        // horizontal segments
        assert!(obstacle.collides_with_segment(95, 53, 105, 53));
        assert!(!obstacle.collides_with_segment(95, 49, 105, 49));
        // points
        assert!(obstacle.point_collision(Point2::new(100, 50)));
        assert!(!obstacle.point_collision(Point2::new(101, 50)));
    }

    #[test]
    fn test_ground_position_down() {
        let obstacle = Obstacle::new(ramp(), Point2::new(100, 50), Layer::Default, ObstacleFlags::empty());

        assert_eq!(obstacle.ground_position(100, 40, GroundDirection::Down), 50);
        assert_eq!(obstacle.ground_position(101, 40, GroundDirection::Down), 51);
        assert_eq!(obstacle.ground_position(103, 40, GroundDirection::Down), 53);
    }

    #[test]
    fn test_hflip_mirrors_queries() {
        let plain = Obstacle::new(ramp(), Point2::new(0, 0), Layer::Default, ObstacleFlags::empty());
        let mirrored = Obstacle::new(ramp(), Point2::new(0, 0), Layer::Default, ObstacleFlags::HFLIP);

        // the ascending edge moves from the left to the right
        assert_eq!(plain.ground_position(0, 0, GroundDirection::Down), 0);
        assert_eq!(mirrored.ground_position(3, 0, GroundDirection::Down), 0);
        assert_eq!(plain.ground_position(3, 0, GroundDirection::Down), 3);
        assert_eq!(mirrored.ground_position(0, 0, GroundDirection::Down), 3);

        assert!(plain.point_collision(Point2::new(0, 0)));
        assert!(!mirrored.point_collision(Point2::new(0, 0)));
        assert!(mirrored.point_collision(Point2::new(3, 0)));
    }

    #[test]
    fn test_hflip_twice_is_identity() {
        let plain = Obstacle::new(ramp(), Point2::new(0, 0), Layer::Default, ObstacleFlags::empty());

        let mut flags = ObstacleFlags::empty();
        flags.toggle(ObstacleFlags::HFLIP);
        flags.toggle(ObstacleFlags::HFLIP);
        let double = Obstacle::new(ramp(), Point2::new(0, 0), Layer::Default, flags);

        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(
                    plain.point_collision(Point2::new(x, y)),
                    double.point_collision(Point2::new(x, y))
                );
                assert_eq!(
                    plain.ground_position(x, y, GroundDirection::Down),
                    double.ground_position(x, y, GroundDirection::Down)
                );
            }
        }
    }

    #[test]
    fn test_vflip_swaps_ground_directions() {
        let plain = Obstacle::new(ramp(), Point2::new(0, 0), Layer::Default, ObstacleFlags::empty());
        let upside_down = Obstacle::new(ramp(), Point2::new(0, 0), Layer::Default, ObstacleFlags::VFLIP);

        // the triangle hangs from the top once v-flipped: column 3 is solid
        // only at y=3 in the plain mask, so only at y=0 when flipped
        assert_eq!(plain.ground_position(3, 0, GroundDirection::Down), 3);
        assert_eq!(upside_down.ground_position(3, 3, GroundDirection::Up), 0);
        assert!(upside_down.point_collision(Point2::new(3, 0)));
        assert!(!upside_down.point_collision(Point2::new(3, 3)));
    }

    #[test]
    fn test_flags_and_layer_queries() {
        let solid = Obstacle::new(ramp(), Point2::new(0, 0), Layer::Default, ObstacleFlags::empty());
        let cloud = Obstacle::new(
            ramp(),
            Point2::new(0, 0),
            Layer::Green,
            ObstacleFlags::CLOUD | ObstacleFlags::NON_STATIC,
        );

        assert!(solid.is_solid());
        assert!(solid.is_static());
        assert!(!cloud.is_solid());
        assert!(!cloud.is_static());

        assert!(solid.matches_layer(Layer::Yellow), "default obstacle matches any filter");
        assert!(cloud.matches_layer(Layer::Default), "default filter matches any obstacle");
        assert!(cloud.matches_layer(Layer::Green));
        assert!(!cloud.matches_layer(Layer::Yellow));
    }

    #[test]
    fn test_set_position_moves_queries() {
        let mut obstacle = Obstacle::new(ramp(), Point2::new(0, 0), Layer::Default, ObstacleFlags::empty());
        assert!(obstacle.point_collision(Point2::new(0, 0)));

        obstacle.set_position(Point2::new(10, 10));
        assert!(!obstacle.point_collision(Point2::new(0, 0)));
        assert!(obstacle.point_collision(Point2::new(10, 10)));
    }
}
