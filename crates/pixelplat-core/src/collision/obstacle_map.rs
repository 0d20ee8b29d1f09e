//! The obstacle map: the set of obstacles the actor may collide with on the
//! current frame.
//!
//! The level rebuilds the map every frame from active bricks and script
//! colliders; the map only borrows the obstacles. When multiple obstacles
//! overlap a sensor, [`ObstacleMap::best_obstacle_at`] arbitrates between
//! them, which matters when the player stands at the seam of two bricks.

use crate::actor::MovMode;
use crate::collision::{GroundDirection, Layer, Obstacle};

/// Per-frame set of obstacle references.
#[derive(Debug, Default)]
pub struct ObstacleMap<'a> {
    obstacles: Vec<&'a Obstacle>,
}

impl<'a> ObstacleMap<'a> {
    pub fn new() -> Self {
        Self {
            obstacles: Vec::with_capacity(32),
        }
    }

    /// Append an obstacle. No copy, no dedup.
    pub fn add(&mut self, obstacle: &'a Obstacle) {
        self.obstacles.push(obstacle);
    }

    /// Remove all obstacles from the map.
    pub fn clear(&mut self) {
        self.obstacles.clear();
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Find the "best" obstacle colliding with the segment
    /// [x1,y1] x [x2,y2], where x1 <= x2 and y1 <= y2 come already rotated
    /// according to the movement mode. Returns None when nothing collides.
    pub fn best_obstacle_at(
        &self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        mm: MovMode,
        layer_filter: Layer,
    ) -> Option<&'a Obstacle> {
        let mut best: Option<&'a Obstacle> = None;

        for &obstacle in &self.obstacles {
            if obstacle.matches_layer(layer_filter)
                && obstacle.collides_with_segment(x1, y1, x2, y2)
            {
                best = Some(match best {
                    None => obstacle,
                    Some(current) => pick_best_obstacle(obstacle, current, x1, y1, x2, y2, mm),
                });
            }
        }

        best
    }

    /// Is there any obstacle at (x, y)?
    pub fn obstacle_exists_at(&self, x: i32, y: i32) -> bool {
        self.obstacles
            .iter()
            .any(|o| o.collides_with_segment(x, y, x, y))
    }

    /// Is there a solid obstacle at (x, y)?
    pub fn solid_exists_at(&self, x: i32, y: i32) -> bool {
        self.obstacles
            .iter()
            .any(|o| o.is_solid() && o.collides_with_segment(x, y, x, y))
    }

    /// Extended-sensor sweep: along the segment [x1,y1] x [x2,y2], locate
    /// the obstacle whose ground position falls inside the segment window
    /// and is nearest to the probe origin (the window end the actor is on,
    /// given by the ground direction). Returns the obstacle and the
    /// absolute ground coordinate.
    pub fn find_ground(
        &self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        layer_filter: Layer,
        direction: GroundDirection,
    ) -> Option<(&'a Obstacle, i32)> {
        let mut best: Option<(&'a Obstacle, i32)> = None;

        for &obstacle in &self.obstacles {
            if !obstacle.matches_layer(layer_filter)
                || !obstacle.collides_with_segment(x1, y1, x2, y2)
            {
                continue;
            }

            /* probe from the window end nearest to the actor */
            let gnd = match direction {
                GroundDirection::Down => obstacle.ground_position(x1, y1, direction),
                GroundDirection::Up => obstacle.ground_position(x1, y2, direction),
                GroundDirection::Right => obstacle.ground_position(x1, y1, direction),
                GroundDirection::Left => obstacle.ground_position(x2, y1, direction),
            };

            /* the ground must be inside the extension window */
            let (lo, hi) = if direction.is_vertical() {
                (y1, y2)
            } else {
                (x1, x2)
            };
            if gnd < lo || gnd > hi {
                continue;
            }

            let closer = match best {
                None => true,
                Some((_, best_gnd)) => match direction {
                    GroundDirection::Down | GroundDirection::Right => gnd < best_gnd,
                    GroundDirection::Up | GroundDirection::Left => gnd > best_gnd,
                },
            };
            if closer {
                best = Some((obstacle, gnd));
            }
        }

        best
    }
}

/// Considering that a and b both overlap the sensor, which one should we
/// pick? The sensor segment comes rotated according to the movmode.
fn pick_best_obstacle<'a>(
    a: &'a Obstacle,
    b: &'a Obstacle,
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    mm: MovMode,
) -> &'a Obstacle {
    /* solid obstacles are better than one-way platforms */
    if !a.is_solid() && b.is_solid() {
        return b;
    }
    if !b.is_solid() && a.is_solid() {
        return a;
    }

    /* one-way platforms only: get the shortest obstacle */
    if !a.is_solid() && !b.is_solid() {
        return match mm {
            MovMode::Floor => {
                let ha = a.ground_position(x2, y2, GroundDirection::Down);
                let hb = b.ground_position(x2, y2, GroundDirection::Down);
                if ha >= hb { a } else { b }
            }
            MovMode::RightWall => {
                let ha = a.ground_position(x2, y2, GroundDirection::Right);
                let hb = b.ground_position(x2, y2, GroundDirection::Right);
                if ha >= hb { a } else { b }
            }
            MovMode::Ceiling => {
                let ha = a.ground_position(x2, y1, GroundDirection::Up);
                let hb = b.ground_position(x2, y1, GroundDirection::Up);
                if ha < hb { a } else { b }
            }
            MovMode::LeftWall => {
                let ha = a.ground_position(x1, y2, GroundDirection::Left);
                let hb = b.ground_position(x1, y2, GroundDirection::Left);
                if ha < hb { a } else { b }
            }
        };
    }

    /* solid obstacles: get the tallest one */
    match mm {
        MovMode::Floor => {
            /* x1 == x2; y2 == max(y1, y2) */
            let ha = a.ground_position(x2, y2, GroundDirection::Down);
            let hb = b.ground_position(x2, y2, GroundDirection::Down);
            if ha < hb { a } else { b }
        }
        MovMode::LeftWall => {
            /* x1 == min(x1, x2); y1 == y2 */
            let ha = a.ground_position(x1, y2, GroundDirection::Left);
            let hb = b.ground_position(x1, y2, GroundDirection::Left);
            if ha >= hb { a } else { b }
        }
        MovMode::Ceiling => {
            /* x1 == x2; y1 == min(y1, y2) */
            let ha = a.ground_position(x2, y1, GroundDirection::Up);
            let hb = b.ground_position(x2, y1, GroundDirection::Up);
            if ha >= hb { a } else { b }
        }
        MovMode::RightWall => {
            /* x2 == max(x1, x2); y1 == y2 */
            let ha = a.ground_position(x2, y2, GroundDirection::Right);
            let hb = b.ground_position(x2, y2, GroundDirection::Right);
            if ha < hb { a } else { b }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CollisionMask, ObstacleFlags};
    use crate::types::Point2;
    use std::sync::Arc;

    fn boxed(w: usize, h: usize) -> Arc<CollisionMask> {
        Arc::new(CollisionMask::solid_box(w, h).unwrap())
    }

    #[test]
    fn test_add_and_clear() {
        let mask = boxed(16, 16);
        let a = Obstacle::new(mask.clone(), Point2::new(0, 0), Layer::Default, ObstacleFlags::empty());

        let mut map = ObstacleMap::new();
        assert!(map.is_empty());
        map.add(&a);
        map.add(&a);
        assert_eq!(map.len(), 2);
        map.clear();
        assert!(map.is_empty());
    }

    #[test]
    fn test_point_queries() {
        let mask = boxed(16, 16);
        let solid = Obstacle::new(mask.clone(), Point2::new(0, 0), Layer::Default, ObstacleFlags::empty());
        let cloud = Obstacle::new(mask.clone(), Point2::new(100, 0), Layer::Default, ObstacleFlags::CLOUD);

        let mut map = ObstacleMap::new();
        map.add(&solid);
        map.add(&cloud);

        assert!(map.obstacle_exists_at(5, 5));
        assert!(map.obstacle_exists_at(105, 5));
        assert!(!map.obstacle_exists_at(50, 5));

        assert!(map.solid_exists_at(5, 5));
        assert!(!map.solid_exists_at(105, 5));
    }

    #[test]
    fn test_solid_beats_cloud() {
        let mask = boxed(32, 32);
        let solid = Obstacle::new(mask.clone(), Point2::new(0, 10), Layer::Default, ObstacleFlags::empty());
        let cloud = Obstacle::new(mask.clone(), Point2::new(0, 0), Layer::Default, ObstacleFlags::CLOUD);

        let mut map = ObstacleMap::new();
        map.add(&cloud);
        map.add(&solid);

        let best = map
            .best_obstacle_at(5, 5, 5, 20, MovMode::Floor, Layer::Default)
            .unwrap();
        assert!(std::ptr::eq(best, &solid));
    }

    #[test]
    fn test_tallest_solid_wins_on_floor() {
        let mask_tall = boxed(32, 32);
        let mask_short = boxed(32, 8);
        // both tops overlap the sensor; the taller one protrudes further up
        let tall = Obstacle::new(mask_tall, Point2::new(0, 20), Layer::Default, ObstacleFlags::empty());
        let short = Obstacle::new(mask_short, Point2::new(0, 28), Layer::Default, ObstacleFlags::empty());

        let mut map = ObstacleMap::new();
        map.add(&short);
        map.add(&tall);

        let best = map
            .best_obstacle_at(5, 0, 5, 30, MovMode::Floor, Layer::Default)
            .unwrap();
        assert!(std::ptr::eq(best, &tall), "the taller floor must win");
    }

    #[test]
    fn test_shortest_cloud_wins_on_floor() {
        let mask = boxed(32, 32);
        let high = Obstacle::new(mask.clone(), Point2::new(0, 10), Layer::Default, ObstacleFlags::CLOUD);
        let low = Obstacle::new(mask.clone(), Point2::new(0, 24), Layer::Default, ObstacleFlags::CLOUD);

        let mut map = ObstacleMap::new();
        map.add(&high);
        map.add(&low);

        // the sensor tail is below both tops; the nearest (lowest top) wins
        let best = map
            .best_obstacle_at(5, 25, 5, 30, MovMode::Floor, Layer::Default)
            .unwrap();
        assert!(std::ptr::eq(best, &low), "the shortest cloud must win");
    }

    #[test]
    fn test_layer_filter() {
        let mask = boxed(16, 16);
        let green = Obstacle::new(mask.clone(), Point2::new(0, 0), Layer::Green, ObstacleFlags::empty());
        let yellow = Obstacle::new(mask.clone(), Point2::new(0, 0), Layer::Yellow, ObstacleFlags::empty());

        let mut map = ObstacleMap::new();
        map.add(&green);
        map.add(&yellow);

        let best = map
            .best_obstacle_at(5, 5, 5, 10, MovMode::Floor, Layer::Green)
            .unwrap();
        assert!(std::ptr::eq(best, &green));

        // the default filter matches everything; both collide, one is returned
        assert!(map
            .best_obstacle_at(5, 5, 5, 10, MovMode::Floor, Layer::Default)
            .is_some());
    }

    #[test]
    fn test_find_ground_within_window() {
        let mask = boxed(64, 16);
        let floor = Obstacle::new(mask, Point2::new(0, 40), Layer::Default, ObstacleFlags::empty());

        let mut map = ObstacleMap::new();
        map.add(&floor);

        // window reaches the floor top
        let (found, gnd) = map
            .find_ground(10, 30, 10, 45, Layer::Default, GroundDirection::Down)
            .unwrap();
        assert!(std::ptr::eq(found, &floor));
        assert_eq!(gnd, 40);

        // window stops short of the floor
        assert!(map
            .find_ground(10, 20, 10, 35, Layer::Default, GroundDirection::Down)
            .is_none());
    }

    #[test]
    fn test_find_ground_picks_nearest() {
        let mask = boxed(64, 64);
        let near = Obstacle::new(mask.clone(), Point2::new(0, 40), Layer::Default, ObstacleFlags::empty());
        let far = Obstacle::new(mask.clone(), Point2::new(0, 52), Layer::Default, ObstacleFlags::empty());

        let mut map = ObstacleMap::new();
        map.add(&far);
        map.add(&near);

        let (found, gnd) = map
            .find_ground(10, 30, 10, 60, Layer::Default, GroundDirection::Down)
            .unwrap();
        assert!(std::ptr::eq(found, &near));
        assert_eq!(gnd, 40);
    }
}
