//! Integration tests for collision masks, obstacles and the obstacle map

use std::sync::Arc;

use pixelplat_core::{
    CollisionMask, GroundDirection, Layer, MovMode, Obstacle, ObstacleFlags, ObstacleMap,
    PixelSource, Point2,
};

/// String-art pixel source: '#' is solid, anything else is transparent.
struct Art(Vec<&'static str>);

impl PixelSource for Art {
    fn width(&self) -> i32 {
        self.0.first().map_or(0, |r| r.len() as i32)
    }

    fn height(&self) -> i32 {
        self.0.len() as i32
    }

    fn is_transparent(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || y >= self.height() || x >= self.width() {
            return true;
        }
        self.0[y as usize].as_bytes()[x as usize] != b'#'
    }
}

fn patterned_mask() -> CollisionMask {
    let art = Art(vec![
        "..##....#.", //
        ".####...#.", //
        "..........", //
        "#........#", //
        "##########", //
        "#########.", //
    ]);
    CollisionMask::from_image(&art, 0, 0, 10, 6).unwrap()
}

// =============================================================================
// Integral Mask Law
// =============================================================================

#[test]
fn test_integral_mask_law() {
    // area_test(l,t,r,b) iff the rectangle contains a solid pixel,
    // for every rectangle of the mask
    let mask = patterned_mask();

    for l in 0..10 {
        for r in l..10 {
            for t in 0..6 {
                for b in t..6 {
                    let brute = (t..=b).any(|y| (l..=r).any(|x| mask.pixel_test(x, y)));
                    assert_eq!(
                        mask.area_test(l, t, r, b),
                        brute,
                        "law violated at [{},{}]x[{},{}]",
                        l,
                        r,
                        t,
                        b
                    );
                }
            }
        }
    }
}

#[test]
fn test_full_area_test_detects_any_solid() {
    let solid = patterned_mask();
    assert!(solid.area_test(0, 0, solid.width() - 1, solid.height() - 1));

    let empty = CollisionMask::from_image(&Art(vec!["....", "...."]), 0, 0, 4, 2).unwrap();
    assert!(!empty.area_test(0, 0, empty.width() - 1, empty.height() - 1));
}

// =============================================================================
// Height Map Law
// =============================================================================

#[test]
fn test_height_map_law_down() {
    // for every column with a solid pixel, locate_ground(x, 0, Down) is
    // the smallest y with a solid pixel
    let mask = patterned_mask();

    for x in 0..10 {
        let first_solid = (0..6).find(|&y| mask.pixel_test(x, y));
        if let Some(y) = first_solid {
            assert_eq!(
                mask.locate_ground(x, 0, GroundDirection::Down),
                y,
                "column {}",
                x
            );
        }
    }
}

#[test]
fn test_height_map_law_up() {
    let mask = patterned_mask();

    for x in 0..10 {
        let last_solid = (0..6).rev().find(|&y| mask.pixel_test(x, y));
        if let Some(y) = last_solid {
            assert_eq!(
                mask.locate_ground(x, 5, GroundDirection::Up),
                y,
                "column {}",
                x
            );
        }
    }
}

#[test]
fn test_height_map_law_horizontal() {
    let mask = patterned_mask();

    for y in 0..6 {
        let first_solid = (0..10).find(|&x| mask.pixel_test(x, y));
        let last_solid = (0..10).rev().find(|&x| mask.pixel_test(x, y));
        if let Some(x) = first_solid {
            assert_eq!(mask.locate_ground(0, y, GroundDirection::Right), x, "row {}", y);
        }
        if let Some(x) = last_solid {
            assert_eq!(mask.locate_ground(9, y, GroundDirection::Left), x, "row {}", y);
        }
    }
}

// =============================================================================
// Boundary Behaviors
// =============================================================================

#[test]
fn test_out_of_range_queries_are_safe() {
    let mask = patterned_mask();

    assert!(!mask.area_test(-100, -100, -50, -50));
    assert!(!mask.area_test(100, 100, 200, 200));
    assert!(!mask.pixel_test(-1, -1));
    assert!(!mask.pixel_test(10, 6));

    // locate_ground clips per the direction conventions
    assert_eq!(mask.locate_ground(-5, 0, GroundDirection::Down), 5);
    assert_eq!(mask.locate_ground(50, 0, GroundDirection::Up), 0);
    assert_eq!(mask.locate_ground(0, -9, GroundDirection::Left), 0);
    assert_eq!(mask.locate_ground(0, 77, GroundDirection::Right), 9);
}

// =============================================================================
// Clone Round Trips
// =============================================================================

#[test]
fn test_double_clone_answers_identical_queries() {
    let mask = patterned_mask();
    let clone = mask.clone().clone();

    for y in -2..8 {
        for x in -2..12 {
            assert_eq!(mask.pixel_test(x, y), clone.pixel_test(x, y));
            for direction in [
                GroundDirection::Down,
                GroundDirection::Up,
                GroundDirection::Left,
                GroundDirection::Right,
            ] {
                assert_eq!(
                    mask.locate_ground(x, y, direction),
                    clone.locate_ground(x, y, direction)
                );
            }
        }
    }
}

#[test]
fn test_obstacle_double_hflip_is_identity() {
    let mask = Arc::new(patterned_mask());
    let plain = Obstacle::new(mask.clone(), Point2::new(7, 3), Layer::Default, ObstacleFlags::empty());

    let mut flags = ObstacleFlags::empty();
    flags.toggle(ObstacleFlags::HFLIP);
    flags.toggle(ObstacleFlags::HFLIP);
    let double = Obstacle::new(mask, Point2::new(7, 3), Layer::Default, flags);

    for y in 0..9 {
        for x in 0..17 {
            assert_eq!(
                plain.point_collision(Point2::new(x, y)),
                double.point_collision(Point2::new(x, y))
            );
        }
    }
}

// =============================================================================
// Obstacle Map Arbitration
// =============================================================================

#[test]
fn test_seam_of_two_overlapping_floors() {
    // standing at the seam of a tall block and a short step: the sensor
    // must resolve to the taller floor
    let tall = Obstacle::new(
        Arc::new(CollisionMask::solid_box(32, 48).unwrap()),
        Point2::new(0, 152),
        Layer::Default,
        ObstacleFlags::empty(),
    );
    let step = Obstacle::new(
        Arc::new(CollisionMask::solid_box(32, 16).unwrap()),
        Point2::new(16, 184),
        Layer::Default,
        ObstacleFlags::empty(),
    );

    let mut map = ObstacleMap::new();
    map.add(&step);
    map.add(&tall);

    let best = map
        .best_obstacle_at(20, 160, 20, 190, MovMode::Floor, Layer::Default)
        .unwrap();
    assert!(
        std::ptr::eq(best, &tall),
        "the obstacle protruding furthest into the sensor wins"
    );
}

#[test]
fn test_cloud_is_invisible_to_solid_priority() {
    let solid = Obstacle::new(
        Arc::new(CollisionMask::solid_box(64, 16).unwrap()),
        Point2::new(0, 200),
        Layer::Default,
        ObstacleFlags::empty(),
    );
    let cloud = Obstacle::new(
        Arc::new(CollisionMask::solid_box(64, 16).unwrap()),
        Point2::new(0, 195),
        Layer::Default,
        ObstacleFlags::CLOUD,
    );

    let mut map = ObstacleMap::new();
    map.add(&cloud);
    map.add(&solid);

    let best = map
        .best_obstacle_at(10, 190, 10, 210, MovMode::Floor, Layer::Default)
        .unwrap();
    assert!(std::ptr::eq(best, &solid));
}

#[test]
fn test_find_ground_sweep() {
    let floor = Obstacle::new(
        Arc::new(CollisionMask::solid_box(64, 16).unwrap()),
        Point2::new(0, 210),
        Layer::Default,
        ObstacleFlags::empty(),
    );

    let mut map = ObstacleMap::new();
    map.add(&floor);

    // a downward sweep from y=190 that is long enough reaches the floor
    let hit = map.find_ground(10, 190, 10, 215, Layer::Default, GroundDirection::Down);
    assert_eq!(hit.map(|(_, gnd)| gnd), Some(210));

    // a short sweep does not
    let miss = map.find_ground(10, 190, 10, 205, Layer::Default, GroundDirection::Down);
    assert!(miss.is_none());
}
