//! End-to-end scenarios for the physics actor.
//!
//! Each scenario steps the actor against a hand-built obstacle map at the
//! fixed 1/60 s cadence and checks the observable outcome: positions,
//! speeds, states and observer events.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use pixelplat_core::{
    Button, CollisionMask, InputSnapshot, Layer, MovMode, Obstacle, ObstacleFlags, ObstacleMap,
    PhysicsActor, PhysicsEvent, PixelSource, Point2, State, Vec2, HARD_CAPSPEED,
};

const DT: f64 = 1.0 / 60.0;

/// The standing hitbox is 39 px tall and centered on the actor, so the
/// foot plane sits 20 px below the position (19 + the 1 px sensor
/// overshoot).
const FOOT_OFFSET: f64 = 20.0;

fn solid(width: usize, height: usize, x: i32, y: i32) -> Obstacle {
    Obstacle::new(
        Arc::new(CollisionMask::solid_box(width, height).unwrap()),
        Point2::new(x, y),
        Layer::Default,
        ObstacleFlags::empty(),
    )
}

fn step(actor: &mut PhysicsActor, map: &ObstacleMap<'_>, input: &InputSnapshot, frames: usize) {
    for _ in 0..frames {
        actor.capture_input(input);
        actor.update(map, DT);
    }
}

fn record_events(actor: &mut PhysicsActor) -> Rc<RefCell<Vec<PhysicsEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    actor.subscribe(move |_, event| sink.borrow_mut().push(event));
    events
}

/// A 400 px wide floor whose top surface is at y = 200.
fn flat_floor() -> Obstacle {
    solid(400, 40, 0, 200)
}

/// Spawn an actor standing on the flat floor and let it settle.
fn settled_actor(map: &ObstacleMap<'_>, x: f64) -> PhysicsActor {
    let mut actor = PhysicsActor::new(Vec2::new(x, 200.0 - FOOT_OFFSET - 1.0));
    step(&mut actor, map, &InputSnapshot::new(), 10);
    assert!(!actor.is_midair(), "actor should settle on the floor");
    actor
}

// =============================================================================
// Scenario: free fall onto flat ground
// =============================================================================

#[test]
fn test_free_fall_onto_flat_ground() {
    let floor = flat_floor();
    let mut map = ObstacleMap::new();
    map.add(&floor);

    let mut actor = PhysicsActor::new(Vec2::new(100.0, 0.0));
    let events = record_events(&mut actor);

    step(&mut actor, &map, &InputSnapshot::new(), 120); // 2 seconds

    // the foot plane rests on the y = 200 surface
    let foot = actor.position().y + FOOT_OFFSET;
    assert!(
        (199.0..=201.0).contains(&foot),
        "feet at {} should rest on the ground",
        foot
    );
    assert!(!actor.is_midair());
    assert_eq!(actor.ysp(), 0.0);
    assert_eq!(actor.angle(), 0);
    assert_eq!(actor.movmode(), MovMode::Floor);
    assert_eq!(actor.state(), State::Stopped);
    assert!(
        !events.borrow().contains(&PhysicsEvent::Kill),
        "landing must not hurt"
    );
}

// =============================================================================
// Scenario: jump on flat ground
// =============================================================================

#[test]
fn test_jump_and_land() {
    let floor = flat_floor();
    let mut map = ObstacleMap::new();
    map.add(&floor);

    let mut actor = settled_actor(&map, 100.0);
    let events = record_events(&mut actor);

    // press jump for one frame
    let mut input = InputSnapshot::new();
    input.set(Button::Fire1, true);
    step(&mut actor, &map, &input, 1);

    assert_eq!(actor.state(), State::Jumping);
    assert!(
        (actor.ysp() - (-6.5 * 60.0)).abs() < 1e-9,
        "jump speed should be jmp, got {}",
        actor.ysp()
    );
    assert!(events.borrow().contains(&PhysicsEvent::Jump));

    // release and rise; the early release clamps the speed to jmprel
    input.set(Button::Fire1, false);
    step(&mut actor, &map, &input, 1);
    assert!((actor.ysp() - (-4.0 * 60.0)).abs() < 1.0);
    assert!(actor.is_midair());

    // after ~0.4 s the actor is falling
    step(&mut actor, &map, &input, 24);
    assert!(actor.ysp() > 0.0, "should be falling by now");

    // and lands
    step(&mut actor, &map, &input, 60);
    assert!(!actor.is_midair());
    assert_eq!(actor.ysp(), 0.0);
    assert!(matches!(
        actor.state(),
        State::Stopped | State::Walking | State::Waiting
    ));
    let foot = actor.position().y + FOOT_OFFSET;
    assert!((199.0..=201.0).contains(&foot));
}

// =============================================================================
// Scenario: running onto an ascending ramp
// =============================================================================

/// A 200x100 ramp ascending to the right with slope 1:2.
struct Ramp;

impl PixelSource for Ramp {
    fn width(&self) -> i32 {
        200
    }

    fn height(&self) -> i32 {
        100
    }

    fn is_transparent(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= 200 || y >= 100 {
            return true;
        }
        y < 99 - x / 2
    }
}

#[test]
fn test_running_up_a_slope() {
    let floor = flat_floor();
    let ramp = Obstacle::new(
        Arc::new(CollisionMask::from_image(&Ramp, 0, 0, 200, 100).unwrap()),
        Point2::new(200, 101), // the ramp base continues the y = 200 surface
        Layer::Default,
        ObstacleFlags::empty(),
    );
    let mut map = ObstacleMap::new();
    map.add(&floor);
    map.add(&ramp);

    let mut actor = settled_actor(&map, 100.0);
    actor.set_gsp(6.0 * 60.0);

    let mut input = InputSnapshot::new();
    input.set(Button::Right, true);

    for _ in 0..36 {
        step(&mut actor, &map, &input, 1);
        assert!(!actor.is_midair(), "must stay grounded while climbing");
        assert_eq!(actor.movmode(), MovMode::Floor);
    }

    // well onto the ramp, tilted into the ascending-slope band
    assert!(actor.position().x > 250.0, "got to x={}", actor.position().x);
    assert!(
        actor.position().y < 181.0,
        "should have climbed, y={}",
        actor.position().y
    );
    assert!(
        actor.angle() >= 0xE0 && actor.angle() <= 0xF7,
        "angle {:#x} should be in the ascending-slope band",
        actor.angle()
    );
}

// =============================================================================
// Scenario: ceiling bump
// =============================================================================

#[test]
fn test_ceiling_bump_without_reattach() {
    let floor = flat_floor();
    let ceiling = solid(400, 30, 0, 120); // underside at y = 149
    let mut map = ObstacleMap::new();
    map.add(&floor);
    map.add(&ceiling);

    let mut actor = settled_actor(&map, 100.0);
    let events = record_events(&mut actor);

    // jump straight up, holding the button
    let mut input = InputSnapshot::new();
    input.set(Button::Fire1, true);
    step(&mut actor, &map, &input, 1);
    input.set(Button::Fire1, true); // held from now on, no new press edge

    let mut min_y = actor.position().y;
    for _ in 0..90 {
        step(&mut actor, &map, &input, 1);
        min_y = min_y.min(actor.position().y);
        assert!(
            actor.ysp() >= 0.0 || actor.position().y > 152.0,
            "no tunneling into the ceiling"
        );
    }

    // bumped: the head sensor stops one pixel below the ceiling.
    // while jumping, the head sensor tail is 10 px above the position.
    assert!(
        (159.0..=162.0).contains(&min_y),
        "head should have bumped at y=160, got {}",
        min_y
    );

    // a bump is not a hit: no observer KILL, and the actor lands back
    assert!(!events.borrow().contains(&PhysicsEvent::Kill));
    assert!(!actor.is_midair());
    let foot = actor.position().y + FOOT_OFFSET;
    assert!((199.0..=201.0).contains(&foot));
}

// =============================================================================
// Scenario: crushed by a descending obstacle
// =============================================================================

#[test]
fn test_crush_between_floor_and_press() {
    let floor = flat_floor();

    let mut actor = {
        let mut map = ObstacleMap::new();
        map.add(&floor);
        settled_actor(&map, 100.0)
    };
    let events = record_events(&mut actor);

    // a wide solid press descends over the actor, overlapping all four
    // vertical-extreme sensors, far from its edges
    let press = solid(400, 90, 0, 130);
    let mut map = ObstacleMap::new();
    map.add(&floor);
    map.add(&press);

    step(&mut actor, &map, &InputSnapshot::new(), 2);

    assert_eq!(actor.state(), State::Dead);
    let recorded = events.borrow();
    let smash_at = recorded.iter().position(|&e| e == PhysicsEvent::Smash);
    let kill_at = recorded.iter().position(|&e| e == PhysicsEvent::Kill);
    assert!(smash_at.is_some(), "SMASH must be emitted");
    assert!(kill_at.is_some(), "KILL must be emitted");
    assert!(smash_at < kill_at, "SMASH comes before KILL");
    drop(recorded);

    // once dead, only gravity applies: the corpse jumps and then falls
    let y_at_death = actor.position().y;
    step(&mut actor, &map, &InputSnapshot::new(), 120);
    assert_eq!(actor.state(), State::Dead);
    assert!(
        actor.position().y > y_at_death + 100.0,
        "the dead actor falls through everything"
    );
}

// =============================================================================
// Scenario: pushing a wall
// =============================================================================

#[test]
fn test_running_into_a_wall() {
    let floor = flat_floor();
    let wall = solid(40, 200, 300, 0);
    let mut map = ObstacleMap::new();
    map.add(&floor);
    map.add(&wall);

    let mut actor = settled_actor(&map, 250.0);

    let mut input = InputSnapshot::new();
    input.set(Button::Right, true);
    step(&mut actor, &map, &input, 60);

    // the wall sensor tail (10 px to the right) sits one pixel outside
    // the wall at x = 300
    assert!(
        (288.0..=290.0).contains(&actor.position().x),
        "stopped against the wall, x={}",
        actor.position().x
    );
    assert_eq!(actor.gsp(), 0.0, "the wall zeroes the ground speed");
    assert_eq!(actor.state(), State::Pushing);
    assert!(actor.is_facing_right());

    // walls are symmetric: walking away is unimpeded
    input.set(Button::Right, false);
    input.set(Button::Left, true);
    step(&mut actor, &map, &input, 30);
    assert!(actor.position().x < 285.0);
    assert!(!actor.is_facing_right());
}

// =============================================================================
// Grounded invariants
// =============================================================================

#[test]
fn test_grounded_speed_projection_on_flat_ground() {
    let floor = flat_floor();
    let mut map = ObstacleMap::new();
    map.add(&floor);

    let mut actor = settled_actor(&map, 50.0);

    let mut input = InputSnapshot::new();
    input.set(Button::Right, true);

    for _ in 0..30 {
        step(&mut actor, &map, &input, 1);
        assert!(!actor.is_midair());
        // on flat ground (angle 0) the projection degenerates to
        // xsp = gsp, ysp = 0
        assert!((actor.xsp() - actor.gsp()).abs() < 1e-9);
        assert_eq!(actor.ysp(), 0.0);
        assert!(actor.gsp().abs() <= HARD_CAPSPEED);
    }

    assert!(actor.gsp() > 0.0, "should have built up speed");
    assert!(matches!(actor.state(), State::Walking | State::Running));
}

#[test]
fn test_hard_cap_on_ground_speed() {
    let floor = flat_floor();
    let mut map = ObstacleMap::new();
    map.add(&floor);

    let mut actor = settled_actor(&map, 50.0);
    actor.set_gsp(100_000.0);
    step(&mut actor, &map, &InputSnapshot::new(), 1);

    assert!(actor.gsp().abs() <= HARD_CAPSPEED);
    assert!(actor.xsp().abs() <= HARD_CAPSPEED);
}

// =============================================================================
// Braking, rolling, charging
// =============================================================================

#[test]
fn test_braking_and_turning_around() {
    let floor = flat_floor();
    let mut map = ObstacleMap::new();
    map.add(&floor);

    let mut actor = settled_actor(&map, 300.0);
    let events = record_events(&mut actor);
    actor.set_gsp(6.0 * 60.0);

    let mut input = InputSnapshot::new();
    input.set(Button::Left, true);
    step(&mut actor, &map, &input, 45);

    assert!(events.borrow().contains(&PhysicsEvent::Brake));
    assert!(actor.gsp() < 0.0, "turned around, gsp={}", actor.gsp());
    assert!(!actor.is_facing_right());
}

#[test]
fn test_rolling_shrinks_the_bounding_box() {
    let floor = flat_floor();
    let mut map = ObstacleMap::new();
    map.add(&floor);

    let mut actor = settled_actor(&map, 50.0);
    let events = record_events(&mut actor);
    actor.set_gsp(6.0 * 60.0);

    let (standing_w, standing_h, _) = actor.bounding_box();

    let mut input = InputSnapshot::new();
    input.set(Button::Right, true);
    input.set(Button::Down, true);
    step(&mut actor, &map, &input, 2);

    assert_eq!(actor.state(), State::Rolling);
    assert!(events.borrow().contains(&PhysicsEvent::Roll));

    let (rolling_w, rolling_h, _) = actor.bounding_box();
    assert!(rolling_w < standing_w);
    assert!(rolling_h < standing_h);
}

#[test]
fn test_charge_and_release() {
    let floor = flat_floor();
    let mut map = ObstacleMap::new();
    map.add(&floor);

    let mut actor = settled_actor(&map, 100.0);
    let events = record_events(&mut actor);

    // duck...
    let mut input = InputSnapshot::new();
    input.set(Button::Down, true);
    step(&mut actor, &map, &input, 2);
    assert_eq!(actor.state(), State::Ducking);

    // ...start charging...
    input.set(Button::Fire1, true);
    step(&mut actor, &map, &input, 1);
    assert_eq!(actor.state(), State::Charging);

    // ...pump once more...
    input.set(Button::Fire1, false);
    step(&mut actor, &map, &input, 1);
    input.set(Button::Fire1, true);
    step(&mut actor, &map, &input, 1);
    assert!(actor.charge_intensity() > 0.0);

    // ...and release
    input.set(Button::Fire1, false);
    input.set(Button::Down, false);
    step(&mut actor, &map, &input, 1);

    assert_eq!(actor.state(), State::Rolling);
    assert!(
        actor.gsp() > 400.0,
        "launched forward, gsp={}",
        actor.gsp()
    );

    let recorded = events.borrow();
    let charge_at = recorded.iter().position(|&e| e == PhysicsEvent::Charge);
    let recharge_at = recorded.iter().position(|&e| e == PhysicsEvent::Recharge);
    let release_at = recorded.iter().position(|&e| e == PhysicsEvent::Release);
    assert!(charge_at.is_some() && recharge_at.is_some() && release_at.is_some());
    assert!(charge_at < recharge_at && recharge_at < release_at);
}

// =============================================================================
// The fixed-step driver
// =============================================================================

#[test]
fn test_fast_engine_runs_one_free_step_per_frame() {
    // engine rendering much faster than 60 Hz: instead of skipping (which
    // jitters cameras), the driver resyncs and runs one step per frame
    let map = ObstacleMap::new();
    let mut actor = PhysicsActor::new(Vec2::new(0.0, 0.0));

    for _ in 0..20 {
        actor.capture_input(&InputSnapshot::new());
        actor.update(&map, 0.001);
    }

    // 20 steps of gravity: 20 * grv / 60
    let expected = 20.0 * (14.0 / 64.0) * 60.0;
    assert!(
        (actor.ysp() - expected).abs() < 1e-6,
        "expected {} got {}",
        expected,
        actor.ysp()
    );
}

#[test]
fn test_slow_engine_steps_at_most_once_per_frame() {
    // engine rendering at 10 fps: the simulation runs at most one step per
    // render frame and merely appears slower
    let map = ObstacleMap::new();
    let mut actor = PhysicsActor::new(Vec2::new(0.0, 0.0));

    for _ in 0..5 {
        actor.capture_input(&InputSnapshot::new());
        actor.update(&map, 0.1);
    }

    let expected = 5.0 * (14.0 / 64.0) * 60.0;
    assert!(
        (actor.ysp() - expected).abs() < 1e-6,
        "expected {} got {}",
        expected,
        actor.ysp()
    );
}
