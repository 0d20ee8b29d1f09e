//! The physics actor: a fixed-step state machine driving a humanoid
//! character through terrain.
//!
//! Submodules:
//! - `angle`: angle estimation from double ground probes, movmode bands
//! - `collision`: wall / ground / ceiling resolution, sticky ground, crush
//! - `sensors`: the sensor variants and the per-step sensor refresh
//! - `tunables`: the physics model parameters
//! - `update`: the fixed-step driver and the per-step simulation

mod angle;
mod collision;
mod sensors;
mod tunables;
mod update;

pub use tunables::Tunables;

use serde::{Deserialize, Serialize};

use crate::collision::{Layer, Obstacle, Sensor};
use crate::input::{Button, InputSnapshot};
use crate::types::{vec2, Vec2};

use sensors::SensorSet;
pub(crate) use sensors::SensorReadings;

/// Target framerate of the simulation.
pub(crate) const TARGET_FPS: f64 = 60.0;

/// Nothing moves faster than this, ever (px/s).
pub const HARD_CAPSPEED: f64 = 24.0 * TARGET_FPS;

/// The ground sensors overshoot the nominal foot by this many pixels so
/// that the sensor tail touches the ground plane.
pub(crate) const AB_SENSOR_OFFSET: i32 = 1;

/// The actor attaches to the interior of a cloud only within this many
/// pixels of its top edge. Useful even for "cloudified" collision masks,
/// because the masks of some clouds (e.g., brick-like objects) may not be
/// cloudified.
pub(crate) const CLOUD_HEIGHT: i32 = 16;

#[inline]
pub(crate) fn nearly_zero(x: f64) -> bool {
    x.abs() < 1e-5
}

#[inline]
pub(crate) fn sign(x: f64) -> f64 {
    if x >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// The behavioral states of the physics actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    Stopped,
    Walking,
    Running,
    Jumping,
    Springing,
    Rolling,
    Charging,
    Pushing,
    GettingHit,
    Dead,
    Braking,
    Ledge,
    Drowned,
    Breathing,
    Ducking,
    LookingUp,
    Waiting,
    Winning,
}

/// Which surface the actor is oriented against, derived from the angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovMode {
    Floor,
    RightWall,
    Ceiling,
    LeftWall,
}

impl MovMode {
    /// Rotate an actor-local point into world orientation: clockwise by
    /// 0, 90, 180 or 270 degrees around the origin.
    #[inline]
    pub fn rotate(self, p: crate::types::Point2) -> crate::types::Point2 {
        use crate::types::Point2;
        match self {
            Self::Floor => p,
            Self::RightWall => Point2::new(p.y, -p.x),
            Self::Ceiling => Point2::new(-p.x, -p.y),
            Self::LeftWall => Point2::new(-p.y, p.x),
        }
    }

    /// The world direction of "down" for this movement mode.
    #[inline]
    pub fn ground_direction(self) -> crate::collision::GroundDirection {
        use crate::collision::GroundDirection;
        match self {
            Self::Floor => GroundDirection::Down,
            Self::RightWall => GroundDirection::Right,
            Self::Ceiling => GroundDirection::Up,
            Self::LeftWall => GroundDirection::Left,
        }
    }
}

/// Events emitted by the actor to its observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhysicsEvent {
    Jump,
    Roll,
    Charge,
    Recharge,
    Release,
    Brake,
    Breathe,
    Blink,
    Hit,
    Kill,
    Drown,
    Smash,
    Resurrect,
}

type ObserverCallback = Box<dyn FnMut(&PhysicsActor, PhysicsEvent)>;

/// The player physics simulation. See the module documentation.
pub struct PhysicsActor {
    state: State,

    xpos: f64,
    ypos: f64,

    /// position delta of the last step
    dx: f64,
    dy: f64,

    xsp: f64,
    ysp: f64,
    /// ground speed: meaningful only when not midair
    gsp: f64,

    movmode: MovMode,
    /// angle in [0, 255], clockwise, 0 = floor normal up
    angle: i32,
    prev_angle: i32,

    facing_right: bool,
    midair: bool,
    was_midair: bool,
    touching_ceiling: bool,

    tunables: Tunables,
    charge_intensity: f64,

    hlock_timer: f64,
    jump_lock_timer: f64,
    wait_timer: f64,
    midair_timer: f64,
    breathe_timer: f64,

    winning_pose: bool,
    want_to_detach_from_ground: bool,
    unstable_angle_counter: i32,

    layer: Layer,
    input: InputSnapshot,
    observers: Vec<ObserverCallback>,

    sensors: SensorSet,
    /// world positions of the last angle measurement, for debug overlays
    angle_sensor: [Vec2; 2],

    reference_time: f64,
    fixed_time: f64,
}

impl PhysicsActor {
    pub fn new(position: Vec2) -> Self {
        Self {
            state: State::Stopped,

            xpos: position.x,
            ypos: position.y,
            dx: 0.0,
            dy: 0.0,
            xsp: 0.0,
            ysp: 0.0,
            gsp: 0.0,

            movmode: MovMode::Floor,
            angle: 0x0,
            prev_angle: 0x0,

            facing_right: true,
            midair: true,
            was_midair: true,
            touching_ceiling: false,

            tunables: Tunables::default(),
            charge_intensity: 0.0,

            hlock_timer: 0.0,
            jump_lock_timer: 0.0,
            wait_timer: 0.0,
            midair_timer: 0.0,
            breathe_timer: 0.0,

            winning_pose: false,
            want_to_detach_from_ground: false,
            unstable_angle_counter: 0,

            layer: Layer::Default,
            input: InputSnapshot::new(),
            observers: Vec::new(),

            sensors: SensorSet::new(),
            angle_sensor: [Vec2::ZERO; 2],

            reference_time: 0.0,
            fixed_time: 0.0,
        }
    }

    /// Subscribe an observer. Observers are notified synchronously, in
    /// subscription order, at the moment each event happens. Callbacks see
    /// the actor immutably: they cannot change its position or speeds.
    pub fn subscribe(&mut self, callback: impl FnMut(&PhysicsActor, PhysicsEvent) + 'static) {
        self.observers.push(Box::new(callback));
    }

    pub(crate) fn notify(&mut self, event: PhysicsEvent) {
        /* take the list out so that callbacks can borrow the actor */
        let mut observers = std::mem::take(&mut self.observers);
        for observer in observers.iter_mut() {
            observer(self, event);
        }
        debug_assert!(self.observers.is_empty());
        self.observers = observers;
    }

    /* ---------------- queries ---------------- */

    /// The position of the actor: the center of its sprite.
    #[inline]
    pub fn position(&self) -> Vec2 {
        vec2(self.xpos, self.ypos)
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.xpos = position.x;
        self.ypos = position.y;
    }

    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    /// The angle in degrees: [0, 360), counterclockwise.
    pub fn angle_degrees(&self) -> i32 {
        (((256 - self.angle) * 180) / 128) % 360
    }

    /// The raw angle: [0, 255], clockwise, 0 = floor normal up.
    #[inline]
    pub fn angle(&self) -> i32 {
        self.angle
    }

    #[inline]
    pub fn movmode(&self) -> MovMode {
        self.movmode
    }

    #[inline]
    pub fn is_facing_right(&self) -> bool {
        self.facing_right
    }

    #[inline]
    pub fn is_midair(&self) -> bool {
        self.midair
    }

    #[inline]
    pub fn is_touching_ceiling(&self) -> bool {
        self.touching_ceiling
    }

    #[inline]
    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn set_layer(&mut self, layer: Layer) {
        self.layer = layer;
    }

    /// Position delta of the last fixed step.
    #[inline]
    pub fn delta(&self) -> Vec2 {
        vec2(self.dx, self.dy)
    }

    /// The difference of the height of the standing and rolling ground
    /// sensors; sprite offset when rolling.
    pub fn roll_delta(&self) -> i32 {
        self.sensors.roll_delta()
    }

    /// Charge intensity in [0, 1].
    #[inline]
    pub fn charge_intensity(&self) -> f64 {
        self.charge_intensity
    }

    /// The horizontal control lock timer, in seconds.
    #[inline]
    pub fn hlock_timer(&self) -> f64 {
        self.hlock_timer
    }

    #[inline]
    pub fn xsp(&self) -> f64 {
        self.xsp
    }

    pub fn set_xsp(&mut self, value: f64) {
        self.xsp = value;
    }

    #[inline]
    pub fn ysp(&self) -> f64 {
        self.ysp
    }

    pub fn set_ysp(&mut self, value: f64) {
        self.ysp = value;
    }

    /// Ground speed: tangent to the surface the actor stands on.
    #[inline]
    pub fn gsp(&self) -> f64 {
        self.gsp
    }

    pub fn set_gsp(&mut self, value: f64) {
        self.gsp = value;
    }

    #[inline]
    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    pub fn tunables_mut(&mut self) -> &mut Tunables {
        &mut self.tunables
    }

    /// The bounding box of the actor: (width, height, center), computed
    /// from the active ground and head sensors with the movement-mode
    /// rotation applied.
    pub fn bounding_box(&self) -> (i32, i32, Vec2) {
        let a = self.sensor_a().local_tail();
        let d = self.sensor_d().local_tail();
        let offset = self.sensor_d().local_head();

        /* find size */
        let mut w = d.x - a.x + 1;
        let mut h = a.y - d.y + 1;

        /* adjust size */
        h -= 2 * AB_SENSOR_OFFSET; /* one from A, another from D */
        h -= 6;
        w -= 2;

        /* find center */
        let mut x = self.xpos.floor() as i32;
        let mut y = self.ypos.floor() as i32;

        /* rotate and apply offset */
        let (rw, rh) = match self.movmode {
            MovMode::Floor => {
                y += offset.y;
                (w, h)
            }
            MovMode::Ceiling => {
                y -= offset.y;
                (w, h)
            }
            MovMode::RightWall => {
                x += offset.y;
                (h, w)
            }
            MovMode::LeftWall => {
                x -= offset.y;
                (h, w)
            }
        };

        (rw.max(1), rh.max(1), vec2(x as f64, y as f64))
    }

    /// Is the actor standing on this specific obstacle?
    pub fn is_standing_on_platform(&self, obstacle: &Obstacle) -> bool {
        let position = self.position();

        for sensor in [self.sensor_a(), self.sensor_b()] {
            let (head, tail) = sensor.world_segment(position, self.movmode);
            if obstacle.collides_with_segment(
                head.x.min(tail.x),
                head.y.min(tail.y),
                head.x.max(tail.x),
                head.y.max(tail.y),
            ) {
                return true;
            }
        }

        false
    }

    /* ---------------- input ---------------- */

    /// Capture an input snapshot for the next steps of the simulation.
    pub fn capture_input(&mut self, input: &InputSnapshot) {
        self.input = *input;
    }

    /// Hold right on the captured input. Call before `update()`.
    pub fn walk_right(&mut self) {
        self.input.simulate_down(Button::Right);
    }

    /// Hold left on the captured input. Call before `update()`.
    pub fn walk_left(&mut self) {
        self.input.simulate_down(Button::Left);
    }

    /// Hold down on the captured input. Call before `update()`.
    pub fn duck(&mut self) {
        self.input.simulate_down(Button::Down);
    }

    /// Hold up on the captured input. Call before `update()`.
    pub fn look_up(&mut self) {
        self.input.simulate_down(Button::Up);
    }

    /// Press the jump button on the captured input. Call before `update()`.
    pub fn jump(&mut self) {
        self.input.simulate_press(Button::Fire1);
    }

    /* ---------------- commands ---------------- */

    /// Suppress left/right input for a while (cumulative: keeps the max).
    pub fn lock_horizontally_for(&mut self, seconds: f64) {
        let seconds = seconds.max(0.0);
        if seconds > self.hlock_timer {
            self.hlock_timer = seconds;
        }
    }

    /// Leave the ground on this step even if the ground sensors still see
    /// it (springs, external launchers).
    pub fn detach_from_ground(&mut self) {
        self.want_to_detach_from_ground = true;
    }

    pub fn enable_winning_pose(&mut self) {
        self.winning_pose = true;
    }

    pub fn disable_winning_pose(&mut self) {
        self.winning_pose = false;
    }

    /// Kill the actor: it jumps off the screen and then only falls.
    pub fn kill(&mut self) {
        if self.state != State::Dead && self.state != State::Drowned {
            self.xsp = 0.0;
            self.ysp = self.tunables.diejmp;

            self.angle = 0x0;
            self.movmode = MovMode::Floor;
            self.facing_right = true;

            self.state = State::Dead;
            self.notify(PhysicsEvent::Kill);
        }
    }

    /// Get hit and be knocked back. direction: > 0 from the right,
    /// < 0 from the left, 0 = behind the actor.
    pub fn hit(&mut self, direction: f64) {
        if self.state == State::Dead || self.state == State::Drowned {
            return;
        }

        if self.state != State::GettingHit {
            let dir = if direction != 0.0 {
                sign(direction)
            } else if self.facing_right {
                -1.0
            } else {
                1.0
            };
            self.xsp = self.tunables.hitjmp * 0.5 * -dir;
            self.ysp = self.tunables.hitjmp;

            self.detach_from_ground();
            self.state = State::GettingHit;
            self.notify(PhysicsEvent::Hit);
        }
    }

    /// Bounce off a destroyed enemy or item. The direction (> 0 down,
    /// < 0 up) is just a hint. Only works midair; returns whether the
    /// actor bounced.
    pub fn bounce(&mut self, direction: f64) -> bool {
        if self.state == State::Dead || self.state == State::Drowned {
            return false;
        }

        if !self.midair {
            return false;
        }

        if direction < 0.0 && self.ysp > 0.0 {
            self.ysp = -self.ysp;
        } else {
            self.ysp -= 60.0 * sign(self.ysp);
        }

        self.state = State::Jumping;
        true
    }

    /// Enter the springing state (launched by a spring).
    pub fn springify(&mut self) {
        if self.state == State::Dead || self.state == State::Drowned {
            return;
        }

        if self.state != State::Springing {
            self.want_to_detach_from_ground = self.want_to_detach_from_ground
                || match self.movmode {
                    MovMode::Floor => self.ysp < 0.0,
                    MovMode::RightWall => self.xsp < 0.0,
                    MovMode::Ceiling => self.ysp > 0.0,
                    MovMode::LeftWall => self.xsp > 0.0,
                };
        }

        self.state = State::Springing;
    }

    /// Force the rolling state.
    pub fn roll(&mut self) {
        if self.state == State::Dead || self.state == State::Drowned {
            return;
        }

        self.state = State::Rolling;
    }

    /// Drown: like dying, but sinking instead of jumping.
    pub fn drown(&mut self) {
        if self.state != State::Drowned && self.state != State::Dead {
            self.xsp = 0.0;
            self.ysp = 0.0;

            self.angle = 0x0;
            self.movmode = MovMode::Floor;
            self.facing_right = true;

            self.state = State::Drowned;
            self.notify(PhysicsEvent::Drown);
        }
    }

    /// Breathe an air bubble underwater.
    pub fn breathe(&mut self) {
        if self.state == State::Dead || self.state == State::Drowned {
            return;
        }

        if self.state != State::Breathing {
            self.xsp = 0.0;
            self.ysp = 0.0;

            self.breathe_timer = 0.5;
            self.state = State::Breathing;
            self.notify(PhysicsEvent::Breathe);
        }
    }

    /// Bring a dead or drowned actor back. Returns whether it happened.
    pub fn resurrect(&mut self) -> bool {
        if self.state == State::Dead || self.state == State::Drowned {
            self.gsp = 0.0;
            self.xsp = 0.0;
            self.ysp = 0.0;

            self.angle = 0x0;
            self.movmode = MovMode::Floor;
            self.facing_right = true;

            self.state = State::Stopped;
            self.notify(PhysicsEvent::Resurrect);
            return true;
        }

        false
    }

    /// Return to a neutral state vulnerable to attack.
    pub fn restore_state(&mut self) {
        if self.state == State::Dead || self.state == State::Drowned {
            return;
        }

        if self.gsp.abs() >= self.tunables.topspeed {
            self.state = State::Running;
        } else if self.midair || !nearly_zero(self.gsp) {
            self.state = State::Walking;
        } else if self.state != State::Waiting
            && self.state != State::Pushing
            && self.state != State::Ledge
            && self.state != State::LookingUp
            && self.state != State::Ducking
            && self.state != State::Winning
        {
            self.state = State::Stopped;
        }
    }

    /* ---------------- internal helpers ---------------- */

    /// WALKING if below topspeed, RUNNING otherwise.
    pub(crate) fn walking_or_running(&self) -> State {
        if self.gsp.abs() >= self.tunables.topspeed {
            State::Running
        } else {
            State::Walking
        }
    }

    /// Which sensor is the reference for the A ground sensor right now.
    pub(crate) fn sensor_a(&self) -> &Sensor {
        self.sensors.a(self.sensor_selection())
    }

    pub(crate) fn sensor_b(&self) -> &Sensor {
        self.sensors.b(self.sensor_selection())
    }

    pub(crate) fn sensor_c(&self) -> &Sensor {
        self.sensors.c(self.sensor_selection())
    }

    pub(crate) fn sensor_d(&self) -> &Sensor {
        self.sensors.d(self.sensor_selection())
    }

    pub(crate) fn sensor_m(&self) -> &Sensor {
        self.sensors.m(self.sensor_selection())
    }

    pub(crate) fn sensor_n(&self) -> &Sensor {
        self.sensors.n(self.sensor_selection())
    }
}

impl std::fmt::Debug for PhysicsActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsActor")
            .field("state", &self.state)
            .field("position", &(self.xpos, self.ypos))
            .field("speed", &(self.xsp, self.ysp, self.gsp))
            .field("angle", &self.angle)
            .field("movmode", &self.movmode)
            .field("midair", &self.midair)
            .finish_non_exhaustive()
    }
}
