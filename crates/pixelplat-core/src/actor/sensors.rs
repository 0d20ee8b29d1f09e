//! The actor's sensors.
//!
//! The character has six logical sensors; the dot '.' is the position of
//! the character and the sensors are specified relative to it:
//!
//! ```text
//! A (vertical; left bottom)          ---
//! B (vertical; right bottom)       C | | D
//! C (vertical; left top)           M -.- N
//! D (vertical; right top)          A | | B
//! M (horizontal; left middle)      ^^^^^^^
//! N (horizontal; right middle)      ground
//! ```
//!
//! The effective position of each sensor changes with the state of the
//! player. Instead of mutating coordinates, we keep multiple immutable
//! copies tuned for different contexts and select the right one:
//! *normal* (standing, slopes), *jumproll* (smaller hitbox while jumping
//! or rolling), *flatgnd* and *rollflatgnd* (slight offset that avoids
//! spurious re-collisions on perfectly flat ground while M/N are active).

use crate::actor::{MovMode, PhysicsActor, State, AB_SENSOR_OFFSET, CLOUD_HEIGHT};
use crate::input::Button;
use crate::collision::{GroundDirection, Obstacle, ObstacleMap, Sensor};

/// What the six sensors saw on the last refresh.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SensorReadings<'m> {
    pub at_a: Option<&'m Obstacle>,
    pub at_b: Option<&'m Obstacle>,
    pub at_c: Option<&'m Obstacle>,
    pub at_d: Option<&'m Obstacle>,
    pub at_m: Option<&'m Obstacle>,
    pub at_n: Option<&'m Obstacle>,
}

/// Which copy of the sensors applies to the current actor context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SensorSelection {
    Standing,
    Airborne,
    Jumping,
    Rolling,
    FlatGround,
    RollingFlatGround,
}

/// The concrete sensors, allocated once at construction.
#[derive(Debug)]
pub(crate) struct SensorSet {
    a_normal: Sensor,
    b_normal: Sensor,
    c_normal: Sensor,
    d_normal: Sensor,
    m_normal: Sensor,
    n_normal: Sensor,

    a_jumproll: Sensor,
    b_jumproll: Sensor,
    c_jumproll: Sensor,
    d_jumproll: Sensor,
    m_jumproll: Sensor,
    n_jumproll: Sensor,

    a_flatgnd: Sensor,
    b_flatgnd: Sensor,
    m_flatgnd: Sensor,
    n_flatgnd: Sensor,

    a_rollflatgnd: Sensor,
    b_rollflatgnd: Sensor,
    m_rollflatgnd: Sensor,
    n_rollflatgnd: Sensor,
}

impl SensorSet {
    pub(crate) fn new() -> Self {
        /* box size (W,H) and half box size (w,h) relative to sensors
           A, B, C, D. These sensors are vertical and symmetric, hence
           W = 2*w + 1 => w = (W-1)/2; likewise h = (H-1)/2 */
        const DEFAULT_WIDTH: i32 = 19; /* pick odd numbers */
        const DEFAULT_HEIGHT: i32 = 39;
        const ROLL_WIDTH: i32 = 15; /* about 75% of the default box */
        const ROLL_HEIGHT: i32 = 29;
        const ROLL_Y_OFFSET: i32 = 5;

        let w = (DEFAULT_WIDTH - 1) / 2;
        let h = (DEFAULT_HEIGHT - 1) / 2 + AB_SENSOR_OFFSET;
        let rw = (ROLL_WIDTH - 1) / 2;
        let rh = (ROLL_HEIGHT - 1) / 2 + AB_SENSOR_OFFSET;
        let ry = ROLL_Y_OFFSET;

        Self {
            a_normal: Sensor::vertical(-w, 0, h),
            b_normal: Sensor::vertical(w, 0, h),
            c_normal: Sensor::vertical(-w, 0, -h),
            d_normal: Sensor::vertical(w, 0, -h),
            m_normal: Sensor::horizontal(0, 0, -(w + 1)), /* x(sensor A) - 1 */
            n_normal: Sensor::horizontal(0, 0, w + 1),

            a_jumproll: Sensor::vertical(-rw, ry, ry + rh),
            b_jumproll: Sensor::vertical(rw, ry, ry + rh),
            c_jumproll: Sensor::vertical(-rw, ry, ry - rh),
            d_jumproll: Sensor::vertical(rw, ry, ry - rh),
            m_jumproll: Sensor::horizontal(ry, 0, -(w + 1)),
            n_jumproll: Sensor::horizontal(ry, 0, w + 1),

            /* avoid spurious repositioning; A, B may collide with moving
               walls because of the shifted M, N */
            a_flatgnd: Sensor::vertical(-w, 8, h),
            b_flatgnd: Sensor::vertical(w, 8, h),
            m_flatgnd: Sensor::horizontal(8, 0, -(w + 1)),
            n_flatgnd: Sensor::horizontal(8, 0, w + 1),

            a_rollflatgnd: Sensor::vertical(-w, ry.max(8), h),
            b_rollflatgnd: Sensor::vertical(w, ry.max(8), h),
            m_rollflatgnd: Sensor::horizontal(ry.max(8), ry, -(w + 1)),
            n_rollflatgnd: Sensor::horizontal(ry.max(8), ry, w + 1),
        }
    }

    pub(crate) fn a(&self, selection: SensorSelection) -> &Sensor {
        match selection {
            SensorSelection::Standing | SensorSelection::Airborne => &self.a_normal,
            SensorSelection::Jumping | SensorSelection::Rolling => &self.a_jumproll,
            SensorSelection::FlatGround => &self.a_flatgnd,
            SensorSelection::RollingFlatGround => &self.a_rollflatgnd,
        }
    }

    pub(crate) fn b(&self, selection: SensorSelection) -> &Sensor {
        match selection {
            SensorSelection::Standing | SensorSelection::Airborne => &self.b_normal,
            SensorSelection::Jumping | SensorSelection::Rolling => &self.b_jumproll,
            SensorSelection::FlatGround => &self.b_flatgnd,
            SensorSelection::RollingFlatGround => &self.b_rollflatgnd,
        }
    }

    pub(crate) fn c(&self, selection: SensorSelection) -> &Sensor {
        match selection {
            SensorSelection::Standing
            | SensorSelection::Airborne
            | SensorSelection::FlatGround => &self.c_normal,
            SensorSelection::Jumping
            | SensorSelection::Rolling
            | SensorSelection::RollingFlatGround => &self.c_jumproll,
        }
    }

    pub(crate) fn d(&self, selection: SensorSelection) -> &Sensor {
        match selection {
            SensorSelection::Standing
            | SensorSelection::Airborne
            | SensorSelection::FlatGround => &self.d_normal,
            SensorSelection::Jumping
            | SensorSelection::Rolling
            | SensorSelection::RollingFlatGround => &self.d_jumproll,
        }
    }

    pub(crate) fn m(&self, selection: SensorSelection) -> &Sensor {
        match selection {
            SensorSelection::Standing | SensorSelection::Airborne => &self.m_normal,
            SensorSelection::Jumping | SensorSelection::Rolling => &self.m_jumproll,
            SensorSelection::FlatGround => &self.m_flatgnd,
            SensorSelection::RollingFlatGround => &self.m_rollflatgnd,
        }
    }

    pub(crate) fn n(&self, selection: SensorSelection) -> &Sensor {
        match selection {
            SensorSelection::Standing | SensorSelection::Airborne => &self.n_normal,
            SensorSelection::Jumping | SensorSelection::Rolling => &self.n_jumproll,
            SensorSelection::FlatGround => &self.n_flatgnd,
            SensorSelection::RollingFlatGround => &self.n_rollflatgnd,
        }
    }

    fn a_mut(&mut self, selection: SensorSelection) -> &mut Sensor {
        match selection {
            SensorSelection::Standing | SensorSelection::Airborne => &mut self.a_normal,
            SensorSelection::Jumping | SensorSelection::Rolling => &mut self.a_jumproll,
            SensorSelection::FlatGround => &mut self.a_flatgnd,
            SensorSelection::RollingFlatGround => &mut self.a_rollflatgnd,
        }
    }

    fn b_mut(&mut self, selection: SensorSelection) -> &mut Sensor {
        match selection {
            SensorSelection::Standing | SensorSelection::Airborne => &mut self.b_normal,
            SensorSelection::Jumping | SensorSelection::Rolling => &mut self.b_jumproll,
            SensorSelection::FlatGround => &mut self.b_flatgnd,
            SensorSelection::RollingFlatGround => &mut self.b_rollflatgnd,
        }
    }

    fn c_mut(&mut self, selection: SensorSelection) -> &mut Sensor {
        match selection {
            SensorSelection::Standing
            | SensorSelection::Airborne
            | SensorSelection::FlatGround => &mut self.c_normal,
            SensorSelection::Jumping
            | SensorSelection::Rolling
            | SensorSelection::RollingFlatGround => &mut self.c_jumproll,
        }
    }

    fn d_mut(&mut self, selection: SensorSelection) -> &mut Sensor {
        match selection {
            SensorSelection::Standing
            | SensorSelection::Airborne
            | SensorSelection::FlatGround => &mut self.d_normal,
            SensorSelection::Jumping
            | SensorSelection::Rolling
            | SensorSelection::RollingFlatGround => &mut self.d_jumproll,
        }
    }

    fn m_mut(&mut self, selection: SensorSelection) -> &mut Sensor {
        match selection {
            SensorSelection::Standing | SensorSelection::Airborne => &mut self.m_normal,
            SensorSelection::Jumping | SensorSelection::Rolling => &mut self.m_jumproll,
            SensorSelection::FlatGround => &mut self.m_flatgnd,
            SensorSelection::RollingFlatGround => &mut self.m_rollflatgnd,
        }
    }

    fn n_mut(&mut self, selection: SensorSelection) -> &mut Sensor {
        match selection {
            SensorSelection::Standing | SensorSelection::Airborne => &mut self.n_normal,
            SensorSelection::Jumping | SensorSelection::Rolling => &mut self.n_jumproll,
            SensorSelection::FlatGround => &mut self.n_flatgnd,
            SensorSelection::RollingFlatGround => &mut self.n_rollflatgnd,
        }
    }

    /// The difference of the height of the standing and rolling ground
    /// sensors.
    pub(crate) fn roll_delta(&self) -> i32 {
        self.a_normal.local_tail().y - self.a_jumproll.local_tail().y
    }
}

impl PhysicsActor {
    /// Which copy of the sensors applies right now. A pure function of the
    /// state, midair flags and angle. `was_midair` helps to avoid subtle
    /// M, N repositioning bugs when falling and rolling.
    pub(crate) fn sensor_selection(&self) -> SensorSelection {
        let on_flat_ground = !self.midair && !self.was_midair && self.angle % 0x40 == 0;

        match self.state {
            State::Rolling | State::Charging => {
                if on_flat_ground {
                    SensorSelection::RollingFlatGround
                } else {
                    SensorSelection::Rolling
                }
            }
            State::Jumping => SensorSelection::Jumping,
            _ if self.midair || self.state == State::Springing => SensorSelection::Airborne,
            _ if on_flat_ground => SensorSelection::FlatGround,
            _ => SensorSelection::Standing,
        }
    }

    /// Refresh all six sensors against the obstacle map and recompute the
    /// midair / touching_ceiling flags. Call whenever the position or the
    /// angle changes.
    pub(crate) fn update_sensors<'m>(&mut self, map: &ObstacleMap<'m>) -> SensorReadings<'m> {
        let mut readings = SensorReadings::default();
        let prev_midair = self.midair;
        let mut repetitions = 0;

        loop {
            /* the applicable sensors depend on midair and on the state */
            let selection = self.sensor_selection();

            /* disable sensors for efficiency */
            if !self.midair {
                let wanna_jump = self.input.was_pressed(Button::Fire1)
                    && self.state != State::Charging; /* may be doing some other special move */
                let wanna_middle =
                    self.angle <= 0x40 || self.angle >= 0xC0 || self.angle == 0x80;

                /* M, N are active during regular movement and on moving
                   platforms */
                let enable_m = self.gsp <= self.tunables.movethreshold
                    || (self.angle == 0x0 && self.dx < 0.0);
                let enable_n = self.gsp >= -self.tunables.movethreshold
                    || (self.angle == 0x0 && self.dx > 0.0);
                let check_platform = wanna_middle && !(enable_m && enable_n);
                let on_moving_platform = check_platform && self.is_on_moving_platform(map);

                self.sensors.a_mut(selection).set_enabled(true);
                self.sensors.b_mut(selection).set_enabled(true);
                self.sensors.c_mut(selection).set_enabled(wanna_jump);
                self.sensors.d_mut(selection).set_enabled(wanna_jump);
                self.sensors
                    .m_mut(selection)
                    .set_enabled(wanna_middle && (enable_m || on_moving_platform));
                self.sensors
                    .n_mut(selection)
                    .set_enabled(wanna_middle && (enable_n || on_moving_platform));
            } else {
                self.sensors.a_mut(selection).set_enabled(true);
                self.sensors.b_mut(selection).set_enabled(true);
                self.sensors.c_mut(selection).set_enabled(true);
                self.sensors.d_mut(selection).set_enabled(true);
                self.sensors.m_mut(selection).set_enabled(true);
                self.sensors.n_mut(selection).set_enabled(true);
            }

            /* read sensors */
            let position = self.position();
            let mm = self.movmode;
            let layer = self.layer;
            readings.at_a = self.sensors.a(selection).check(position, mm, layer, map);
            readings.at_b = self.sensors.b(selection).check(position, mm, layer, map);
            readings.at_c = self.sensors.c(selection).check(position, mm, layer, map);
            readings.at_d = self.sensors.d(selection).check(position, mm, layer, map);
            readings.at_m = self.sensors.m(selection).check(position, mm, layer, map);
            readings.at_n = self.sensors.n(selection).check(position, mm, layer, map);

            /* C, D, M, N: ignore clouds */
            readings.at_c = readings.at_c.filter(|o| o.is_solid());
            readings.at_d = readings.at_d.filter(|o| o.is_solid());
            readings.at_m = readings.at_m.filter(|o| o.is_solid());
            readings.at_n = readings.at_n.filter(|o| o.is_solid());

            /* A, B: ignore clouds when moving upwards */
            if self.ysp < 0.0
                && ((self.midair && self.ysp < -self.xsp.abs())
                    || (self.was_midair && self.state != State::Jumping))
            {
                readings.at_a = readings.at_a.filter(|o| o.is_solid());
                readings.at_b = readings.at_b.filter(|o| o.is_solid());
            }

            /* A, B: ignore clouds if the tail of the sensor is not at a
               solid pixel of the cloud; otherwise the player may hang in
               the air because the ground map is h-1 at the empty bottom */
            if let Some(cloud) = readings.at_a.filter(|o| !o.is_solid()) {
                let tail = self.sensors.a(selection).tail(position, mm);
                if !cloud.point_collision(tail) {
                    readings.at_a = None;
                }
            }
            if let Some(cloud) = readings.at_b.filter(|o| !o.is_solid()) {
                let tail = self.sensors.b(selection).tail(position, mm);
                if !cloud.point_collision(tail) {
                    readings.at_b = None;
                }
            }

            /* A, B: ignore clouds whose top edge is too far from the tail
               of the sensor. Still useful with "cloudified" masks, because
               the masks of some clouds may not be cloudified. */
            if self.movmode == MovMode::Floor {
                let mut ygnd_a = 0;
                let mut ygnd_b = 0;
                let mut clouds = 0;
                let mut ignore_a = false;
                let mut ignore_b = false;

                if let Some(cloud) = readings.at_a.filter(|o| !o.is_solid()) {
                    let tail = self.sensors.a(selection).tail(position, mm);
                    ygnd_a = cloud.ground_position(tail.x, tail.y, GroundDirection::Down);
                    ignore_a = tail.y >= ygnd_a + CLOUD_HEIGHT;
                    clouds += 1;
                }

                if let Some(cloud) = readings.at_b.filter(|o| !o.is_solid()) {
                    let tail = self.sensors.b(selection).tail(position, mm);
                    ygnd_b = cloud.ground_position(tail.x, tail.y, GroundDirection::Down);
                    ignore_b = tail.y >= ygnd_b + CLOUD_HEIGHT;
                    clouds += 1;
                }

                /* the cloud may be a ramp; do not ignore it in that case,
                   or the player would get into the ramp */
                if clouds == 1 || (clouds == 2 && (ygnd_a - ygnd_b).abs() < 16) {
                    if ignore_a {
                        readings.at_a = None;
                    }
                    if ignore_b {
                        readings.at_b = None;
                    }
                }
            }

            /* set flags */
            self.midair = readings.at_a.is_none() && readings.at_b.is_none();
            self.touching_ceiling = readings.at_c.is_some() || readings.at_d.is_some();

            /* repeat once if convenient: the applicable sensors and which
               sensors are enabled may have changed. Repeating when rolling
               inside a tube is undesirable (leads to instability). */
            if self.movmode == MovMode::Floor && prev_midair != self.midair && repetitions == 0 {
                repetitions += 1;
                continue;
            }
            break;
        }

        readings
    }

    /// Is a moving obstacle colliding with the sensor?
    fn got_moving_obstacle_at_sensor(&self, map: &ObstacleMap<'_>, sensor: &Sensor) -> bool {
        let at_s = sensor.check(self.position(), self.movmode, self.layer, map);
        at_s.is_some_and(|o| !o.is_static())
    }

    /// Is the actor on a moving platform?
    fn is_on_moving_platform(&self, map: &ObstacleMap<'_>) -> bool {
        let selection = self.sensor_selection();
        self.got_moving_obstacle_at_sensor(map, self.sensors.a(selection))
            || self.got_moving_obstacle_at_sensor(map, self.sensors.b(selection))
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_geometry() {
        let set = SensorSet::new();

        // 19x39 standing box, symmetric around the actor, with the ground
        // sensors overshooting one pixel past the foot
        assert_eq!(set.a(SensorSelection::Standing).local_head().x, -9);
        assert_eq!(set.a(SensorSelection::Standing).local_tail().y, 20);
        assert_eq!(set.b(SensorSelection::Standing).local_head().x, 9);
        assert_eq!(set.c(SensorSelection::Standing).local_tail().y, -20);
        assert_eq!(set.m(SensorSelection::Standing).local_tail().x, -10);
        assert_eq!(set.n(SensorSelection::Standing).local_tail().x, 10);

        // 15x29 jumproll box, offset down by 5
        assert_eq!(set.a(SensorSelection::Jumping).local_head().x, -7);
        assert_eq!(set.a(SensorSelection::Jumping).local_head().y, 5);
        assert_eq!(set.a(SensorSelection::Jumping).local_tail().y, 20);
        assert_eq!(set.c(SensorSelection::Jumping).local_tail().y, -10);

        // flat-ground variants start 8 px below the center
        assert_eq!(set.a(SensorSelection::FlatGround).local_head().y, 8);
        assert_eq!(set.m(SensorSelection::FlatGround).local_head().y, 8);
    }

    #[test]
    fn test_head_sensors_share_normal_variant_on_flat_ground() {
        let set = SensorSet::new();
        assert_eq!(
            set.c(SensorSelection::FlatGround).local_tail(),
            set.c(SensorSelection::Standing).local_tail()
        );
        assert_eq!(
            set.d(SensorSelection::RollingFlatGround).local_tail(),
            set.d(SensorSelection::Rolling).local_tail()
        );
    }
}
