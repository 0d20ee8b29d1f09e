//! Angle estimation and the movement-mode bands.
//!
//! Angles are encoded in [0, 255], increasing clockwise, with 0 meaning the
//! floor normal points up. Conversion to degrees:
//!
//!     degrees = ((256 - angle) * 1.40625) % 360
//!     angle   = (256 - degrees / 1.40625) % 256
//!
//! (180/128 = 1.40625.) Trigonometry comes from a 256-entry cosine table;
//! slopes are read from a precomputed table of atan2 values for integer
//! rises and runs.

use crate::actor::{MovMode, PhysicsActor, SensorReadings, CLOUD_HEIGHT, TARGET_FPS};
use crate::collision::{GroundDirection, ObstacleMap};
use crate::types::{vec2, Vec2};

/// cos(2*pi*a/256) for a in 0..256. SIN is read from the same table with a
/// quarter-turn offset.
#[rustfmt::skip]
static COS_TABLE: [f64; 256] = [
    1.000000000000000, 0.999698818696204, 0.998795456205172, 0.997290456678690,
    0.995184726672197, 0.992479534598710, 0.989176509964781, 0.985277642388941,
    0.980785280403230, 0.975702130038529, 0.970031253194544, 0.963776065795440,
    0.956940335732209, 0.949528180593037, 0.941544065183021, 0.932992798834739,
    0.923879532511287, 0.914209755703531, 0.903989293123443, 0.893224301195515,
    0.881921264348355, 0.870086991108711, 0.857728610000272, 0.844853565249707,
    0.831469612302545, 0.817584813151584, 0.803207531480645, 0.788346427626606,
    0.773010453362737, 0.757208846506485, 0.740951125354959, 0.724247082951467,
    0.707106781186548, 0.689540544737067, 0.671558954847018, 0.653172842953777,
    0.634393284163645, 0.615231590580627, 0.595699304492433, 0.575808191417845,
    0.555570233019602, 0.534997619887097, 0.514102744193222, 0.492898192229784,
    0.471396736825998, 0.449611329654607, 0.427555093430282, 0.405241314004990,
    0.382683432365090, 0.359895036534988, 0.336889853392220, 0.313681740398892,
    0.290284677254462, 0.266712757474898, 0.242980179903264, 0.219101240156870,
    0.195090322016128, 0.170961888760301, 0.146730474455362, 0.122410675199216,
    0.098017140329561, 0.073564563599667, 0.049067674327418, 0.024541228522912,
    0.000000000000000, -0.024541228522912, -0.049067674327418, -0.073564563599667,
    -0.098017140329561, -0.122410675199216, -0.146730474455362, -0.170961888760301,
    -0.195090322016128, -0.219101240156870, -0.242980179903264, -0.266712757474898,
    -0.290284677254462, -0.313681740398891, -0.336889853392220, -0.359895036534988,
    -0.382683432365090, -0.405241314004990, -0.427555093430282, -0.449611329654607,
    -0.471396736825998, -0.492898192229784, -0.514102744193222, -0.534997619887097,
    -0.555570233019602, -0.575808191417845, -0.595699304492433, -0.615231590580627,
    -0.634393284163645, -0.653172842953777, -0.671558954847018, -0.689540544737067,
    -0.707106781186547, -0.724247082951467, -0.740951125354959, -0.757208846506485,
    -0.773010453362737, -0.788346427626606, -0.803207531480645, -0.817584813151584,
    -0.831469612302545, -0.844853565249707, -0.857728610000272, -0.870086991108711,
    -0.881921264348355, -0.893224301195515, -0.903989293123443, -0.914209755703531,
    -0.923879532511287, -0.932992798834739, -0.941544065183021, -0.949528180593037,
    -0.956940335732209, -0.963776065795440, -0.970031253194544, -0.975702130038528,
    -0.980785280403230, -0.985277642388941, -0.989176509964781, -0.992479534598710,
    -0.995184726672197, -0.997290456678690, -0.998795456205172, -0.999698818696204,
    -1.000000000000000, -0.999698818696204, -0.998795456205172, -0.997290456678690,
    -0.995184726672197, -0.992479534598710, -0.989176509964781, -0.985277642388941,
    -0.980785280403230, -0.975702130038529, -0.970031253194544, -0.963776065795440,
    -0.956940335732209, -0.949528180593037, -0.941544065183021, -0.932992798834739,
    -0.923879532511287, -0.914209755703531, -0.903989293123443, -0.893224301195515,
    -0.881921264348355, -0.870086991108711, -0.857728610000272, -0.844853565249707,
    -0.831469612302545, -0.817584813151584, -0.803207531480645, -0.788346427626606,
    -0.773010453362737, -0.757208846506485, -0.740951125354959, -0.724247082951467,
    -0.707106781186548, -0.689540544737067, -0.671558954847019, -0.653172842953777,
    -0.634393284163646, -0.615231590580627, -0.595699304492433, -0.575808191417845,
    -0.555570233019602, -0.534997619887097, -0.514102744193222, -0.492898192229784,
    -0.471396736825998, -0.449611329654607, -0.427555093430282, -0.405241314004990,
    -0.382683432365090, -0.359895036534988, -0.336889853392220, -0.313681740398891,
    -0.290284677254462, -0.266712757474899, -0.242980179903264, -0.219101240156870,
    -0.195090322016129, -0.170961888760302, -0.146730474455362, -0.122410675199216,
    -0.098017140329560, -0.073564563599667, -0.049067674327418, -0.024541228522912,
    0.000000000000000, 0.024541228522912, 0.049067674327418, 0.073564563599667,
    0.098017140329560, 0.122410675199216, 0.146730474455362, 0.170961888760301,
    0.195090322016128, 0.219101240156870, 0.242980179903264, 0.266712757474898,
    0.290284677254462, 0.313681740398891, 0.336889853392220, 0.359895036534988,
    0.382683432365090, 0.405241314004990, 0.427555093430282, 0.449611329654607,
    0.471396736825998, 0.492898192229784, 0.514102744193222, 0.534997619887097,
    0.555570233019602, 0.575808191417845, 0.595699304492433, 0.615231590580627,
    0.634393284163646, 0.653172842953777, 0.671558954847018, 0.689540544737067,
    0.707106781186547, 0.724247082951467, 0.740951125354959, 0.757208846506484,
    0.773010453362737, 0.788346427626606, 0.803207531480645, 0.817584813151584,
    0.831469612302545, 0.844853565249707, 0.857728610000272, 0.870086991108711,
    0.881921264348355, 0.893224301195515, 0.903989293123443, 0.914209755703530,
    0.923879532511287, 0.932992798834739, 0.941544065183021, 0.949528180593037,
    0.956940335732209, 0.963776065795440, 0.970031253194544, 0.975702130038528,
    0.980785280403230, 0.985277642388941, 0.989176509964781, 0.992479534598710,
    0.995184726672197, 0.997290456678690, 0.998795456205172, 0.999698818696204,
];

#[inline]
pub(crate) fn cos256(angle: i32) -> f64 {
    COS_TABLE[(angle & 0xFF) as usize]
}

#[inline]
pub(crate) fn sin256(angle: i32) -> f64 {
    COS_TABLE[((angle + 0x40) & 0xFF) as usize]
}

/// Slopes steeper than SLOPE_LIMIT : 1 all map to the edge of the table.
pub(crate) const SLOPE_LIMIT: i32 = 11;

/// SLP_TABLE[SLOPE_LIMIT + dy][SLOPE_LIMIT + dx] is the angle of the
/// (dy, dx) slope.
#[rustfmt::skip]
static SLP_TABLE: [[u8; 23]; 23] = [
    [0xA0, 0xA2, 0xA4, 0xA6, 0xA9, 0xAC, 0xAF, 0xB2, 0xB5, 0xB9, 0xBC, 0xC0, 0xC4, 0xC7, 0xCB, 0xCE, 0xD1, 0xD4, 0xD7, 0xDA, 0xDC, 0xDE, 0xE0],
    [0x9E, 0xA0, 0xA2, 0xA5, 0xA7, 0xAA, 0xAD, 0xB0, 0xB4, 0xB8, 0xBC, 0xC0, 0xC4, 0xC8, 0xCC, 0xD0, 0xD3, 0xD6, 0xD9, 0xDB, 0xDE, 0xE0, 0xE2],
    [0x9C, 0x9E, 0xA0, 0xA2, 0xA5, 0xA8, 0xAB, 0xAF, 0xB3, 0xB7, 0xBB, 0xC0, 0xC5, 0xC9, 0xCD, 0xD1, 0xD5, 0xD8, 0xDB, 0xDE, 0xE0, 0xE2, 0xE4],
    [0x9A, 0x9B, 0x9E, 0xA0, 0xA3, 0xA6, 0xA9, 0xAD, 0xB1, 0xB6, 0xBB, 0xC0, 0xC5, 0xCA, 0xCF, 0xD3, 0xD7, 0xDA, 0xDD, 0xE0, 0xE2, 0xE5, 0xE6],
    [0x97, 0x99, 0x9B, 0x9D, 0xA0, 0xA3, 0xA7, 0xAB, 0xB0, 0xB5, 0xBA, 0xC0, 0xC6, 0xCB, 0xD0, 0xD5, 0xD9, 0xDD, 0xE0, 0xE3, 0xE5, 0xE7, 0xE9],
    [0x94, 0x96, 0x98, 0x9A, 0x9D, 0xA0, 0xA4, 0xA8, 0xAD, 0xB3, 0xB9, 0xC0, 0xC7, 0xCD, 0xD3, 0xD8, 0xDC, 0xE0, 0xE3, 0xE6, 0xE8, 0xEA, 0xEC],
    [0x91, 0x93, 0x95, 0x97, 0x99, 0x9C, 0xA0, 0xA5, 0xAA, 0xB0, 0xB8, 0xC0, 0xC8, 0xD0, 0xD6, 0xDB, 0xE0, 0xE4, 0xE7, 0xE9, 0xEB, 0xED, 0xEF],
    [0x8E, 0x90, 0x91, 0x93, 0x95, 0x98, 0x9B, 0xA0, 0xA6, 0xAD, 0xB6, 0xC0, 0xCA, 0xD3, 0xDA, 0xE0, 0xE5, 0xE8, 0xEB, 0xED, 0xEF, 0xF0, 0xF2],
    [0x8B, 0x8C, 0x8D, 0x8F, 0x90, 0x93, 0x96, 0x9A, 0xA0, 0xA8, 0xB3, 0xC0, 0xCD, 0xD8, 0xE0, 0xE6, 0xEA, 0xED, 0xF0, 0xF1, 0xF3, 0xF4, 0xF5],
    [0x87, 0x88, 0x89, 0x8A, 0x8B, 0x8D, 0x90, 0x93, 0x98, 0xA0, 0xAD, 0xC0, 0xD3, 0xE0, 0xE8, 0xED, 0xF0, 0xF3, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9],
    [0x84, 0x84, 0x85, 0x85, 0x86, 0x87, 0x88, 0x8A, 0x8D, 0x93, 0xA0, 0xC0, 0xE0, 0xED, 0xF3, 0xF6, 0xF8, 0xF9, 0xFA, 0xFB, 0xFB, 0xFC, 0xFC],
    [0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    [0x7C, 0x7C, 0x7B, 0x7B, 0x7A, 0x79, 0x78, 0x76, 0x73, 0x6D, 0x60, 0x40, 0x20, 0x13, 0x0D, 0x0A, 0x08, 0x07, 0x06, 0x05, 0x05, 0x04, 0x04],
    [0x79, 0x78, 0x77, 0x76, 0x75, 0x73, 0x70, 0x6D, 0x68, 0x60, 0x53, 0x40, 0x2D, 0x20, 0x18, 0x13, 0x10, 0x0D, 0x0B, 0x0A, 0x09, 0x08, 0x07],
    [0x75, 0x74, 0x73, 0x71, 0x70, 0x6D, 0x6A, 0x66, 0x60, 0x58, 0x4D, 0x40, 0x33, 0x28, 0x20, 0x1A, 0x16, 0x13, 0x10, 0x0F, 0x0D, 0x0C, 0x0B],
    [0x72, 0x70, 0x6F, 0x6D, 0x6B, 0x68, 0x65, 0x60, 0x5A, 0x53, 0x4A, 0x40, 0x36, 0x2D, 0x26, 0x20, 0x1B, 0x18, 0x15, 0x13, 0x11, 0x10, 0x0E],
    [0x6F, 0x6D, 0x6B, 0x69, 0x67, 0x64, 0x60, 0x5B, 0x56, 0x50, 0x48, 0x40, 0x38, 0x30, 0x2A, 0x25, 0x20, 0x1C, 0x19, 0x17, 0x15, 0x13, 0x11],
    [0x6C, 0x6A, 0x68, 0x66, 0x63, 0x60, 0x5C, 0x58, 0x53, 0x4D, 0x47, 0x40, 0x39, 0x33, 0x2D, 0x28, 0x24, 0x20, 0x1D, 0x1A, 0x18, 0x16, 0x14],
    [0x69, 0x67, 0x65, 0x63, 0x60, 0x5D, 0x59, 0x55, 0x50, 0x4B, 0x46, 0x40, 0x3A, 0x35, 0x30, 0x2B, 0x27, 0x23, 0x20, 0x1D, 0x1B, 0x19, 0x17],
    [0x66, 0x65, 0x62, 0x60, 0x5D, 0x5A, 0x57, 0x53, 0x4F, 0x4A, 0x45, 0x40, 0x3B, 0x36, 0x31, 0x2D, 0x29, 0x26, 0x23, 0x20, 0x1E, 0x1B, 0x1A],
    [0x64, 0x62, 0x60, 0x5E, 0x5B, 0x58, 0x55, 0x51, 0x4D, 0x49, 0x45, 0x40, 0x3B, 0x37, 0x33, 0x2F, 0x2B, 0x28, 0x25, 0x22, 0x20, 0x1E, 0x1C],
    [0x62, 0x60, 0x5E, 0x5B, 0x59, 0x56, 0x53, 0x50, 0x4C, 0x48, 0x44, 0x40, 0x3C, 0x38, 0x34, 0x30, 0x2D, 0x2A, 0x27, 0x25, 0x22, 0x20, 0x1E],
    [0x60, 0x5E, 0x5C, 0x5A, 0x57, 0x54, 0x51, 0x4E, 0x4B, 0x47, 0x44, 0x40, 0x3C, 0x39, 0x35, 0x32, 0x2F, 0x2C, 0x29, 0x26, 0x24, 0x22, 0x20],
];

/// The angle of the (dy, dx) slope; inputs are clamped to the table range.
#[inline]
pub(crate) fn slope_angle(dy: i32, dx: i32) -> i32 {
    let row = (SLOPE_LIMIT + dy.clamp(-SLOPE_LIMIT, SLOPE_LIMIT)) as usize;
    let col = (SLOPE_LIMIT + dx.clamp(-SLOPE_LIMIT, SLOPE_LIMIT)) as usize;
    i32::from(SLP_TABLE[row][col])
}

/// The minimum angular distance between alpha and beta.
pub(crate) fn delta_angle(alpha: i32, beta: i32) -> i32 {
    let alpha = alpha & 0xFF;
    let beta = beta & 0xFF;
    let diff = (alpha - beta).abs();
    if diff > 0x80 {
        0xFF - diff + 1
    } else {
        diff
    }
}

impl PhysicsActor {
    /// Map the angle to a movement mode. Call whenever the angle changes.
    ///
    /// Angles 0x20, 0x60, 0xA0 and 0xE0 prioritize the floor and ceiling
    /// modes. Imagine running downhill on a 45 degree slope and then hitting
    /// a plain floor: the floor may momentarily be considered a wall if the
    /// actor is still in a wall mode at high speed, stopping it abruptly.
    pub(crate) fn update_movmode(&mut self) {
        if self.angle <= 0x20 || self.angle >= 0xE0 {
            if self.movmode == MovMode::Ceiling {
                /* rolling direction inverts when leaving the ceiling */
                self.gsp = -self.gsp;
            }
            self.movmode = MovMode::Floor;
        } else if self.angle > 0x20 && self.angle < 0x60 {
            self.movmode = MovMode::LeftWall;
        } else if self.angle >= 0x60 && self.angle <= 0xA0 {
            self.movmode = MovMode::Ceiling;
        } else {
            self.movmode = MovMode::RightWall;
        }
    }

    /// Force the angle to a value and refresh the movmode and the sensors.
    pub(crate) fn force_angle<'m>(
        &mut self,
        map: &ObstacleMap<'m>,
        readings: &mut SensorReadings<'m>,
        new_angle: i32,
    ) {
        self.angle = new_angle;
        self.prev_angle = new_angle;

        self.update_movmode();
        *readings = self.update_sensors(map);
    }

    /// Horizontal offset of the two angle probes from the actor.
    fn distance_between_angle_sensors(&self) -> i32 {
        const DEFAULT_CAPSPEED: f64 = 16.0 * TARGET_FPS;

        if self.gsp.abs() <= DEFAULT_CAPSPEED {
            13
        } else {
            11 /* very high speeds */
        }
    }

    /// Estimate the angle from the terrain below (or around) the actor.
    ///
    /// Two probes, offset by +-hoff along the local floor direction, walk
    /// down the local normal until both find ground; the angle is read from
    /// the slope table. If the measurement deviates too much, retry with a
    /// smaller hoff. The probe origin is offset along the velocity to
    /// reduce lag on fast slopes.
    pub(crate) fn update_angle<'m>(
        &mut self,
        map: &ObstacleMap<'m>,
        readings: &mut SensorReadings<'m>,
        dt: f64,
    ) {
        let sensor = self.sensor_a();
        let sensor_height = sensor.local_tail().y - sensor.local_head().y;
        let search_base = sensor.local_tail().y - 1;
        let max_iterations = sensor_height * 3;

        let half_dist = self.distance_between_angle_sensors() / 2;
        let mut hoff = half_dist + (1 - half_dist % 2); /* odd number: 7, 6 */
        let min_hoff = if self.was_midair { 5 } else { 1 }; /* need a proper angle when reattaching to the ground or to the ceiling */
        let max_delta = (hoff * 2).min(SLOPE_LIMIT);
        let angular_tolerance = 0x14;
        let current_angle = self.angle;
        let (mut dx, mut dy) = (0, 0);

        let abs_gsp = self.gsp.abs();
        let within_default_capspeed = abs_gsp <= 16.0 * TARGET_FPS;
        let within_increased_capspeed = abs_gsp <= 20.0 * TARGET_FPS;

        let position = self.position();
        let velocity = vec2(self.xsp, self.ysp);
        let ds = velocity * dt;
        let linear_prediction_factor = if self.was_midair {
            0.0 /* undesirable when just landed */
        } else if within_default_capspeed {
            0.4
        } else if within_increased_capspeed {
            0.5
        } else {
            0.67
        };
        let predicted_position = position + ds * linear_prediction_factor;
        let predicted_angle = current_angle; /* assume continuity */

        loop {
            self.angle = predicted_angle;
            self.update_angle_step(
                map,
                hoff,
                search_base,
                predicted_angle,
                predicted_position,
                max_iterations,
                &mut dx,
                &mut dy,
            );
            hoff -= 2; /* increase precision */

            let out_of_range = dx < -max_delta
                || dx > max_delta
                || dy < -max_delta
                || dy > max_delta
                || delta_angle(self.angle, current_angle) > angular_tolerance;
            if !(hoff >= min_hoff
                && readings.at_m.is_none()
                && readings.at_n.is_none()
                && out_of_range)
            {
                break;
            }
        }

        /* update the sensors after changing the angle */
        self.update_movmode();
        *readings = self.update_sensors(map);
    }

    /// One measurement attempt of [`PhysicsActor::update_angle`].
    #[allow(clippy::too_many_arguments)]
    fn update_angle_step(
        &mut self,
        map: &ObstacleMap<'_>,
        hoff: i32,
        search_base: i32,
        guess_angle: i32,
        curr_position: Vec2,
        max_iterations: i32,
        out_dx: &mut i32,
        out_dy: &mut i32,
    ) {
        let mut found_a = false;
        let mut found_b = false;
        let (mut xa, mut ya, mut xb, mut yb) = (0, 0, 0, 0);

        let movmode = self.movmode;
        let layer = self.layer;

        /* does a probe point hit ground? solid obstacles count anywhere;
           clouds count only within CLOUD_HEIGHT of their top edge */
        let probes_ground = |x: i32, y: i32| -> bool {
            let Some(gnd) = map.best_obstacle_at(x, y, x, y, movmode, layer) else {
                return false;
            };
            gnd.is_solid()
                || match movmode {
                    MovMode::Floor => {
                        y < gnd.ground_position(x, y, GroundDirection::Down) + CLOUD_HEIGHT
                    }
                    MovMode::Ceiling => {
                        y > gnd.ground_position(x, y, GroundDirection::Up) - CLOUD_HEIGHT
                    }
                    MovMode::LeftWall => {
                        x > gnd.ground_position(x, y, GroundDirection::Left) - CLOUD_HEIGHT
                    }
                    MovMode::RightWall => {
                        x < gnd.ground_position(x, y, GroundDirection::Right) + CLOUD_HEIGHT
                    }
                }
        };

        let mut i = 0;
        while i < max_iterations && !(found_a && found_b) {
            let h = (search_base + i) as f64;
            let x = curr_position.x.floor() + h * sin256(guess_angle) + 0.5;
            let y = curr_position.y.floor() + h * cos256(guess_angle) + 0.5;

            if !found_a {
                xa = (x - hoff as f64 * cos256(guess_angle)) as i32;
                ya = (y + hoff as f64 * sin256(guess_angle)) as i32;
                found_a = probes_ground(xa, ya);
            }

            if !found_b {
                xb = (x + hoff as f64 * cos256(guess_angle)) as i32;
                yb = (y - hoff as f64 * sin256(guess_angle)) as i32;
                found_b = probes_ground(xb, yb);
            }

            i += 1;
        }

        *out_dx = 0;
        *out_dy = 0;
        self.angle_sensor = [curr_position, curr_position];

        if !(found_a && found_b) {
            return;
        }

        let ga = map.best_obstacle_at(xa, ya, xa, ya, movmode, layer);
        let gb = map.best_obstacle_at(xb, yb, xb, yb, movmode, layer);
        let (Some(ga), Some(gb)) = (ga, gb) else {
            return;
        };

        match movmode {
            MovMode::Floor => {
                ya = ga.ground_position(xa, ya, GroundDirection::Down);
                yb = gb.ground_position(xb, yb, GroundDirection::Down);
            }
            MovMode::LeftWall => {
                xa = ga.ground_position(xa, ya, GroundDirection::Left);
                xb = gb.ground_position(xb, yb, GroundDirection::Left);
            }
            MovMode::Ceiling => {
                ya = ga.ground_position(xa, ya, GroundDirection::Up);
                yb = gb.ground_position(xb, yb, GroundDirection::Up);
            }
            MovMode::RightWall => {
                xa = ga.ground_position(xa, ya, GroundDirection::Right);
                xb = gb.ground_position(xb, yb, GroundDirection::Right);
            }
        }

        let dx = xb - xa;
        let dy = yb - ya;
        if dx == 0 && dy == 0 {
            return;
        }

        let ang = slope_angle(dy, dx);
        let same_ground = std::ptr::eq(ga, gb);
        if (same_ground && dy.abs() < 16) || delta_angle(ang, guess_angle) <= 0x25 {
            self.angle = ang;
            self.angle_sensor = [vec2(xa as f64, ya as f64), vec2(xb as f64, yb as f64)];
            *out_dx = dx;
            *out_dy = dy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_table_symmetry() {
        assert_eq!(cos256(0), 1.0);
        assert_eq!(cos256(0x80), -1.0);
        assert_eq!(cos256(0x40), 0.0);
        assert_eq!(sin256(0x40), -1.0);
        assert_eq!(sin256(0xC0), 1.0);
        assert!((cos256(0x20) - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_delta_angle_wraps() {
        assert_eq!(delta_angle(0x00, 0x00), 0);
        assert_eq!(delta_angle(0x10, 0x20), 0x10);
        assert_eq!(delta_angle(0xF8, 0x08), 0x10, "wraps around 0");
        assert_eq!(delta_angle(0x00, 0x80), 0x80);
    }

    #[test]
    fn test_slope_angle_cardinals() {
        assert_eq!(slope_angle(0, 5), 0x00, "flat ground, moving right");
        assert_eq!(slope_angle(0, -5), 0x80, "flat, mirrored");
        assert_eq!(slope_angle(-11, 0), 0xC0);
        assert_eq!(slope_angle(11, 0), 0x40);
        assert_eq!(slope_angle(-5, 5), 0xE0, "45 degree ascending slope");
    }

    #[test]
    fn test_slope_angle_clamps_to_table() {
        assert_eq!(slope_angle(-100, 3), slope_angle(-11, 3));
        assert_eq!(slope_angle(4, 100), slope_angle(4, 11));
    }
}
