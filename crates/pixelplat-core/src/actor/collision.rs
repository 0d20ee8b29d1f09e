//! Collision resolution: walls, ground, ceilings, sticky reacquisition of
//! curving terrain, and crush detection.

use tracing::debug;

use crate::actor::angle::sin256;
use crate::actor::{
    nearly_zero, sign, MovMode, PhysicsActor, SensorReadings, State, AB_SENSOR_OFFSET,
};
use crate::collision::{GroundDirection, Obstacle, ObstacleMap, Sensor};
use crate::input::Button;
use crate::types::vec2;

impl PhysicsActor {
    /* ---------------- walls ---------------- */

    /// Handle collisions with walls at the right and at the left. The wall
    /// the actor is moving toward is resolved first.
    ///
    /// `was_midair` (set in the previous step, possibly after repositioning)
    /// works better here than `midair`: the latter may be momentarily false
    /// even though the actor is not really on the ground (a ground sensor
    /// touching a wall, not the floor), skipping the preferable wall check
    /// for a frame and rarely warping the actor around the wall.
    pub(crate) fn handle_walls<'m>(
        &mut self,
        map: &ObstacleMap<'m>,
        readings: &mut SensorReadings<'m>,
    ) {
        let rightward = if self.was_midair {
            self.xsp > 0.0 || (self.xsp == 0.0 && self.dx >= 0.0)
        } else {
            self.gsp > 0.0 || (self.gsp == 0.0 && self.facing_right)
        };

        if rightward {
            self.handle_right_wall(map, readings);
            self.handle_left_wall(map, readings);
        } else {
            self.handle_left_wall(map, readings);
            self.handle_right_wall(map, readings);
        }
    }

    fn handle_right_wall<'m>(
        &mut self,
        map: &ObstacleMap<'m>,
        readings: &mut SensorReadings<'m>,
    ) {
        let Some(wall_obstacle) = readings.at_n else {
            return;
        };

        let position = vec2(self.xpos.floor(), self.ypos.floor());
        let tail = self.sensor_n().tail(position, self.movmode);
        let local_tail = tail - position.to_point();

        if self.gsp > 0.0 {
            self.gsp = 0.0;
        }

        /* reposition the actor so that the sensor tail sits one pixel
           outside the wall */
        let reset_angle = match self.movmode {
            MovMode::Floor => {
                let wall = wall_obstacle.ground_position(tail.x, tail.y, GroundDirection::Right);
                self.xpos = (wall - local_tail.x - 1) as f64;
                self.xsp = self.xsp.min(0.0);
                false
            }
            MovMode::Ceiling => {
                let wall = wall_obstacle.ground_position(tail.x, tail.y, GroundDirection::Left);
                self.xpos = (wall - local_tail.x + 1) as f64;
                self.xsp = self.xsp.max(0.0);
                true
            }
            MovMode::RightWall => {
                let wall = wall_obstacle.ground_position(tail.x, tail.y, GroundDirection::Up);
                self.ypos = (wall - local_tail.y - 1) as f64;
                self.ysp = self.ysp.max(0.0);
                true
            }
            MovMode::LeftWall => {
                let wall = wall_obstacle.ground_position(tail.x, tail.y, GroundDirection::Down);
                self.ypos = (wall - local_tail.y + 1) as f64;
                self.ysp = self.ysp.min(0.0);
                true
            }
        };

        /* hitting a wall while wall/ceiling-walking means falling to the floor */
        if !reset_angle {
            *readings = self.update_sensors(map);
        } else {
            self.force_angle(map, readings, 0x0);
        }

        /* pushing a wall */
        if !self.midair
            && self.movmode == MovMode::Floor
            && self.state != State::Rolling
            && self.state != State::Charging
            && self.state != State::GettingHit
            && self.input.is_down(Button::Right)
        {
            self.state = State::Pushing;
            self.facing_right = true;
        }
    }

    fn handle_left_wall<'m>(
        &mut self,
        map: &ObstacleMap<'m>,
        readings: &mut SensorReadings<'m>,
    ) {
        let Some(wall_obstacle) = readings.at_m else {
            return;
        };

        let position = vec2(self.xpos.floor(), self.ypos.floor());
        let tail = self.sensor_m().tail(position, self.movmode);
        let local_tail = tail - position.to_point();

        if self.gsp < 0.0 {
            self.gsp = 0.0;
        }

        let reset_angle = match self.movmode {
            MovMode::Floor => {
                let wall = wall_obstacle.ground_position(tail.x, tail.y, GroundDirection::Left);
                self.xpos = (wall - local_tail.x + 1) as f64;
                self.xsp = self.xsp.max(0.0);
                false
            }
            MovMode::Ceiling => {
                let wall = wall_obstacle.ground_position(tail.x, tail.y, GroundDirection::Right);
                self.xpos = (wall - local_tail.x - 1) as f64;
                self.xsp = self.xsp.min(0.0);
                true
            }
            MovMode::RightWall => {
                let wall = wall_obstacle.ground_position(tail.x, tail.y, GroundDirection::Down);
                self.ypos = (wall - local_tail.y - 1) as f64;
                self.ysp = self.ysp.min(0.0);
                true
            }
            MovMode::LeftWall => {
                let wall = wall_obstacle.ground_position(tail.x, tail.y, GroundDirection::Up);
                self.ypos = (wall - local_tail.y + 1) as f64;
                self.ysp = self.ysp.max(0.0);
                true
            }
        };

        if !reset_angle {
            *readings = self.update_sensors(map);
        } else {
            self.force_angle(map, readings, 0x0);
        }

        if !self.midair
            && self.movmode == MovMode::Floor
            && self.state != State::Rolling
            && self.state != State::Charging
            && self.state != State::GettingHit
            && self.input.is_down(Button::Left)
        {
            self.state = State::Pushing;
            self.facing_right = false;
        }
    }

    /* ---------------- ground & ceiling ---------------- */

    /// Resolve ground and ceiling collisions. When moving up, the ceiling
    /// is resolved first.
    pub(crate) fn handle_ground_and_ceiling<'m>(
        &mut self,
        map: &ObstacleMap<'m>,
        readings: &mut SensorReadings<'m>,
        dt: f64,
    ) {
        if self.midair && self.ysp < 0.0 {
            self.handle_ceiling(map, readings, dt);
            self.handle_reacquisition_of_the_ground();
            self.handle_ground(map, readings, dt);
        } else {
            self.handle_ground(map, readings, dt);
            self.handle_reacquisition_of_the_ground();
            self.handle_ceiling(map, readings, dt);
        }
    }

    fn handle_ceiling<'m>(
        &mut self,
        map: &ObstacleMap<'m>,
        readings: &mut SensorReadings<'m>,
        dt: f64,
    ) {
        if !(self.midair && self.touching_ceiling) {
            return;
        }

        let mut must_reattach = false;

        /* the ceiling sensors as of now; the angle machinations below may
           change the active selection */
        let c = self.sensor_c().clone();
        let d = self.sensor_d().clone();

        /* pick the ceiling */
        let use_c = self.pick_the_best_ceiling(readings.at_c, readings.at_d, &c, &d);
        let ceiling = if use_c { readings.at_c } else { readings.at_d };
        let c_or_d = if use_c { &c } else { &d };
        let Some(ceiling) = ceiling else {
            return;
        };

        /* are we touching the ceiling for the first time?

           not testing was_midair leads to spurious bounces when entering
           some tubes (gsp := -gsp via update_movmode, because the angle
           becomes 0x80 for a new computation and then goes back to 0) */
        if self.ysp < 0.0 && self.was_midair {
            /* compute the angle */
            self.force_angle(map, readings, 0x80);
            self.midair = false; /* enable the ground sensors */
            self.update_angle(map, readings, dt);

            /* reattach to the ceiling if steep angle and moving upwards */
            if (self.angle >= 0xA0 && self.angle <= 0xBF)
                || (self.angle >= 0x40 && self.angle <= 0x5F)
            {
                if -self.ysp >= self.xsp.abs() {
                    must_reattach = !self.midair;
                }
            }

            /* restore the midair flag and the angle */
            if !must_reattach {
                self.midair = true; /* enable the ceiling sensors */
                self.force_angle(map, readings, 0x0);
            }
        }

        if must_reattach {
            /* reattach to the ceiling */
            debug!(angle = self.angle, "reattaching to the ceiling");
            self.gsp = self.ysp * -sign(sin256(self.angle));
            self.xsp = 0.0;
            self.ysp = 0.0;

            if self.state != State::Rolling {
                self.state = self.walking_or_running();
            }

            /* make sure we stick to the ground */
            self.want_to_detach_from_ground = false;
        } else {
            /* bump the head */
            self.ysp = self.ysp.max(0.0);

            let position = vec2(self.xpos.floor(), self.ypos.floor());
            let tail = c_or_d.tail(position, self.movmode);
            let local_tail = tail - position.to_point();

            /* reposition so that the head sensor tail is one pixel below
               the ceiling */
            let ceiling_position = ceiling.ground_position(tail.x, tail.y, GroundDirection::Up);
            self.ypos = (ceiling_position - local_tail.y + 1) as f64;

            self.midair = true; /* enable the ceiling sensors */
            *readings = self.update_sensors(map);
        }
    }

    fn handle_ground<'m>(
        &mut self,
        map: &ObstacleMap<'m>,
        readings: &mut SensorReadings<'m>,
        dt: f64,
    ) {
        /* skip the sticky physics if we intend to leave the ground */
        if !self.want_to_detach_from_ground {
            self.handle_sticky_ground(map, readings, dt);
        }

        /* reset flag */
        self.want_to_detach_from_ground = false;

        /* reset counter */
        if self.unstable_angle_counter > 0 {
            self.unstable_angle_counter -= 1;
        }

        /* reset the angle if midair. If we're balancing on a ledge of
           short height, we may be getting a spurious angle, and hence a
           spurious movmode; midair may be true even on the ledge. */
        if self.midair {
            /* midair may be set to false here */
            self.force_angle(map, readings, 0x0);
        }
    }

    /// Sticky physics: if the actor is on the ground or has just left it,
    /// find the ground below the feet - extending the ground sensors by a
    /// speed-dependent length if needed - and snap onto it.
    fn handle_sticky_ground<'m>(
        &mut self,
        map: &ObstacleMap<'m>,
        readings: &mut SensorReadings<'m>,
        dt: f64,
    ) {
        let prev_movmode = self.movmode;

        loop {
            if !self.midair || !self.was_midair || self.unstable_angle_counter > 0 {
                let position = vec2(self.xpos.floor(), self.ypos.floor());

                /* the ground sensors */
                let a = self.sensor_a().clone();
                let b = self.sensor_b().clone();

                /* the sensor linked to the "best" floor */
                let mut a_or_b = &a;

                let mut gnd_a = readings.at_a;
                let mut gnd_b = readings.at_b;
                let mut gnd_pos = 0;

                if gnd_a.is_some() || gnd_b.is_some() {
                    /* a ground already collides with the sensors */
                    let use_a = self.pick_the_best_floor(gnd_a, gnd_b, &a, &b);
                    let gnd = if use_a { gnd_a } else { gnd_b };
                    a_or_b = if use_a { &a } else { &b };

                    if let Some(gnd) = gnd {
                        let tail = a_or_b.tail(position, self.movmode);
                        gnd_pos = gnd.ground_position(
                            tail.x,
                            tail.y,
                            self.movmode.ground_direction(),
                        );
                    }
                } else {
                    /* compute an extended length measured from the tail of
                       the sensors */
                    let max_abs_speed = self.xsp.abs().max(self.ysp.abs()); /* <= |gsp| */
                    let max_abs_ds = (max_abs_speed * dt).ceil() as i32;
                    const MIN_LENGTH: i32 = 14;
                    const MAX_LENGTH: i32 = 32;
                    let tail_depth = AB_SENSOR_OFFSET + 1; /* the extension starts at the tail, and the tail touches the ground */
                    let extended_length =
                        (max_abs_ds + 4).clamp(MIN_LENGTH, MAX_LENGTH) + (tail_depth - 1);

                    /* find the nearest ground using both sensors */
                    let mut gnd_pos_a = 0;
                    let mut gnd_pos_b = 0;

                    if a.is_enabled() {
                        if let Some((gnd, pos)) =
                            self.find_ground_with_extended_sensor(map, &a, extended_length)
                        {
                            gnd_a = Some(gnd);
                            gnd_pos_a = pos;
                        }
                    }

                    if b.is_enabled() {
                        if let Some((gnd, pos)) =
                            self.find_ground_with_extended_sensor(map, &b, extended_length)
                        {
                            gnd_b = Some(gnd);
                            gnd_pos_b = pos;
                        }
                    }

                    /* the position of the nearest ground */
                    if gnd_a.is_some() && gnd_b.is_some() {
                        gnd_pos = match self.movmode {
                            MovMode::Floor | MovMode::RightWall => gnd_pos_a.min(gnd_pos_b),
                            MovMode::Ceiling | MovMode::LeftWall => gnd_pos_a.max(gnd_pos_b),
                        };
                        a_or_b = if gnd_pos == gnd_pos_a { &a } else { &b };
                    } else if gnd_a.is_some() {
                        gnd_pos = gnd_pos_a;
                        a_or_b = &a;
                    } else if gnd_b.is_some() {
                        gnd_pos = gnd_pos_b;
                        a_or_b = &b;
                    }
                }

                /* reposition the actor: put the tail of the sensor on the
                   ground. If no ground was found, the distance is too
                   great and we won't stick. */
                if gnd_a.is_some() || gnd_b.is_some() {
                    let tail = a_or_b.tail(position, self.movmode);
                    let offset = AB_SENSOR_OFFSET;

                    match self.movmode {
                        MovMode::Floor => {
                            self.ypos = (position.y as i32 + (gnd_pos - tail.y) + offset) as f64;
                        }
                        MovMode::Ceiling => {
                            self.ypos = (position.y as i32 + (gnd_pos - tail.y) - offset) as f64;
                        }
                        MovMode::RightWall => {
                            self.xpos = (position.x as i32 + (gnd_pos - tail.x) + offset) as f64;
                        }
                        MovMode::LeftWall => {
                            self.xpos = (position.x as i32 + (gnd_pos - tail.x) - offset) as f64;
                        }
                    }

                    self.midair = false; /* get the correct sensors on this refresh */
                    *readings = self.update_sensors(map);
                }
            }

            /* if the actor is still on the ground, update the angle */
            if !self.midair {
                self.update_angle(map, readings, dt);
            }

            /* repeat once if we've changed the movmode.

               unstable_angle_counter: avoid locking the actor when moving
               slowly and getting unstable movmodes in a transition, as in
               0x5e, 0x62, 0x5e, 0x62... (left wall, ceiling...) */
            if self.movmode != prev_movmode && self.unstable_angle_counter == 0 {
                const SPEED_THRESHOLD: f64 = 300.0; /* not moving slowly */

                if self.gsp.abs() < SPEED_THRESHOLD {
                    /* moving slowly; MAY be getting unstable angles */
                    self.unstable_angle_counter = 2;
                } else {
                    /* enough speed; run the sticky routine again on the
                       next step */
                    self.unstable_angle_counter = 1;
                }

                continue;
            }
            break;
        }
    }

    /// Convert airborne velocity back to ground speed when landing.
    fn handle_reacquisition_of_the_ground(&mut self) {
        if !(!self.midair && self.was_midair) {
            return;
        }

        /* moving mostly horizontally: keep xsp */
        if self.xsp.abs() > self.ysp {
            self.gsp = self.xsp;
        }
        /* if not, set gsp based on the angle:

           [0x00, 0x0F] u [0xF0, 0xFF]: flat ground
           [0x10, 0x1F] u [0xE0, 0xEF]: slope
           [0x20, 0x3F] u [0xC0, 0xDF]: steep slope */
        else if self.angle >= 0xF0 || self.angle <= 0x0F {
            self.gsp = self.xsp;
        } else if (0xE0..=0xEF).contains(&self.angle) || (0x10..=0x1F).contains(&self.angle) {
            self.gsp = self.ysp * 0.5 * -sign(sin256(self.angle));
        } else if (0xC0..=0xDF).contains(&self.angle) || (0x20..=0x3F).contains(&self.angle) {
            self.gsp = self.ysp * -sign(sin256(self.angle));
        }

        /* reset speeds */
        self.xsp = 0.0;
        self.ysp = 0.0;
    }

    /* ---------------- helpers ---------------- */

    /// Which is the best floor, the one under A or the one under B?
    /// Returns true for A. Evaluates the sensors also.
    fn pick_the_best_floor(
        &self,
        a: Option<&Obstacle>,
        b: Option<&Obstacle>,
        a_sensor: &Sensor,
        b_sensor: &Sensor,
    ) -> bool {
        let (a, b) = match (a, b) {
            (Some(a), Some(b)) => (a, b),
            (Some(_), None) => return true,
            _ => return false,
        };

        let position = vec2(self.xpos.floor(), self.ypos.floor());
        let sa = a_sensor.head(position, self.movmode);
        let sb = b_sensor.head(position, self.movmode);

        match self.movmode {
            MovMode::Floor => {
                let ha = a.ground_position(sa.x, sa.y, GroundDirection::Down);
                let hb = b.ground_position(sb.x, sb.y, GroundDirection::Down);
                ha <= hb
            }
            MovMode::LeftWall => {
                let ha = a.ground_position(sa.x, sa.y, GroundDirection::Left);
                let hb = b.ground_position(sb.x, sb.y, GroundDirection::Left);
                ha >= hb
            }
            MovMode::Ceiling => {
                let ha = a.ground_position(sa.x, sa.y, GroundDirection::Up);
                let hb = b.ground_position(sb.x, sb.y, GroundDirection::Up);
                ha >= hb
            }
            MovMode::RightWall => {
                let ha = a.ground_position(sa.x, sa.y, GroundDirection::Right);
                let hb = b.ground_position(sb.x, sb.y, GroundDirection::Right);
                ha <= hb
            }
        }
    }

    /// Which is the best (tallest) ceiling, the one above C or the one
    /// above D? Returns true for C.
    fn pick_the_best_ceiling(
        &self,
        c: Option<&Obstacle>,
        d: Option<&Obstacle>,
        c_sensor: &Sensor,
        d_sensor: &Sensor,
    ) -> bool {
        let (c, d) = match (c, d) {
            (Some(c), Some(d)) => (c, d),
            (Some(_), None) => return true,
            _ => return false,
        };

        let position = vec2(self.xpos.floor(), self.ypos.floor());
        let sc = c_sensor.tail(position, self.movmode);
        let sd = d_sensor.tail(position, self.movmode);

        match self.movmode {
            MovMode::Floor => {
                let hc = c.ground_position(sc.x, sc.y, GroundDirection::Up);
                let hd = d.ground_position(sd.x, sd.y, GroundDirection::Up);
                hc >= hd
            }
            MovMode::LeftWall => {
                let hc = c.ground_position(sc.x, sc.y, GroundDirection::Right);
                let hd = d.ground_position(sd.x, sd.y, GroundDirection::Right);
                hc <= hd
            }
            MovMode::Ceiling => {
                let hc = c.ground_position(sc.x, sc.y, GroundDirection::Down);
                let hd = d.ground_position(sd.x, sd.y, GroundDirection::Down);
                hc <= hd
            }
            MovMode::RightWall => {
                let hc = c.ground_position(sc.x, sc.y, GroundDirection::Left);
                let hd = d.ground_position(sd.x, sd.y, GroundDirection::Left);
                hc >= hd
            }
        }
    }

    /// Extend a ground sensor and sweep for the ground. Returns None if
    /// no ground is found within the range of the extended sensor.
    fn find_ground_with_extended_sensor<'m>(
        &self,
        map: &ObstacleMap<'m>,
        sensor: &Sensor,
        extended_length: i32,
    ) -> Option<(&'m Obstacle, i32)> {
        let (head, tail) = sensor.extend(self.position(), self.movmode, extended_length);

        map.find_ground(
            head.x.min(tail.x),
            head.y.min(tail.y),
            head.x.max(tail.x),
            head.y.max(tail.y),
            self.layer,
            self.movmode.ground_direction(),
        )
    }

    /* ---------------- crush detection ---------------- */

    /// Is the actor crushed by a solid obstacle overlapping all four
    /// vertical-extreme sensors?
    ///
    /// This logic is susceptible to false positives (squashed when it
    /// shouldn't be) and false negatives. False positives are *very*
    /// undesirable in terms of user experience, whereas rare false
    /// negatives are acceptable, so the check is conservative. Only a
    /// single obstacle is supported: the actor won't get smashed when
    /// stuck at the intersection of two obstacles placed above it, which
    /// is unusual in practice.
    pub(crate) fn is_smashed(&self, map: &ObstacleMap<'_>) -> bool {
        let position = self.position();

        /* quit if midair */
        if self.midair {
            return false;
        }

        /* quit if ysp is non-zero */
        if !nearly_zero(self.ysp) {
            return false;
        }

        /* let's check some sensors */
        let a = self.sensor_a();
        let b = self.sensor_b();
        let c = self.sensor_c();
        let d = self.sensor_d();

        let at_a = a.check(position, self.movmode, self.layer, map);
        let at_b = b.check(position, self.movmode, self.layer, map);
        let at_c = c.check(position, self.movmode, self.layer, map);
        let at_d = d.check(position, self.movmode, self.layer, map);

        /* find a solid obstacle that overlaps sensors A, B, C and D,
           prioritizing obstacles at the top */
        let mut obstacle: Option<&Obstacle> = None;
        for o in [at_a, at_b, at_c, at_d].into_iter().flatten() {
            if o.is_solid()
                && obstacle.map_or(true, |best| o.position().y < best.position().y)
                && a.overlaps_obstacle(position, self.movmode, self.layer, o)
                && b.overlaps_obstacle(position, self.movmode, self.layer, o)
                && c.overlaps_obstacle(position, self.movmode, self.layer, o)
                && d.overlaps_obstacle(position, self.movmode, self.layer, o)
            {
                obstacle = Some(o);
            }
        }

        let Some(obstacle) = obstacle else {
            return false;
        };

        /* find the boundaries of the obstacle */
        let x = self.xpos.floor() as i32;
        let y = self.ypos.floor() as i32;
        let left = obstacle.ground_position(x, y, GroundDirection::Right);
        let right = obstacle.ground_position(x, y, GroundDirection::Left);
        let top = obstacle.ground_position(x, y, GroundDirection::Down);
        let bottom = obstacle.ground_position(x, y, GroundDirection::Up);
        let height = bottom - top;

        /* distance to the nearest horizontal and vertical edges */
        let dl = self.xpos - f64::from(left);
        let dr = self.xpos - f64::from(right);
        let dt = self.ypos - f64::from(top);
        let db = self.ypos - f64::from(bottom);
        let dh = dl.abs().min(dr.abs());
        let dv = dt.abs().min(db.abs());

        /* we may be inside a tube */
        if height <= 0 {
            return false;
        }

        /* don't smash the actor when horizontally getting stuck into a wall */
        if dh < dv {
            return false;
        }

        /* if the actor is near an edge, don't smash it; it will be
           repositioned instead */
        let safety_margin = 16.max((self.tunables.capspeed / 60.0) as i32) / 2;
        if dh < f64::from(safety_margin) {
            return false;
        }

        /* testing dv generates false negatives: dv may be zero when the
           actor is smashed by a moving platform */

        debug!(dh, dv, height, "crushed by a solid obstacle");
        true
    }
}
