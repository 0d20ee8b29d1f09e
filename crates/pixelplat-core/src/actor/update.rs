//! The fixed-step driver and the per-step simulation.
//!
//! The public `update()` is called once per render frame. The simulation
//! itself always advances in steps of 1/60 s; the driver reconciles the
//! render cadence with the fixed step. The order of operations inside
//! `fixed_update()` is contractual for reproducibility: running the same
//! input stream with the same starting state and the same obstacles
//! produces identical results.

use tracing::debug;

use crate::actor::angle::{cos256, sin256};
use crate::actor::{
    nearly_zero, sign, MovMode, PhysicsActor, PhysicsEvent, SensorReadings, State, HARD_CAPSPEED,
    TARGET_FPS,
};
use crate::collision::ObstacleMap;
use crate::input::Button;
use crate::types::{vec2, Point2};

const FIXED_TIMESTEP: f64 = 1.0 / TARGET_FPS;

impl PhysicsActor {
    /// Advance the simulation. Call exactly once per render frame, passing
    /// the obstacles of the frame and the render delta in seconds.
    pub fn update(&mut self, map: &ObstacleMap<'_>, render_dt: f64) {
        /* advance the reference time */
        self.reference_time += render_dt;

        /* Do not skip a step when the engine renders faster than the
           simulation rate. Skipping generates jitter: at 1200 px/s the
           actor moves 20 px per step, and a camera script unaware of the
           skipped frame catches up and stutters. Accepting an occasional
           "free" extra step is preferable; the error is proportional to a
           small timestep and happens rarely. */
        if self.fixed_time > self.reference_time {
            debug!(
                reference_time = self.reference_time,
                "running fast; resyncing the reference time"
            );
            self.reference_time = self.fixed_time + FIXED_TIMESTEP * 0.5;
        }

        /* run the simulation */
        let mut steps = 0;
        while self.fixed_time <= self.reference_time {
            if steps == 0 {
                /* run at most once per render frame to avoid jittering
                   when the engine framerate drops below the simulation
                   rate. The simulation merely appears slower. */
                self.fixed_update(map, FIXED_TIMESTEP);
            }
            steps += 1;

            /* advance the fixed time */
            self.fixed_time += FIXED_TIMESTEP;
        }
    }

    /// One step of the simulation.
    pub(crate) fn fixed_update(&mut self, map: &ObstacleMap<'_>, dt: f64) {
        /*
         * initialization
         */

        /* save the previous state */
        let mut readings: SensorReadings<'_> = self.update_sensors(map);
        let prev_xpos = self.xpos;
        let prev_ypos = self.ypos;
        self.prev_angle = self.angle;
        self.was_midair = self.midair; /* latch after the sensor refresh */

        /* disable simultaneous left + right input */
        if self.input.is_down(Button::Left) && self.input.is_down(Button::Right) {
            self.input.simulate_up(Button::Left);
            self.input.simulate_up(Button::Right);
        }

        /*
         * horizontal control lock
         */

        if self.hlock_timer > 0.0 {
            self.hlock_timer = (self.hlock_timer - dt).max(0.0);

            if !self.midair {
                self.input.simulate_up(Button::Left);
                self.input.simulate_up(Button::Right);
            }

            if !self.midair && !nearly_zero(self.gsp) {
                self.facing_right = self.gsp > 0.0;
            } else if self.midair && !nearly_zero(self.xsp) {
                self.facing_right = self.xsp > 0.0;
            }
        }

        /*
         * death
         */

        if self.state == State::Dead || self.state == State::Drowned {
            self.ysp = (self.ysp + self.tunables.grv * dt).min(self.tunables.topyspeed);
            self.ypos += self.ysp * dt;
            self.facing_right = true;
            return;
        }

        /*
         * getting hit
         */

        if self.state == State::GettingHit {
            self.input.reset();

            /* make sure we don't get locked in this state */
            if !self.midair && !self.was_midair && self.ysp >= 0.0 {
                self.state = State::Stopped;
            }
        }

        /*
         * winning
         */

        if self.winning_pose {
            /* brake on level clear */
            const THRESHOLD: f64 = 60.0;
            self.input.reset();

            self.gsp = self
                .gsp
                .clamp(-0.625 * self.tunables.capspeed, 0.625 * self.tunables.capspeed);
            if self.state == State::Rolling {
                self.notify(PhysicsEvent::Brake);
                self.state = State::Braking;
            }

            if self.gsp > THRESHOLD {
                self.input.simulate_down(Button::Left);
            } else if self.gsp < -THRESHOLD {
                self.input.simulate_down(Button::Right);
            }
        }

        /*
         * facing left or right
         */

        if self.state != State::Rolling
            && self.state != State::Charging
            && (!nearly_zero(self.gsp) || !nearly_zero(self.xsp))
        {
            if (self.gsp > 0.0 || self.midair) && self.input.is_down(Button::Right) {
                self.facing_right = true;
            } else if (self.gsp < 0.0 || self.midair) && self.input.is_down(Button::Left) {
                self.facing_right = false;
            }
        }

        /*
         * charge and release
         */

        if self.state == State::Charging {
            /* attenuate the charge intensity */
            if self.charge_intensity.abs() >= self.tunables.chrgthreshold {
                self.charge_intensity *= 0.999506551 - 1.84539309 * dt;
            }

            /* charging more...! */
            if self.input.was_pressed(Button::Fire1) {
                self.charge_intensity = (self.charge_intensity + 0.25).min(1.0);
                self.notify(PhysicsEvent::Recharge);
            }

            /* release */
            self.gsp = 0.0;
            if !self.input.is_down(Button::Down) {
                let direction = if self.facing_right { 1.0 } else { -1.0 };
                let multiplier = direction * (self.tunables.chrg / 3.0);

                self.gsp = multiplier * (2.0 + self.charge_intensity);
                self.charge_intensity = 0.0;
                self.jump_lock_timer = 2.0 / TARGET_FPS;
                self.state = State::Rolling;

                self.notify(PhysicsEvent::Release);
            }
        }

        /* begin to charge */
        if self.state == State::Ducking
            && self.input.is_down(Button::Down)
            && self.input.was_pressed(Button::Fire1)
            && !nearly_zero(self.tunables.chrg) /* does the character have the ability? */
        {
            self.state = State::Charging;
            self.charge_intensity = 0.0;
            self.notify(PhysicsEvent::Charge);
        }

        /*
         * slope factors
         */

        if !self.midair && self.movmode != MovMode::Ceiling {
            if self.state == State::Rolling {
                if self.gsp * sin256(self.angle) >= 0.0 {
                    /* rolling uphill */
                    self.gsp += self.tunables.rolluphillslp * -sin256(self.angle) * dt;
                } else if self.gsp.abs() < self.tunables.capspeed {
                    /* rolling downhill */
                    self.gsp += self.tunables.rolldownhillslp * -sin256(self.angle) * dt;
                    if self.gsp.abs() > self.tunables.capspeed {
                        self.gsp = self.tunables.capspeed * sign(self.gsp);
                    }
                }
            } else if self.state != State::Charging && self.state != State::GettingHit {
                /* apply if moving or if on a steep slope */
                if self.gsp.abs() >= self.tunables.movethreshold
                    || sin256(self.angle).abs() >= 0.707
                {
                    if self.gsp.abs() < self.tunables.capspeed {
                        /* |slp * -sin(angle)| may be less than the friction
                           when turbocharged: the friction may nullify the
                           slope factor, e.g., at 45 degrees with the
                           hlock timer set */
                        self.gsp += self.tunables.slp * -sin256(self.angle) * dt;
                        if self.gsp.abs() > self.tunables.capspeed {
                            self.gsp = self.tunables.capspeed * sign(self.gsp);
                        }
                    }
                }
            }
        }

        /*
         * walking & running
         */

        if !self.midair
            && self.state != State::Rolling
            && self.state != State::Charging
            && self.state != State::GettingHit
        {
            /* acceleration */
            if self.input.is_down(Button::Right) && self.gsp >= 0.0 {
                if self.gsp < self.tunables.topspeed {
                    self.gsp += self.tunables.acc * dt;
                    if self.gsp >= self.tunables.topspeed {
                        self.gsp = self.tunables.topspeed;
                        self.state = State::Running;
                    } else if !(self.state == State::Pushing && self.facing_right) {
                        self.state = State::Walking;
                    }
                }
            } else if self.input.is_down(Button::Left) && self.gsp <= 0.0 {
                if self.gsp > -self.tunables.topspeed {
                    self.gsp -= self.tunables.acc * dt;
                    if self.gsp <= -self.tunables.topspeed {
                        self.gsp = -self.tunables.topspeed;
                        self.state = State::Running;
                    } else if !(self.state == State::Pushing && !self.facing_right) {
                        self.state = State::Walking;
                    }
                }
            }

            /* deceleration */
            if self.input.is_down(Button::Right) && self.gsp < 0.0 {
                self.gsp += self.tunables.dec * dt;
                if self.gsp >= 0.0 {
                    self.gsp = 0.0;
                    self.state = State::Stopped;
                } else if self.gsp.abs() >= self.tunables.brakingthreshold
                    && self.movmode == MovMode::Floor
                    && self.state != State::Braking
                {
                    self.state = State::Braking;
                    self.notify(PhysicsEvent::Brake);
                }
            } else if self.input.is_down(Button::Left) && self.gsp > 0.0 {
                self.gsp -= self.tunables.dec * dt;
                if self.gsp <= 0.0 {
                    self.gsp = 0.0;
                    self.state = State::Stopped;
                } else if self.gsp.abs() >= self.tunables.brakingthreshold
                    && self.movmode == MovMode::Floor
                    && self.state != State::Braking
                {
                    self.state = State::Braking;
                    self.notify(PhysicsEvent::Brake);
                }
            }

            /* braking & friction */
            if self.state == State::Braking {
                let brk = self.tunables.frc * (1.5 + 3.0 * sin256(self.angle).abs());
                if self.gsp.abs() <= brk * dt {
                    self.gsp = 0.0;
                    self.state = State::Stopped;
                } else {
                    self.gsp -= brk * sign(self.gsp) * dt;
                }
            } else if !self.input.is_down(Button::Left) && !self.input.is_down(Button::Right) {
                if self.gsp.abs() <= self.tunables.frc * dt {
                    self.gsp = 0.0;
                    self.state = State::Stopped;
                } else {
                    self.gsp -= self.tunables.frc * sign(self.gsp) * dt;
                }
            }
        }

        /*
         * looking up & crouching down
         */

        if !self.midair
            && self.state != State::Pushing
            && self.state != State::Rolling
            && self.state != State::Charging
            && nearly_zero(self.gsp)
        {
            if self.input.is_down(Button::Down) {
                self.state = State::Ducking;
            } else if self.input.is_down(Button::Up) {
                self.state = State::LookingUp;
            }
        }

        /*
         * springing
         */

        if self.state == State::Springing && self.midair && self.ysp > 0.0 {
            self.state = State::Walking;
        }

        /*
         * breathing
         */

        if self.breathe_timer > 0.0 {
            self.breathe_timer -= dt;
            self.state = State::Breathing;
        } else if self.state == State::Breathing && self.midair {
            self.breathe_timer = 0.0;
            self.state = State::Walking;
        }

        /*
         * balancing on ledges
         */

        if !self.midair
            && self.movmode == MovMode::Floor
            && !(self.state == State::Ledge || self.state == State::Pushing)
            && (readings.at_a.is_some() ^ readings.at_b.is_some())
            && nearly_zero(self.gsp)
        {
            let sensor = if readings.at_a.is_some() {
                self.sensor_a()
            } else {
                self.sensor_b()
            };
            let position = vec2(self.xpos.floor(), self.ypos.floor());
            let tail = sensor.tail(position, self.movmode);

            /* probe below the midpoint between the actor and the
               overhanging foot */
            let delta = position.x as i32 - tail.x;
            let midpoint = position.x as i32 + delta / 2;
            let sweet_spot = Point2::new(midpoint, tail.y + 8);

            if map
                .best_obstacle_at(
                    sweet_spot.x,
                    sweet_spot.y,
                    sweet_spot.x,
                    sweet_spot.y,
                    self.movmode,
                    self.layer,
                )
                .is_none()
            {
                self.state = State::Ledge;
            }
        }

        /*
         * rolling
         */

        /* start rolling */
        if !self.midair
            && (self.state == State::Walking || self.state == State::Running)
            && self.gsp.abs() >= self.tunables.rollthreshold
            && self.input.is_down(Button::Down)
        {
            self.state = State::Rolling;
            self.notify(PhysicsEvent::Roll);
        }

        /* roll */
        if !self.midair && self.state == State::Rolling {
            /* deceleration */
            if self.input.is_down(Button::Right) && self.gsp < 0.0 {
                self.gsp = (self.gsp + self.tunables.rolldec * dt).min(0.0);
            } else if self.input.is_down(Button::Left) && self.gsp > 0.0 {
                self.gsp = (self.gsp - self.tunables.rolldec * dt).max(0.0);
            }

            /* friction */
            if self.gsp.abs() > self.tunables.rollfrc * dt {
                self.gsp -= self.tunables.rollfrc * sign(self.gsp) * dt;
            } else {
                self.gsp = 0.0;
            }

            /* unroll */
            if self.gsp.abs() < self.tunables.unrollthreshold {
                self.state = State::Stopped; /* anim transition: rolling -> stopped */
            }

            /* facing right? */
            if !nearly_zero(self.gsp) {
                self.facing_right = self.gsp > 0.0;
            }
        }

        /*
         * speed cap & conversions
         */

        if !self.midair {
            /* cap gsp; you're way too fast... */
            self.gsp = self.gsp.clamp(-HARD_CAPSPEED, HARD_CAPSPEED);

            /* convert gsp to xsp and ysp, unless xsp/ysp were changed
               externally (springing, etc.) */
            if !self.want_to_detach_from_ground {
                self.xsp = self.gsp * cos256(self.angle);
                self.ysp = self.gsp * -sin256(self.angle);
            }
        } else {
            /* cap xsp & ysp */
            self.xsp = self.xsp.clamp(-HARD_CAPSPEED, HARD_CAPSPEED);
            self.ysp = self.ysp.clamp(-HARD_CAPSPEED, HARD_CAPSPEED);
        }

        /*
         * falling off
         */

        if self.midair {
            /* air acceleration */
            if self.input.is_down(Button::Right) {
                if self.xsp < self.tunables.topspeed {
                    self.xsp += self.tunables.air * dt;
                    if self.xsp > self.tunables.topspeed {
                        self.xsp = self.tunables.topspeed;
                    }
                }
            } else if self.input.is_down(Button::Left) {
                if self.xsp > -self.tunables.topspeed {
                    self.xsp -= self.tunables.air * dt;
                    if self.xsp < -self.tunables.topspeed {
                        self.xsp = -self.tunables.topspeed;
                    }
                }
            }

            /* air drag */
            if self.ysp < 0.0
                && self.ysp > self.tunables.airdragthreshold
                && self.state != State::GettingHit
                && self.xsp.abs() >= self.tunables.airdragxthreshold
            {
                let [a0, a1] = self.tunables.airdrag_coefficient();
                self.xsp *= a0 * dt + a1;
            }

            /* gravity */
            if self.ysp < self.tunables.topyspeed {
                let grv = if self.state != State::GettingHit {
                    self.tunables.grv
                } else {
                    (self.tunables.grv / 7.0) * 6.0
                };
                self.ysp = (self.ysp + grv * dt).min(self.tunables.topyspeed);
            }
        }

        /*
         * jumping
         */

        if !self.midair {
            self.jump_lock_timer -= dt;
            if self.jump_lock_timer <= 0.0 {
                self.jump_lock_timer = 0.0;

                /* jump */
                let may_jump = (!self.input.is_down(Button::Up)
                    && !self.input.is_down(Button::Down))
                    || self.state == State::Rolling;
                if self.input.was_pressed(Button::Fire1)
                    && may_jump
                    && !self.touching_ceiling /* don't bother jumping near a ceiling */
                {
                    self.xsp = self.tunables.jmp * sin256(self.angle)
                        + self.gsp * cos256(self.angle);
                    self.ysp = self.tunables.jmp * cos256(self.angle)
                        - self.gsp * sin256(self.angle);
                    self.state = State::Jumping;
                    self.want_to_detach_from_ground = true;
                    self.force_angle(map, &mut readings, 0x0);

                    self.notify(PhysicsEvent::Jump);
                }
            }
        } else {
            /* jump sensitivity */
            if self.state == State::Jumping
                && !self.input.is_down(Button::Fire1)
                && self.ysp < self.tunables.jmprel
            {
                self.ysp = self.tunables.jmprel;
            }
        }

        /*
         * moving the player
         */

        self.xpos += self.xsp * dt;
        self.ypos += self.ysp * dt;
        readings = self.update_sensors(map);

        /*
         * getting smashed
         */

        if self.is_smashed(map) {
            self.notify(PhysicsEvent::Smash);
            self.kill();
            return;
        }

        /*
         * collisions
         */

        /* we generally test for wall collisions first. However, this may
           not be appropriate when |ysp| is very large: the actor may be
           spuriously repositioned when hitting the ground or the ceiling.
           Delaying wall collisions may cause wall bugs, so restrict this
           a lot. */
        let delay_wall_collisions = (self.midair || self.was_midair)
            && self.ysp.abs() >= 900.0 /* default topyspeed is 960 px/s */
            && self.xsp.abs() <= 30.0; /* almost vertical movement */

        if !delay_wall_collisions {
            self.handle_walls(map, &mut readings);
            self.handle_ground_and_ceiling(map, &mut readings, dt);
        } else {
            self.handle_ground_and_ceiling(map, &mut readings, dt);
            self.handle_walls(map, &mut readings);
        }

        /*
         * falling off walls and ceilings
         */

        if !self.midair && self.hlock_timer == 0.0 && self.movmode != MovMode::Floor {
            if self.gsp.abs() < self.tunables.falloffthreshold {
                self.hlock_timer = 0.5;
                if self.angle >= 0x40 && self.angle <= 0xC0 {
                    self.gsp = 0.0;
                    self.force_angle(map, &mut readings, 0x0);
                }
            }
        }

        /*
         * waiting
         */

        if self.state == State::Stopped {
            self.wait_timer += dt;
            if self.wait_timer >= self.tunables.waittime {
                self.state = State::Waiting;
            }
        } else {
            self.wait_timer = 0.0;
        }

        /*
         * misc
         */

        /* corrections when landing on the ground */
        if !self.midair && self.was_midair {
            if self.state == State::GettingHit {
                /* stop when landing after getting hit */
                self.gsp = 0.0;
                self.xsp = 0.0;
                self.state = State::Stopped;
                self.notify(PhysicsEvent::Blink);
            } else if self.state == State::Rolling {
                /* unroll when landing, unless the player wants to (and
                   can) keep rolling */
                if self.midair_timer >= 0.2 {
                    let wanna_roll = self.input.is_down(Button::Down);
                    let can_roll = self.gsp.abs() >= self.tunables.rollthreshold;

                    if !(wanna_roll && can_roll) {
                        self.state = self.walking_or_running();
                        if !nearly_zero(self.gsp) {
                            self.facing_right = self.gsp > 0.0;
                        }
                    }
                }
            } else {
                /* walk / run */
                self.state = self.walking_or_running();
            }
        }

        /* animation corrections while on the ground */
        if !self.midair
            && self.state != State::Rolling
            && self.state != State::Charging
            && self.state != State::GettingHit
            && self.state != State::Winning
        {
            if self.gsp.abs() < self.tunables.movethreshold {
                if self.state == State::Pushing
                    && !self.input.is_down(Button::Left)
                    && !self.input.is_down(Button::Right)
                {
                    self.state = State::Stopped;
                } else if self.state == State::Pushing
                    || self.state == State::LookingUp
                    || self.state == State::Ducking
                    || self.state == State::Ledge
                {
                    /* keep it */
                } else if self.input.is_down(Button::Left) || self.input.is_down(Button::Right) {
                    self.state = State::Walking;
                } else if self.state != State::Waiting {
                    self.state = State::Stopped;
                } else if !nearly_zero(self.gsp) {
                    self.state = State::Walking;
                }
            } else if self.state == State::Stopped
                || self.state == State::Waiting
                || self.state == State::Ledge
                || self.state == State::Walking
                || self.state == State::Running
                || self.state == State::Ducking
                || self.state == State::LookingUp
            {
                self.state = self.walking_or_running();
            } else if self.state == State::Pushing && self.gsp.abs() >= 30.0 {
                self.state = State::Walking;
            }
        }

        /* fix invalid states */
        if self.midair {
            if self.state == State::Pushing
                || self.state == State::Ledge
                || self.state == State::Stopped
                || self.state == State::Waiting
                || self.state == State::Braking
                || self.state == State::Ducking
                || self.state == State::LookingUp
            {
                self.state = self.walking_or_running();
            }
        } else if self.state == State::Walking && nearly_zero(self.gsp) {
            self.state = State::Stopped;
        }

        /* remain in the winning state */
        if self.winning_pose && !self.midair && self.gsp.abs() < self.tunables.movethreshold {
            self.state = State::Winning;
        }

        /* save the delta position */
        self.dx = self.xpos - prev_xpos;
        self.dy = self.ypos - prev_ypos;

        /* update the midair timer */
        if self.midair {
            self.midair_timer += dt;
        } else {
            self.midair_timer = 0.0;
        }

        /* sanity checks */
        debug_assert!(self.xpos.is_finite() && self.ypos.is_finite());
        debug_assert!(self.xsp.is_finite() && self.ysp.is_finite() && self.gsp.is_finite());
        debug_assert!((0x0..=0xFF).contains(&self.angle));
    }
}
