//! The physics model parameters.
//!
//! All magnitudes are expressed per second: a value that classic engines
//! state per frame at 60 fps is multiplied by 60 (speeds) or 60*60
//! (accelerations). The owner resets these to defaults and then applies
//! character-specific multipliers.

use serde::{Deserialize, Serialize};

const FPS: f64 = 60.0;

/// All tunable physics constants in one place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tunables {
    /// ground acceleration (px/s^2)
    pub acc: f64,
    /// deceleration when steering against the movement (px/s^2)
    pub dec: f64,
    /// ground friction (px/s^2)
    pub frc: f64,
    /// soft speed cap while on the ground (px/s); tiers: default 16*60,
    /// super 20*60, ultra 24*60
    pub capspeed: f64,
    /// top speed reachable by acceleration alone (px/s)
    pub topspeed: f64,
    /// top falling speed (px/s)
    pub topyspeed: f64,
    /// air acceleration (px/s^2)
    pub air: f64,
    /// initial jump speed (px/s, negative is up)
    pub jmp: f64,
    /// jump speed clamp when the button is released early (px/s)
    pub jmprel: f64,
    /// death jump speed (px/s)
    pub diejmp: f64,
    /// get-hit jump speed (px/s)
    pub hitjmp: f64,
    /// gravity (px/s^2)
    pub grv: f64,
    /// slope factor (px/s^2)
    pub slp: f64,
    /// charge-and-release max speed (px/s); zero disables charging
    pub chrg: f64,
    /// roll friction (px/s^2)
    pub rollfrc: f64,
    /// roll deceleration (px/s^2)
    pub rolldec: f64,
    /// slope factor when rolling uphill (px/s^2)
    pub rolluphillslp: f64,
    /// slope factor when rolling downhill (px/s^2)
    pub rolldownhillslp: f64,
    /// minimal movement threshold (px/s)
    pub movethreshold: f64,
    /// minimum speed to keep rolling (px/s)
    pub unrollthreshold: f64,
    /// minimum speed to start rolling (px/s)
    pub rollthreshold: f64,
    /// minimum speed to stay on walls and ceilings (px/s)
    pub falloffthreshold: f64,
    /// minimum speed for the braking animation (px/s)
    pub brakingthreshold: f64,
    /// air drag applies when ysp is in (airdragthreshold, 0) (px/s)
    pub airdragthreshold: f64,
    /// air drag applies when |xsp| is at least this (px/s)
    pub airdragxthreshold: f64,
    /// minimum charge intensity that still decays
    pub chrgthreshold: f64,
    /// idle seconds before the waiting animation
    pub waittime: f64,

    /// air drag (frame-rate-independent friction factor in [0, 1]);
    /// private so that the derived coefficients stay in sync
    airdrag: f64,
    /// precomputed per-step approximation of airdrag^(60*dt):
    /// xsp *= coefficient[0]*dt + coefficient[1]
    airdrag_coefficient: [f64; 2],
}

impl Default for Tunables {
    fn default() -> Self {
        let mut tunables = Self {
            acc:              (3.0 / 64.0) * FPS * FPS,
            dec:               0.5         * FPS * FPS,
            frc:              (3.0 / 64.0) * FPS * FPS,
            capspeed:          16.0        * FPS,
            topspeed:          6.0         * FPS,
            topyspeed:         16.0        * FPS,
            air:              (6.0 / 64.0) * FPS * FPS,
            jmp:               -6.5        * FPS,
            jmprel:            -4.0        * FPS,
            diejmp:            -7.0        * FPS,
            hitjmp:            -4.0        * FPS,
            grv:             (14.0 / 64.0) * FPS * FPS,
            slp:              (8.0 / 64.0) * FPS * FPS,
            chrg:              12.0        * FPS,
            rollfrc:         (3.0 / 128.0) * FPS * FPS,
            rolldec:          (8.0 / 64.0) * FPS * FPS,
            rolluphillslp:    (5.0 / 64.0) * FPS * FPS,
            rolldownhillslp: (20.0 / 64.0) * FPS * FPS,
            movethreshold:     0.125       * FPS,
            unrollthreshold:   0.5         * FPS,
            rollthreshold:     1.0         * FPS,
            falloffthreshold:  2.5         * FPS,
            brakingthreshold:  4.0         * FPS,
            airdragthreshold:  -4.0        * FPS,
            airdragxthreshold: (8.0 / 64.0) * FPS,
            chrgthreshold:     1.0 / 64.0,
            waittime:          3.0,

            airdrag: 0.0,
            airdrag_coefficient: [0.0, 1.0],
        };

        tunables.set_airdrag(31.0 / 32.0);
        tunables
    }
}

impl Tunables {
    /// Air drag factor in [0, 1].
    #[inline]
    pub fn airdrag(&self) -> f64 {
        self.airdrag
    }

    /// Set the air drag factor and recompute the per-step coefficients.
    ///
    /// The exact update would be `xsp *= airdrag^(60*dt)` per step; the
    /// first-order approximation `xsp *= a0*dt + a1` with
    /// a0 = 60*airdrag*ln(airdrag) and a1 = airdrag*(1 - ln(airdrag))
    /// avoids a pow() in the fixed step.
    pub fn set_airdrag(&mut self, value: f64) {
        self.airdrag = value.clamp(0.0, 1.0);

        if self.airdrag > 0.0 && self.airdrag < 1.0 {
            let ln = self.airdrag.ln();
            self.airdrag_coefficient = [60.0 * self.airdrag * ln, self.airdrag * (1.0 - ln)];
        } else if self.airdrag > 0.0 {
            /* no drag */
            self.airdrag_coefficient = [0.0, 1.0];
        } else {
            self.airdrag_coefficient = [0.0, 0.0];
        }
    }

    #[inline]
    pub(crate) fn airdrag_coefficient(&self) -> [f64; 2] {
        self.airdrag_coefficient
    }

    /// Validate all parameters and report every invalid one.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.acc <= 0.0 {
            errors.push("acc must be positive".into());
        }
        if self.dec <= 0.0 {
            errors.push("dec must be positive".into());
        }
        if self.frc < 0.0 {
            errors.push("frc must be >= 0".into());
        }
        if self.topspeed <= 0.0 {
            errors.push("topspeed must be positive".into());
        }
        if self.capspeed < self.topspeed {
            errors.push("capspeed must be >= topspeed".into());
        }
        if self.topyspeed <= 0.0 {
            errors.push("topyspeed must be positive".into());
        }
        if self.air <= 0.0 {
            errors.push("air must be positive".into());
        }
        if self.jmp >= 0.0 {
            errors.push("jmp must be negative (upward)".into());
        }
        if self.jmprel >= 0.0 {
            errors.push("jmprel must be negative (upward)".into());
        }
        if self.grv <= 0.0 {
            errors.push("grv must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.airdrag) {
            errors.push("airdrag must be between 0.0 and 1.0".into());
        }
        if self.chrg < 0.0 {
            errors.push("chrg must be >= 0".into());
        }
        if self.movethreshold < 0.0 {
            errors.push("movethreshold must be >= 0".into());
        }
        if self.rollthreshold < self.unrollthreshold {
            errors.push("rollthreshold must be >= unrollthreshold".into());
        }
        if self.waittime <= 0.0 {
            errors.push("waittime must be positive".into());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Tunables::default().validate().is_ok());
    }

    #[test]
    fn test_default_magnitudes_are_per_second() {
        let tunables = Tunables::default();
        assert_eq!(tunables.acc, 0.046875 * 60.0 * 60.0);
        assert_eq!(tunables.topspeed, 360.0);
        assert_eq!(tunables.capspeed, 960.0);
        assert_eq!(tunables.jmp, -390.0);
        assert_eq!(tunables.waittime, 3.0);
    }

    #[test]
    fn test_airdrag_coefficients() {
        let mut tunables = Tunables::default();

        tunables.set_airdrag(1.0);
        assert_eq!(tunables.airdrag_coefficient(), [0.0, 1.0], "no drag");

        tunables.set_airdrag(0.0);
        assert_eq!(tunables.airdrag_coefficient(), [0.0, 0.0], "full stop");

        tunables.set_airdrag(31.0 / 32.0);
        let [a0, a1] = tunables.airdrag_coefficient();
        // the linearization approximates airdrag^(60*dt) around dt = 1/60
        let dt = 1.0 / 60.0;
        let exact = (31.0f64 / 32.0).powf(60.0 * dt);
        assert!((a0 * dt + a1 - exact).abs() < 1e-3);
    }

    #[test]
    fn test_airdrag_is_clamped() {
        let mut tunables = Tunables::default();
        tunables.set_airdrag(7.0);
        assert_eq!(tunables.airdrag(), 1.0);
        tunables.set_airdrag(-1.0);
        assert_eq!(tunables.airdrag(), 0.0);
    }

    #[test]
    fn test_validate_catches_bad_values() {
        let mut tunables = Tunables::default();
        tunables.jmp = 100.0;
        tunables.topspeed = -1.0;
        let errors = tunables.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("jmp")));
        assert!(errors.iter().any(|e| e.contains("topspeed")));
    }

    #[test]
    fn test_serde_round_trip() {
        let tunables = Tunables::default();
        let json = serde_json::to_string(&tunables).unwrap();
        let back: Tunables = serde_json::from_str(&json).unwrap();
        assert_eq!(back.acc, tunables.acc);
        assert_eq!(back.airdrag(), tunables.airdrag());
        assert_eq!(back.airdrag_coefficient(), tunables.airdrag_coefficient());
    }
}
