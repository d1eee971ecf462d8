// ─────────────────────────────────────────────────────────────────────
// Atlas Resonance Kernel — Environment Drivers
// ─────────────────────────────────────────────────────────────────────
//! External phase sources φ_env(t) for entrained layers.
//!
//! Drivers are owned by the caller and sampled at simulation time; the
//! field itself only ever sees one phase per step.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::phase::wrap_phase;

/// Resultant magnitudes below this are treated as a vanished phasor.
const RESULTANT_EPS: f64 = 1e-12;

/// A source of external phase.
pub trait PhaseDriver {
    /// φ(t) in (−π, π].
    fn phase_at(&self, t: f64) -> f64;

    /// Instantaneous angular frequency dφ/dt (rad per time unit).
    fn omega_at(&self, _t: f64) -> f64 {
        0.0
    }
}

impl<F: Fn(f64) -> f64> PhaseDriver for F {
    fn phase_at(&self, t: f64) -> f64 {
        wrap_phase(self(t))
    }
}

/// Constant-frequency oscillator: φ(t) = 2π·f·t + φ0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SineDriver {
    pub freq_hz: f64,
    /// Weight inside a `CompositeDriver`; ignored standalone.
    pub amplitude: f64,
    pub phase0: f64,
}

impl SineDriver {
    pub fn new(freq_hz: f64, amplitude: f64, phase0: f64) -> Self {
        Self {
            freq_hz,
            amplitude,
            phase0,
        }
    }
}

impl PhaseDriver for SineDriver {
    fn phase_at(&self, t: f64) -> f64 {
        wrap_phase(TAU * self.freq_hz * t + self.phase0)
    }

    fn omega_at(&self, _t: f64) -> f64 {
        TAU * self.freq_hz
    }
}

/// Superposition of sine drivers on a rescaled time axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeDriver {
    pub drivers: Vec<SineDriver>,
    /// Driver time = simulation time × `time_scale`.
    pub time_scale: f64,
}

impl CompositeDriver {
    pub fn new(drivers: Vec<SineDriver>, time_scale: f64) -> Self {
        Self {
            drivers,
            time_scale,
        }
    }
}

impl PhaseDriver for CompositeDriver {
    /// Angle of Σ a_k · e^{iφ_k}; 0 when the resultant vanishes.
    fn phase_at(&self, t: f64) -> f64 {
        let ts = t * self.time_scale;
        let (re, im) = self.drivers.iter().fold((0.0, 0.0), |(re, im), d| {
            let phi = d.phase_at(ts);
            (re + d.amplitude * phi.cos(), im + d.amplitude * phi.sin())
        });
        if re.hypot(im) < RESULTANT_EPS {
            return 0.0;
        }
        wrap_phase(im.atan2(re))
    }

    /// Amplitude-weighted mean of the component frequencies.
    fn omega_at(&self, t: f64) -> f64 {
        let ts = t * self.time_scale;
        let (num, den) = self.drivers.iter().fold((0.0, 0.0), |(num, den), d| {
            (num + d.amplitude * d.omega_at(ts), den + d.amplitude)
        });
        num / den.max(RESULTANT_EPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_sine_driver_phase_and_wrap() {
        let d = SineDriver::new(0.25, 1.0, 0.0);
        assert!(d.phase_at(0.0).abs() < 1e-12);
        assert!((d.phase_at(1.0) - PI / 2.0).abs() < 1e-12);
        // One and a quarter turns wraps back to π/2.
        assert!((d.phase_at(5.0) - PI / 2.0).abs() < 1e-9);
        assert!((d.omega_at(3.0) - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_composite_of_one_matches_component() {
        let d = SineDriver::new(0.1, 0.7, 0.3);
        let c = CompositeDriver::new(vec![d], 1.0);
        for k in 0..20 {
            let t = k as f64 * 0.37;
            let diff = wrap_phase(c.phase_at(t) - d.phase_at(t));
            assert!(diff.abs() < 1e-9, "t={t}: {diff}");
        }
    }

    #[test]
    fn test_cancelling_drivers_give_zero_phase() {
        let c = CompositeDriver::new(
            vec![SineDriver::new(0.0, 1.0, 0.0), SineDriver::new(0.0, 1.0, PI)],
            1.0,
        );
        assert_eq!(c.phase_at(2.0), 0.0);
    }

    #[test]
    fn test_composite_omega_is_weighted_mean() {
        let c = CompositeDriver::new(
            vec![SineDriver::new(1.0, 3.0, 0.0), SineDriver::new(2.0, 1.0, 0.0)],
            1.0,
        );
        let expected = TAU * (3.0 * 1.0 + 1.0 * 2.0) / 4.0;
        assert!((c.omega_at(0.0) - expected).abs() < 1e-12);
        assert_eq!(CompositeDriver::new(Vec::new(), 1.0).omega_at(0.0), 0.0);
    }

    #[test]
    fn test_time_scale_stretches_axis() {
        let d = SineDriver::new(0.125, 1.0, 0.0);
        let c = CompositeDriver::new(vec![d], 2.0);
        assert!((c.phase_at(1.0) - d.phase_at(2.0)).abs() < 1e-12);
    }

    #[test]
    fn test_closure_driver_is_wrapped() {
        let drv = |t: f64| 3.0 * t;
        let phi = drv.phase_at(2.0);
        assert!(phi > -PI && phi <= PI);
        assert!((phi - (6.0 - TAU)).abs() < 1e-12);
    }
}
