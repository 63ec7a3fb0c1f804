//! Second-order Costas loop for QPSK carrier-phase/frequency recovery.
//!
//! Loop-filter gains are derived from the bandwidth/damping pair
//! (`alpha`/`beta`) and drive a decision-directed QPSK phase detector,
//! `sign(I)*Q - sign(Q)*I`, rather than a narrowband `Im(symbol^2)`-style
//! detector.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::config::CostasConfig;
use crate::errors::DspError;

#[derive(Debug, Clone)]
pub struct Costas {
    alpha: f64,
    beta: f64,
    phi: f64,
    omega: f64,
    omega_min: f64,
    omega_max: f64,
    enabled: bool,
}

impl Costas {
    pub fn new(config: &CostasConfig) -> Result<Self, DspError> {
        if !(0.0..=1.0).contains(&config.damping) || config.damping == 0.0 {
            return Err(DspError::InvalidDamping {
                damping: config.damping,
            });
        }
        let wn = config.bandwidth;
        let zeta = config.damping;
        let denom = 1.0 + 2.0 * zeta * wn + wn * wn;
        Ok(Self {
            alpha: 4.0 * zeta * wn / denom,
            beta: 4.0 * wn * wn / denom,
            phi: 0.0,
            omega: 0.0,
            omega_min: config.freq_min,
            omega_max: config.freq_max,
            enabled: config.enabled,
        })
    }

    pub fn phase(&self) -> f64 {
        self.phi
    }

    pub fn frequency(&self) -> f64 {
        self.omega
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Rotate `sample` by the loop's current phase estimate for the
    /// decision stage. When disabled, a static -pi/4 rotation substitutes
    /// (diamond -> rectangular).
    pub fn rotate(&self, sample: Complex64) -> Complex64 {
        let angle = if self.enabled { -self.phi } else { -PI / 4.0 };
        sample * Complex64::from_polar(1.0, angle)
    }

    /// Decision-directed QPSK phase-error detector, computed on the
    /// rotated sample.
    pub fn phase_detector(rotated: Complex64) -> f64 {
        rotated.re.signum() * rotated.im - rotated.im.signum() * rotated.re
    }

    /// Advance the loop by one symbol given the phase-detector error.
    pub fn update(&mut self, error: f64) {
        if !self.enabled {
            return;
        }
        self.omega += self.beta * error;
        self.phi += self.omega + self.alpha * error;
        self.wrap_phase();
        self.clamp_frequency();
    }

    fn wrap_phase(&mut self) {
        while self.phi > PI {
            self.phi -= std::f64::consts::TAU;
        }
        while self.phi <= -PI {
            self.phi += std::f64::consts::TAU;
        }
    }

    fn clamp_frequency(&mut self) {
        self.omega = self.omega.clamp(self.omega_min, self.omega_max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CostasConfig {
        CostasConfig {
            bandwidth: 0.02,
            damping: std::f64::consts::FRAC_1_SQRT_2,
            freq_min: -0.01,
            freq_max: 0.01,
            enabled: true,
        }
    }

    #[test]
    fn phase_stays_in_bounds_after_many_updates() {
        let mut costas = Costas::new(&config()).unwrap();
        for i in 0..10_000 {
            let e = (i as f64 * 0.37).sin();
            costas.update(e);
            assert!(costas.phase() > -PI && costas.phase() <= PI);
        }
    }

    #[test]
    fn frequency_stays_clamped() {
        let mut costas = Costas::new(&config()).unwrap();
        for _ in 0..10_000 {
            costas.update(1.0);
        }
        assert!(costas.frequency() <= 0.01 + 1e-12);
        assert!(costas.frequency() >= -0.01 - 1e-12);
    }

    #[test]
    fn disabled_loop_uses_static_rotation() {
        let mut cfg = config();
        cfg.enabled = false;
        let costas = Costas::new(&cfg).unwrap();
        let rotated = costas.rotate(Complex64::new(1.0, 0.0));
        let expected = Complex64::new(1.0, 0.0) * Complex64::from_polar(1.0, -PI / 4.0);
        assert!((rotated - expected).norm() < 1e-12);
    }

    #[test]
    fn invalid_damping_rejected() {
        let mut cfg = config();
        cfg.damping = 0.0;
        assert!(Costas::new(&cfg).is_err());
    }
}
