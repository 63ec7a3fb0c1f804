//! Complex NCO used for passband/baseband mixing on both TX and RX.
//!
//! Grounded in `tx.c`'s `m_txPhase`/`m_txRect` pair (`m_txRect =
//! cmplx(TAU*CENTER/FS)`, `m_txPhase *= m_txRect` each sample), rebuilt
//! as an owned, per-instance value rather than a process-wide global.

use num_complex::Complex64;

use crate::errors::DspError;

#[derive(Debug, Clone)]
pub struct Oscillator {
    phase: Complex64,
    rect: Complex64,
    samples_since_renorm: u32,
}

/// Renormalize at least this often to bound magnitude drift; a
/// soundcard block is the samples-per-symbol count, so this bound is
/// generous.
const RENORM_INTERVAL: u32 = 4096;

impl Oscillator {
    pub fn new(freq_hz: f64, sample_rate: f64) -> Result<Self, DspError> {
        if sample_rate <= 0.0 {
            return Err(DspError::InvalidSampleRate { sample_rate });
        }
        let angle = std::f64::consts::TAU * freq_hz / sample_rate;
        Ok(Self {
            phase: Complex64::new(1.0, 0.0),
            rect: Complex64::from_polar(1.0, angle),
            samples_since_renorm: 0,
        })
    }

    /// Advance the oscillator by one sample and return its current phasor.
    /// Use `.conj()` on the result to down-mix.
    pub fn advance(&mut self) -> Complex64 {
        self.phase *= self.rect;
        self.samples_since_renorm += 1;
        if self.samples_since_renorm >= RENORM_INTERVAL {
            self.renormalize();
        }
        self.phase
    }

    /// Mix (multiply) `sample` by the oscillator's current phasor and
    /// advance. `conjugate` selects up-mix (false) vs down-mix (true).
    pub fn mix(&mut self, sample: Complex64, conjugate: bool) -> Complex64 {
        let carrier = self.advance();
        if conjugate {
            sample * carrier.conj()
        } else {
            sample * carrier
        }
    }

    /// Force renormalization; call at least once per processed block.
    pub fn renormalize(&mut self) {
        let mag = self.phase.norm();
        if mag > 0.0 {
            self.phase /= mag;
        }
        self.samples_since_renorm = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_stays_unit_magnitude_after_many_samples() {
        let mut osc = Oscillator::new(1000.0, 9600.0).unwrap();
        for _ in 0..100_000 {
            osc.advance();
        }
        osc.renormalize();
        assert!((osc.phase.norm() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_sample_rate_rejected() {
        assert!(Oscillator::new(1000.0, 0.0).is_err());
    }

    #[test]
    fn mixing_by_conjugate_inverts_rotation() {
        let mut up = Oscillator::new(1000.0, 9600.0).unwrap();
        let mut down = Oscillator::new(1000.0, 9600.0).unwrap();
        let sample = Complex64::new(1.0, 0.0);
        let mixed_up = up.mix(sample, false);
        let mixed_down_then_up = down.mix(mixed_up, true);
        assert!((mixed_down_then_up - sample).norm() < 1e-9);
    }
}
