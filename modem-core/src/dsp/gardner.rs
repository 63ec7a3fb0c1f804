//! Gardner timing-error detector.
//!
//! The original's deque-of-void-pointers window is replaced with a
//! fixed-size ring of 3 complex samples (no heap), and a parallel window
//! of sliced decisions.

use num_complex::Complex64;

use crate::dsp::slicer::decide;

#[derive(Debug, Clone)]
pub struct Gardner {
    /// [previous, middle, current]
    window: [Complex64; 3],
    decisions: [u8; 3],
    clock: u8,
    error: f64,
    prev_error: f64,
}

impl Default for Gardner {
    fn default() -> Self {
        Self::new()
    }
}

impl Gardner {
    pub fn new() -> Self {
        Self {
            window: [Complex64::new(0.0, 0.0); 3],
            decisions: [0; 3],
            clock: 0,
            error: 0.0,
            prev_error: 0.0,
        }
    }

    /// Feed one sample at 2 samples/symbol. Returns `Some(error)` when the
    /// clock wraps to the symbol instant (the middle sample is then the
    /// on-symbol decision sample).
    pub fn push(&mut self, sample: Complex64) -> Option<f64> {
        self.window.copy_within(1.., 0);
        self.window[2] = sample;
        self.decisions.copy_within(1.., 0);
        self.decisions[2] = decide(sample);

        self.clock = (self.clock + 1) % 2;
        if self.clock != 0 {
            return None;
        }

        let [prev, mid, cur] = self.window;
        let mut e = (prev.re - cur.re) * mid.re + (prev.im - cur.im) * mid.im;
        if !e.is_finite() {
            e = 0.0;
        }
        e = e.clamp(-0.3, 0.3);

        self.prev_error = self.error;
        self.error = e;
        Some(e)
    }

    pub fn error(&self) -> f64 {
        self.error
    }

    /// The on-symbol decision sample (middle of the window).
    pub fn mid_sample(&self) -> Complex64 {
        self.window[1]
    }

    /// Roll both windows back one step; unless `preserve_error`, also
    /// restore the previous error estimate.
    pub fn revert(&mut self, preserve_error: bool) {
        self.window.copy_within(0..2, 1);
        self.decisions.copy_within(0..2, 1);
        self.clock = (self.clock + 1) % 2;
        if !preserve_error {
            self.error = self.prev_error;
        }
    }
}
