//! Gray-coded QPSK constellation and slicer.
//!
//! Struct-of-consts point table ported from `protocol.rs`'s
//! `QPSKConstellation`, replaced with a diamond mapping
//! (`{00->(+1,0), 01->(0,+1), 10->(0,-1), 11->(-1,0)}`) rather than the
//! source's 45-degree-rotated points.

use num_complex::Complex64;

pub struct Constellation;

impl Constellation {
    /// `dibit -> point`, indexed by dibit value 0..=3.
    pub const POINTS: [Complex64; 4] = [
        Complex64::new(1.0, 0.0),  // 00
        Complex64::new(0.0, 1.0),  // 01
        Complex64::new(0.0, -1.0), // 10
        Complex64::new(-1.0, 0.0), // 11
    ];

    pub fn point_for(dibit: u8) -> Complex64 {
        Self::POINTS[(dibit & 0x3) as usize]
    }
}

/// Rectangular-domain decision. The input is expected
/// already rotated -pi/4 from the diamond form into rectangular form
/// (the Costas loop's `rotate` does this); under that specific
/// rotation the diamond table's four points land at
/// `(+,-), (+,+), (-,-), (-,+)` for dibits `0..=3` respectively, so the
/// high bit follows `re < 0` and the low bit follows `im > 0`.
pub fn decide(sample: Complex64) -> u8 {
    let high_bit = u8::from(sample.re < 0.0);
    let low_bit = u8::from(sample.im > 0.0);
    2 * high_bit + low_bit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decide_quadrants() {
        assert_eq!(decide(Complex64::new(1.0, 1.0)), 1);
        assert_eq!(decide(Complex64::new(1.0, -1.0)), 0);
        assert_eq!(decide(Complex64::new(-1.0, 1.0)), 3);
        assert_eq!(decide(Complex64::new(-1.0, -1.0)), 2);
    }

    #[test]
    fn diamond_point_survives_disabled_loop_static_rotation() {
        use std::f64::consts::FRAC_PI_4;
        let rotate = |p: Complex64| p * Complex64::from_polar(1.0, -FRAC_PI_4);
        for dibit in 0u8..4 {
            let rotated = rotate(Constellation::point_for(dibit));
            assert_eq!(decide(rotated), dibit);
        }
    }

    #[test]
    fn point_table_is_gray_coded_diamond() {
        assert_eq!(Constellation::point_for(0), Complex64::new(1.0, 0.0));
        assert_eq!(Constellation::point_for(1), Complex64::new(0.0, 1.0));
        assert_eq!(Constellation::point_for(2), Complex64::new(0.0, -1.0));
        assert_eq!(Constellation::point_for(3), Complex64::new(-1.0, 0.0));
    }
}
