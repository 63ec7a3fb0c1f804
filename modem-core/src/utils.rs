//! Bitstream and PCM conversion helpers shared across the DSP and framing
//! modules.

use num_complex::Complex64;

/// Scale factor mapping a unit-magnitude complex sample to PCM: maps to
/// 50% of signed 16-bit full scale, per the wire format.
pub const PCM_SCALE: f64 = 16384.0;

pub fn bytes_to_bitstream(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .flat_map(|byte| (0..8).rev().map(move |bit| (byte >> bit) & 1))
        .collect()
}

pub fn pack_bits(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | (b & 1)))
        .collect()
}

pub fn bits_to_string(bits: &[u8]) -> String {
    let bytes = pack_bits(bits);
    String::from_utf8_lossy(&bytes).to_string()
}

/// Decode one little-endian signed-16 PCM I/Q pair (4 bytes) into a unit
/// complex sample. Inverse of `iq_to_pcm_bytes`.
pub fn pcm_bytes_to_iq(bytes: [u8; 4]) -> Complex64 {
    let i = i16::from_le_bytes([bytes[0], bytes[1]]) as f64;
    let q = i16::from_le_bytes([bytes[2], bytes[3]]) as f64;
    Complex64::new(i / PCM_SCALE, q / PCM_SCALE)
}

/// Encode a unit-magnitude complex sample as 4 bytes of little-endian
/// signed-16 PCM I/Q, matching `tx.c`'s `put_symbols`.
pub fn iq_to_pcm_bytes(sample: Complex64) -> [u8; 4] {
    let i = (sample.re * PCM_SCALE) as i16;
    let q = (sample.im * PCM_SCALE) as i16;
    let mut out = [0u8; 4];
    out[0..2].copy_from_slice(&i.to_le_bytes());
    out[2..4].copy_from_slice(&q.to_le_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_bitstream_roundtrip() {
        let text = b"IL2P";
        let bits = bytes_to_bitstream(text);
        assert_eq!(bits.len(), text.len() * 8);
        let packed = pack_bits(&bits);
        assert_eq!(packed, text);
    }

    #[test]
    fn pcm_roundtrip_within_quantization() {
        let sample = Complex64::new(0.5, -0.25);
        let bytes = iq_to_pcm_bytes(sample);
        let recovered = pcm_bytes_to_iq(bytes);
        assert!((recovered.re - sample.re).abs() < 1e-3);
        assert!((recovered.im - sample.im).abs() < 1e-3);
    }
}
