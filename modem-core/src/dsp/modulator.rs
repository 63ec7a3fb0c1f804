//! Bit -> symbol -> upsample -> shape -> mix -> PCM modulator.
//!
//! Ported from `tx.c`'s `tx_frame_bits`/`put_symbols`: dibits are formed
//! first-bit-high-order, zero-inserted to the audio sample rate, RRC
//! shaped, mixed to the passband center frequency, and scaled to 16-bit
//! PCM I/Q pairs.

use num_complex::Complex64;

use crate::config::WireConfig;
use crate::dsp::oscillator::Oscillator;
use crate::dsp::rrc::Rrc;
use crate::dsp::slicer::Constellation;
use crate::errors::DspError;
use crate::utils::iq_to_pcm_bytes;

/// The idle-fill octet, sent during TX-delay/TX-tail.
pub const IDLE_OCTET: u8 = 0xCC;

#[derive(Debug, Clone)]
pub struct Modulator {
    rrc: Rrc,
    osc: Oscillator,
    samples_per_symbol: usize,
}

impl Modulator {
    pub fn new(wire: &WireConfig) -> Result<Self, DspError> {
        Ok(Self {
            rrc: Rrc::new(
                wire.sample_rate as f64,
                wire.baud as f64,
                wire.rolloff,
                wire.n_taps,
            )?,
            osc: Oscillator::new(wire.center_freq_hz, wire.sample_rate as f64)?,
            samples_per_symbol: wire.samples_per_symbol(),
        })
    }

    /// Modulate a bit vector (MSB-first dibits: first bit is the
    /// high-order bit) into little-endian PCM I/Q byte pairs.
    pub fn modulate_bits(&mut self, bits: &[u8]) -> Vec<u8> {
        let symbols: Vec<Complex64> = bits
            .chunks(2)
            .filter(|chunk| chunk.len() == 2)
            .map(|chunk| {
                let dibit = (chunk[0] << 1) | chunk[1];
                Constellation::point_for(dibit)
            })
            .collect();
        self.modulate_symbols(&symbols)
    }

    /// Upsample, shape, mix, and PCM-encode a symbol stream.
    pub fn modulate_symbols(&mut self, symbols: &[Complex64]) -> Vec<u8> {
        let upsampled_len = symbols.len() * self.samples_per_symbol;
        let mut signal = vec![Complex64::new(0.0, 0.0); upsampled_len];
        for (i, &sym) in symbols.iter().enumerate() {
            signal[i * self.samples_per_symbol] = sym;
        }

        self.rrc.filter_block(&mut signal);

        let mut out = Vec::with_capacity(upsampled_len * 4);
        for sample in signal {
            let mixed = self.osc.mix(sample, false);
            out.extend_from_slice(&iq_to_pcm_bytes(mixed));
        }
        self.osc.renormalize();
        out
    }

    /// Transmit `n_octets` of the idle pattern, packaged identically to
    /// data bits, to realize TX-delay/TX-tail periods.
    pub fn send_idle(&mut self, n_octets: usize) -> Vec<u8> {
        let bits = crate::utils::bytes_to_bitstream(&vec![IDLE_OCTET; n_octets]);
        self.modulate_bits(&bits)
    }
}
