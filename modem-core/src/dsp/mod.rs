//! QPSK waveform signal-processing chain: RRC shaping, NCO mixing,
//! Costas carrier recovery, Gardner timing recovery, slicing, and the
//! composed modulator/demodulator built from them.

pub mod costas;
pub mod demodulator;
pub mod gardner;
pub mod modulator;
pub mod oscillator;
pub mod rrc;
pub mod slicer;

pub use costas::Costas;
pub use demodulator::{DemodBlockResult, Demodulator};
pub use gardner::Gardner;
pub use modulator::Modulator;
pub use oscillator::Oscillator;
pub use rrc::Rrc;
pub use slicer::{decide, Constellation};
