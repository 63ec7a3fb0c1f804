//! Error types for the modem core, grouped by subsystem.

use thiserror::Error;

/// Top-level error type for all modem-core operations.
#[derive(Debug, Error)]
pub enum ModemError {
    #[error("DSP error: {0}")]
    Dsp(#[from] DspError),

    #[error("FEC error: {0}")]
    Fec(#[from] FecError),

    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("initialization error: {0}")]
    Init(#[from] InitError),
}

/// DSP path errors: RRC, oscillator, Costas, Gardner, slicer.
#[derive(Debug, Error)]
pub enum DspError {
    #[error("RRC filter: n_taps must be odd, got {n_taps}")]
    EvenTapCount { n_taps: usize },

    #[error("RRC filter: roll-off must be in (0, 1], got {rolloff}")]
    InvalidRolloff { rolloff: f64 },

    #[error("oscillator: sample rate must be > 0, got {sample_rate}")]
    InvalidSampleRate { sample_rate: f64 },

    #[error("Costas loop: damping must be in (0, 1], got {damping}")]
    InvalidDamping { damping: f64 },

    #[error("carrier frequency lock lost: offset {offset_hz} Hz exceeds 100 Hz bound")]
    FrequencyLockLost { offset_hz: f64 },
}

/// Reed-Solomon codec errors.
#[derive(Debug, Error)]
pub enum FecError {
    #[error("unsupported parity symbol count: {nroots}")]
    UnsupportedParity { nroots: usize },

    #[error("data_size + nroots ({total}) exceeds block size {block_size}")]
    BlockTooLarge { total: usize, block_size: usize },

    #[error("block uncorrectable: too many errors")]
    Uncorrectable,

    #[error("corrected error location fell inside the zero-padding region")]
    PaddingCorruption,
}

/// IL2P framing errors.
#[derive(Debug, Error)]
pub enum FramingError {
    #[error("payload size {size} exceeds maximum {max}")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("sync word not found")]
    SyncNotFound,

    #[error("header parity check failed")]
    HeaderUncorrectable,

    #[error("reconstructed payload length {actual} does not match expected {expected}")]
    PayloadLengthMismatch { expected: usize, actual: usize },

    #[error("invalid callsign {callsign:?}: must be 1-6 alphanumeric characters")]
    InvalidAddress { callsign: String },

    #[error("invalid SSID {ssid}: must be 0..=15")]
    InvalidSsid { ssid: u8 },
}

/// TX-queue / DLQ construction-time errors.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("invalid priority level {level}")]
    InvalidPriority { level: usize },
}

/// Channel-access / wire configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("persist must be in 0..=255, got {persist}")]
    InvalidPersist { persist: u32 },

    #[error("slottime must be > 0, got {slottime}")]
    InvalidSlottime { slottime: u32 },

    #[error("baud must be > 0, got {baud}")]
    InvalidBaud { baud: u32 },

    #[error("sample rate {sample_rate} is not an integer multiple of baud {baud}")]
    SampleRateMismatch { sample_rate: u32, baud: u32 },
}

/// Fatal initialization errors: process-lifetime resources that failed to
/// come up. Per the error-handling design, these are the only paths that
/// should end the process; everywhere else a failure is logged and the
/// affected unit of work (frame, block, burst) is dropped.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to build Reed-Solomon tables for nroots={nroots}: {reason}")]
    RsTableInit { nroots: usize, reason: String },

    #[error("failed to spawn {thread_name} thread: {reason}")]
    ThreadSpawn {
        thread_name: &'static str,
        reason: String,
    },

    #[error("failed to open audio device: {reason}")]
    AudioOpen { reason: String },
}

pub type Result<T> = std::result::Result<T, ModemError>;
