//! Configuration types for the modem core: wire parameters, channel-access
//! (CSMA) parameters, and the Costas loop tuning used by the demodulator.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Fixed wire-format parameters for the QPSK soundcard link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireConfig {
    /// Symbol rate, symbols/sec.
    pub baud: u32,
    /// Audio sample rate, samples/sec.
    pub sample_rate: u32,
    /// Passband center frequency, Hz.
    pub center_freq_hz: f64,
    /// RRC roll-off factor.
    pub rolloff: f64,
    /// RRC filter length; must be odd.
    pub n_taps: usize,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            baud: 1200,
            sample_rate: 9600,
            center_freq_hz: 1000.0,
            rolloff: 0.35,
            n_taps: 65,
        }
    }
}

impl WireConfig {
    /// Samples per symbol (`cycles` in the original source: 9600/1200 = 8).
    pub fn samples_per_symbol(&self) -> usize {
        (self.sample_rate / self.baud) as usize
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.baud == 0 {
            return Err(ConfigError::InvalidBaud { baud: self.baud });
        }
        if self.sample_rate % self.baud != 0 {
            return Err(ConfigError::SampleRateMismatch {
                sample_rate: self.sample_rate,
                baud: self.baud,
            });
        }
        Ok(())
    }
}

/// Channel-access / CSMA parameters. All duration fields are in units
/// of 10 ms, matching the original's
/// `*_10 ms` convention (`BITS_TO_MS`/`MS_TO_BITS` in `tx.c`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelAccessConfig {
    /// CSMA slot duration, units of 10 ms.
    pub slottime: u32,
    /// p-persistence, 0-255.
    pub persist: u8,
    /// Preamble (TX delay) duration, units of 10 ms.
    pub txdelay: u32,
    /// Trailer (TX tail) duration, units of 10 ms.
    pub txtail: u32,
    /// Skip CSMA arbitration entirely when true.
    pub fulldup: bool,
    /// Post-busy debounce, units of 10 ms.
    pub dwait: u32,
}

impl Default for ChannelAccessConfig {
    fn default() -> Self {
        Self {
            slottime: 10,
            persist: 63,
            txdelay: 10,
            txtail: 10,
            fulldup: false,
            dwait: 0,
        }
    }
}

impl ChannelAccessConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slottime == 0 {
            return Err(ConfigError::InvalidSlottime {
                slottime: self.slottime,
            });
        }
        Ok(())
    }
}

/// Costas loop tuning. Gains `alpha`/`beta` are derived from
/// `bandwidth_hz`/`damping` at construction time by the loop itself;
/// this struct carries only the inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostasConfig {
    /// Loop bandwidth, radians/sample (`omega_n`).
    pub bandwidth: f64,
    /// Damping factor, (0, 1].
    pub damping: f64,
    /// Lower frequency-offset clamp, radians/sample.
    pub freq_min: f64,
    /// Upper frequency-offset clamp, radians/sample.
    pub freq_max: f64,
    pub enabled: bool,
}

impl Default for CostasConfig {
    fn default() -> Self {
        Self {
            bandwidth: 0.02,
            damping: std::f64::consts::FRAC_1_SQRT_2,
            freq_min: -0.01,
            freq_max: 0.01,
            enabled: true,
        }
    }
}

/// AX.25 data-link-layer knobs. The state machine that consumes them is
/// out of scope here; this struct exists only so a shared configuration
/// file parses them without error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Ax25LayerParams {
    #[serde(default)]
    pub frack: Option<u32>,
    #[serde(default)]
    pub retry: Option<u32>,
    #[serde(default)]
    pub paclen: Option<u32>,
    #[serde(default)]
    pub maxframe: Option<u32>,
}

/// Top-level configuration for the modem core.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ModemConfig {
    #[serde(default)]
    pub wire: WireConfig,
    #[serde(default)]
    pub channel_access: ChannelAccessConfig,
    #[serde(default)]
    pub costas: CostasConfig,
    #[serde(default)]
    pub ax25_layer: Ax25LayerParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_config_defaults_match_wire_format() {
        let wire = WireConfig::default();
        assert_eq!(wire.samples_per_symbol(), 8);
        assert!(wire.validate().is_ok());
    }

    #[test]
    fn sample_rate_not_multiple_of_baud_rejected() {
        let wire = WireConfig {
            baud: 1200,
            sample_rate: 9601,
            ..WireConfig::default()
        };
        assert!(wire.validate().is_err());
    }

    #[test]
    fn channel_access_defaults_are_valid() {
        assert!(ChannelAccessConfig::default().validate().is_ok());
    }
}
