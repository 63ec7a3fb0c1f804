//! AX.25 packet model.
//!
//! Ported from `ax25_pad.h`'s `packet_s`: carries the fields the queueing
//! and IL2P framing layers need (`seq`, `modulo`, `release_time`, the two
//! addresses, and the info part) without implementing the `S`/`I`/`U`
//! frame-type state machine, which is out of scope here.

use crate::errors::FramingError;

pub const MAX_ADDR_LEN: usize = 12;
pub const MAX_INFO_LEN: usize = 2048;

pub const PID_NO_LAYER_3: u8 = 0xf0;

/// A station address: up to 6 characters plus an SSID (0-15).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub callsign: String,
    pub ssid: u8,
}

impl Address {
    pub fn new(callsign: impl Into<String>, ssid: u8) -> Result<Self, FramingError> {
        let callsign = callsign.into().to_ascii_uppercase();
        if callsign.is_empty() || callsign.len() > 6 {
            return Err(FramingError::InvalidAddress {
                callsign: callsign.clone(),
            });
        }
        if !callsign.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(FramingError::InvalidAddress { callsign });
        }
        if ssid > 15 {
            return Err(FramingError::InvalidSsid { ssid });
        }
        Ok(Self { callsign, ssid })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CmdRes {
    #[default]
    Response,
    Command,
    Reserved00,
    Reserved11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameType {
    I,
    SRr,
    SRnr,
    SRej,
    SSrej,
    USabme,
    USabm,
    UDisc,
    UDm,
    UUa,
    UFrmr,
    #[default]
    UUi,
    UXid,
    UTest,
}

/// An AX.25 packet, sufficient for IL2P framing and the transmit queue /
/// DLQ to carry and order. `seq`/`modulo`/`release_time` mirror
/// `packet_s`'s queueing fields directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub destination: Address,
    pub source: Address,
    pub frame_type: FrameType,
    pub cr: CmdRes,
    pub pid: u8,
    pub info: Vec<u8>,
    /// Queue sequence number, assigned by the transmit queue on enqueue.
    pub seq: i64,
    /// Sliding-window modulus (8 or 128), unused until the `I`/`S` frame
    /// state machine is implemented.
    pub modulo: u8,
    /// Scheduled release time, seconds since an arbitrary epoch; used by
    /// the DLQ/sequencer for ordering, not wall-clock scheduling.
    pub release_time: f64,
}

impl Packet {
    pub fn new_ui(
        destination: Address,
        source: Address,
        pid: u8,
        info: Vec<u8>,
    ) -> Result<Self, FramingError> {
        if info.len() > MAX_INFO_LEN {
            return Err(FramingError::PayloadTooLarge {
                size: info.len(),
                max: MAX_INFO_LEN,
            });
        }
        Ok(Self {
            destination,
            source,
            frame_type: FrameType::UUi,
            cr: CmdRes::Command,
            pid,
            info,
            seq: 0,
            modulo: 8,
            release_time: 0.0,
        })
    }

    pub fn info(&self) -> &[u8] {
        &self.info
    }

    pub fn set_info(&mut self, info: Vec<u8>) -> Result<(), FramingError> {
        if info.len() > MAX_INFO_LEN {
            return Err(FramingError::PayloadTooLarge {
                size: info.len(),
                max: MAX_INFO_LEN,
            });
        }
        self.info = info;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_rejects_overlong_callsign() {
        assert!(Address::new("TOOLONGCALL", 0).is_err());
    }

    #[test]
    fn address_rejects_bad_ssid() {
        assert!(Address::new("N0CALL", 16).is_err());
    }

    #[test]
    fn address_uppercases_callsign() {
        let addr = Address::new("n0call", 5).unwrap();
        assert_eq!(addr.callsign, "N0CALL");
    }

    #[test]
    fn ui_packet_rejects_oversized_info() {
        let dest = Address::new("DEST", 0).unwrap();
        let src = Address::new("SRC", 0).unwrap();
        let info = vec![0u8; MAX_INFO_LEN + 1];
        assert!(Packet::new_ui(dest, src, PID_NO_LAYER_3, info).is_err());
    }
}
