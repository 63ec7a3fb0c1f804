//! Type-1 header encode/decode.
//!
//! `il2p_header.c`, which would hold the real IL2P bit-field layout, is
//! not present in the retrieved source (only `il2p_type_1_header`'s
//! prototype survives in `il2p.h`). This implements a self-consistent
//! 13-byte Type-1 header carrying both addresses, PID, a UI flag, and
//! the payload length: two
//! 6-character callsigns packed 6 bits/char (36 bits each, the same
//! compression the real IL2P header uses for addresses), followed by
//! both SSIDs, the UI flag, PID, and a 10-bit payload length, for
//! exactly 104 bits.

use crate::ax25::Address;
use crate::errors::FramingError;

pub const HEADER_SIZE: usize = 13;

const DEST_CALL_BITS: u32 = 36;
const SRC_CALL_BITS: u32 = 36;
const SSID_BITS: u32 = 4;
const UI_BITS: u32 = 1;
const PID_BITS: u32 = 8;
const PAYLOAD_LEN_BITS: u32 = 10;

fn char_to_6bit(c: u8) -> u64 {
    match c {
        b' ' => 0,
        b'A'..=b'Z' => 1 + (c - b'A') as u64,
        b'0'..=b'9' => 27 + (c - b'0') as u64,
        _ => 0,
    }
}

fn six_bit_to_char(v: u64) -> u8 {
    match v {
        0 => b' ',
        1..=26 => b'A' + (v - 1) as u8,
        27..=36 => b'0' + (v - 27) as u8,
        _ => b' ',
    }
}

fn pack_callsign(callsign: &str) -> u64 {
    let padded: Vec<u8> = callsign
        .bytes()
        .chain(std::iter::repeat(b' '))
        .take(6)
        .collect();
    padded
        .iter()
        .fold(0u64, |acc, &c| (acc << 6) | char_to_6bit(c))
}

fn unpack_callsign(mut bits: u64) -> String {
    let mut chars = [0u8; 6];
    for i in (0..6).rev() {
        chars[i] = six_bit_to_char(bits & 0x3f);
        bits >>= 6;
    }
    String::from_utf8_lossy(&chars)
        .trim_end()
        .to_string()
}

struct BitWriter {
    acc: u128,
    nbits: u32,
}

impl BitWriter {
    fn new() -> Self {
        Self { acc: 0, nbits: 0 }
    }

    fn push(&mut self, value: u64, bits: u32) {
        self.acc = (self.acc << bits) | (value as u128 & ((1u128 << bits) - 1));
        self.nbits += bits;
    }

    fn into_bytes(self, total_bytes: usize) -> Vec<u8> {
        let mut out = vec![0u8; total_bytes];
        let mut acc = self.acc;
        for i in (0..total_bytes).rev() {
            out[i] = (acc & 0xff) as u8;
            acc >>= 8;
        }
        out
    }
}

struct BitReader {
    acc: u128,
    remaining: u32,
}

impl BitReader {
    fn new(bytes: &[u8]) -> Self {
        let mut acc = 0u128;
        for &b in bytes {
            acc = (acc << 8) | b as u128;
        }
        Self {
            acc,
            remaining: bytes.len() as u32 * 8,
        }
    }

    fn pull(&mut self, bits: u32) -> u64 {
        self.remaining -= bits;
        let value = (self.acc >> self.remaining) & ((1u128 << bits) - 1);
        value as u64
    }
}

#[derive(Debug, Clone)]
pub struct Type1Header {
    pub destination: Address,
    pub source: Address,
    pub ui: bool,
    pub pid: u8,
    pub payload_len: u16,
}

impl Type1Header {
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut w = BitWriter::new();
        w.push(pack_callsign(&self.destination.callsign), DEST_CALL_BITS);
        w.push(pack_callsign(&self.source.callsign), SRC_CALL_BITS);
        w.push(self.destination.ssid as u64, SSID_BITS);
        w.push(self.source.ssid as u64, SSID_BITS);
        w.push(self.ui as u64, UI_BITS);
        w.push(self.pid as u64, PID_BITS);
        w.push(self.payload_len as u64, PAYLOAD_LEN_BITS);
        let reserved_bits = 8 * HEADER_SIZE as u32
            - DEST_CALL_BITS
            - SRC_CALL_BITS
            - 2 * SSID_BITS
            - UI_BITS
            - PID_BITS
            - PAYLOAD_LEN_BITS;
        w.push(0, reserved_bits);
        let bytes = w.into_bytes(HEADER_SIZE);
        bytes.try_into().expect("fixed-size header")
    }

    pub fn decode(bytes: &[u8; HEADER_SIZE]) -> Result<Self, FramingError> {
        let mut r = BitReader::new(bytes);
        let dest_call = unpack_callsign(r.pull(DEST_CALL_BITS));
        let src_call = unpack_callsign(r.pull(SRC_CALL_BITS));
        let dest_ssid = r.pull(SSID_BITS) as u8;
        let src_ssid = r.pull(SSID_BITS) as u8;
        let ui = r.pull(UI_BITS) != 0;
        let pid = r.pull(PID_BITS) as u8;
        let payload_len = r.pull(PAYLOAD_LEN_BITS) as u16;

        let destination = Address::new(dest_call, dest_ssid)?;
        let source = Address::new(src_call, src_ssid)?;
        Ok(Self {
            destination,
            source,
            ui,
            pid,
            payload_len,
        })
    }
}
