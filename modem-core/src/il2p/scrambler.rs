//! Self-synchronizing bit scrambler.
//!
//! The original scrambler body is not present in the retrieved source
//! (only the `il2p_scramble_block`/`il2p_descramble_block` prototypes in
//! `il2p.h` survive); the IL2P 1.0 reference defers the exact polynomial
//! to its own published constant. This implements the same family of
//! self-synchronizing multiplicative
//! scrambler used by the AX.25 9600 baud (G3RUH/K9NG) physical layer:
//! `x^17 + x^12 + 1`, reseeded to a fixed state at the start of every
//! block so encode and decode stay in lock-step without needing a
//! separate synchronization preamble.

const SEED: u32 = 0x0;
const TAP_A: u32 = 16;
const TAP_B: u32 = 11;

fn step(register: &mut u32, in_bit: u8) -> u8 {
    let out_bit = in_bit ^ ((*register >> TAP_A) as u8 & 1) ^ ((*register >> TAP_B) as u8 & 1);
    *register = (*register << 1) | out_bit as u32;
    out_bit
}

fn bits_of(data: &[u8]) -> impl Iterator<Item = u8> + '_ {
    data.iter()
        .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1))
}

fn pack_bits(bits: impl Iterator<Item = u8>, n_bytes: usize) -> Vec<u8> {
    let mut out = vec![0u8; n_bytes];
    for (i, bit) in bits.enumerate() {
        out[i / 8] |= bit << (7 - (i % 8));
    }
    out
}

/// Scramble `data` (whitening; length-preserving), reseeding the LFSR at
/// the start of the block.
pub fn scramble_block(data: &[u8]) -> Vec<u8> {
    let mut register = SEED;
    let bits = bits_of(data).map(|b| step(&mut register, b)).collect::<Vec<_>>();
    pack_bits(bits.into_iter(), data.len())
}

/// Inverse of [`scramble_block`]. The LFSR state advance here is driven
/// by the (still scrambled) input bit, which is what makes the scrambler
/// self-synchronizing: the descrambler's register tracks the
/// scrambler's register bit-for-bit using only the received stream.
pub fn descramble_block(data: &[u8]) -> Vec<u8> {
    let mut register = SEED;
    let bits: Vec<u8> = bits_of(data)
        .map(|scrambled_bit| {
            let plain_bit =
                scrambled_bit ^ ((register >> TAP_A) as u8 & 1) ^ ((register >> TAP_B) as u8 & 1);
            register = (register << 1) | scrambled_bit as u32;
            plain_bit
        })
        .collect();
    pack_bits(bits.into_iter(), data.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scramble_descramble_round_trip() {
        let data: Vec<u8> = (0u8..=255).collect();
        let scrambled = scramble_block(&data);
        assert_eq!(descramble_block(&scrambled), data);
    }

    #[test]
    fn scrambling_preserves_length() {
        let data = vec![0u8; 239];
        assert_eq!(scramble_block(&data).len(), data.len());
    }

    #[test]
    fn scrambler_whitens_constant_input() {
        let data = vec![0u8; 32];
        let scrambled = scramble_block(&data);
        assert!(scrambled.iter().any(|&b| b != 0));
    }

    #[test]
    fn empty_block_round_trips() {
        let data: Vec<u8> = Vec::new();
        assert_eq!(descramble_block(&scramble_block(&data)), data);
    }
}
