//! Payload block partitioning, scrambling, and RS protection.
//!
//! Ported byte-for-byte from `il2p_payload.c`'s `il2p_payload_compute`/
//! `il2p_encode_payload`/`il2p_decode_payload`.

use rayon::prelude::*;

use crate::errors::FramingError;
use crate::il2p::scrambler::{descramble_block, scramble_block};
use crate::reed_solomon::RsCodec;

pub const MAX_PAYLOAD_SIZE: usize = 1023;
pub const MAX_PAYLOAD_BLOCKS: usize = 5;
const PARITY_SYMBOLS_PER_BLOCK: usize = 16;
const SMALL_BLOCK_MAX: usize = 239;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PayloadProperties {
    pub payload_byte_count: usize,
    pub payload_block_count: usize,
    pub small_block_size: usize,
    pub large_block_size: usize,
    pub large_block_count: usize,
    pub small_block_count: usize,
    pub parity_symbols_per_block: usize,
}

impl PayloadProperties {
    /// Total encoded size (payload bytes plus per-block parity).
    pub fn encoded_len(&self) -> usize {
        self.small_block_count * (self.small_block_size + self.parity_symbols_per_block)
            + self.large_block_count * (self.large_block_size + self.parity_symbols_per_block)
    }
}

/// `il2p_payload_compute`. `payload_size == 0` is valid and yields the
/// all-zero properties (header-only frame).
pub fn compute_properties(payload_size: usize) -> Result<PayloadProperties, FramingError> {
    if payload_size > MAX_PAYLOAD_SIZE {
        return Err(FramingError::PayloadTooLarge {
            size: payload_size,
            max: MAX_PAYLOAD_SIZE,
        });
    }
    if payload_size == 0 {
        return Ok(PayloadProperties::default());
    }

    let payload_block_count = (payload_size + SMALL_BLOCK_MAX - 1) / SMALL_BLOCK_MAX;
    let small_block_size = payload_size / payload_block_count;
    let large_block_size = small_block_size + 1;
    let large_block_count = payload_size - payload_block_count * small_block_size;
    let small_block_count = payload_block_count - large_block_count;

    Ok(PayloadProperties {
        payload_byte_count: payload_size,
        payload_block_count,
        small_block_size,
        large_block_size,
        large_block_count,
        small_block_count,
        parity_symbols_per_block: PARITY_SYMBOLS_PER_BLOCK,
    })
}

/// Block boundaries in payload-encode order: large blocks first, then
/// small, each as `(payload_offset, block_size)`. At most
/// `MAX_PAYLOAD_BLOCKS` entries, so the per-block rayon fan-out below
/// never spawns more tasks than that.
fn block_layout(props: &PayloadProperties) -> Vec<(usize, usize)> {
    let mut layout = Vec::with_capacity(props.payload_block_count);
    let mut cursor = 0;
    for (count, block_size) in [
        (props.large_block_count, props.large_block_size),
        (props.small_block_count, props.small_block_size),
    ] {
        for _ in 0..count {
            layout.push((cursor, block_size));
            cursor += block_size;
        }
    }
    layout
}

/// Scramble, then RS-encode, each block: large blocks first, then small.
/// Blocks are independent (at most `MAX_PAYLOAD_BLOCKS` of them), so the
/// per-block work runs over rayon's global pool.
pub fn encode_payload(payload: &[u8]) -> Result<Vec<u8>, FramingError> {
    if payload.is_empty() {
        return Ok(Vec::new());
    }
    let props = compute_properties(payload.len())?;
    let codec = RsCodec::for_parity(props.parity_symbols_per_block);
    let layout = block_layout(&props);

    let encoded_blocks: Vec<Vec<u8>> = layout
        .par_iter()
        .map(|&(offset, block_size)| {
            let block = &payload[offset..offset + block_size];
            let scrambled = scramble_block(block);
            let parity = codec.encode(&scrambled);
            let mut block_out = scrambled;
            block_out.extend_from_slice(&parity);
            block_out
        })
        .collect();

    let mut out = Vec::with_capacity(props.encoded_len());
    for block in encoded_blocks {
        out.extend_from_slice(&block);
    }
    Ok(out)
}

/// RS-decode, then descramble, each block, concatenating the result.
/// Returns `(payload, symbols_corrected)`.
pub fn decode_payload(
    encoded: &[u8],
    payload_size: usize,
) -> Result<(Vec<u8>, usize), FramingError> {
    if payload_size == 0 {
        return Ok((Vec::new(), 0));
    }
    let props = compute_properties(payload_size)?;
    let codec = RsCodec::for_parity(props.parity_symbols_per_block);
    let parity_len = props.parity_symbols_per_block;

    // Re-derive each block's offset into `encoded` (payload offset plus
    // the parity symbols already emitted by preceding blocks).
    let mut encoded_layout = Vec::with_capacity(props.payload_block_count);
    let mut cursor = 0;
    for &(_, block_size) in &block_layout(&props) {
        encoded_layout.push((cursor, block_size));
        cursor += block_size + parity_len;
    }

    let results: Vec<Result<(Vec<u8>, usize), FramingError>> = encoded_layout
        .par_iter()
        .map(|&(offset, block_size)| {
            let total = block_size + parity_len;
            let mut data = encoded[offset..offset + block_size].to_vec();
            let mut parity = encoded[offset + block_size..offset + total].to_vec();
            let pad = crate::reed_solomon::BLOCK_SIZE - total;
            match codec.decode(&mut data, &mut parity, pad) {
                Ok(corrected) => Ok((descramble_block(&data), corrected)),
                Err(_) => Err(FramingError::HeaderUncorrectable),
            }
        })
        .collect();

    let mut out = Vec::with_capacity(payload_size);
    let mut symbols_corrected = 0usize;
    for result in results {
        let (block, corrected) = result?;
        symbols_corrected += corrected;
        out.extend_from_slice(&block);
    }

    if out.len() != payload_size {
        return Err(FramingError::PayloadLengthMismatch {
            expected: payload_size,
            actual: out.len(),
        });
    }
    Ok((out, symbols_corrected))
}
