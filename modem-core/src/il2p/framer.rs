//! Whole-frame encode/decode: sync word, Type-1 header (scrambled,
//! RS(15,13)-protected), and the payload blocks.
//!
//! Ported from `il2p_codec.c`'s `il2p_encode_frame`/`il2p_decode_frame`:
//! header is scrambled and RS-encoded before the payload is touched; on
//! decode the header is clarified and descrambled first, its attributes
//! parsed, and the payload section is only processed if `payload_len >
//! 0` -- a header-only frame is a complete, valid decode.

use crate::ax25::Packet;
use crate::errors::FramingError;
use crate::il2p::header::{Type1Header, HEADER_SIZE};
use crate::il2p::payload::{decode_payload, encode_payload};
use crate::il2p::scrambler::{descramble_block, scramble_block};
use crate::il2p::{HEADER_PARITY, SYNC_WORD_BYTES};
use crate::reed_solomon::{RsCodec, BLOCK_SIZE};

/// Encode a packet into a full on-air frame: sync word, scrambled+RS
/// header, and (if non-empty) the scrambled+RS payload blocks.
pub fn encode_frame(packet: &Packet) -> Result<Vec<u8>, FramingError> {
    let info = packet.info();
    let header = Type1Header {
        destination: packet.destination.clone(),
        source: packet.source.clone(),
        ui: true,
        pid: packet.pid,
        payload_len: info.len() as u16,
    };

    let hdr_bytes = header.encode();
    let scrambled_hdr = scramble_block(&hdr_bytes);
    let hdr_codec = RsCodec::for_parity(HEADER_PARITY);
    let hdr_parity = hdr_codec.encode(&scrambled_hdr);

    let mut out = Vec::with_capacity(
        SYNC_WORD_BYTES.len() + HEADER_SIZE + HEADER_PARITY + info.len() + info.len() / 8,
    );
    out.extend_from_slice(&SYNC_WORD_BYTES);
    out.extend_from_slice(&scrambled_hdr);
    out.extend_from_slice(&hdr_parity);

    if !info.is_empty() {
        out.extend_from_slice(&encode_payload(info)?);
    }

    Ok(out)
}

/// Clarify (RS-decode) and descramble the header, returning the
/// recovered `Type1Header` and the number of symbols corrected.
pub fn clarify_header(
    scrambled_hdr: &[u8; HEADER_SIZE],
    parity: &[u8; HEADER_PARITY],
) -> Result<(Type1Header, usize), FramingError> {
    let codec = RsCodec::for_parity(HEADER_PARITY);
    let mut data = scrambled_hdr.to_vec();
    let mut parity_mut = parity.to_vec();
    let pad = BLOCK_SIZE - HEADER_SIZE - HEADER_PARITY;
    let corrected = codec
        .decode(&mut data, &mut parity_mut, pad)
        .map_err(|_| FramingError::HeaderUncorrectable)?;

    let unscrambled = descramble_block(&data);
    let hdr_bytes: [u8; HEADER_SIZE] = unscrambled
        .try_into()
        .map_err(|_| FramingError::HeaderUncorrectable)?;
    let header = Type1Header::decode(&hdr_bytes)?;
    Ok((header, corrected))
}

/// Decode a frame body (everything after the 3-byte sync word) into a
/// packet, reporting the total symbols corrected across header and
/// payload.
pub fn decode_frame(body: &[u8]) -> Result<(Packet, usize), FramingError> {
    if body.len() < HEADER_SIZE + HEADER_PARITY {
        return Err(FramingError::HeaderUncorrectable);
    }
    let scrambled_hdr: [u8; HEADER_SIZE] = body[..HEADER_SIZE].try_into().unwrap();
    let parity: [u8; HEADER_PARITY] =
        body[HEADER_SIZE..HEADER_SIZE + HEADER_PARITY].try_into().unwrap();

    let (header, mut symbols_corrected) = clarify_header(&scrambled_hdr, &parity)?;

    let mut packet = Packet::new_ui(
        header.destination,
        header.source,
        header.pid,
        Vec::new(),
    )?;

    if header.payload_len > 0 {
        let encoded_payload = &body[HEADER_SIZE + HEADER_PARITY..];
        let (info, payload_corrected) =
            decode_payload(encoded_payload, header.payload_len as usize)?;
        symbols_corrected += payload_corrected;
        packet.set_info(info)?;
    }

    Ok((packet, symbols_corrected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ax25::{Address, PID_NO_LAYER_3};

    fn sample_packet(info: &[u8]) -> Packet {
        let dest = Address::new("DEST", 0).unwrap();
        let src = Address::new("N0CALL", 1).unwrap();
        Packet::new_ui(dest, src, PID_NO_LAYER_3, info.to_vec()).unwrap()
    }

    #[test]
    fn header_only_frame_round_trips() {
        let packet = sample_packet(&[]);
        let frame = encode_frame(&packet).unwrap();
        let (decoded, corrected) = decode_frame(&frame[SYNC_WORD_BYTES.len()..]).unwrap();
        assert_eq!(decoded.destination, packet.destination);
        assert_eq!(decoded.source, packet.source);
        assert!(decoded.info().is_empty());
        assert_eq!(corrected, 0);
    }

    #[test]
    fn frame_with_payload_round_trips() {
        let packet = sample_packet(b"HELLO");
        let frame = encode_frame(&packet).unwrap();
        let (decoded, _) = decode_frame(&frame[SYNC_WORD_BYTES.len()..]).unwrap();
        assert_eq!(decoded.info(), b"HELLO");
    }

    #[test]
    fn sync_word_prefixes_every_frame() {
        let packet = sample_packet(b"X");
        let frame = encode_frame(&packet).unwrap();
        assert_eq!(&frame[..SYNC_WORD_BYTES.len()], &SYNC_WORD_BYTES);
    }

    #[test]
    fn corrupted_payload_bit_still_decodes_with_correction_count() {
        let packet = sample_packet(b"HELLO");
        let mut frame = encode_frame(&packet).unwrap();
        let payload_start = SYNC_WORD_BYTES.len() + HEADER_SIZE + HEADER_PARITY;
        frame[payload_start] ^= 0x01;
        let (decoded, corrected) = decode_frame(&frame[SYNC_WORD_BYTES.len()..]).unwrap();
        assert_eq!(decoded.info(), b"HELLO");
        assert!(corrected >= 1);
    }
}
