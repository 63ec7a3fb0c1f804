//! Round-trip laws: AX.25 packet encode/decode, the payload
//! block-partitioning formula, and Reed-Solomon error correction up to
//! the per-block capacity.

use proptest::prelude::*;

use modem_core::ax25::{Address, Packet, PID_NO_LAYER_3};
use modem_core::il2p::{decode_frame, encode_frame};
use modem_core::il2p::payload::{compute_properties, MAX_PAYLOAD_SIZE};
use modem_core::reed_solomon::RsCodec;

fn arb_callsign() -> impl Strategy<Value = String> {
    "[A-Z0-9]{1,6}"
}

proptest! {
    /// decode(encode(P)) == P byte-for-byte for any info up to 1023 bytes.
    #[test]
    fn packet_round_trips_through_il2p(
        dest_call in arb_callsign(),
        dest_ssid in 0u8..=15,
        src_call in arb_callsign(),
        src_ssid in 0u8..=15,
        info in proptest::collection::vec(any::<u8>(), 0..=1023),
    ) {
        let dest = Address::new(dest_call, dest_ssid).unwrap();
        let src = Address::new(src_call, src_ssid).unwrap();
        let packet = Packet::new_ui(dest, src, PID_NO_LAYER_3, info).unwrap();

        let frame = encode_frame(&packet).unwrap();
        let (decoded, _corrected) = decode_frame(&frame[3..]).unwrap();

        prop_assert_eq!(decoded.destination, packet.destination);
        prop_assert_eq!(decoded.source, packet.source);
        prop_assert_eq!(decoded.pid, packet.pid);
        prop_assert_eq!(decoded.info(), packet.info());
    }

    /// The block-partitioning formula always accounts for every byte.
    #[test]
    fn payload_properties_partition_every_byte(size in 0usize..=MAX_PAYLOAD_SIZE) {
        let props = compute_properties(size).unwrap();
        prop_assert_eq!(props.small_block_count + props.large_block_count, props.payload_block_count);
        prop_assert_eq!(
            props.small_block_count * props.small_block_size
                + props.large_block_count * props.large_block_size,
            size
        );
        let expected_encoded = props.small_block_count * (props.small_block_size + 16)
            + props.large_block_count * (props.large_block_size + 16);
        prop_assert_eq!(props.encoded_len(), expected_encoded);
    }

    /// A block of up to 239 bytes round-trips through RS encode/decode
    /// for every supported parity count, and still recovers with up to
    /// floor(k/2) injected symbol errors.
    #[test]
    fn rs_round_trips_with_injected_errors(
        data in proptest::collection::vec(any::<u8>(), 1..=239),
        nparity_idx in 0usize..5,
    ) {
        let nparity = [2usize, 4, 6, 8, 16][nparity_idx];
        let codec = RsCodec::for_parity(nparity);
        let parity = codec.encode(&data);
        let pad = modem_core::reed_solomon::BLOCK_SIZE - data.len() - nparity;

        let max_errors = nparity / 2;
        let mut corrupted = data.clone();
        for i in 0..max_errors {
            let idx = i % corrupted.len();
            corrupted[idx] ^= 0xFF;
        }

        let mut parity_mut = parity.clone();
        let corrected = codec.decode(&mut corrupted, &mut parity_mut, pad).unwrap();
        prop_assert!(corrected <= max_errors);
        prop_assert_eq!(corrupted, data);
    }
}
