//! Property-based tests for the XInput and GIP codecs.
//!
//! Covers canonical round trips for both protocols and chunk reassembly of
//! arbitrary payloads.

use gamepad_core::{AnalogStick, Buttons, DPad, PadIn};
use proptest::prelude::*;
use xbox_proto::gip::{encode, Command, GipEvent, GipHeader, GipInput, GipReassembler, MAX_PACKET_PAYLOAD};
use xbox_proto::xinput::InReport;

/// Canonical buttons that have an XInput wire bit (everything but MISC).
const XINPUT_BUTTONS: u16 = 0x07FF;
/// Canonical buttons carried by the GIP input mask (no SYS, no MISC).
const GIP_BUTTONS: u16 = 0x03FF;

fn pad_in(buttons_mask: u16) -> impl Strategy<Value = PadIn> {
    (
        any::<u16>(),
        0u8..16,
        any::<u8>(),
        any::<u8>(),
        any::<[i16; 4]>(),
    )
        .prop_map(move |(buttons, dpad, tl, tr, axes)| PadIn {
            buttons: Buttons(buttons & buttons_mask),
            dpad: DPad(dpad),
            trigger_l: tl,
            trigger_r: tr,
            left_stick: AnalogStick::new(axes[0], axes[1]),
            right_stick: AnalogStick::new(axes[2], axes[3]),
        })
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(500))]

    /// XInput encode then decode reproduces every representable field.
    #[test]
    fn prop_xinput_round_trip(pad in pad_in(XINPUT_BUTTONS)) {
        let bytes = InReport::from(&pad).to_bytes();
        prop_assert_eq!(bytes.len(), 20);
        prop_assert_eq!(&bytes[14..], &[0u8; 6]);
        let decoded = InReport::parse(&bytes).unwrap().to_pad_in();
        prop_assert_eq!(decoded, pad);
    }

    /// GIP encode then decode reproduces every field; guide travels out of band.
    #[test]
    fn prop_gip_round_trip(pad in pad_in(GIP_BUTTONS), guide: bool) {
        let packet = GipInput::from_pad_in(&pad).to_packet(1);
        prop_assert_eq!(packet.len(), GipInput::REPORT_SIZE);
        let input = GipInput::parse(&packet[4..]).unwrap();
        prop_assert!(input.trigger_l <= 0x3FF && input.trigger_r <= 0x3FF);

        let mut expected = pad;
        expected.buttons.set(Buttons::SYS, guide);
        prop_assert_eq!(input.to_pad_in(guide), expected);
    }

    /// Any XInput buffer of at least 20 bytes with the right id/size parses.
    #[test]
    fn prop_xinput_parse_total(
        mut data in proptest::collection::vec(any::<u8>(), 20..=32),
    ) {
        data[0] = 0x00;
        data[1] = 0x14;
        prop_assert!(InReport::parse(&data).is_ok());
        prop_assert!(InReport::parse(&data[..19]).is_err());
    }

    /// Chunked encode fed to the reassembler in order yields Pending for all
    /// but the last packet and the exact payload on the last.
    #[test]
    fn prop_chunk_reassembly(
        payload in proptest::collection::vec(any::<u8>(), 0..=512),
        sequence in 1u8..=255,
    ) {
        let header = GipHeader::new(Command::DeviceDescriptor)
            .with_internal(true)
            .with_sequence(sequence);
        let packets: Vec<_> = encode(header, &payload).unwrap().collect();
        prop_assert_eq!(packets.len() > 1, payload.len() > MAX_PACKET_PAYLOAD);

        let mut rx: GipReassembler = GipReassembler::new();
        let (last, rest) = packets.split_last().unwrap();
        for p in rest {
            prop_assert!(p.len() <= 64);
            prop_assert_eq!(rx.feed(p), Ok(GipEvent::Pending));
        }
        match rx.feed(last) {
            Ok(GipEvent::Message(msg)) => {
                prop_assert_eq!(msg.command, Command::DeviceDescriptor);
                prop_assert_eq!(msg.header.sequence(), sequence);
                prop_assert_eq!(msg.payload, &payload[..]);
            }
            other => prop_assert!(false, "unexpected {:?}", other),
        }
    }

    /// Arbitrary bytes never panic the reassembler.
    #[test]
    fn prop_reassembler_never_panics(
        packets in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..=64), 1..8),
    ) {
        let mut rx: GipReassembler = GipReassembler::new();
        for p in &packets {
            let _ = rx.feed(p);
        }
    }
}
