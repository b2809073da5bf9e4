//! Codec invariants checked over generated inputs

use charger_codec::{
    generator_for, parse, Fields, Mode, ParseOutcome, Protocol, ProtocolDispatcher, Quantity,
    FRAME_DLC,
};
use proptest::prelude::*;

fn protocol() -> impl Strategy<Value = Protocol> {
    prop_oneof![Just(Protocol::UUgreen), Just(Protocol::MMeet)]
}

fn quantity() -> impl Strategy<Value = Quantity> {
    prop::sample::select(Quantity::ALL.to_vec())
}

proptest! {
    #[test]
    fn every_generated_frame_is_full_length(protocol in protocol(), address in any::<u8>(), value in 0.0f32..1000.0) {
        let generator = generator_for(protocol);
        let mut frames = vec![
            generator.set_voltage(address, value),
            generator.set_current(address, value),
            generator.set_low_mode(address),
            generator.set_high_mode(address),
            generator.enable(address),
            generator.disable(address),
        ];
        frames.extend(Quantity::ALL.iter().map(|q| generator.request(address, *q)));
        frames.extend(generator.set_mode(address, Mode::Auto));
        for frame in frames {
            prop_assert_eq!(frame.dlc(), FRAME_DLC);
            prop_assert!(frame.is_extended());
        }
    }

    #[test]
    fn address_roundtrips_through_parse(protocol in protocol(), address in 0u8..=127, quantity in quantity()) {
        let dispatcher = ProtocolDispatcher::new(protocol);
        let outcome = dispatcher.parse(&dispatcher.request(address, quantity));
        match outcome {
            ParseOutcome::Ok(m) => {
                prop_assert_eq!(m.address(), address);
                prop_assert_eq!(m.fields(), Fields::ADDRESS | Fields::from(quantity));
            }
            other => prop_assert!(false, "unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn every_generated_frame_carries_address(protocol in protocol(), address in 0u8..=127, value in 0.0f32..1000.0) {
        let dispatcher = ProtocolDispatcher::new(protocol);
        let mut frames = vec![
            dispatcher.set_voltage(address, value),
            dispatcher.set_current(address, value),
            dispatcher.set_low_mode(address),
            dispatcher.set_high_mode(address),
            dispatcher.enable(address),
            dispatcher.disable(address),
        ];
        frames.extend(Quantity::ALL.iter().map(|q| dispatcher.request(address, *q)));
        frames.extend(dispatcher.set_auto_mode(address));

        for frame in frames {
            let id = frame.raw_id();
            let encoded = match protocol {
                Protocol::UUgreen => (id >> 14) & 0x7F,
                Protocol::MMeet => (id >> 3) & 0xFF,
            };
            prop_assert_eq!(encoded, u32::from(address), "frame {}", frame);
            prop_assert_eq!(protocol.address_of(id), address);
            prop_assert!(protocol.matches(&frame));
        }
    }

    #[test]
    fn out_of_range_address_is_masked(protocol in protocol(), address in 128u8..=255) {
        let generator = generator_for(protocol);
        let frame = generator.request(address, Quantity::Voltage);
        let m = parse(&frame, protocol).into_measurement();
        prop_assert_eq!(m.map(|m| m.address()), Some(address & 0x7F));
    }

    #[test]
    fn voltage_setpoint_recoverable(protocol in protocol(), volts in 0.0f32..1000.0) {
        let frame = generator_for(protocol).set_voltage(1, volts);
        let multiplier = protocol.scale().voltage_write;
        let decoded = frame.read_u32(4).unwrap() as f32 / multiplier;
        prop_assert!(decoded <= volts + 1e-3);
        prop_assert!(volts - decoded < 2.0 / multiplier);
    }

    #[test]
    fn foreign_identifiers_are_invalid(can_id in any::<u32>(), data in any::<[u8; 8]>()) {
        let frame = charger_codec::CanFrame::new(can_id & 0x01FF_FFFF, data);
        prop_assert_eq!(parse(&frame, Protocol::UUgreen), ParseOutcome::InvalidFrame);
    }

    #[test]
    fn short_frames_are_invalid(protocol in protocol(), dlc in 0u8..8, address in 0u8..=127) {
        let full = generator_for(protocol).request(address, Quantity::Voltage);
        let frame = charger_codec::CanFrame::with_dlc(full.can_id(), dlc, full.data());
        prop_assert_eq!(parse(&frame, protocol), ParseOutcome::InvalidFrame);
    }
}

#[test]
fn request_voltage_command_bytes() {
    let frame = ProtocolDispatcher::new(Protocol::UUgreen).request_voltage(0x1A);
    assert_eq!(&frame.data()[..2], &[0x12, 0x62]);
    assert_eq!((frame.can_id() >> 14) & 0x7F, 0x1A);
}

#[test]
fn raw_voltage_scaled_to_volts() {
    let dispatcher = ProtocolDispatcher::new(Protocol::MMeet);
    let request = dispatcher.request_voltage(7);
    let mut data = *request.data();
    data[4..8].copy_from_slice(&123_456u32.to_be_bytes());
    let response = charger_codec::CanFrame::new(request.can_id(), data);

    let m = dispatcher.parse(&response).into_measurement().unwrap();
    assert_eq!(m.fields(), Fields::ADDRESS | Fields::VOLTAGE);
    assert!((m.voltage().unwrap() - 123.456).abs() < 1e-3);
}
