//! ModuleClient driving simulated modules end to end

use charger_codec::{CanFrame, Mode, Protocol, UUgreen};
use charger_link::{LinkError, ModuleClient, SimulatedModule, STATUS_OUTPUT_OFF};
use std::time::Duration;

const ADDRESS: u8 = 3;

fn client(protocol: Protocol) -> ModuleClient<SimulatedModule> {
    let bus = SimulatedModule::new(protocol)
        .with_module(ADDRESS)
        .with_module(ADDRESS + 1);
    let mut client = ModuleClient::new(bus, protocol, ADDRESS);
    client.set_timeout(Duration::from_millis(50));
    client
}

async fn charge_sequence(protocol: Protocol) {
    let mut client = client(protocol);

    client.set_voltage(350.0).await.unwrap();
    client.set_current(10.5).await.unwrap();
    client.set_mode(Mode::High).await.unwrap();
    client.enable().await.unwrap();

    assert_eq!(client.read_voltage().await.unwrap(), 350.0);
    assert_eq!(client.read_current().await.unwrap(), 10.5);
    assert_eq!(client.read_temperature().await.unwrap(), 25);
    assert_eq!(client.read_flags().await.unwrap(), 0);
    assert_eq!(client.read_current_capability().await.unwrap(), 100.0);

    let state = client.bus().state(ADDRESS).unwrap();
    assert_eq!(state.mode, Mode::High);
    assert!(state.enabled);
    assert!(!client.bus().state(ADDRESS + 1).unwrap().enabled);

    client.disable().await.unwrap();
    assert_eq!(client.read_voltage().await.unwrap(), 0.0);
    assert_eq!(client.read_flags().await.unwrap() & STATUS_OUTPUT_OFF, STATUS_OUTPUT_OFF);
}

#[tokio::test]
async fn uugreen_charge_sequence() {
    charge_sequence(Protocol::UUgreen).await;
}

#[tokio::test]
async fn mmeet_charge_sequence() {
    charge_sequence(Protocol::MMeet).await;
}

#[tokio::test]
async fn mmeet_auto_mode_reaches_module() {
    let mut client = client(Protocol::MMeet);
    client.set_mode(Mode::Auto).await.unwrap();
    assert_eq!(client.bus().state(ADDRESS).unwrap().mode, Mode::Auto);
}

#[tokio::test]
async fn uugreen_auto_mode_is_rejected() {
    let mut client = client(Protocol::UUgreen);
    let err = client.set_mode(Mode::Auto).await.unwrap_err();
    assert!(matches!(err, LinkError::Unsupported { .. }));
    assert!(client.bus().sent().is_empty());
    assert_eq!(client.bus().state(ADDRESS).unwrap().mode, Mode::Low);
}

#[tokio::test]
async fn unrelated_traffic_is_skipped() {
    let mut client = client(Protocol::UUgreen);
    client.set_voltage(48.0).await.unwrap();
    client.enable().await.unwrap();

    // standard-id noise, another module's voltage, our own current
    client.bus_mut().inject(CanFrame::new(0x123, [0xFF; 8]));
    client.bus_mut().inject(CanFrame::new(
        UUgreen::can_id(ADDRESS + 4),
        [0x12, 0x62, 0, 0, 0x00, 0x00, 0x03, 0xE8],
    ));
    client.bus_mut().inject(CanFrame::new(
        UUgreen::can_id(ADDRESS),
        [0x12, 0x30, 0, 0, 0x00, 0x00, 0x07, 0xD0],
    ));
    client.bus_mut().inject(CanFrame::new(
        UUgreen::can_id(ADDRESS),
        [0x12, 0x77, 0, 0, 0x00, 0x00, 0x00, 0x01],
    ));

    assert_eq!(client.read_voltage().await.unwrap(), 48.0);
}

#[tokio::test(start_paused = true)]
async fn silent_module_times_out() {
    let bus = SimulatedModule::new(Protocol::MMeet);
    let mut client = ModuleClient::new(bus, Protocol::MMeet, 0x40);
    client.set_timeout(Duration::from_millis(1000));

    let err = client.read_temperature().await.unwrap_err();
    assert!(matches!(err, LinkError::Timeout(1000)));
    assert_eq!(client.bus().sent().len(), 1);
}

#[tokio::test]
async fn protocol_switch_changes_wire_format() {
    let mut client = client(Protocol::UUgreen);
    client.enable().await.unwrap();
    client.set_protocol(Protocol::MMeet);
    client.enable().await.unwrap();

    let sent = client.bus().sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].data()[0], 0x10);
    assert_eq!(&sent[1].data()[..2], &[0x01, 0xF0]);
}
