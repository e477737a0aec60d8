use std::time::Duration;

use blecast::api::peripheral::PeripheralManager;
use blecast::api::peripheral_event::{
    AdvertisingState, CommandKind, PeripheralEvent, RadioState, RegistrationState,
};
use blecast::api::radio::{self, RadioEvent, RadioEventSender, RequestResponse};
use blecast::config::PeripheralConfig;
use blecast::peripheral::Peripheral;
use blecast::radio::memory::{MemoryRadio, MemoryRadioHandle, RadioCall};
use blecast::uuid::ShortUuid;
use blecast::{Error, ErrorKind};
use tokio::sync::oneshot;
use tokio::time::timeout;
use uuid::Uuid;

const SERVICE: &str = "180D";
const CHARACTERISTIC: &str = "2A37";

fn characteristic() -> Uuid {
    Uuid::from_u16(0x2a37)
}

/// Peripheral on a simulated radio. The returned sender injects extra
/// radio callbacks such as subscriptions.
fn simulated() -> (Peripheral, MemoryRadioHandle, RadioEventSender) {
    let config = PeripheralConfig::default();
    let (radio_tx, radio_rx) = radio::channel(config.radio_event_capacity);
    let radio = MemoryRadio::simulated(radio_tx.clone());
    let handle = radio.handle();
    let peripheral = Peripheral::spawn(radio, radio_rx, &config).unwrap();
    (peripheral, handle, radio_tx)
}

/// Peripheral on a radio that never answers on its own.
fn passive() -> (Peripheral, MemoryRadioHandle, RadioEventSender) {
    let config = PeripheralConfig::default();
    let (radio_tx, radio_rx) = radio::channel(config.radio_event_capacity);
    let radio = MemoryRadio::new();
    let handle = radio.handle();
    let peripheral = Peripheral::spawn(radio, radio_rx, &config).unwrap();
    (peripheral, handle, radio_tx)
}

async fn subscribe(radio_tx: &RadioEventSender, central: &str) {
    radio_tx
        .send(RadioEvent::DidSubscribe {
            central: central.to_string(),
            characteristic: characteristic(),
        })
        .await
        .unwrap();
}

async fn advertising(peripheral: &Peripheral) {
    peripheral.initialize().await.unwrap();
    peripheral.define_service(SERVICE, CHARACTERISTIC).await.unwrap();
    peripheral.start_advertising("Sensor").await.unwrap();
}

#[tokio::test]
async fn happy_path_emits_events_in_order() {
    let (peripheral, handle, radio_tx) = simulated();
    let mut events = peripheral.attach_listener().await.unwrap();

    advertising(&peripheral).await;
    subscribe(&radio_tx, "central-1").await;
    peripheral.push_value(b"72".to_vec()).await.unwrap();

    assert_eq!(
        events.drain(),
        vec![
            PeripheralEvent::PowerChanged { state: RadioState::PoweredOn },
            PeripheralEvent::RegistrationChanged { state: RegistrationState::Registering },
            PeripheralEvent::RegistrationChanged { state: RegistrationState::Registered },
            PeripheralEvent::AdvertisingChanged { state: AdvertisingState::Starting },
            PeripheralEvent::AdvertisingChanged { state: AdvertisingState::Advertising },
            PeripheralEvent::ConnectionChanged { connected: true },
            PeripheralEvent::SubscriptionChanged { subscribed: true },
            PeripheralEvent::PushDelivered { subscribers: 1 },
        ]
    );
    assert_eq!(handle.delivered(), vec![b"72".to_vec()]);
    assert!(peripheral.is_advertising().await.unwrap());
}

#[tokio::test]
async fn advertisement_carries_service_and_default_name() {
    let (peripheral, handle, _radio_tx) = simulated();
    peripheral.initialize().await.unwrap();
    peripheral.define_service(SERVICE, CHARACTERISTIC).await.unwrap();
    peripheral.start_advertising("").await.unwrap();

    let advertisement = handle.calls().into_iter().find_map(|call| match call {
        RadioCall::StartAdvertising(advertisement) => Some(advertisement),
        _ => None,
    });
    let advertisement = advertisement.expect("advertising was started");
    assert_eq!(advertisement.local_name, PeripheralConfig::default().default_device_name);
    assert_eq!(advertisement.service_uuids, vec![Uuid::from_u16(0x180d)]);
}

#[tokio::test]
async fn define_service_before_power_on_is_rejected() {
    let (peripheral, handle, _radio_tx) = passive();
    let mut events = peripheral.attach_listener().await.unwrap();

    let result = peripheral.define_service(SERVICE, CHARACTERISTIC).await;

    assert_eq!(result, Err(Error::NotPoweredOn));
    assert_eq!(
        events.drain(),
        vec![PeripheralEvent::CommandRejected {
            command: CommandKind::DefineService,
            error: Error::NotPoweredOn,
        }]
    );
    assert!(handle.calls().is_empty());
}

#[tokio::test]
async fn malformed_identifier_is_rejected() {
    let (peripheral, _handle, _radio_tx) = simulated();
    peripheral.initialize().await.unwrap();

    let error = peripheral.define_service("not-a-uuid", CHARACTERISTIC).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::InvalidIdentifier);
    let status = peripheral.status().await.unwrap();
    assert_eq!(status.registration, RegistrationState::Unregistered);
}

#[tokio::test]
async fn stop_while_starting_ignores_late_confirmation() {
    let (peripheral, _handle, radio_tx) = passive();
    let mut events = peripheral.attach_listener().await.unwrap();

    peripheral.initialize().await.unwrap();
    radio_tx
        .send(RadioEvent::StateUpdate { state: RadioState::PoweredOn })
        .await
        .unwrap();
    peripheral.define_service(SERVICE, CHARACTERISTIC).await.unwrap();
    radio_tx
        .send(RadioEvent::DidAddService {
            service: Uuid::from_u16(0x180d),
            error: None,
        })
        .await
        .unwrap();
    peripheral.start_advertising("Sensor").await.unwrap();
    peripheral.stop_advertising().await.unwrap();
    radio_tx
        .send(RadioEvent::DidStartAdvertising { error: None })
        .await
        .unwrap();

    let status = peripheral.status().await.unwrap();
    assert_eq!(status.advertising, AdvertisingState::Idle);
    let advertising: Vec<_> = events
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            PeripheralEvent::AdvertisingChanged { state } => Some(state),
            _ => None,
        })
        .collect();
    assert_eq!(
        advertising,
        vec![
            AdvertisingState::Starting,
            AdvertisingState::Stopping,
            AdvertisingState::Idle,
        ]
    );
}

#[tokio::test]
async fn backpressured_push_sends_latest_value_when_ready() {
    let (peripheral, handle, radio_tx) = simulated();
    advertising(&peripheral).await;
    subscribe(&radio_tx, "central-1").await;
    let mut events = peripheral.attach_listener().await.unwrap();

    handle.set_queue_full(true);
    peripheral.push_value(b"1".to_vec()).await.unwrap();
    peripheral.push_value(b"2".to_vec()).await.unwrap();
    assert!(peripheral.status().await.unwrap().pending_value);

    handle.drain_queue();
    let status = peripheral.status().await.unwrap();

    assert!(!status.pending_value);
    assert_eq!(handle.delivered(), vec![b"2".to_vec()]);
    assert_eq!(
        events.drain(),
        vec![
            PeripheralEvent::PushFailed {
                retry_scheduled: true,
                reason: Some("notification queue full".to_string()),
            },
            PeripheralEvent::PushFailed {
                retry_scheduled: true,
                reason: Some("notification queue full".to_string()),
            },
            PeripheralEvent::PushDelivered { subscribers: 1 },
        ]
    );
}

#[tokio::test]
async fn push_without_service_fails() {
    let (peripheral, _handle, _radio_tx) = simulated();
    peripheral.initialize().await.unwrap();

    assert_eq!(peripheral.push_value(vec![1]).await, Err(Error::NotAdvertising));
}

#[tokio::test]
async fn read_request_returns_last_value() {
    let (peripheral, _handle, radio_tx) = simulated();
    advertising(&peripheral).await;
    peripheral.push_value(b"hello".to_vec()).await.unwrap();

    let (responder, response) = oneshot::channel();
    radio_tx
        .send(RadioEvent::ReadRequest {
            central: "central-1".to_string(),
            characteristic: characteristic(),
            offset: 1,
            responder,
        })
        .await
        .unwrap();
    let response = response.await.unwrap();

    assert_eq!(response.response, RequestResponse::Success);
    assert_eq!(response.value, b"ello".to_vec());
}

#[tokio::test]
async fn power_cycle_restores_service() {
    let (peripheral, handle, radio_tx) = simulated();
    advertising(&peripheral).await;
    subscribe(&radio_tx, "central-1").await;

    radio_tx
        .send(RadioEvent::StateUpdate { state: RadioState::PoweredOff })
        .await
        .unwrap();
    let status = peripheral.status().await.unwrap();
    assert_eq!(status.advertising, AdvertisingState::Idle);
    assert_eq!(status.registration, RegistrationState::Unregistered);
    assert_eq!(status.subscribers, 0);

    radio_tx
        .send(RadioEvent::StateUpdate { state: RadioState::PoweredOn })
        .await
        .unwrap();
    let status = peripheral.status().await.unwrap();
    assert_eq!(status.registration, RegistrationState::Registered);
    assert_eq!(status.advertising, AdvertisingState::Idle);

    let added = handle
        .calls()
        .into_iter()
        .filter(|call| matches!(call, RadioCall::AddService(_)))
        .count();
    assert_eq!(added, 2);
}

#[tokio::test]
async fn new_listener_replaces_old_one() {
    let (peripheral, _handle, _radio_tx) = simulated();
    let mut first = peripheral.attach_listener().await.unwrap();
    let mut second = peripheral.attach_listener().await.unwrap();

    peripheral.initialize().await.unwrap();
    peripheral.status().await.unwrap();

    assert_eq!(first.recv().await, None);
    assert_eq!(
        second.drain(),
        vec![PeripheralEvent::PowerChanged { state: RadioState::PoweredOn }]
    );

    peripheral.detach_listener().await.unwrap();
    assert_eq!(second.recv().await, None);
}

#[tokio::test]
async fn dropping_last_handle_stops_peripheral() {
    let (peripheral, _handle, _radio_tx) = simulated();
    let mut events = peripheral.attach_listener().await.unwrap();
    let clone = peripheral.clone();

    drop(peripheral);
    clone.initialize().await.unwrap();
    drop(clone);

    let drained = timeout(Duration::from_secs(1), async {
        let mut seen = Vec::new();
        while let Some(event) = events.recv().await {
            seen.push(event);
        }
        seen
    })
    .await
    .expect("event stream closes");
    assert_eq!(drained, vec![PeripheralEvent::PowerChanged { state: RadioState::PoweredOn }]);
}

#[tokio::test]
async fn zero_capacity_config_is_rejected() {
    let config = PeripheralConfig {
        command_capacity: 0,
        ..PeripheralConfig::default()
    };
    let (radio_tx, radio_rx) = radio::channel(1);

    let result = Peripheral::spawn(MemoryRadio::simulated(radio_tx), radio_rx, &config);

    assert!(matches!(result, Err(Error::Config(_))));
}

#[tokio::test]
async fn dedicated_thread_peripheral() {
    let peripheral =
        Peripheral::spawn_on_thread(&PeripheralConfig::default(), MemoryRadio::simulated).unwrap();

    peripheral.initialize().await.unwrap();

    assert!(peripheral.is_powered().await.unwrap());
    let status = peripheral.status().await.unwrap();
    assert!(status.initialized);
}
