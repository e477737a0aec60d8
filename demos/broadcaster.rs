use std::time::Duration;

use blecast::api::peripheral::PeripheralManager;
use blecast::api::peripheral_event::{AdvertisingState, PeripheralEvent, RegistrationState};
use blecast::config::PeripheralConfig;
use blecast::peripheral::{EventStream, Peripheral};
use blecast::{Result, logging};

const SERVICE: &str = "180D";
const CHARACTERISTIC: &str = "2A37";

#[tokio::main]
async fn main() -> Result<()> {
    let config = PeripheralConfig::load("blecast.json")?;
    logging::init_with_filter(&config.log_level);

    let peripheral = start(&config)?;
    let mut events = peripheral.attach_listener().await?;

    peripheral.initialize().await?;
    wait_for(&mut events, |event| {
        matches!(event, PeripheralEvent::PowerChanged { state } if state.is_powered_on())
    })
    .await;

    peripheral.define_service(SERVICE, CHARACTERISTIC).await?;
    wait_for(&mut events, |event| {
        *event
            == PeripheralEvent::RegistrationChanged {
                state: RegistrationState::Registered,
            }
    })
    .await;

    peripheral.start_advertising("").await?;
    wait_for(&mut events, |event| {
        *event
            == PeripheralEvent::AdvertisingChanged {
                state: AdvertisingState::Advertising,
            }
    })
    .await;

    for beat in 60u8..70 {
        if let Err(e) = peripheral.push_value(vec![0, beat]).await {
            log::warn!("Push failed: {e}");
        }
        for event in events.drain() {
            log::info!("{event:?}");
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    peripheral.stop_advertising().await?;
    peripheral.remove_service().await?;
    log::info!("Final status: {:?}", peripheral.status().await?);
    Ok(())
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
fn start(config: &PeripheralConfig) -> Result<Peripheral> {
    Peripheral::core_bluetooth(config)
}

#[cfg(not(any(target_os = "macos", target_os = "ios")))]
fn start(config: &PeripheralConfig) -> Result<Peripheral> {
    use blecast::api::radio;
    use blecast::radio::memory::MemoryRadio;

    log::info!("No system Bluetooth backend, using a simulated radio");
    let (radio_tx, radio_rx) = radio::channel(config.radio_event_capacity);
    Peripheral::spawn(MemoryRadio::simulated(radio_tx), radio_rx, config)
}

async fn wait_for(events: &mut EventStream, done: impl Fn(&PeripheralEvent) -> bool) {
    while let Some(event) = events.recv().await {
        log::info!("{event:?}");
        if done(&event) {
            return;
        }
    }
}
