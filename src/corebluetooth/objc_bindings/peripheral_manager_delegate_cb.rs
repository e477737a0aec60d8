use ::futures::executor;
use objc2::{AnyThread, DeclaredClass, define_class, msg_send, rc::Retained};
use objc2_core_bluetooth::{
    CBATTError, CBATTRequest, CBCentral, CBCharacteristic, CBPeripheralManager,
    CBPeripheralManagerDelegate, CBService,
};
use objc2_foundation::{NSData, NSError, NSObject, NSObjectProtocol};
use tokio::sync::oneshot;

use super::mac_extensions_cb::{UuidExtension, central_id, convert_state};
use crate::api::radio::{RadioEvent, RadioEventSender, ReadRequestResponse, RequestResponse};

// Instance variables of the ObjC class, shared with the delegate callbacks.
#[derive(Debug)]
pub struct IVars {
    pub sender: RadioEventSender,
}

define_class! {
    #[derive(Debug)]
    #[unsafe(super(NSObject))]
    #[thread_kind = AnyThread]
    #[name = "BlecastPeripheralManagerDelegate"]
    #[ivars = IVars]
    pub struct PeripheralManagerDelegate;

    unsafe impl NSObjectProtocol for PeripheralManagerDelegate {}

    unsafe impl CBPeripheralManagerDelegate for PeripheralManagerDelegate {
        #[unsafe(method(peripheralManagerDidUpdateState:))]
        fn delegate_peripheralmanagerdidupdatestate(&self, peripheral: &CBPeripheralManager) {
            let state = convert_state(unsafe { peripheral.state() });
            self.send_event(RadioEvent::StateUpdate { state });
        }

        #[unsafe(method(peripheralManagerDidStartAdvertising:error:))]
        fn delegate_peripheralmanagerdidstartadvertising_error(
            &self,
            _: &CBPeripheralManager,
            error: Option<&NSError>,
        ) {
            let error = error.map(|e| e.localizedDescription().to_string());
            log::debug!("Advertising started, error: {error:?}");
            self.send_event(RadioEvent::DidStartAdvertising { error });
        }

        #[unsafe(method(peripheralManager:didAddService:error:))]
        fn delegate_peripheralmanager_didaddservice_error(
            &self,
            _: &CBPeripheralManager,
            service: &CBService,
            error: Option<&NSError>,
        ) {
            let error = error.map(|e| e.localizedDescription().to_string());
            log::debug!("Service added, error: {error:?}");
            self.send_event(RadioEvent::DidAddService {
                service: service.get_uuid(),
                error,
            });
        }

        #[unsafe(method(peripheralManager:central:didSubscribeToCharacteristic:))]
        fn delegate_peripheralmanager_central_didsubscribetocharacteristic(
            &self,
            _: &CBPeripheralManager,
            central: &CBCentral,
            characteristic: &CBCharacteristic,
        ) {
            self.send_event(RadioEvent::DidSubscribe {
                central: central_id(central),
                characteristic: characteristic.get_uuid(),
            });
        }

        #[unsafe(method(peripheralManager:central:didUnsubscribeFromCharacteristic:))]
        fn delegate_peripheralmanager_central_didunsubscribefromcharacteristic(
            &self,
            _: &CBPeripheralManager,
            central: &CBCentral,
            characteristic: &CBCharacteristic,
        ) {
            let central = central_id(central);
            self.send_event(RadioEvent::DidUnsubscribe {
                central: central.clone(),
                characteristic: characteristic.get_uuid(),
            });
            // No link callbacks on the peripheral side, so losing the only
            // subscription counts as a disconnect.
            self.send_event(RadioEvent::CentralDisconnected { central });
        }

        #[unsafe(method(peripheralManagerIsReadyToUpdateSubscribers:))]
        fn delegate_peripheralmanagerisreadytoupdatesubscribers(&self, _: &CBPeripheralManager) {
            self.send_event(RadioEvent::ReadyToUpdateSubscribers);
        }

        #[unsafe(method(peripheralManager:didReceiveReadRequest:))]
        fn delegate_peripheralmanager_didreceivereadrequest(
            &self,
            manager: &CBPeripheralManager,
            request: &CBATTRequest,
        ) {
            self.send_read_request(manager, request);
        }
    }
}

impl PeripheralManagerDelegate {
    pub fn new(sender: RadioEventSender) -> Retained<PeripheralManagerDelegate> {
        let this = PeripheralManagerDelegate::alloc().set_ivars(IVars { sender });
        unsafe { msg_send![super(this), init] }
    }

    fn send_event(&self, event: RadioEvent) {
        let sender = self.ivars().sender.clone();
        executor::block_on(async {
            if let Err(e) = sender.send(event).await {
                log::error!("Error sending delegate event: {e}");
            }
        });
    }

    // Blocks the delegate queue until the peripheral answers.
    fn send_read_request(&self, manager: &CBPeripheralManager, request: &CBATTRequest) {
        let sender = self.ivars().sender.clone();
        let (resp_tx, resp_rx) = oneshot::channel::<ReadRequestResponse>();
        let event = unsafe {
            RadioEvent::ReadRequest {
                central: central_id(&request.central()),
                characteristic: request.characteristic().get_uuid(),
                offset: request.offset(),
                responder: resp_tx,
            }
        };

        let response = executor::block_on(async {
            if let Err(e) = sender.send(event).await {
                log::error!("Error sending read request: {e}");
                return None;
            }
            resp_rx.await.ok()
        });

        let result = match response {
            Some(response) => {
                if response.response == RequestResponse::Success {
                    unsafe { request.setValue(Some(&NSData::from_vec(response.value))) };
                }
                response.response.to_cb_error()
            }
            None => CBATTError::UnlikelyError,
        };
        unsafe { manager.respondToRequest_withResult(request, result) };
    }
}

impl RequestResponse {
    fn to_cb_error(self) -> CBATTError {
        match self {
            RequestResponse::Success => CBATTError::Success,
            RequestResponse::InvalidHandle => CBATTError::InvalidHandle,
            RequestResponse::RequestNotSupported => CBATTError::RequestNotSupported,
            RequestResponse::InvalidOffset => CBATTError::InvalidOffset,
            RequestResponse::UnlikelyError => CBATTError::UnlikelyError,
        }
    }
}
