use std::collections::HashMap;
use std::ffi::CString;

use objc2::{AnyThread, msg_send};
use objc2::{rc::Retained, runtime::AnyObject};
use objc2_core_bluetooth::{
    CBAdvertisementDataLocalNameKey, CBAdvertisementDataServiceUUIDsKey, CBAttributePermissions,
    CBCharacteristic, CBCharacteristicProperties, CBManager, CBManagerAuthorization,
    CBMutableCharacteristic, CBMutableService, CBPeripheralManager,
};
use objc2_foundation::{NSArray, NSData, NSDictionary, NSString};
use uuid::Uuid;

use super::mac_extensions_cb::{
    DISPATCH_QUEUE_SERIAL, convert_permission, convert_property, dispatch_queue_create,
    uuid_to_cbuuid,
};
use super::peripheral_manager_delegate_cb::PeripheralManagerDelegate;
use crate::api::characteristic::Characteristic;
use crate::api::radio::{Advertisement, RadioEventSender};
use crate::api::service::ServiceDescriptor;
use crate::{Error, Result};

/// Owns the `CBPeripheralManager` and the services published on it.
///
/// Delegate callbacks run on a private serial dispatch queue and are
/// forwarded as radio events.
#[derive(Debug)]
pub struct CbPeripheralManager {
    cb_peripheral_manager: Retained<CBPeripheralManager>,
    _delegate: Retained<PeripheralManagerDelegate>,
    services: HashMap<Uuid, Retained<CBMutableService>>,
    cached_characteristics: HashMap<Uuid, Retained<CBMutableCharacteristic>>,
}

impl CbPeripheralManager {
    pub fn new(sender: RadioEventSender) -> Result<Self> {
        let delegate = PeripheralManagerDelegate::new(sender);
        let label = CString::new("blecast.peripheral").map_err(|e| Error::Backend(e.to_string()))?;
        let queue = unsafe { dispatch_queue_create(label.as_ptr(), DISPATCH_QUEUE_SERIAL) };
        if queue.is_null() {
            return Err(Error::Backend("failed to create dispatch queue".to_string()));
        }
        let queue: *mut AnyObject = queue.cast();
        let cb_peripheral_manager: Retained<CBPeripheralManager> = unsafe {
            msg_send![CBPeripheralManager::alloc(), initWithDelegate: &*delegate, queue: queue]
        };

        Ok(Self {
            cb_peripheral_manager,
            _delegate: delegate,
            services: HashMap::new(),
            cached_characteristics: HashMap::new(),
        })
    }

    pub fn add_service(&mut self, service: &ServiceDescriptor) {
        let characteristic = service.characteristic();
        let cb_characteristic = parse_characteristic(characteristic);

        unsafe {
            let mutable_service = CBMutableService::initWithType_primary(
                CBMutableService::alloc(),
                &uuid_to_cbuuid(service.uuid()),
                service.is_primary(),
            );
            let characteristics: Vec<Retained<CBCharacteristic>> =
                vec![Retained::into_super(cb_characteristic.clone())];
            let characteristics = NSArray::from_retained_slice(&characteristics);
            mutable_service.setCharacteristics(Some(&characteristics));

            self.cb_peripheral_manager.addService(&mutable_service);
            self.services.insert(service.uuid(), mutable_service);
        }
        self.cached_characteristics
            .insert(characteristic.uuid, cb_characteristic);
    }

    pub fn remove_service(&mut self, service: &ServiceDescriptor) {
        self.cached_characteristics
            .remove(&service.characteristic_uuid());
        match self.services.remove(&service.uuid()) {
            Some(mutable_service) => unsafe {
                self.cb_peripheral_manager.removeService(&mutable_service);
            },
            None => log::debug!("Service {} was never added", service.uuid()),
        }
    }

    pub fn start_advertising(&self, advertisement: &Advertisement) {
        let keys: Vec<&NSString> = unsafe {
            vec![
                CBAdvertisementDataLocalNameKey,
                CBAdvertisementDataServiceUUIDsKey,
            ]
        };
        let uuids: Vec<_> = advertisement
            .service_uuids
            .iter()
            .map(|uuid| uuid_to_cbuuid(*uuid))
            .collect();
        let objects: Vec<Retained<AnyObject>> = unsafe {
            vec![
                Retained::cast_unchecked(NSString::from_str(&advertisement.local_name)),
                Retained::cast_unchecked(NSArray::from_retained_slice(&uuids)),
            ]
        };

        let advertising_data: Retained<NSDictionary<NSString, AnyObject>> =
            NSDictionary::from_retained_objects(&keys, &objects);

        unsafe {
            self.cb_peripheral_manager
                .startAdvertising(Some(&advertising_data));
        }
    }

    pub fn stop_advertising(&self) {
        unsafe {
            self.cb_peripheral_manager.stopAdvertising();
        }
    }

    /// `None` when the characteristic is not published, otherwise whether
    /// CoreBluetooth accepted the value into its transmit queue.
    pub fn update_value(&self, characteristic: Uuid, value: &[u8]) -> Option<bool> {
        let cb_characteristic = self.cached_characteristics.get(&characteristic)?;
        let sent = unsafe {
            self.cb_peripheral_manager
                .updateValue_forCharacteristic_onSubscribedCentrals(
                    &NSData::with_bytes(value),
                    cb_characteristic,
                    None,
                )
        };
        Some(sent)
    }
}

// The value stays nil so reads reach the delegate. CoreBluetooth publishes
// the client configuration descriptor itself.
fn parse_characteristic(characteristic: &Characteristic) -> Retained<CBMutableCharacteristic> {
    let properties = characteristic
        .properties
        .iter()
        .fold(CBCharacteristicProperties::empty(), |acc, property| {
            acc | convert_property(*property)
        });
    let permissions = characteristic
        .permissions
        .iter()
        .fold(CBAttributePermissions::empty(), |acc, permission| {
            acc | convert_permission(*permission)
        });

    unsafe {
        CBMutableCharacteristic::initWithType_properties_value_permissions(
            CBMutableCharacteristic::alloc(),
            &uuid_to_cbuuid(characteristic.uuid),
            properties,
            None,
            permissions,
        )
    }
}

pub fn is_authorized() -> bool {
    let authorization = unsafe { CBManager::authorization_class() };
    authorization != CBManagerAuthorization::Restricted
        && authorization != CBManagerAuthorization::Denied
}
