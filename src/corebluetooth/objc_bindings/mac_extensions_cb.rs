use std::ffi::{c_char, c_void};

use objc2::rc::Retained;
use objc2_core_bluetooth::{
    CBAttributePermissions, CBCentral, CBCharacteristic, CBCharacteristicProperties,
    CBManagerState, CBService, CBUUID,
};
use objc2_foundation::NSString;
use uuid::Uuid;

use crate::api::characteristic::CharacteristicProperty;
use crate::api::descriptor::AttributePermission;
use crate::api::peripheral_event::RadioState;
use crate::api::radio::CentralId;
use crate::uuid::{ShortUuid, parse_identifier};

pub const DISPATCH_QUEUE_SERIAL: *const c_void = std::ptr::null();

unsafe extern "C" {
    pub fn dispatch_queue_create(label: *const c_char, attr: *const c_void) -> *mut c_void;
}

pub fn uuid_to_cbuuid(uuid: Uuid) -> Retained<CBUUID> {
    unsafe { CBUUID::UUIDWithString(&NSString::from_str(&uuid.to_short_string())) }
}

pub fn central_id(central: &CBCentral) -> CentralId {
    unsafe { central.identifier() }.UUIDString().to_string()
}

pub fn convert_state(state: CBManagerState) -> RadioState {
    match state {
        CBManagerState::Resetting => RadioState::Resetting,
        CBManagerState::Unsupported => RadioState::Unsupported,
        CBManagerState::Unauthorized => RadioState::Unauthorized,
        CBManagerState::PoweredOff => RadioState::PoweredOff,
        CBManagerState::PoweredOn => RadioState::PoweredOn,
        _ => RadioState::Unknown,
    }
}

pub fn convert_property(property: CharacteristicProperty) -> CBCharacteristicProperties {
    match property {
        CharacteristicProperty::Broadcast => CBCharacteristicProperties::Broadcast,
        CharacteristicProperty::Read => CBCharacteristicProperties::Read,
        CharacteristicProperty::WriteWithoutResponse => {
            CBCharacteristicProperties::WriteWithoutResponse
        }
        CharacteristicProperty::Write => CBCharacteristicProperties::Write,
        CharacteristicProperty::Notify => CBCharacteristicProperties::Notify,
        CharacteristicProperty::Indicate => CBCharacteristicProperties::Indicate,
    }
}

pub fn convert_permission(permission: AttributePermission) -> CBAttributePermissions {
    match permission {
        AttributePermission::Readable => CBAttributePermissions::Readable,
        AttributePermission::Writeable => CBAttributePermissions::Writeable,
        AttributePermission::ReadEncryptionRequired => {
            CBAttributePermissions::ReadEncryptionRequired
        }
        AttributePermission::WriteEncryptionRequired => {
            CBAttributePermissions::WriteEncryptionRequired
        }
    }
}

pub trait UuidExtension {
    fn get_uuid(self) -> Uuid;
}

impl UuidExtension for &CBService {
    fn get_uuid(self) -> Uuid {
        unsafe { self.UUID().get_uuid() }
    }
}

impl UuidExtension for &CBCharacteristic {
    fn get_uuid(self) -> Uuid {
        unsafe { self.UUID().get_uuid() }
    }
}

impl UuidExtension for &CBUUID {
    fn get_uuid(self) -> Uuid {
        let uuid_str = unsafe { self.UUIDString() }.to_string();
        parse_identifier(&uuid_str).unwrap_or_default()
    }
}
