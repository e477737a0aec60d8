use std::collections::BTreeSet;

use uuid::Uuid;

use crate::Result;
use crate::api::characteristic::{Characteristic, CharacteristicProperty};
use crate::api::descriptor::AttributePermission;
use crate::uuid::parse_identifier;

/// The single primary service this peripheral exposes. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    uuid: Uuid,
    characteristic: Characteristic,
}

impl ServiceDescriptor {
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn characteristic(&self) -> &Characteristic {
        &self.characteristic
    }

    pub fn characteristic_uuid(&self) -> Uuid {
        self.characteristic.uuid
    }

    pub fn properties(&self) -> &BTreeSet<CharacteristicProperty> {
        &self.characteristic.properties
    }

    pub fn permissions(&self) -> &BTreeSet<AttributePermission> {
        &self.characteristic.permissions
    }

    pub fn is_primary(&self) -> bool {
        true
    }
}

/// Build a descriptor from caller supplied identifiers.
///
/// The characteristic is always readable and notifiable with read
/// permission. Nothing is mutated on failure.
pub fn build_service(service_id: &str, characteristic_id: &str) -> Result<ServiceDescriptor> {
    let uuid = parse_identifier(service_id)?;
    let characteristic_uuid = parse_identifier(characteristic_id)?;

    Ok(ServiceDescriptor {
        uuid,
        characteristic: Characteristic::notifiable(characteristic_uuid),
    })
}
