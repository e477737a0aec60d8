use std::collections::BTreeSet;

use uuid::Uuid;

use crate::api::descriptor::{AttributePermission, Descriptor};

#[derive(Debug, Ord, Eq, PartialEq, PartialOrd, Clone)]
pub struct Characteristic {
    pub uuid: Uuid,
    pub properties: BTreeSet<CharacteristicProperty>,
    pub permissions: BTreeSet<AttributePermission>,
    pub descriptors: Vec<Descriptor>,
}

impl Characteristic {
    /// A readable, notifiable characteristic with a CCCD so centrals can
    /// subscribe.
    pub fn notifiable(uuid: Uuid) -> Self {
        Characteristic {
            uuid,
            properties: BTreeSet::from([
                CharacteristicProperty::Read,
                CharacteristicProperty::Notify,
            ]),
            permissions: BTreeSet::from([AttributePermission::Readable]),
            descriptors: vec![Descriptor::client_configuration()],
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialOrd, Ord, Eq, PartialEq)]
pub enum CharacteristicProperty {
    Broadcast,
    Read,
    WriteWithoutResponse,
    Write,
    Notify,
    Indicate,
}
