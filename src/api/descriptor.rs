use std::collections::BTreeSet;

use uuid::Uuid;

use crate::uuid::ShortUuid;

/// Client Characteristic Configuration descriptor assigned number.
pub const CLIENT_CONFIGURATION_UUID: u16 = 0x2902;

#[derive(Debug, Ord, Clone, PartialOrd, PartialEq, Eq)]
pub struct Descriptor {
    pub uuid: Uuid,
    pub permissions: BTreeSet<AttributePermission>,
}

impl Descriptor {
    /// CCCD centrals write to enable or disable notifications.
    pub fn client_configuration() -> Self {
        Descriptor {
            uuid: Uuid::from_u16(CLIENT_CONFIGURATION_UUID),
            permissions: BTreeSet::from([
                AttributePermission::Readable,
                AttributePermission::Writeable,
            ]),
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, Ord, PartialOrd, PartialEq, Eq)]
pub enum AttributePermission {
    Readable,
    Writeable,
    ReadEncryptionRequired,
    WriteEncryptionRequired,
}
