use crate::Error;

/// Power and authorization state of the Bluetooth radio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RadioState {
    #[default]
    Unknown,
    Resetting,
    Unsupported,
    Unauthorized,
    PoweredOff,
    PoweredOn,
}

impl RadioState {
    pub fn is_powered_on(self) -> bool {
        self == RadioState::PoweredOn
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RegistrationState {
    #[default]
    Unregistered,
    Registering,
    Registered,
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AdvertisingState {
    #[default]
    Idle,
    Starting,
    Advertising,
    Stopping,
    Failed(String),
}

/// Command that produced a [`PeripheralEvent::CommandRejected`]. Other
/// commands report failures through their own events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Initialize,
    DefineService,
}

/// Everything the peripheral reports to its listener, in the order the
/// underlying transitions happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeripheralEvent {
    PowerChanged {
        state: RadioState,
    },
    RegistrationChanged {
        state: RegistrationState,
    },
    AdvertisingChanged {
        state: AdvertisingState,
    },
    /// Level triggered: fires when the subscriber count moves between zero
    /// and non-zero.
    SubscriptionChanged {
        subscribed: bool,
    },
    /// Level triggered like `SubscriptionChanged`, over connected centrals.
    ConnectionChanged {
        connected: bool,
    },
    PushFailed {
        retry_scheduled: bool,
        reason: Option<String>,
    },
    PushDelivered {
        subscribers: usize,
    },
    CommandRejected {
        command: CommandKind,
        error: Error,
    },
}
