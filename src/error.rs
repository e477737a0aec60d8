use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything a peripheral command or backend can fail with.
///
/// All variants are recoverable: the caller may retry once the required
/// state has been reached, which is observable through the event stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Malformed service or characteristic identifier.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("bluetooth radio is not powered on")]
    NotPoweredOn,

    #[error("precondition not met: {0}")]
    PreconditionNotMet(String),

    /// Asynchronous failure reported by the radio.
    #[error("radio rejected request: {0}")]
    RadioRejected(String),

    /// A value was pushed without a registered service.
    #[error("service is not registered, cannot push value")]
    NotAdvertising,

    #[error("configuration error: {0}")]
    Config(String),

    /// The peripheral task or a responder went away.
    #[error("channel error: {0}")]
    Channel(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Fieldless discriminant of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidIdentifier,
    NotPoweredOn,
    PreconditionNotMet,
    RadioRejected,
    NotAdvertising,
    Config,
    Channel,
    Backend,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            Error::NotPoweredOn => ErrorKind::NotPoweredOn,
            Error::PreconditionNotMet(_) => ErrorKind::PreconditionNotMet,
            Error::RadioRejected(_) => ErrorKind::RadioRejected,
            Error::NotAdvertising => ErrorKind::NotAdvertising,
            Error::Config(_) => ErrorKind::Config,
            Error::Channel(_) => ErrorKind::Channel,
            Error::Backend(_) => ErrorKind::Backend,
        }
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for Error {
    fn from(e: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Error::Channel(e.to_string())
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for Error {
    fn from(e: tokio::sync::oneshot::error::RecvError) -> Self {
        Error::Channel(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Config(e.to_string())
    }
}
