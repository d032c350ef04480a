use std::borrow::Cow;

use crate::api::error;
use crate::modules::connection::schema::ConnectionStatus;

/// Expected, recoverable outcomes of connection operations. Storage faults
/// pass through opaque and are not retried here.
#[derive(thiserror::Error, Debug)]
pub enum ConnectionError {
    #[error("{0}")]
    NotFound(Cow<'static, str>),
    #[error("Cannot send connection request to yourself")]
    SelfConnection,
    #[error("Connection request already pending")]
    AlreadyPending,
    #[error("Users are already connected")]
    AlreadyConnected,
    #[error("Cannot send request - connection is blocked")]
    Blocked,
    #[error("Cannot send request - you are blocked by this user")]
    BlockedByPeer,
    #[error("Only pending requests can become {to}. Current status: {from}")]
    InvalidTransition { from: ConnectionStatus, to: ConnectionStatus },
    #[error("A conflicting connection exists between these users")]
    Conflict,
    #[error(transparent)]
    Storage(#[from] error::SystemError),
}

impl From<ConnectionError> for error::Error {
    fn from(value: ConnectionError) -> Self {
        match value {
            ConnectionError::Storage(e) => e.into(),
            ConnectionError::NotFound(msg) => error::Error::NotFound(msg),
            ConnectionError::Conflict => {
                error::Error::conflict("A conflicting connection exists between these users")
            }
            other => error::Error::bad_request(other.to_string()),
        }
    }
}
