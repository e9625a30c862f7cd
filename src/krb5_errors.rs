use asn1_rs::SerializeError;
use thiserror::Error;

use crate::krb5::MessageType;

/// Why an envelope could not be opened
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecryptionFailureKind {
    /// Shorter than nonce and tag
    Truncated,
    /// Wrong key, corrupted or forged ciphertext, or sealed as another message type
    Authentication,
    /// Authenticated, but the payload is not a valid encoding of the expected type
    Malformed,
}

/// An envelope could not be opened with the given key
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("cannot open {msg_type:?} envelope: {kind:?}")]
pub struct DecryptionFailure {
    pub msg_type: MessageType,
    pub kind: DecryptionFailureKind,
}

/// Hard protocol failure
///
/// Unlike a [`Rejection`](crate::krb5::Rejection), this is not attributable to server state: an
/// envelope was forged or corrupted, the client skipped a step, or the peer never answered.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Decryption(#[from] DecryptionFailure),
    #[error("cannot encode message: {0}")]
    Encoding(#[from] SerializeError),
    #[error("cannot seal {0:?} message")]
    Encryption(MessageType),
    /// The peer did not answer in time
    #[error("exchange timed out")]
    Timeout,
}

impl ProtocolError {
    /// The decryption failure behind this error, if any
    pub fn decryption_failure(&self) -> Option<&DecryptionFailure> {
        match self {
            ProtocolError::Decryption(d) => Some(d),
            _ => None,
        }
    }
}

/// Invalid realm configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read realm configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse realm configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("duplicate client id {0}")]
    DuplicateClient(String),
    #[error("invalid address {address:?} for client {client}")]
    InvalidAddress { client: String, address: String },
    #[error("service {service:?} is not declared in the realm")]
    UndeclaredService { service: String },
}
