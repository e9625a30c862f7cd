//! Sealed envelopes
//!
//! An envelope is the DER encoding of a message, encrypted with AES-256-GCM:
//!
//! <pre>
//! envelope = nonce (12 bytes) || ciphertext || tag (16 bytes)
//! </pre>
//!
//! The nonce is drawn fresh for every call to [`seal`], so sealing the same value twice yields
//! different bytes. The message type is bound as associated data: an envelope only opens under
//! the key it was sealed with, and only as the type it was sealed as.

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::Aes256Gcm;
use der_parser::error::BerResult;
use nom::combinator::all_consuming;
use rand::RngCore;
use std::fmt;
use std::marker::PhantomData;
use zeroize::Zeroizing;

use crate::krb5::*;
use crate::krb5_constants::{NONCE_LEN, TAG_LEN};
use crate::krb5_encoder::*;
use crate::krb5_errors::{DecryptionFailure, DecryptionFailureKind, ProtocolError};
use crate::krb5_parser::*;

/// A message type with a versioned DER encoding
pub trait Sealable: Sized {
    const MESSAGE_TYPE: MessageType;

    fn encode(&self) -> asn1_rs::SerializeResult<Vec<u8>>;

    fn decode(i: &[u8]) -> BerResult<'_, Self>;
}

impl Sealable for EncryptionKey {
    const MESSAGE_TYPE: MessageType = MessageType::ENCRYPTION_KEY;

    fn encode(&self) -> asn1_rs::SerializeResult<Vec<u8>> {
        encode_encryption_key(self)
    }

    fn decode(i: &[u8]) -> BerResult<'_, Self> {
        parse_encryption_key(i)
    }
}

impl Sealable for TicketGrantingTicket {
    const MESSAGE_TYPE: MessageType = MessageType::TICKET_GRANTING_TICKET;

    fn encode(&self) -> asn1_rs::SerializeResult<Vec<u8>> {
        encode_ticket_granting_ticket(self)
    }

    fn decode(i: &[u8]) -> BerResult<'_, Self> {
        parse_ticket_granting_ticket(i)
    }
}

impl Sealable for ServiceTicket {
    const MESSAGE_TYPE: MessageType = MessageType::SERVICE_TICKET;

    fn encode(&self) -> asn1_rs::SerializeResult<Vec<u8>> {
        encode_service_ticket(self)
    }

    fn decode(i: &[u8]) -> BerResult<'_, Self> {
        parse_service_ticket(i)
    }
}

impl Sealable for Authenticator {
    const MESSAGE_TYPE: MessageType = MessageType::AUTHENTICATOR;

    fn encode(&self) -> asn1_rs::SerializeResult<Vec<u8>> {
        encode_authenticator(self)
    }

    fn decode(i: &[u8]) -> BerResult<'_, Self> {
        parse_authenticator(i)
    }
}

impl Sealable for KerberosTime {
    const MESSAGE_TYPE: MessageType = MessageType::TIMESTAMP;

    fn encode(&self) -> asn1_rs::SerializeResult<Vec<u8>> {
        encode_timestamp(self)
    }

    fn decode(i: &[u8]) -> BerResult<'_, Self> {
        parse_timestamp(i)
    }
}

impl Sealable for AccessCode {
    const MESSAGE_TYPE: MessageType = MessageType::ACCESS_CODE;

    fn encode(&self) -> asn1_rs::SerializeResult<Vec<u8>> {
        encode_access_code(self)
    }

    fn decode(i: &[u8]) -> BerResult<'_, Self> {
        parse_access_code(i)
    }
}

fn associated_data(msg_type: MessageType) -> [u8; 4] {
    msg_type.0.to_be_bytes()
}

/// Seal `value` under `key`
pub fn seal<T: Sealable>(value: &T, key: &EncryptionKey) -> Result<Vec<u8>, ProtocolError> {
    let plaintext = Zeroizing::new(value.encode()?);
    let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));

    let mut nonce = [0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce);
    let aad = associated_data(T::MESSAGE_TYPE);

    let ciphertext = cipher
        .encrypt(
            GenericArray::from_slice(&nonce),
            Payload {
                msg: &plaintext,
                aad: &aad,
            },
        )
        .map_err(|_| ProtocolError::Encryption(T::MESSAGE_TYPE))?;

    let mut envelope = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    envelope.extend_from_slice(&nonce);
    envelope.extend_from_slice(&ciphertext);
    Ok(envelope)
}

/// Open an envelope sealed with [`seal`]
pub fn open<T: Sealable>(envelope: &[u8], key: &EncryptionKey) -> Result<T, DecryptionFailure> {
    let failure = |kind| DecryptionFailure {
        msg_type: T::MESSAGE_TYPE,
        kind,
    };
    if envelope.len() < NONCE_LEN + TAG_LEN {
        return Err(failure(DecryptionFailureKind::Truncated));
    }
    let (nonce, ciphertext) = envelope.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));
    let aad = associated_data(T::MESSAGE_TYPE);

    let plaintext = cipher
        .decrypt(
            GenericArray::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: &aad,
            },
        )
        .map(Zeroizing::new)
        .map_err(|_| failure(DecryptionFailureKind::Authentication))?;

    let mut parser = all_consuming(T::decode);
    let value = match parser(plaintext.as_slice()) {
        Ok((_, value)) => Ok(value),
        Err(_) => Err(failure(DecryptionFailureKind::Malformed)),
    };
    value
}

/// Typed envelope
///
/// On the wire this is only the envelope bytes; the type parameter records, at compile time,
/// what the envelope is expected to contain.
pub struct Sealed<T> {
    bytes: Vec<u8>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Sealable> Sealed<T> {
    pub fn seal(value: &T, key: &EncryptionKey) -> Result<Self, ProtocolError> {
        seal(value, key).map(Sealed::from_bytes)
    }

    pub fn open(&self, key: &EncryptionKey) -> Result<T, DecryptionFailure> {
        open(&self.bytes, key)
    }
}

impl<T> Sealed<T> {
    /// Wrap envelope bytes received from a peer
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Sealed {
            bytes,
            _marker: PhantomData,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl<T> Clone for Sealed<T> {
    fn clone(&self) -> Self {
        Sealed::from_bytes(self.bytes.clone())
    }
}

impl<T> PartialEq for Sealed<T> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl<T> Eq for Sealed<T> {}

impl<T> fmt::Debug for Sealed<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Sealed")
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seal_raw(plaintext: &[u8], msg_type: MessageType, key: &EncryptionKey) -> Vec<u8> {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(key.as_bytes()));
        let nonce = [7u8; NONCE_LEN];
        let aad = associated_data(msg_type);
        let mut envelope = nonce.to_vec();
        envelope.extend(
            cipher
                .encrypt(
                    GenericArray::from_slice(&nonce),
                    Payload {
                        msg: plaintext,
                        aad: &aad,
                    },
                )
                .unwrap(),
        );
        envelope
    }

    #[test]
    fn authenticated_garbage_is_malformed() {
        let key = EncryptionKey::generate();
        let envelope = seal_raw(b"not a timestamp", MessageType::TIMESTAMP, &key);

        let err = open::<KerberosTime>(&envelope, &key).unwrap_err();
        assert_eq!(err.kind, DecryptionFailureKind::Malformed);
    }

    #[test]
    fn trailing_bytes_are_malformed() {
        let key = EncryptionKey::generate();
        let mut plaintext = encode_timestamp(&KerberosTime { seconds: 5, usec: 0 }).unwrap();
        plaintext.push(0);
        let envelope = seal_raw(&plaintext, MessageType::TIMESTAMP, &key);

        let err = open::<KerberosTime>(&envelope, &key).unwrap_err();
        assert_eq!(err.kind, DecryptionFailureKind::Malformed);
    }
}
