//! DER encoding functions
//!
//! Each function produces the exact layout documented on the corresponding structure in
//! [`krb5`](../krb5/index.html), and accepted by the matching function in
//! [`krb5_parser`](../krb5_parser/index.html).

use asn1_rs::{Class, Header, Length, OctetString, SerializeResult, Tag, ToDer};
use zeroize::Zeroizing;

use crate::krb5::*;
use crate::krb5_constants::PROTOCOL_VERSION;

fn der_constructed(class: Class, tag: u32, content: &[u8]) -> SerializeResult<Vec<u8>> {
    let header = Header::new(class, true, Tag(tag), Length::Definite(content.len())).to_der_vec()?;
    let mut v = Vec::with_capacity(header.len() + content.len());
    v.extend_from_slice(&header);
    v.extend_from_slice(content);
    Ok(v)
}

// Intermediate buffers may hold session keys, so they are wiped once copied.

fn der_sequence(fields: &[Vec<u8>]) -> SerializeResult<Vec<u8>> {
    let content = Zeroizing::new(fields.concat());
    der_constructed(Class::Universal, Tag::Sequence.0, &content)
}

fn der_explicit(tag: u32, inner: SerializeResult<Vec<u8>>) -> SerializeResult<Vec<u8>> {
    let inner = Zeroizing::new(inner?);
    der_constructed(Class::ContextSpecific, tag, &inner)
}

/// `[APPLICATION n] SEQUENCE { pvno [0] INTEGER, fields... }`
fn der_application(msg_type: MessageType, fields: Vec<Vec<u8>>) -> SerializeResult<Vec<u8>> {
    let mut fields = Zeroizing::new(fields);
    fields.insert(0, der_explicit(0, PROTOCOL_VERSION.to_der_vec())?);
    let seq = Zeroizing::new(der_sequence(&fields)?);
    der_constructed(Class::Application, msg_type.0, &seq)
}

/// Encode a KerberosTime
///
/// <pre>
/// KerberosTime    ::= SEQUENCE {
///         seconds         [0] INTEGER,
///         usec            [1] INTEGER (0..999999)
/// }
/// </pre>
pub fn encode_kerberos_time(t: &KerberosTime) -> SerializeResult<Vec<u8>> {
    der_sequence(&[
        der_explicit(0, t.seconds.to_der_vec())?,
        der_explicit(1, t.usec.to_der_vec())?,
    ])
}

/// Encode a HostAddress
pub fn encode_host_address(a: &HostAddress) -> SerializeResult<Vec<u8>> {
    let octets = a.octets();
    der_sequence(&[
        der_explicit(0, a.addr_type().to_der_vec())?,
        der_explicit(1, OctetString::new(&octets).to_der_vec())?,
    ])
}

/// Encode an EncryptionKey (`[APPLICATION 1]`)
pub fn encode_encryption_key(k: &EncryptionKey) -> SerializeResult<Vec<u8>> {
    der_application(
        MessageType::ENCRYPTION_KEY,
        vec![der_explicit(1, OctetString::new(k.as_bytes()).to_der_vec())?],
    )
}

/// Encode a TicketGrantingTicket (`[APPLICATION 2]`)
pub fn encode_ticket_granting_ticket(t: &TicketGrantingTicket) -> SerializeResult<Vec<u8>> {
    der_application(
        MessageType::TICKET_GRANTING_TICKET,
        vec![
            der_explicit(1, encode_encryption_key(&t.session_key))?,
            der_explicit(2, t.client_id.0.to_der_vec())?,
            der_explicit(3, encode_host_address(&t.address))?,
            der_explicit(4, t.valid.to_der_vec())?,
        ],
    )
}

/// Encode a ServiceTicket (`[APPLICATION 3]`)
pub fn encode_service_ticket(t: &ServiceTicket) -> SerializeResult<Vec<u8>> {
    der_application(
        MessageType::SERVICE_TICKET,
        vec![
            der_explicit(1, encode_encryption_key(&t.session_key))?,
            der_explicit(2, t.client_id.0.to_der_vec())?,
            der_explicit(3, encode_host_address(&t.address))?,
            der_explicit(4, t.valid.to_der_vec())?,
            der_explicit(5, t.service.0.to_der_vec())?,
        ],
    )
}

/// Encode an Authenticator (`[APPLICATION 4]`)
pub fn encode_authenticator(a: &Authenticator) -> SerializeResult<Vec<u8>> {
    der_application(
        MessageType::AUTHENTICATOR,
        vec![
            der_explicit(1, a.client_id.0.to_der_vec())?,
            der_explicit(2, encode_kerberos_time(&a.timestamp))?,
        ],
    )
}

/// Encode a server timestamp (`[APPLICATION 5]`)
pub fn encode_timestamp(t: &KerberosTime) -> SerializeResult<Vec<u8>> {
    der_application(
        MessageType::TIMESTAMP,
        vec![der_explicit(1, encode_kerberos_time(t))?],
    )
}

/// Encode a one-time AccessCode (`[APPLICATION 6]`)
pub fn encode_access_code(c: &AccessCode) -> SerializeResult<Vec<u8>> {
    der_application(
        MessageType::ACCESS_CODE,
        vec![der_explicit(1, OctetString::new(c.0.as_bytes()).to_der_vec())?],
    )
}
