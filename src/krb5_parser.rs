//! Parsing functions for sealed payloads
//!
//! All parsers are strict DER: every constructed value must be consumed entirely, and every
//! application message must carry the supported protocol version.

use asn1_rs::{Class, Tag};
use der_parser::der::{
    parse_der_bool, parse_der_container, parse_der_octetstring, parse_der_u32, parse_der_u64,
    parse_der_utf8string,
};
use der_parser::error::{BerError, BerResult};
use nom::combinator::map;
use nom::Err;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use uuid::Uuid;

use crate::krb5::*;
use crate::krb5_constants::*;

fn parse_constructed<'a, O, F>(class: Class, tag: u32, f: F) -> impl FnMut(&'a [u8]) -> BerResult<'a, O>
where
    F: Fn(&'a [u8]) -> BerResult<'a, O>,
{
    parse_der_container(move |content, hdr| {
        if hdr.class() != class || hdr.tag() != Tag(tag) || !hdr.is_constructed() {
            return Err(Err::Error(BerError::InvalidTag));
        }
        let (rem, o) = f(content)?;
        if !rem.is_empty() {
            return Err(Err::Error(BerError::InvalidLength));
        }
        Ok((rem, o))
    })
}

fn parse_sequence<'a, O, F>(f: F) -> impl FnMut(&'a [u8]) -> BerResult<'a, O>
where
    F: Fn(&'a [u8]) -> BerResult<'a, O>,
{
    parse_constructed(Class::Universal, Tag::Sequence.0, f)
}

fn parse_explicit<'a, O, F>(tag: u32, f: F) -> impl FnMut(&'a [u8]) -> BerResult<'a, O>
where
    F: Fn(&'a [u8]) -> BerResult<'a, O>,
{
    parse_constructed(Class::ContextSpecific, tag, f)
}

fn parse_application<'a, O, F>(msg_type: MessageType, f: F) -> impl FnMut(&'a [u8]) -> BerResult<'a, O>
where
    F: Fn(&'a [u8]) -> BerResult<'a, O>,
{
    parse_constructed(Class::Application, msg_type.0, move |i| parse_sequence(&f)(i))
}

fn parse_pvno(i: &[u8]) -> BerResult<u32> {
    let (i, pvno) = parse_explicit(0, parse_der_u32)(i)?;
    if pvno != PROTOCOL_VERSION {
        return Err(Err::Error(BerError::BerValueError));
    }
    Ok((i, pvno))
}

fn parse_utf8(i: &[u8]) -> BerResult<String> {
    let (i, obj) = parse_der_utf8string(i)?;
    let s = obj.as_str().map_err(Err::Error)?;
    Ok((i, s.to_owned()))
}

fn parse_octets(i: &[u8]) -> BerResult<&[u8]> {
    let (i, obj) = parse_der_octetstring(i)?;
    let s = obj.as_slice().map_err(Err::Error)?;
    Ok((i, s))
}

fn parse_bool(i: &[u8]) -> BerResult<bool> {
    let (i, obj) = parse_der_bool(i)?;
    let b = obj.as_bool().map_err(Err::Error)?;
    Ok((i, b))
}

/// Parse a client identifier
///
/// <pre>
/// ClientId        ::= UTF8String
/// </pre>
pub fn parse_client_id(i: &[u8]) -> BerResult<ClientId> {
    map(parse_utf8, ClientId)(i)
}

/// Parse a service name
///
/// <pre>
/// ServiceName     ::= UTF8String
/// </pre>
pub fn parse_service_name(i: &[u8]) -> BerResult<ServiceName> {
    map(parse_utf8, ServiceName)(i)
}

/// Parse a KerberosTime
///
/// <pre>
/// KerberosTime    ::= SEQUENCE {
///         seconds         [0] INTEGER,
///         usec            [1] INTEGER (0..999999)
/// }
/// </pre>
pub fn parse_kerberos_time(i: &[u8]) -> BerResult<KerberosTime> {
    parse_sequence(|i| {
        let (i, seconds) = parse_explicit(0, parse_der_u64)(i)?;
        let (i, usec) = parse_explicit(1, parse_der_u32)(i)?;
        if usec > MAX_USEC {
            return Err(Err::Error(BerError::BerValueError));
        }
        Ok((i, KerberosTime { seconds, usec }))
    })(i)
}

/// Parse a HostAddress
///
/// <pre>
/// HostAddress     ::= SEQUENCE  {
///         addr-type       [0] Int32,
///         address         [1] OCTET STRING
/// }
/// </pre>
///
/// Only IPv4 (2) and IPv6 (24) addresses are accepted.
pub fn parse_host_address(i: &[u8]) -> BerResult<HostAddress> {
    parse_sequence(|i| {
        let (i, addr_type) = parse_explicit(0, parse_der_u32)(i)?;
        let (i, octets) = parse_explicit(1, parse_octets)(i)?;
        let addr = match addr_type {
            ADDR_TYPE_IPV4 => {
                let a: [u8; 4] = octets
                    .try_into()
                    .map_err(|_| Err::Error(BerError::InvalidLength))?;
                IpAddr::V4(Ipv4Addr::from(a))
            }
            ADDR_TYPE_IPV6 => {
                let a: [u8; 16] = octets
                    .try_into()
                    .map_err(|_| Err::Error(BerError::InvalidLength))?;
                IpAddr::V6(Ipv6Addr::from(a))
            }
            _ => return Err(Err::Error(BerError::BerValueError)),
        };
        Ok((i, HostAddress(addr)))
    })(i)
}

/// Parse an EncryptionKey
///
/// <pre>
/// EncryptionKey   ::= [APPLICATION 1] SEQUENCE {
///         pvno            [0] INTEGER (1),
///         keyvalue        [1] OCTET STRING (SIZE (32))
/// }
/// </pre>
pub fn parse_encryption_key(i: &[u8]) -> BerResult<EncryptionKey> {
    parse_application(MessageType::ENCRYPTION_KEY, |i| {
        let (i, _) = parse_pvno(i)?;
        let (i, value) = parse_explicit(1, parse_octets)(i)?;
        let key: [u8; KEY_LEN] = value
            .try_into()
            .map_err(|_| Err::Error(BerError::InvalidLength))?;
        Ok((i, EncryptionKey::from_bytes(key)))
    })(i)
}

/// Parse a TicketGrantingTicket
///
/// <pre>
/// TicketGrantingTicket ::= [APPLICATION 2] SEQUENCE {
///         pvno            [0] INTEGER (1),
///         key             [1] EncryptionKey,
///         cname           [2] UTF8String,
///         caddr           [3] HostAddress,
///         valid           [4] BOOLEAN
/// }
/// </pre>
pub fn parse_ticket_granting_ticket(i: &[u8]) -> BerResult<TicketGrantingTicket> {
    parse_application(MessageType::TICKET_GRANTING_TICKET, |i| {
        let (i, _) = parse_pvno(i)?;
        let (i, session_key) = parse_explicit(1, parse_encryption_key)(i)?;
        let (i, client_id) = parse_explicit(2, parse_client_id)(i)?;
        let (i, address) = parse_explicit(3, parse_host_address)(i)?;
        let (i, valid) = parse_explicit(4, parse_bool)(i)?;
        Ok((
            i,
            TicketGrantingTicket {
                session_key,
                client_id,
                address,
                valid,
            },
        ))
    })(i)
}

/// Parse a ServiceTicket
///
/// <pre>
/// ServiceTicket   ::= [APPLICATION 3] SEQUENCE {
///         pvno            [0] INTEGER (1),
///         key             [1] EncryptionKey,
///         cname           [2] UTF8String,
///         caddr           [3] HostAddress,
///         valid           [4] BOOLEAN,
///         sname           [5] UTF8String
/// }
/// </pre>
pub fn parse_service_ticket(i: &[u8]) -> BerResult<ServiceTicket> {
    parse_application(MessageType::SERVICE_TICKET, |i| {
        let (i, _) = parse_pvno(i)?;
        let (i, session_key) = parse_explicit(1, parse_encryption_key)(i)?;
        let (i, client_id) = parse_explicit(2, parse_client_id)(i)?;
        let (i, address) = parse_explicit(3, parse_host_address)(i)?;
        let (i, valid) = parse_explicit(4, parse_bool)(i)?;
        let (i, service) = parse_explicit(5, parse_service_name)(i)?;
        Ok((
            i,
            ServiceTicket {
                session_key,
                client_id,
                address,
                valid,
                service,
            },
        ))
    })(i)
}

/// Parse an Authenticator
///
/// <pre>
/// Authenticator   ::= [APPLICATION 4] SEQUENCE {
///         pvno            [0] INTEGER (1),
///         cname           [1] UTF8String,
///         ctime           [2] KerberosTime
/// }
/// </pre>
pub fn parse_authenticator(i: &[u8]) -> BerResult<Authenticator> {
    parse_application(MessageType::AUTHENTICATOR, |i| {
        let (i, _) = parse_pvno(i)?;
        let (i, client_id) = parse_explicit(1, parse_client_id)(i)?;
        let (i, timestamp) = parse_explicit(2, parse_kerberos_time)(i)?;
        Ok((
            i,
            Authenticator {
                client_id,
                timestamp,
            },
        ))
    })(i)
}

/// Parse a server timestamp
///
/// <pre>
/// Timestamp       ::= [APPLICATION 5] SEQUENCE {
///         pvno            [0] INTEGER (1),
///         stime           [1] KerberosTime
/// }
/// </pre>
pub fn parse_timestamp(i: &[u8]) -> BerResult<KerberosTime> {
    parse_application(MessageType::TIMESTAMP, |i| {
        let (i, _) = parse_pvno(i)?;
        parse_explicit(1, parse_kerberos_time)(i)
    })(i)
}

/// Parse a one-time AccessCode
///
/// <pre>
/// AccessCode      ::= [APPLICATION 6] SEQUENCE {
///         pvno            [0] INTEGER (1),
///         code            [1] OCTET STRING (SIZE (16))
/// }
/// </pre>
pub fn parse_access_code(i: &[u8]) -> BerResult<AccessCode> {
    parse_application(MessageType::ACCESS_CODE, |i| {
        let (i, _) = parse_pvno(i)?;
        let (i, code) = parse_explicit(1, parse_octets)(i)?;
        let uuid = Uuid::from_slice(code).map_err(|_| Err::Error(BerError::InvalidLength))?;
        Ok((i, AccessCode(uuid)))
    })(i)
}
