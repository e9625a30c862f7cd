//! Ticket exchange structures
//!
//! The message shapes follow Kerberos 5 ([RFC4120]) loosely: a client obtains a ticket granting
//! ticket from the Authentication Server, trades it at the Ticket Granting Server for a service
//! ticket, and redeems that ticket at the Service Server.
//!
//! [RFC4120]: https://tools.ietf.org/html/rfc4120

use rand::RngCore;
use rusticata_macros::newtype_enum;
use std::fmt;
use std::net::IpAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::envelope::Sealed;
use crate::krb5_constants::*;

/// Client identifier
///
/// The name a client claims when it contacts the Authentication Server, and the identity
/// embedded in every ticket issued for it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub String);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        ClientId(s.to_owned())
    }
}

/// Name of a service offered by the Service Server
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceName(pub String);

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceName {
    fn from(s: &str) -> Self {
        ServiceName(s.to_owned())
    }
}

/// Network address of a client
///
/// <pre>
/// HostAddress     ::= SEQUENCE  {
///         addr-type       [0] Int32,
///         address         [1] OCTET STRING
/// }
/// </pre>
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HostAddress(pub IpAddr);

impl HostAddress {
    pub fn addr_type(&self) -> u32 {
        match self.0 {
            IpAddr::V4(_) => ADDR_TYPE_IPV4,
            IpAddr::V6(_) => ADDR_TYPE_IPV6,
        }
    }

    pub fn octets(&self) -> Vec<u8> {
        match self.0 {
            IpAddr::V4(a) => a.octets().to_vec(),
            IpAddr::V6(a) => a.octets().to_vec(),
        }
    }
}

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Timestamp with microsecond precision
///
/// <pre>
/// KerberosTime    ::= SEQUENCE {
///         seconds         [0] INTEGER,
///         usec            [1] INTEGER (0..999999)
/// }
/// </pre>
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KerberosTime {
    /// Seconds since the Unix epoch
    pub seconds: u64,
    pub usec: u32,
}

impl KerberosTime {
    pub fn from_system_time(t: SystemTime) -> Self {
        let d = t.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        KerberosTime {
            seconds: d.as_secs(),
            usec: d.subsec_micros(),
        }
    }
}

/// Source of timestamps for authenticators and access grants
pub trait Clock: Send + Sync {
    fn now(&self) -> KerberosTime;
}

/// Wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> KerberosTime {
        KerberosTime::from_system_time(SystemTime::now())
    }
}

/// Symmetric key
///
/// Used both for long-term secrets (client keys, `key_TGS`, `key_S`) and for the session keys
/// generated at each ticket issuance. The key material is wiped when the value is dropped.
///
/// <pre>
/// EncryptionKey   ::= [APPLICATION 1] SEQUENCE {
///         pvno            [0] INTEGER (1),
///         keyvalue        [1] OCTET STRING (SIZE (32))
/// }
/// </pre>
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    /// Generate a fresh random key
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_LEN];
        rand::rng().fill_bytes(&mut key);
        EncryptionKey(key)
    }

    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        EncryptionKey(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

/// Message type
///
/// The application tag of each sealed message. It is also bound to the envelope as associated
/// data, so a payload sealed as one type cannot be opened as another.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageType(pub u32);

newtype_enum! {
impl debug MessageType {
    ENCRYPTION_KEY = 1,
    TICKET_GRANTING_TICKET = 2,
    SERVICE_TICKET = 3,
    AUTHENTICATOR = 4,
    TIMESTAMP = 5,
    ACCESS_CODE = 6,
}
}

/// Ticket Granting Ticket
///
/// Issued by the Authentication Server, sealed under `key_TGS`. Opaque to the client.
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
#[derive(Clone, Debug, PartialEq)]
pub struct TicketGrantingTicket {
    pub session_key: EncryptionKey,
    pub client_id: ClientId,
    pub address: HostAddress,
    pub valid: bool,
}

/// Service Ticket
///
/// Issued by the Ticket Granting Server, sealed under `key_S`, scoped to one service.
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
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceTicket {
    pub session_key: EncryptionKey,
    pub client_id: ClientId,
    pub address: HostAddress,
    pub valid: bool,
    pub service: ServiceName,
}

/// Authenticator
///
/// Built fresh by the client for each hop and sealed under the session key it just received.
///
/// <pre>
/// Authenticator   ::= [APPLICATION 4] SEQUENCE {
///         pvno            [0] INTEGER (1),
///         cname           [1] UTF8String,
///         ctime           [2] KerberosTime
/// }
/// </pre>
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Authenticator {
    pub client_id: ClientId,
    pub timestamp: KerberosTime,
}

/// One-time access code handed out by the Service Server
///
/// <pre>
/// AccessCode      ::= [APPLICATION 6] SEQUENCE {
///         pvno            [0] INTEGER (1),
///         code            [1] OCTET STRING (SIZE (16))
/// }
/// </pre>
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AccessCode(pub Uuid);

impl AccessCode {
    pub fn generate() -> Self {
        AccessCode(Uuid::new_v4())
    }
}

/// Request to the Authentication Server
#[derive(Clone, Debug, PartialEq)]
pub struct AsReq {
    pub client_id: ClientId,
    pub address: HostAddress,
}

/// Successful Authentication Server reply
#[derive(Clone, Debug, PartialEq)]
pub struct AsRep {
    /// TGT sealed under `key_TGS`
    pub ticket: Sealed<TicketGrantingTicket>,
    /// TGS session key sealed under the client's key
    pub enc_part: Sealed<EncryptionKey>,
}

/// Request to the Ticket Granting Server
#[derive(Clone, Debug, PartialEq)]
pub struct TgsReq {
    pub service: ServiceName,
    pub ticket: Sealed<TicketGrantingTicket>,
    pub authenticator: Sealed<Authenticator>,
}

/// Successful Ticket Granting Server reply
#[derive(Clone, Debug, PartialEq)]
pub struct TgsRep {
    /// Service ticket sealed under `key_S`
    pub ticket: Sealed<ServiceTicket>,
    /// Service session key sealed under the TGS session key
    pub enc_part: Sealed<EncryptionKey>,
}

/// Request to the Service Server
#[derive(Clone, Debug, PartialEq)]
pub struct ApReq {
    pub ticket: Sealed<ServiceTicket>,
    pub authenticator: Sealed<Authenticator>,
}

/// Successful Service Server reply, both parts sealed under the service session key
#[derive(Clone, Debug, PartialEq)]
pub struct ApRep {
    pub code: Sealed<AccessCode>,
    pub timestamp: Sealed<KerberosTime>,
}

/// Why a server refused a request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RejectionKind {
    UnknownClient,
    IdentityMismatch,
    InvalidTicket,
    UnauthorizedService,
    ServiceUnavailable,
}

/// Structured refusal with a human-readable reason
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    pub kind: RejectionKind,
    pub reason: String,
}

impl Rejection {
    pub fn new(kind: RejectionKind, reason: &str) -> Self {
        Rejection {
            kind,
            reason: reason.to_owned(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Server reply: either the granted credential or a rejection
#[derive(Clone, Debug, PartialEq)]
pub enum Reply<T> {
    Granted(T),
    Rejected(Rejection),
}

impl<T> Reply<T> {
    pub fn rejected(kind: RejectionKind, reason: &str) -> Self {
        Reply::Rejected(Rejection::new(kind, reason))
    }

    /// Convert into a `Result`, the rejection becoming the error
    pub fn into_result(self) -> Result<T, Rejection> {
        match self {
            Reply::Granted(t) => Ok(t),
            Reply::Rejected(r) => Err(r),
        }
    }
}

pub type AsReply = Reply<AsRep>;
pub type TgsReply = Reply<TgsRep>;
pub type ApReply = Reply<ApRep>;
