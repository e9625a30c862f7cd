//! Protocol constants

/// Version carried in the `pvno` field of every sealed message
pub const PROTOCOL_VERSION: u32 = 1;

/// Length of every symmetric key (AES-256)
pub const KEY_LEN: usize = 32;

/// Length of the random nonce prepended to an envelope
pub const NONCE_LEN: usize = 12;

/// Length of the AES-GCM authentication tag
pub const TAG_LEN: usize = 16;

/// Host address types, RFC 4120 section 7.5.3
pub const ADDR_TYPE_IPV4: u32 = 2;
pub const ADDR_TYPE_IPV6: u32 = 24;

pub const MAX_USEC: u32 = 999_999;

pub const REASON_UNKNOWN_CLIENT: &str = "client id not mapped to a key";
pub const REASON_TGT_MISMATCH: &str = "client id did not match TGT";
pub const REASON_UNAUTHORIZED_SERVICE: &str = "client not authorized for this service";
pub const REASON_TICKET_MISMATCH: &str = "client id did not match service ticket";
pub const REASON_SERVICE_UNAVAILABLE: &str = "service not provided by this server";
