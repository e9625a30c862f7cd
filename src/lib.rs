//! # Kerberos Exchange
//!
//! A three-party ticket authentication protocol in the style of Kerberos v5 ([RFC4120]).
//!
//! A client obtains a ticket granting ticket (TGT) from the Authentication Server, exchanges it
//! at the Ticket Granting Server for a service ticket, and redeems that ticket at the Service
//! Server for a one-time access code. Every ticket, session key and authenticator travels as a
//! sealed envelope: the DER encoding of the message (see [`krb5_parser`]) encrypted with
//! AES-256-GCM (see [`envelope`]).
//!
//! Requests and replies are in-process values; the [`exchange`] traits are the seam where a
//! network transport would go.
//!
//! # Examples
//!
//! Running the classroom realm:
//!
//! ```rust
//! use kerberos_exchange::config::RealmConfig;
//! use kerberos_exchange::krb5::ServiceName;
//! use kerberos_exchange::realm::Realm;
//!
//! # fn main() {
//! let realm = Realm::provision(&RealmConfig::classroom()).unwrap();
//! let client = realm.client("Advanced_Networking_Student1").unwrap();
//!
//! let grant = realm
//!     .orchestrator()
//!     .run(client, ServiceName::from("Minecraft"))
//!     .unwrap();
//! assert_eq!(grant.service, ServiceName::from("Minecraft"));
//! # }
//! ```
//!
//! [RFC4120]: https://tools.ietf.org/html/rfc4120

#![deny(/*missing_docs,*/unsafe_code,
        unstable_features,
        unused_import_braces, unused_qualifications)]

pub mod krb5;
pub mod krb5_encoder;
pub mod krb5_parser;
pub mod envelope;

pub mod authentication_server;
pub mod client;
pub mod config;
pub mod directory;
pub mod exchange;
pub mod realm;
pub mod service_server;
pub mod ticket_granting_server;

pub mod krb5_constants;
mod krb5_errors;
pub use krb5_errors::*;
