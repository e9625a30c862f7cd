//! Client-facing side of each server
//!
//! The orchestrator only talks to these traits. The in-process servers implement them directly;
//! a network transport would implement them by forwarding the request, and would report a peer
//! that never answers as [`ProtocolError::Timeout`].

use crate::krb5::{ApReply, ApReq, AsReply, AsReq, TgsReply, TgsReq};
use crate::krb5_errors::ProtocolError;

pub trait AuthenticationExchange: Send + Sync {
    fn exchange(&self, request: &AsReq) -> Result<AsReply, ProtocolError>;
}

pub trait TicketGrantingExchange: Send + Sync {
    fn exchange(&self, request: &TgsReq) -> Result<TgsReply, ProtocolError>;
}

pub trait ServiceExchange: Send + Sync {
    fn exchange(&self, request: &ApReq) -> Result<ApReply, ProtocolError>;
}
