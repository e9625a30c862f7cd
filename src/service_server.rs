//! Service Server (SS)

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::envelope::Sealed;
use crate::exchange::ServiceExchange;
use crate::krb5::*;
use crate::krb5_constants::*;
use crate::krb5_errors::ProtocolError;

/// Redeems service tickets for one-time access codes
pub struct ServiceServer {
    service_key: EncryptionKey,
    provided: HashSet<ServiceName>,
    clock: Arc<dyn Clock>,
}

impl ServiceServer {
    pub fn new<I>(service_key: EncryptionKey, provided: I, clock: Arc<dyn Clock>) -> Self
    where
        I: IntoIterator<Item = ServiceName>,
    {
        ServiceServer {
            service_key,
            provided: provided.into_iter().collect(),
            clock,
        }
    }

    pub fn provides(&self, service: &ServiceName) -> bool {
        self.provided.contains(service)
    }

    /// Handle a KRB_AP_REQ-style request
    ///
    /// The ticket's service name is checked against the services this server provides, after
    /// the identity check.
    #[instrument(skip_all)]
    pub fn handle(&self, request: &ApReq) -> Result<ApReply, ProtocolError> {
        let ticket = request.ticket.open(&self.service_key)?;
        let authenticator = request.authenticator.open(&ticket.session_key)?;

        if authenticator.client_id != ticket.client_id {
            warn!(
                ticket = %ticket.client_id,
                claimed = %authenticator.client_id,
                "authenticator does not match service ticket"
            );
            return Ok(Reply::rejected(
                RejectionKind::IdentityMismatch,
                REASON_TICKET_MISMATCH,
            ));
        }
        if !ticket.valid {
            warn!(client = %ticket.client_id, "service ticket is flagged invalid");
            return Ok(Reply::rejected(
                RejectionKind::InvalidTicket,
                REASON_TICKET_MISMATCH,
            ));
        }
        if !self.provides(&ticket.service) {
            warn!(client = %ticket.client_id, service = %ticket.service, "service not provided");
            return Ok(Reply::rejected(
                RejectionKind::ServiceUnavailable,
                REASON_SERVICE_UNAVAILABLE,
            ));
        }

        let code = AccessCode::generate();
        let now = self.clock.now();
        let rep = ApRep {
            code: Sealed::seal(&code, &ticket.session_key)?,
            timestamp: Sealed::seal(&now, &ticket.session_key)?,
        };

        debug!(client = %ticket.client_id, service = %ticket.service, "granted one-time access");
        Ok(Reply::Granted(rep))
    }
}

impl ServiceExchange for ServiceServer {
    fn exchange(&self, request: &ApReq) -> Result<ApReply, ProtocolError> {
        self.handle(request)
    }
}
