//! Ticket Granting Server (TGS)

use tracing::{debug, instrument, warn};

use crate::directory::AuthorizationTable;
use crate::envelope::Sealed;
use crate::exchange::TicketGrantingExchange;
use crate::krb5::*;
use crate::krb5_constants::*;
use crate::krb5_errors::ProtocolError;

/// Exchanges a ticket granting ticket for a service ticket
#[derive(Debug)]
pub struct TicketGrantingServer {
    authorizations: AuthorizationTable,
    tgs_key: EncryptionKey,
    service_key: EncryptionKey,
}

impl TicketGrantingServer {
    pub fn new(
        authorizations: AuthorizationTable,
        tgs_key: EncryptionKey,
        service_key: EncryptionKey,
    ) -> Self {
        TicketGrantingServer {
            authorizations,
            tgs_key,
            service_key,
        }
    }

    /// Handle a KRB_TGS_REQ-style request
    ///
    /// A TGT or authenticator that cannot be opened is a protocol error, not a rejection.
    /// Authorization is decided on the identity inside the TGT.
    #[instrument(skip_all, fields(service = %request.service))]
    pub fn handle(&self, request: &TgsReq) -> Result<TgsReply, ProtocolError> {
        let tgt = request.ticket.open(&self.tgs_key)?;
        let authenticator = request.authenticator.open(&tgt.session_key)?;

        if authenticator.client_id != tgt.client_id {
            warn!(
                ticket = %tgt.client_id,
                claimed = %authenticator.client_id,
                "authenticator does not match ticket granting ticket"
            );
            return Ok(Reply::rejected(
                RejectionKind::IdentityMismatch,
                REASON_TGT_MISMATCH,
            ));
        }
        if !tgt.valid {
            warn!(client = %tgt.client_id, "ticket granting ticket is flagged invalid");
            return Ok(Reply::rejected(
                RejectionKind::InvalidTicket,
                REASON_TGT_MISMATCH,
            ));
        }
        if !self
            .authorizations
            .is_authorized(&tgt.client_id, &request.service)
        {
            warn!(client = %tgt.client_id, "client not authorized for service");
            return Ok(Reply::rejected(
                RejectionKind::UnauthorizedService,
                REASON_UNAUTHORIZED_SERVICE,
            ));
        }

        let session_key = EncryptionKey::generate();
        let service_ticket = ServiceTicket {
            session_key: session_key.clone(),
            client_id: tgt.client_id.clone(),
            address: tgt.address,
            valid: true,
            service: request.service.clone(),
        };
        let ticket = Sealed::seal(&service_ticket, &self.service_key)?;
        let enc_part = Sealed::seal(&session_key, &tgt.session_key)?;

        debug!(client = %tgt.client_id, "issued service ticket");
        Ok(Reply::Granted(TgsRep { ticket, enc_part }))
    }
}

impl TicketGrantingExchange for TicketGrantingServer {
    fn exchange(&self, request: &TgsReq) -> Result<TgsReply, ProtocolError> {
        self.handle(request)
    }
}
