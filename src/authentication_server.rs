//! Authentication Server (AS)

use tracing::{debug, instrument, warn};

use crate::directory::ClientKeyTable;
use crate::envelope::Sealed;
use crate::exchange::AuthenticationExchange;
use crate::krb5::*;
use crate::krb5_constants::REASON_UNKNOWN_CLIENT;
use crate::krb5_errors::ProtocolError;

/// Issues ticket granting tickets to the clients it has a key for
#[derive(Debug)]
pub struct AuthenticationServer {
    client_keys: ClientKeyTable,
    tgs_key: EncryptionKey,
}

impl AuthenticationServer {
    pub fn new(client_keys: ClientKeyTable, tgs_key: EncryptionKey) -> Self {
        AuthenticationServer {
            client_keys,
            tgs_key,
        }
    }

    /// Handle a KRB_AS_REQ-style request
    ///
    /// The TGT is sealed under `key_TGS` and the fresh TGS session key under the client's own
    /// key, so only the client can learn the session key and only the TGS can read the ticket.
    #[instrument(skip_all, fields(client = %request.client_id))]
    pub fn handle(&self, request: &AsReq) -> Result<AsReply, ProtocolError> {
        let client_key = match self.client_keys.lookup(&request.client_id) {
            Some(key) => key,
            None => {
                warn!("rejecting unknown client");
                return Ok(Reply::rejected(
                    RejectionKind::UnknownClient,
                    REASON_UNKNOWN_CLIENT,
                ));
            }
        };

        let session_key = EncryptionKey::generate();
        let tgt = TicketGrantingTicket {
            session_key: session_key.clone(),
            client_id: request.client_id.clone(),
            address: request.address,
            valid: true,
        };
        let ticket = Sealed::seal(&tgt, &self.tgs_key)?;
        let enc_part = Sealed::seal(&session_key, &client_key)?;

        debug!(address = %request.address, "issued ticket granting ticket");
        Ok(Reply::Granted(AsRep { ticket, enc_part }))
    }
}

impl AuthenticationExchange for AuthenticationServer {
    fn exchange(&self, request: &AsReq) -> Result<AsReply, ProtocolError> {
        self.handle(request)
    }
}
