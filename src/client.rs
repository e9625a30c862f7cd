//! Client-side driver
//!
//! A [`ProtocolRun`] walks one client through the three exchanges:
//!
//! <pre>
//! Start -> AwaitingAs -> AwaitingTgs -> AwaitingSs -> Done
//!              \              \             \
//!               +--------------+-------------+--> Failed
//! </pre>
//!
//! Each `Awaiting*` state holds the request about to be sent and the one key needed to read its
//! reply. That key is dropped, and wiped, as soon as the state is left.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::envelope::Sealed;
use crate::exchange::{AuthenticationExchange, ServiceExchange, TicketGrantingExchange};
use crate::krb5::*;
use crate::krb5_errors::ProtocolError;

/// Credentials of one client
#[derive(Clone, Debug)]
pub struct Client {
    id: ClientId,
    address: HostAddress,
    key: EncryptionKey,
}

impl Client {
    pub fn new(id: ClientId, address: HostAddress, key: EncryptionKey) -> Self {
        Client { id, address, key }
    }

    pub fn id(&self) -> &ClientId {
        &self.id
    }

    pub fn address(&self) -> HostAddress {
        self.address
    }

    pub(crate) fn key(&self) -> &EncryptionKey {
        &self.key
    }

    fn authenticator(
        &self,
        clock: &dyn Clock,
        session_key: &EncryptionKey,
    ) -> Result<Sealed<Authenticator>, ProtocolError> {
        let authenticator = Authenticator {
            client_id: self.id.clone(),
            timestamp: clock.now(),
        };
        Sealed::seal(&authenticator, session_key)
    }
}

/// The exchange a run failed in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Authentication,
    TicketGranting,
    Service,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stage::Authentication => f.write_str("authentication server"),
            Stage::TicketGranting => f.write_str("ticket granting server"),
            Stage::Service => f.write_str("service server"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FailureCause {
    #[error("rejected: {0}")]
    Rejected(Rejection),
    #[error("timeout")]
    Timeout,
    #[error(transparent)]
    Protocol(ProtocolError),
}

impl From<ProtocolError> for FailureCause {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::Timeout => FailureCause::Timeout,
            e => FailureCause::Protocol(e),
        }
    }
}

/// Why a run ended in `Failed`
#[derive(Debug, Error)]
#[error("{stage}: {cause}")]
pub struct RunFailure {
    pub stage: Stage,
    pub cause: FailureCause,
}

impl RunFailure {
    pub fn rejection(&self) -> Option<&Rejection> {
        match &self.cause {
            FailureCause::Rejected(r) => Some(r),
            FailureCause::Timeout | FailureCause::Protocol(_) => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.cause, FailureCause::Timeout)
    }
}

/// What a successful run hands back
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessGrant {
    pub service: ServiceName,
    pub code: AccessCode,
    pub issued_at: KerberosTime,
}

/// State of one protocol run
#[derive(Debug)]
pub enum RunState {
    Start,
    AwaitingAs {
        request: AsReq,
    },
    AwaitingTgs {
        request: TgsReq,
        session_key: EncryptionKey,
    },
    AwaitingSs {
        request: ApReq,
        session_key: EncryptionKey,
    },
    Done(AccessGrant),
    Failed(RunFailure),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done(_) | RunState::Failed(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            RunState::Start => "start",
            RunState::AwaitingAs { .. } => "awaiting-as",
            RunState::AwaitingTgs { .. } => "awaiting-tgs",
            RunState::AwaitingSs { .. } => "awaiting-ss",
            RunState::Done(_) => "done",
            RunState::Failed(_) => "failed",
        }
    }
}

/// Handles on the three servers
#[derive(Clone)]
pub struct Orchestrator {
    authentication: Arc<dyn AuthenticationExchange>,
    ticket_granting: Arc<dyn TicketGrantingExchange>,
    service: Arc<dyn ServiceExchange>,
    clock: Arc<dyn Clock>,
    deadline: Option<Duration>,
}

impl Orchestrator {
    pub fn new(
        authentication: Arc<dyn AuthenticationExchange>,
        ticket_granting: Arc<dyn TicketGrantingExchange>,
        service: Arc<dyn ServiceExchange>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Orchestrator {
            authentication,
            ticket_granting,
            service,
            clock,
            deadline: None,
        }
    }

    /// Give up on any exchange whose reply takes longer than `deadline`
    ///
    /// Exchanges are synchronous calls: a late reply is still awaited, then discarded, and the
    /// run fails with [`FailureCause::Timeout`].
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Start a run for `client` requesting `service`
    pub fn begin<'a>(&'a self, client: &'a Client, service: ServiceName) -> ProtocolRun<'a> {
        ProtocolRun {
            orchestrator: self,
            client,
            service,
            state: RunState::Start,
        }
    }

    /// Drive a run to completion; stops at the first rejection, never retries
    pub fn run(&self, client: &Client, service: ServiceName) -> Result<AccessGrant, RunFailure> {
        self.begin(client, service).finish()
    }
}

/// One client/service protocol run
pub struct ProtocolRun<'a> {
    orchestrator: &'a Orchestrator,
    client: &'a Client,
    service: ServiceName,
    state: RunState,
}

impl<'a> ProtocolRun<'a> {
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Perform exactly one transition. Terminal states are left unchanged.
    pub fn step(&mut self) {
        let state = std::mem::replace(&mut self.state, RunState::Start);
        let next = match state {
            RunState::Start => self.start(),
            RunState::AwaitingAs { request } => self
                .on_as(&request)
                .unwrap_or_else(|cause| self.fail(Stage::Authentication, cause)),
            RunState::AwaitingTgs {
                request,
                session_key,
            } => self
                .on_tgs(&request, &session_key)
                .unwrap_or_else(|cause| self.fail(Stage::TicketGranting, cause)),
            RunState::AwaitingSs {
                request,
                session_key,
            } => self
                .on_ss(&request, &session_key)
                .unwrap_or_else(|cause| self.fail(Stage::Service, cause)),
            terminal => terminal,
        };
        debug!(client = %self.client.id, state = next.name(), "protocol run advanced");
        self.state = next;
    }

    /// Consume a terminal run. A run that has not terminated is driven to the end first.
    pub fn finish(mut self) -> Result<AccessGrant, RunFailure> {
        loop {
            match self.state {
                RunState::Done(grant) => return Ok(grant),
                RunState::Failed(failure) => return Err(failure),
                _ => self.step(),
            }
        }
    }

    fn fail(&self, stage: Stage, cause: FailureCause) -> RunState {
        warn!(client = %self.client.id, %stage, %cause, "protocol run failed");
        RunState::Failed(RunFailure { stage, cause })
    }

    fn call<R>(
        &self,
        exchange: impl FnOnce() -> Result<Reply<R>, ProtocolError>,
    ) -> Result<R, FailureCause> {
        let started = Instant::now();
        let reply = exchange()?;
        if let Some(deadline) = self.orchestrator.deadline {
            if started.elapsed() > deadline {
                return Err(FailureCause::Timeout);
            }
        }
        reply.into_result().map_err(FailureCause::Rejected)
    }

    fn start(&self) -> RunState {
        RunState::AwaitingAs {
            request: AsReq {
                client_id: self.client.id.clone(),
                address: self.client.address,
            },
        }
    }

    fn on_as(&self, request: &AsReq) -> Result<RunState, FailureCause> {
        let rep = self.call(|| self.orchestrator.authentication.exchange(request))?;
        let session_key = rep.enc_part.open(&self.client.key).map_err(ProtocolError::from)?;
        let authenticator = self
            .client
            .authenticator(self.orchestrator.clock.as_ref(), &session_key)?;
        Ok(RunState::AwaitingTgs {
            request: TgsReq {
                service: self.service.clone(),
                ticket: rep.ticket,
                authenticator,
            },
            session_key,
        })
    }

    fn on_tgs(&self, request: &TgsReq, tgs_session_key: &EncryptionKey) -> Result<RunState, FailureCause> {
        let rep = self.call(|| self.orchestrator.ticket_granting.exchange(request))?;
        let session_key = rep.enc_part.open(tgs_session_key).map_err(ProtocolError::from)?;
        let authenticator = self
            .client
            .authenticator(self.orchestrator.clock.as_ref(), &session_key)?;
        Ok(RunState::AwaitingSs {
            request: ApReq {
                ticket: rep.ticket,
                authenticator,
            },
            session_key,
        })
    }

    fn on_ss(&self, request: &ApReq, service_session_key: &EncryptionKey) -> Result<RunState, FailureCause> {
        let rep = self.call(|| self.orchestrator.service.exchange(request))?;
        let code = rep.code.open(service_session_key).map_err(ProtocolError::from)?;
        let issued_at = rep.timestamp.open(service_session_key).map_err(ProtocolError::from)?;
        info!(client = %self.client.id, service = %self.service, "access granted");
        Ok(RunState::Done(AccessGrant {
            service: self.service.clone(),
            code,
            issued_at,
        }))
    }
}
