//! Provisioning
//!
//! Builds the three servers and the client credentials from a [`RealmConfig`]. This is the only
//! place where long-term keys are generated and distributed: `key_TGS` goes to the AS and the
//! TGS, `key_S` to the TGS and the SS, and each client key to its client and the AS.

use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info};

use crate::authentication_server::AuthenticationServer;
use crate::client::{Client, Orchestrator};
use crate::config::RealmConfig;
use crate::directory::{AuthorizationTable, ClientKeyTable};
use crate::krb5::*;
use crate::krb5_errors::ConfigError;
use crate::service_server::ServiceServer;
use crate::ticket_granting_server::TicketGrantingServer;

pub struct Realm {
    services: Vec<ServiceName>,
    clients: Vec<Client>,
    client_keys: ClientKeyTable,
    authorizations: AuthorizationTable,
    authentication_server: Arc<AuthenticationServer>,
    ticket_granting_server: Arc<TicketGrantingServer>,
    service_server: Arc<ServiceServer>,
    clock: Arc<dyn Clock>,
}

impl Realm {
    pub fn provision(config: &RealmConfig) -> Result<Self, ConfigError> {
        Self::provision_with_clock(config, Arc::new(SystemClock))
    }

    pub fn provision_with_clock(config: &RealmConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;

        let tgs_key = EncryptionKey::generate();
        let service_key = EncryptionKey::generate();
        let client_keys = ClientKeyTable::new();
        let authorizations = AuthorizationTable::new();

        let mut clients = Vec::with_capacity(config.clients.len());
        for c in &config.clients {
            let address = parse_address(&c.id, &c.address)?;
            let client = Client::new(ClientId(c.id.clone()), address, EncryptionKey::generate());
            if c.registered {
                client_keys.insert(client.id().clone(), client.key().clone());
                authorizations.grant(
                    client.id().clone(),
                    c.authorized_services.iter().map(|s| ServiceName(s.clone())),
                );
            }
            debug!(client = %client.id(), registered = c.registered, "provisioned client");
            clients.push(client);
        }

        let authentication_server = AuthenticationServer::new(client_keys.clone(), tgs_key.clone());
        let ticket_granting_server =
            TicketGrantingServer::new(authorizations.clone(), tgs_key, service_key.clone());
        let service_server = ServiceServer::new(
            service_key,
            config.provided_services.iter().map(|s| ServiceName(s.clone())),
            clock.clone(),
        );

        info!(
            clients = clients.len(),
            registered = client_keys.len(),
            services = config.services.len(),
            "realm provisioned"
        );
        Ok(Realm {
            services: config.services.iter().map(|s| ServiceName(s.clone())).collect(),
            clients,
            client_keys,
            authorizations,
            authentication_server: Arc::new(authentication_server),
            ticket_granting_server: Arc::new(ticket_granting_server),
            service_server: Arc::new(service_server),
            clock,
        })
    }

    /// Every service a client may ask for
    pub fn services(&self) -> &[ServiceName] {
        &self.services
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn client(&self, id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id().0 == id)
    }

    pub fn authorizations(&self) -> &AuthorizationTable {
        &self.authorizations
    }

    pub fn authentication_server(&self) -> &Arc<AuthenticationServer> {
        &self.authentication_server
    }

    pub fn ticket_granting_server(&self) -> &Arc<TicketGrantingServer> {
        &self.ticket_granting_server
    }

    pub fn service_server(&self) -> &Arc<ServiceServer> {
        &self.service_server
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Orchestrator talking to this realm's servers in-process
    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(
            self.authentication_server.clone(),
            self.ticket_granting_server.clone(),
            self.service_server.clone(),
            self.clock.clone(),
        )
    }

    /// Register a new client while the servers keep running
    ///
    /// Every service must be declared in the realm. The grant is written before the key, so
    /// once the Authentication Server knows the client the Ticket Granting Server already
    /// knows what it may use.
    pub fn register_client<I>(&mut self, id: &str, address: &str, services: I) -> Result<&Client, ConfigError>
    where
        I: IntoIterator<Item = ServiceName>,
    {
        if self.client(id).is_some() {
            return Err(ConfigError::DuplicateClient(id.to_owned()));
        }
        let address = parse_address(id, address)?;
        let services: Vec<ServiceName> = services.into_iter().collect();
        if let Some(undeclared) = services.iter().find(|s| !self.services.contains(*s)) {
            return Err(ConfigError::UndeclaredService {
                service: undeclared.0.clone(),
            });
        }

        let client = Client::new(ClientId(id.to_owned()), address, EncryptionKey::generate());
        self.authorizations.grant(client.id().clone(), services);
        self.client_keys.insert(client.id().clone(), client.key().clone());
        info!(client = %client.id(), "registered client");
        self.clients.push(client);
        Ok(&self.clients[self.clients.len() - 1])
    }

    /// Clients ordered by identifier
    pub fn clients_by_id(&self) -> Vec<&Client> {
        let mut clients: Vec<&Client> = self.clients.iter().collect();
        clients.sort_by(|a, b| a.id().cmp(b.id()));
        clients
    }
}

fn parse_address(client: &str, address: &str) -> Result<HostAddress, ConfigError> {
    address
        .parse::<IpAddr>()
        .map(HostAddress)
        .map_err(|_| ConfigError::InvalidAddress {
            client: client.to_owned(),
            address: address.to_owned(),
        })
}
