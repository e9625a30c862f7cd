//! Provisioned tables shared between servers
//!
//! Tables are filled once when the realm is provisioned and are only read while requests are
//! served. They sit behind a read-mostly lock so a client can still be registered later without
//! stopping concurrent handlers.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::krb5::{ClientId, EncryptionKey, ServiceName};

/// Client identifier to pre-shared key, held by the Authentication Server
#[derive(Clone, Debug, Default)]
pub struct ClientKeyTable {
    keys: Arc<RwLock<HashMap<ClientId, EncryptionKey>>>,
}

impl ClientKeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the key of `client`
    pub fn insert(&self, client: ClientId, key: EncryptionKey) {
        self.keys.write().insert(client, key);
    }

    pub fn lookup(&self, client: &ClientId) -> Option<EncryptionKey> {
        self.keys.read().get(client).cloned()
    }

    pub fn contains(&self, client: &ClientId) -> bool {
        self.keys.read().contains_key(client)
    }

    pub fn len(&self) -> usize {
        self.keys.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }
}

/// Client identifier to authorized services, held by the Ticket Granting Server
#[derive(Clone, Debug, Default)]
pub struct AuthorizationTable {
    services: Arc<RwLock<HashMap<ClientId, HashSet<ServiceName>>>>,
}

impl AuthorizationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `services` to the set authorized for `client`
    pub fn grant<I>(&self, client: ClientId, services: I)
    where
        I: IntoIterator<Item = ServiceName>,
    {
        self.services
            .write()
            .entry(client)
            .or_default()
            .extend(services);
    }

    /// Unknown clients are authorized for nothing
    pub fn is_authorized(&self, client: &ClientId, service: &ServiceName) -> bool {
        self.services
            .read()
            .get(client)
            .map_or(false, |set| set.contains(service))
    }

    pub fn authorized_services(&self, client: &ClientId) -> Vec<ServiceName> {
        let mut v: Vec<_> = self
            .services
            .read()
            .get(client)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        v.sort();
        v
    }
}
