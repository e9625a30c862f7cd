//! Realm configuration
//!
//! Describes who the clients are and what they may use. Keys are never configured: they are
//! generated when the realm is provisioned.
//!
//! ```toml
//! services = ["Minecraft", "MS Paint"]
//! provided_services = ["Minecraft"]
//!
//! [[clients]]
//! id = "alice"
//! address = "10.0.0.1"
//! authorized_services = ["Minecraft"]
//!
//! [[clients]]
//! id = "mallory"
//! address = "10.0.0.66"
//! registered = false
//! ```

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::krb5_errors::ConfigError;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RealmConfig {
    /// Every service a client may ask for, provided or not
    pub services: Vec<String>,
    /// Services the Service Server actually provides
    pub provided_services: Vec<String>,
    #[serde(default)]
    pub clients: Vec<ClientConfig>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub id: String,
    pub address: String,
    #[serde(default)]
    pub authorized_services: Vec<String>,
    /// Unregistered clients exist, but the Authentication Server holds no key for them
    #[serde(default = "default_registered")]
    pub registered: bool,
}

fn default_registered() -> bool {
    true
}

const MINECRAFT: &str = "Minecraft";
const WHOLESOME_MEMES: &str = "Wholesome Memes";
const CLONE_WARS: &str = "Star Wars: The Clone Wars";
const MS_PAINT: &str = "MS Paint";

impl RealmConfig {
    /// The classroom lab realm: three students and one uninvited guest
    pub fn classroom() -> Self {
        let client = |n: u8, services: &[&str], registered: bool| ClientConfig {
            id: if registered {
                format!("Advanced_Networking_Student{}", n)
            } else {
                "Uninvited_Guest".to_owned()
            },
            address: format!("10.10.10.{}", 10 + n),
            authorized_services: services.iter().map(|s| s.to_string()).collect(),
            registered,
        };
        RealmConfig {
            services: [MINECRAFT, WHOLESOME_MEMES, CLONE_WARS, MS_PAINT]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            provided_services: [MINECRAFT, WHOLESOME_MEMES, CLONE_WARS]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            clients: vec![
                client(0, &[MINECRAFT, WHOLESOME_MEMES], true),
                client(1, &[MINECRAFT, CLONE_WARS], true),
                client(2, &[MINECRAFT], true),
                client(3, &[], false),
            ],
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: RealmConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Check cross references: unique client ids, parseable addresses, declared services
    pub fn validate(&self) -> Result<(), ConfigError> {
        let declared: HashSet<&str> = self.services.iter().map(String::as_str).collect();
        let check = |service: &String| {
            if declared.contains(service.as_str()) {
                Ok(())
            } else {
                Err(ConfigError::UndeclaredService {
                    service: service.clone(),
                })
            }
        };

        self.provided_services.iter().try_for_each(check)?;

        let mut seen = HashSet::new();
        for client in &self.clients {
            if !seen.insert(client.id.as_str()) {
                return Err(ConfigError::DuplicateClient(client.id.clone()));
            }
            if client.address.parse::<std::net::IpAddr>().is_err() {
                return Err(ConfigError::InvalidAddress {
                    client: client.id.clone(),
                    address: client.address.clone(),
                });
            }
            client.authorized_services.iter().try_for_each(check)?;
        }
        Ok(())
    }
}
