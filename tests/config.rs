extern crate kerberos_exchange;

use kerberos_exchange::config::RealmConfig;
use kerberos_exchange::krb5::{ClientId, ServiceName};
use kerberos_exchange::realm::Realm;
use kerberos_exchange::ConfigError;
use std::io::Write;

static LAB: &str = r#"
services = ["Minecraft", "MS Paint"]
provided_services = ["Minecraft"]

[[clients]]
id = "alice"
address = "10.0.0.1"
authorized_services = ["Minecraft", "MS Paint"]

[[clients]]
id = "bob"
address = "fe80::1"

[[clients]]
id = "mallory"
address = "10.0.0.66"
registered = false
"#;

#[test]
fn test_parse_realm() {
    let config = RealmConfig::from_toml_str(LAB).unwrap();
    assert_eq!(config.services, ["Minecraft", "MS Paint"]);
    assert_eq!(config.provided_services, ["Minecraft"]);
    assert_eq!(config.clients.len(), 3);

    let bob = &config.clients[1];
    assert!(bob.authorized_services.is_empty());
    assert!(bob.registered);
    assert!(!config.clients[2].registered);
}

#[test]
fn test_provision_realm() {
    let realm = Realm::provision(&RealmConfig::from_toml_str(LAB).unwrap()).unwrap();
    assert_eq!(realm.clients().len(), 3);
    assert_eq!(realm.client("bob").unwrap().address().to_string(), "fe80::1");
    assert_eq!(
        realm.authorizations().authorized_services(&ClientId::from("alice")),
        [ServiceName::from("MS Paint"), ServiceName::from("Minecraft")]
    );
    assert!(realm
        .authorizations()
        .authorized_services(&ClientId::from("mallory"))
        .is_empty());
    assert!(realm.service_server().provides(&ServiceName::from("Minecraft")));
    assert!(!realm.service_server().provides(&ServiceName::from("MS Paint")));
}

#[test]
fn test_unknown_field() {
    let s = format!("{}\nrealm = \"LAB\"\n", "services = []\nprovided_services = []");
    match RealmConfig::from_toml_str(&s) {
        Err(ConfigError::Parse(_)) => (),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_duplicate_client() {
    let s = r#"
services = []
provided_services = []

[[clients]]
id = "alice"
address = "10.0.0.1"

[[clients]]
id = "alice"
address = "10.0.0.2"
"#;
    match RealmConfig::from_toml_str(s) {
        Err(ConfigError::DuplicateClient(id)) => assert_eq!(id, "alice"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_invalid_address() {
    let s = r#"
services = []
provided_services = []

[[clients]]
id = "alice"
address = "10.0.0.256"
"#;
    match RealmConfig::from_toml_str(s) {
        Err(ConfigError::InvalidAddress { client, address }) => {
            assert_eq!(client, "alice");
            assert_eq!(address, "10.0.0.256");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_undeclared_service() {
    let s = r#"
services = ["Minecraft"]
provided_services = ["Minecraft", "Doom"]
"#;
    match RealmConfig::from_toml_str(s) {
        Err(ConfigError::UndeclaredService { service }) => assert_eq!(service, "Doom"),
        other => panic!("unexpected result: {:?}", other),
    }

    let mut config = RealmConfig::classroom();
    config.clients[0].authorized_services.push("Doom".to_owned());
    assert!(config.validate().is_err());
    assert!(Realm::provision(&config).is_err());
}

#[test]
fn test_classroom() {
    let config = RealmConfig::classroom();
    config.validate().unwrap();
    assert_eq!(
        config.services,
        [
            "Minecraft",
            "Wholesome Memes",
            "Star Wars: The Clone Wars",
            "MS Paint"
        ]
    );
    assert!(!config.provided_services.iter().any(|s| s == "MS Paint"));

    let ids: Vec<_> = config.clients.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(
        ids,
        [
            "Advanced_Networking_Student0",
            "Advanced_Networking_Student1",
            "Advanced_Networking_Student2",
            "Uninvited_Guest"
        ]
    );
    assert_eq!(config.clients[2].address, "10.10.10.12");
    assert_eq!(config.clients[2].authorized_services, ["Minecraft"]);
    assert!(!config.clients[3].registered);
}

#[test]
fn test_load_from_file() {
    let path = std::env::temp_dir().join(format!("kerberos-realm-{}.toml", std::process::id()));
    {
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(LAB.as_bytes()).unwrap();
    }
    let config = RealmConfig::load(&path);
    std::fs::remove_file(&path).unwrap();
    assert_eq!(config.unwrap(), RealmConfig::from_toml_str(LAB).unwrap());

    match RealmConfig::load(&path) {
        Err(ConfigError::Io(_)) => (),
        other => panic!("unexpected result: {:?}", other),
    }
}
