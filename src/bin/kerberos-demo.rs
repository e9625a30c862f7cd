#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use kerberos_exchange::config::RealmConfig;
use kerberos_exchange::krb5::ServiceName;
use kerberos_exchange::realm::Realm;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "kerberos-demo",
    about = "Run the AS / TGS / SS ticket exchange for one client"
)]
struct Cli {
    /// Realm description (TOML). The classroom realm is used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the clients and services of the realm
    List,
    /// Perform one protocol run
    Run(RunArgs),
}

#[derive(Parser)]
struct RunArgs {
    #[arg(long)]
    client: String,
    #[arg(long)]
    service: String,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => RealmConfig::load(path)
            .with_context(|| format!("loading realm from {}", path.display()))?,
        None => RealmConfig::classroom(),
    };
    let realm = Realm::provision(&config).context("provisioning realm")?;

    match cli.command {
        Command::List => list(&realm),
        Command::Run(args) => run(&realm, &args),
    }
}

fn list(realm: &Realm) -> Result<()> {
    println!("clients:");
    for (i, client) in realm.clients_by_id().into_iter().enumerate() {
        println!("  {}: {} ({})", i, client.id(), client.address());
    }
    println!("services:");
    for (i, service) in realm.services().iter().enumerate() {
        println!("  {}: {}", i, service);
    }
    Ok(())
}

fn run(realm: &Realm, args: &RunArgs) -> Result<()> {
    let client = realm
        .client(&args.client)
        .ok_or_else(|| anyhow!("no client named {:?} in the realm", args.client))?;
    let service = ServiceName(args.service.clone());

    match realm.orchestrator().run(client, service) {
        Ok(grant) => {
            println!("{}", grant.code.0);
            Ok(())
        }
        Err(failure) => match failure.rejection() {
            Some(rejection) => {
                println!("{}", rejection);
                Ok(())
            }
            None => Err(failure.into()),
        },
    }
}
