//! wallet-info — Check exchange credentials before a latency run.
//!
//! Loads the connection settings from the environment (and `.env`), prints the
//! wallet address derived from `WALLET_PRIVATE_KEY` and the endpoint in use.
//! With `--associate`, also sends the signed wallet-association request.
//! With `--write-config`, writes the default run settings to `latency.toml`
//! if no such file exists yet.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use idex_latency::client::RestExchangeClient;
use idex_latency::config::{CONFIG_PATH, ClientConfig, RunConfig};
use idex_latency::prober::ProbeContext;

#[derive(Parser)]
#[command(
    name = "wallet-info",
    about = "Print the derived wallet address and optionally associate it with the exchange"
)]
struct Cli {
    /// Send the signed associate-wallet request
    #[arg(long)]
    associate: bool,

    /// Write default run settings to latency.toml if it does not exist
    #[arg(long)]
    write_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    println!("=== Exchange Wallet Info ===\n");

    let config = ClientConfig::from_env().context("failed to load exchange configuration")?;
    println!("Wallet address: {}", config.wallet_address);
    println!("Base URL:       {}", config.base_url);
    println!("Sandbox:        {}", config.sandbox);
    match config.chain_id {
        Some(id) => println!("Chain ID:       {id}"),
        None => println!("Chain ID:       (not set)"),
    }
    match &config.exchange_contract_address {
        Some(addr) => println!("Contract:       {addr}"),
        None => println!("Contract:       (not set)"),
    }
    println!();

    if cli.associate {
        println!("Associating wallet...");
        let client = RestExchangeClient::new(&config).context("failed to build exchange client")?;
        let ctx = ProbeContext::new(client, config.wallet_address.clone(), Default::default());
        ctx.associate_wallet()
            .await
            .context("wallet association failed")?;
        println!("  Wallet associated successfully");
        println!();
    }

    if cli.write_config {
        let path = Path::new(CONFIG_PATH);
        if path.exists() {
            println!("{} already exists, leaving it untouched", path.display());
        } else {
            RunConfig::default().save(path)?;
            println!("Wrote default run settings to {}", path.display());
        }
    }

    Ok(())
}
