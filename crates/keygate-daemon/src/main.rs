//! Keygate - command-line entry point
//!
//! Identifier helpers plus a local demo deployment served by the development
//! signer backend.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keygate_core::{derive_class_id, parse_network_descriptor, Address, SignaturePayload};
use keygate_daemon::{open_gate, persist, DaemonConfig, DevSigner, Watcher};
use keygate_ledger::{Call, GateStorage};

#[derive(Parser)]
#[command(name = "keygate")]
#[command(about = "Request/resolve coordinator for MPC keys and signatures", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the daemon config (defaults to $KEYGATE_CONFIG or the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the classification identifier for a purpose and coin type
    ClassId {
        #[arg(long, default_value_t = keygate_core::ids::PURPOSE_BIP44)]
        purpose: u64,

        #[arg(long)]
        coin_type: u64,
    },

    /// Print the numeric network identifier of a descriptor such as eip155:1
    ChainId { descriptor: String },

    /// Run one key and one signature round against the local deployment
    Demo {
        /// Message to sign
        #[arg(short, long, default_value = "keygate demo")]
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keygate=info,keygate_ledger=info,keygate_daemon=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ClassId { purpose, coin_type } => {
            println!("{}", derive_class_id(purpose, coin_type));
            Ok(())
        }
        Commands::ChainId { descriptor } => {
            println!("{}", parse_network_descriptor(&descriptor)?);
            Ok(())
        }
        Commands::Demo { message } => {
            let config_path = cli.config.unwrap_or_else(DaemonConfig::default_path);
            run_demo(config_path, message).await
        }
    }
}

async fn run_demo(config_path: PathBuf, message: String) -> Result<()> {
    info!("Starting Keygate demo v{}", env!("CARGO_PKG_VERSION"));

    let config = DaemonConfig::load_or_create(&config_path)?;
    config.ensure_directories()?;
    info!("Using config {:?}", config_path);

    let classification = config
        .classifications
        .first()
        .ok_or_else(|| anyhow::anyhow!("config has no classifications"))?;
    let class_id = derive_class_id(classification.purpose, classification.coin_type);
    let descriptor = classification
        .networks
        .first()
        .ok_or_else(|| anyhow::anyhow!("classification {} has no networks", class_id))?;
    let chain_id = parse_network_descriptor(descriptor)?;

    let storage = GateStorage::new(config.state_dir.clone())?;
    let mut proxy = open_gate(&config, &storage)?;
    let records = proxy.outbox_mut().subscribe();
    let gate = Arc::new(Mutex::new(proxy));

    let mut watcher = Watcher::new(
        gate.clone(),
        config.signer,
        DevSigner::new(config.seed_bytes()?),
        records,
    );

    let owner = Address::new(rand::random());
    let fee = gate.lock().await.gate().fee();
    let call = Call::with_value(owner, fee);
    info!("Demo owner {}", owner);

    gate.lock()
        .await
        .call(&call, |gate, call| gate.request_public_key(call, class_id))?;
    for outcome in watcher.drain().await {
        if let Err(e) = outcome {
            warn!("Watcher failed: {}", e);
        }
    }

    let index = gate
        .lock()
        .await
        .gate()
        .next_index(&class_id, &owner)
        .checked_sub(1)
        .ok_or_else(|| anyhow::anyhow!("key request was not resolved"))?;

    let payload = SignaturePayload::data(message.into_bytes());
    gate.lock().await.call(&call, |gate, call| {
        gate.request_signature(call, class_id, index, chain_id, payload)
    })?;
    for outcome in watcher.drain().await {
        if let Err(e) = outcome {
            warn!("Watcher failed: {}", e);
        }
    }

    let proxy = gate.lock().await;
    for record in proxy.gate().outbox().records() {
        println!("{}", serde_json::to_string(record)?);
    }
    persist(&proxy, &storage)?;
    info!("Saved state to {:?}", storage.base_path());

    Ok(())
}
