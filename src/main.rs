use std::fmt::Debug;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use serde::de::DeserializeOwned;
use tezos_rpc::cli::{Cli, Commands};
use tezos_rpc::config::load_client_config;
use tezos_rpc::http::{JsonStream, RpcClient, StreamEnd};
use tezos_rpc::log::init_logging;
use tezos_rpc::Service;
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    let mut config = load_client_config(&cli.config)?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    let client = RpcClient::from_config(&config).context("Could not create RPC client")?;
    info!(base_url = &*config.base_url; "Using node");
    let service = Service::new(client);

    match cli.command {
        Commands::Stats => print(service.get_network_stats().await?),
        Commands::Connections => print(service.get_network_connections().await?),
        Commands::Peers { filter } => print(service.get_network_peers(filter.as_deref()).await?),
        Commands::Peer { peer_id } => print(service.get_network_peer(&peer_id).await?),
        Commands::PeerLog { peer_id, monitor } => {
            if monitor {
                let cancel = cancel_on_ctrl_c();
                drain(service.monitor_network_peer_log(&peer_id, cancel).await?).await?;
            } else {
                print(service.get_network_peer_log(&peer_id).await?);
            }
        },
        Commands::Ban { peer_id } => {
            service.ban_network_peer(&peer_id).await?;
            println!("Banned {peer_id}");
        },
        Commands::Trust { peer_id } => {
            service.trust_network_peer(&peer_id).await?;
            println!("Trusted {peer_id}");
        },
        Commands::Banned { peer_id } => print(service.get_network_peer_banned(&peer_id).await?),
        Commands::DelegateBalance { pkh, chain, block } => {
            print(service.get_delegate_balance(&chain, &block, &pkh).await?)
        },
        Commands::ContractBalance { contract, chain, block } => {
            print(service.get_contract_balance(&chain, &block, &contract).await?)
        },
        Commands::Block { block, chain } => print(service.get_block(&chain, &block).await?),
        Commands::PendingOperations { chain } => print(service.get_mempool_pending_operations(&chain).await?),
        Commands::Bootstrapped => {
            let cancel = cancel_on_ctrl_c();
            drain(service.get_bootstrapped(cancel).await?).await?;
        },
    }

    if let Some(latency) = service.client().latency().await {
        info!(latency_ms = latency.as_millis() as u64; "Last request");
    }
    Ok(())
}

fn print<T: Debug>(value: T) {
    println!("{value:#?}");
}

async fn drain<T: Debug + DeserializeOwned>(mut values: JsonStream<T>) -> Result<()> {
    while let Some(value) = values.next().await {
        print(value.context("Stream failed")?);
    }

    match values.outcome() {
        Some(StreamEnd::Cancelled) => info!(delivered = values.delivered(); "Stream interrupted"),
        _ => warn!(delivered = values.delivered(); "Node closed the stream"),
    }
    Ok(())
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error:% = e; "Failed to listen for ctrl_c");
            return;
        }
        trigger.cancel();
    });
    cancel
}
