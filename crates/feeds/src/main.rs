//! Local mock upstreams for flashroute dry runs

use anyhow::Result;
use clap::Parser;
use flashroute_feeds::{run_mocks, QuoteServiceConfig, RelayConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "flashroute-mocks")]
#[command(about = "Mock quote service and private relay")]
struct CliArgs {
    /// Port for the quote service
    #[arg(long, default_value_t = 4010)]
    quote_port: u16,

    /// Port for the relay / chain RPC
    #[arg(long, default_value_t = 4020)]
    relay_port: u16,

    /// Answer this many swap requests with 429 first
    #[arg(long, default_value_t = 0)]
    swap_rejections: u32,

    /// Head block reported to clients
    #[arg(long, default_value_t = 19_000_000)]
    block_number: u64,

    /// Make every bundle simulation fail with this message
    #[arg(long)]
    simulation_error: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,flashroute_feeds=debug,tower_http=debug".into()),
        )
        .init();

    let args = CliArgs::parse();

    let quotes = QuoteServiceConfig {
        swap_rejections: args.swap_rejections,
        ..QuoteServiceConfig::default()
    };
    let relay = RelayConfig {
        block_number: args.block_number,
        simulation_error: args.simulation_error,
        ..RelayConfig::default()
    };

    run_mocks((quotes, args.quote_port), (relay, args.relay_port)).await
}
