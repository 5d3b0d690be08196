//! Mock upstream services for flashroute
//!
//! Controllable HTTP stand-ins for the quote service and the private relay,
//! used by the integration tests and for local dry runs.

use axum::Router;
use std::net::SocketAddr;
use tokio::task::JoinHandle;

mod quote_service;
mod relay_service;

pub use quote_service::{quote_router, QuoteServiceConfig, QuoteServiceState};
pub use relay_service::{relay_router, RecordedCall, RelayConfig, RelayState};

/// Serve `router` on an ephemeral local port
pub async fn spawn(router: Router) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!("Mock server on {} stopped: {}", addr, e);
        }
    });

    Ok((addr, handle))
}

/// Run both mocks on fixed ports until one of them stops
pub async fn run_mocks(
    quotes: (QuoteServiceConfig, u16),
    relay: (RelayConfig, u16),
) -> anyhow::Result<()> {
    let mut handles = vec![];

    for (name, router, port) in [
        (
            "Quote service",
            quote_router(std::sync::Arc::new(QuoteServiceState::new(quotes.0))),
            quotes.1,
        ),
        ("Relay", relay_router(std::sync::Arc::new(RelayState::new(relay.0))), relay.1),
    ] {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
        tracing::info!("{} listening on port {}", name, port);
        handles.push(tokio::spawn(async move { axum::serve(listener, router).await }));
    }

    for handle in handles {
        handle.await??;
    }

    Ok(())
}
