//! `serve` command handler: admin API + worker callback endpoint.

use anyhow::{Context, Result};

use crate::infrastructure::http::AppState;

pub async fn handle(state: AppState, addr: &str) -> Result<()> {
    let dispatcher = state.dispatcher.clone();
    let socket_addr = addr.parse().with_context(|| format!("invalid listen address: {addr}"))?;

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received, draining in-flight pipeline runs");
        dispatcher.shutdown(crate::services::dispatcher::default_shutdown_grace()).await;
    };

    tokio::select! {
        result = crate::infrastructure::http::serve(state, socket_addr) => result.context("HTTP server failed")?,
        () = shutdown => {}
    }
    Ok(())
}
