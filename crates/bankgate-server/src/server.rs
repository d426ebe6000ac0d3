//! Assembles the gateway from its configuration and runs it

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bankgate_client::{ClientError, RpcBroadcaster, RpcConfig};
use bankgate_keyring::{FileKeyring, Keyring, KeyringError};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::{ConfigError, GatewayConfig};
use crate::pipeline::SendPipeline;
use crate::rest::{create_rest_router, RestState};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Keyring(#[from] KeyringError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("server io error:: {0}")]
    Io(#[from] std::io::Error),
}

/// Open the file keyring that `bankgate keys` writes to; relative
/// directories live under `home`
pub async fn open_keyring(
    config: &GatewayConfig,
    home: &Path,
) -> Result<Arc<dyn Keyring>, ServerError> {
    let keyring = FileKeyring::new(config.keyring_dir(home)).await?;
    info!(dir = %keyring.dir().display(), "opened keyring");
    Ok(Arc::new(keyring))
}

pub async fn build_pipeline(
    config: &GatewayConfig,
    home: &Path,
) -> Result<SendPipeline, ServerError> {
    config.validate()?;
    let keyring = open_keyring(config, home).await?;
    let rpc = RpcConfig::new(&config.node.rpc_url)?
        .timeout(Duration::from_secs(config.node.timeout_seconds))
        .wait_for_commit(config.node.wait_for_commit);
    let broadcaster = Arc::new(RpcBroadcaster::new(rpc)?);

    Ok(SendPipeline::new(keyring, broadcaster).with_bech32_prefix(&config.chain.bech32_prefix))
}

/// Serve until Ctrl-C
pub async fn run(config: GatewayConfig, home: &Path) -> Result<(), ServerError> {
    let pipeline = build_pipeline(&config, home).await?;
    let router = create_rest_router(Arc::new(RestState::new(pipeline)), &config.server);

    let listener = TcpListener::bind(config.listen_addr()?).await?;
    info!(
        address = %listener.local_addr()?,
        node = %config.node.rpc_url,
        "bankgate REST server listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutting down");
        })
        .await?;
    Ok(())
}
