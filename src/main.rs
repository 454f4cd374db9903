// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use siwe_connect::auth::SignInMode;
use siwe_connect::config::{LogFormat, ProviderSource, SessionConfig};
use siwe_connect::providers::EthereumProvider;
use siwe_connect::state::{local_provider, rpc_provider, AppState};
use siwe_connect::wallet::WalletKind;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match SessionConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(config.log_format);

    let kind = match env::args().nth(1) {
        Some(name) => match WalletKind::from_name(&name) {
            Some(kind) => kind,
            None => {
                eprintln!("Unknown wallet `{name}` (expected `metamask` or `walletconnect`)");
                return ExitCode::FAILURE;
            }
        },
        None => WalletKind::default(),
    };

    let shutdown = CancellationToken::new();
    let injected: Option<Arc<dyn EthereumProvider>> = match build_provider(&config, &shutdown) {
        Ok(provider) => provider,
        Err(e) => {
            tracing::error!(error = %e, "Failed to set up wallet provider");
            return ExitCode::FAILURE;
        }
    };

    let state = AppState::from_config(&config, injected);
    let subscription = state.connection.mount();
    let status_listener = state.auth.mount();

    tracing::info!(
        wallet = %kind,
        origin = %config.page.origin,
        mode = ?config.sign_in_mode,
        "Starting sign-in"
    );

    let mut status = state.auth.connect(kind).await;
    if config.sign_in_mode == SignInMode::Manual && state.connection.state().is_connected {
        status = state.auth.authenticate().await;
    }

    let wallet = state.connection.state();
    let report = serde_json::json!({
        "status": status,
        "wallet": wallet,
        "view": wallet.view(),
        "credentials": state.auth.credentials(),
    });
    match serde_json::to_string_pretty(&report) {
        Ok(text) => println!("{text}"),
        Err(e) => tracing::error!(error = %e, "Failed to render report"),
    }

    status_listener.unmount().await;
    subscription.unmount().await;
    shutdown.cancel();

    if status.is_authenticated() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn build_provider(
    config: &SessionConfig,
    shutdown: &CancellationToken,
) -> Result<Option<Arc<dyn EthereumProvider>>, siwe_connect::state::SetupError> {
    if let Some(provider) = rpc_provider(&config.provider)? {
        if let ProviderSource::JsonRpc { poll_interval, .. } = &config.provider {
            provider.spawn_watcher(*poll_interval, shutdown.clone());
        }
        tracing::info!(url = %provider.url(), "Using JSON-RPC wallet provider");
        return Ok(Some(Arc::new(provider)));
    }

    if let Some(provider) = local_provider(&config.provider)? {
        tracing::info!(address = %provider.address(), "Using local key provider");
        return Ok(Some(Arc::new(provider)));
    }

    tracing::warn!("No wallet provider configured");
    Ok(None)
}
