// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{AuthController, SignInMode};
use crate::blockchain::{signer_from_hex, signer_from_pem, KeyError};
use crate::config::{LocalKey, ProviderSource, SessionConfig};
use crate::providers::{EthereumProvider, JsonRpcProvider, LocalKeyProvider, ProviderError};
use crate::siwe::MessageBuilder;
use crate::wallet::{ProviderAdapter, WalletConnection};

/// Failure to build the injected provider from configuration.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// The wired-up session: one connection and the auth controller over it.
#[derive(Clone)]
pub struct AppState {
    pub connection: Arc<WalletConnection>,
    pub auth: Arc<AuthController>,
}

impl AppState {
    pub fn new(adapter: ProviderAdapter, messages: MessageBuilder, mode: SignInMode) -> Self {
        let connection = Arc::new(WalletConnection::new(adapter, messages));
        let auth = Arc::new(AuthController::new(connection.clone(), mode));
        Self { connection, auth }
    }

    pub fn from_config(
        config: &SessionConfig,
        injected: Option<Arc<dyn EthereumProvider>>,
    ) -> Self {
        let adapter = match injected {
            Some(provider) => ProviderAdapter::new(provider),
            None => ProviderAdapter::unavailable(),
        };
        let messages = MessageBuilder::new(config.page.clone()).with_statement(&config.statement);
        Self::new(adapter, messages, config.sign_in_mode)
    }
}

/// Local-key provider for the configured key, if any.
pub fn local_provider(source: &ProviderSource) -> Result<Option<LocalKeyProvider>, SetupError> {
    let ProviderSource::Local { key, chain_id } = source else {
        return Ok(None);
    };
    let signer = match key {
        LocalKey::Hex(hex) => signer_from_hex(hex)?,
        LocalKey::Pem(pem) => signer_from_pem(pem)?,
    };
    Ok(Some(LocalKeyProvider::new(signer, *chain_id)))
}

/// JSON-RPC provider for the configured endpoint, if any.
pub fn rpc_provider(source: &ProviderSource) -> Result<Option<JsonRpcProvider>, SetupError> {
    match source {
        ProviderSource::JsonRpc { url, .. } => Ok(Some(JsonRpcProvider::new(url)?)),
        _ => Ok(None),
    }
}
