// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Provider adapter.
//!
//! Every call into the injected provider goes through here, and every
//! provider failure is classified into [`WalletError`] here:
//!
//! | Operation | Rejection (code 4001) | Other failure |
//! |-----------|-----------------------|---------------|
//! | `request_accounts` | `UserRejected` | `Provider(message)` |
//! | `get_network` | - | `Provider(message)` |
//! | `sign_message` | `SignatureRejected` | `SignatureFailed` |
//!
//! Both named wallet variants route through the same injected provider.
//! WalletConnect has no transport of its own.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::WalletError;
use crate::providers::{EthereumProvider, ProviderEvent};

/// Named wallet a user can pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    /// Browser extension wallet
    #[default]
    MetaMask,
    /// Placeholder routed through the injected provider
    WalletConnect,
}

impl WalletKind {
    /// Parse a wallet name (case-insensitive).
    pub fn from_name(s: &str) -> Option<WalletKind> {
        match s.trim().to_lowercase().as_str() {
            "metamask" => Some(WalletKind::MetaMask),
            "walletconnect" => Some(WalletKind::WalletConnect),
            _ => None,
        }
    }

    /// Message shown when no injected provider is present.
    pub fn unavailable_message(&self) -> &'static str {
        match self {
            WalletKind::MetaMask => "MetaMask is not installed",
            WalletKind::WalletConnect => "WalletConnect requires a Web3 provider",
        }
    }
}

impl std::fmt::Display for WalletKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletKind::MetaMask => write!(f, "metamask"),
            WalletKind::WalletConnect => write!(f, "walletconnect"),
        }
    }
}

/// Entry point to the (possibly absent) injected provider.
#[derive(Clone, Default)]
pub struct ProviderAdapter {
    injected: Option<Arc<dyn EthereumProvider>>,
}

impl ProviderAdapter {
    pub fn new(injected: Arc<dyn EthereumProvider>) -> Self {
        Self {
            injected: Some(injected),
        }
    }

    /// Adapter for an environment with no injected provider.
    pub fn unavailable() -> Self {
        Self { injected: None }
    }

    pub fn is_available(&self) -> bool {
        self.injected.is_some()
    }

    /// Handle for the requested wallet variant, failing fast when no
    /// provider is injected.
    pub fn open(&self, kind: WalletKind) -> Result<ProviderHandle, WalletError> {
        let provider = self.injected.clone().ok_or_else(|| {
            WalletError::ProviderUnavailable(kind.unavailable_message().to_string())
        })?;
        Ok(ProviderHandle { provider, kind })
    }

    /// Listen for provider notifications, if a provider is injected.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<ProviderEvent>> {
        self.injected.as_ref().map(|p| p.subscribe())
    }
}

/// Live handle to the provider, held by a connected session.
#[derive(Clone)]
pub struct ProviderHandle {
    provider: Arc<dyn EthereumProvider>,
    kind: WalletKind,
}

impl ProviderHandle {
    pub fn kind(&self) -> WalletKind {
        self.kind
    }

    /// Ask the wallet to expose its accounts.
    pub async fn request_accounts(&self) -> Result<Vec<String>, WalletError> {
        let accounts = self.provider.request_accounts().await.map_err(|e| {
            if e.is_user_rejection() {
                WalletError::UserRejected
            } else {
                WalletError::provider(e.message())
            }
        })?;

        if accounts.is_empty() {
            return Err(WalletError::NoAccounts);
        }
        Ok(accounts)
    }

    /// Active chain id.
    pub async fn get_network(&self) -> Result<u64, WalletError> {
        self.provider
            .chain_id()
            .await
            .map_err(|e| WalletError::provider(e.message()))
    }

    /// Signer for `address`.
    pub fn get_signer(&self, address: &str) -> WalletSigner {
        WalletSigner {
            provider: self.provider.clone(),
            address: address.to_string(),
        }
    }
}

/// Signs messages with one account.
pub struct WalletSigner {
    provider: Arc<dyn EthereumProvider>,
    address: String,
}

impl WalletSigner {
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Request a signature over `text`.
    pub async fn sign_message(&self, text: &str) -> Result<String, WalletError> {
        self.provider
            .personal_sign(&self.address, text)
            .await
            .map_err(|e| {
                if e.is_user_rejection() {
                    WalletError::SignatureRejected
                } else {
                    WalletError::signature_failed(e.to_string())
                }
            })
    }
}
