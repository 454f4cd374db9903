// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Injected Ethereum Providers
//!
//! The wallet session talks to exactly one external capability: an
//! EIP-1193-style provider that can surface accounts, report the active
//! chain, sign messages, and notify about account or chain changes.
//!
//! [`EthereumProvider`] is that capability. Implementations:
//!
//! - [`local::LocalKeyProvider`] - signs with an in-process alloy key
//! - [`rpc::JsonRpcProvider`] - forwards requests to a wallet JSON-RPC endpoint
//!
//! Provider failures surface as [`ProviderError`]. A JSON-RPC error with code
//! [`USER_REJECTED_CODE`] means the user declined the request in the wallet UI.

pub mod local;
pub mod rpc;

use async_trait::async_trait;
use tokio::sync::broadcast;

pub use local::LocalKeyProvider;
pub use rpc::JsonRpcProvider;

/// EIP-1193 "User Rejected Request".
pub const USER_REJECTED_CODE: i64 = 4001;

/// EIP-1193 "Unauthorized": the account is not available to the caller.
pub const UNAUTHORIZED_CODE: i64 = 4100;

/// Capacity of each provider's notification channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Provider-driven notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// `accountsChanged`: the accounts now exposed, possibly none.
    AccountsChanged(Vec<String>),
    /// `chainChanged`: the newly active chain id.
    ChainChanged(u64),
}

/// Errors reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// JSON-RPC style error returned by the wallet.
    #[error("{message}")]
    Rpc { code: i64, message: String },

    /// The wallet could not be reached or answered garbage.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ProviderError {
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
        }
    }

    pub fn user_rejected() -> Self {
        Self::rpc(USER_REJECTED_CODE, "User rejected the request.")
    }

    /// True when the wallet reported that the user declined the request.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, ProviderError::Rpc { code, .. } if *code == USER_REJECTED_CODE)
    }

    /// The provider-reported message, empty for transport failures without text.
    pub fn message(&self) -> &str {
        match self {
            ProviderError::Rpc { message, .. } => message,
            ProviderError::Transport(message) => message,
        }
    }
}

/// The injected wallet capability.
#[async_trait]
pub trait EthereumProvider: Send + Sync {
    /// `eth_requestAccounts`: ask the wallet to expose its accounts.
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError>;

    /// `eth_chainId`: the chain the wallet is currently on.
    async fn chain_id(&self) -> Result<u64, ProviderError>;

    /// `personal_sign`: EIP-191 signature over `message` by `address`,
    /// returned as a 0x-prefixed hex string.
    async fn personal_sign(&self, address: &str, message: &str) -> Result<String, ProviderError>;

    /// Subscribe to `accountsChanged` / `chainChanged`. Dropping the
    /// receiver removes the listener.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}
