// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # JSON-RPC Wallet Provider
//!
//! Forwards EIP-1193 requests to a wallet that exposes a JSON-RPC endpoint
//! over HTTP (for example a desktop wallet listening on localhost).
//!
//! ## Notifications
//!
//! HTTP has no push channel, so `accountsChanged` / `chainChanged` are
//! synthesized by [`ChangeWatcher`]: a background task that polls
//! `eth_accounts` and `eth_chainId` and emits an event whenever either differs
//! from the previous sweep. It follows the same shutdown pattern as the other
//! background tasks, a `tokio_util::sync::CancellationToken`.

use std::borrow::Cow;
use std::time::Duration;

use alloy::{
    network::Ethereum,
    primitives::{Address, Bytes},
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
    transports::TransportError,
};
use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{EthereumProvider, ProviderError, ProviderEvent, EVENT_CHANNEL_CAPACITY};

/// HTTP provider type (with the default fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// Default interval between change-watcher sweeps.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Provider backed by a wallet JSON-RPC endpoint.
pub struct JsonRpcProvider {
    url: url::Url,
    provider: HttpProvider,
    events: broadcast::Sender<ProviderEvent>,
}

impl JsonRpcProvider {
    /// Create a provider for the given endpoint URL.
    pub fn new(rpc_url: &str) -> Result<Self, ProviderError> {
        let url: url::Url = rpc_url.parse().map_err(|e: url::ParseError| {
            ProviderError::Transport(format!("Invalid RPC URL: {e}"))
        })?;

        let provider = ProviderBuilder::new().connect_http(url.clone());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            url,
            provider,
            events,
        })
    }

    /// The endpoint this provider talks to.
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Spawn the change watcher. It runs until `shutdown` is cancelled.
    pub fn spawn_watcher(
        &self,
        poll_interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let watcher = ChangeWatcher {
            provider: self.provider.clone(),
            events: self.events.clone(),
            poll_interval,
        };
        tokio::spawn(watcher.run(shutdown))
    }
}

/// Map an alloy transport error onto the provider taxonomy, keeping the
/// JSON-RPC error code when the wallet returned one.
fn map_transport_error(err: TransportError) -> ProviderError {
    match err.as_error_resp() {
        Some(payload) => ProviderError::rpc(payload.code, payload.message.to_string()),
        None => ProviderError::Transport(err.to_string()),
    }
}

fn format_accounts(accounts: &[Address]) -> Vec<String> {
    accounts.iter().map(|a| a.to_checksum(None)).collect()
}

#[async_trait]
impl EthereumProvider for JsonRpcProvider {
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        let accounts: Vec<Address> = self
            .provider
            .raw_request(Cow::Borrowed("eth_requestAccounts"), ())
            .await
            .map_err(map_transport_error)?;
        Ok(format_accounts(&accounts))
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(map_transport_error)
    }

    async fn personal_sign(&self, address: &str, message: &str) -> Result<String, ProviderError> {
        let signer: Address = address
            .parse()
            .map_err(|e| ProviderError::rpc(-32602, format!("Invalid address {address}: {e}")))?;
        let data = alloy::hex::encode_prefixed(message.as_bytes());

        let signature: Bytes = self
            .provider
            .raw_request(Cow::Borrowed("personal_sign"), (data, signer))
            .await
            .map_err(map_transport_error)?;
        Ok(signature.to_string())
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

/// Last observed wallet snapshot.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Snapshot {
    accounts: Option<Vec<String>>,
    chain_id: Option<u64>,
}

impl Snapshot {
    /// Events implied by moving from `self` to `next`. The first sweep only
    /// records a baseline.
    fn diff(&self, next: &Snapshot) -> Vec<ProviderEvent> {
        let mut events = Vec::new();
        if let (Some(prev), Some(now)) = (&self.accounts, &next.accounts) {
            if prev != now {
                events.push(ProviderEvent::AccountsChanged(now.clone()));
            }
        }
        if let (Some(prev), Some(now)) = (self.chain_id, next.chain_id) {
            if prev != now {
                events.push(ProviderEvent::ChainChanged(now));
            }
        }
        events
    }
}

/// Background poller that turns wallet state changes into notifications.
struct ChangeWatcher {
    provider: HttpProvider,
    events: broadcast::Sender<ProviderEvent>,
    poll_interval: Duration,
}

impl ChangeWatcher {
    async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_ms = self.poll_interval.as_millis() as u64,
            "Wallet change watcher starting"
        );

        let mut last = Snapshot::default();
        loop {
            if shutdown.is_cancelled() {
                info!("Wallet change watcher shutting down");
                return;
            }

            match self.sweep().await {
                Ok(next) => {
                    for event in last.diff(&next) {
                        debug!(?event, "Wallet change detected");
                        let _ = self.events.send(event);
                    }
                    last = next;
                }
                Err(e) => warn!(error = %e, "Wallet change sweep failed, will retry"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Wallet change watcher shutting down");
                    return;
                }
            }
        }
    }

    async fn sweep(&self) -> Result<Snapshot, ProviderError> {
        let accounts = self
            .provider
            .get_accounts()
            .await
            .map_err(map_transport_error)?;
        let chain_id = self
            .provider
            .get_chain_id()
            .await
            .map_err(map_transport_error)?;

        Ok(Snapshot {
            accounts: Some(format_accounts(&accounts)),
            chain_id: Some(chain_id),
        })
    }
}
