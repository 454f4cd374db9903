// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Connection State Machine
//!
//! ```text
//!  disconnected ──connect──▶ connecting ──ok──▶ connected
//!        ▲                       │                  │
//!        └─────────failure───────┘                  │
//!        └──────disconnect / accountsChanged([])────┘
//! ```
//!
//! The states are carried by the `is_connected` / `is_loading` flags of
//! [`WalletState`]. Failures never escape an operation: they are rendered
//! into `WalletState::error`, which every new operation clears first.
//!
//! ## Provider notifications
//!
//! [`WalletConnection::mount`] subscribes to the provider for as long as the
//! returned [`ProviderSubscription`] lives:
//!
//! - `accountsChanged([])` disconnects.
//! - `accountsChanged([a, ..])` replaces the connected address with `a`.
//! - `chainChanged` reloads: the session is reset and the reload generation
//!   is bumped so the host can rebuild from scratch.
//!
//! ## Concurrency
//!
//! Nothing serializes operations; callers are expected to hold off while
//! `is_loading` is set. Provider calls have no timeout.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::adapter::{ProviderAdapter, ProviderHandle, WalletKind};
use super::state::WalletState;
use crate::error::WalletError;
use crate::providers::ProviderEvent;
use crate::siwe::{MessageBuilder, SignedChallenge};

/// Owner of the wallet state and the provider handle.
pub struct WalletConnection {
    adapter: ProviderAdapter,
    messages: MessageBuilder,
    state: watch::Sender<WalletState>,
    handle: Mutex<Option<ProviderHandle>>,
    reloads: watch::Sender<u64>,
}

impl WalletConnection {
    pub fn new(adapter: ProviderAdapter, messages: MessageBuilder) -> Self {
        Self {
            adapter,
            messages,
            state: watch::Sender::new(WalletState::default()),
            handle: Mutex::new(None),
            reloads: watch::Sender::new(0),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> WalletState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    pub fn watch_state(&self) -> watch::Receiver<WalletState> {
        self.state.subscribe()
    }

    /// Receiver for the reload generation, bumped on every chain change.
    pub fn watch_reloads(&self) -> watch::Receiver<u64> {
        self.reloads.subscribe()
    }

    pub fn messages(&self) -> &MessageBuilder {
        &self.messages
    }

    /// Connect the given wallet variant.
    pub async fn connect(&self, kind: WalletKind) {
        let operation_id = Uuid::new_v4();
        debug!(%operation_id, wallet = %kind, "Connecting wallet");

        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        match self.open_session(kind).await {
            Ok((handle, address, chain_id)) => {
                self.set_handle(Some(handle));
                info!(%operation_id, wallet = %kind, %address, chain_id, "Wallet connected");
                self.state.send_modify(|s| {
                    s.address = Some(address);
                    s.chain_id = Some(chain_id);
                    s.is_connected = true;
                    s.is_loading = false;
                });
            }
            Err(e) => {
                self.set_handle(None);
                warn!(
                    %operation_id,
                    wallet = %kind,
                    error_code = e.error_code(),
                    error = %e,
                    "Wallet connection failed"
                );
                self.state.send_modify(|s| {
                    s.address = None;
                    s.chain_id = None;
                    s.is_connected = false;
                    s.is_loading = false;
                    s.error = Some(e.to_string());
                });
            }
        }
    }

    async fn open_session(
        &self,
        kind: WalletKind,
    ) -> Result<(ProviderHandle, String, u64), WalletError> {
        let handle = self.adapter.open(kind)?;
        let accounts = handle.request_accounts().await?;
        let chain_id = handle.get_network().await?;
        let address = accounts
            .into_iter()
            .next()
            .ok_or(WalletError::NoAccounts)?;
        Ok((handle, address, chain_id))
    }

    /// Sign a fresh SIWE challenge with the connected account.
    ///
    /// Returns `None` on any failure, with the reason in `WalletState::error`.
    pub async fn sign_message(&self) -> Option<SignedChallenge> {
        let Some((handle, address, chain_id)) = self.signing_context() else {
            warn!("Sign requested without a connected wallet");
            self.state
                .send_modify(|s| s.error = Some(WalletError::NotConnected.to_string()));
            return None;
        };

        let operation_id = Uuid::new_v4();
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        let challenge = self.messages.build(&address, chain_id);
        debug!(%operation_id, %address, chain_id, nonce = %challenge.nonce, "Requesting signature");
        let message = challenge.to_string();

        match handle.get_signer(&address).sign_message(&message).await {
            Ok(signature) => {
                info!(%operation_id, %address, %signature, "Message signed");
                self.state.send_modify(|s| s.is_loading = false);
                Some(SignedChallenge {
                    message,
                    signature,
                    address,
                })
            }
            Err(e) => {
                warn!(
                    %operation_id,
                    %address,
                    error_code = e.error_code(),
                    error = ?e,
                    "Signing failed"
                );
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.error = Some(e.to_string());
                });
                None
            }
        }
    }

    fn signing_context(&self) -> Option<(ProviderHandle, String, u64)> {
        let handle = self.current_handle()?;
        let state = self.state.borrow();
        let (address, chain_id) = state.connected_account()?;
        Some((handle, address.to_string(), chain_id))
    }

    /// Reset to the initial state and release the provider handle.
    ///
    /// Purely local: wallets have no remote session to tear down.
    pub fn disconnect(&self) {
        self.set_handle(None);
        self.state.send_if_modified(|s| {
            let changed = *s != WalletState::default();
            *s = WalletState::default();
            changed
        });
        info!("Wallet disconnected");
    }

    fn reload(&self, chain_id: u64) {
        info!(chain_id, "Chain changed, reloading session");
        self.set_handle(None);
        self.state.send_replace(WalletState::default());
        self.reloads.send_modify(|generation| *generation += 1);
    }

    fn handle_provider_event(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.into_iter().next() {
                None => {
                    info!("Wallet exposed no accounts, disconnecting");
                    self.disconnect();
                }
                Some(address) => {
                    self.state.send_if_modified(|s| {
                        if !s.is_connected || s.address.as_deref() == Some(address.as_str()) {
                            return false;
                        }
                        info!(%address, "Active account changed");
                        s.address = Some(address);
                        true
                    });
                }
            },
            ProviderEvent::ChainChanged(chain_id) => self.reload(chain_id),
        }
    }

    /// Subscribe to provider notifications for the lifetime of the returned
    /// guard. Without an injected provider the guard is inert.
    pub fn mount(self: &Arc<Self>) -> ProviderSubscription {
        let Some(events) = self.adapter.subscribe() else {
            debug!("No injected provider, skipping event subscription");
            return ProviderSubscription::inert();
        };

        let shutdown = CancellationToken::new();
        let task = tokio::spawn(listen(Arc::downgrade(self), events, shutdown.clone()));
        ProviderSubscription::new(shutdown, task)
    }

    fn current_handle(&self) -> Option<ProviderHandle> {
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_handle(&self, handle: Option<ProviderHandle>) {
        *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = handle;
    }
}

async fn listen(
    connection: Weak<WalletConnection>,
    mut events: broadcast::Receiver<ProviderEvent>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            received = events.recv() => match received {
                Ok(event) => {
                    let Some(connection) = connection.upgrade() else { return };
                    connection.handle_provider_event(event);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Provider notifications dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return,
            },
        }
    }
}

/// Guard over a provider event subscription (or a listener derived from
/// one). Dropping it removes the listener.
pub struct ProviderSubscription {
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ProviderSubscription {
    pub(crate) fn new(shutdown: CancellationToken, task: JoinHandle<()>) -> Self {
        Self {
            shutdown,
            task: Some(task),
        }
    }

    fn inert() -> Self {
        Self {
            shutdown: CancellationToken::new(),
            task: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop listening and wait for the listener to finish.
    pub async fn unmount(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ProviderSubscription {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
