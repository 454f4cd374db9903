// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auth status controller.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::status::AuthStatus;
use crate::siwe::SignedChallenge;
use crate::wallet::{ProviderSubscription, WalletConnection, WalletKind, WalletState};

/// When the sign step runs after a connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignInMode {
    /// Sign right after the wallet connects
    #[default]
    Automatic,
    /// Sign only when asked
    Manual,
}

impl SignInMode {
    /// Parse a mode name (case-insensitive).
    pub fn from_name(s: &str) -> Option<SignInMode> {
        match s.trim().to_lowercase().as_str() {
            "automatic" | "auto" => Some(SignInMode::Automatic),
            "manual" => Some(SignInMode::Manual),
            _ => None,
        }
    }
}

/// Drives `idle → signing → authenticated` over a wallet connection.
pub struct AuthController {
    connection: Arc<WalletConnection>,
    mode: SignInMode,
    status: watch::Sender<AuthStatus>,
    credentials: Mutex<Option<SignedChallenge>>,
}

impl AuthController {
    pub fn new(connection: Arc<WalletConnection>, mode: SignInMode) -> Self {
        Self {
            connection,
            mode,
            status: watch::Sender::new(AuthStatus::Idle),
            credentials: Mutex::new(None),
        }
    }

    pub fn connection(&self) -> &Arc<WalletConnection> {
        &self.connection
    }

    pub fn mode(&self) -> SignInMode {
        self.mode
    }

    /// Current status.
    ///
    /// An authentication whose address no longer matches the connected
    /// account reads as `idle`, even when nothing is mounted.
    pub fn status(&self) -> AuthStatus {
        self.reconcile();
        *self.status.borrow()
    }

    /// Receiver that observes every status change. Wallet-driven resets
    /// only reach it while [`AuthController::mount`] is held.
    pub fn watch_status(&self) -> watch::Receiver<AuthStatus> {
        self.status.subscribe()
    }

    /// Follow the wallet state for the lifetime of the returned guard,
    /// dropping back to `idle` as soon as the connection no longer backs the
    /// current status.
    pub fn mount(self: &Arc<Self>) -> ProviderSubscription {
        let shutdown = CancellationToken::new();
        let changes = self.connection.watch_state();
        let task = tokio::spawn(follow_wallet(Arc::downgrade(self), changes, shutdown.clone()));
        ProviderSubscription::new(shutdown, task)
    }

    /// The signed triple of the current authentication.
    pub fn credentials(&self) -> Option<SignedChallenge> {
        self.reconcile();
        self.lock_credentials().clone()
    }

    /// Connect, then sign in if the mode is automatic and the connect
    /// succeeded.
    pub async fn connect(&self, kind: WalletKind) -> AuthStatus {
        self.connection.connect(kind).await;

        if self.mode == SignInMode::Automatic && self.connection.state().is_connected {
            self.authenticate().await
        } else {
            self.status()
        }
    }

    /// Sign a fresh challenge. Failure returns to `idle` and leaves the
    /// wallet connected.
    pub async fn authenticate(&self) -> AuthStatus {
        *self.lock_credentials() = None;
        self.status.send_replace(AuthStatus::Signing);

        match self.connection.sign_message().await {
            Some(signed) if self.is_current(&signed) => {
                // Verification would happen server-side; there is none here.
                info!(
                    address = %signed.address,
                    signature = %signed.signature,
                    "Sign-in signature collected"
                );
                *self.lock_credentials() = Some(signed);
                self.status.send_replace(AuthStatus::Authenticated);
            }
            Some(signed) => {
                info!(
                    address = %signed.address,
                    "Wallet changed while signing, signature discarded"
                );
                self.status.send_replace(AuthStatus::Idle);
            }
            None => {
                info!("Sign-in not completed, back to idle");
                self.status.send_replace(AuthStatus::Idle);
            }
        }
        self.status()
    }

    /// Disconnect the wallet and drop any authentication.
    pub fn disconnect(&self) {
        self.connection.disconnect();
        *self.lock_credentials() = None;
        self.status.send_if_modified(|status| {
            let changed = *status != AuthStatus::Idle;
            *status = AuthStatus::Idle;
            changed
        });
    }

    fn is_current(&self, signed: &SignedChallenge) -> bool {
        self.connection
            .state()
            .connected_account()
            .is_some_and(|(address, _)| signed.address == address)
    }

    fn reconcile(&self) {
        let status = *self.status.borrow();
        match status {
            AuthStatus::Idle => {}
            AuthStatus::Signing => {
                if !self.connection.state().is_connected {
                    info!("Wallet disconnected while signing, back to idle");
                    self.status.send_replace(AuthStatus::Idle);
                }
            }
            AuthStatus::Authenticated => {
                let mut credentials = self.lock_credentials();
                let still_valid = credentials
                    .as_ref()
                    .is_some_and(|signed| self.is_current(signed));
                if !still_valid {
                    info!("Connected account changed, authentication dropped");
                    *credentials = None;
                    self.status.send_replace(AuthStatus::Idle);
                }
            }
        }
    }

    fn lock_credentials(&self) -> std::sync::MutexGuard<'_, Option<SignedChallenge>> {
        self.credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

async fn follow_wallet(
    auth: Weak<AuthController>,
    mut changes: watch::Receiver<WalletState>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            changed = changes.changed() => {
                if changed.is_err() {
                    return;
                }
                let Some(auth) = auth.upgrade() else { return };
                auth.reconcile();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::providers::{ProviderError, ProviderEvent};
    use crate::siwe::{MessageBuilder, PageContext};
    use crate::testing::ScriptedProvider;
    use crate::wallet::{ProviderAdapter, WalletState};

    const ADDRESS: &str = "0x00000000000000000000000000000000000000a1";

    fn controller(mode: SignInMode) -> (Arc<ScriptedProvider>, AuthController) {
        let provider = Arc::new(ScriptedProvider::new(&[ADDRESS], 1));
        let connection = Arc::new(WalletConnection::new(
            ProviderAdapter::new(provider.clone()),
            MessageBuilder::new(PageContext::parse("https://app.example.com").unwrap()),
        ));
        (provider, AuthController::new(connection, mode))
    }

    #[test]
    fn sign_in_mode_parses_names() {
        assert_eq!(SignInMode::from_name("Manual"), Some(SignInMode::Manual));
        assert_eq!(SignInMode::from_name("auto"), Some(SignInMode::Automatic));
        assert_eq!(SignInMode::from_name("later"), None);
    }

    #[tokio::test]
    async fn automatic_mode_signs_after_connect() {
        let (provider, auth) = controller(SignInMode::Automatic);
        assert_eq!(auth.status(), AuthStatus::Idle);

        assert_eq!(auth.connect(WalletKind::MetaMask).await, AuthStatus::Authenticated);
        let credentials = auth.credentials().unwrap();
        assert_eq!(credentials.address, ADDRESS);
        assert!(credentials.message.contains("Chain ID: 1"));
        assert_eq!(provider.signed().len(), 1);
    }

    #[tokio::test]
    async fn manual_mode_waits_for_user() {
        let (provider, auth) = controller(SignInMode::Manual);

        assert_eq!(auth.connect(WalletKind::MetaMask).await, AuthStatus::Idle);
        assert!(auth.connection().state().is_connected);
        assert!(provider.signed().is_empty());

        assert_eq!(auth.authenticate().await, AuthStatus::Authenticated);
    }

    #[tokio::test]
    async fn failed_connect_skips_signing() {
        let (provider, auth) = controller(SignInMode::Automatic);
        provider.fail_accounts(ProviderError::user_rejected());

        assert_eq!(auth.connect(WalletKind::MetaMask).await, AuthStatus::Idle);
        assert!(provider.signed().is_empty());
    }

    #[tokio::test]
    async fn rejected_signature_returns_to_idle_but_stays_connected() {
        let (provider, auth) = controller(SignInMode::Automatic);
        provider.fail_signing(ProviderError::user_rejected());

        assert_eq!(auth.connect(WalletKind::MetaMask).await, AuthStatus::Idle);
        let state = auth.connection().state();
        assert!(state.is_connected);
        assert_eq!(state.error.as_deref(), Some("Signature rejected by user"));
        assert_eq!(auth.credentials(), None);

        provider.succeed_signing();
        assert_eq!(auth.authenticate().await, AuthStatus::Authenticated);
        assert_eq!(auth.connection().state().error, None);
    }

    #[tokio::test]
    async fn status_is_signing_while_pending() {
        let (provider, auth) = controller(SignInMode::Manual);
        let auth = Arc::new(auth);
        auth.connect(WalletKind::MetaMask).await;

        let gate = provider.pause_signing();
        let mut rx = auth.watch_status();
        let pending = tokio::spawn({
            let auth = auth.clone();
            async move { auth.authenticate().await }
        });

        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("status change")
            .unwrap();
        assert_eq!(*rx.borrow_and_update(), AuthStatus::Signing);

        gate.notify_one();
        assert_eq!(pending.await.unwrap(), AuthStatus::Authenticated);
    }

    #[tokio::test]
    async fn authenticate_without_connection_stays_idle() {
        let (_, auth) = controller(SignInMode::Manual);
        assert_eq!(auth.authenticate().await, AuthStatus::Idle);
        assert_eq!(
            auth.connection().state().error.as_deref(),
            Some("Wallet not connected")
        );
    }

    #[tokio::test]
    async fn disconnect_resets_authentication() {
        let (_, auth) = controller(SignInMode::Automatic);
        auth.connect(WalletKind::MetaMask).await;
        assert!(auth.status().is_authenticated());

        auth.disconnect();
        assert_eq!(auth.status(), AuthStatus::Idle);
        assert_eq!(auth.credentials(), None);
        assert_eq!(auth.connection().state(), WalletState::default());

        auth.disconnect();
        assert_eq!(auth.status(), AuthStatus::Idle);
    }

    #[tokio::test]
    async fn provider_disconnect_drops_authentication() {
        let (provider, auth) = controller(SignInMode::Automatic);
        let _subscription = auth.connection().mount();
        auth.connect(WalletKind::MetaMask).await;
        assert!(auth.status().is_authenticated());

        let mut rx = auth.connection().watch_state();
        provider.emit(ProviderEvent::AccountsChanged(Vec::new()));
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("state change")
            .unwrap();

        assert_eq!(auth.status(), AuthStatus::Idle);
        assert_eq!(auth.credentials(), None);
    }

    #[tokio::test]
    async fn account_switch_drops_authentication() {
        let (provider, auth) = controller(SignInMode::Automatic);
        let _subscription = auth.connection().mount();
        auth.connect(WalletKind::WalletConnect).await;

        let mut rx = auth.connection().watch_state();
        provider.emit(ProviderEvent::AccountsChanged(vec!["0xb2".into()]));
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("state change")
            .unwrap();

        assert!(auth.connection().state().is_connected);
        assert_eq!(auth.status(), AuthStatus::Idle);
        assert_eq!(auth.authenticate().await, AuthStatus::Authenticated);
        assert_eq!(auth.credentials().unwrap().address, "0xb2");
    }

    #[tokio::test]
    async fn mounted_status_follows_wallet_disconnect() {
        let (provider, auth) = controller(SignInMode::Automatic);
        let auth = Arc::new(auth);
        let _events = auth.connection().mount();
        let _status = auth.mount();
        auth.connect(WalletKind::MetaMask).await;

        let mut rx = auth.watch_status();
        assert_eq!(*rx.borrow_and_update(), AuthStatus::Authenticated);

        provider.emit(ProviderEvent::AccountsChanged(Vec::new()));
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("status change")
            .unwrap();
        assert_eq!(*rx.borrow_and_update(), AuthStatus::Idle);
        assert!(!auth.connection().state().is_connected);
    }

    #[tokio::test]
    async fn disconnect_during_pending_signature_stays_idle() {
        let (provider, auth) = controller(SignInMode::Manual);
        let auth = Arc::new(auth);
        auth.connect(WalletKind::MetaMask).await;

        let gate = provider.pause_signing();
        let mut rx = auth.watch_status();
        let pending = tokio::spawn({
            let auth = auth.clone();
            async move { auth.authenticate().await }
        });
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("status change")
            .unwrap();
        assert_eq!(*rx.borrow_and_update(), AuthStatus::Signing);

        auth.disconnect();
        gate.notify_one();

        assert_eq!(pending.await.unwrap(), AuthStatus::Idle);
        assert_eq!(*rx.borrow(), AuthStatus::Idle);
        assert_eq!(auth.credentials(), None);
    }

    #[tokio::test]
    async fn unmounted_status_listener_stops() {
        let (_, auth) = controller(SignInMode::Manual);
        let auth = Arc::new(auth);
        let status = auth.mount();
        assert!(status.is_active());
        status.unmount().await;
    }
}
