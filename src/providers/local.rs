// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process provider backed by a local alloy signer.
//!
//! Stands in for a browser wallet during development: accounts are exposed
//! on request, signatures are produced with the held key, and the wallet-side
//! actions a user would take (switching chain, revoking access) are available
//! as methods that emit the matching notifications.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use alloy::primitives::Address;
use alloy::signers::{local::PrivateKeySigner, Signer};
use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{
    EthereumProvider, ProviderError, ProviderEvent, EVENT_CHANNEL_CAPACITY, UNAUTHORIZED_CODE,
};

/// Provider that signs with a key held in this process.
pub struct LocalKeyProvider {
    signer: PrivateKeySigner,
    chain_id: AtomicU64,
    exposed: AtomicBool,
    events: broadcast::Sender<ProviderEvent>,
}

impl LocalKeyProvider {
    pub fn new(signer: PrivateKeySigner, chain_id: u64) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            signer,
            chain_id: AtomicU64::new(chain_id),
            exposed: AtomicBool::new(false),
            events,
        }
    }

    /// Provider with a freshly generated key.
    pub fn random(chain_id: u64) -> Self {
        Self::new(PrivateKeySigner::random(), chain_id)
    }

    /// The account this provider signs for.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Switch the wallet to another chain and notify subscribers.
    pub fn switch_chain(&self, chain_id: u64) {
        let previous = self.chain_id.swap(chain_id, Ordering::SeqCst);
        if previous != chain_id {
            tracing::debug!(from = previous, to = chain_id, "Local wallet switched chain");
            self.emit(ProviderEvent::ChainChanged(chain_id));
        }
    }

    /// Revoke account access, as a user would from the wallet UI.
    pub fn revoke(&self) {
        if self.exposed.swap(false, Ordering::SeqCst) {
            self.emit(ProviderEvent::AccountsChanged(Vec::new()));
        }
    }

    fn emit(&self, event: ProviderEvent) {
        // No receivers is fine: nobody is mounted.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl EthereumProvider for LocalKeyProvider {
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        self.exposed.store(true, Ordering::SeqCst);
        Ok(vec![self.address().to_checksum(None)])
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        Ok(self.chain_id.load(Ordering::SeqCst))
    }

    async fn personal_sign(&self, address: &str, message: &str) -> Result<String, ProviderError> {
        let requested: Address = address
            .parse()
            .map_err(|_| {
                ProviderError::rpc(UNAUTHORIZED_CODE, format!("Unknown account {address}"))
            })?;

        if !self.exposed.load(Ordering::SeqCst) || requested != self.address() {
            return Err(ProviderError::rpc(
                UNAUTHORIZED_CODE,
                format!("Account {address} has not been authorized"),
            ));
        }

        let signature = self
            .signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| ProviderError::rpc(-32603, e.to_string()))?;

        Ok(alloy::hex::encode_prefixed(signature.as_bytes()))
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Signature;

    #[tokio::test]
    async fn signs_for_exposed_account() {
        let provider = LocalKeyProvider::random(1);
        let accounts = provider.request_accounts().await.unwrap();
        assert_eq!(accounts.len(), 1);

        let signature = provider.personal_sign(&accounts[0], "hello").await.unwrap();
        assert!(signature.starts_with("0x"));
        assert_eq!(signature.len(), 2 + 65 * 2);

        let bytes = alloy::hex::decode(&signature).unwrap();
        let parsed = Signature::try_from(bytes.as_slice()).unwrap();
        let recovered = parsed.recover_address_from_msg("hello").unwrap();
        assert_eq!(recovered, provider.address());
    }

    #[tokio::test]
    async fn refuses_before_accounts_are_requested() {
        let provider = LocalKeyProvider::random(1);
        let address = provider.address().to_checksum(None);
        let err = provider.personal_sign(&address, "hello").await.unwrap_err();
        assert!(matches!(err, ProviderError::Rpc { code: UNAUTHORIZED_CODE, .. }));
    }

    #[tokio::test]
    async fn switch_chain_notifies_once() {
        let provider = LocalKeyProvider::random(1);
        let mut events = provider.subscribe();

        provider.switch_chain(1);
        provider.switch_chain(137);

        assert_eq!(events.recv().await.unwrap(), ProviderEvent::ChainChanged(137));
        assert!(events.try_recv().is_err());
        assert_eq!(provider.chain_id().await.unwrap(), 137);
    }

    #[tokio::test]
    async fn revoke_emits_empty_accounts() {
        let provider = LocalKeyProvider::random(1);
        let mut events = provider.subscribe();
        provider.request_accounts().await.unwrap();

        provider.revoke();
        assert_eq!(
            events.recv().await.unwrap(),
            ProviderEvent::AccountsChanged(Vec::new())
        );
    }
}
