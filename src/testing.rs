// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scripted provider for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{broadcast, Notify};

use crate::providers::{EthereumProvider, ProviderError, ProviderEvent, EVENT_CHANNEL_CAPACITY};

#[derive(Default)]
struct Script {
    accounts: Vec<String>,
    chain_id: u64,
    accounts_error: Option<ProviderError>,
    sign_error: Option<ProviderError>,
    sign_gate: Option<Arc<Notify>>,
    signed: Vec<(String, String)>,
}

/// Provider whose answers are set by the test.
pub struct ScriptedProvider {
    script: Mutex<Script>,
    account_requests: AtomicUsize,
    events: broadcast::Sender<ProviderEvent>,
}

impl ScriptedProvider {
    pub fn new(accounts: &[&str], chain_id: u64) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            script: Mutex::new(Script {
                accounts: accounts.iter().map(|a| a.to_string()).collect(),
                chain_id,
                ..Default::default()
            }),
            account_requests: AtomicUsize::new(0),
            events,
        }
    }

    /// Answer account requests with `accounts` from now on.
    pub fn set_accounts(&self, accounts: &[&str]) {
        let mut script = self.script.lock().unwrap();
        script.accounts = accounts.iter().map(|a| a.to_string()).collect();
        script.accounts_error = None;
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.script.lock().unwrap().chain_id = chain_id;
    }

    /// Fail account requests with `err` until `set_accounts` is called.
    pub fn fail_accounts(&self, err: ProviderError) {
        self.script.lock().unwrap().accounts_error = Some(err);
    }

    /// Fail signing with `err` until `succeed_signing` is called.
    pub fn fail_signing(&self, err: ProviderError) {
        self.script.lock().unwrap().sign_error = Some(err);
    }

    pub fn succeed_signing(&self) {
        self.script.lock().unwrap().sign_error = None;
    }

    /// Make the next signature wait until the returned `Notify` fires.
    pub fn pause_signing(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.script.lock().unwrap().sign_gate = Some(gate.clone());
        gate
    }

    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    pub fn account_requests(&self) -> usize {
        self.account_requests.load(Ordering::SeqCst)
    }

    /// `(address, message)` pairs signed so far.
    pub fn signed(&self) -> Vec<(String, String)> {
        self.script.lock().unwrap().signed.clone()
    }

    pub fn listeners(&self) -> usize {
        self.events.receiver_count()
    }
}

#[async_trait]
impl EthereumProvider for ScriptedProvider {
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        self.account_requests.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().unwrap();
        match &script.accounts_error {
            Some(err) => Err(err.clone()),
            None => Ok(script.accounts.clone()),
        }
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        Ok(self.script.lock().unwrap().chain_id)
    }

    async fn personal_sign(&self, address: &str, message: &str) -> Result<String, ProviderError> {
        let gate = self.script.lock().unwrap().sign_gate.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut script = self.script.lock().unwrap();
        if let Some(err) = &script.sign_error {
            return Err(err.clone());
        }
        script.signed.push((address.to_string(), message.to_string()));
        Ok(format!("0x{:0>130x}", script.signed.len()))
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
