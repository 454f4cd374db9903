// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Observable wallet state.

use serde::{Deserialize, Serialize};

use crate::blockchain::{network_label, short_address};

/// Wallet state owned by the connection state machine.
///
/// `Default` is the initial, disconnected state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletState {
    /// Account as reported by the provider
    pub address: Option<String>,
    /// Active chain id
    pub chain_id: Option<u64>,
    /// Set only together with `address` and `chain_id`
    pub is_connected: bool,
    /// A connect or sign operation is outstanding
    pub is_loading: bool,
    /// Message of the last failed operation
    pub error: Option<String>,
}

impl WalletState {
    /// Connected account and chain, if the session is connected.
    pub fn connected_account(&self) -> Option<(&str, u64)> {
        if !self.is_connected {
            return None;
        }
        match (&self.address, self.chain_id) {
            (Some(address), Some(chain_id)) => Some((address.as_str(), chain_id)),
            _ => None,
        }
    }

    /// Render-ready view of this state.
    pub fn view(&self) -> WalletView {
        WalletView {
            short_address: self.address.as_deref().map(short_address),
            network_label: self.chain_id.map(network_label),
            is_connected: self.is_connected,
            is_loading: self.is_loading,
            error: self.error.clone(),
        }
    }
}

/// What a presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletView {
    pub short_address: Option<String>,
    pub network_label: Option<String>,
    pub is_connected: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_disconnected() {
        let state = WalletState::default();
        assert_eq!(state.address, None);
        assert_eq!(state.chain_id, None);
        assert!(!state.is_connected);
        assert!(!state.is_loading);
        assert_eq!(state.error, None);
        assert_eq!(state.connected_account(), None);
    }

    #[test]
    fn view_formats_connected_state() {
        let state = WalletState {
            address: Some("0xABCDEF1234567890000000000000000000000012AB".into()),
            chain_id: Some(1),
            is_connected: true,
            ..Default::default()
        };
        let view = state.view();
        assert_eq!(view.short_address.as_deref(), Some("0xABCD...12AB"));
        assert_eq!(view.network_label.as_deref(), Some("Ethereum Mainnet"));

        let mumbai = WalletState {
            chain_id: Some(80001),
            ..state.clone()
        };
        assert_eq!(mumbai.view().network_label.as_deref(), Some("Mumbai"));

        let unknown = WalletState {
            chain_id: Some(999),
            ..state
        };
        assert_eq!(unknown.view().network_label.as_deref(), Some("Chain 999"));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(WalletState::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "address": null,
                "chainId": null,
                "isConnected": false,
                "isLoading": false,
                "error": null,
            })
        );
    }
}
