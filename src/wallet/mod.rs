// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wallet Connection
//!
//! - `adapter` - mediates every call into the injected provider
//! - `state` - the observable wallet state and its display view
//! - `connection` - the connect / sign / disconnect state machine

pub mod adapter;
pub mod connection;
pub mod state;

pub use adapter::{ProviderAdapter, ProviderHandle, WalletKind, WalletSigner};
pub use connection::{ProviderSubscription, WalletConnection};
pub use state::{WalletState, WalletView};
