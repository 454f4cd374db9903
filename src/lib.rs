// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! SIWE Connect - Sign-In With Ethereum session core
//!
//! This crate connects an injected Ethereum provider, builds a SIWE
//! challenge for the connected account and collects the wallet signature,
//! tracking connection and sign-in status for a presentation layer to render.
//!
//! ## Modules
//!
//! - `siwe` - Challenge message construction
//! - `providers` - Injected provider trait and implementations
//! - `wallet` - Provider adapter and connection state machine
//! - `auth` - Sign-in status controller
//! - `blockchain` - Network labels, address formatting, key loading

pub mod auth;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod providers;
pub mod siwe;
pub mod state;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;
