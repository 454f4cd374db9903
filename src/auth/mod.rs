// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Status
//!
//! Sign-in on top of a wallet connection.
//!
//! ## Auth Flow
//!
//! 1. The user connects a wallet (`WalletConnection::connect`)
//! 2. Once connected, the controller moves `idle → signing` and asks the
//!    connection to sign a fresh SIWE challenge
//!    - automatic mode: right after a successful connect
//!    - manual mode: when the user asks for it
//! 3. A signature moves `signing → authenticated`; a failure goes back to
//!    `idle` and leaves the wallet connected so the user can retry
//!
//! ## Security
//!
//! - The signed `{message, signature, address}` triple is only logged and
//!   kept in memory; nothing here verifies it
//! - The challenge nonce is not single-use; a verifying backend must issue
//!   and track its own

pub mod controller;
pub mod status;

pub use controller::{AuthController, SignInMode};
pub use status::AuthStatus;
