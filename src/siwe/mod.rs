// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign-In With Ethereum challenge construction.
//!
//! A challenge is built fresh for every sign attempt from the page context
//! (host and origin), the connected account and chain, a random nonce and
//! the current time. Challenges are never cached or reused.

pub mod message;

pub use message::{
    generate_nonce, recover_signer, ChallengeParseError, MessageBuilder, PageContext, RecoverError,
    SiweChallenge, DEFAULT_STATEMENT, NONCE_LENGTH, SIWE_VERSION,
};

use serde::{Deserialize, Serialize};

/// Result of a successful sign: the payload a verifying backend would receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedChallenge {
    /// The exact challenge text that was signed
    pub message: String,
    /// 0x-prefixed signature as returned by the wallet
    pub signature: String,
    /// Account that signed
    pub address: String,
}
