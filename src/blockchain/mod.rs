// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain-level helpers shared by the wallet session.
//!
//! This module provides functionality for:
//! - Resolving chain ids to display labels
//! - Shortening account addresses for display
//! - Loading local signing keys (hex or PEM)

pub mod signing;
pub mod types;

pub use signing::{signer_from_hex, signer_from_pem, KeyError};
pub use types::*;
