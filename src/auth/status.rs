// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign-in status.

use serde::{Deserialize, Serialize};

/// Where the sign-in stands for the current session.
///
/// ```text
/// idle ──▶ signing ──▶ authenticated
///   ▲         │              │
///   └─failure─┘              │
///   └───────disconnect───────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    #[default]
    Idle,
    Signing,
    Authenticated,
}

impl AuthStatus {
    pub fn is_authenticated(&self) -> bool {
        *self == AuthStatus::Authenticated
    }
}

impl std::fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthStatus::Idle => write!(f, "idle"),
            AuthStatus::Signing => write!(f, "signing"),
            AuthStatus::Authenticated => write!(f, "authenticated"),
        }
    }
}
