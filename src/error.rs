// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet session errors.
//!
//! Every failure of a connect or sign operation ends up as a [`WalletError`].
//! The connection state machine never hands these to callers directly: it
//! renders them with `Display` into the single `error` field of the wallet
//! state, so the `#[error]` strings below are user-facing text.

/// Fallback message for connect failures that carry no text of their own.
pub const CONNECT_FAILED_MESSAGE: &str = "Failed to connect wallet";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    /// No injected provider is present. The message depends on the wallet
    /// variant that was requested.
    #[error("{0}")]
    ProviderUnavailable(String),

    /// The user declined the account access request.
    #[error("User rejected the connection request")]
    UserRejected,

    /// The provider granted access but exposed no account.
    #[error("No accounts returned by wallet")]
    NoAccounts,

    /// The user declined the signature request.
    #[error("Signature rejected by user")]
    SignatureRejected,

    /// Any other signing failure. `reason` is kept for logs only.
    #[error("Failed to sign message")]
    SignatureFailed { reason: String },

    /// Sign attempted without a prior successful connect.
    #[error("Wallet not connected")]
    NotConnected,

    /// Any other provider failure while connecting.
    #[error("{0}")]
    Provider(String),
}

impl WalletError {
    /// Build a connect failure from a provider message, falling back to
    /// [`CONNECT_FAILED_MESSAGE`] when the message is empty.
    pub fn provider(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self::Provider(CONNECT_FAILED_MESSAGE.to_string())
        } else {
            Self::Provider(message)
        }
    }

    pub fn signature_failed(reason: impl Into<String>) -> Self {
        Self::SignatureFailed {
            reason: reason.into(),
        }
    }

    /// Short machine-readable code, used as a structured log field.
    pub fn error_code(&self) -> &'static str {
        match self {
            WalletError::ProviderUnavailable(_) => "provider_unavailable",
            WalletError::UserRejected => "user_rejected",
            WalletError::NoAccounts => "no_accounts",
            WalletError::SignatureRejected => "signature_rejected",
            WalletError::SignatureFailed { .. } => "signature_failed",
            WalletError::NotConnected => "not_connected",
            WalletError::Provider(_) => "provider_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_facing_messages() {
        assert_eq!(
            WalletError::SignatureRejected.to_string(),
            "Signature rejected by user"
        );
        assert_eq!(
            WalletError::signature_failed("rpc timeout").to_string(),
            "Failed to sign message"
        );
        assert_eq!(WalletError::NotConnected.to_string(), "Wallet not connected");
        assert_eq!(
            WalletError::ProviderUnavailable("MetaMask is not installed".into()).to_string(),
            "MetaMask is not installed"
        );
    }

    #[test]
    fn empty_provider_message_falls_back() {
        assert_eq!(WalletError::provider("").to_string(), CONNECT_FAILED_MESSAGE);
        assert_eq!(WalletError::provider("   ").to_string(), CONNECT_FAILED_MESSAGE);
        assert_eq!(
            WalletError::provider("internal JSON-RPC error").to_string(),
            "internal JSON-RPC error"
        );
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(WalletError::UserRejected.error_code(), "user_rejected");
        assert_eq!(
            WalletError::signature_failed("x").error_code(),
            "signature_failed"
        );
        assert_eq!(WalletError::NotConnected.error_code(), "not_connected");
    }
}
