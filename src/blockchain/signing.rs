// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local signing key loading.
//!
//! The local provider signs with a key held in process. Keys are accepted
//! either as raw hex or as PEM (SEC1 or PKCS#8) and converted into an alloy
//! [`PrivateKeySigner`].

use alloy::signers::local::PrivateKeySigner;
use k256::SecretKey;

/// Errors raised while loading a signing key.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
}

/// Parse a private key from PEM format to hex string.
///
/// # Returns
/// * `Ok(String)` - Hex-encoded private key (64 characters, no 0x prefix)
/// * `Err(KeyError)` - If PEM parsing fails
pub fn pem_to_hex(pem_bytes: &[u8]) -> Result<String, KeyError> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| KeyError::InvalidPrivateKey(format!("Invalid UTF-8: {e}")))?;

    let pem = pem::parse(pem_str)
        .map_err(|e| KeyError::InvalidPrivateKey(format!("Invalid PEM: {e}")))?;

    // SEC1 first, PKCS#8 as fallback
    let secret_key = SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| parse_pkcs8_to_secret_key(pem.contents()))
        .map_err(|e| KeyError::InvalidPrivateKey(format!("Invalid key format: {e}")))?;

    Ok(alloy::hex::encode(secret_key.to_bytes()))
}

fn parse_pkcs8_to_secret_key(der: &[u8]) -> Result<SecretKey, String> {
    use k256::pkcs8::DecodePrivateKey;
    SecretKey::from_pkcs8_der(der).map_err(|e| e.to_string())
}

/// Create a signer from a hex private key, with or without `0x` prefix.
pub fn signer_from_hex(private_key_hex: &str) -> Result<PrivateKeySigner, KeyError> {
    let key_bytes = alloy::hex::decode(private_key_hex.trim())
        .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;

    PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))
}

/// Create a signer from a PEM-encoded private key.
pub fn signer_from_pem(pem_bytes: &[u8]) -> Result<PrivateKeySigner, KeyError> {
    let hex_key = pem_to_hex(pem_bytes)?;
    signer_from_hex(&hex_key)
}
