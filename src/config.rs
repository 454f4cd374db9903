// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SIWE_ORIGIN` | Origin of the page requesting sign-in | `http://localhost:3000` |
//! | `SIWE_STATEMENT` | Statement line of the challenge | built-in sentence |
//! | `SIWE_SIGN_IN_MODE` | `automatic` or `manual` | `automatic` |
//! | `WALLET_RPC_URL` | Wallet JSON-RPC endpoint | unset |
//! | `WALLET_PRIVATE_KEY` | Hex key for the local provider | unset |
//! | `WALLET_PRIVATE_KEY_PEM_PATH` | PEM key file for the local provider | unset |
//! | `WALLET_CHAIN_ID` | Chain reported by the local provider | `1` |
//! | `WALLET_POLL_INTERVAL_MS` | Change-watcher interval for the RPC provider | `1000` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |
//!
//! With neither `WALLET_RPC_URL` nor a local key set, no provider is
//! injected and every connect fails with "provider unavailable".

use std::time::Duration;
use std::{env, fs};

use crate::auth::SignInMode;
use crate::providers::rpc::DEFAULT_POLL_INTERVAL;
use crate::siwe::{PageContext, DEFAULT_STATEMENT};

pub const SIWE_ORIGIN_ENV: &str = "SIWE_ORIGIN";
pub const SIWE_STATEMENT_ENV: &str = "SIWE_STATEMENT";
pub const SIWE_SIGN_IN_MODE_ENV: &str = "SIWE_SIGN_IN_MODE";
pub const WALLET_RPC_URL_ENV: &str = "WALLET_RPC_URL";
pub const WALLET_PRIVATE_KEY_ENV: &str = "WALLET_PRIVATE_KEY";
pub const WALLET_PRIVATE_KEY_PEM_PATH_ENV: &str = "WALLET_PRIVATE_KEY_PEM_PATH";
pub const WALLET_CHAIN_ID_ENV: &str = "WALLET_CHAIN_ID";
pub const WALLET_POLL_INTERVAL_MS_ENV: &str = "WALLET_POLL_INTERVAL_MS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_CHAIN_ID: u64 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("Failed to read {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Key material for the local provider.
#[derive(Clone, PartialEq, Eq)]
pub enum LocalKey {
    Hex(String),
    Pem(Vec<u8>),
}

impl std::fmt::Debug for LocalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocalKey::Hex(_) => write!(f, "LocalKey::Hex(<redacted>)"),
            LocalKey::Pem(_) => write!(f, "LocalKey::Pem(<redacted>)"),
        }
    }
}

/// Which injected provider to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSource {
    None,
    JsonRpc { url: String, poll_interval: Duration },
    Local { key: LocalKey, chain_id: u64 },
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub page: PageContext,
    pub statement: String,
    pub sign_in_mode: SignInMode,
    pub provider: ProviderSource,
    pub log_format: LogFormat,
}

impl SessionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let origin = get(SIWE_ORIGIN_ENV).unwrap_or_else(|| DEFAULT_ORIGIN.to_string());
        let page = PageContext::parse(&origin).map_err(|e| ConfigError::Invalid {
            name: SIWE_ORIGIN_ENV,
            reason: e.to_string(),
        })?;

        let statement = get(SIWE_STATEMENT_ENV).unwrap_or_else(|| DEFAULT_STATEMENT.to_string());

        let sign_in_mode = match get(SIWE_SIGN_IN_MODE_ENV) {
            Some(raw) => SignInMode::from_name(&raw).ok_or_else(|| ConfigError::Invalid {
                name: SIWE_SIGN_IN_MODE_ENV,
                reason: format!("expected `automatic` or `manual`, got `{raw}`"),
            })?,
            None => SignInMode::default(),
        };

        let log_format = match get(LOG_FORMAT_ENV).map(|v| v.to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let provider = if let Some(url) = get(WALLET_RPC_URL_ENV) {
            let poll_interval =
                parse_u64(get(WALLET_POLL_INTERVAL_MS_ENV), WALLET_POLL_INTERVAL_MS_ENV)?
                    .map(Duration::from_millis)
                    .unwrap_or(DEFAULT_POLL_INTERVAL);
            ProviderSource::JsonRpc {
                url,
                poll_interval: poll_interval.max(Duration::from_millis(1)),
            }
        } else if let Some(key) = load_local_key(&get)? {
            let chain_id = parse_u64(get(WALLET_CHAIN_ID_ENV), WALLET_CHAIN_ID_ENV)?
                .unwrap_or(DEFAULT_CHAIN_ID);
            if chain_id == 0 {
                return Err(ConfigError::Invalid {
                    name: WALLET_CHAIN_ID_ENV,
                    reason: "chain id must be positive".to_string(),
                });
            }
            ProviderSource::Local { key, chain_id }
        } else {
            ProviderSource::None
        };

        Ok(Self {
            page,
            statement,
            sign_in_mode,
            provider,
            log_format,
        })
    }
}

fn parse_u64(raw: Option<String>, name: &'static str) -> Result<Option<u64>, ConfigError> {
    raw.map(|v| {
        v.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        })
    })
    .transpose()
}

fn load_local_key<F>(get: &F) -> Result<Option<LocalKey>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(hex) = get(WALLET_PRIVATE_KEY_ENV) {
        return Ok(Some(LocalKey::Hex(hex)));
    }
    match get(WALLET_PRIVATE_KEY_PEM_PATH_ENV) {
        Some(path) => fs::read(&path)
            .map(|bytes| Some(LocalKey::Pem(bytes)))
            .map_err(|e| ConfigError::Unreadable {
                path,
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}
