// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! SIWE challenge message.
//!
//! ## Format
//!
//! ```text
//! <host> wants you to sign in with your Ethereum account:
//! <address>
//!
//! <statement>
//!
//! URI: <origin>
//! Version: 1
//! Chain ID: <chain id>
//! Nonce: <nonce>
//! Issued At: <ISO-8601 timestamp>
//! ```
//!
//! ## Nonce
//!
//! The nonce comes from a non-cryptographic generator and is neither tracked
//! nor checked for reuse. It deters nothing on its own; a deployment that
//! verifies signatures must issue single-use nonces from the server.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, Signature};
use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use url::Url;

/// SIWE message version.
pub const SIWE_VERSION: &str = "1";

/// Statement used when none is configured.
pub const DEFAULT_STATEMENT: &str = "Sign in with Ethereum to prove you control this account.";

/// Nonce length in base-36 characters.
pub const NONCE_LENGTH: usize = 13;

const NONCE_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

const PREAMBLE_SUFFIX: &str = " wants you to sign in with your Ethereum account:";
const URI_TAG: &str = "URI: ";
const VERSION_TAG: &str = "Version: ";
const CHAIN_ID_TAG: &str = "Chain ID: ";
const NONCE_TAG: &str = "Nonce: ";
const ISSUED_AT_TAG: &str = "Issued At: ";

/// Location of the page requesting the sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    /// Host with a non-default port, e.g. `localhost:3000`
    pub host: String,
    /// Scheme, host and port, e.g. `http://localhost:3000`
    pub origin: String,
}

impl PageContext {
    pub fn from_url(url: &Url) -> Result<Self, url::ParseError> {
        let host = url.host_str().ok_or(url::ParseError::EmptyHost)?;
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self {
            host,
            origin: url.origin().ascii_serialization(),
        })
    }

    pub fn parse(origin: &str) -> Result<Self, url::ParseError> {
        Self::from_url(&Url::parse(origin)?)
    }
}

/// Fresh base-36 nonce of [`NONCE_LENGTH`] characters.
pub fn generate_nonce() -> String {
    let mut rng = rand::thread_rng();
    (0..NONCE_LENGTH)
        .map(|_| NONCE_ALPHABET[rng.gen_range(0..NONCE_ALPHABET.len())] as char)
        .collect()
}

/// A single SIWE challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiweChallenge {
    pub domain: String,
    pub address: String,
    pub statement: String,
    pub uri: String,
    pub version: String,
    pub chain_id: u64,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
}

impl fmt::Display for SiweChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}{PREAMBLE_SUFFIX}", self.domain)?;
        writeln!(f, "{}", self.address)?;
        writeln!(f)?;
        writeln!(f, "{}", self.statement)?;
        writeln!(f)?;
        writeln!(f, "{URI_TAG}{}", self.uri)?;
        writeln!(f, "{VERSION_TAG}{}", self.version)?;
        writeln!(f, "{CHAIN_ID_TAG}{}", self.chain_id)?;
        writeln!(f, "{NONCE_TAG}{}", self.nonce)?;
        write!(
            f,
            "{ISSUED_AT_TAG}{}",
            self.issued_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}

/// Errors raised when reading a challenge back from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChallengeParseError {
    #[error("Challenge is truncated: missing line {0}")]
    MissingLine(usize),

    #[error("Malformed line {line}: expected {expected}")]
    MalformedLine { line: usize, expected: &'static str },

    #[error("Invalid chain id: {0}")]
    InvalidChainId(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Unexpected trailing content")]
    TrailingContent,
}

fn tagged<'a>(
    lines: &[&'a str],
    index: usize,
    tag: &'static str,
) -> Result<&'a str, ChallengeParseError> {
    let line = lines
        .get(index)
        .ok_or(ChallengeParseError::MissingLine(index + 1))?;
    line.strip_prefix(tag)
        .ok_or(ChallengeParseError::MalformedLine {
            line: index + 1,
            expected: tag,
        })
}

fn blank(lines: &[&str], index: usize) -> Result<(), ChallengeParseError> {
    match lines.get(index) {
        Some(line) if line.is_empty() => Ok(()),
        Some(_) => Err(ChallengeParseError::MalformedLine {
            line: index + 1,
            expected: "empty line",
        }),
        None => Err(ChallengeParseError::MissingLine(index + 1)),
    }
}

impl FromStr for SiweChallenge {
    type Err = ChallengeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s.lines().collect();

        let preamble = lines.first().ok_or(ChallengeParseError::MissingLine(1))?;
        let domain = preamble
            .strip_suffix(PREAMBLE_SUFFIX)
            .ok_or(ChallengeParseError::MalformedLine {
                line: 1,
                expected: "preamble",
            })?;
        let address = lines.get(1).ok_or(ChallengeParseError::MissingLine(2))?;
        blank(&lines, 2)?;
        let statement = lines.get(3).ok_or(ChallengeParseError::MissingLine(4))?;
        blank(&lines, 4)?;

        let uri = tagged(&lines, 5, URI_TAG)?;
        let version = tagged(&lines, 6, VERSION_TAG)?;
        let chain_id = tagged(&lines, 7, CHAIN_ID_TAG)?;
        let nonce = tagged(&lines, 8, NONCE_TAG)?;
        let issued_at = tagged(&lines, 9, ISSUED_AT_TAG)?;

        if lines.len() > 10 {
            return Err(ChallengeParseError::TrailingContent);
        }

        Ok(Self {
            domain: domain.to_string(),
            address: address.to_string(),
            statement: statement.to_string(),
            uri: uri.to_string(),
            version: version.to_string(),
            chain_id: chain_id
                .parse()
                .map_err(|_| ChallengeParseError::InvalidChainId(chain_id.to_string()))?,
            nonce: nonce.to_string(),
            issued_at: DateTime::parse_from_rfc3339(issued_at)
                .map_err(|e| ChallengeParseError::InvalidTimestamp(e.to_string()))?
                .with_timezone(&Utc),
        })
    }
}

/// Builds challenges for one page.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    page: PageContext,
    statement: String,
}

impl MessageBuilder {
    pub fn new(page: PageContext) -> Self {
        Self {
            page,
            statement: DEFAULT_STATEMENT.to_string(),
        }
    }

    /// Replace the statement. Line breaks are folded into spaces so the
    /// statement stays on its own line.
    pub fn with_statement(mut self, statement: impl Into<String>) -> Self {
        let statement: String = statement.into();
        self.statement = statement.split_whitespace().collect::<Vec<_>>().join(" ");
        self
    }

    pub fn page(&self) -> &PageContext {
        &self.page
    }

    /// Challenge for `address` on `chain_id` with a fresh nonce and timestamp.
    pub fn build(&self, address: &str, chain_id: u64) -> SiweChallenge {
        SiweChallenge {
            domain: self.page.host.clone(),
            address: address.to_string(),
            statement: self.statement.clone(),
            uri: self.page.origin.clone(),
            version: SIWE_VERSION.to_string(),
            chain_id,
            nonce: generate_nonce(),
            issued_at: Utc::now(),
        }
    }
}

/// Errors raised while recovering a signer.
#[derive(Debug, thiserror::Error)]
pub enum RecoverError {
    #[error("Invalid signature encoding: {0}")]
    Encoding(String),

    #[error("Signature recovery failed: {0}")]
    Recovery(String),
}

/// Recover the EIP-191 signer of `message` from a 0x-prefixed hex signature.
pub fn recover_signer(message: &str, signature: &str) -> Result<Address, RecoverError> {
    let bytes = alloy::hex::decode(signature).map_err(|e| RecoverError::Encoding(e.to_string()))?;
    let signature =
        Signature::try_from(bytes.as_slice()).map_err(|e| RecoverError::Encoding(e.to_string()))?;
    signature
        .recover_address_from_msg(message)
        .map_err(|e| RecoverError::Recovery(e.to_string()))
}
