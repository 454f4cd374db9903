// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Network catalog and display formatting.

/// Known network entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
}

/// Ethereum Mainnet.
pub const ETHEREUM_MAINNET: NetworkConfig = NetworkConfig {
    name: "Ethereum Mainnet",
    chain_id: 1,
};

/// Goerli testnet.
pub const GOERLI: NetworkConfig = NetworkConfig {
    name: "Goerli",
    chain_id: 5,
};

/// Sepolia testnet.
pub const SEPOLIA: NetworkConfig = NetworkConfig {
    name: "Sepolia",
    chain_id: 11_155_111,
};

/// Polygon PoS mainnet.
pub const POLYGON: NetworkConfig = NetworkConfig {
    name: "Polygon",
    chain_id: 137,
};

/// Polygon Mumbai testnet.
pub const MUMBAI: NetworkConfig = NetworkConfig {
    name: "Mumbai",
    chain_id: 80_001,
};

/// Networks with a friendly display name.
pub const KNOWN_NETWORKS: &[NetworkConfig] = &[ETHEREUM_MAINNET, GOERLI, SEPOLIA, POLYGON, MUMBAI];

/// Look up a known network by chain id.
pub fn find_network(chain_id: u64) -> Option<&'static NetworkConfig> {
    KNOWN_NETWORKS.iter().find(|n| n.chain_id == chain_id)
}

/// Display label for a chain id, `"Chain <id>"` when unknown.
pub fn network_label(chain_id: u64) -> String {
    match find_network(chain_id) {
        Some(network) => network.name.to_string(),
        None => format!("Chain {chain_id}"),
    }
}

/// Shorten an address to `0xABCD...12AB` (first six and last four characters).
///
/// Short input is not special-cased: head and tail may overlap.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    let head: String = chars.iter().take(6).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_for_known_and_unknown_chains() {
        assert_eq!(network_label(1), "Ethereum Mainnet");
        assert_eq!(network_label(80001), "Mumbai");
        assert_eq!(network_label(11155111), "Sepolia");
        assert_eq!(network_label(999), "Chain 999");
    }

    #[test]
    fn short_address_keeps_head_and_tail() {
        assert_eq!(
            short_address("0xABCDEF1234567890000000000000000000000012AB"),
            "0xABCD...12AB"
        );
        assert_eq!(short_address("0x1234"), "0x1234...1234");
        assert_eq!(short_address("0xab"), "0xab...0xab");
    }

    #[test]
    fn known_networks_have_unique_ids() {
        for (i, a) in KNOWN_NETWORKS.iter().enumerate() {
            for b in &KNOWN_NETWORKS[i + 1..] {
                assert_ne!(a.chain_id, b.chain_id);
            }
        }
    }
}
