use ethers::signers::{coins_bip39::English, LocalWallet, MnemonicBuilder};
use ethers::types::Address;

use crate::domain::services::ContractError;
use crate::infrastructure::contracts::types::{NativeCurrency, NetworkConfig};

// Default Anvil account #0, usable only against a local devnet.
const ANVIL_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Get the current network configuration from environment variables.
/// `CHAIN_ID` selects a preset; `RPC_URL` overrides the preset endpoint.
pub fn network_from_env() -> NetworkConfig {
    let chain_id = std::env::var("CHAIN_ID")
        .unwrap_or_else(|_| "31337".to_string())
        .parse::<u64>()
        .unwrap_or(31337);

    let mut config = match chain_id {
        11155111 => sepolia_config(),
        _ => anvil_config(),
    };

    if let Ok(rpc_url) = std::env::var("RPC_URL") {
        config.rpc_url = rpc_url;
    }

    config
}

/// Anvil local development configuration
pub fn anvil_config() -> NetworkConfig {
    NetworkConfig {
        chain_id: 31337,
        name: "Anvil Local".to_string(),
        rpc_url: "http://localhost:8545".to_string(),
        explorer_url: "".to_string(),
        native_currency: NativeCurrency {
            name: "Ether".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
        },
    }
}

/// Sepolia testnet configuration
pub fn sepolia_config() -> NetworkConfig {
    NetworkConfig {
        chain_id: 11155111,
        name: "Sepolia".to_string(),
        rpc_url: "https://rpc.sepolia.org".to_string(),
        explorer_url: "https://sepolia.etherscan.io".to_string(),
        native_currency: NativeCurrency {
            name: "Ether".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
        },
    }
}

/// Get the signing key with a fallback for Anvil. Any chain other than the
/// local devnet requires an explicit `PRIVATE_KEY`.
pub fn get_private_key(network: &NetworkConfig) -> Result<String, ContractError> {
    match std::env::var("PRIVATE_KEY") {
        Ok(key) => Ok(key),
        Err(_) => {
            if network.chain_id == 31337 {
                Ok(ANVIL_PRIVATE_KEY.to_string())
            } else {
                Err(ContractError::InvalidKey(format!(
                    "PRIVATE_KEY environment variable not set. Required for chain ID: {}",
                    network.chain_id
                )))
            }
        }
    }
}

/// Build the session wallet from the environment: `PRIVATE_KEY` first, then
/// `MNEMONIC`, then the Anvil default where applicable.
pub fn wallet_from_env(network: &NetworkConfig) -> Result<LocalWallet, ContractError> {
    if let Ok(phrase) = std::env::var("MNEMONIC") {
        if std::env::var("PRIVATE_KEY").is_err() {
            return wallet_from_mnemonic(&phrase);
        }
    }
    let key = get_private_key(network)?;
    key.parse::<LocalWallet>()
        .map_err(|e| ContractError::InvalidKey(e.to_string()))
}

/// Derive a wallet from a BIP-39 seed phrase (default derivation path).
pub fn wallet_from_mnemonic(phrase: &str) -> Result<LocalWallet, ContractError> {
    MnemonicBuilder::<English>::default()
        .phrase(phrase.trim())
        .build()
        .map_err(|e| ContractError::InvalidKey(e.to_string()))
}

/// Address of an already-deployed lottery, if the operator set one. Absent
/// means the console should deploy a fresh pair of contracts.
pub fn lottery_address_from_env() -> Result<Option<Address>, ContractError> {
    match std::env::var("LOTTERY_ADDRESS") {
        Ok(raw) => {
            let address = raw
                .parse::<Address>()
                .map_err(|e| ContractError::InvalidAddress(e.to_string()))?;
            Ok(Some(address))
        }
        Err(_) => Ok(None),
    }
}

/// Path to the lottery build artifact used for deployment.
pub fn artifact_path() -> String {
    std::env::var("LOTTERY_ARTIFACT").unwrap_or_else(|_| "artifacts/Lottery.json".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_carry_expected_chain_ids() {
        assert_eq!(anvil_config().chain_id, 31337);
        assert_eq!(sepolia_config().chain_id, 11155111);
    }

    #[test]
    fn anvil_falls_back_to_the_default_key() {
        // Only meaningful when the variable is absent from the test
        // environment; skip otherwise rather than mutate global state.
        if std::env::var("PRIVATE_KEY").is_ok() {
            return;
        }
        let key = get_private_key(&anvil_config()).unwrap();
        assert_eq!(key, ANVIL_PRIVATE_KEY);
        assert!(key.parse::<LocalWallet>().is_ok());
    }

    #[test]
    fn non_local_chain_requires_a_key() {
        if std::env::var("PRIVATE_KEY").is_ok() {
            return;
        }
        assert!(matches!(
            get_private_key(&sepolia_config()),
            Err(ContractError::InvalidKey(_))
        ));
    }

    #[test]
    fn mnemonic_import_derives_a_wallet() {
        // Standard test vector phrase.
        let wallet = wallet_from_mnemonic(
            "test test test test test test test test test test test junk",
        )
        .unwrap();
        use ethers::signers::Signer;
        // First account of the well-known Anvil/Hardhat seed.
        assert_eq!(
            format!("{:?}", wallet.address()),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn garbage_mnemonic_is_rejected() {
        assert!(matches!(
            wallet_from_mnemonic("not a real phrase"),
            Err(ContractError::InvalidKey(_))
        ));
    }
}
