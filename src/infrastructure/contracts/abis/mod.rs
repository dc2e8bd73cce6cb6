use std::fs;

use ethers::abi::{parse_abi, Abi};
use ethers::types::Bytes;

use crate::domain::services::ContractError;

/// The lottery interface is fixed, so it is kept here as human-readable
/// signatures rather than a JSON file shipped next to the binary.
const LOTTERY_ABI: &[&str] = &[
    "function betsOpen() view returns (bool)",
    "function betsClosingTime() view returns (uint256)",
    "function openBets(uint256 closingTime)",
    "function closeLottery()",
    "function ownerPool() view returns (uint256)",
    "function ownerWithdraw(uint256 amount)",
    "function paymentToken() view returns (address)",
    "function purchaseRatio() view returns (uint256)",
    "function betPrice() view returns (uint256)",
    "function betFee() view returns (uint256)",
    "function purchaseTokens() payable",
    "function betMany(uint256 times)",
    "function prize(address account) view returns (uint256)",
    "function prizeWithdraw(uint256 amount)",
    "function returnTokens(uint256 amount)",
];

/// ERC20 surface the client actually uses.
const TOKEN_ABI: &[&str] = &[
    "function balanceOf(address account) view returns (uint256)",
    "function approve(address spender, uint256 amount) returns (bool)",
];

pub fn load_lottery_abi() -> Result<Abi, ContractError> {
    parse_abi(LOTTERY_ABI).map_err(|e| ContractError::AbiError(e.to_string()))
}

pub fn load_token_abi() -> Result<Abi, ContractError> {
    parse_abi(TOKEN_ABI).map_err(|e| ContractError::AbiError(e.to_string()))
}

/// Load ABI and creation bytecode from a compiler artifact (the JSON emitted
/// by a Hardhat or Foundry build). Only needed for deployment; connecting to
/// an existing lottery uses the embedded signatures above.
pub fn load_lottery_artifact(path: &str) -> Result<(Abi, Bytes), ContractError> {
    let content = fs::read_to_string(path).map_err(|e| {
        ContractError::ContractCallError(format!("Failed to read artifact {}: {}", path, e))
    })?;

    let artifact: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        ContractError::ContractCallError(format!("Failed to parse artifact {}: {}", path, e))
    })?;

    let abi: Abi = serde_json::from_value(artifact["abi"].clone())
        .map_err(|e| ContractError::AbiError(e.to_string()))?;

    // Hardhat stores the bytecode as a string, Foundry as { "object": "0x.." }.
    let bytecode_str = artifact["bytecode"]
        .as_str()
        .or_else(|| artifact["bytecode"]["object"].as_str())
        .ok_or_else(|| {
            ContractError::ContractCallError(format!("No bytecode field in artifact {}", path))
        })?;

    let bytecode: Bytes = bytecode_str
        .parse()
        .map_err(|e| ContractError::ContractCallError(format!("Invalid bytecode hex: {}", e)))?;

    Ok((abi, bytecode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lottery_abi_parses_and_covers_the_interface() {
        let abi = load_lottery_abi().unwrap();
        for name in [
            "betsOpen",
            "betsClosingTime",
            "openBets",
            "closeLottery",
            "ownerPool",
            "ownerWithdraw",
            "paymentToken",
            "purchaseRatio",
            "betPrice",
            "betFee",
            "purchaseTokens",
            "betMany",
            "prize",
            "prizeWithdraw",
            "returnTokens",
        ] {
            assert!(abi.function(name).is_ok(), "missing function {name}");
        }
    }

    #[test]
    fn token_abi_parses() {
        let abi = load_token_abi().unwrap();
        assert!(abi.function("balanceOf").is_ok());
        assert!(abi.function("approve").is_ok());
    }

    #[test]
    fn purchase_tokens_is_payable() {
        let abi = load_lottery_abi().unwrap();
        let f = abi.function("purchaseTokens").unwrap();
        assert_eq!(f.state_mutability, ethers::abi::StateMutability::Payable);
    }

    #[test]
    fn missing_artifact_is_a_labeled_error() {
        let err = load_lottery_artifact("/nonexistent/Lottery.json").unwrap_err();
        assert!(matches!(err, ContractError::ContractCallError(_)));
    }
}
