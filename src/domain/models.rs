use ethers::types::U256;
use ethers::utils::parse_ether;
use serde::{Deserialize, Serialize};

use crate::domain::services::ContractError;

// ============ REMOTE STATE TYPES ============

/// Betting window as tracked by the lottery contract.
///
/// `closing_time` is only meaningful while `open` is true; the contract
/// leaves the old value in place after the lottery closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryState {
    pub open: bool,
    pub closing_time: u64,
}

/// The three balances a participant cares about, each fetched with its own
/// read call. There is no atomic snapshot; values may be stale relative to
/// each other.
#[derive(Debug, Clone, Copy, Default)]
pub struct Balances {
    pub native: U256,
    pub token: U256,
    pub prize: U256,
}

/// Exchange parameters fixed at contract deployment. Safe to cache after the
/// first read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeParameters {
    pub purchase_ratio: u64,
    pub bet_price: U256,
    pub bet_fee: U256,
}

// ============ TRANSACTION TYPES ============

/// Outcome of a confirmed mutating call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutcome {
    pub transaction_hash: String,
    pub block_number: u64,
}

/// Constructor arguments for a fresh lottery deployment.
#[derive(Debug, Clone)]
pub struct DeployParams {
    pub name: String,
    pub symbol: String,
    pub purchase_ratio: u64,
    pub bet_price: U256,
    pub bet_fee: U256,
}

impl DeployParams {
    /// The parameters the deployment console uses unless told otherwise:
    /// ratio 100, bet price 1 token, bet fee 0.2 tokens.
    pub fn standard() -> Self {
        Self {
            name: "LotteryToken".to_string(),
            symbol: "LT0".to_string(),
            purchase_ratio: 100,
            bet_price: U256::exp10(18),
            bet_fee: U256::exp10(17) * 2,
        }
    }
}

// ============ AMOUNT HELPERS ============

/// Empty form inputs count as zero; the remote call then rejects or no-ops.
pub fn amount_or_zero(input: &str) -> &str {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        "0"
    } else {
        trimmed
    }
}

/// Parse a decimal token amount ("5", "0.2") into its 18-decimal scaled
/// representation.
pub fn parse_token_amount(input: &str) -> Result<U256, ContractError> {
    parse_ether(amount_or_zero(input)).map_err(|e| ContractError::InvalidAmount(e.to_string()))
}

/// Render a unix timestamp the way the console and panel display block and
/// closing times.
pub fn format_timestamp(ts: u64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp(ts as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_amount_defaults_to_zero() {
        assert_eq!(amount_or_zero(""), "0");
        assert_eq!(amount_or_zero("   "), "0");
        assert_eq!(amount_or_zero(" 5 "), "5");
    }

    #[test]
    fn token_amounts_scale_to_wei() {
        assert_eq!(parse_token_amount("5").unwrap(), U256::exp10(18) * 5);
        assert_eq!(parse_token_amount("0.2").unwrap(), U256::exp10(17) * 2);
        assert_eq!(parse_token_amount("").unwrap(), U256::zero());
    }

    #[test]
    fn malformed_amount_is_rejected() {
        assert!(matches!(
            parse_token_amount("five"),
            Err(ContractError::InvalidAmount(_))
        ));
    }

    #[test]
    fn timestamps_render_as_utc_dates() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
        assert_eq!(format_timestamp(1_700_000_000), "2023-11-14 22:13:20 UTC");
    }

    #[test]
    fn standard_deploy_params_match_console_defaults() {
        let params = DeployParams::standard();
        assert_eq!(params.purchase_ratio, 100);
        assert_eq!(params.bet_price, parse_token_amount("1").unwrap());
        assert_eq!(params.bet_fee, parse_token_amount("0.2").unwrap());
    }
}
