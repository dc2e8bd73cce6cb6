use ethers::types::{Address, U256};

use crate::domain::models::{ExchangeParameters, LotteryState, TxOutcome};

// ============ ERROR TYPES ============

/// Errors surfaced by the contract client. Every variant is terminal for the
/// operation that produced it; nothing is retried locally.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Transaction failed: {0}")]
    TransactionError(String),

    #[error("Contract call failed: {0}")]
    ContractCallError(String),

    #[error("ABI error: {0}")]
    AbiError(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

impl From<ethers::contract::AbiError> for ContractError {
    fn from(err: ethers::contract::AbiError) -> Self {
        ContractError::AbiError(err.to_string())
    }
}

/// Local failures of the admin console. An invalid selection is fatal to the
/// current loop iteration; remote failures are printed and the loop keeps
/// going.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Contract(#[from] ContractError),
}

// ============ CONTRACT CLIENT INTERFACE ============

/// The fixed set of intents the lottery and payment-token contracts accept.
///
/// The console and panel hold an implementation of this trait rather than the
/// concrete client so their dispatch and sequencing rules can be exercised
/// against a recording stand-in. Every mutating method awaits the transaction
/// receipt before returning; callers refresh displayed state afterwards
/// because the chain is the only source of truth.
#[allow(async_fn_in_trait)]
pub trait LotteryApi: Send + Sync {
    fn wallet_address(&self) -> Address;

    // ---- reads ----
    async fn lottery_state(&self) -> Result<LotteryState, ContractError>;
    async fn exchange_parameters(&self) -> Result<ExchangeParameters, ContractError>;
    async fn native_balance(&self) -> Result<U256, ContractError>;
    async fn token_balance(&self) -> Result<U256, ContractError>;
    async fn prize_balance(&self) -> Result<U256, ContractError>;
    async fn owner_pool(&self) -> Result<U256, ContractError>;
    async fn current_block_timestamp(&self) -> Result<u64, ContractError>;

    // ---- writes ----
    async fn open_bets(&self, closing_time: u64) -> Result<TxOutcome, ContractError>;
    async fn close_lottery(&self) -> Result<TxOutcome, ContractError>;
    async fn owner_withdraw(&self, amount: U256) -> Result<TxOutcome, ContractError>;
    async fn purchase_tokens(&self, value: U256) -> Result<TxOutcome, ContractError>;
    /// Grant the lottery an unlimited allowance over the payment token.
    /// Required before `bet_many` and `return_tokens`; a failure here must
    /// abort the dependent call.
    async fn approve_payment_token(&self) -> Result<TxOutcome, ContractError>;
    async fn bet_many(&self, count: u64) -> Result<TxOutcome, ContractError>;
    async fn prize_withdraw(&self, amount: U256) -> Result<TxOutcome, ContractError>;
    async fn return_tokens(&self, amount: U256) -> Result<TxOutcome, ContractError>;

    /// Open the betting window for `duration_secs` from now. The absolute
    /// closing time is current chain time plus the duration; wall-clock time
    /// on the operator's machine plays no part.
    async fn open_bets_in(&self, duration_secs: u64) -> Result<TxOutcome, ContractError> {
        let now = self.current_block_timestamp().await?;
        self.open_bets(now + duration_secs).await
    }
}
