use std::fmt::Display;
use std::sync::Arc;

use ethers::{
    abi::Detokenize,
    contract::{Contract, ContractCall, ContractFactory},
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, BlockNumber, U256},
};

use crate::domain::models::{DeployParams, ExchangeParameters, LotteryState, TxOutcome};
use crate::domain::services::{ContractError, LotteryApi};
use crate::infrastructure::contracts::{abis, config, types::NetworkConfig};

/// Provider stack every contract instance goes through: HTTP transport plus
/// local transaction signing.
pub type EthClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Client for one lottery deployment and its payment token.
///
/// Holds no mutable state of its own; every read goes to the chain and every
/// write waits for its receipt. Callers re-read whatever they display after a
/// successful mutation.
#[derive(Clone)]
pub struct LotteryClient {
    provider: Arc<Provider<Http>>,
    wallet: LocalWallet,
    network: NetworkConfig,
    lottery: Contract<EthClient>,
    token: Contract<EthClient>,
    lottery_address: Address,
    token_address: Address,
}

impl LotteryClient {
    /// Attach to an existing lottery. The payment token address is resolved
    /// from the lottery itself via `paymentToken()`.
    pub async fn connect(
        network: NetworkConfig,
        wallet: LocalWallet,
        lottery_address: Address,
    ) -> Result<Self, ContractError> {
        let provider = Provider::<Http>::try_from(network.rpc_url.as_str())
            .map_err(|e| ContractError::RpcError(e.to_string()))?;
        let provider = Arc::new(provider);

        let wallet = wallet.with_chain_id(network.chain_id);
        let signer = Arc::new(SignerMiddleware::new(
            provider.as_ref().clone(),
            wallet.clone(),
        ));

        let lottery_abi = abis::load_lottery_abi()?;
        let lottery = Contract::new(lottery_address, lottery_abi, signer.clone());

        let token_address: Address = lottery
            .method::<_, Address>("paymentToken", ())?
            .call()
            .await
            .map_err(call_err)?;

        let token_abi = abis::load_token_abi()?;
        let token = Contract::new(token_address, token_abi, signer);

        Ok(Self {
            provider,
            wallet,
            network,
            lottery,
            token,
            lottery_address,
            token_address,
        })
    }

    /// One-time provisioning: deploy the lottery (which deploys its own
    /// token) and return a client connected to the fresh pair. Fails if the
    /// signer lacks funds or the constructor arguments are rejected.
    pub async fn deploy(
        network: NetworkConfig,
        wallet: LocalWallet,
        params: DeployParams,
    ) -> Result<Self, ContractError> {
        let provider = Provider::<Http>::try_from(network.rpc_url.as_str())
            .map_err(|e| ContractError::RpcError(e.to_string()))?;
        let signer = Arc::new(SignerMiddleware::new(
            provider,
            wallet.clone().with_chain_id(network.chain_id),
        ));

        let (abi, bytecode) = abis::load_lottery_artifact(&config::artifact_path())?;
        let factory = ContractFactory::new(abi, bytecode, signer);

        let deployer = factory
            .deploy((
                params.name.clone(),
                params.symbol.clone(),
                U256::from(params.purchase_ratio),
                params.bet_price,
                params.bet_fee,
            ))
            .map_err(|e| ContractError::ContractCallError(e.to_string()))?;

        let deployed = deployer
            .send()
            .await
            .map_err(|e| ContractError::TransactionError(e.to_string()))?;

        Self::connect(network, wallet, deployed.address()).await
    }

    pub fn lottery_address(&self) -> Address {
        self.lottery_address
    }

    pub fn token_address(&self) -> Address {
        self.token_address
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Send a mutating call and wait for its confirmation, rejecting
    /// reverted transactions.
    async fn send_tx<D: Detokenize>(
        &self,
        call: ContractCall<EthClient, D>,
    ) -> Result<TxOutcome, ContractError> {
        let pending = call
            .send()
            .await
            .map_err(|e| ContractError::TransactionError(e.to_string()))?;

        let receipt = pending
            .await
            .map_err(|e| ContractError::TransactionError(e.to_string()))?
            .ok_or_else(|| ContractError::TransactionError("No transaction receipt".to_string()))?;

        if let Some(status) = receipt.status {
            if status == 0.into() {
                return Err(ContractError::TransactionError(
                    "Transaction reverted".to_string(),
                ));
            }
        }

        Ok(TxOutcome {
            transaction_hash: format!("0x{:x}", receipt.transaction_hash),
            block_number: receipt.block_number.unwrap_or_default().as_u64(),
        })
    }
}

fn call_err<E: Display>(err: E) -> ContractError {
    ContractError::ContractCallError(err.to_string())
}

impl LotteryApi for LotteryClient {
    fn wallet_address(&self) -> Address {
        self.wallet.address()
    }

    async fn lottery_state(&self) -> Result<LotteryState, ContractError> {
        let open: bool = self
            .lottery
            .method::<_, bool>("betsOpen", ())?
            .call()
            .await
            .map_err(call_err)?;

        // The contract keeps a stale closing time around after a close; only
        // report it while the window is open.
        let closing_time = if open {
            self.lottery
                .method::<_, U256>("betsClosingTime", ())?
                .call()
                .await
                .map_err(call_err)?
                .as_u64()
        } else {
            0
        };

        Ok(LotteryState { open, closing_time })
    }

    async fn exchange_parameters(&self) -> Result<ExchangeParameters, ContractError> {
        let purchase_ratio: U256 = self
            .lottery
            .method::<_, U256>("purchaseRatio", ())?
            .call()
            .await
            .map_err(call_err)?;
        let bet_price: U256 = self
            .lottery
            .method::<_, U256>("betPrice", ())?
            .call()
            .await
            .map_err(call_err)?;
        let bet_fee: U256 = self
            .lottery
            .method::<_, U256>("betFee", ())?
            .call()
            .await
            .map_err(call_err)?;

        Ok(ExchangeParameters {
            purchase_ratio: purchase_ratio.as_u64(),
            bet_price,
            bet_fee,
        })
    }

    async fn native_balance(&self) -> Result<U256, ContractError> {
        self.provider
            .get_balance(self.wallet.address(), None)
            .await
            .map_err(|e| ContractError::RpcError(e.to_string()))
    }

    async fn token_balance(&self) -> Result<U256, ContractError> {
        self.token
            .method::<_, U256>("balanceOf", self.wallet.address())?
            .call()
            .await
            .map_err(call_err)
    }

    async fn prize_balance(&self) -> Result<U256, ContractError> {
        self.lottery
            .method::<_, U256>("prize", self.wallet.address())?
            .call()
            .await
            .map_err(call_err)
    }

    async fn owner_pool(&self) -> Result<U256, ContractError> {
        self.lottery
            .method::<_, U256>("ownerPool", ())?
            .call()
            .await
            .map_err(call_err)
    }

    async fn current_block_timestamp(&self) -> Result<u64, ContractError> {
        let block = self
            .provider
            .get_block(BlockNumber::Latest)
            .await
            .map_err(|e| ContractError::RpcError(e.to_string()))?
            .ok_or_else(|| ContractError::RpcError("No latest block".to_string()))?;
        Ok(block.timestamp.as_u64())
    }

    async fn open_bets(&self, closing_time: u64) -> Result<TxOutcome, ContractError> {
        let call = self
            .lottery
            .method::<_, ()>("openBets", U256::from(closing_time))?;
        self.send_tx(call).await
    }

    async fn close_lottery(&self) -> Result<TxOutcome, ContractError> {
        let call = self.lottery.method::<_, ()>("closeLottery", ())?;
        self.send_tx(call).await
    }

    async fn owner_withdraw(&self, amount: U256) -> Result<TxOutcome, ContractError> {
        let call = self.lottery.method::<_, ()>("ownerWithdraw", amount)?;
        self.send_tx(call).await
    }

    async fn purchase_tokens(&self, value: U256) -> Result<TxOutcome, ContractError> {
        let call = self
            .lottery
            .method::<_, ()>("purchaseTokens", ())?
            .value(value);
        self.send_tx(call).await
    }

    async fn approve_payment_token(&self) -> Result<TxOutcome, ContractError> {
        let call = self
            .token
            .method::<_, bool>("approve", (self.lottery_address, U256::max_value()))?;
        self.send_tx(call).await
    }

    async fn bet_many(&self, count: u64) -> Result<TxOutcome, ContractError> {
        let call = self.lottery.method::<_, ()>("betMany", U256::from(count))?;
        self.send_tx(call).await
    }

    async fn prize_withdraw(&self, amount: U256) -> Result<TxOutcome, ContractError> {
        let call = self.lottery.method::<_, ()>("prizeWithdraw", amount)?;
        self.send_tx(call).await
    }

    async fn return_tokens(&self, amount: U256) -> Result<TxOutcome, ContractError> {
        let call = self.lottery.method::<_, ()>("returnTokens", amount)?;
        self.send_tx(call).await
    }
}
