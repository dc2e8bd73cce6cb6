use std::sync::{Arc, RwLock};

use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, U256};
use ethers::utils::{format_ether, parse_ether};

use crate::domain::models::{amount_or_zero, format_timestamp, ExchangeParameters};
use crate::domain::services::{ContractError, LotteryApi};
use crate::infrastructure::contracts::{config, LotteryClient, NetworkConfig};

// ============ VIEW STATE ============

/// Everything the user-facing panel renders, already formatted for display.
///
/// Action failures never raise; they land in the matching `*_error` marker
/// and the rest of the view stays as it was.
#[derive(Debug, Clone)]
pub struct PanelView {
    pub lottery_address: String,
    pub token_address: String,
    pub wallet_address: String,
    pub eth_balance: String,
    pub token_balance: String,
    pub prize: String,
    pub purchase_ratio: String,
    pub bet_price: String,
    pub bet_fee: String,
    pub state: String,
    pub block_time: String,
    pub closing_time: String,
    pub buy_error: Option<&'static str>,
    pub bet_error: Option<&'static str>,
    pub close_error: Option<&'static str>,
    pub claim_error: Option<&'static str>,
    pub burn_error: Option<&'static str>,
}

impl Default for PanelView {
    fn default() -> Self {
        Self {
            lottery_address: "NO LOTTERY CONNECTED".to_string(),
            token_address: "NO TOKEN CONNECTED".to_string(),
            wallet_address: String::new(),
            eth_balance: String::new(),
            token_balance: String::new(),
            prize: String::new(),
            purchase_ratio: String::new(),
            bet_price: String::new(),
            bet_fee: String::new(),
            state: String::new(),
            block_time: String::new(),
            closing_time: String::new(),
            buy_error: None,
            bet_error: None,
            close_error: None,
            claim_error: None,
            burn_error: None,
        }
    }
}

const LOADING: &str = "LOADING...";

struct SessionState<A> {
    wallet: Option<LocalWallet>,
    api: Option<Arc<A>>,
    params: Option<ExchangeParameters>,
}

impl<A> Default for SessionState<A> {
    fn default() -> Self {
        Self {
            wallet: None,
            api: None,
            params: None,
        }
    }
}

// ============ USER PANEL ============

/// Session-scoped state machine behind the participant panel: one wallet,
/// at most one connected lottery, and the view derived from both.
///
/// Generic over the contract client so the action sequencing (approval
/// before spending calls, refresh after every confirmed mutation) can be
/// tested without a chain.
pub struct UserPanel<A> {
    network: NetworkConfig,
    session: RwLock<SessionState<A>>,
    view: tokio::sync::RwLock<PanelView>,
}

impl<A: LotteryApi> UserPanel<A> {
    pub fn empty(network: NetworkConfig) -> Self {
        Self {
            network,
            session: RwLock::new(SessionState::default()),
            view: tokio::sync::RwLock::new(PanelView::default()),
        }
    }

    /// Attach an already-connected client. Used by `connect_lottery` and by
    /// tests that supply a stand-in.
    pub async fn with_api(&self, api: Arc<A>, params: ExchangeParameters) {
        let address = api.wallet_address();
        {
            let mut session = self.session.write().unwrap_or_else(|e| e.into_inner());
            session.api = Some(api);
            session.params = Some(params);
        }
        {
            let mut view = self.view.write().await;
            view.wallet_address = format!("{:?}", address);
            view.purchase_ratio = params.purchase_ratio.to_string();
            view.bet_price = format_ether(params.bet_price);
            view.bet_fee = format_ether(params.bet_fee);
        }
        self.refresh().await;
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub async fn view(&self) -> PanelView {
        self.view.read().await.clone()
    }

    // ---- wallet management ----

    /// Generate a fresh random wallet for this session.
    pub async fn create_wallet(&self) -> Address {
        let wallet = LocalWallet::new(&mut ethers::core::rand::thread_rng());
        self.install_wallet(wallet).await
    }

    /// Import a wallet from either a private key or a BIP-39 seed phrase.
    /// Anything containing whitespace is treated as a phrase.
    pub async fn import_wallet(&self, material: &str) -> Result<Address, ContractError> {
        let trimmed = material.trim();
        let wallet = if trimmed.contains(char::is_whitespace) {
            config::wallet_from_mnemonic(trimmed)?
        } else {
            trimmed
                .parse::<LocalWallet>()
                .map_err(|e| ContractError::InvalidKey(e.to_string()))?
        };
        Ok(self.install_wallet(wallet).await)
    }

    async fn install_wallet(&self, wallet: LocalWallet) -> Address {
        let address = wallet.address();
        {
            let mut session = self.session.write().unwrap_or_else(|e| e.into_inner());
            session.wallet = Some(wallet);
        }
        self.view.write().await.wallet_address = format!("{:?}", address);
        address
    }

    pub fn wallet(&self) -> Option<LocalWallet> {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .wallet
            .clone()
    }

    fn session_api(&self) -> Result<(Arc<A>, ExchangeParameters), ContractError> {
        let session = self.session.read().unwrap_or_else(|e| e.into_inner());
        match (&session.api, session.params) {
            (Some(api), Some(params)) => Ok((api.clone(), params)),
            _ => Err(ContractError::ContractCallError(
                "No lottery connected".to_string(),
            )),
        }
    }

    // ---- participant actions ----

    /// Swap native currency for payment tokens. The transaction value is the
    /// requested token amount divided by the purchase ratio.
    pub async fn buy_tokens(&self, amount: &str) {
        self.view.write().await.buy_error = None;
        let result = async {
            let (api, params) = self.session_api()?;
            let tokens = parse_ether(amount_or_zero(amount))
                .map_err(|e| ContractError::InvalidAmount(e.to_string()))?;
            let value = tokens / U256::from(params.purchase_ratio);
            api.purchase_tokens(value).await
        }
        .await;

        match result {
            Ok(_) => self.refresh().await,
            Err(_) => self.view.write().await.buy_error = Some("BUY ERROR"),
        }
    }

    /// Place one or more bets. The lottery spends payment tokens, so an
    /// unlimited allowance is granted first; if that grant fails the bet is
    /// never attempted.
    pub async fn bet(&self, times: &str) {
        self.view.write().await.bet_error = None;
        let api = match self.session_api() {
            Ok((api, _)) => api,
            Err(_) => {
                self.view.write().await.bet_error = Some("BET ERROR");
                return;
            }
        };
        let count: u64 = match amount_or_zero(times).parse() {
            Ok(count) => count,
            Err(_) => {
                self.view.write().await.bet_error = Some("BET ERROR");
                return;
            }
        };

        if api.approve_payment_token().await.is_err() {
            self.view.write().await.bet_error = Some("APPROVE ERROR");
            return;
        }
        match api.bet_many(count).await {
            Ok(_) => self.refresh().await,
            Err(_) => self.view.write().await.bet_error = Some("BET ERROR"),
        }
    }

    /// Close the lottery once the betting window has elapsed. Any account may
    /// trigger this.
    pub async fn close_lottery(&self) {
        self.view.write().await.close_error = None;
        let result = async {
            let (api, _) = self.session_api()?;
            api.close_lottery().await
        }
        .await;

        match result {
            Ok(_) => self.refresh().await,
            Err(_) => self.view.write().await.close_error = Some("CLOSE ERROR"),
        }
    }

    /// Withdraw winnings from the prize pool into the token balance.
    pub async fn claim_prize(&self, amount: &str) {
        self.view.write().await.claim_error = None;
        let result = async {
            let (api, _) = self.session_api()?;
            let amount = parse_ether(amount_or_zero(amount))
                .map_err(|e| ContractError::InvalidAmount(e.to_string()))?;
            api.prize_withdraw(amount).await
        }
        .await;

        match result {
            Ok(_) => self.refresh().await,
            Err(_) => self.view.write().await.claim_error = Some("CLAIM ERROR"),
        }
    }

    /// Return payment tokens to the lottery for native currency. Burning
    /// spends tokens, so it needs the same allowance grant as betting.
    pub async fn burn_tokens(&self, amount: &str) {
        self.view.write().await.burn_error = None;
        let (api, _) = match self.session_api() {
            Ok(pair) => pair,
            Err(_) => {
                self.view.write().await.burn_error = Some("BURN ERROR");
                return;
            }
        };
        let amount = match parse_ether(amount_or_zero(amount)) {
            Ok(amount) => amount,
            Err(_) => {
                self.view.write().await.burn_error = Some("BURN ERROR");
                return;
            }
        };

        if api.approve_payment_token().await.is_err() {
            self.view.write().await.burn_error = Some("APPROVE ERROR");
            return;
        }
        match api.return_tokens(amount).await {
            Ok(_) => self.refresh().await,
            Err(_) => self.view.write().await.burn_error = Some("BURN ERROR"),
        }
    }

    // ---- view maintenance ----

    /// Re-read everything the panel shows. Mutations invalidate the whole
    /// view, so the panel marks it as loading and fetches from scratch.
    pub async fn refresh(&self) {
        let api = match self.session_api() {
            Ok((api, _)) => api,
            Err(_) => return,
        };

        {
            let mut view = self.view.write().await;
            view.eth_balance = LOADING.to_string();
            view.token_balance = LOADING.to_string();
            view.prize = LOADING.to_string();
            view.state = LOADING.to_string();
        }

        let state = api.lottery_state().await;
        let now = api.current_block_timestamp().await;
        let native = api.native_balance().await;
        let token = api.token_balance().await;
        let prize = api.prize_balance().await;

        let mut view = self.view.write().await;
        if let Ok(state) = state {
            view.state = if state.open { "OPEN" } else { "CLOSED" }.to_string();
            view.closing_time = if state.open {
                format_timestamp(state.closing_time)
            } else {
                String::new()
            };
        }
        if let Ok(now) = now {
            view.block_time = format_timestamp(now);
        }
        if let Ok(native) = native {
            view.eth_balance = format_ether(native);
        }
        if let Ok(token) = token {
            view.token_balance = format_ether(token);
        }
        if let Ok(prize) = prize {
            view.prize = format_ether(prize);
        }
    }
}

impl UserPanel<LotteryClient> {
    pub fn new(network: NetworkConfig) -> Self {
        Self::empty(network)
    }

    /// Connect the session wallet to a deployed lottery. Exchange parameters
    /// never change after deployment, so they are fetched once here.
    pub async fn connect_lottery(&self, lottery_address: Address) -> Result<(), ContractError> {
        let wallet = self.wallet().ok_or_else(|| {
            ContractError::InvalidKey("No wallet in session, create or import one".to_string())
        })?;

        let client =
            LotteryClient::connect(self.network.clone(), wallet, lottery_address).await?;
        let params = client.exchange_parameters().await?;

        {
            let mut view = self.view.write().await;
            view.lottery_address = format!("{:?}", client.lottery_address());
            view.token_address = format!("{:?}", client.token_address());
        }
        self.with_api(Arc::new(client), params).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::contracts::config::anvil_config;
    use crate::tests::mock::RecordingApi;

    fn params() -> ExchangeParameters {
        ExchangeParameters {
            purchase_ratio: 100,
            bet_price: U256::exp10(18),
            bet_fee: U256::exp10(17) * 2,
        }
    }

    async fn connected_panel(api: Arc<RecordingApi>) -> UserPanel<RecordingApi> {
        let panel = UserPanel::empty(anvil_config());
        panel.with_api(api, params()).await;
        panel
    }

    #[tokio::test]
    async fn fresh_panel_shows_placeholders() {
        let panel: UserPanel<RecordingApi> = UserPanel::empty(anvil_config());
        let view = panel.view().await;
        assert_eq!(view.lottery_address, "NO LOTTERY CONNECTED");
        assert_eq!(view.token_address, "NO TOKEN CONNECTED");
        assert!(view.wallet_address.is_empty());
    }

    #[tokio::test]
    async fn wallet_creation_updates_the_view() {
        let panel: UserPanel<RecordingApi> = UserPanel::empty(anvil_config());
        let address = panel.create_wallet().await;
        let view = panel.view().await;
        assert_eq!(view.wallet_address, format!("{:?}", address));
        assert!(panel.wallet().is_some());
    }

    #[tokio::test]
    async fn wallet_import_accepts_key_and_phrase() {
        let panel: UserPanel<RecordingApi> = UserPanel::empty(anvil_config());
        let from_key = panel
            .import_wallet("0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80")
            .await
            .unwrap();
        let from_phrase = panel
            .import_wallet("test test test test test test test test test test test junk")
            .await
            .unwrap();
        assert_eq!(from_key, from_phrase);
        assert!(panel.import_wallet("garbage").await.is_err());
    }

    #[tokio::test]
    async fn buy_divides_by_the_purchase_ratio() {
        let api = Arc::new(RecordingApi::new());
        let panel = connected_panel(api.clone()).await;
        panel.buy_tokens("5").await;
        // 5 tokens at ratio 100 cost 0.05 native.
        assert!(api
            .calls()
            .contains(&"purchaseTokens(50000000000000000)".to_string()));
        assert_eq!(panel.view().await.buy_error, None);
    }

    #[tokio::test]
    async fn empty_buy_amount_counts_as_zero() {
        let api = Arc::new(RecordingApi::new());
        let panel = connected_panel(api.clone()).await;
        panel.buy_tokens("  ").await;
        assert!(api.calls().contains(&"purchaseTokens(0)".to_string()));
    }

    #[tokio::test]
    async fn malformed_buy_amount_sets_the_marker() {
        let api = Arc::new(RecordingApi::new());
        let panel = connected_panel(api.clone()).await;
        panel.buy_tokens("five").await;
        assert_eq!(panel.view().await.buy_error, Some("BUY ERROR"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn bet_approves_before_betting() {
        let api = Arc::new(RecordingApi::new());
        let panel = connected_panel(api.clone()).await;
        panel.bet("2").await;
        let calls = api.calls();
        let approve_at = calls.iter().position(|c| c == "approve").unwrap();
        let bet_at = calls.iter().position(|c| c == "betMany(2)").unwrap();
        assert!(approve_at < bet_at);
        assert_eq!(panel.view().await.bet_error, None);
    }

    #[tokio::test]
    async fn failed_approval_blocks_the_bet() {
        let api = Arc::new(RecordingApi::new().failing("approve"));
        let panel = connected_panel(api.clone()).await;
        panel.bet("2").await;
        assert_eq!(panel.view().await.bet_error, Some("APPROVE ERROR"));
        assert!(!api.calls().iter().any(|c| c.starts_with("betMany")));
    }

    #[tokio::test]
    async fn failed_bet_sets_its_own_marker() {
        let api = Arc::new(RecordingApi::new().failing("betMany"));
        let panel = connected_panel(api.clone()).await;
        panel.bet("1").await;
        assert_eq!(panel.view().await.bet_error, Some("BET ERROR"));
    }

    #[tokio::test]
    async fn failed_approval_blocks_the_burn() {
        let api = Arc::new(RecordingApi::new().failing("approve"));
        let panel = connected_panel(api.clone()).await;
        panel.burn_tokens("3").await;
        // The marker belongs to the burn flow, not the bet flow.
        let view = panel.view().await;
        assert_eq!(view.burn_error, Some("APPROVE ERROR"));
        assert_eq!(view.bet_error, None);
        assert!(!api.calls().iter().any(|c| c.starts_with("returnTokens")));
    }

    #[tokio::test]
    async fn burn_returns_the_scaled_amount() {
        let api = Arc::new(RecordingApi::new());
        let panel = connected_panel(api.clone()).await;
        panel.burn_tokens("3").await;
        assert!(api
            .calls()
            .contains(&"returnTokens(3000000000000000000)".to_string()));
    }

    #[tokio::test]
    async fn claim_failure_sets_the_marker() {
        let api = Arc::new(RecordingApi::new().failing("prizeWithdraw"));
        let panel = connected_panel(api.clone()).await;
        panel.claim_prize("1").await;
        assert_eq!(panel.view().await.claim_error, Some("CLAIM ERROR"));
    }

    #[tokio::test]
    async fn close_refreshes_the_view_on_success() {
        let api = Arc::new(RecordingApi::new().with_open_lottery(1_003_600));
        let panel = connected_panel(api.clone()).await;
        panel.close_lottery().await;
        assert!(api.calls().contains(&"closeLottery".to_string()));
        assert_eq!(panel.view().await.close_error, None);
        // The mock stays open; the point is that the state was re-read.
        assert_eq!(panel.view().await.state, "OPEN");
    }

    #[tokio::test]
    async fn successful_action_clears_a_stale_marker() {
        let api = Arc::new(RecordingApi::new().failing("purchaseTokens"));
        let panel = connected_panel(api.clone()).await;
        panel.buy_tokens("1").await;
        assert_eq!(panel.view().await.buy_error, Some("BUY ERROR"));
        api.clear_failures();
        panel.buy_tokens("1").await;
        assert_eq!(panel.view().await.buy_error, None);
    }

    #[tokio::test]
    async fn refresh_formats_balances_and_state() {
        let api = Arc::new(RecordingApi::new().with_open_lottery(1_700_000_000));
        let panel = connected_panel(api.clone()).await;
        let view = panel.view().await;
        assert_eq!(view.state, "OPEN");
        assert_eq!(view.closing_time, "2023-11-14 22:13:20 UTC");
        assert_eq!(view.purchase_ratio, "100");
        // Mock holds 10 tokens and 1 native.
        assert!(view.token_balance.starts_with("10."));
        assert!(view.eth_balance.starts_with("1."));
    }
}
