use std::io::{self, BufRead, Write};

use dotenvy::dotenv;
use ethers::types::Address;

use lottery_client::infrastructure::contracts::config;
use lottery_client::panel::{PanelView, UserPanel};

const HELP: &str = "Commands:
  wallet new              create a fresh wallet for this session
  wallet import <key|seed phrase>
  connect <address>       attach to a deployed lottery
  show                    display the panel state
  buy <amount>            swap native currency for tokens
  bet <times>             place one or more bets
  close                   close the lottery after the window elapses
  claim <amount>          withdraw winnings from the prize pool
  burn <amount>           return tokens for native currency
  exit";

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let network = config::network_from_env();
    println!("Lottery panel on {} (chain id {})", network.name, network.chain_id);
    println!("{}", HELP);

    let panel = UserPanel::new(network);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        let _ = io::stdout().flush();
        let line = match lines.next() {
            Some(Ok(line)) => line,
            _ => break,
        };
        let mut parts = line.split_whitespace();
        let command = match parts.next() {
            Some(command) => command,
            None => continue,
        };
        let rest: Vec<&str> = parts.collect();

        match (command, rest.as_slice()) {
            ("exit", _) => break,
            ("help", _) => println!("{}", HELP),
            ("wallet", ["new"]) => {
                let address = panel.create_wallet().await;
                println!("Wallet created: {:?}", address);
            }
            ("wallet", ["import", material @ ..]) if !material.is_empty() => {
                match panel.import_wallet(&material.join(" ")).await {
                    Ok(address) => println!("Wallet imported: {:?}", address),
                    Err(e) => println!("{}", e),
                }
            }
            ("connect", [raw]) => match raw.parse::<Address>() {
                Ok(address) => match panel.connect_lottery(address).await {
                    Ok(()) => println!("Connected"),
                    Err(e) => println!("{}", e),
                },
                Err(e) => println!("Invalid address: {}", e),
            },
            ("show", _) => print_view(&panel.view().await),
            ("buy", args) => {
                panel.buy_tokens(&args.join(" ")).await;
                print_view(&panel.view().await);
            }
            ("bet", args) => {
                panel.bet(&args.join(" ")).await;
                print_view(&panel.view().await);
            }
            ("close", _) => {
                panel.close_lottery().await;
                print_view(&panel.view().await);
            }
            ("claim", args) => {
                panel.claim_prize(&args.join(" ")).await;
                print_view(&panel.view().await);
            }
            ("burn", args) => {
                panel.burn_tokens(&args.join(" ")).await;
                print_view(&panel.view().await);
            }
            _ => println!("Unknown command, type 'help'"),
        }
    }
}

fn print_view(view: &PanelView) {
    println!("Lottery:  {}", view.lottery_address);
    println!("Token:    {}", view.token_address);
    if !view.wallet_address.is_empty() {
        println!("Wallet:   {}", view.wallet_address);
        println!("ETH:      {}", view.eth_balance);
        println!("Tokens:   {}", view.token_balance);
        println!("Prize:    {}", view.prize);
    }
    if !view.state.is_empty() {
        println!("State:    {}", view.state);
        if !view.closing_time.is_empty() {
            println!("Closes:   {}", view.closing_time);
        }
        println!("Ratio:    {}", view.purchase_ratio);
        println!("Price:    {}", view.bet_price);
        println!("Fee:      {}", view.bet_fee);
    }
    for marker in [
        view.buy_error,
        view.bet_error,
        view.close_error,
        view.claim_error,
        view.burn_error,
    ]
    .into_iter()
    .flatten()
    {
        println!("{}", marker);
    }
}
