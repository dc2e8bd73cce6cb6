use std::io::{stdin, stdout};
use std::sync::Arc;

use dotenvy::dotenv;

use lottery_client::console::AdminConsole;
use lottery_client::domain::models::DeployParams;
use lottery_client::infrastructure::contracts::{config, LotteryClient};

#[tokio::main]
async fn main() {
    // Load .env file
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let network = config::network_from_env();
    let wallet = config::wallet_from_env(&network)?;
    tracing::info!("Using network {} (chain id {})", network.name, network.chain_id);

    // Attach to a deployed lottery when one is configured, otherwise deploy a
    // fresh pair of contracts.
    let client = match config::lottery_address_from_env()? {
        Some(address) => {
            tracing::info!("Connecting to lottery at {:?}", address);
            LotteryClient::connect(network, wallet, address).await?
        }
        None => {
            tracing::info!("No lottery configured, deploying a new one");
            let client = LotteryClient::deploy(network, wallet, DeployParams::standard()).await?;
            println!("Lottery contract deployed at {:?}", client.lottery_address());
            println!("Token contract deployed at {:?}", client.token_address());
            client
        }
    };

    let mut console = AdminConsole::new(Arc::new(client), stdin().lock(), stdout());
    console.run().await?;
    Ok(())
}
