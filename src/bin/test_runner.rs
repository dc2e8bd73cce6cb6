use lottery_client::tests::lottery_tests::{
    test_connection, test_lottery_lifecycle, test_owner_withdraw, test_player_flow,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Lottery Client Test Runner");
    println!("==========================\n");

    let args: Vec<String> = std::env::args().collect();
    let test_name = args.get(1).map(|s| s.as_str()).unwrap_or("all");

    match test_name {
        "connection" => {
            test_connection().await?;
        }
        "lifecycle" => {
            test_lottery_lifecycle().await?;
        }
        "player" => {
            test_player_flow().await?;
        }
        "withdraw" => {
            test_owner_withdraw().await?;
        }
        "all" => {
            test_connection().await?;
            test_lottery_lifecycle().await?;
            test_player_flow().await?;
            test_owner_withdraw().await?;
            println!("\nAll tests passed");
        }
        other => {
            eprintln!("Unknown test: {}", other);
            eprintln!("Available: connection, lifecycle, player, withdraw, all");
            std::process::exit(1);
        }
    }

    Ok(())
}
