use std::io::{BufRead, Write};
use std::sync::Arc;

use ethers::utils::format_ether;

use crate::domain::models::{format_timestamp, parse_token_amount};
use crate::domain::services::{ConsoleError, LotteryApi};

// ============ MENU ============

/// The operator actions the deployment console exposes. Option numbers are
/// part of the operator-facing contract and stay stable even where the
/// sequence has gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Exit,
    CheckState,
    OpenBets,
    CloseLottery,
    Withdraw,
}

impl MenuAction {
    pub fn parse(input: &str) -> Result<Self, ConsoleError> {
        match input.trim() {
            "0" => Ok(MenuAction::Exit),
            "1" => Ok(MenuAction::CheckState),
            "2" => Ok(MenuAction::OpenBets),
            "5" => Ok(MenuAction::CloseLottery),
            "7" => Ok(MenuAction::Withdraw),
            other => Err(ConsoleError::InvalidOption(other.to_string())),
        }
    }
}

// ============ ADMIN CONSOLE ============

/// Interactive deployment console for the lottery operator.
///
/// Generic over the input and output streams so the dispatch loop can run
/// against in-memory buffers in tests. An unrecognized selection aborts the
/// loop with an error; failures reported by the chain are printed and the
/// menu comes back.
pub struct AdminConsole<A, R, W> {
    api: Arc<A>,
    input: R,
    output: W,
}

impl<A, R, W> AdminConsole<A, R, W>
where
    A: LotteryApi,
    R: BufRead,
    W: Write,
{
    pub fn new(api: Arc<A>, input: R, output: W) -> Self {
        Self { api, input, output }
    }

    pub async fn run(&mut self) -> Result<(), ConsoleError> {
        loop {
            self.print_menu()?;
            let selection = self.read_line()?;
            match MenuAction::parse(&selection)? {
                MenuAction::Exit => {
                    writeln!(self.output, "Exiting")?;
                    return Ok(());
                }
                MenuAction::CheckState => {
                    if let Err(e) = self.check_state().await {
                        writeln!(self.output, "{}", e)?;
                    }
                }
                MenuAction::OpenBets => {
                    if let Err(e) = self.open_bets().await {
                        writeln!(self.output, "{}", e)?;
                    }
                }
                MenuAction::CloseLottery => {
                    if let Err(e) = self.close_lottery().await {
                        writeln!(self.output, "{}", e)?;
                    }
                }
                MenuAction::Withdraw => {
                    if let Err(e) = self.withdraw().await {
                        writeln!(self.output, "{}", e)?;
                    }
                }
            }
        }
    }

    fn print_menu(&mut self) -> Result<(), ConsoleError> {
        writeln!(self.output)?;
        writeln!(self.output, "Select operation:")?;
        writeln!(self.output, "[0] Exit")?;
        writeln!(self.output, "[1] Check state")?;
        writeln!(self.output, "[2] Open bets")?;
        writeln!(self.output, "[5] Close bets")?;
        writeln!(self.output, "[7] Withdraw")?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, ConsoleError> {
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line)
    }

    async fn check_state(&mut self) -> Result<(), ConsoleError> {
        let state = self.api.lottery_state().await?;
        writeln!(
            self.output,
            "The lottery is {}",
            if state.open { "open" } else { "closed" }
        )?;
        if state.open {
            let now = self.api.current_block_timestamp().await?;
            writeln!(
                self.output,
                "The last block was mined at {}",
                format_timestamp(now)
            )?;
            writeln!(
                self.output,
                "Lottery should close at {}",
                format_timestamp(state.closing_time)
            )?;
        }
        Ok(())
    }

    async fn open_bets(&mut self) -> Result<(), ConsoleError> {
        writeln!(self.output, "Input duration (in seconds):")?;
        let raw = self.read_line()?;
        let duration: u64 = raw.trim().parse()?;
        let outcome = self.api.open_bets_in(duration).await?;
        writeln!(
            self.output,
            "Bets opened ({})",
            outcome.transaction_hash
        )?;
        Ok(())
    }

    async fn close_lottery(&mut self) -> Result<(), ConsoleError> {
        let outcome = self.api.close_lottery().await?;
        writeln!(self.output, "Bets closed ({})", outcome.transaction_hash)?;
        Ok(())
    }

    async fn withdraw(&mut self) -> Result<(), ConsoleError> {
        let token_balance = self.api.token_balance().await?;
        let pool = self.api.owner_pool().await?;
        writeln!(
            self.output,
            "You have a balance of {} tokens",
            format_ether(token_balance)
        )?;
        writeln!(
            self.output,
            "The owner pool has {} tokens of collected fees",
            format_ether(pool)
        )?;
        writeln!(self.output, "Input amount to withdraw:")?;
        let raw = self.read_line()?;
        let amount = parse_token_amount(&raw)?;
        let outcome = self.api.owner_withdraw(amount).await?;
        writeln!(
            self.output,
            "Withdraw confirmed ({})",
            outcome.transaction_hash
        )?;
        Ok(())
    }
}
