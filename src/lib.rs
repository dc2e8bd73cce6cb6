pub mod console;
pub mod domain;
pub mod infrastructure;
pub mod panel;
pub mod tests;

// Main exports for external use
pub use console::{AdminConsole, MenuAction};
pub use domain::services::{ContractError, LotteryApi};
pub use infrastructure::contracts::LotteryClient;
pub use panel::{PanelView, UserPanel};
