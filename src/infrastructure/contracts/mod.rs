// Contract integration module
// This module handles all smart contract interactions

pub mod abis;
pub mod client;
pub mod config;
pub mod types;

// Re-export main components for easy access
pub use client::LotteryClient;
pub use types::*;
