//! Utility modules

pub mod wallet;

pub use wallet::WalletManager;
