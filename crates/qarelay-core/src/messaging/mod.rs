//! Cross-transport abstractions (Telegram and console today).

pub mod port;
pub mod types;
