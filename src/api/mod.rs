pub mod client;
pub mod configs;
pub mod types;
pub mod utils;

pub use client::ClaudeClient;
