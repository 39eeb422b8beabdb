pub mod api;
pub mod chat;
pub mod commands;
pub mod errors;
pub mod store;
pub mod stream;
