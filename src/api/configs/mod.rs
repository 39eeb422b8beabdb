pub mod base;
pub mod session;

pub use base::ConfigLoader;
pub use session::SessionConfig;
