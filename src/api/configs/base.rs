use std::env;

use anyhow::{anyhow, Result};

pub trait ConfigLoader {
    /// Helper function to get environment variables with error handling
    fn get_env(key: &str, required: bool, default: Option<String>) -> Result<Option<String>> {
        match env::var(key) {
            Ok(value) if !value.trim().is_empty() => Ok(Some(value)),
            Ok(_) | Err(env::VarError::NotPresent) if !required => Ok(default),
            Ok(_) | Err(env::VarError::NotPresent) => Err(anyhow!(
                "Environment variable '{}' is required but not set.",
                key
            )),
            Err(e) => Err(anyhow!("Environment variable '{}' is invalid: {}", key, e)),
        }
    }
}
