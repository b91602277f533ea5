//! API credential loading
//!
//! The hosted model key is read from the environment and kept in a
//! `Zeroizing<String>` so it is wiped from memory when dropped.

use std::env;
use tracing::{info, warn};
use zeroize::Zeroizing;

/// Primary and fallback variable names for the model credential
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("Secret validation failed: {0}")]
    ValidationFailed(String),
}

/// Load the first non-empty credential among [`API_KEY_VARS`]
pub fn load_api_key() -> Result<Zeroizing<String>, SecretError> {
    for var in API_KEY_VARS {
        match load_from_env(var) {
            Ok(secret) => {
                info!("✓ Loaded model credential from {}", var);
                return Ok(secret);
            }
            Err(SecretError::ValidationFailed(reason)) => {
                warn!("Ignoring {}: {}", var, reason);
            }
            Err(_) => {}
        }
    }
    Err(SecretError::EnvVarNotSet(API_KEY_VARS.join(" or ")))
}

fn load_from_env(env_var_name: &str) -> Result<Zeroizing<String>, SecretError> {
    let secret = env::var(env_var_name)
        .map(Zeroizing::new)
        .map_err(|_| SecretError::EnvVarNotSet(env_var_name.to_string()))?;
    if secret.trim().is_empty() {
        return Err(SecretError::ValidationFailed("value is empty".to_string()));
    }
    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_env() {
        env::set_var("GOLDMASTER_TEST_SECRET", "abc123");
        let result = load_from_env("GOLDMASTER_TEST_SECRET");
        assert_eq!(*result.unwrap(), "abc123");
        env::remove_var("GOLDMASTER_TEST_SECRET");
    }

    #[test]
    fn test_load_from_env_missing() {
        assert!(matches!(
            load_from_env("GOLDMASTER_NONEXISTENT_VAR"),
            Err(SecretError::EnvVarNotSet(_))
        ));
    }

    #[test]
    fn test_blank_value_rejected() {
        env::set_var("GOLDMASTER_TEST_BLANK", "   ");
        let result = load_from_env("GOLDMASTER_TEST_BLANK");
        env::remove_var("GOLDMASTER_TEST_BLANK");
        assert!(matches!(result, Err(SecretError::ValidationFailed(_))));
    }
}
