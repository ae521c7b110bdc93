// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_path: PathBuf,
    /// HMAC key for session tokens. Must be overridden in production.
    pub auth_secret: String,
    pub cookie_name: String,
    /// Session token lifetime. Sessions are not renewed on activity.
    pub token_ttl: Duration,
    pub reset_token_ttl: Duration,
    pub max_body_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            database_path: PathBuf::from("cardkeep.sqlite"),
            auth_secret: "cardkeep-dev-secret-change-me".to_string(),
            cookie_name: "cardkeep_session".to_string(),
            token_ttl: Duration::from_secs(24 * 60 * 60),
            reset_token_ttl: Duration::from_secs(60 * 60),
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Rejects configurations that would start a server that cannot work.
pub fn validate_startup_config_contract(cfg: &AppConfig) -> Result<(), String> {
    if cfg.bind_addr.parse::<std::net::SocketAddr>().is_err() {
        return Err(format!("invalid bind address: {}", cfg.bind_addr));
    }
    if cfg.auth_secret.len() < 16 {
        return Err("auth secret must be at least 16 bytes".to_string());
    }
    if cfg.cookie_name.is_empty()
        || !cfg
            .cookie_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(format!("invalid cookie name: {}", cfg.cookie_name));
    }
    if cfg.token_ttl.is_zero() || cfg.reset_token_ttl.is_zero() {
        return Err("token lifetimes must be non-zero".to_string());
    }
    if cfg.max_body_bytes == 0 {
        return Err("max body bytes must be non-zero".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_the_startup_contract() {
        validate_startup_config_contract(&AppConfig::default()).expect("valid default");
    }

    #[test]
    fn short_secret_and_bad_cookie_name_are_rejected() {
        let mut cfg = AppConfig {
            auth_secret: "short".to_string(),
            ..AppConfig::default()
        };
        assert!(validate_startup_config_contract(&cfg).is_err());

        cfg.auth_secret = "long-enough-secret".to_string();
        cfg.cookie_name = "bad name;".to_string();
        assert!(validate_startup_config_contract(&cfg).is_err());
    }

    #[test]
    fn unparsable_bind_address_is_rejected() {
        let cfg = AppConfig {
            bind_addr: "not-an-addr".to_string(),
            ..AppConfig::default()
        };
        assert!(validate_startup_config_contract(&cfg).is_err());
    }
}
