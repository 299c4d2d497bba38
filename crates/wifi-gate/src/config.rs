//! Configuration management for Wifi Gate.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;

use wifi_gate_common::constants::{
    DEFAULT_JWT_SECRET, DEFAULT_LISTEN_ADDR, DEFAULT_WIFI_PASSWORD, TOKEN_TTL_SECS,
};

use crate::verification::CodePolicy;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// WiFi network configuration
    #[serde(default)]
    pub wifi: WifiConfig,

    /// Session token configuration
    #[serde(default)]
    pub token: TokenConfig,

    /// Verification code configuration
    #[serde(default)]
    pub verification: VerificationConfig,
}

/// The network being gated
#[derive(Debug, Clone, Deserialize)]
pub struct WifiConfig {
    /// Password revealed after verification
    #[serde(default = "default_wifi_password")]
    pub password: String,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            password: default_wifi_password(),
        }
    }
}

/// Session token settings
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// HMAC signing secret
    #[serde(default = "default_jwt_secret")]
    pub secret: String,

    /// Session validity in seconds
    #[serde(default = "default_token_ttl")]
    pub ttl_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: default_jwt_secret(),
            ttl_secs: default_token_ttl(),
        }
    }
}

/// Verification settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerificationConfig {
    /// Random or fixed code
    #[serde(default)]
    pub code: CodePolicy,

    /// Fixed mode: create records on verify for phones that never requested a code
    #[serde(default)]
    pub create_on_verify: bool,

    /// Write issued codes to the log (development only)
    #[serde(default)]
    pub reveal_codes: bool,
}

// Default value functions
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_wifi_password() -> String { DEFAULT_WIFI_PASSWORD.to_string() }
fn default_jwt_secret() -> String { DEFAULT_JWT_SECRET.to_string() }
fn default_token_ttl() -> u64 { TOKEN_TTL_SECS } // 24 hours

const MAX_TOKEN_TTL_SECS: u64 = 365 * 86_400;

/// Values that override the config file (CLI flags and environment)
#[derive(Debug, Default)]
pub struct Overrides {
    pub listen: Option<String>,
    pub jwt_secret: Option<String>,
    pub wifi_password: Option<String>,
    pub fixed_code: Option<String>,
    pub reveal_codes: bool,
}

impl From<&super::Args> for Overrides {
    fn from(args: &super::Args) -> Self {
        Self {
            listen: args.listen.clone(),
            jwt_secret: args.jwt_secret.clone(),
            wifi_password: args.wifi_password.clone(),
            fixed_code: args.fixed_code.clone(),
            reveal_codes: args.reveal_codes,
        }
    }
}

impl AppConfig {
    /// Load configuration from file, with CLI/environment overrides
    pub fn load(config_path: &str, overrides: Overrides) -> Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            let settings = config::Config::builder()
                .add_source(config::File::with_name(config_path))
                .build()
                .context("Failed to load config file")?;

            settings
                .try_deserialize()
                .context("Failed to parse config")?
        } else {
            // Use defaults if config file doesn't exist
            tracing::warn!("Config file not found, using defaults");
            Self::default()
        };

        config.apply(overrides);
        config.validate()?;

        if config.token.secret == DEFAULT_JWT_SECRET {
            tracing::warn!("Using the placeholder JWT secret; set JWT_SECRET in production");
        }

        Ok(config)
    }

    fn apply(&mut self, overrides: Overrides) {
        if let Some(listen) = overrides.listen {
            self.listen_addr = listen;
        }
        if let Some(secret) = overrides.jwt_secret {
            self.token.secret = secret;
        }
        if let Some(password) = overrides.wifi_password {
            self.wifi.password = password;
        }
        if let Some(fixed_code) = overrides.fixed_code {
            self.verification.code = CodePolicy::Fixed { fixed_code };
        }
        if overrides.reveal_codes {
            self.verification.reveal_codes = true;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.token.secret.is_empty() {
            bail!("token.secret must not be empty");
        }
        if self.wifi.password.is_empty() {
            bail!("wifi.password must not be empty");
        }
        if self.token.ttl_secs == 0 || self.token.ttl_secs > MAX_TOKEN_TTL_SECS {
            bail!("token.ttl_secs out of range: {}", self.token.ttl_secs);
        }
        if let CodePolicy::Fixed { fixed_code } = &self.verification.code {
            if fixed_code.is_empty() {
                bail!("verification.code.fixed_code must not be empty");
            }
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            wifi: WifiConfig::default(),
            token: TokenConfig::default(),
            verification: VerificationConfig::default(),
        }
    }
}
