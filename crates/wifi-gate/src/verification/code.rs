//! Verification code policy.

use rand::Rng;
use serde::Deserialize;
use wifi_gate_common::constants::{CODE_MAX, CODE_MIN};

/// How the expected code for a new or reset record is chosen
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum CodePolicy {
    /// Fresh 6-digit code per request
    #[default]
    Random,
    /// One operator-configured code shared by everyone
    Fixed {
        #[serde(alias = "fixedCode")]
        fixed_code: String,
    },
}

impl CodePolicy {
    /// Produce the code for a new or reset record
    pub fn issue_code(&self) -> String {
        match self {
            Self::Random => rand::rng().random_range(CODE_MIN..=CODE_MAX).to_string(),
            Self::Fixed { fixed_code } => fixed_code.clone(),
        }
    }

    pub fn fixed_code(&self) -> Option<&str> {
        match self {
            Self::Random => None,
            Self::Fixed { fixed_code } => Some(fixed_code),
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Fixed { .. } => "fixed",
        }
    }
}
