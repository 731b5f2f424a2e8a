use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::builder::VALIDITY_PERIOD_FIELD;
use crate::error::{Error, Result};
use crate::keys::{KEY_ALGORITHM_FIELD, PRIVATE_KEY_FIELD, PUBLIC_KEY_FIELD};

pub const EARLY_RENEWAL_FIELD: &str = "early_renewal_hours";
pub const KEY_ID_FIELD: &str = "key_id";
pub const VALID_PRINCIPALS_FIELD: &str = "valid_principals";
pub const CRITICAL_OPTIONS_FIELD: &str = "critical_options";
pub const EXTENSIONS_FIELD: &str = "extensions";

/// Inputs of one certificate.
///
/// `key_algorithm` is kept as written so that an unknown name surfaces as an
/// unsupported-algorithm error at issuance rather than as a decode error.
///
/// `Debug` is manually implemented to redact `private_key_pem`, which is also
/// wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateConfig {
    pub key_algorithm: String,
    pub private_key_pem: String,
    pub public_key_openssh: String,
    pub validity_period_hours: u64,
    #[serde(default = "default_early_renewal_hours")]
    pub early_renewal_hours: u64,
    #[serde(default)]
    pub key_id: Option<String>,
    pub valid_principals: Vec<String>,
    #[serde(default)]
    pub critical_options: Vec<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl CertificateConfig {
    /// Check field constraints that do not need any key parsing.
    pub fn validate(&self) -> Result<()> {
        if self.key_algorithm.trim().is_empty() {
            return Err(Error::invalid(KEY_ALGORITHM_FIELD, "must not be empty"));
        }
        if self.private_key_pem.trim().is_empty() {
            return Err(Error::invalid(PRIVATE_KEY_FIELD, "must not be empty"));
        }
        if self.public_key_openssh.trim().is_empty() {
            return Err(Error::invalid(PUBLIC_KEY_FIELD, "must not be empty"));
        }
        if self.validity_period_hours == 0 {
            return Err(Error::invalid(VALIDITY_PERIOD_FIELD, "must be greater than zero"));
        }
        Ok(())
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

impl std::fmt::Debug for CertificateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let private_key_pem = if self.private_key_pem.is_empty() {
            "[empty]"
        } else {
            "[redacted]"
        };
        f.debug_struct("CertificateConfig")
            .field("key_algorithm", &self.key_algorithm)
            .field("private_key_pem", &private_key_pem)
            .field("public_key_openssh", &self.public_key_openssh)
            .field("validity_period_hours", &self.validity_period_hours)
            .field("early_renewal_hours", &self.early_renewal_hours)
            .field("key_id", &self.key_id)
            .field("valid_principals", &self.valid_principals)
            .field("critical_options", &self.critical_options)
            .field("extensions", &self.extensions)
            .finish()
    }
}

impl Drop for CertificateConfig {
    fn drop(&mut self) {
        self.private_key_pem.zeroize();
    }
}

/// A file holding several named certificates.
///
/// ```toml
/// [certificate.web]
/// key_algorithm = "ECDSA"
/// private_key_pem = "..."
/// public_key_openssh = "ssh-ed25519 AAAA..."
/// validity_period_hours = 24
/// valid_principals = ["web.example.com"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub certificate: HashMap<String, CertificateConfig>,
}

impl Config {
    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

fn default_early_renewal_hours() -> u64 {
    0
}
