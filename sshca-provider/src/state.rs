//! Persisted resource state.
//!
//! The host stores one [`ResourceState`] per certificate between runs.  The
//! private key never enters the state: only [`hash_for_state`] of it is kept,
//! which is enough to tell whether the configured key has changed.

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use sshca_core::{CertificateConfig, ComputedAttributes};

use crate::ResourceKind;

/// SHA-1 hex digest of `value` with surrounding whitespace removed.
///
/// Empty input hashes to the empty string.
pub fn hash_for_state(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    Sha1::digest(value.trim().as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// The user-supplied inputs as recorded in state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredInputs {
    pub key_algorithm: String,
    /// [`hash_for_state`] of the configured PEM.
    pub private_key_pem: String,
    pub public_key_openssh: String,
    pub validity_period_hours: u64,
    pub early_renewal_hours: u64,
    #[serde(default)]
    pub key_id: Option<String>,
    pub valid_principals: Vec<String>,
    #[serde(default)]
    pub critical_options: Vec<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl From<&CertificateConfig> for StoredInputs {
    fn from(config: &CertificateConfig) -> Self {
        Self {
            key_algorithm: config.key_algorithm.clone(),
            private_key_pem: hash_for_state(&config.private_key_pem),
            public_key_openssh: config.public_key_openssh.clone(),
            validity_period_hours: config.validity_period_hours,
            early_renewal_hours: config.early_renewal_hours,
            key_id: config.key_id.clone(),
            valid_principals: config.valid_principals.clone(),
            critical_options: config.critical_options.clone(),
            extensions: config.extensions.clone(),
        }
    }
}

/// Everything the host persists for one certificate resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    pub kind: ResourceKind,
    pub inputs: StoredInputs,
    pub computed: ComputedAttributes,
}

impl ResourceState {
    /// Resource identity: the decimal certificate serial.
    pub fn id(&self) -> &str {
        &self.computed.id
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
