//! Infrastructure-as-code resources for SSH certificates.
//!
//! Two resource types are registered, `ssh_host_cert` and `ssh_client_cert`.
//! They share one schema and one lifecycle and differ only in the
//! certificate type they stamp.

use serde::{Deserialize, Serialize};
use sshca_core::CertType;

pub mod resource;
pub mod schema;
pub mod state;

pub use resource::{CertificateResource, Plan, ReplaceReason};
pub use schema::{CERTIFICATE_FIELDS, FieldDescriptor, FieldSource, FieldType};
pub use state::{ResourceState, StoredInputs, hash_for_state};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    #[serde(rename = "ssh_host_cert")]
    HostCert,
    #[serde(rename = "ssh_client_cert")]
    ClientCert,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [Self::HostCert, Self::ClientCert];

    pub fn type_name(self) -> &'static str {
        match self {
            Self::HostCert => "ssh_host_cert",
            Self::ClientCert => "ssh_client_cert",
        }
    }

    pub fn cert_type(self) -> CertType {
        match self {
            Self::HostCert => CertType::Host,
            Self::ClientCert => CertType::Client,
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.type_name() == name)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("unknown resource type: {0}")]
    UnknownResource(String),
    #[error("state belongs to {found}, not {expected}")]
    KindMismatch {
        expected: ResourceKind,
        found: ResourceKind,
    },
    /// An in-place update was asked for although these inputs changed.
    #[error("changes to {} require replacement", .0.join(", "))]
    RequiresReplacement(Vec<&'static str>),
    #[error("invalid schema for {resource}: {reason}")]
    InvalidSchema {
        resource: ResourceKind,
        reason: String,
    },
    #[error(transparent)]
    Issue(#[from] sshca_core::Error),
}

/// Registry of the resource types this provider serves.
#[derive(Debug, Clone, Copy, Default)]
pub struct Provider;

impl Provider {
    pub fn new() -> Self {
        Self
    }

    /// Registered resource type names.
    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> {
        ResourceKind::ALL.into_iter().map(ResourceKind::type_name)
    }

    pub fn resource(&self, type_name: &str) -> Result<CertificateResource, ProviderError> {
        ResourceKind::from_type_name(type_name)
            .map(CertificateResource::new)
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }

    pub fn schema(&self, kind: ResourceKind) -> &'static [FieldDescriptor] {
        match kind {
            ResourceKind::HostCert | ResourceKind::ClientCert => CERTIFICATE_FIELDS,
        }
    }

    /// Check every registered schema.  Hosts call this once at start-up.
    pub fn validate(&self) -> Result<(), ProviderError> {
        for kind in ResourceKind::ALL {
            schema::validate(self.schema(kind)).map_err(|reason| ProviderError::InvalidSchema {
                resource: kind,
                reason,
            })?;
        }
        tracing::debug!(resources = ResourceKind::ALL.len(), "provider schema validated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_both_certificate_types() {
        let provider = Provider::new();
        let names: Vec<_> = provider.resource_types().collect();
        assert_eq!(names, ["ssh_host_cert", "ssh_client_cert"]);
        provider.validate().unwrap();
    }

    #[test]
    fn resource_lookup() {
        let provider = Provider::new();
        let host = provider.resource("ssh_host_cert").unwrap();
        assert_eq!(host.kind().cert_type(), CertType::Host);
        let client = provider.resource("ssh_client_cert").unwrap();
        assert_eq!(client.kind().cert_type(), CertType::Client);

        let err = provider.resource("ssh_user_cert").unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(ref n) if n == "ssh_user_cert"));
    }

    #[test]
    fn kind_serializes_as_type_name() {
        let json = serde_json::to_string(&ResourceKind::ClientCert).unwrap();
        assert_eq!(json, "\"ssh_client_cert\"");
        for kind in ResourceKind::ALL {
            assert_eq!(kind.to_string(), kind.type_name());
        }
    }

    #[test]
    fn creates_resources_from_toml_config() {
        let ca = include_str!("../../sshca-core/testdata/ca_ecdsa_p256.pem");
        let subject = include_str!("../../sshca-core/testdata/subject_ecdsa.pub");
        let text = format!(
            r#"
[certificate.web]
key_algorithm = "ECDSA"
private_key_pem = """
{ca}"""
public_key_openssh = "{subject}"
validity_period_hours = 24
valid_principals = ["web.example.com"]
"#,
            subject = subject.trim()
        );
        let config = sshca_core::Config::from_toml(&text).unwrap();
        let web = &config.certificate["web"];

        let clock = sshca_core::FixedClock::at_unix(1_700_000_000);
        let host = Provider::new().resource("ssh_host_cert").unwrap();
        let state = host.create(web, &clock).unwrap();
        assert_eq!(state.inputs.early_renewal_hours, 0);
        assert_eq!(host.plan(&state, web, &clock).unwrap(), Plan::NoOp);
    }

    #[test]
    fn replacement_error_lists_fields() {
        let err = ProviderError::RequiresReplacement(vec!["key_id", "extensions"]);
        assert_eq!(err.to_string(), "changes to key_id, extensions require replacement");
    }
}
