//! Field schema of the certificate resources.
//!
//! Both resource kinds share one schema.  The host framework uses it to know
//! which fields it must supply, which it must hide, and which force the
//! resource to be replaced when they change.

use sshca_core::builder::VALIDITY_PERIOD_FIELD;
use sshca_core::config::{
    CRITICAL_OPTIONS_FIELD, EARLY_RENEWAL_FIELD, EXTENSIONS_FIELD, KEY_ID_FIELD,
    VALID_PRINCIPALS_FIELD,
};
use sshca_core::keys::{KEY_ALGORITHM_FIELD, PRIVATE_KEY_FIELD, PUBLIC_KEY_FIELD};
use sshca_core::renewal::{VALIDITY_END_FIELD, VALIDITY_START_FIELD};
pub use sshca_core::signer::CERT_AUTHORIZED_KEY_FIELD;

pub const READY_FOR_RENEWAL_FIELD: &str = "ready_for_renewal";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Int,
    Bool,
    StringList,
}

/// Where a field's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    Required,
    Optional,
    /// Produced by the provider; never supplied by the user.
    Computed,
}

/// Describes a single field of a certificate resource.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldType,
    pub source: FieldSource,

    /// Value is stored as a hash and never shown in plan output.
    pub sensitive: bool,

    /// A change to this field replaces the resource instead of updating it.
    pub force_new: bool,

    /// Default for optional fields, rendered as text.
    pub default: Option<&'static str>,

    pub description: &'static str,
}

const fn input(
    name: &'static str,
    kind: FieldType,
    source: FieldSource,
    description: &'static str,
) -> FieldDescriptor {
    FieldDescriptor {
        name,
        kind,
        source,
        sensitive: false,
        force_new: true,
        default: None,
        description,
    }
}

const fn computed(name: &'static str, kind: FieldType) -> FieldDescriptor {
    FieldDescriptor {
        name,
        kind,
        source: FieldSource::Computed,
        sensitive: false,
        force_new: false,
        default: None,
        description: "",
    }
}

pub static CERTIFICATE_FIELDS: &[FieldDescriptor] = &[
    input(
        KEY_ALGORITHM_FIELD,
        FieldType::String,
        FieldSource::Required,
        "Name of the algorithm of the signing private key",
    ),
    FieldDescriptor {
        sensitive: true,
        ..input(
            PRIVATE_KEY_FIELD,
            FieldType::String,
            FieldSource::Required,
            "PEM-encoded private key the certificate is signed with",
        )
    },
    input(
        PUBLIC_KEY_FIELD,
        FieldType::String,
        FieldSource::Required,
        "Authorized keys formatted SSH public key to sign",
    ),
    input(
        VALIDITY_PERIOD_FIELD,
        FieldType::Int,
        FieldSource::Required,
        "Number of hours that the certificate will remain valid for",
    ),
    FieldDescriptor {
        force_new: false,
        default: Some("0"),
        ..input(
            EARLY_RENEWAL_FIELD,
            FieldType::Int,
            FieldSource::Optional,
            "Number of hours before the certificate's expiry when a new certificate will be generated",
        )
    },
    input(
        KEY_ID_FIELD,
        FieldType::String,
        FieldSource::Optional,
        "User or host identifier for the certificate",
    ),
    input(
        VALID_PRINCIPALS_FIELD,
        FieldType::StringList,
        FieldSource::Required,
        "Hostnames or user names the certificate is valid for",
    ),
    input(
        CRITICAL_OPTIONS_FIELD,
        FieldType::StringList,
        FieldSource::Optional,
        "Certificate usage permissions - list of critical options",
    ),
    input(
        EXTENSIONS_FIELD,
        FieldType::StringList,
        FieldSource::Optional,
        "Certificate usage permissions - list of extensions",
    ),
    computed(CERT_AUTHORIZED_KEY_FIELD, FieldType::String),
    computed(READY_FOR_RENEWAL_FIELD, FieldType::Bool),
    computed(VALIDITY_START_FIELD, FieldType::String),
    computed(VALIDITY_END_FIELD, FieldType::String),
];

/// Look up a field by name.
pub fn field(name: &str) -> Option<&'static FieldDescriptor> {
    CERTIFICATE_FIELDS.iter().find(|f| f.name == name)
}

/// Names of the inputs whose change forces replacement.
pub fn force_new_fields() -> impl Iterator<Item = &'static str> {
    CERTIFICATE_FIELDS
        .iter()
        .filter(|f| f.force_new)
        .map(|f| f.name)
}

/// Check a schema for internal consistency.
pub fn validate(fields: &[FieldDescriptor]) -> Result<(), String> {
    for (i, f) in fields.iter().enumerate() {
        if fields[..i].iter().any(|other| other.name == f.name) {
            return Err(format!("{}: declared more than once", f.name));
        }
        if f.source == FieldSource::Computed && (f.force_new || f.default.is_some()) {
            return Err(format!("{}: computed fields cannot be force-new or defaulted", f.name));
        }
        if f.source == FieldSource::Required && f.default.is_some() {
            return Err(format!("{}: required fields cannot have a default", f.name));
        }
        if f.source != FieldSource::Computed && f.description.is_empty() {
            return Err(format!("{}: missing description", f.name));
        }
    }
    Ok(())
}
