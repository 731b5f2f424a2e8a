//! Error types for certificate issuance.

/// Every failure aborts the issuance; no partial attributes are produced.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed PEM, DER, or authorized-key text.
    #[error("failed to decode {field}: {reason}")]
    Parse { field: &'static str, reason: String },

    #[error("invalid {field}: {value:?}")]
    UnsupportedAlgorithm { field: &'static str, value: String },

    /// Signer construction, certificate assembly, or signing failed.
    #[error("failed to sign certificate ({field}): {reason}")]
    Sign { field: &'static str, reason: String },

    #[error("error serializing {field}: {reason}")]
    Serialization { field: &'static str, reason: String },

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl Error {
    pub(crate) fn parse(field: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::Parse {
            field,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the input or output field the error refers to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Parse { field, .. }
            | Self::UnsupportedAlgorithm { field, .. }
            | Self::Sign { field, .. }
            | Self::Serialization { field, .. }
            | Self::InvalidField { field, .. } => Some(field),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_error_names_its_field() {
        let errors = [
            Error::parse("public_key_openssh", "bad"),
            Error::UnsupportedAlgorithm {
                field: "key_algorithm",
                value: "DSA".to_string(),
            },
            Error::Sign {
                field: "private_key_pem",
                reason: "cryptographic error".to_string(),
            },
            Error::invalid("validity_period_hours", "must be greater than zero"),
        ];
        let fields: Vec<_> = errors.iter().map(Error::field).collect();
        assert_eq!(
            fields,
            [
                Some("public_key_openssh"),
                Some("key_algorithm"),
                Some("private_key_pem"),
                Some("validity_period_hours"),
            ]
        );
    }

    #[test]
    fn sign_error_message_includes_field() {
        let err = Error::Sign {
            field: "private_key_pem",
            reason: "cryptographic error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to sign certificate (private_key_pem): cryptographic error"
        );
    }
}
