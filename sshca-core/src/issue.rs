//! Issuance pipeline: parse → build → sign → render.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::builder::{self, CertType};
use crate::clock::Clock;
use crate::config::CertificateConfig;
use crate::error::Result;
use crate::keys;
use crate::renewal::{VALIDITY_END_FIELD, VALIDITY_START_FIELD, format_timestamp};
use crate::signer::{self, SignedCertificate};

/// Outputs recorded for an issued certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedAttributes {
    /// Decimal serial number; the resource identity.
    pub id: String,
    pub cert_authorized_key: String,
    pub ready_for_renewal: bool,
    pub validity_start_time: String,
    pub validity_end_time: String,
}

/// Issue a certificate and return the signed form.
///
/// The public key is parsed before the private key is touched, so a broken
/// subject key never causes the CA key to be decoded.
pub fn issue_certificate(
    cert_type: CertType,
    config: &CertificateConfig,
    clock: &dyn Clock,
) -> Result<SignedCertificate> {
    config.validate()?;

    let public_key = keys::parse_public_key(&config.public_key_openssh)?;
    debug!(
        fingerprint = %public_key.fingerprint(),
        %cert_type,
        "issuing certificate"
    );

    let (valid_after, valid_before) =
        builder::validity_window(clock.now(), config.validity_period_hours)?;
    let request = builder::build(
        cert_type,
        public_key,
        config.key_id.as_deref(),
        &config.valid_principals,
        &config.critical_options,
        &config.extensions,
        valid_after,
        valid_before,
        builder::random_serial(),
    );

    let private_key = keys::parse_private_key(&config.private_key_pem, &config.key_algorithm)?;
    signer::sign(request, &private_key)
}

/// Render the computed attributes of a freshly signed certificate.
pub fn computed_attributes(signed: &SignedCertificate) -> Result<ComputedAttributes> {
    let request = signed.request();
    Ok(ComputedAttributes {
        id: signed.serial().to_string(),
        cert_authorized_key: signed.to_authorized_key()?,
        ready_for_renewal: false,
        validity_start_time: format_timestamp(VALIDITY_START_FIELD, request.valid_after)?,
        validity_end_time: format_timestamp(VALIDITY_END_FIELD, request.valid_before)?,
    })
}

/// Issue a certificate and produce all of its computed attributes at once.
///
/// Nothing is returned unless every step succeeds.
pub fn issue(
    cert_type: CertType,
    config: &CertificateConfig,
    clock: &dyn Clock,
) -> Result<ComputedAttributes> {
    let signed = issue_certificate(cert_type, config, clock)?;
    let attributes = computed_attributes(&signed)?;
    info!(
        id = %attributes.id,
        %cert_type,
        valid_until = %attributes.validity_end_time,
        "certificate issued"
    );
    Ok(attributes)
}
