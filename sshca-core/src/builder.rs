//! Certificate request assembly.
//!
//! A [`CertificateRequest`] is everything that goes into a certificate except
//! the CA signature.  It is built once per issuance and never mutated.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::keys::PublicKeyMaterial;

pub const VALIDITY_PERIOD_FIELD: &str = "validity_period_hours";

const SECONDS_PER_HOUR: u64 = 3600;

/// Which side of an SSH connection the certificate authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertType {
    Host,
    Client,
}

impl CertType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Client => "client",
        }
    }
}

impl fmt::Display for CertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CertType> for ssh_key::certificate::CertType {
    fn from(cert_type: CertType) -> Self {
        match cert_type {
            CertType::Host => Self::Host,
            CertType::Client => Self::User,
        }
    }
}

/// Critical options and extensions, as name → empty-value flag maps.
///
/// Maps are ordered so the wire encoding comes out in lexical order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub critical_options: BTreeMap<String, String>,
    pub extensions: BTreeMap<String, String>,
}

impl Permissions {
    /// Repeated names collapse into a single entry.
    pub fn from_flags(critical_options: &[String], extensions: &[String]) -> Self {
        Self {
            critical_options: flag_map(critical_options),
            extensions: flag_map(extensions),
        }
    }
}

fn flag_map(names: &[String]) -> BTreeMap<String, String> {
    names
        .iter()
        .map(|name| (name.clone(), String::new()))
        .collect()
}

/// An unsigned certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRequest {
    pub cert_type: CertType,
    pub public_key: PublicKeyMaterial,
    /// Empty when no key id was configured.
    pub key_id: String,
    /// Kept in the order given, duplicates included.
    pub principals: Vec<String>,
    pub permissions: Permissions,
    /// Unix seconds.
    pub valid_after: u64,
    /// Unix seconds.
    pub valid_before: u64,
    pub serial: u64,
}

impl CertificateRequest {
    pub fn validity_seconds(&self) -> u64 {
        self.valid_before.saturating_sub(self.valid_after)
    }
}

/// Assemble a certificate request.
///
/// The caller is responsible for passing a window produced by
/// [`validity_window`]; it is copied as given.
#[allow(clippy::too_many_arguments)]
pub fn build(
    cert_type: CertType,
    public_key: PublicKeyMaterial,
    key_id: Option<&str>,
    principals: &[String],
    critical_options: &[String],
    extensions: &[String],
    valid_after: u64,
    valid_before: u64,
    serial: u64,
) -> CertificateRequest {
    CertificateRequest {
        cert_type,
        public_key,
        key_id: key_id.unwrap_or_default().to_string(),
        principals: principals.to_vec(),
        permissions: Permissions::from_flags(critical_options, extensions),
        valid_after,
        valid_before,
        serial,
    }
}

/// Compute `(valid_after, valid_before)` starting at `now`.
pub fn validity_window(now: DateTime<Utc>, validity_period_hours: u64) -> Result<(u64, u64)> {
    if validity_period_hours == 0 {
        return Err(Error::invalid(VALIDITY_PERIOD_FIELD, "must be greater than zero"));
    }
    let valid_after = u64::try_from(now.timestamp())
        .map_err(|_| Error::invalid(VALIDITY_PERIOD_FIELD, "current time is before the Unix epoch"))?;
    let valid_before = validity_period_hours
        .checked_mul(SECONDS_PER_HOUR)
        .and_then(|period| valid_after.checked_add(period))
        .filter(|end| i64::try_from(*end).is_ok())
        .ok_or_else(|| Error::invalid(VALIDITY_PERIOD_FIELD, "validity window overflows"))?;
    Ok((valid_after, valid_before))
}

/// Draw a serial number.
///
/// The draw is a uniformly random 128-bit value; certificates carry 64 bits,
/// so the low half is kept.
pub fn random_serial() -> u64 {
    let mut draw = [0u8; 16];
    rand::rng().fill_bytes(&mut draw);
    truncate_serial(u128::from_be_bytes(draw))
}

pub fn truncate_serial(draw: u128) -> u64 {
    draw as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::fixtures::SUBJECT_ED25519;
    use crate::keys::parse_public_key;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn principals_keep_order_and_duplicates() {
        let principals = strings(&["b.host", "a.host", "b.host"]);
        let request = build(
            CertType::Host,
            parse_public_key(SUBJECT_ED25519).unwrap(),
            None,
            &principals,
            &[],
            &[],
            10,
            3610,
            7,
        );
        assert_eq!(request.principals, principals);
        assert_eq!(request.key_id, "");
        assert_eq!(request.serial, 7);
        assert_eq!(request.validity_seconds(), 3600);
    }

    #[test]
    fn permissions_collapse_duplicates_to_flags() {
        let perms = Permissions::from_flags(
            &strings(&["force-command", "force-command"]),
            &strings(&["permit-pty", "permit-X11-forwarding", "permit-pty"]),
        );
        assert_eq!(perms.critical_options.len(), 1);
        assert_eq!(perms.critical_options["force-command"], "");
        assert_eq!(
            perms.extensions.keys().collect::<Vec<_>>(),
            ["permit-X11-forwarding", "permit-pty"]
        );
        assert!(perms.extensions.values().all(String::is_empty));
    }

    #[test]
    fn window_spans_exact_period() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let (after, before) = validity_window(now, 600).unwrap();
        assert_eq!(after, 1_700_000_000);
        assert_eq!(before - after, 600 * 3600);
    }

    #[test]
    fn window_rejects_zero_and_overflow() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert!(matches!(
            validity_window(now, 0),
            Err(Error::InvalidField { field: VALIDITY_PERIOD_FIELD, .. })
        ));
        assert!(validity_window(now, u64::MAX).is_err());
    }

    #[test]
    fn window_rejects_pre_epoch_clock() {
        let now = DateTime::from_timestamp(-1, 0).unwrap();
        assert!(validity_window(now, 1).is_err());
    }

    #[test]
    fn serial_keeps_low_64_bits() {
        let draw: u128 = (0xdead_beef_u128 << 64) | 0x0123_4567_89ab_cdef;
        assert_eq!(truncate_serial(draw), 0x0123_4567_89ab_cdef);
        assert_eq!(truncate_serial(u128::MAX), u64::MAX);
        assert_eq!(truncate_serial(1 << 64), 0);
    }

    #[test]
    fn serials_differ_between_draws() {
        assert_ne!(random_serial(), random_serial());
    }

    #[test]
    fn cert_type_maps_to_wire_type() {
        assert_eq!(
            ssh_key::certificate::CertType::from(CertType::Client),
            ssh_key::certificate::CertType::User
        );
        assert_eq!(
            ssh_key::certificate::CertType::from(CertType::Host),
            ssh_key::certificate::CertType::Host
        );
    }
}
