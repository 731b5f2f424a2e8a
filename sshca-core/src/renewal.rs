//! Renewal decision.
//!
//! A certificate is [`RenewalState::Fresh`] from issuance until
//! `validity_end_time - early_renewal_hours` is reached, after which it is
//! [`RenewalState::DueForRenewal`] until the resource is recreated.  An end
//! time that cannot be parsed counts as already expired.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Clock;
use crate::error::{Error, Result};

pub const VALIDITY_START_FIELD: &str = "validity_start_time";
pub const VALIDITY_END_FIELD: &str = "validity_end_time";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenewalState {
    Fresh,
    DueForRenewal,
}

impl RenewalState {
    pub fn ready_for_renewal(self) -> bool {
        self == Self::DueForRenewal
    }
}

impl From<bool> for RenewalState {
    fn from(ready_for_renewal: bool) -> Self {
        if ready_for_renewal {
            Self::DueForRenewal
        } else {
            Self::Fresh
        }
    }
}

/// Decide the renewal state of a certificate ending at `validity_end_time`.
pub fn renewal_state(
    validity_end_time: &str,
    early_renewal_hours: u64,
    clock: &dyn Clock,
) -> RenewalState {
    let end_time = match parse_timestamp(validity_end_time) {
        Ok(t) => t,
        Err(e) => {
            debug!(error = %e, "unparseable validity_end_time, treating certificate as expired");
            return RenewalState::DueForRenewal;
        }
    };

    let renew_at = i64::try_from(early_renewal_hours)
        .ok()
        .and_then(Duration::try_hours)
        .and_then(|margin| end_time.checked_sub_signed(margin));
    let Some(renew_at) = renew_at else {
        debug!(early_renewal_hours, "renewal margin reaches past representable time");
        return RenewalState::DueForRenewal;
    };

    let now = clock.now();
    if now >= renew_at {
        debug!(%renew_at, %now, "certificate due for renewal");
        RenewalState::DueForRenewal
    } else {
        RenewalState::Fresh
    }
}

/// `true` when the certificate should be replaced on the next apply.
pub fn evaluate_renewal(validity_end_time: &str, early_renewal_hours: u64, clock: &dyn Clock) -> bool {
    renewal_state(validity_end_time, early_renewal_hours, clock).ready_for_renewal()
}

/// Render Unix seconds as an RFC 3339 UTC timestamp.
pub fn format_timestamp(field: &'static str, unix_secs: u64) -> Result<String> {
    let secs = i64::try_from(unix_secs).map_err(|e| Error::Serialization {
        field,
        reason: e.to_string(),
    })?;
    DateTime::from_timestamp(secs, 0)
        .map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true))
        .ok_or_else(|| Error::Serialization {
            field,
            reason: format!("timestamp {secs} out of range"),
        })
}

/// Parse an RFC 3339 timestamp with any offset.
pub fn parse_timestamp(text: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).map(|t| t.with_timezone(&Utc))
}
