//! Certificate resource lifecycle.
//!
//! The host framework drives a [`CertificateResource`] through these steps:
//!
//! 1. [`CertificateResource::create`]: issues a certificate and returns the
//!    state to persist.
//! 2. [`CertificateResource::plan`]: called before every apply with the
//!    persisted state and the current configuration.  Runs the renewal
//!    evaluator and compares force-new inputs.
//! 3. [`CertificateResource::apply`]: carries out a [`Plan`].
//! 4. [`CertificateResource::delete`]: forgets the certificate.
//!
//! A certificate is never modified after issuance; every change other than
//! `early_renewal_hours` goes through replacement.

use sshca_core::builder::VALIDITY_PERIOD_FIELD;
use sshca_core::config::{
    CRITICAL_OPTIONS_FIELD, EARLY_RENEWAL_FIELD, EXTENSIONS_FIELD, KEY_ID_FIELD,
    VALID_PRINCIPALS_FIELD,
};
use sshca_core::keys::{KEY_ALGORITHM_FIELD, PRIVATE_KEY_FIELD, PUBLIC_KEY_FIELD};
use sshca_core::{CertificateConfig, Clock};
use tracing::{debug, info};

use crate::schema::READY_FOR_RENEWAL_FIELD;
use crate::state::{ResourceState, StoredInputs};
use crate::{ProviderError, ResourceKind};

/// Why a resource has to be replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceReason {
    /// A force-new input differs from the one recorded in state.
    Changed(&'static str),
    /// The renewal point of the current certificate has been reached.
    ReadyForRenewal,
}

impl ReplaceReason {
    pub fn field(self) -> &'static str {
        match self {
            Self::Changed(field) => field,
            Self::ReadyForRenewal => READY_FOR_RENEWAL_FIELD,
        }
    }
}

/// Outcome of a planning pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    NoOp,
    /// Only inputs that do not affect the certificate changed.
    Update { fields: Vec<&'static str> },
    Replace { reasons: Vec<ReplaceReason> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateResource {
    kind: ResourceKind,
}

impl CertificateResource {
    pub fn new(kind: ResourceKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Issue a certificate for `config`.
    pub fn create(
        &self,
        config: &CertificateConfig,
        clock: &dyn Clock,
    ) -> Result<ResourceState, ProviderError> {
        let computed = sshca_core::issue(self.kind.cert_type(), config, clock)?;
        info!(resource = self.kind.type_name(), id = %computed.id, "created certificate resource");
        Ok(ResourceState {
            kind: self.kind,
            inputs: StoredInputs::from(config),
            computed,
        })
    }

    /// Certificates have no remote side to refresh from.
    pub fn read(&self, state: ResourceState) -> Result<ResourceState, ProviderError> {
        self.check_kind(&state)?;
        Ok(state)
    }

    /// Record in-place changes.  The certificate itself is left untouched.
    pub fn update(
        &self,
        state: ResourceState,
        config: &CertificateConfig,
    ) -> Result<ResourceState, ProviderError> {
        self.check_kind(&state)?;
        let inputs = StoredInputs::from(config);
        let forced = changed_force_new_fields(&state.inputs, &inputs);
        if !forced.is_empty() {
            return Err(ProviderError::RequiresReplacement(forced));
        }
        debug!(resource = self.kind.type_name(), id = state.id(), "updated certificate resource");
        Ok(ResourceState { inputs, ..state })
    }

    pub fn delete(&self, state: ResourceState) -> Result<(), ProviderError> {
        self.check_kind(&state)?;
        info!(resource = self.kind.type_name(), id = state.id(), "deleted certificate resource");
        Ok(())
    }

    /// Decide what the next apply has to do with `prior`.
    ///
    /// Renewal is judged against the *configured* `early_renewal_hours`, so
    /// widening the margin takes effect on the same pass.
    pub fn plan(
        &self,
        prior: &ResourceState,
        config: &CertificateConfig,
        clock: &dyn Clock,
    ) -> Result<Plan, ProviderError> {
        self.check_kind(prior)?;
        let inputs = StoredInputs::from(config);

        let mut reasons: Vec<ReplaceReason> = changed_force_new_fields(&prior.inputs, &inputs)
            .into_iter()
            .map(ReplaceReason::Changed)
            .collect();
        if prior.computed.ready_for_renewal
            || sshca_core::evaluate_renewal(
                &prior.computed.validity_end_time,
                config.early_renewal_hours,
                clock,
            )
        {
            reasons.push(ReplaceReason::ReadyForRenewal);
        }

        let plan = if !reasons.is_empty() {
            Plan::Replace { reasons }
        } else if prior.inputs.early_renewal_hours != inputs.early_renewal_hours {
            Plan::Update {
                fields: vec![EARLY_RENEWAL_FIELD],
            }
        } else {
            Plan::NoOp
        };
        debug!(resource = self.kind.type_name(), id = prior.id(), ?plan, "planned");
        Ok(plan)
    }

    /// Carry out `plan`.
    ///
    /// Replacement issues the new certificate before the old state is
    /// dropped, so a failed issuance leaves `prior` as the current state.
    pub fn apply(
        &self,
        plan: &Plan,
        prior: ResourceState,
        config: &CertificateConfig,
        clock: &dyn Clock,
    ) -> Result<ResourceState, ProviderError> {
        match plan {
            Plan::NoOp => self.read(prior),
            Plan::Update { .. } => self.update(prior, config),
            Plan::Replace { reasons } => {
                let next = self.create(config, clock)?;
                let fields: Vec<_> = reasons.iter().map(|r| r.field()).collect();
                info!(
                    resource = self.kind.type_name(),
                    old_id = prior.id(),
                    new_id = next.id(),
                    ?fields,
                    "replaced certificate resource"
                );
                self.delete(prior)?;
                Ok(next)
            }
        }
    }

    fn check_kind(&self, state: &ResourceState) -> Result<(), ProviderError> {
        if state.kind != self.kind {
            return Err(ProviderError::KindMismatch {
                expected: self.kind,
                found: state.kind,
            });
        }
        Ok(())
    }
}

/// Force-new inputs that differ between `prior` and `next`, in schema order.
fn changed_force_new_fields(prior: &StoredInputs, next: &StoredInputs) -> Vec<&'static str> {
    let checks = [
        (KEY_ALGORITHM_FIELD, prior.key_algorithm != next.key_algorithm),
        (PRIVATE_KEY_FIELD, prior.private_key_pem != next.private_key_pem),
        (PUBLIC_KEY_FIELD, prior.public_key_openssh != next.public_key_openssh),
        (
            VALIDITY_PERIOD_FIELD,
            prior.validity_period_hours != next.validity_period_hours,
        ),
        (KEY_ID_FIELD, prior.key_id != next.key_id),
        (VALID_PRINCIPALS_FIELD, prior.valid_principals != next.valid_principals),
        (CRITICAL_OPTIONS_FIELD, prior.critical_options != next.critical_options),
        (EXTENSIONS_FIELD, prior.extensions != next.extensions),
    ];
    checks
        .into_iter()
        .filter_map(|(field, changed)| changed.then_some(field))
        .collect()
}
