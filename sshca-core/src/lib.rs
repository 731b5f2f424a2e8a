//! Short-lived SSH certificate issuance.
//!
//! Certificates are issued from a caller-supplied CA private key and decide
//! for themselves when they need replacing.
//!
//! # Pipeline
//!
//! ```text
//! private_key_pem ──► keys::parse_private_key ─────────────────┐
//!                                                               ▼
//! public_key_openssh ─► keys::parse_public_key ─► builder::build ─► signer::sign ─► authorized-key text
//!                                                 ▲
//!                 clock.now() + validity period ──┘
//! ```
//!
//! [`issue`] runs the whole pipeline and returns the [`ComputedAttributes`]
//! recorded for a certificate; [`evaluate_renewal`] is the independent
//! predicate the host runs on every planning pass to decide whether a
//! previously issued certificate must be replaced.
//!
//! Nothing here performs I/O; the only shared resource is the operating
//! system RNG, so independent issuances can run in parallel.

pub mod builder;
pub mod clock;
pub mod config;
pub mod error;
pub mod issue;
pub mod keys;
pub mod renewal;
pub mod signer;

pub use builder::{CertType, CertificateRequest, Permissions};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{CertificateConfig, Config};
pub use error::{Error, Result};
pub use issue::{ComputedAttributes, issue, issue_certificate};
pub use keys::{KeyAlgorithm, PrivateKeyMaterial, PublicKeyMaterial};
pub use renewal::{RenewalState, evaluate_renewal, renewal_state};
pub use signer::{CaSigner, SignedCertificate};
