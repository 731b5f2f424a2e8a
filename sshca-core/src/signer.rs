//! Certificate signing and OpenSSH rendering.

use std::fmt;

use rsa::pkcs1v15;
use sha2::Sha512;
use signature::{SignatureEncoding, Signer};
use ssh_key::certificate::{Builder, Certificate};
use ssh_key::private::EcdsaKeypair;
use ssh_key::public::{EcdsaPublicKey, KeyData, RsaPublicKey};
use ssh_key::rand_core::OsRng;
use ssh_key::{Algorithm, HashAlg, Signature};
use tracing::debug;

use crate::builder::{CertificateRequest, VALIDITY_PERIOD_FIELD};
use crate::config::{CRITICAL_OPTIONS_FIELD, EXTENSIONS_FIELD, KEY_ID_FIELD, VALID_PRINCIPALS_FIELD};
use crate::error::{Error, Result};
use crate::keys::{EcdsaSecret, PRIVATE_KEY_FIELD, PrivateKeyMaterial};

pub const CERT_AUTHORIZED_KEY_FIELD: &str = "cert_authorized_key";

/// A certificate signed by the CA key.
#[derive(Clone)]
pub struct SignedCertificate {
    request: CertificateRequest,
    certificate: Certificate,
}

impl SignedCertificate {
    pub fn request(&self) -> &CertificateRequest {
        &self.request
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    pub fn serial(&self) -> u64 {
        self.certificate.serial()
    }

    pub fn signature_bytes(&self) -> &[u8] {
        self.certificate.signature().as_bytes()
    }

    /// `"<cert-key-type> <base64-payload>"`, with no comment and no newline.
    pub fn to_authorized_key(&self) -> Result<String> {
        self.certificate
            .to_openssh()
            .map(|line| line.trim_end().to_string())
            .map_err(sign_error(CERT_AUTHORIZED_KEY_FIELD))
    }
}

impl fmt::Debug for SignedCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedCertificate")
            .field("cert_type", &self.request.cert_type)
            .field("serial", &self.certificate.serial())
            .field("key_id", &self.request.key_id)
            .field("principals", &self.request.principals)
            .finish_non_exhaustive()
    }
}

/// CA key in the shape the certificate builder signs with.
///
/// RSA keys are held as a PKCS#1 v1.5 signer over SHA-512 (`rsa-sha2-512`)
/// built straight from the parsed key, so the CRT parameters survive.
/// ECDSA keys go through the OpenSSH keypair type.
pub struct CaSigner {
    public: KeyData,
    key: CaKey,
}

enum CaKey {
    Rsa(Box<pkcs1v15::SigningKey<Sha512>>),
    Ecdsa(EcdsaKeypair),
}

impl CaSigner {
    pub fn new(key: &PrivateKeyMaterial) -> Result<Self> {
        match key {
            PrivateKeyMaterial::Rsa(rsa) => {
                let public = RsaPublicKey::try_from(&rsa.to_public_key())
                    .map_err(sign_error(PRIVATE_KEY_FIELD))?;
                Ok(Self {
                    public: KeyData::from(public),
                    key: CaKey::Rsa(Box::new(pkcs1v15::SigningKey::new((**rsa).clone()))),
                })
            }
            PrivateKeyMaterial::Ecdsa(secret) => {
                let keypair = match secret {
                    EcdsaSecret::P256(sk) => EcdsaKeypair::NistP256 {
                        public: sk.public_key().into(),
                        private: sk.clone().into(),
                    },
                    EcdsaSecret::P384(sk) => EcdsaKeypair::NistP384 {
                        public: sk.public_key().into(),
                        private: sk.clone().into(),
                    },
                    EcdsaSecret::P521(sk) => EcdsaKeypair::NistP521 {
                        public: sk.public_key().into(),
                        private: sk.clone().into(),
                    },
                };
                Ok(Self {
                    public: KeyData::from(EcdsaPublicKey::from(&keypair)),
                    key: CaKey::Ecdsa(keypair),
                })
            }
        }
    }

    /// Public half of the CA key, as recorded in the certificate.
    pub fn public_key(&self) -> &KeyData {
        &self.public
    }
}

impl Signer<Signature> for CaSigner {
    fn try_sign(&self, message: &[u8]) -> signature::Result<Signature> {
        match &self.key {
            CaKey::Rsa(key) => {
                let data = key.try_sign(message)?.to_vec();
                Signature::new(
                    Algorithm::Rsa {
                        hash: Some(HashAlg::Sha512),
                    },
                    data,
                )
                .map_err(|_| signature::Error::new())
            }
            CaKey::Ecdsa(keypair) => keypair.try_sign(message),
        }
    }
}

impl From<&CaSigner> for KeyData {
    fn from(signer: &CaSigner) -> Self {
        signer.public.clone()
    }
}

impl fmt::Debug for CaSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaSigner")
            .field("algorithm", &self.public.algorithm())
            .field("key", &"[redacted]")
            .finish()
    }
}

/// Sign `request` with `key`.
///
/// The certificate nonce (and the ECDSA per-signature secret) come from the
/// operating system RNG.
pub fn sign(request: CertificateRequest, key: &PrivateKeyMaterial) -> Result<SignedCertificate> {
    let signer = CaSigner::new(key)?;

    let mut builder = Builder::new_with_random_nonce(
        &mut OsRng,
        request.public_key.key().key_data().clone(),
        request.valid_after,
        request.valid_before,
    )
    .map_err(sign_error(VALIDITY_PERIOD_FIELD))?;

    builder
        .serial(request.serial)
        .map_err(sign_error(CERT_AUTHORIZED_KEY_FIELD))?;
    builder
        .key_id(request.key_id.as_str())
        .map_err(sign_error(KEY_ID_FIELD))?;
    builder
        .cert_type(request.cert_type.into())
        .map_err(sign_error(CERT_AUTHORIZED_KEY_FIELD))?;

    // An empty principals field means the certificate is valid for any principal.
    if request.principals.is_empty() {
        builder
            .all_principals_valid()
            .map_err(sign_error(VALID_PRINCIPALS_FIELD))?;
    }
    for principal in &request.principals {
        builder
            .valid_principal(principal.as_str())
            .map_err(sign_error(VALID_PRINCIPALS_FIELD))?;
    }
    for name in request.permissions.critical_options.keys() {
        builder
            .critical_option(name.as_str(), "")
            .map_err(sign_error(CRITICAL_OPTIONS_FIELD))?;
    }
    for name in request.permissions.extensions.keys() {
        builder
            .extension(name.as_str(), "")
            .map_err(sign_error(EXTENSIONS_FIELD))?;
    }

    let certificate = builder
        .sign(&signer)
        .map_err(sign_error(PRIVATE_KEY_FIELD))?;
    debug!(
        serial = certificate.serial(),
        cert_type = %request.cert_type,
        algorithm = %key.algorithm(),
        principals = request.principals.len(),
        "signed certificate"
    );

    Ok(SignedCertificate {
        request,
        certificate,
    })
}

fn sign_error(field: &'static str) -> impl Fn(ssh_key::Error) -> Error {
    move |err| Error::Sign {
        field,
        reason: err.to_string(),
    }
}
