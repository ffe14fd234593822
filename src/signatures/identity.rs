//! Signing identities and the capability that performs the private-key
//! operation.
//!
//! The pipeline never touches key material. It hands a digest to a
//! [`SigningCapability`] and gets raw signature bytes back, so keys may
//! live in memory ([`SoftwareKey`]), in an HSM or behind a remote service.

use super::types::DigestAlgorithm;
use crate::error::{CapabilityError, Error, Result};
use der::asn1::ObjectIdentifier;
use der::{Any, Decode};
use pkcs8::EncodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha2::{Sha256, Sha384, Sha512};
use signature::hazmat::PrehashSigner;
use spki::AlgorithmIdentifierOwned;
use std::fmt;
use std::sync::Arc;

const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const ECDSA_WITH_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");
const ECDSA_WITH_SHA384: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.3");
const ECDSA_WITH_SHA512: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.4");

/// Public-key algorithm of a signing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// RSA with PKCS#1 v1.5 padding
    Rsa {
        /// Modulus size in bits
        modulus_bits: usize,
    },
    /// ECDSA over NIST P-256
    EcdsaP256,
    /// ECDSA over NIST P-384
    EcdsaP384,
}

impl KeyAlgorithm {
    /// Upper bound on the encoded signature length in bytes.
    ///
    /// ECDSA signatures are DER `SEQUENCE { r, s }`, each integer possibly
    /// carrying a leading zero byte.
    pub fn max_signature_len(&self) -> usize {
        match self {
            KeyAlgorithm::Rsa { modulus_bits } => modulus_bits.div_ceil(8),
            KeyAlgorithm::EcdsaP256 => 72,
            KeyAlgorithm::EcdsaP384 => 104,
        }
    }

    /// `SignerInfo.signatureAlgorithm` for this key and digest.
    pub fn signature_algorithm(&self, digest: DigestAlgorithm) -> AlgorithmIdentifierOwned {
        match self {
            KeyAlgorithm::Rsa { .. } => AlgorithmIdentifierOwned {
                oid: RSA_ENCRYPTION,
                parameters: Some(Any::null()),
            },
            KeyAlgorithm::EcdsaP256 | KeyAlgorithm::EcdsaP384 => AlgorithmIdentifierOwned {
                oid: match digest {
                    DigestAlgorithm::Sha256 => ECDSA_WITH_SHA256,
                    DigestAlgorithm::Sha384 => ECDSA_WITH_SHA384,
                    DigestAlgorithm::Sha512 => ECDSA_WITH_SHA512,
                },
                parameters: None,
            },
        }
    }

    /// Short display name.
    pub fn name(&self) -> String {
        match self {
            KeyAlgorithm::Rsa { modulus_bits } => format!("RSA-{}", modulus_bits),
            KeyAlgorithm::EcdsaP256 => "ECDSA P-256".to_string(),
            KeyAlgorithm::EcdsaP384 => "ECDSA P-384".to_string(),
        }
    }
}

/// Digest in, signature bytes out.
///
/// Implementations may block (hardware tokens, remote key services); the
/// pipeline runs them on a worker thread when a signing timeout is set.
pub trait SigningCapability: Send + Sync {
    /// DER certificates, signer certificate first.
    fn certificate_chain(&self) -> &[Vec<u8>];

    /// Algorithm of the private key.
    fn key_algorithm(&self) -> KeyAlgorithm;

    /// Sign a precomputed digest.
    ///
    /// RSA returns the PKCS#1 v1.5 signature, ECDSA the DER-encoded
    /// `Ecdsa-Sig-Value`.
    fn sign_digest(
        &self,
        algorithm: DigestAlgorithm,
        digest: &[u8],
    ) -> std::result::Result<Vec<u8>, CapabilityError>;
}

/// Certificate chain plus the capability that signs on its behalf.
///
/// Cheap to clone; clones share the capability.
#[derive(Clone)]
pub struct SigningIdentity {
    capability: Arc<dyn SigningCapability>,
    signer_name: Option<String>,
}

impl SigningIdentity {
    /// Wrap a capability.
    ///
    /// Fails with [`Error::InvalidCertificate`] if the chain is empty or
    /// holds anything that is not a DER X.509 certificate.
    pub fn new<C: SigningCapability + 'static>(capability: C) -> Result<Self> {
        Self::from_shared(Arc::new(capability))
    }

    /// Wrap a capability that is already shared.
    pub fn from_shared(capability: Arc<dyn SigningCapability>) -> Result<Self> {
        let chain = capability.certificate_chain();
        if chain.is_empty() {
            return Err(Error::InvalidCertificate("certificate chain is empty".to_string()));
        }
        for (index, der) in chain.iter().enumerate() {
            x509_cert::Certificate::from_der(der).map_err(|e| {
                Error::InvalidCertificate(format!("chain entry {}: {}", index, e))
            })?;
        }
        Ok(Self {
            capability,
            signer_name: None,
        })
    }

    /// Default signer name, used when the properties carry none.
    pub fn with_signer_name(mut self, name: impl Into<String>) -> Self {
        self.signer_name = Some(name.into());
        self
    }

    /// Default signer name.
    pub fn signer_name(&self) -> Option<&str> {
        self.signer_name.as_deref()
    }

    /// DER certificates, signer first.
    pub fn certificate_chain(&self) -> &[Vec<u8>] {
        self.capability.certificate_chain()
    }

    /// DER signer certificate.
    pub fn signer_certificate(&self) -> &[u8] {
        // Non-empty, checked on construction.
        &self.capability.certificate_chain()[0]
    }

    /// Algorithm of the private key.
    pub fn key_algorithm(&self) -> KeyAlgorithm {
        self.capability.key_algorithm()
    }

    pub(crate) fn capability(&self) -> &Arc<dyn SigningCapability> {
        &self.capability
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("key_algorithm", &self.key_algorithm())
            .field("chain_len", &self.certificate_chain().len())
            .field("signer_name", &self.signer_name)
            .finish()
    }
}

enum KeyMaterial {
    Rsa(RsaPrivateKey),
    P256(p256::ecdsa::SigningKey),
    P384(p384::ecdsa::SigningKey),
}

/// In-memory private key with its certificate chain.
pub struct SoftwareKey {
    chain: Vec<Vec<u8>>,
    key: KeyMaterial,
}

impl SoftwareKey {
    /// RSA key.
    pub fn rsa(chain: Vec<Vec<u8>>, key: RsaPrivateKey) -> Self {
        Self {
            chain,
            key: KeyMaterial::Rsa(key),
        }
    }

    /// ECDSA P-256 key.
    pub fn p256(chain: Vec<Vec<u8>>, key: p256::ecdsa::SigningKey) -> Self {
        Self {
            chain,
            key: KeyMaterial::P256(key),
        }
    }

    /// ECDSA P-384 key.
    pub fn p384(chain: Vec<Vec<u8>>, key: p384::ecdsa::SigningKey) -> Self {
        Self {
            chain,
            key: KeyMaterial::P384(key),
        }
    }

    /// Replace the certificate chain.
    pub(crate) fn with_chain(mut self, chain: Vec<Vec<u8>>) -> Self {
        self.chain = chain;
        self
    }

    /// DER `SubjectPublicKeyInfo` of the key.
    pub fn public_key_der(&self) -> Result<Vec<u8>> {
        let document = match &self.key {
            KeyMaterial::Rsa(key) => key.to_public_key().to_public_key_der(),
            KeyMaterial::P256(key) => key.verifying_key().to_public_key_der(),
            KeyMaterial::P384(key) => key.verifying_key().to_public_key_der(),
        }
        .map_err(|e| Error::KeyStore(format!("cannot encode public key: {}", e)))?;
        Ok(document.as_bytes().to_vec())
    }
}

impl SigningCapability for SoftwareKey {
    fn certificate_chain(&self) -> &[Vec<u8>] {
        &self.chain
    }

    fn key_algorithm(&self) -> KeyAlgorithm {
        match &self.key {
            KeyMaterial::Rsa(key) => KeyAlgorithm::Rsa {
                modulus_bits: key.size() * 8,
            },
            KeyMaterial::P256(_) => KeyAlgorithm::EcdsaP256,
            KeyMaterial::P384(_) => KeyAlgorithm::EcdsaP384,
        }
    }

    fn sign_digest(
        &self,
        algorithm: DigestAlgorithm,
        digest: &[u8],
    ) -> std::result::Result<Vec<u8>, CapabilityError> {
        if digest.len() != algorithm.output_len() {
            return Err(format!(
                "{} digest must be {} bytes, got {}",
                algorithm.name(),
                algorithm.output_len(),
                digest.len()
            )
            .into());
        }

        match &self.key {
            KeyMaterial::Rsa(key) => {
                let padding = match algorithm {
                    DigestAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
                    DigestAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
                    DigestAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
                };
                Ok(key.sign(padding, digest)?)
            },
            KeyMaterial::P256(key) => {
                let signature: p256::ecdsa::Signature = key
                    .sign_prehash(digest)
                    .map_err(|e| format!("ECDSA P-256 signing failed: {}", e))?;
                Ok(signature.to_der().as_bytes().to_vec())
            },
            KeyMaterial::P384(key) => {
                let signature: p384::ecdsa::Signature = key
                    .sign_prehash(digest)
                    .map_err(|e| format!("ECDSA P-384 signing failed: {}", e))?;
                Ok(signature.to_der().as_bytes().to_vec())
            },
        }
    }
}

impl fmt::Debug for SoftwareKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftwareKey")
            .field("key_algorithm", &self.key_algorithm())
            .field("chain_len", &self.chain.len())
            .finish_non_exhaustive()
    }
}
