//! Key-store loader.
//!
//! Turns key material on disk into a [`SigningIdentity`]. This is the only
//! place in the crate that reads key files; the signing pipeline receives
//! the resulting identity and never looks at a path.
//!
//! Two containers are understood:
//! - PEM: a certificate chain (signer first) plus one private key block,
//!   either `PRIVATE KEY` (PKCS#8 RSA, EC P-256, EC P-384),
//!   `ENCRYPTED PRIVATE KEY` (PKCS#8 PBES2) or `RSA PRIVATE KEY` (PKCS#1)
//! - PKCS#12 (`.p12`/`.pfx`): a passphrase-protected bundle of the same,
//!   in whatever certificate order the producer chose

use super::identity::{SigningIdentity, SoftwareKey};
use crate::error::{Error, Result};
use der::asn1::ObjectIdentifier;
use pkcs1::DecodeRsaPrivateKey;
use pkcs8::{DecodePrivateKey, EncryptedPrivateKeyInfo, PrivateKeyInfo};
use rsa::RsaPrivateKey;
use spki::SubjectPublicKeyInfoRef;
use std::path::Path;
use x509_parser::pem::Pem;

const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const ID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const PRIME256V1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");

/// Where the signer certificate sits in a loaded chain.
#[derive(Clone, Copy, PartialEq, Eq)]
enum SignerPosition {
    /// First entry; anything else is a mismatch.
    First,
    /// Any entry; it is moved to the front.
    Anywhere,
}

/// Loader for PEM and PKCS#12 key material.
pub struct KeyStore;

impl KeyStore {
    /// Load an identity from PEM text.
    ///
    /// `chain_pem` holds one or more `CERTIFICATE` blocks, signer first.
    /// `key_pem` holds the signer's private key; `passphrase` is required
    /// when it is encrypted.
    ///
    /// Fails with [`Error::KeyStore`] on a wrong passphrase, corrupt or
    /// unsupported key, unparsable certificate, or a key that does not
    /// belong to the signer certificate.
    pub fn from_pem(
        chain_pem: &[u8],
        key_pem: &[u8],
        passphrase: Option<&str>,
    ) -> Result<SigningIdentity> {
        let chain = Self::load_chain(chain_pem)?;
        let key = Self::load_key(key_pem, passphrase)?;
        Self::assemble(key, chain, SignerPosition::First)
    }

    /// Load an identity from PEM files.
    pub fn from_pem_files(
        chain_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
        passphrase: Option<&str>,
    ) -> Result<SigningIdentity> {
        let chain = read_file(chain_path.as_ref())?;
        let key = read_file(key_path.as_ref())?;
        Self::from_pem(&chain, &key, passphrase)
    }

    /// Load an identity from a PKCS#12 bundle.
    ///
    /// The bundle must carry exactly the signer's private key and its
    /// certificate; other certificates become the rest of the chain in
    /// bundle order. Fails with [`Error::KeyStore`] on a wrong passphrase,
    /// a corrupt bundle, or a key with no matching certificate.
    pub fn from_pkcs12(bundle: &[u8], passphrase: &str) -> Result<SigningIdentity> {
        let pfx = p12::PFX::parse(bundle)
            .map_err(|e| Error::KeyStore(format!("corrupt PKCS#12 bundle: {:?}", e)))?;
        if !pfx.verify_mac(passphrase) {
            return Err(Error::KeyStore(
                "PKCS#12 integrity check failed (wrong passphrase?)".to_string(),
            ));
        }

        let keys = pfx
            .key_bags(passphrase)
            .map_err(|e| Error::KeyStore(format!("cannot read PKCS#12 keys: {:?}", e)))?;
        let certs = pfx
            .cert_x509_bags(passphrase)
            .map_err(|e| Error::KeyStore(format!("cannot read PKCS#12 certificates: {:?}", e)))?;

        let key_der = match keys.as_slice() {
            [key] => key,
            [] => return Err(Error::KeyStore("no private key in PKCS#12 bundle".to_string())),
            _ => {
                return Err(Error::KeyStore(format!(
                    "PKCS#12 bundle holds {} private keys, expected one",
                    keys.len()
                )))
            },
        };
        if certs.is_empty() {
            return Err(Error::KeyStore("no certificates in PKCS#12 bundle".to_string()));
        }

        let key = Self::decode_pkcs8(key_der)?;
        Self::assemble(key, certs, SignerPosition::Anywhere)
    }

    /// Load an identity from a PKCS#12 file.
    pub fn from_pkcs12_file(path: impl AsRef<Path>, passphrase: &str) -> Result<SigningIdentity> {
        Self::from_pkcs12(&read_file(path.as_ref())?, passphrase)
    }

    /// Put the signer certificate first, check it belongs to `key`, and
    /// take the default signer name from its common name.
    fn assemble(key: SoftwareKey, mut chain: Vec<Vec<u8>>, position: SignerPosition) -> Result<SigningIdentity> {
        let key_der = key.public_key_der()?;
        let key_spki = SubjectPublicKeyInfoRef::try_from(key_der.as_slice())
            .map_err(|e| Error::KeyStore(format!("cannot decode public key: {}", e)))?;
        let key_bits = key_spki.subject_public_key.raw_bytes();

        let mut signer = None;
        for (index, der) in chain.iter().enumerate() {
            let (_, cert) = x509_parser::parse_x509_certificate(der)
                .map_err(|e| Error::KeyStore(format!("certificate {}: {}", index, e)))?;
            let matches = cert.public_key().subject_public_key.data.as_ref() == key_bits;
            if matches && signer.is_none() {
                let name = cert
                    .subject()
                    .iter_common_name()
                    .next()
                    .and_then(|cn| cn.as_str().ok())
                    .map(str::to_string);
                signer = Some((index, name));
            }
        }

        let (index, signer_name) = match (signer, position) {
            (Some((0, name)), _) => (0, name),
            (Some(found), SignerPosition::Anywhere) => found,
            _ => {
                return Err(Error::KeyStore(
                    "private key does not match the signer certificate".to_string(),
                ))
            },
        };
        if index > 0 {
            let signer_der = chain.remove(index);
            chain.insert(0, signer_der);
        }

        let identity = SigningIdentity::new(key.with_chain(chain))?;
        log::debug!(
            "Loaded {} identity with {} certificate(s)",
            identity.key_algorithm().name(),
            identity.certificate_chain().len()
        );
        Ok(match signer_name {
            Some(name) => identity.with_signer_name(name),
            None => identity,
        })
    }

    /// DER certificates in PEM order.
    fn load_chain(pem: &[u8]) -> Result<Vec<Vec<u8>>> {
        let mut chain = Vec::new();
        for block in Pem::iter_from_buffer(pem) {
            let block = block.map_err(|e| Error::KeyStore(format!("corrupt PEM: {}", e)))?;
            if block.label == "CERTIFICATE" {
                chain.push(block.contents);
            }
        }
        if chain.is_empty() {
            return Err(Error::KeyStore("no certificates found".to_string()));
        }
        Ok(chain)
    }

    fn load_key(pem: &[u8], passphrase: Option<&str>) -> Result<SoftwareKey> {
        for block in Pem::iter_from_buffer(pem) {
            let block = block.map_err(|e| Error::KeyStore(format!("corrupt PEM: {}", e)))?;
            match block.label.as_str() {
                "PRIVATE KEY" => return Self::decode_pkcs8(&block.contents),
                "ENCRYPTED PRIVATE KEY" => {
                    let passphrase = passphrase.ok_or_else(|| {
                        Error::KeyStore("private key is encrypted and no passphrase was given".to_string())
                    })?;
                    let info = EncryptedPrivateKeyInfo::try_from(block.contents.as_slice())
                        .map_err(|e| Error::KeyStore(format!("corrupt encrypted key: {}", e)))?;
                    let document = info.decrypt(passphrase).map_err(|_| {
                        Error::KeyStore("cannot decrypt private key (wrong passphrase?)".to_string())
                    })?;
                    return Self::decode_pkcs8(document.as_bytes());
                },
                "RSA PRIVATE KEY" => {
                    let key = RsaPrivateKey::from_pkcs1_der(&block.contents)
                        .map_err(|e| Error::KeyStore(format!("corrupt RSA key: {}", e)))?;
                    return Ok(SoftwareKey::rsa(Vec::new(), key));
                },
                _ => continue,
            }
        }
        Err(Error::KeyStore("no supported private key found".to_string()))
    }

    /// Key without a chain; [`assemble`](Self::assemble) attaches one.
    fn decode_pkcs8(der: &[u8]) -> Result<SoftwareKey> {
        let info = PrivateKeyInfo::try_from(der)
            .map_err(|e| Error::KeyStore(format!("corrupt PKCS#8 key: {}", e)))?;
        let corrupt = |e: pkcs8::Error| Error::KeyStore(format!("corrupt private key: {}", e));

        if info.algorithm.oid == RSA_ENCRYPTION {
            let key = RsaPrivateKey::from_pkcs8_der(der).map_err(corrupt)?;
            return Ok(SoftwareKey::rsa(Vec::new(), key));
        }
        if info.algorithm.oid == ID_EC_PUBLIC_KEY {
            let curve = info.algorithm.parameters_oid().map_err(|e| {
                Error::KeyStore(format!("EC key without named curve: {}", e))
            })?;
            if curve == PRIME256V1 {
                let key = p256::ecdsa::SigningKey::from_pkcs8_der(der).map_err(corrupt)?;
                return Ok(SoftwareKey::p256(Vec::new(), key));
            }
            if curve == SECP384R1 {
                let key = p384::ecdsa::SigningKey::from_pkcs8_der(der).map_err(corrupt)?;
                return Ok(SoftwareKey::p384(Vec::new(), key));
            }
            return Err(Error::KeyStore(format!("unsupported EC curve {}", curve)));
        }
        Err(Error::KeyStore(format!(
            "unsupported key algorithm {}",
            info.algorithm.oid
        )))
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| Error::KeyStore(format!("cannot read {}: {}", path.display(), e)))
}
