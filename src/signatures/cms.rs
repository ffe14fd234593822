//! CMS/PKCS#7 signature container construction.
//!
//! Produces a detached `SignedData` (RFC 5652) around a document digest:
//!
//! ```text
//! ContentInfo
//!   SignedData
//!     digestAlgorithms      { sha-256 | sha-384 | sha-512 }
//!     encapContentInfo      id-data, no content (detached)
//!     certificates          signer chain
//!     signerInfos
//!       SignerInfo
//!         sid               issuer and serial of the signer certificate
//!         signedAttrs       content-type, signing-time, message-digest
//!                           [+ signing-certificate-v2 for CAdES]
//!         signature         capability output over DER(signedAttrs)
//! ```

use super::identity::SigningIdentity;
use super::types::{DigestAlgorithm, SignatureSubFilter};
use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, Utc};
use cms::cert::{CertificateChoices, IssuerAndSerialNumber};
use cms::content_info::{CmsVersion, ContentInfo};
use cms::signed_data::{
    CertificateSet, EncapsulatedContentInfo, SignedAttributes, SignedData, SignerIdentifier,
    SignerInfo, SignerInfos,
};
use der::asn1::{GeneralizedTime, ObjectIdentifier, OctetString, SetOfVec, UtcTime};
use der::{Any, Decode, Encode, Sequence};
use spki::AlgorithmIdentifierOwned;
use std::sync::mpsc;
use std::time::Duration;
use x509_cert::attr::Attribute;
use x509_cert::Certificate;

const ID_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.1");
const ID_SIGNED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");
const ID_CONTENT_TYPE: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.3");
const ID_MESSAGE_DIGEST: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.4");
const ID_SIGNING_TIME: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.5");
const ID_SIGNING_CERTIFICATE_V2: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.2.47");

/// `ESSCertIDv2` (RFC 5035). `hashAlgorithm` defaults to SHA-256 and is
/// omitted in that case.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
struct EssCertIdV2 {
    hash_algorithm: Option<AlgorithmIdentifierOwned>,
    cert_hash: OctetString,
}

/// `SigningCertificateV2` without policies.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
struct SigningCertificateV2 {
    certs: Vec<EssCertIdV2>,
}

/// A finished, DER-encoded CMS container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureContainer {
    der: Vec<u8>,
}

impl SignatureContainer {
    /// DER bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.der
    }

    /// DER length.
    pub fn len(&self) -> usize {
        self.der.len()
    }

    /// True for a zero-length container, which is never produced by
    /// [`ContainerBuilder`].
    pub fn is_empty(&self) -> bool {
        self.der.is_empty()
    }

    /// Take the DER bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.der
    }
}

/// Builder for detached CMS signature containers.
#[derive(Debug, Clone)]
pub struct ContainerBuilder<'a> {
    identity: &'a SigningIdentity,
    digest_algorithm: DigestAlgorithm,
    sub_filter: SignatureSubFilter,
    signing_time: DateTime<Utc>,
    timeout: Option<Duration>,
}

impl<'a> ContainerBuilder<'a> {
    /// Container for `identity`, signed now, without a timeout.
    pub fn new(identity: &'a SigningIdentity, digest_algorithm: DigestAlgorithm) -> Self {
        Self {
            identity,
            digest_algorithm,
            sub_filter: SignatureSubFilter::default(),
            signing_time: Utc::now(),
            timeout: None,
        }
    }

    /// Signature format; CAdES adds the signing-certificate-v2 attribute.
    pub fn with_sub_filter(mut self, sub_filter: SignatureSubFilter) -> Self {
        self.sub_filter = sub_filter;
        self
    }

    /// Value of the signing-time attribute.
    pub fn with_signing_time(mut self, signing_time: DateTime<Utc>) -> Self {
        self.signing_time = signing_time;
        self
    }

    /// Give up on the capability after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Wrap `document_digest` into a signed container.
    ///
    /// Fails with [`Error::SigningCapability`] if the capability errors and
    /// with [`Error::Timeout`] if it does not answer in time. Neither is
    /// retried.
    pub fn build(&self, document_digest: &[u8]) -> Result<SignatureContainer> {
        let expected = self.digest_algorithm.output_len();
        if document_digest.len() != expected {
            return Err(Error::InvalidDigest {
                expected,
                actual: document_digest.len(),
            });
        }

        let chain = self
            .identity
            .certificate_chain()
            .iter()
            .map(|der| Certificate::from_der(der))
            .collect::<der::Result<Vec<_>>>()
            .map_err(|e| Error::InvalidCertificate(e.to_string()))?;
        let signer = &chain[0];

        log::debug!(
            "Building CMS container: {} certificate(s), {} with {}",
            chain.len(),
            self.identity.key_algorithm().name(),
            self.digest_algorithm.name()
        );

        let signed_attrs = self.signed_attributes(document_digest)?;
        let attrs_digest = self.digest_algorithm.digest(&signed_attrs.to_der()?);
        let signature = self.sign(attrs_digest)?;

        let digest_algorithm = AlgorithmIdentifierOwned {
            oid: self.digest_algorithm.oid(),
            parameters: None,
        };

        let signer_info = SignerInfo {
            version: CmsVersion::V1,
            sid: SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
                issuer: signer.tbs_certificate.issuer.clone(),
                serial_number: signer.tbs_certificate.serial_number.clone(),
            }),
            digest_alg: digest_algorithm.clone(),
            signed_attrs: Some(signed_attrs),
            signature_algorithm: self
                .identity
                .key_algorithm()
                .signature_algorithm(self.digest_algorithm),
            signature: OctetString::new(signature)?,
            unsigned_attrs: None,
        };

        let certificates = chain
            .into_iter()
            .map(CertificateChoices::Certificate)
            .collect::<Vec<_>>();

        let signed_data = SignedData {
            version: CmsVersion::V1,
            digest_algorithms: SetOfVec::try_from(vec![digest_algorithm])?,
            encap_content_info: EncapsulatedContentInfo {
                econtent_type: ID_DATA,
                econtent: None,
            },
            certificates: Some(CertificateSet(SetOfVec::try_from(certificates)?)),
            crls: None,
            signer_infos: SignerInfos(SetOfVec::try_from(vec![signer_info])?),
        };

        let content_info = ContentInfo {
            content_type: ID_SIGNED_DATA,
            content: Any::encode_from(&signed_data)?,
        };
        let der = content_info.to_der()?;

        log::debug!("CMS container encoded: {} bytes", der.len());
        Ok(SignatureContainer { der })
    }

    fn signed_attributes(&self, document_digest: &[u8]) -> Result<SignedAttributes> {
        let mut attributes = vec![
            attribute(ID_CONTENT_TYPE, Any::encode_from(&ID_DATA)?)?,
            attribute(ID_SIGNING_TIME, self.signing_time_value()?)?,
            attribute(
                ID_MESSAGE_DIGEST,
                Any::encode_from(&OctetString::new(document_digest)?)?,
            )?,
        ];

        if self.sub_filter == SignatureSubFilter::CadesDetached {
            let cert_hash = self
                .digest_algorithm
                .digest(self.identity.signer_certificate());
            let hash_algorithm = match self.digest_algorithm {
                DigestAlgorithm::Sha256 => None,
                other => Some(AlgorithmIdentifierOwned {
                    oid: other.oid(),
                    parameters: None,
                }),
            };
            let signing_certificate = SigningCertificateV2 {
                certs: vec![EssCertIdV2 {
                    hash_algorithm,
                    cert_hash: OctetString::new(cert_hash)?,
                }],
            };
            attributes.push(attribute(
                ID_SIGNING_CERTIFICATE_V2,
                Any::encode_from(&signing_certificate)?,
            )?);
        }

        Ok(SetOfVec::try_from(attributes)?)
    }

    /// UTCTime until 2049, GeneralizedTime afterwards (RFC 5652 §11.3).
    fn signing_time_value(&self) -> Result<Any> {
        let seconds = u64::try_from(self.signing_time.timestamp()).map_err(|_| {
            Error::InvalidPdf(format!("signing time {} predates 1970", self.signing_time))
        })?;
        let since_epoch = Duration::from_secs(seconds);
        let value = if self.signing_time.year() < 2050 {
            Any::encode_from(&UtcTime::from_unix_duration(since_epoch)?)?
        } else {
            Any::encode_from(&GeneralizedTime::from_unix_duration(since_epoch)?)?
        };
        Ok(value)
    }

    /// Run the capability, on a worker thread when a timeout is set.
    fn sign(&self, digest: Vec<u8>) -> Result<Vec<u8>> {
        let algorithm = self.digest_algorithm;
        let signature = match self.timeout {
            None => self
                .identity
                .capability()
                .sign_digest(algorithm, &digest)
                .map_err(Error::SigningCapability)?,
            Some(limit) => {
                let capability = self.identity.capability().clone();
                let (tx, rx) = mpsc::channel();
                std::thread::Builder::new()
                    .name("pdf-seal-signer".to_string())
                    .spawn(move || {
                        // The receiver is gone if the caller already timed out.
                        let _ = tx.send(capability.sign_digest(algorithm, &digest));
                    })?;

                match rx.recv_timeout(limit) {
                    Ok(result) => result.map_err(Error::SigningCapability)?,
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        log::warn!("Signing capability did not answer within {:?}", limit);
                        return Err(Error::Timeout(limit));
                    },
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        return Err(Error::SigningCapability(
                            "signing thread terminated without a result".into(),
                        ));
                    },
                }
            },
        };

        if signature.is_empty() {
            return Err(Error::SigningCapability(
                "capability returned an empty signature".into(),
            ));
        }
        log::debug!("Signing capability returned {} bytes", signature.len());
        Ok(signature)
    }
}

fn attribute(oid: ObjectIdentifier, value: Any) -> Result<Attribute> {
    Ok(Attribute {
        oid,
        values: SetOfVec::try_from(vec![value])?,
    })
}
