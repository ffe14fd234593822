//! Shared fixtures and an independent signature verifier for the
//! integration tests.

#![allow(dead_code)]

use cms::content_info::ContentInfo;
use cms::signed_data::{SignedData, SignerIdentifier};
use der::asn1::{ObjectIdentifier, OctetString};
use der::{Decode, Encode, SliceReader};
use pdf_seal::geometry::Rect;
use pdf_seal::signatures::{DigestAlgorithm, KeyStore, SignatureField, SigningIdentity};
use pdf_seal::writer::{PdfWriter, StandardFont};
use rsa::pkcs8::DecodePublicKey;
use sha2::{Sha256, Sha384, Sha512};
use signature::hazmat::PrehashVerifier;
use std::path::PathBuf;

pub const ALGORITHMS: [&str; 5] = ["rsa2048", "rsa3072", "rsa4096", "p256", "p384"];

const ID_SIGNED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");
const ID_MESSAGE_DIGEST: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.4");
const ID_SIGNING_CERTIFICATE_V2: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.2.47");
const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const PRIME256V1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("keys")
        .join(name)
}

/// Identity for `algorithm` with a chain of `chain_len` certificates.
pub fn identity(algorithm: &str, chain_len: usize) -> SigningIdentity {
    KeyStore::from_pem_files(
        fixture(&format!("{}_chain{}.pem", algorithm, chain_len)),
        fixture(&format!("{}_key.pem", algorithm)),
        None,
    )
    .unwrap()
}

/// One letter page with some text and an unsigned field named `Sig1`.
pub fn one_page_document() -> (PdfWriter, SignatureField) {
    let mut document = PdfWriter::new();
    let mut page = document.add_letter_page();
    page.add_text("Signature Appearance", 72.0, 720.0, StandardFont::HelveticaBold, 16.0);
    page.add_text("Please sign in the box below.", 72.0, 690.0, StandardFont::Helvetica, 12.0);
    page.finish();

    let field = SignatureField::with_name("Sig1", Rect::new(324.0, 144.0, 216.0, 72.0), 0).unwrap();
    document.add_signature_field(&field).unwrap();
    (document, field)
}

/// What the verifier found in a signed document.
#[derive(Debug)]
pub struct VerifiedSignature {
    pub byte_range: [usize; 4],
    pub certificate_count: usize,
    pub has_signing_certificate_v2: bool,
    pub digest_algorithm: DigestAlgorithm,
}

/// Check the single signature in `pdf` the way a viewer would.
pub fn verify(pdf: &[u8]) -> Result<VerifiedSignature, String> {
    let byte_range = parse_byte_range(pdf)?;
    let [start, first_len, second_start, second_len] = byte_range;
    if start != 0 || second_start + second_len != pdf.len() || first_len > second_start {
        return Err(format!("ByteRange {:?} does not cover the file", byte_range));
    }

    let placeholder = &pdf[first_len..second_start];
    if placeholder.first() != Some(&b'<') || placeholder.last() != Some(&b'>') {
        return Err("/Contents is not a hex string".to_string());
    }
    let container = decode_hex(&placeholder[1..placeholder.len() - 1])?;

    let mut reader = SliceReader::new(&container).map_err(|e| e.to_string())?;
    let content_info = ContentInfo::decode(&mut reader).map_err(|e| e.to_string())?;
    if content_info.content_type != ID_SIGNED_DATA {
        return Err(format!("unexpected content type {}", content_info.content_type));
    }
    let signed_data = SignedData::from_der(&content_info.content.to_der().map_err(|e| e.to_string())?)
        .map_err(|e| e.to_string())?;
    if signed_data.encap_content_info.econtent.is_some() {
        return Err("signature is not detached".to_string());
    }

    let signer_info = signed_data
        .signer_infos
        .0
        .iter()
        .next()
        .ok_or("no SignerInfo")?;
    let digest_algorithm = [DigestAlgorithm::Sha256, DigestAlgorithm::Sha384, DigestAlgorithm::Sha512]
        .into_iter()
        .find(|alg| alg.oid() == signer_info.digest_alg.oid)
        .ok_or("unknown digest algorithm")?;

    let document_digest = digest_algorithm.digest_chunks([
        &pdf[..first_len],
        &pdf[second_start..second_start + second_len],
    ]);

    let signed_attrs = signer_info.signed_attrs.as_ref().ok_or("no signed attributes")?;
    let message_digest = signed_attrs
        .iter()
        .find(|attr| attr.oid == ID_MESSAGE_DIGEST)
        .and_then(|attr| attr.values.iter().next())
        .ok_or("no message-digest attribute")?;
    let message_digest = OctetString::from_der(&message_digest.to_der().map_err(|e| e.to_string())?)
        .map_err(|e| e.to_string())?;
    if message_digest.as_bytes() != document_digest.as_slice() {
        return Err("message digest does not match the signed byte ranges".to_string());
    }
    let has_signing_certificate_v2 = signed_attrs
        .iter()
        .any(|attr| attr.oid == ID_SIGNING_CERTIFICATE_V2);

    let certificates: Vec<_> = signed_data
        .certificates
        .as_ref()
        .ok_or("no certificates")?
        .0
        .iter()
        .filter_map(|choice| match choice {
            cms::cert::CertificateChoices::Certificate(cert) => Some(cert),
            _ => None,
        })
        .collect();
    let SignerIdentifier::IssuerAndSerialNumber(sid) = &signer_info.sid else {
        return Err("signer identified by key id".to_string());
    };
    let signer = certificates
        .iter()
        .find(|cert| {
            cert.tbs_certificate.serial_number == sid.serial_number
                && cert.tbs_certificate.issuer == sid.issuer
        })
        .ok_or("signer certificate missing from the container")?;

    let attrs_der = signed_attrs.to_der().map_err(|e| e.to_string())?;
    let attrs_digest = digest_algorithm.digest(&attrs_der);
    let spki = &signer.tbs_certificate.subject_public_key_info;
    let spki_der = spki.to_der().map_err(|e| e.to_string())?;
    let signature = signer_info.signature.as_bytes();

    if spki.algorithm.oid == RSA_ENCRYPTION {
        let key = rsa::RsaPublicKey::from_public_key_der(&spki_der).map_err(|e| e.to_string())?;
        let padding = match digest_algorithm {
            DigestAlgorithm::Sha256 => rsa::Pkcs1v15Sign::new::<Sha256>(),
            DigestAlgorithm::Sha384 => rsa::Pkcs1v15Sign::new::<Sha384>(),
            DigestAlgorithm::Sha512 => rsa::Pkcs1v15Sign::new::<Sha512>(),
        };
        key.verify(padding, &attrs_digest, signature)
            .map_err(|e| format!("RSA signature invalid: {}", e))?;
    } else {
        let curve: ObjectIdentifier = spki
            .algorithm
            .parameters
            .as_ref()
            .ok_or("EC key without named curve")?
            .decode_as()
            .map_err(|e| e.to_string())?;
        if curve == PRIME256V1 {
            let key = p256::ecdsa::VerifyingKey::from_public_key_der(&spki_der).map_err(|e| e.to_string())?;
            let sig = p256::ecdsa::Signature::from_der(signature).map_err(|e| e.to_string())?;
            key.verify_prehash(&attrs_digest, &sig)
                .map_err(|e| format!("ECDSA signature invalid: {}", e))?;
        } else if curve == SECP384R1 {
            let key = p384::ecdsa::VerifyingKey::from_public_key_der(&spki_der).map_err(|e| e.to_string())?;
            let sig = p384::ecdsa::Signature::from_der(signature).map_err(|e| e.to_string())?;
            key.verify_prehash(&attrs_digest, &sig)
                .map_err(|e| format!("ECDSA signature invalid: {}", e))?;
        } else {
            return Err(format!("unsupported curve {}", curve));
        }
    }

    Ok(VerifiedSignature {
        byte_range,
        certificate_count: certificates.len(),
        has_signing_certificate_v2,
        digest_algorithm,
    })
}

fn parse_byte_range(pdf: &[u8]) -> Result<[usize; 4], String> {
    let marker = b"/ByteRange [";
    let start = pdf
        .windows(marker.len())
        .rposition(|w| w == marker)
        .ok_or("no /ByteRange")?
        + marker.len();
    let end = pdf[start..]
        .iter()
        .position(|&b| b == b']')
        .ok_or("unterminated /ByteRange")?
        + start;

    let text = std::str::from_utf8(&pdf[start..end]).map_err(|e| e.to_string())?;
    let values: Vec<usize> = text
        .split_whitespace()
        .map(|v| v.parse::<usize>().map_err(|e| e.to_string()))
        .collect::<Result<_, _>>()?;
    values
        .try_into()
        .map_err(|v: Vec<usize>| format!("ByteRange has {} entries", v.len()))
}

fn decode_hex(hex: &[u8]) -> Result<Vec<u8>, String> {
    if hex.len() % 2 != 0 {
        return Err("odd hex length".to_string());
    }
    hex.chunks(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair).map_err(|e| e.to_string())?;
            u8::from_str_radix(text, 16).map_err(|e| e.to_string())
        })
        .collect()
}
