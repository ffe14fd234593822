//! End-to-end signing tests.

mod common;

use chrono::{TimeZone, Utc};
use common::{identity, init_logging, one_page_document, verify};
use pdf_seal::error::CapabilityError;
use pdf_seal::signatures::{
    sign, sign_with_report, AtomicFileSink, DigestAlgorithm, KeyAlgorithm, PdfSigner, PipelineState,
    SignOptions, SignatureProperties, SignatureSubFilter, SigningCapability, SigningIdentity,
    SigningPipeline, WriterSink,
};
use pdf_seal::Error;
use std::thread;
use std::time::Duration;

/// Capability that presents a real chain but never produces a signature.
struct BrokenToken {
    chain: Vec<Vec<u8>>,
    algorithm: KeyAlgorithm,
    delay: Option<Duration>,
}

impl BrokenToken {
    fn wrapping(identity: &SigningIdentity, delay: Option<Duration>) -> Self {
        Self {
            chain: identity.certificate_chain().to_vec(),
            algorithm: identity.key_algorithm(),
            delay,
        }
    }
}

impl SigningCapability for BrokenToken {
    fn certificate_chain(&self) -> &[Vec<u8>] {
        &self.chain
    }

    fn key_algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    fn sign_digest(&self, _algorithm: DigestAlgorithm, _digest: &[u8]) -> Result<Vec<u8>, CapabilityError> {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        Err("token removed".into())
    }
}

#[test]
fn test_sign_rsa2048_produces_verifiable_document() {
    init_logging();
    let (document, field) = one_page_document();
    let properties = SignatureProperties::new(&field, identity("rsa2048", 1))
        .with_location("Los Angeles, CA")
        .with_reason("Approval");

    let mut output = Vec::new();
    let pages = sign(&document, &properties, &mut output).unwrap();

    assert_eq!(pages, 1);
    assert!(output.starts_with(b"%PDF-1.7"));
    assert!(output.ends_with(b"%%EOF"));

    let verified = verify(&output).unwrap();
    assert_eq!(verified.certificate_count, 1);
    assert_eq!(verified.digest_algorithm, DigestAlgorithm::Sha256);
    assert!(!verified.has_signing_certificate_v2);

    let text = String::from_utf8_lossy(&output);
    assert!(text.contains("/SubFilter /adbe.pkcs7.detached"));
    assert!(text.contains("/Location (Los Angeles, CA)"));
    assert!(text.contains("/Reason (Approval)"));
    assert!(text.contains("/Name (Seal Signer rsa2048)"));
    assert!(text.contains("/SigFlags 3"));
    assert!(!field.is_bound());
}

#[test]
fn test_non_ascii_properties_are_utf16() {
    let (document, field) = one_page_document();
    let properties = SignatureProperties::new(&field, identity("p256", 1))
        .with_signer_name("Jürgen")
        .with_location("Zürich")
        .with_reason("Approval");

    let mut output = Vec::new();
    sign(&document, &properties, &mut output).unwrap();
    verify(&output).unwrap();

    let text = String::from_utf8_lossy(&output);
    assert!(text.contains("/Name <FEFF004A00FC007200670065006E>"));
    assert!(text.contains("/Location <FEFF005A00FC0072006900630068>"));
    assert!(text.contains("/Reason (Approval)"));
}

#[test]
fn test_signed_length_matches_reservation() {
    let (document, field) = one_page_document();
    let properties = SignatureProperties::new(&field, identity("rsa2048", 2));

    let reserved = SigningPipeline::new(&document, &properties)
        .unwrap()
        .reserve()
        .unwrap();
    let reserved_len = reserved.reserved().len();
    let reserved_range = reserved.reserved().byte_range().clone();

    let mut output = Vec::new();
    let finalized = reserved.digest().unwrap().sign().unwrap().finalize(&mut output).unwrap();

    assert_eq!(output.len(), reserved_len);
    assert_eq!(finalized.report().document_len, reserved_len);
    assert_eq!(finalized.report().byte_range, reserved_range);
    assert_eq!(finalized.state(), PipelineState::Finalized);

    let verified = verify(&output).unwrap();
    assert_eq!(verified.byte_range, {
        let [a, b, c, d] = reserved_range.to_array();
        [a as usize, b as usize, c as usize, d as usize]
    });
}

#[test]
fn test_pipeline_reports_each_state() {
    let (document, field) = one_page_document();
    let properties = SignatureProperties::new(&field, identity("p256", 1));

    let unsigned = SigningPipeline::new(&document, &properties).unwrap();
    assert_eq!(unsigned.state(), PipelineState::Unsigned);
    assert!(field.is_bound());

    let reserved = unsigned.reserve().unwrap();
    assert_eq!(reserved.state(), PipelineState::Reserved);

    let digested = reserved.digest().unwrap();
    assert_eq!(digested.state(), PipelineState::Digested);
    assert_eq!(digested.document_digest().len(), 32);

    let signed = digested.sign().unwrap();
    assert_eq!(signed.state(), PipelineState::Signed);
    assert!(!signed.container().is_empty());

    drop(signed);
    assert!(!field.is_bound());
}

#[test]
fn test_tampering_breaks_verification() {
    let (document, field) = one_page_document();
    let properties = SignatureProperties::new(&field, identity("rsa2048", 1));

    let mut output = Vec::new();
    sign(&document, &properties, &mut output).unwrap();
    verify(&output).unwrap();

    let needle = b"Please sign";
    let position = output.windows(needle.len()).position(|w| w == needle).unwrap();
    output[position] = b'p';
    assert!(verify(&output).is_err());
}

#[test]
fn test_capability_failure_writes_nothing() {
    init_logging();
    let (document, field) = one_page_document();
    let broken = SigningIdentity::new(BrokenToken::wrapping(&identity("rsa2048", 1), None)).unwrap();
    let properties = SignatureProperties::new(&field, broken);

    let mut output = Vec::new();
    let err = sign(&document, &properties, &mut output).unwrap_err();

    assert!(matches!(err, Error::SigningCapability(_)));
    assert!(err.to_string().contains("token removed"));
    assert!(output.is_empty());
    assert!(!field.is_bound());
}

#[test]
fn test_slow_capability_times_out_and_releases_field() {
    init_logging();
    let (document, field) = one_page_document();
    let slow = SigningIdentity::new(BrokenToken::wrapping(
        &identity("p256", 1),
        Some(Duration::from_secs(2)),
    ))
    .unwrap();
    let properties = SignatureProperties::new(&field, slow)
        .with_options(SignOptions::default().with_signing_timeout(Duration::from_millis(100)));

    let mut output = Vec::new();
    let err = sign(&document, &properties, &mut output).unwrap_err();

    assert!(matches!(err, Error::Timeout(d) if d == Duration::from_millis(100)));
    assert!(output.is_empty());
    assert!(!field.is_bound());

    // The field can be signed again right away.
    let properties = SignatureProperties::new(&field, identity("p256", 1));
    sign(&document, &properties, &mut output).unwrap();
    verify(&output).unwrap();
}

#[test]
fn test_second_operation_on_bound_field_is_refused() {
    let (document, field) = one_page_document();
    let properties = SignatureProperties::new(&field, identity("p256", 1));

    let in_progress = SigningPipeline::new(&document, &properties).unwrap().reserve().unwrap();

    let mut output = Vec::new();
    let err = sign(&document, &properties, &mut output).unwrap_err();
    assert!(matches!(err, Error::FieldAlreadyBound(ref name) if name == "Sig1"));
    assert!(output.is_empty());

    in_progress
        .digest()
        .unwrap()
        .sign()
        .unwrap()
        .finalize(&mut output)
        .unwrap();
    verify(&output).unwrap();
}

#[test]
fn test_cades_detached() {
    let (document, field) = one_page_document();
    let properties = SignatureProperties::new(&field, identity("p384", 2))
        .with_options(SignOptions::default().with_sub_filter(SignatureSubFilter::CadesDetached));

    let mut output = Vec::new();
    let report = sign_with_report(&document, &properties, &mut output).unwrap();

    assert_eq!(report.sub_filter, SignatureSubFilter::CadesDetached);
    assert!(String::from_utf8_lossy(&output).contains("/SubFilter /ETSI.CAdES.detached"));

    let verified = verify(&output).unwrap();
    assert!(verified.has_signing_certificate_v2);
    assert_eq!(verified.certificate_count, 2);
}

#[test]
fn test_sha384_and_sha512_digests() {
    for (algorithm, len) in [(DigestAlgorithm::Sha384, 48), (DigestAlgorithm::Sha512, 64)] {
        let (document, field) = one_page_document();
        let properties = SignatureProperties::new(&field, identity("rsa3072", 1))
            .with_options(SignOptions::default().with_digest_algorithm(algorithm));

        let digested = SigningPipeline::new(&document, &properties)
            .unwrap()
            .reserve()
            .unwrap()
            .digest()
            .unwrap();
        assert_eq!(digested.document_digest().len(), len);

        let mut output = Vec::new();
        digested.sign().unwrap().finalize(&mut output).unwrap();
        assert_eq!(verify(&output).unwrap().digest_algorithm, algorithm);
    }
}

#[test]
fn test_sign_to_file_replaces_destination_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("signed.pdf");
    std::fs::write(&path, b"previous contents").unwrap();

    let (document, field) = one_page_document();
    let properties = SignatureProperties::new(&field, identity("rsa2048", 1));
    let pages = sign(&document, &properties, &mut AtomicFileSink::new(&path)).unwrap();
    assert_eq!(pages, 1);

    let written = std::fs::read(&path).unwrap();
    verify(&written).unwrap();

    // Only the destination is left behind.
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_failed_file_signing_leaves_destination_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("signed.pdf");
    std::fs::write(&path, b"previous contents").unwrap();

    let (document, field) = one_page_document();
    let broken = SigningIdentity::new(BrokenToken::wrapping(&identity("rsa2048", 1), None)).unwrap();
    let properties = SignatureProperties::new(&field, broken);

    assert!(sign(&document, &properties, &mut AtomicFileSink::new(&path)).is_err());
    assert_eq!(std::fs::read(&path).unwrap(), b"previous contents");
}

#[test]
fn test_writer_sink() {
    let (document, field) = one_page_document();
    let properties = SignatureProperties::new(&field, identity("p256", 1));

    let mut sink = WriterSink::new(std::io::Cursor::new(Vec::new()));
    sign(&document, &properties, &mut sink).unwrap();

    let output = sink.into_inner().into_inner();
    verify(&output).unwrap();
}

#[test]
fn test_exact_reservation_too_small_overflows() {
    let (document, field) = one_page_document();
    let properties = SignatureProperties::new(&field, identity("rsa4096", 4))
        .with_options(SignOptions::default().with_exact_reservation(256));

    let mut output = Vec::new();
    let err = sign(&document, &properties, &mut output).unwrap_err();

    assert!(matches!(err, Error::PlaceholderOverflow { reserved: 256, .. }));
    assert!(output.is_empty());
    assert!(!field.is_bound());
}

#[test]
fn test_reserved_size_is_a_lower_bound() {
    let (document, field) = one_page_document();
    let properties = SignatureProperties::new(&field, identity("p256", 1))
        .with_options(SignOptions::default().with_reserved_size(30_000));

    let mut output = Vec::new();
    let report = sign_with_report(&document, &properties, &mut output).unwrap();

    assert_eq!(report.reserved_size, 30_000);
    assert!(report.container_size < report.reserved_size);
    verify(&output).unwrap();
}

#[test]
fn test_verified_serialization() {
    let (document, field) = one_page_document();
    let properties = SignatureProperties::new(&field, identity("rsa2048", 3))
        .with_options(SignOptions::default().with_verify_serialization(true));

    let mut output = Vec::new();
    sign(&document, &properties, &mut output).unwrap();
    assert_eq!(verify(&output).unwrap().certificate_count, 3);
}

#[test]
fn test_pinned_signing_time() {
    let time = Utc.with_ymd_and_hms(2030, 6, 15, 8, 45, 12).unwrap();
    let (document, field) = one_page_document();
    let properties = SignatureProperties::new(&field, identity("p256", 1))
        .with_options(SignOptions::default().with_signing_time(time));

    let mut output = Vec::new();
    let report = sign_with_report(&document, &properties, &mut output).unwrap();

    assert_eq!(report.signing_time, time);
    assert!(String::from_utf8_lossy(&output).contains("/M (D:20300615084512+00'00')"));
}

#[test]
fn test_signing_time_drops_fractional_seconds() {
    let time = Utc.timestamp_opt(1_900_000_000, 750_000_000).unwrap();
    let (document, field) = one_page_document();
    let properties = SignatureProperties::new(&field, identity("p256", 1))
        .with_options(SignOptions::default().with_signing_time(time));

    let pipeline = SigningPipeline::new(&document, &properties).unwrap();
    assert_eq!(pipeline.signing_time().timestamp(), 1_900_000_000);
    assert_eq!(pipeline.signing_time().timestamp_subsec_nanos(), 0);
}

#[test]
fn test_report_json() {
    let (document, field) = one_page_document();
    let properties = SignatureProperties::new(&field, identity("rsa2048", 1));

    let mut output = Vec::new();
    let report = sign_with_report(&document, &properties, &mut output).unwrap();
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

    assert_eq!(json["page_count"], 1);
    assert_eq!(json["field_name"], "Sig1");
    assert_eq!(json["digest_algorithm"], "SHA-256");
    assert_eq!(json["document_len"], output.len());
}

#[test]
fn test_field_outside_document_is_rejected() {
    let (document, _) = one_page_document();
    let (_, stranger) = one_page_document();
    let properties = SignatureProperties::new(&stranger, identity("p256", 1));

    let mut output = Vec::new();
    let err = sign(&document, &properties, &mut output).unwrap_err();
    assert!(matches!(err, Error::InvalidPdf(_)));
    assert!(!stranger.is_bound());
}

#[test]
fn test_field_can_be_signed_again_after_finalize() {
    let (document, field) = one_page_document();
    let properties = SignatureProperties::new(&field, identity("p256", 1));

    let mut first = Vec::new();
    let mut second = Vec::new();
    sign(&document, &properties, &mut first).unwrap();
    sign(&document, &properties, &mut second).unwrap();

    verify(&first).unwrap();
    verify(&second).unwrap();
}

#[test]
fn test_pdf_signer_defaults_apply_to_every_field() {
    let mut document = pdf_seal::writer::PdfWriter::new();
    document.add_letter_page().finish();
    document.add_letter_page().finish();
    let rect = pdf_seal::geometry::Rect::new(72.0, 72.0, 200.0, 60.0);
    let first = pdf_seal::signatures::SignatureField::with_name("Author", rect, 0).unwrap();
    let second = pdf_seal::signatures::SignatureField::with_name("Reviewer", rect, 1).unwrap();
    document.add_signature_field(&first).unwrap();
    document.add_signature_field(&second).unwrap();

    let signer = PdfSigner::new(identity("rsa2048", 1))
        .with_reason("Reviewed")
        .with_options(SignOptions::default().with_contact_info("signer@example.com"));

    for field in [&first, &second] {
        let (output, report) = signer.sign_to_vec(&document, field).unwrap();
        assert_eq!(report.page_count, 2);
        assert_eq!(report.field_name, field.name());
        let text = String::from_utf8_lossy(&output);
        assert!(text.contains("/Reason (Reviewed)"));
        assert!(text.contains("/ContactInfo (signer@example.com)"));
        verify(&output).unwrap();
    }
}
