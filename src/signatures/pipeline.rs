//! The signing pipeline: `Unsigned → Reserved → Digested → Signed → Finalized`.
//!
//! Each stage consumes the pipeline and returns it in the next state, so a
//! stage cannot be skipped or repeated. A failed stage drops the pipeline,
//! which releases the signature field; retrying means starting over with
//! [`SigningPipeline::new`].
//!
//! ```no_run
//! # use pdf_seal::signatures::{SignatureProperties, SigningPipeline};
//! # use pdf_seal::writer::PdfWriter;
//! # fn run(document: &PdfWriter, properties: &SignatureProperties) -> pdf_seal::Result<()> {
//! let mut output = Vec::new();
//! let finalized = SigningPipeline::new(document, properties)?
//!     .reserve()?
//!     .digest()?
//!     .sign()?
//!     .finalize(&mut output)?;
//! println!("{}", finalized.report().page_count);
//! # Ok(())
//! # }
//! ```

use super::atomic::{AtomicWriter, OutputSink};
use super::byterange::{estimate_container_size, ReservedDocument};
use super::cms::{ContainerBuilder, SignatureContainer};
use super::field::FieldBinding;
use super::types::{SignatureProperties, SigningReport};
use crate::error::{Error, Result};
use crate::writer::{PdfWriter, SignatureSlot};
use chrono::{DateTime, SubsecRound, Utc};

/// Share of the reservation above which a finished container is logged.
const RESERVATION_WARN_RATIO: f64 = 0.9;

/// Pipeline stage, for logging and introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Field bound, nothing serialized yet
    Unsigned,
    /// Document serialized with the placeholder
    Reserved,
    /// Signed byte ranges digested
    Digested,
    /// Container built
    Signed,
    /// Written to the sink
    Finalized,
}

mod sealed {
    pub trait Sealed {}
}

/// Marker implemented by the pipeline state types.
pub trait Stage: sealed::Sealed {
    /// State this marker stands for.
    const STATE: PipelineState;
}

/// Nothing done yet.
#[derive(Debug)]
pub struct Unsigned;

/// Placeholder reserved.
#[derive(Debug)]
pub struct Reserved {
    reserved: ReservedDocument,
}

/// Digest computed.
#[derive(Debug)]
pub struct Digested {
    reserved: ReservedDocument,
    digest: Vec<u8>,
}

/// Container built.
#[derive(Debug)]
pub struct Signed {
    reserved: ReservedDocument,
    container: SignatureContainer,
}

/// Document committed to the sink.
#[derive(Debug)]
pub struct Finalized {
    report: SigningReport,
}

macro_rules! stage {
    ($($ty:ident),*) => {
        $(
            impl sealed::Sealed for $ty {}
            impl Stage for $ty {
                const STATE: PipelineState = PipelineState::$ty;
            }
        )*
    };
}

stage!(Unsigned, Reserved, Digested, Signed, Finalized);

/// One signing operation over one document.
#[derive(Debug)]
pub struct SigningPipeline<'a, S: Stage> {
    context: Context<'a>,
    state: S,
}

#[derive(Debug)]
struct Context<'a> {
    document: &'a PdfWriter,
    properties: &'a SignatureProperties,
    /// Holds the field until dropped or cleared.
    _binding: Option<FieldBinding>,
    signing_time: DateTime<Utc>,
}

impl<'a> Context<'a> {
    fn enter<T: Stage>(self, from: PipelineState, state: T) -> SigningPipeline<'a, T> {
        log::debug!(
            "Signing '{}': {:?} -> {:?}",
            self.properties.field().name(),
            from,
            T::STATE
        );
        SigningPipeline {
            context: self,
            state,
        }
    }
}

impl<'a, S: Stage> SigningPipeline<'a, S> {
    /// Current stage.
    pub fn state(&self) -> PipelineState {
        S::STATE
    }

    /// Signing time shared by `/M` and the CMS signing-time attribute.
    pub fn signing_time(&self) -> DateTime<Utc> {
        self.context.signing_time
    }

    /// Properties being signed with.
    pub fn properties(&self) -> &SignatureProperties {
        self.context.properties
    }
}

impl<'a> SigningPipeline<'a, Unsigned> {
    /// Start signing `properties.field()` in `document`.
    ///
    /// Binds the field for the lifetime of the pipeline. Fails with
    /// [`Error::FieldAlreadyBound`] if another operation holds it and with
    /// [`Error::InvalidPdf`] if the field is not part of `document`.
    pub fn new(document: &'a PdfWriter, properties: &'a SignatureProperties) -> Result<Self> {
        let field = properties.field();
        if !document.contains_field(field) {
            return Err(Error::InvalidPdf(format!(
                "signature field '{}' is not part of the document",
                field.name()
            )));
        }
        let binding = field.bind()?;

        let signing_time = properties
            .options()
            .signing_time
            .unwrap_or_else(Utc::now)
            .trunc_subsecs(0);

        Ok(Self {
            context: Context {
                document,
                properties,
                _binding: Some(binding),
                signing_time,
            },
            state: Unsigned,
        })
    }

    /// Serialize the document once with a placeholder sized for the
    /// identity, and fix the byte ranges.
    pub fn reserve(self) -> Result<SigningPipeline<'a, Reserved>> {
        let context = self.context;
        let properties = context.properties;
        let options = properties.options();
        let field = properties.field();

        let estimate = estimate_container_size(
            properties.identity(),
            options.digest_algorithm,
            options.sub_filter,
        );
        let container_len = match options.reserved_size {
            Some(size) if options.exact_reservation => size,
            Some(size) => size.max(estimate),
            None => estimate,
        };

        let appearance = match properties.appearance() {
            Some(generated) => Some(generated.render(
                field.rect().at_origin(),
                properties.signer_name(),
                properties.reason(),
                properties.location(),
                &context.signing_time,
            )?),
            None => None,
        };

        let slot = SignatureSlot {
            field: field.clone(),
            sub_filter: options.sub_filter.as_pdf_name().to_string(),
            container_len,
            signer_name: properties.signer_name().map(str::to_string),
            location: properties.location().map(str::to_string),
            reason: properties.reason().map(str::to_string),
            contact_info: options.contact_info.clone(),
            signing_time: context.signing_time,
            appearance,
        };

        let reserved =
            ReservedDocument::reserve(context.document, &slot, options.verify_serialization)?;
        Ok(context.enter(Unsigned::STATE, Reserved { reserved }))
    }
}

impl<'a> SigningPipeline<'a, Reserved> {
    /// The reserved document.
    pub fn reserved(&self) -> &ReservedDocument {
        &self.state.reserved
    }

    /// Digest the signed byte ranges.
    pub fn digest(self) -> Result<SigningPipeline<'a, Digested>> {
        let SigningPipeline { context, state } = self;
        let algorithm = context.properties.options().digest_algorithm;
        let digest = state.reserved.digest(algorithm)?;
        Ok(context.enter(
            Reserved::STATE,
            Digested {
                reserved: state.reserved,
                digest,
            },
        ))
    }
}

impl<'a> SigningPipeline<'a, Digested> {
    /// Document digest over the signed byte ranges.
    pub fn document_digest(&self) -> &[u8] {
        &self.state.digest
    }

    /// The reserved document.
    pub fn reserved(&self) -> &ReservedDocument {
        &self.state.reserved
    }

    /// Build the CMS container through the identity's capability.
    ///
    /// Fails with [`Error::SigningCapability`] or [`Error::Timeout`]; the
    /// capability is not retried.
    pub fn sign(self) -> Result<SigningPipeline<'a, Signed>> {
        let SigningPipeline { context, state } = self;
        let properties = context.properties;
        let options = properties.options();

        let container = ContainerBuilder::new(properties.identity(), options.digest_algorithm)
            .with_sub_filter(options.sub_filter)
            .with_signing_time(context.signing_time)
            .with_timeout(options.signing_timeout)
            .build(&state.digest)?;

        let capacity = state.reserved.container_capacity();
        if container.len() > capacity {
            return Err(Error::PlaceholderOverflow {
                needed: container.len(),
                reserved: capacity,
            });
        }

        Ok(context.enter(
            Digested::STATE,
            Signed {
                reserved: state.reserved,
                container,
            },
        ))
    }
}

impl<'a> SigningPipeline<'a, Signed> {
    /// The finished container.
    pub fn container(&self) -> &SignatureContainer {
        &self.state.container
    }

    /// Splice the container and commit the document to `sink` in one step.
    ///
    /// On error the sink has received nothing (or, for
    /// [`AtomicFileSink`](super::AtomicFileSink), the destination is
    /// untouched).
    pub fn finalize<W: OutputSink + ?Sized>(
        self,
        sink: &mut W,
    ) -> Result<SigningPipeline<'a, Finalized>> {
        let SigningPipeline { mut context, state } = self;
        let Signed { reserved, container } = state;
        let properties = context.properties;
        let options = properties.options();

        let page_count = reserved.page_count();
        let byte_range = reserved.byte_range().clone();
        let reserved_size = reserved.container_capacity();

        let bytes = AtomicWriter::finalize(reserved, &container)?;
        AtomicWriter::commit(&bytes, sink)?;

        let report = SigningReport {
            page_count,
            field_name: properties.field().name().to_string(),
            byte_range,
            document_len: bytes.len(),
            reserved_size,
            container_size: container.len(),
            digest_algorithm: options.digest_algorithm,
            sub_filter: options.sub_filter,
            signing_time: context.signing_time,
        };

        log::info!(
            "Signed field '{}': {} page(s), container {} of {} reserved bytes",
            report.field_name,
            report.page_count,
            report.container_size,
            report.reserved_size
        );
        if report.container_size as f64 > report.reserved_size as f64 * RESERVATION_WARN_RATIO {
            log::warn!(
                "Signature container uses {} of {} reserved bytes",
                report.container_size,
                report.reserved_size
            );
        }

        // Done with the field; it may be signed again.
        context._binding = None;
        Ok(context.enter(Signed::STATE, Finalized { report }))
    }
}

impl<'a> SigningPipeline<'a, Finalized> {
    /// Summary of the operation.
    pub fn report(&self) -> &SigningReport {
        &self.state.report
    }

    /// Take the summary.
    pub fn into_report(self) -> SigningReport {
        self.state.report
    }
}
