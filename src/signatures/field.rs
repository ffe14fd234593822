//! Signature field model.
//!
//! A [`SignatureField`] is a cheap, cloneable handle: every clone refers to
//! the same field. The field holds a shared reference to its appearance,
//! which can be replaced until a signing operation binds the field. While
//! bound, the appearance is frozen and a second signing operation on the
//! same field is refused.

use crate::appearance::{ensure_bounds, AppearanceObject};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Interactive signature placeholder on a page.
#[derive(Clone)]
pub struct SignatureField {
    inner: Arc<FieldInner>,
}

struct FieldInner {
    name: String,
    rect: Rect,
    page: usize,
    appearance: RwLock<Option<Arc<AppearanceObject>>>,
    bound: AtomicBool,
}

impl SignatureField {
    /// Create a field on page `page` (zero-based) with a generated name.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_seal::geometry::Rect;
    /// use pdf_seal::signatures::SignatureField;
    ///
    /// let field = SignatureField::new(Rect::new(324.0, 144.0, 216.0, 72.0), 0).unwrap();
    /// assert!(field.name().starts_with("Signature-"));
    /// assert!(field.appearance().is_none());
    /// ```
    pub fn new(rect: Rect, page: usize) -> Result<Self> {
        let name = format!("Signature-{}", uuid::Uuid::new_v4().simple());
        Self::with_name(name, rect, page)
    }

    /// Create a field with an explicit name (`/T`).
    ///
    /// Fails with [`Error::InvalidBounds`] if `rect` has no area or is not
    /// finite.
    pub fn with_name(name: impl Into<String>, rect: Rect, page: usize) -> Result<Self> {
        ensure_bounds(rect)?;
        Ok(Self {
            inner: Arc::new(FieldInner {
                name: name.into(),
                rect,
                page,
                appearance: RwLock::new(None),
                bound: AtomicBool::new(false),
            }),
        })
    }

    /// Field name, unique within a document.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Widget rectangle in page space.
    pub fn rect(&self) -> Rect {
        self.inner.rect
    }

    /// Zero-based index of the owning page.
    pub fn page(&self) -> usize {
        self.inner.page
    }

    /// Currently attached appearance.
    pub fn appearance(&self) -> Option<Arc<AppearanceObject>> {
        self.inner
            .appearance
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Attach an appearance, replacing any previous one.
    ///
    /// Fails with [`Error::FieldAlreadyBound`] while a signing operation
    /// holds the field.
    pub fn attach_appearance(&self, appearance: Arc<AppearanceObject>) -> Result<()> {
        self.set_appearance(Some(appearance))
    }

    /// Remove the attached appearance.
    pub fn clear_appearance(&self) -> Result<()> {
        self.set_appearance(None)
    }

    fn set_appearance(&self, appearance: Option<Arc<AppearanceObject>>) -> Result<()> {
        let mut slot = self
            .inner
            .appearance
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if self.is_bound() {
            return Err(Error::FieldAlreadyBound(self.inner.name.clone()));
        }
        *slot = appearance;
        Ok(())
    }

    /// True while a signing operation holds this field.
    pub fn is_bound(&self) -> bool {
        self.inner.bound.load(Ordering::Acquire)
    }

    /// True if both handles refer to the same field.
    pub fn same_field(&self, other: &SignatureField) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Reserve the field for one signing operation.
    ///
    /// The write lock is held while flipping the flag so that a concurrent
    /// [`attach_appearance`](Self::attach_appearance) either lands before the
    /// binding or is refused.
    pub(crate) fn bind(&self) -> Result<FieldBinding> {
        let _guard = self
            .inner
            .appearance
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if self
            .inner
            .bound
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::FieldAlreadyBound(self.inner.name.clone()));
        }
        log::debug!("Bound signature field '{}'", self.inner.name);
        Ok(FieldBinding {
            field: self.clone(),
        })
    }
}

impl fmt::Debug for SignatureField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureField")
            .field("name", &self.inner.name)
            .field("rect", &self.inner.rect)
            .field("page", &self.inner.page)
            .field("has_appearance", &self.appearance().is_some())
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// Exclusive hold on a field for the lifetime of one signing operation.
///
/// Dropping the binding releases the field, whether the operation finished
/// or was abandoned.
#[derive(Debug)]
pub(crate) struct FieldBinding {
    field: SignatureField,
}

impl Drop for FieldBinding {
    fn drop(&mut self) {
        self.field.inner.bound.store(false, Ordering::Release);
        log::debug!("Released signature field '{}'", self.field.inner.name);
    }
}
