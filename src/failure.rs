//! # Failure Kinds
//!
//! Kind tags for raised failures and the [`Failure`] trait the dispatcher works against.
//!
//! ## Overview
//!
//! Rust has no built-in exception hierarchy, so callers declare their own taxonomy as
//! `static` [`FailureKind`] items. Each kind may name a parent, and the parent links form
//! the ancestry table that the ancestry-aware dispatcher walks.
//!
//! ```rust
//! use safe_callback::failure::{Failure, FailureKind, SimpleFailure};
//!
//! static ARITHMETIC: FailureKind = FailureKind::root("ArithmeticError");
//! static ZERO_DIVISION: FailureKind = FailureKind::derived("ZeroDivisionError", &ARITHMETIC);
//!
//! let failure = SimpleFailure::new(&ZERO_DIVISION, "division by zero");
//! assert!(failure.kind().is_kind_of(&ARITHMETIC));
//! assert!(!ARITHMETIC.is_kind_of(&ZERO_DIVISION));
//! ```

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A raised failure, as seen by the guard and returned to its callers
pub type BoxedFailure = Box<dyn Failure>;

/// Identifier for a category of failure.
///
/// Kinds compare and hash by name, so two items declaring the same name are the same kind.
#[derive(Debug, Clone, Copy)]
pub struct FailureKind {
    name: &'static str,
    parent: Option<&'static FailureKind>,
}

impl FailureKind {
    /// Declare a kind with no ancestor
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// Declare a kind that is a specialisation of `parent`
    pub const fn derived(name: &'static str, parent: &'static FailureKind) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<&'static FailureKind> {
        self.parent
    }

    /// Walk this kind and its ancestors, nearest first
    pub fn lineage(&self) -> Lineage<'_> {
        Lineage {
            next: Some(self),
        }
    }

    /// Ancestor-or-self test used by ancestry-aware dispatch
    pub fn is_kind_of(&self, ancestor: &FailureKind) -> bool {
        self.lineage().any(|kind| kind == ancestor)
    }

    /// Number of ancestors above this kind
    pub fn depth(&self) -> usize {
        self.lineage().count() - 1
    }
}

impl PartialEq for FailureKind {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for FailureKind {}

impl Hash for FailureKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Iterator over a kind and its ancestors
#[derive(Debug, Clone)]
pub struct Lineage<'a> {
    next: Option<&'a FailureKind>,
}

impl<'a> Iterator for Lineage<'a> {
    type Item = &'a FailureKind;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent;
        Some(current)
    }
}

/// Object-safe access to `Any` for failure downcasting
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// A failure value the guard can dispatch on.
///
/// Implementors only supply [`Failure::kind`]; everything else comes from
/// `std::error::Error`.
pub trait Failure: std::error::Error + AsAny + Send + Sync + 'static {
    /// The concrete kind of this failure
    fn kind(&self) -> &'static FailureKind;

    /// Box this failure for returning from a protected operation or handler
    fn boxed(self) -> BoxedFailure
    where
        Self: Sized,
    {
        Box::new(self)
    }
}

impl dyn Failure {
    /// Borrow the concrete failure type, if it is `F`
    pub fn downcast_ref<F: Failure>(&self) -> Option<&F> {
        AsAny::as_any(self).downcast_ref::<F>()
    }

    /// Check the concrete failure type
    pub fn is<F: Failure>(&self) -> bool {
        AsAny::as_any(self).is::<F>()
    }

    /// Recover the concrete failure, handing the box back when it is another type
    pub fn downcast<F: Failure>(self: Box<Self>) -> Result<Box<F>, BoxedFailure> {
        if !self.is::<F>() {
            return Err(self);
        }
        // The concrete type was checked above, so this downcast cannot fail
        let concrete = AsAny::into_any(self)
            .downcast::<F>()
            .expect("concrete type verified by is::<F>()");
        Ok(concrete)
    }
}

/// Failure carrying only a kind and a message
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct SimpleFailure {
    kind: &'static FailureKind,
    message: String,
}

impl SimpleFailure {
    pub fn new(kind: &'static FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Failure for SimpleFailure {
    fn kind(&self) -> &'static FailureKind {
        self.kind
    }
}
