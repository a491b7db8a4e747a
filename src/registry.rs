//! # Error Registry
//!
//! Ordered mapping from [`FailureKind`] to the [`HandlerEntry`] that recovers it.
//!
//! Each guard owns exactly one registry. Entries are only ever added or overwritten:
//! registering a kind a second time replaces its handler in place, so the entry keeps the
//! position it had in iteration order.

use crate::failure::{BoxedFailure, Failure, FailureKind};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Recovers a failure raised by the protected operation, given the call's arguments
pub type ErrorHandlerFn<A, T> = dyn Fn(&dyn Failure, &A) -> Result<T, BoxedFailure> + Send + Sync;

/// Strategy that decides how a handler is applied to a failure
pub type UsageFn<A, T> =
    dyn Fn(&ErrorHandlerFn<A, T>, &dyn Failure, &A) -> Result<T, BoxedFailure> + Send + Sync;

/// How a registered handler gets invoked
pub enum HandlerUsage<A, T> {
    /// Call the handler with the failure and the original arguments
    Direct,
    /// Route the call through a caller-supplied strategy
    Custom(Arc<UsageFn<A, T>>),
}

impl<A, T> HandlerUsage<A, T> {
    pub fn custom<U>(usage: U) -> Self
    where
        U: Fn(&ErrorHandlerFn<A, T>, &dyn Failure, &A) -> Result<T, BoxedFailure>
            + Send
            + Sync
            + 'static,
    {
        Self::Custom(Arc::new(usage))
    }
}

impl<A, T> Default for HandlerUsage<A, T> {
    fn default() -> Self {
        Self::Direct
    }
}

impl<A, T> Clone for HandlerUsage<A, T> {
    fn clone(&self) -> Self {
        match self {
            Self::Direct => Self::Direct,
            Self::Custom(usage) => Self::Custom(Arc::clone(usage)),
        }
    }
}

impl<A, T> fmt::Debug for HandlerUsage<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "Direct"),
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// A registered handler plus the strategy used to invoke it
pub struct HandlerEntry<A, T> {
    handler: Arc<ErrorHandlerFn<A, T>>,
    usage: HandlerUsage<A, T>,
}

impl<A, T> HandlerEntry<A, T> {
    pub fn new<H>(handler: H) -> Self
    where
        H: Fn(&dyn Failure, &A) -> Result<T, BoxedFailure> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            usage: HandlerUsage::Direct,
        }
    }

    pub fn with_usage(mut self, usage: HandlerUsage<A, T>) -> Self {
        self.usage = usage;
        self
    }

    pub fn usage(&self) -> &HandlerUsage<A, T> {
        &self.usage
    }

    /// Apply the handler to `failure` according to the usage strategy
    pub fn invoke(&self, failure: &dyn Failure, args: &A) -> Result<T, BoxedFailure> {
        match &self.usage {
            HandlerUsage::Direct => (self.handler)(failure, args),
            HandlerUsage::Custom(usage) => usage(self.handler.as_ref(), failure, args),
        }
    }
}

impl<A, T> Clone for HandlerEntry<A, T> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            usage: self.usage.clone(),
        }
    }
}

impl<A, T> fmt::Debug for HandlerEntry<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

/// Ordered kind → handler mapping owned by one guard
pub struct ErrorRegistry<A, T> {
    entries: IndexMap<&'static FailureKind, HandlerEntry<A, T>>,
}

impl<A, T> ErrorRegistry<A, T> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Register `handler` for `kind` with the direct usage strategy
    pub fn register<H>(&mut self, kind: &'static FailureKind, handler: H) -> Option<HandlerEntry<A, T>>
    where
        H: Fn(&dyn Failure, &A) -> Result<T, BoxedFailure> + Send + Sync + 'static,
    {
        self.register_entry(kind, HandlerEntry::new(handler))
    }

    pub fn register_with_usage<H>(
        &mut self,
        kind: &'static FailureKind,
        handler: H,
        usage: HandlerUsage<A, T>,
    ) -> Option<HandlerEntry<A, T>>
    where
        H: Fn(&dyn Failure, &A) -> Result<T, BoxedFailure> + Send + Sync + 'static,
    {
        self.register_entry(kind, HandlerEntry::new(handler).with_usage(usage))
    }

    /// Insert or overwrite the entry for `kind`, returning the replaced entry
    pub fn register_entry(
        &mut self,
        kind: &'static FailureKind,
        entry: HandlerEntry<A, T>,
    ) -> Option<HandlerEntry<A, T>> {
        // An overwrite keeps the kind's original slot
        let (position, replaced) = self.entries.insert_full(kind, entry);
        if replaced.is_some() {
            trace!(kind = %kind, position, "Replaced registered handler");
        } else {
            trace!(kind = %kind, position, "Registered handler");
        }
        replaced
    }

    /// Exact lookup by kind
    pub fn lookup(&self, kind: &FailureKind) -> Option<&HandlerEntry<A, T>> {
        self.entries.get(kind)
    }

    /// All entries in registration order
    pub fn entries(&self) -> impl Iterator<Item = (&'static FailureKind, &HandlerEntry<A, T>)> {
        self.entries.iter().map(|(&kind, entry)| (kind, entry))
    }

    pub fn kinds(&self) -> impl Iterator<Item = &'static FailureKind> + '_ {
        self.entries.keys().copied()
    }

    pub fn contains(&self, kind: &FailureKind) -> bool {
        self.entries.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<A, T> Default for ErrorRegistry<A, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, T> fmt::Debug for ErrorRegistry<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorRegistry")
            .field("kinds", &self.kinds().map(FailureKind::name).collect::<Vec<_>>())
            .finish()
    }
}
