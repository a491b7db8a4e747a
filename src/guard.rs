//! # Guard Builder and Registration
//!
//! Caller-facing surface: [`GuardBuilder`] accumulates configuration and produces a
//! [`Guard`], a cloneable handle onto one shared [`GuardedInvocation`].
//!
//! Handlers can be attached up front on the builder, or later through the guard. Late
//! registrations and step replacements apply to every subsequent call, including calls
//! made through clones taken before the change.
//!
//! ## Usage
//!
//! ```rust
//! use safe_callback::failure::{Failure, FailureKind, SimpleFailure};
//! use safe_callback::guard::GuardBuilder;
//!
//! static ZERO_DIVISION: FailureKind = FailureKind::root("ZeroDivisionError");
//!
//! let divide = GuardBuilder::new()
//!     .named("divide")
//!     .protect(|(x, y): &(f64, f64)| {
//!         if *y == 0.0 {
//!             return Err(SimpleFailure::new(&ZERO_DIVISION, "division by zero").boxed());
//!         }
//!         Ok(format!("{}", x / y))
//!     })
//!     .handler(&ZERO_DIVISION, |_: &dyn Failure, _: &(f64, f64)| {
//!         Ok("Cannot divide because denominator is 0!".to_string())
//!     })
//!     .build();
//!
//! assert_eq!(divide.invoke((4.0, 2.0)).unwrap(), "2");
//! assert_eq!(
//!     divide.invoke((4.0, 0.0)).unwrap(),
//!     "Cannot divide because denominator is 0!"
//! );
//! ```

use crate::config::GuardConfig;
use crate::dispatcher::{DispatchPolicy, ErrorDispatcher};
use crate::error::Result;
use crate::failure::{BoxedFailure, Failure, FailureKind};
use crate::invocation::{CleanupFn, GuardedInvocation, ProtectedFn, SuccessFn};
use crate::logging::log_guard_operation;
use crate::registry::{ErrorRegistry, HandlerEntry, HandlerUsage};
use std::fmt;
use std::sync::{Arc, Weak};

const DEFAULT_GUARD_NAME: &str = "guard";

/// Fluent configuration for a [`Guard`]
pub struct GuardBuilder<A, T> {
    name: String,
    operation: Option<Arc<ProtectedFn<A, T>>>,
    success: Option<Arc<SuccessFn<A, T>>>,
    cleanup: Option<Arc<CleanupFn<A>>>,
    policy: DispatchPolicy,
    registry: ErrorRegistry<A, T>,
    bound_args: Option<A>,
    validate_on_build: bool,
}

impl<A, T> GuardBuilder<A, T> {
    pub fn new() -> Self {
        Self {
            name: DEFAULT_GUARD_NAME.to_string(),
            operation: None,
            success: None,
            cleanup: None,
            policy: DispatchPolicy::default(),
            registry: ErrorRegistry::new(),
            bound_args: None,
            validate_on_build: false,
        }
    }

    /// Start from loaded configuration (name, dispatch policy, validation mode)
    pub fn from_config(config: &GuardConfig) -> Self {
        Self {
            name: config.guard_name.clone(),
            policy: config.dispatch_policy,
            validate_on_build: config.validate_on_build,
            ..Self::new()
        }
    }

    /// Name used in log output and configuration errors
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the protected operation
    pub fn protect<F>(mut self, operation: F) -> Self
    where
        F: Fn(&A) -> std::result::Result<T, BoxedFailure> + Send + Sync + 'static,
    {
        self.operation = Some(Arc::new(operation));
        self
    }

    /// Set the step that runs after the protected operation returns a value
    pub fn on_success<F>(mut self, step: F) -> Self
    where
        F: Fn(&T, &A) -> std::result::Result<(), BoxedFailure> + Send + Sync + 'static,
    {
        self.success = Some(Arc::new(step));
        self
    }

    /// Set the step that runs at the end of every invocation
    pub fn finally<F>(mut self, step: F) -> Self
    where
        F: Fn(&A) -> std::result::Result<(), BoxedFailure> + Send + Sync + 'static,
    {
        self.cleanup = Some(Arc::new(step));
        self
    }

    pub fn dispatch_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn handler<H>(mut self, kind: &'static FailureKind, handler: H) -> Self
    where
        H: Fn(&dyn Failure, &A) -> std::result::Result<T, BoxedFailure> + Send + Sync + 'static,
    {
        self.registry.register(kind, handler);
        self
    }

    pub fn handler_with_usage<H>(
        mut self,
        kind: &'static FailureKind,
        handler: H,
        usage: HandlerUsage<A, T>,
    ) -> Self
    where
        H: Fn(&dyn Failure, &A) -> std::result::Result<T, BoxedFailure> + Send + Sync + 'static,
    {
        self.registry.register_with_usage(kind, handler, usage);
        self
    }

    /// Bulk-register a kind → handler mapping, in iteration order
    pub fn handlers<I>(mut self, handlers: I) -> Self
    where
        I: IntoIterator<Item = (&'static FailureKind, HandlerEntry<A, T>)>,
    {
        for (kind, entry) in handlers {
            self.registry.register_entry(kind, entry);
        }
        self
    }

    /// Arguments used by [`Guard::call`]
    pub fn bind_args(mut self, args: A) -> Self {
        self.bound_args = Some(args);
        self
    }

    /// Reject a missing protected operation in [`GuardBuilder::try_build`]
    pub fn validate_on_build(mut self, validate: bool) -> Self {
        self.validate_on_build = validate;
        self
    }

    /// Freeze the configuration; a missing operation is reported at call time
    pub fn build(self) -> Guard<A, T> {
        let details = format!("policy={} handlers={}", self.policy, self.registry.len());
        log_guard_operation(&self.name, "build", "ok", Some(&details));

        let dispatcher = ErrorDispatcher::with_registry(self.policy, self.registry);
        Guard {
            inner: Arc::new(GuardedInvocation::new(
                self.name,
                self.operation,
                dispatcher,
                self.success,
                self.cleanup,
                self.bound_args,
            )),
        }
    }

    /// Always validate eagerly
    pub fn build_validated(self) -> Result<Guard<A, T>> {
        let guard = self.build();
        guard.inner.validate()?;
        Ok(guard)
    }

    /// Build, validating eagerly only when `validate_on_build` is set
    pub fn try_build(self) -> Result<Guard<A, T>> {
        if self.validate_on_build {
            self.build_validated()
        } else {
            Ok(self.build())
        }
    }
}

impl<A, T> Default for GuardBuilder<A, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, T> fmt::Debug for GuardBuilder<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardBuilder")
            .field("name", &self.name)
            .field("has_operation", &self.operation.is_some())
            .field("policy", &self.policy)
            .field("registry", &self.registry)
            .field("validate_on_build", &self.validate_on_build)
            .finish_non_exhaustive()
    }
}

/// Re-invocable guard; clones share handlers and steps
pub struct Guard<A, T> {
    inner: Arc<GuardedInvocation<A, T>>,
}

impl<A, T> Guard<A, T> {
    pub fn builder() -> GuardBuilder<A, T> {
        GuardBuilder::new()
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Run the protected operation with `args` under the guard
    pub fn invoke(&self, args: A) -> std::result::Result<T, BoxedFailure> {
        self.inner.invoke(args)
    }

    /// Run with the arguments bound at build time
    pub fn call(&self) -> std::result::Result<T, BoxedFailure>
    where
        A: Clone,
    {
        self.inner.call()
    }

    /// Register (or replace) the handler for `kind` on the live registry
    pub fn error_handler<H>(&self, kind: &'static FailureKind, handler: H) -> &Self
    where
        H: Fn(&dyn Failure, &A) -> std::result::Result<T, BoxedFailure> + Send + Sync + 'static,
    {
        self.inner.register_handler(kind, HandlerEntry::new(handler));
        self
    }

    pub fn error_handler_with_usage<H>(
        &self,
        kind: &'static FailureKind,
        handler: H,
        usage: HandlerUsage<A, T>,
    ) -> &Self
    where
        H: Fn(&dyn Failure, &A) -> std::result::Result<T, BoxedFailure> + Send + Sync + 'static,
    {
        self.inner
            .register_handler(kind, HandlerEntry::new(handler).with_usage(usage));
        self
    }

    /// Replace the success step
    pub fn success_handler<F>(&self, step: F) -> &Self
    where
        F: Fn(&T, &A) -> std::result::Result<(), BoxedFailure> + Send + Sync + 'static,
    {
        self.inner.set_success_step(Arc::new(step));
        self
    }

    /// Replace the cleanup step
    pub fn finally_workflow<F>(&self, step: F) -> &Self
    where
        F: Fn(&A) -> std::result::Result<(), BoxedFailure> + Send + Sync + 'static,
    {
        self.inner.set_cleanup_step(Arc::new(step));
        self
    }

    pub fn set_dispatch_policy(&self, policy: DispatchPolicy) -> &Self {
        self.inner.set_dispatch_policy(policy);
        self
    }

    pub fn dispatch_policy(&self) -> DispatchPolicy {
        self.inner.dispatch_policy()
    }

    pub fn handles(&self, kind: &FailureKind) -> bool {
        self.inner.handles(kind)
    }

    pub fn handled_kinds(&self) -> Vec<&'static FailureKind> {
        self.inner.handled_kinds()
    }

    /// Non-owning handle, for handlers and steps that refer back to their own guard
    pub fn downgrade(&self) -> WeakGuard<A, T> {
        WeakGuard {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl<A, T> Clone for Guard<A, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, T> fmt::Debug for Guard<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Guard").field(&self.inner).finish()
    }
}

/// Weak counterpart of [`Guard`]; does not keep the guard alive
pub struct WeakGuard<A, T> {
    inner: Weak<GuardedInvocation<A, T>>,
}

impl<A, T> WeakGuard<A, T> {
    /// The guard, if any strong handle still exists
    pub fn upgrade(&self) -> Option<Guard<A, T>> {
        self.inner.upgrade().map(|inner| Guard { inner })
    }
}

impl<A, T> Clone for WeakGuard<A, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<A, T> fmt::Debug for WeakGuard<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakGuard")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Guard `operation` with a kind → handler mapping, using exact dispatch
pub fn safe_callback<A, T, I, F>(handlers: I, operation: F) -> Guard<A, T>
where
    I: IntoIterator<Item = (&'static FailureKind, HandlerEntry<A, T>)>,
    F: Fn(&A) -> std::result::Result<T, BoxedFailure> + Send + Sync + 'static,
{
    GuardBuilder::new()
        .handlers(handlers)
        .protect(operation)
        .build()
}
