//! # Guarded Invocation
//!
//! Runs one protected call through the run / succeed-or-recover / finalize cycle.
//!
//! ## Cycle
//!
//! ```text
//! Running ──▶ Ok ─────▶ success step ─┐
//!    │                                ├──▶ Finalizing (cleanup step) ──▶ Done
//!    └──────▶ Failed ──▶ dispatch ────┘
//! ```
//!
//! The cleanup step runs exactly once on every path that reaches `Running`, including
//! unmatched failures and failing handlers. Only the protected operation is guarded:
//! failures raised by handlers or by the success and cleanup steps propagate as they are.
//!
//! Shared state is read under short-lived locks and every callable is cloned out before
//! it runs, so handlers are free to register further handlers on the same guard.

use crate::dispatcher::{DispatchPolicy, ErrorDispatcher};
use crate::error::GuardError;
use crate::failure::{BoxedFailure, Failure, FailureKind};
use crate::logging::log_unhandled_failure;
use crate::registry::HandlerEntry;
use crate::state::InvocationState;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// The unit of work a guard protects
pub type ProtectedFn<A, T> = dyn Fn(&A) -> Result<T, BoxedFailure> + Send + Sync;

/// Runs after the protected operation returned a value
pub type SuccessFn<A, T> = dyn Fn(&T, &A) -> Result<(), BoxedFailure> + Send + Sync;

/// Runs once at the end of every invocation
pub type CleanupFn<A> = dyn Fn(&A) -> Result<(), BoxedFailure> + Send + Sync;

/// Configured guard: protected operation, live handler registry, and optional steps
pub struct GuardedInvocation<A, T> {
    name: String,
    operation: Option<Arc<ProtectedFn<A, T>>>,
    dispatcher: RwLock<ErrorDispatcher<A, T>>,
    success: RwLock<Option<Arc<SuccessFn<A, T>>>>,
    cleanup: RwLock<Option<Arc<CleanupFn<A>>>>,
    bound_args: Option<A>,
}

impl<A, T> GuardedInvocation<A, T> {
    pub(crate) fn new(
        name: String,
        operation: Option<Arc<ProtectedFn<A, T>>>,
        dispatcher: ErrorDispatcher<A, T>,
        success: Option<Arc<SuccessFn<A, T>>>,
        cleanup: Option<Arc<CleanupFn<A>>>,
        bound_args: Option<A>,
    ) -> Self {
        debug!(
            guard = %name,
            policy = %dispatcher.policy(),
            handlers = dispatcher.registry().len(),
            has_operation = operation.is_some(),
            has_success_step = success.is_some(),
            has_cleanup_step = cleanup.is_some(),
            "🛡️ Guarded invocation created"
        );

        Self {
            name,
            operation,
            dispatcher: RwLock::new(dispatcher),
            success: RwLock::new(success),
            cleanup: RwLock::new(cleanup),
            bound_args,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fail if the guard could never run
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.operation.is_none() {
            return Err(GuardError::MissingOperation {
                guard: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Run one full cycle with `args`
    pub fn invoke(&self, args: A) -> Result<T, BoxedFailure> {
        let operation = match &self.operation {
            Some(operation) => Arc::clone(operation),
            None => {
                warn!(guard = %self.name, "Guard invoked without a protected operation");
                return Err(GuardError::MissingOperation {
                    guard: self.name.clone(),
                }
                .boxed());
            }
        };

        let mut cycle = Cycle::start(&self.name);
        let outcome = match operation(&args) {
            Ok(value) => {
                cycle.advance(InvocationState::Ok);
                self.run_success_step(value, &args)
            }
            Err(failure) => {
                cycle.advance(InvocationState::Failed);
                self.recover(failure, &args)
            }
        };

        cycle.advance(InvocationState::Finalizing);
        let outcome = self.run_cleanup_step(&args, outcome);
        cycle.advance(InvocationState::Done);
        outcome
    }

    /// Run one full cycle with the arguments bound at build time
    pub fn call(&self) -> Result<T, BoxedFailure>
    where
        A: Clone,
    {
        match &self.bound_args {
            Some(args) => self.invoke(args.clone()),
            None => Err(GuardError::MissingArguments {
                guard: self.name.clone(),
            }
            .boxed()),
        }
    }

    pub fn has_bound_args(&self) -> bool {
        self.bound_args.is_some()
    }

    pub fn register_handler(
        &self,
        kind: &'static FailureKind,
        entry: HandlerEntry<A, T>,
    ) -> Option<HandlerEntry<A, T>> {
        let replaced = self.dispatcher.write().registry_mut().register_entry(kind, entry);
        debug!(
            guard = %self.name,
            kind = %kind,
            replaced = replaced.is_some(),
            "Error handler registered"
        );
        replaced
    }

    pub fn set_success_step(&self, step: Arc<SuccessFn<A, T>>) {
        let previous = self.success.write().replace(step);
        debug!(guard = %self.name, replaced = previous.is_some(), "Success step set");
    }

    pub fn set_cleanup_step(&self, step: Arc<CleanupFn<A>>) {
        let previous = self.cleanup.write().replace(step);
        debug!(guard = %self.name, replaced = previous.is_some(), "Cleanup step set");
    }

    pub fn set_dispatch_policy(&self, policy: DispatchPolicy) {
        self.dispatcher.write().set_policy(policy);
        debug!(guard = %self.name, policy = %policy, "Dispatch policy changed");
    }

    pub fn dispatch_policy(&self) -> DispatchPolicy {
        self.dispatcher.read().policy()
    }

    /// Whether a handler is registered for exactly `kind`
    pub fn handles(&self, kind: &FailureKind) -> bool {
        self.dispatcher.read().registry().contains(kind)
    }

    /// Registered kinds in registration order
    pub fn handled_kinds(&self) -> Vec<&'static FailureKind> {
        self.dispatcher.read().registry().kinds().collect()
    }

    fn run_success_step(&self, value: T, args: &A) -> Result<T, BoxedFailure> {
        let step = self.success.read().clone();
        if let Some(step) = step {
            trace!(guard = %self.name, "Running success step");
            step(&value, args)?;
        }
        Ok(value)
    }

    fn recover(&self, failure: BoxedFailure, args: &A) -> Result<T, BoxedFailure> {
        let entry = self.dispatcher.read().dispatch(failure.as_ref()).cloned();
        match entry {
            Some(entry) => {
                debug!(
                    guard = %self.name,
                    kind = %failure.kind(),
                    "Recovering failure with registered handler"
                );
                entry.invoke(failure.as_ref(), args)
            }
            None => {
                log_unhandled_failure(&self.name, failure.kind().name(), &failure.to_string());
                Err(failure)
            }
        }
    }

    fn run_cleanup_step(
        &self,
        args: &A,
        outcome: Result<T, BoxedFailure>,
    ) -> Result<T, BoxedFailure> {
        let step = self.cleanup.read().clone();
        let Some(step) = step else {
            return outcome;
        };

        trace!(guard = %self.name, "Running cleanup step");
        match step(args) {
            Ok(()) => outcome,
            Err(cleanup_failure) => {
                if let Err(superseded) = &outcome {
                    warn!(
                        guard = %self.name,
                        superseded = %superseded,
                        "Cleanup failure replaces pending failure"
                    );
                }
                Err(cleanup_failure)
            }
        }
    }
}

impl<A, T> fmt::Debug for GuardedInvocation<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedInvocation")
            .field("name", &self.name)
            .field("has_operation", &self.operation.is_some())
            .field("dispatcher", &*self.dispatcher.read())
            .field("has_success_step", &self.success.read().is_some())
            .field("has_cleanup_step", &self.cleanup.read().is_some())
            .field("has_bound_args", &self.bound_args.is_some())
            .finish()
    }
}

/// Tracks the state of one invocation for tracing
struct Cycle<'a> {
    guard: &'a str,
    state: InvocationState,
}

impl<'a> Cycle<'a> {
    fn start(guard: &'a str) -> Self {
        trace!(guard = %guard, state = %InvocationState::Running, "Invocation started");
        Self {
            guard,
            state: InvocationState::Running,
        }
    }

    fn advance(&mut self, next: InvocationState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal invocation transition {} -> {}",
            self.state,
            next
        );
        trace!(guard = %self.guard, from = %self.state, to = %next, "Invocation state transition");
        self.state = next;
    }
}
