#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections

//! # Safe Callback
//!
//! Declarative failure handling for Rust: wrap an operation in a guard, register handlers
//! keyed by failure kind, and let the guard route each failure while running optional
//! success and cleanup steps.
//!
//! ## Overview
//!
//! A guard replaces hand-written `match`/cleanup blocks around a unit of work with a
//! reusable, composable object:
//!
//! - the protected operation runs exactly once per call;
//! - a failure is matched against the guard's registry and, when a handler exists, the
//!   handler's value becomes the call's result;
//! - unmatched failures come back to the caller unchanged;
//! - the cleanup step runs exactly once on every call.
//!
//! ## Module Organization
//!
//! - [`failure`] - Failure kinds, the [`Failure`] trait, and downcasting
//! - [`registry`] - Ordered kind → handler registry
//! - [`dispatcher`] - Exact and ancestry-aware matching policies
//! - [`invocation`] - The per-call run / recover / finalize cycle
//! - [`guard`] - Builder and cloneable guard handle with late registration
//! - [`context`] - Dynamic positional/keyword argument bag
//! - [`config`] - Configuration from files and environment
//! - [`error`] - Errors raised by the guard machinery itself
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust
//! use safe_callback::{DispatchPolicy, Failure, FailureKind, GuardBuilder, SimpleFailure};
//!
//! static LOOKUP: FailureKind = FailureKind::root("LookupError");
//! static KEY: FailureKind = FailureKind::derived("KeyError", &LOOKUP);
//!
//! let fetch = GuardBuilder::new()
//!     .named("fetch")
//!     .dispatch_policy(DispatchPolicy::Ancestry)
//!     .protect(|key: &String| match key.as_str() {
//!         "answer" => Ok(42),
//!         _ => Err(SimpleFailure::new(&KEY, key.clone()).boxed()),
//!     })
//!     .handler(&LOOKUP, |_: &dyn Failure, _: &String| Ok(0))
//!     .build();
//!
//! assert_eq!(fetch.invoke("answer".to_string()).unwrap(), 42);
//! assert_eq!(fetch.invoke("question".to_string()).unwrap(), 0);
//! ```

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod failure;
pub mod guard;
pub mod invocation;
pub mod logging;
pub mod registry;
pub mod state;

pub use crate::config::GuardConfig;
pub use crate::context::CallContext;
pub use crate::dispatcher::{DispatchPolicy, ErrorDispatcher};
pub use crate::error::{GuardError, Result, GUARD_CONFIGURATION, INVALID_ARGUMENT};
pub use crate::failure::{BoxedFailure, Failure, FailureKind, SimpleFailure};
pub use crate::guard::{safe_callback, Guard, GuardBuilder, WeakGuard};
pub use crate::invocation::GuardedInvocation;
pub use crate::registry::{ErrorHandlerFn, ErrorRegistry, HandlerEntry, HandlerUsage};
pub use crate::state::InvocationState;
