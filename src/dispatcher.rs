//! # Error Dispatcher
//!
//! Matches a raised failure against an [`ErrorRegistry`] under one of two policies.
//!
//! ## Policies
//!
//! - **Exact**: the failure's concrete kind must equal a registered kind. O(1).
//! - **Ancestry**: entries are scanned in registration order and the first kind that is
//!   an ancestor-or-self of the raised kind wins. O(n) in registered kinds, so callers
//!   needing specificity register more specific kinds first.
//!
//! A miss is not an error: it tells the guard to re-raise the original failure.

use crate::error::GuardError;
use crate::failure::{Failure, FailureKind};
use crate::registry::{ErrorRegistry, HandlerEntry};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Matching policy used to find a handler for a raised failure
///
/// Deserialisation goes through [`FromStr`](std::str::FromStr), so configuration files
/// and environment variables accept the same spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum DispatchPolicy {
    /// Concrete kind must equal a registered kind
    #[default]
    Exact,
    /// First registered ancestor-or-self of the concrete kind
    Ancestry,
}

impl fmt::Display for DispatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Ancestry => write!(f, "ancestry"),
        }
    }
}

impl std::str::FromStr for DispatchPolicy {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "ancestry" | "hierarchy" => Ok(Self::Ancestry),
            other => Err(GuardError::Configuration(format!(
                "Invalid dispatch policy: {other}"
            ))),
        }
    }
}

impl TryFrom<String> for DispatchPolicy {
    type Error = GuardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Owns a guard's registry and resolves failures to handler entries
pub struct ErrorDispatcher<A, T> {
    policy: DispatchPolicy,
    registry: ErrorRegistry<A, T>,
}

impl<A, T> ErrorDispatcher<A, T> {
    pub fn new(policy: DispatchPolicy) -> Self {
        Self::with_registry(policy, ErrorRegistry::new())
    }

    pub fn with_registry(policy: DispatchPolicy, registry: ErrorRegistry<A, T>) -> Self {
        Self { policy, registry }
    }

    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    /// Swap the matching policy; registered handlers are kept
    pub fn set_policy(&mut self, policy: DispatchPolicy) {
        self.policy = policy;
    }

    pub fn registry(&self) -> &ErrorRegistry<A, T> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ErrorRegistry<A, T> {
        &mut self.registry
    }

    /// Find the handler entry for `failure`, or `None` if it must be re-raised
    pub fn dispatch(&self, failure: &dyn Failure) -> Option<&HandlerEntry<A, T>> {
        let raised = failure.kind();
        let matched = match self.policy {
            DispatchPolicy::Exact => self.registry.lookup(raised).map(|entry| (raised, entry)),
            DispatchPolicy::Ancestry => self.find_ancestor(raised),
        };

        match matched {
            Some((kind, entry)) => {
                debug!(
                    raised = %raised,
                    matched = %kind,
                    policy = %self.policy,
                    "🎯 Failure dispatched to handler"
                );
                Some(entry)
            }
            None => {
                debug!(
                    raised = %raised,
                    policy = %self.policy,
                    registered = self.registry.len(),
                    "No handler matched failure"
                );
                None
            }
        }
    }

    fn find_ancestor(
        &self,
        raised: &FailureKind,
    ) -> Option<(&'static FailureKind, &HandlerEntry<A, T>)> {
        self.registry
            .entries()
            .find(|(kind, _)| raised.is_kind_of(kind))
    }
}

impl<A, T> fmt::Debug for ErrorDispatcher<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorDispatcher")
            .field("policy", &self.policy)
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::{BoxedFailure, SimpleFailure};

    static EXCEPTION: FailureKind = FailureKind::root("Exception");
    static ARITHMETIC: FailureKind = FailureKind::derived("ArithmeticError", &EXCEPTION);
    static ZERO_DIVISION: FailureKind = FailureKind::derived("ZeroDivisionError", &ARITHMETIC);
    static VALUE: FailureKind = FailureKind::derived("ValueError", &EXCEPTION);

    fn label(name: &'static str) -> impl Fn(&dyn Failure, &()) -> Result<&'static str, BoxedFailure> {
        move |_: &dyn Failure, _: &()| Ok(name)
    }

    fn resolve(dispatcher: &ErrorDispatcher<(), &'static str>, kind: &'static FailureKind) -> Option<&'static str> {
        let failure = SimpleFailure::new(kind, "boom");
        dispatcher
            .dispatch(&failure)
            .map(|entry| entry.invoke(&failure, &()).unwrap())
    }

    #[test]
    fn test_exact_policy_requires_identical_kind() {
        let mut dispatcher = ErrorDispatcher::new(DispatchPolicy::Exact);
        dispatcher.registry_mut().register(&ARITHMETIC, label("arithmetic"));

        assert_eq!(resolve(&dispatcher, &ARITHMETIC), Some("arithmetic"));
        assert_eq!(resolve(&dispatcher, &ZERO_DIVISION), None);
        assert_eq!(resolve(&dispatcher, &VALUE), None);
    }

    #[test]
    fn test_ancestry_policy_matches_base_kind() {
        let mut dispatcher = ErrorDispatcher::new(DispatchPolicy::Ancestry);
        dispatcher.registry_mut().register(&ARITHMETIC, label("arithmetic"));

        assert_eq!(resolve(&dispatcher, &ZERO_DIVISION), Some("arithmetic"));
        assert_eq!(resolve(&dispatcher, &ARITHMETIC), Some("arithmetic"));
        assert_eq!(resolve(&dispatcher, &VALUE), None);
        assert_eq!(resolve(&dispatcher, &EXCEPTION), None);
    }

    #[test]
    fn test_ancestry_first_registered_match_wins() {
        let mut specific_first = ErrorDispatcher::new(DispatchPolicy::Ancestry);
        specific_first.registry_mut().register(&ZERO_DIVISION, label("zero"));
        specific_first.registry_mut().register(&EXCEPTION, label("catch-all"));
        assert_eq!(resolve(&specific_first, &ZERO_DIVISION), Some("zero"));
        assert_eq!(resolve(&specific_first, &VALUE), Some("catch-all"));

        let mut general_first = ErrorDispatcher::new(DispatchPolicy::Ancestry);
        general_first.registry_mut().register(&EXCEPTION, label("catch-all"));
        general_first.registry_mut().register(&ZERO_DIVISION, label("zero"));
        assert_eq!(resolve(&general_first, &ZERO_DIVISION), Some("catch-all"));
    }

    #[test]
    fn test_policy_swap_keeps_handlers() {
        let mut dispatcher = ErrorDispatcher::new(DispatchPolicy::Exact);
        dispatcher.registry_mut().register(&EXCEPTION, label("catch-all"));
        assert_eq!(resolve(&dispatcher, &VALUE), None);

        dispatcher.set_policy(DispatchPolicy::Ancestry);
        assert_eq!(dispatcher.policy(), DispatchPolicy::Ancestry);
        assert_eq!(resolve(&dispatcher, &VALUE), Some("catch-all"));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("exact".parse::<DispatchPolicy>().unwrap(), DispatchPolicy::Exact);
        assert_eq!(" Ancestry ".parse::<DispatchPolicy>().unwrap(), DispatchPolicy::Ancestry);
        assert_eq!("hierarchy".parse::<DispatchPolicy>().unwrap(), DispatchPolicy::Ancestry);
        assert!(matches!(
            "fuzzy".parse::<DispatchPolicy>(),
            Err(GuardError::Configuration(_))
        ));
        assert_eq!(DispatchPolicy::default(), DispatchPolicy::Exact);
        assert_eq!(DispatchPolicy::Ancestry.to_string(), "ancestry");
    }

    #[test]
    fn test_policy_deserialization_matches_parsing() {
        for (raw, expected) in [
            ("\"exact\"", DispatchPolicy::Exact),
            ("\"Ancestry\"", DispatchPolicy::Ancestry),
            ("\" hierarchy \"", DispatchPolicy::Ancestry),
        ] {
            assert_eq!(serde_json::from_str::<DispatchPolicy>(raw).unwrap(), expected);
        }
        assert!(serde_json::from_str::<DispatchPolicy>("\"fuzzy\"").is_err());
        assert_eq!(
            serde_json::to_string(&DispatchPolicy::Ancestry).unwrap(),
            "\"ancestry\""
        );
    }
}
