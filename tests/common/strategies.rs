use super::taxonomy::ALL_KINDS;
use proptest::prelude::*;
use safe_callback::{DispatchPolicy, FailureKind};

/// Strategy for picking one kind from the shared taxonomy
pub fn kind_strategy() -> impl Strategy<Value = &'static FailureKind> {
    prop::sample::select(ALL_KINDS.to_vec())
}

/// Strategy for a non-empty subset of the taxonomy, in random registration order
pub fn registered_kinds_strategy() -> impl Strategy<Value = Vec<&'static FailureKind>> {
    prop::sample::subsequence(ALL_KINDS.to_vec(), 1..=ALL_KINDS.len()).prop_shuffle()
}

/// Strategy for either dispatch policy
pub fn policy_strategy() -> impl Strategy<Value = DispatchPolicy> {
    prop_oneof![Just(DispatchPolicy::Exact), Just(DispatchPolicy::Ancestry)]
}

/// Strategy for division operands, including a zero denominator about a fifth of the time
pub fn operands_strategy() -> impl Strategy<Value = (f64, f64)> {
    (
        -1_000.0f64..1_000.0,
        prop_oneof![1 => Just(0.0f64), 4 => (1.0f64..1_000.0)],
    )
}
