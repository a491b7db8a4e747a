//! Failure taxonomy shared by the integration tests, shaped like a familiar
//! exception hierarchy.

use safe_callback::{BoxedFailure, Failure, FailureKind, SimpleFailure};

pub static EXCEPTION: FailureKind = FailureKind::root("Exception");
pub static ARITHMETIC: FailureKind = FailureKind::derived("ArithmeticError", &EXCEPTION);
pub static ZERO_DIVISION: FailureKind = FailureKind::derived("ZeroDivisionError", &ARITHMETIC);
pub static OVERFLOW: FailureKind = FailureKind::derived("OverflowError", &ARITHMETIC);
pub static LOOKUP: FailureKind = FailureKind::derived("LookupError", &EXCEPTION);
pub static KEY: FailureKind = FailureKind::derived("KeyError", &LOOKUP);
pub static VALUE: FailureKind = FailureKind::derived("ValueError", &EXCEPTION);

/// Every kind above, roots first
pub static ALL_KINDS: [&FailureKind; 7] = [
    &EXCEPTION,
    &ARITHMETIC,
    &ZERO_DIVISION,
    &OVERFLOW,
    &LOOKUP,
    &KEY,
    &VALUE,
];

/// Dedicated failure type for division by zero, carrying the numerator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("division by zero: {numerator} / 0")]
pub struct ZeroDivision {
    pub numerator: f64,
}

impl Failure for ZeroDivision {
    fn kind(&self) -> &'static FailureKind {
        &ZERO_DIVISION
    }
}

/// `x / y`, failing with [`ZeroDivision`] when `y` is zero
pub fn divide(&(x, y): &(f64, f64)) -> Result<f64, BoxedFailure> {
    if y == 0.0 {
        return Err(ZeroDivision { numerator: x }.boxed());
    }
    Ok(x / y)
}

/// Operation that always raises a failure of `kind`
pub fn raise(kind: &'static FailureKind) -> impl Fn(&()) -> Result<String, BoxedFailure> {
    move |_: &()| Err(SimpleFailure::new(kind, "raised").boxed())
}
