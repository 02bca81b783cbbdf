//! The objective adapter (C8): turns a plain function of a position vector
//! into the callable the engine evaluates every iteration.

use ndarray::Array1;

/// A black-box objective `f: R^d -> R`.
///
/// Any `Fn(&Array1<f64>) -> f64 + Sync` already satisfies this contract; there
/// is no separate adapter type to construct. The engine copies positions
/// before evaluation, so an implementation is free to ignore the lifetime of
/// its argument past the call.
pub trait ObjectiveFn: Fn(&Array1<f64>) -> f64 + Sync {}

impl<T> ObjectiveFn for T where T: Fn(&Array1<f64>) -> f64 + Sync {}
