// scanmotion_core/src/types.rs

use nalgebra::Isometry3;
use std::sync::Arc;

// --- Core Trait for Transform Lookups ---
// This is so fundamental it belongs here.

/// The contract for any object that can provide transform information.
///
/// The `TfBuffer` implements it, as will a mock for testing. Implementations
/// must answer immediately: a missing or not-yet-available transform is a
/// `None`, never a wait.
pub trait TfProvider: Send + Sync {
    /// Gets the transform that maps points expressed in `source` into `target`
    /// at time `stamp`.
    fn lookup_transform(&self, target: &str, source: &str, stamp: f64) -> Option<Isometry3<f64>>;
}

impl<T: TfProvider + ?Sized> TfProvider for Arc<T> {
    fn lookup_transform(&self, target: &str, source: &str, stamp: f64) -> Option<Isometry3<f64>> {
        (**self).lookup_transform(target, source, stamp)
    }
}

impl<T: TfProvider + ?Sized> TfProvider for &T {
    fn lookup_transform(&self, target: &str, source: &str, stamp: f64) -> Option<Isometry3<f64>> {
        (**self).lookup_transform(target, source, stamp)
    }
}
