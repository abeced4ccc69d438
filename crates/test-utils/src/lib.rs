//! Shared test utilities for the tile explorer workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Sample backend payloads (keys, listings, metadata, colormaps)
//! - An in-process mock backend serving those payloads over HTTP
//! - Approximate float assertions
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, MockBackend};
//! ```

pub mod fixtures;
pub mod generators;
pub mod server;

// Re-export commonly used items at the crate root
pub use generators::*;
pub use server::MockBackend;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Approximate equality of `(min, max)` value ranges.
///
/// ```ignore
/// use test_utils::assert_range_approx_eq;
///
/// assert_range_approx_eq!((0.0, 120.0001), (0.0, 120.0), 0.001);
/// ```
#[macro_export]
macro_rules! assert_range_approx_eq {
    (($min1:expr, $max1:expr), ($min2:expr, $max2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($min1, $min2, $epsilon);
        $crate::assert_approx_eq!($max1, $max2, $epsilon);
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    fn test_assert_range_approx_eq_passes() {
        assert_range_approx_eq!((20.0001, 80.0), (20.0, 80.0001), 0.001);
    }
}
