//! Floating point type shared by every grid, probability and value array.
//!
//! Double precision unless the crate is built with the `single` feature.

#[cfg(not(feature = "single"))]
pub type Real = f64;

#[cfg(feature = "single")]
pub type Real = f32;
