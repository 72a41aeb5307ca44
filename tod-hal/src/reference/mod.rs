//! Pure-Rust reference implementations.
//!
//! Contains the quaternion primitives (`qarray`), the per-sample pointing
//! function and its serial driver (`pointing`), and a table-driven real DFT
//! (`fft`). Every backend builds on `qarray` and `pointing`; the DFT is the
//! correctness oracle of the [`crate::test_suite`] module.

pub mod fft;
pub mod pointing;
pub mod qarray;
