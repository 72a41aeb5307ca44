//! Criterion-based benchmark harnesses, generic over any backend.
//!
//! Backend crates call these functions to measure their kernels across
//! detector counts, sample counts and transform lengths.

pub mod fft;
pub mod pointing;
