//! Blanket implementations connecting [`crate::api`] traits to [`crate::oep`] traits
//! on [`crate::layouts::Context`].
//!
//! Besides the wiring, this is the kernel boundary: caller buffers are
//! extracted and validated here, and device addresses are resolved here, so
//! backends only ever see checked descriptors.

mod context;
mod fft;
mod pointing;
