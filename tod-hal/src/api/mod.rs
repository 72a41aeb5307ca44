//! Safe, user-facing trait definitions.
//!
//! - **context** -- context instantiation from an [`Environment`](crate::config::Environment).
//! - **pointing** -- detector pointing quaternions.
//! - **fft** -- batched real FFT plans.
//!
//! Callers program against these traits; the computation is dispatched to a
//! backend via the [`oep`](crate::oep) extension points.

mod context;
mod fft;
mod pointing;

pub use context::*;
pub use fft::*;
pub use pointing::*;
