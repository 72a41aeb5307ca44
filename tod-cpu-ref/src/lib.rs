//! # tod-cpu-ref
//!
//! Serial, portable reference backend for `tod-hal`.
//!
//! [`CpuRef`] runs every kernel on the calling thread with the reference
//! implementations of [`tod_hal::reference`]: the serial detector, interval,
//! sample loop for pointing and the table-driven O(n²) real DFT. It never
//! reports an accelerator. It is the oracle the other backends are tested
//! against, not a production backend.

mod context;
mod fft;
mod pointing;


pub use context::CpuRefHandle;

/// Serial reference backend.
pub struct CpuRef {}
