//! Multi-threaded CPU backends for `tod-hal`.
//!
//! This crate provides two backends sharing one FFT engine built on
//! [`rustfft`] and one set of rayon launch strategies:
//!
//! - [`CpuHost`] runs every kernel on a rayon pool sized from
//!   [`Environment::max_threads`](tod_hal::config::Environment::max_threads)
//!   and never reports an accelerator.
//! - [`CpuOffload`] additionally exposes one emulated accelerator. Its device
//!   memory is the mirror arena of the context's
//!   [`DeviceManager`](tod_hal::layouts::DeviceManager): inputs must be staged
//!   before a device launch and results copied back with `update_host`, as
//!   with a discrete device. Device launches run on a dedicated pool with the
//!   team/thread decomposition of accelerator kernels.
//!
//! | Module     | Domain                                                   |
//! |------------|----------------------------------------------------------|
//! | `context`  | Backend handles, worker pools, device detection          |
//! | `pointing` | Host-parallel and device-parallel pointing launches      |
//! | `fft`      | Batched real FFT plans on top of `rustfft`               |
//!
//! Both backends produce pointing output bit-identical to
//! `tod-cpu-ref`: all launch strategies call the same per-sample function.

mod context;
mod fft;
mod pointing;

#[cfg(test)]
mod tests;

pub use context::{CpuHostHandle, CpuOffloadHandle, EMULATED_DEVICES, HostPool};
pub use fft::RustFftHandle;

/// Rayon-parallel host backend.
pub struct CpuHost {}

/// Host backend plus one emulated accelerator.
pub struct CpuOffload {}
