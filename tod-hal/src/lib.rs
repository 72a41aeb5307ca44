//! # tod-hal
//!
//! A trait-based Hardware Abstraction Layer (HAL) for the two numerical kernels
//! of time-ordered telescope data processing: detector pointing (boresight
//! quaternions composed with focal-plane offsets under flagged-interval
//! selection) and batched real FFTs.
//!
//! Kernels are written once against the [`api`] traits and executed on any
//! backend (serial reference, multi-threaded host, accelerator) that implements
//! the [`oep`] (Open Extension Point) traits.
//!
//! ## Core Concepts
//!
//! **Context:** A [`layouts::Context`] bundles a backend handle (thread pools,
//! device runtime) with a [`layouts::DeviceManager`] describing the accelerator
//! this process uses, if any. It is built once from an
//! [`config::Environment`] and passed by reference into every kernel call.
//!
//! **Quaternions:** `[f64; 4]` in `(x, y, z, w)` order, `w` being the scalar
//! part. See [`reference::qarray`].
//!
//! **Layout types** ([`layouts`]):
//! - [`layouts::Buffer`], [`layouts::BufferMut`] -- type-erased caller buffers, validated into
//!   [`layouts::ArrayView`] / [`layouts::ArrayViewMut`] at the kernel boundary.
//! - [`layouts::Interval`] -- inclusive `[first, last]` sample range.
//! - [`layouts::RawSlice`], [`layouts::RawSliceMut`] -- resolved host or device addresses fed to
//!   the hot loops.
//! - [`layouts::FftPlan`] -- reusable batched real FFT with owned time and frequency buffers.
//!
//! ## Architecture
//!
//! 1. **[`api`]** -- Safe, user-facing trait definitions.
//! 2. **[`oep`]** -- Unsafe extension-point traits mirroring the API. Backend crates implement these.
//! 3. **[`delegates`]** -- Blanket `impl` glue connecting [`api`] to [`oep`] on [`layouts::Context`].
//!    Boundary validation and device address resolution live here, so every backend
//!    receives already-checked descriptors.
//! 4. **[`mod@reference`]** -- Pure-Rust reference implementations (quaternion algebra, the
//!    per-sample pointing function, a table-driven real DFT). Used by every backend and
//!    as a correctness oracle.
//!
//! ## Testing and Benchmarking
//!
//! The [`test_suite`] module provides backend-parametric test functions, instantiated
//! by backend crates through [`backend_test_suite!`] and [`cross_backend_test_suite!`].
//! The [`bench_suite`] module provides Criterion harnesses.

#![deny(rustdoc::broken_intra_doc_links)]

/// Safe, user-facing trait definitions.
pub mod api;

/// Criterion-based benchmark harnesses, generic over any backend.
pub mod bench_suite;

/// Environment configuration and logging setup.
pub mod config;

/// Blanket implementations connecting [`api`] traits to [`oep`] traits on
/// [`layouts::Context`].
pub mod delegates;

/// Error taxonomy shared by all crates of the workspace.
pub mod error;

/// Backend-agnostic data layouts.
pub mod layouts;

/// Open Extension Points: `unsafe` traits that backend crates implement.
pub mod oep;

/// Pure-Rust reference implementations.
pub mod reference;

/// Deterministic pseudorandom number generation based on ChaCha8.
pub mod source;

/// Backend-parametric test functions.
pub mod test_suite;

pub use error::{Error, Result};

/// Default memory alignment in bytes for device mirror allocations.
pub const DEFAULTALIGN: usize = 64;

/// Identity quaternion `(0, 0, 0, 1)`.
pub const QUAT_IDENTITY: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

/// Returns `true` if `ptr` is aligned to [`DEFAULTALIGN`] bytes.
pub fn is_aligned<T>(ptr: *const T) -> bool {
    (ptr as usize).is_multiple_of(DEFAULTALIGN)
}
