//! Open Extension Points (OEP) for backend crates.
//!
//! This module defines the `unsafe` trait layer that backend crates implement
//! to provide the kernels. Each trait mirrors a corresponding safe trait in
//! the [`crate::api`] module, distinguished by an `Impl` suffix (e.g.,
//! [`crate::api::PointingDetector`] is backed by [`PointingDetectorImpl`]).
//!
//! All traits in this module are `unsafe` because implementations must uphold
//! the backend safety contract:
//!
//! - descriptors handed to an implementation were validated by
//!   [`crate::delegates`]; implementations must not write outside the rows
//!   and interval samples they describe;
//! - addresses resolved for [`ExecTarget::Device`](crate::layouts::ExecTarget)
//!   belong to the device mirror arena and must only be dereferenced by the
//!   device launch path;
//! - launches are synchronous: every write is complete when the call returns.

mod context;
mod fft;
mod pointing;

pub use context::*;
pub use fft::*;
pub use pointing::*;
