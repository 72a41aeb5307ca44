//! Errors raised at kernel boundaries, by the device manager and while
//! assembling the [`Environment`](crate::config::Environment).
//!
//! Every error is terminal for the call that produced it. Boundary errors are
//! raised before any output element is written.

use thiserror::Error;

use crate::layouts::DType;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Rank or a non-wildcard dimension of a caller buffer disagrees with the kernel.
    #[error("buffer '{name}' has shape {actual:?}, expected {expected:?} (-1 = any)")]
    ShapeMismatch {
        name: &'static str,
        expected: Vec<i64>,
        actual: Vec<usize>,
    },

    /// Element type of a caller buffer disagrees with the kernel.
    #[error("buffer '{name}' has element type {actual}, expected {expected}")]
    DTypeMismatch {
        name: &'static str,
        expected: DType,
        actual: DType,
    },

    /// The declared shape does not describe the wrapped data.
    #[error("shape {shape:?} describes {expected} elements but the data holds {actual}")]
    ShapeSize {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    #[error("interval {index} [{first}, {last}] is outside [0, {n_samp})")]
    InvalidInterval {
        index: usize,
        first: i64,
        last: i64,
        n_samp: usize,
    },

    #[error("intervals {index} and {next} overlap or are not sorted")]
    OverlappingIntervals { index: usize, next: usize },

    #[error("quat_index[{det}] = {value} is outside [0, {n_rows})")]
    QuatIndexOutOfRange { det: usize, value: i32, n_rows: usize },

    #[error("quat_index[{det}] = {value} is also used by detector {other}")]
    DuplicateQuatIndex { det: usize, other: usize, value: i32 },

    #[error("invalid FFT size: length={length}, n_batch={n_batch}")]
    InvalidFftSize { length: usize, n_batch: usize },

    /// A device address was requested for a host buffer that was never staged.
    #[error("no device mirror registered for host buffer '{name}' at {addr:#x}")]
    MissingDeviceMirror { name: &'static str, addr: usize },

    #[error("device mirror for '{name}' holds {mirror} bytes, host buffer holds {host}")]
    MirrorSizeMismatch { name: &'static str, mirror: usize, host: usize },

    #[error("no accelerator device is active")]
    NoAccelerator,

    /// The backend runtime (worker pools, device runtime) could not start.
    #[error("backend '{backend}' failed to start: {reason}")]
    BackendInit { backend: &'static str, reason: String },

    #[error("invalid log level '{0}'")]
    InvalidLogLevel(String),

    #[error("unknown signal '{0}'")]
    UnknownSignal(String),

    #[error("invalid thread count '{0}'")]
    InvalidThreadCount(String),
}
