mod buffer;
mod context;
mod device;
mod fft;
mod interval;
mod pointing;
mod raw;

pub use buffer::*;
pub use context::*;
pub use device::*;
pub use fft::*;
pub use interval::*;
pub use pointing::*;
pub use raw::*;
