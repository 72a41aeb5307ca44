use std::ptr::NonNull;

use tod_hal::{
    Result,
    config::Environment,
    layouts::{Backend, Context, DeviceManager},
    oep::ContextNewImpl,
    reference::fft::DftTable,
};

use crate::CpuRef;

/// Opaque handle of a `Context<CpuRef>`. The backend keeps no state.
pub struct CpuRefHandle {}

impl Backend for CpuRef {
    type Handle = CpuRefHandle;
    type FftHandle = DftTable;

    fn name() -> &'static str {
        "cpu-ref"
    }

    unsafe fn destroy(handle: NonNull<Self::Handle>) {
        unsafe {
            drop(Box::from_raw(handle.as_ptr()));
        }
    }
}

/// # Safety
///
/// The returned `Context` owns the heap-allocated `CpuRefHandle`.
unsafe impl ContextNewImpl<Self> for CpuRef {
    fn new_impl(env: &Environment) -> Result<Context<Self>> {
        // Leak Box to get a stable NonNull pointer
        let ptr: NonNull<CpuRefHandle> = NonNull::from(Box::leak(Box::new(CpuRefHandle {})));
        Ok(unsafe { Context::from_nonnull(ptr, DeviceManager::new(0, env)) })
    }
}
