use std::{ptr::NonNull, sync::Arc};

use rayon::{ThreadPool, ThreadPoolBuilder};
use tod_hal::{
    Error, Result,
    config::Environment,
    layouts::{Backend, Context, DeviceManager},
    oep::ContextNewImpl,
};
use tracing::debug;

use crate::{CpuHost, CpuOffload, RustFftHandle};

/// Number of accelerators [`CpuOffload`] reports.
pub const EMULATED_DEVICES: usize = 1;

fn build_pool(backend: &'static str, prefix: &'static str, n_threads: usize) -> Result<Arc<ThreadPool>> {
    let pool: ThreadPool = ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .thread_name(move |i| format!("{prefix}-{i}"))
        .build()
        .map_err(|e| Error::BackendInit {
            backend,
            reason: e.to_string(),
        })?;
    debug!(backend, pool = prefix, n_threads, "worker pool ready");
    Ok(Arc::new(pool))
}

/// Access to the host worker pool, shared by the FFT engine of both backends.
pub trait HostPool {
    fn host_pool(&self) -> &Arc<ThreadPool>;
}

pub struct CpuHostHandle {
    pool: Arc<ThreadPool>,
}

impl HostPool for CpuHostHandle {
    fn host_pool(&self) -> &Arc<ThreadPool> {
        &self.pool
    }
}

pub struct CpuOffloadHandle {
    host: Arc<ThreadPool>,
    device: Arc<ThreadPool>,
}

impl CpuOffloadHandle {
    /// Pool executing device launches.
    pub fn device_pool(&self) -> &Arc<ThreadPool> {
        &self.device
    }
}

impl HostPool for CpuOffloadHandle {
    fn host_pool(&self) -> &Arc<ThreadPool> {
        &self.host
    }
}

impl Backend for CpuHost {
    type Handle = CpuHostHandle;
    type FftHandle = RustFftHandle;

    fn name() -> &'static str {
        "cpu-host"
    }

    unsafe fn destroy(handle: NonNull<Self::Handle>) {
        unsafe {
            drop(Box::from_raw(handle.as_ptr()));
        }
    }
}

impl Backend for CpuOffload {
    type Handle = CpuOffloadHandle;
    type FftHandle = RustFftHandle;

    fn name() -> &'static str {
        "cpu-offload"
    }

    unsafe fn destroy(handle: NonNull<Self::Handle>) {
        unsafe {
            drop(Box::from_raw(handle.as_ptr()));
        }
    }
}

unsafe impl ContextNewImpl<Self> for CpuHost {
    fn new_impl(env: &Environment) -> Result<Context<Self>> {
        let handle: CpuHostHandle = CpuHostHandle {
            pool: build_pool(Self::name(), "tod-host", env.max_threads())?,
        };
        let ptr: NonNull<CpuHostHandle> = NonNull::from(Box::leak(Box::new(handle)));
        Ok(unsafe { Context::from_nonnull(ptr, DeviceManager::new(0, env)) })
    }
}

unsafe impl ContextNewImpl<Self> for CpuOffload {
    fn new_impl(env: &Environment) -> Result<Context<Self>> {
        let devices: DeviceManager = DeviceManager::new(EMULATED_DEVICES, env);
        let handle: CpuOffloadHandle = CpuOffloadHandle {
            host: build_pool(Self::name(), "tod-host", env.max_threads())?,
            device: build_pool(Self::name(), "tod-device", env.max_threads())?,
        };
        let ptr: NonNull<CpuOffloadHandle> = NonNull::from(Box::leak(Box::new(handle)));
        Ok(unsafe { Context::from_nonnull(ptr, devices) })
    }
}
