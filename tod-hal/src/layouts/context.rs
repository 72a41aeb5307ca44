use std::{marker::PhantomData, ptr::NonNull};

use crate::layouts::{Device, DeviceManager};

#[allow(clippy::missing_safety_doc)]
pub trait Backend: Sized + Sync + Send {
    /// Backend state owned by a [`Context`] (worker pools, device runtime).
    type Handle: 'static;
    /// Per-plan FFT state (twiddle tables, planned algorithms).
    type FftHandle: Send + Sync;
    fn name() -> &'static str;
    unsafe fn destroy(handle: NonNull<Self::Handle>);
}

/// Explicit execution context: a backend handle plus the device this
/// process launches kernels on. Every kernel call receives it by reference.
pub struct Context<B: Backend> {
    ptr: NonNull<B::Handle>,
    devices: DeviceManager,
    _marker: PhantomData<B>,
}

unsafe impl<B: Backend> Sync for Context<B> {}
unsafe impl<B: Backend> Send for Context<B> {}

impl<B: Backend> Context<B> {
    /// # Safety
    /// `ptr` must point to a live handle that the context may free through
    /// [`Backend::destroy`] when dropped.
    #[inline]
    pub unsafe fn from_nonnull(ptr: NonNull<B::Handle>, devices: DeviceManager) -> Self {
        Self {
            ptr,
            devices,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn handle(&self) -> &B::Handle {
        // SAFETY: the handle is owned by the context and freed only on drop.
        unsafe { self.ptr.as_ref() }
    }

    #[inline]
    pub fn devices(&self) -> &DeviceManager {
        &self.devices
    }

    /// Mutable access for mirror registration. Exclusive borrow guarantees
    /// no kernel runs on this context meanwhile.
    #[inline]
    pub fn devices_mut(&mut self) -> &mut DeviceManager {
        &mut self.devices
    }

    #[inline]
    pub fn get_device(&self) -> Device {
        self.devices.get_device()
    }

    #[inline]
    pub fn device_is_host(&self) -> bool {
        self.devices.device_is_host()
    }
}

impl<B: Backend> Drop for Context<B> {
    fn drop(&mut self) {
        unsafe { B::destroy(self.ptr) }
    }
}
