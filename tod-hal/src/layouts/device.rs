//! Accelerator selection and host ↔ device mirror bookkeeping.
//!
//! A [`DeviceManager`] is owned by a [`Context`](crate::layouts::Context). It
//! records which device, if any, this process launches kernels on, and the
//! device-resident mirror of every staged host buffer. Mirrors are keyed by
//! the host buffer's address: a kernel asks for the mirror of an address it
//! knows was staged, and gets an error, never a silent host fallback, if it
//! was not.
//!
//! Mirror memory is an aligned allocation owned by the manager and addressed
//! only through raw pointers, so a launch can write into it while the manager
//! itself is shared. Registration ([`DeviceManager::stage`],
//! [`DeviceManager::release`]) takes `&mut self` and therefore cannot overlap
//! with a launch.
//!
//! Each mirror lives as long as the [`Staged`] guard returned by `stage`.
//! Dropping the guard retires the mirror at once; its memory is reclaimed by
//! the next registration call, never under a running launch.

use std::{
    alloc::Layout,
    fmt::Display,
    ptr::NonNull,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use fnv::FnvHashMap;
use tracing::{debug, trace};

use crate::{
    DEFAULTALIGN,
    config::Environment,
    error::{Error, Result},
    layouts::{Element, RawSlice, RawSliceMut},
};

/// Raw identifier reported for the host, following the OpenMP convention of a
/// negative "initial device".
pub const HOST_DEVICE_ID: i32 = -1;

/// Target of kernel launches for one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Host,
    Accel(usize),
}

impl Device {
    pub fn is_host(&self) -> bool {
        matches!(self, Device::Host)
    }

    pub fn id(&self) -> Option<usize> {
        match self {
            Device::Host => None,
            Device::Accel(id) => Some(*id),
        }
    }

    /// Device number, or [`HOST_DEVICE_ID`] for the host.
    pub fn as_raw(&self) -> i32 {
        match self {
            Device::Host => HOST_DEVICE_ID,
            Device::Accel(id) => *id as i32,
        }
    }
}

impl Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Host => write!(f, "host"),
            Device::Accel(id) => write!(f, "accel:{id}"),
        }
    }
}

/// Scope of one device mirror, returned by [`DeviceManager::stage`].
///
/// The mirror resolves only while its guard is alive. Mirrors are looked up
/// by host address, so the guard must be dropped no later than the host
/// buffer it was staged from: a later allocation reusing that address would
/// otherwise see the old mirror.
#[must_use = "dropping the guard retires the mirror"]
#[derive(Debug)]
pub struct Staged {
    name: &'static str,
    live: Arc<AtomicBool>,
}

impl Staged {
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Drop for Staged {
    fn drop(&mut self) {
        self.live.store(false, Ordering::Release);
    }
}

struct DeviceAlloc {
    ptr: NonNull<u8>,
    layout: Layout,
    size: usize,
    live: Arc<AtomicBool>,
}

unsafe impl Send for DeviceAlloc {}
unsafe impl Sync for DeviceAlloc {}

impl DeviceAlloc {
    fn new(size: usize) -> Self {
        let padded: usize = size.max(1).next_multiple_of(DEFAULTALIGN);
        let layout: Layout = match Layout::from_size_align(padded, DEFAULTALIGN) {
            Ok(layout) => layout,
            Err(_) => panic!("invalid mirror layout for {size} bytes"),
        };
        let ptr: *mut u8 = unsafe { std::alloc::alloc_zeroed(layout) };
        let ptr: NonNull<u8> = match NonNull::new(ptr) {
            Some(ptr) => ptr,
            None => std::alloc::handle_alloc_error(layout),
        };
        Self {
            ptr,
            layout,
            size,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn write_from(&self, bytes: &[u8]) {
        debug_assert!(bytes.len() <= self.size);
        unsafe { std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.ptr.as_ptr(), bytes.len()) }
    }

    fn read_into(&self, bytes: &mut [u8]) {
        debug_assert!(bytes.len() <= self.size);
        unsafe { std::ptr::copy_nonoverlapping(self.ptr.as_ptr(), bytes.as_mut_ptr(), bytes.len()) }
    }
}

impl Drop for DeviceAlloc {
    fn drop(&mut self) {
        unsafe { std::alloc::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

pub struct DeviceManager {
    device: Device,
    n_devices: usize,
    mirrors: FnvHashMap<usize, DeviceAlloc>,
}

impl std::fmt::Debug for DeviceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceManager")
            .field("device", &self.device)
            .field("n_devices", &self.n_devices)
            .field("mirrors", &self.mirrors.len())
            .finish()
    }
}

fn host_addr<T>(host: &[T]) -> usize {
    host.as_ptr() as usize
}

impl DeviceManager {
    /// Host-only manager: no accelerator, no mirrors.
    pub fn host() -> Self {
        Self {
            device: Device::Host,
            n_devices: 0,
            mirrors: FnvHashMap::default(),
        }
    }

    /// Selects the device for this process among the `n_devices` a backend
    /// detected: the host if there are none or acceleration is disabled,
    /// otherwise `node_rank % n_devices`.
    pub fn new(n_devices: usize, env: &Environment) -> Self {
        let device: Device = if env.accel_disabled() || n_devices == 0 {
            Device::Host
        } else {
            Device::Accel(env.node_rank() % n_devices)
        };
        debug!(
            %device,
            n_devices,
            node_rank = env.node_rank(),
            node_procs = env.node_procs(),
            accel_disabled = env.accel_disabled(),
            "selected device"
        );
        Self {
            device,
            n_devices,
            mirrors: FnvHashMap::default(),
        }
    }

    pub fn get_device(&self) -> Device {
        self.device
    }

    /// `true` if no accelerator should be used by this process.
    pub fn device_is_host(&self) -> bool {
        self.device.is_host()
    }

    /// Number of devices the backend detected, regardless of selection.
    pub fn n_devices(&self) -> usize {
        self.n_devices
    }

    /// Number of host buffers currently mirrored.
    pub fn n_mirrors(&self) -> usize {
        self.mirrors.values().filter(|alloc| alloc.is_live()).count()
    }

    pub fn is_staged<T>(&self, host: &[T]) -> bool {
        self.mirrors.get(&host_addr(host)).is_some_and(DeviceAlloc::is_live)
    }

    /// Allocates a device mirror of `host` and copies its content to it.
    /// Staging an already mirrored buffer replaces the mirror, and the guard
    /// of the replaced one no longer controls anything.
    pub fn stage<T: Element>(&mut self, name: &'static str, host: &[T]) -> Result<Staged> {
        if self.device_is_host() {
            return Err(Error::NoAccelerator);
        }
        self.reclaim();
        let bytes: &[u8] = bytemuck::cast_slice(host);
        let alloc: DeviceAlloc = DeviceAlloc::new(bytes.len());
        alloc.write_from(bytes);
        trace!(name, addr = host_addr(host), bytes = bytes.len(), device = %self.device, "stage");
        let guard: Staged = Staged {
            name,
            live: alloc.live.clone(),
        };
        self.mirrors.insert(host_addr(host), alloc);
        Ok(guard)
    }

    /// Frees the memory of mirrors whose guard was dropped.
    fn reclaim(&mut self) {
        let before: usize = self.mirrors.len();
        self.mirrors.retain(|_, alloc| alloc.is_live());
        if self.mirrors.len() != before {
            trace!(freed = before - self.mirrors.len(), "reclaimed retired mirrors");
        }
    }

    /// Copies `host` into its existing mirror.
    pub fn update_device<T: Element>(&mut self, name: &'static str, host: &[T]) -> Result<()> {
        self.reclaim();
        let bytes: &[u8] = bytemuck::cast_slice(host);
        let alloc: &DeviceAlloc = self.mirror(name, host_addr(host), bytes.len())?;
        alloc.write_from(bytes);
        trace!(name, bytes = bytes.len(), "update_device");
        Ok(())
    }

    /// Copies the mirror of `host` back into `host`.
    pub fn update_host<T: Element>(&self, name: &'static str, host: &mut [T]) -> Result<()> {
        let addr: usize = host_addr(host);
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(host);
        let alloc: &DeviceAlloc = self.mirror(name, addr, bytes.len())?;
        alloc.read_into(bytes);
        trace!(name, bytes = bytes.len(), "update_host");
        Ok(())
    }

    /// Frees the mirror of `host` before its guard is dropped. Returns
    /// `false` if there was no live mirror.
    pub fn release<T>(&mut self, host: &[T]) -> bool {
        let released: bool = self
            .mirrors
            .remove(&host_addr(host))
            .is_some_and(|alloc| alloc.is_live());
        self.reclaim();
        released
    }

    /// Device-resident address of the mirror of `host`.
    pub fn device_ptr<T: Element>(&self, name: &'static str, host: &[T]) -> Result<RawSlice<T>> {
        let alloc: &DeviceAlloc = self.mirror(name, host_addr(host), std::mem::size_of_val(host))?;
        Ok(unsafe { RawSlice::from_raw_parts(alloc.ptr.as_ptr() as *const T, host.len()) })
    }

    /// Writable device-resident address of the mirror of `host`.
    pub fn device_ptr_mut<T: Element>(&self, name: &'static str, host: &[T]) -> Result<RawSliceMut<T>> {
        let alloc: &DeviceAlloc = self.mirror(name, host_addr(host), std::mem::size_of_val(host))?;
        Ok(unsafe { RawSliceMut::from_raw_parts(alloc.ptr.as_ptr() as *mut T, host.len()) })
    }

    fn mirror(&self, name: &'static str, addr: usize, host_bytes: usize) -> Result<&DeviceAlloc> {
        let alloc: &DeviceAlloc = self
            .mirrors
            .get(&addr)
            .filter(|alloc| alloc.is_live())
            .ok_or(Error::MissingDeviceMirror { name, addr })?;
        if alloc.size != host_bytes {
            return Err(Error::MirrorSizeMismatch {
                name,
                mirror: alloc.size,
                host: host_bytes,
            });
        }
        Ok(alloc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvironmentBuilder;

    fn env(disabled: bool, rank: usize) -> Environment {
        EnvironmentBuilder::new()
            .accel_disabled(disabled)
            .node(rank, 4)
            .build_with(|_| None)
            .unwrap()
    }

    #[test]
    fn host_when_no_devices() {
        let mgr: DeviceManager = DeviceManager::new(0, &env(false, 0));
        assert!(mgr.device_is_host());
        assert_eq!(mgr.get_device(), Device::Host);
        assert_eq!(mgr.get_device().as_raw(), HOST_DEVICE_ID);
    }

    #[test]
    fn host_when_disabled() {
        let mgr: DeviceManager = DeviceManager::new(2, &env(true, 0));
        assert!(mgr.device_is_host());
    }

    #[test]
    fn rank_assignment() {
        let mgr: DeviceManager = DeviceManager::new(2, &env(false, 3));
        assert_eq!(mgr.get_device(), Device::Accel(1));
        assert!(!mgr.device_is_host());
    }

    #[test]
    fn stage_requires_accel() {
        let mut mgr: DeviceManager = DeviceManager::host();
        let data: Vec<f64> = vec![1.0; 4];
        assert!(matches!(mgr.stage("data", &data), Err(Error::NoAccelerator)));
    }

    #[test]
    fn mirror_roundtrip() {
        let mut mgr: DeviceManager = DeviceManager::new(1, &env(false, 0));
        let mut data: Vec<f64> = vec![1.0, 2.0, 3.0, 4.0];
        let _guard: Staged = mgr.stage("data", &data).unwrap();
        assert!(mgr.is_staged(&data));

        let dev: RawSliceMut<f64> = mgr.device_ptr_mut("data", &data).unwrap();
        assert_ne!(dev.as_mut_ptr() as usize, data.as_ptr() as usize);
        assert!(crate::is_aligned(dev.as_mut_ptr()));
        unsafe { dev.write(2, 30.0) };

        // Host copy untouched until synced back.
        assert_eq!(data[2], 3.0);
        mgr.update_host("data", &mut data).unwrap();
        assert_eq!(data, vec![1.0, 2.0, 30.0, 4.0]);

        data[0] = 10.0;
        mgr.update_device("data", &data).unwrap();
        let ro: RawSlice<f64> = mgr.device_ptr("data", &data).unwrap();
        assert_eq!(unsafe { ro.get(0) }, 10.0);

        assert!(mgr.release(&data));
        assert!(!mgr.is_staged(&data));
    }

    #[test]
    fn missing_mirror_fails_fast() {
        let mgr: DeviceManager = DeviceManager::new(1, &env(false, 0));
        let data: Vec<u8> = vec![0; 8];
        assert!(matches!(
            mgr.device_ptr("flags", &data),
            Err(Error::MissingDeviceMirror { name: "flags", .. })
        ));
    }

    #[test]
    fn mirror_size_checked() {
        let mut mgr: DeviceManager = DeviceManager::new(1, &env(false, 0));
        let data: Vec<f64> = vec![0.0; 8];
        let _guard: Staged = mgr.stage("data", &data).unwrap();
        assert!(matches!(
            mgr.device_ptr("data", &data[..4]),
            Err(Error::MirrorSizeMismatch {
                mirror: 64,
                host: 32,
                ..
            })
        ));
    }

    #[test]
    fn dropped_guard_retires_mirror() {
        let mut mgr: DeviceManager = DeviceManager::new(1, &env(false, 0));
        let a: Vec<f64> = vec![1.0; 64];
        let guard: Staged = mgr.stage("a", &a).unwrap();
        assert_eq!(guard.name(), "a");
        assert!(mgr.is_staged(&a));

        drop(guard);
        assert!(!mgr.is_staged(&a));
        assert_eq!(mgr.n_mirrors(), 0);
        drop(a);

        // A fresh buffer, possibly at the address `a` had, was never staged.
        let b: Vec<f64> = vec![2.0; 64];
        assert!(!mgr.is_staged(&b));
        assert!(matches!(
            mgr.device_ptr("b", &b),
            Err(Error::MissingDeviceMirror { name: "b", .. })
        ));

        // Retired storage is freed by the next registration.
        let _guard: Staged = mgr.stage("b", &b).unwrap();
        assert_eq!(mgr.mirrors.len(), 1);
        assert_eq!(unsafe { mgr.device_ptr("b", &b).unwrap().get(0) }, 2.0);
    }

    #[test]
    fn restage_replaces_mirror() {
        let mut mgr: DeviceManager = DeviceManager::new(1, &env(false, 0));
        let mut data: Vec<f64> = vec![1.0; 4];
        let old: Staged = mgr.stage("data", &data).unwrap();
        data[0] = 5.0;
        let _new: Staged = mgr.stage("data", &data).unwrap();

        drop(old);
        assert!(mgr.is_staged(&data));
        assert_eq!(unsafe { mgr.device_ptr("data", &data).unwrap().get(0) }, 5.0);
    }
}
