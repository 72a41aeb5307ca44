use std::marker::PhantomData;

/// Resolved read-only address range, either host memory or a device mirror.
///
/// This is the descriptor handed to kernel launch bodies: it carries no
/// lifetime, so the same loop body runs against host or device addresses.
/// Whoever builds it guarantees the range stays valid and unaliased by
/// writers for the duration of the launch.
#[derive(Debug)]
pub struct RawSlice<T> {
    ptr: *const T,
    len: usize,
    _marker: PhantomData<T>,
}

/// Resolved writable address range, see [`RawSlice`].
///
/// Concurrent writers must target disjoint elements.
#[derive(Debug)]
pub struct RawSliceMut<T> {
    ptr: *mut T,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T> Clone for RawSlice<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RawSlice<T> {}

impl<T> Clone for RawSliceMut<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RawSliceMut<T> {}

unsafe impl<T: Sync> Send for RawSlice<T> {}
unsafe impl<T: Sync> Sync for RawSlice<T> {}
unsafe impl<T: Send> Send for RawSliceMut<T> {}
unsafe impl<T: Send> Sync for RawSliceMut<T> {}

impl<T: Copy> RawSlice<T> {
    pub fn from_slice(data: &[T]) -> Self {
        Self {
            ptr: data.as_ptr(),
            len: data.len(),
            _marker: PhantomData,
        }
    }

    /// # Safety
    /// `ptr` must be valid for reads of `len` elements for as long as the
    /// descriptor is used.
    pub unsafe fn from_raw_parts(ptr: *const T, len: usize) -> Self {
        Self {
            ptr,
            len,
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    /// # Safety
    /// `i < len` and the range must still be valid.
    #[inline(always)]
    pub unsafe fn get(&self, i: usize) -> T {
        debug_assert!(i < self.len, "index {i} out of range for length {}", self.len);
        unsafe { *self.ptr.add(i) }
    }

    /// Borrows the range as a host slice.
    ///
    /// # Safety
    /// The range must be host-addressable, valid, and not written while the
    /// returned slice is alive.
    pub unsafe fn as_slice(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }
}

impl<T: Copy> RawSliceMut<T> {
    pub fn from_slice(data: &mut [T]) -> Self {
        Self {
            ptr: data.as_mut_ptr(),
            len: data.len(),
            _marker: PhantomData,
        }
    }

    /// # Safety
    /// `ptr` must be valid for reads and writes of `len` elements for as long
    /// as the descriptor is used.
    pub unsafe fn from_raw_parts(ptr: *mut T, len: usize) -> Self {
        Self {
            ptr,
            len,
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn as_mut_ptr(&self) -> *mut T {
        self.ptr
    }

    /// # Safety
    /// `i < len`, the range must still be valid and no other thread may
    /// access element `i` concurrently.
    #[inline(always)]
    pub unsafe fn write(&self, i: usize, value: T) {
        debug_assert!(i < self.len, "index {i} out of range for length {}", self.len);
        unsafe { self.ptr.add(i).write(value) }
    }

    /// # Safety
    /// Same as [`RawSliceMut::write`].
    #[inline(always)]
    pub unsafe fn get(&self, i: usize) -> T {
        debug_assert!(i < self.len, "index {i} out of range for length {}", self.len);
        unsafe { *self.ptr.add(i) }
    }
}
