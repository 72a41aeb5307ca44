use std::fmt::Display;

use bytemuck::Pod;

use crate::{
    error::{Error, Result},
    layouts::Interval,
};

/// Element type tag carried by a type-erased [`Buffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    U8,
    I32,
    I64,
    F64,
    Interval,
}

impl Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s: &str = match self {
            DType::U8 => "u8",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::F64 => "f64",
            DType::Interval => "interval",
        };
        write!(f, "{s}")
    }
}

/// Plain-old-data element that can cross the kernel boundary.
pub trait Element: Pod {
    const DTYPE: DType;
}

impl Element for u8 {
    const DTYPE: DType = DType::U8;
}

impl Element for i32 {
    const DTYPE: DType = DType::I32;
}

impl Element for i64 {
    const DTYPE: DType = DType::I64;
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;
}

impl Element for Interval {
    const DTYPE: DType = DType::Interval;
}

/// Read-only, type-erased caller buffer: bytes, element type and shape.
///
/// The caller keeps ownership of the data; the handle borrows it for the
/// duration of a kernel call. Use [`Buffer::extract`] to obtain a typed view.
#[derive(Debug)]
pub struct Buffer<'a> {
    bytes: &'a [u8],
    dtype: DType,
    shape: Vec<usize>,
}

/// Mutable counterpart of [`Buffer`].
#[derive(Debug)]
pub struct BufferMut<'a> {
    bytes: &'a mut [u8],
    dtype: DType,
    shape: Vec<usize>,
}

/// Typed, shape-checked view returned by [`Buffer::extract`].
#[derive(Debug, Clone)]
pub struct ArrayView<'a, T> {
    data: &'a [T],
    shape: Vec<usize>,
}

/// Typed, shape-checked mutable view returned by [`BufferMut::extract`].
#[derive(Debug)]
pub struct ArrayViewMut<'a, T> {
    data: &'a mut [T],
    shape: Vec<usize>,
}

fn check_shape_size(shape: &[usize], len: usize) -> Result<()> {
    let expected: usize = shape.iter().product();
    if expected != len {
        return Err(Error::ShapeSize {
            shape: shape.to_vec(),
            expected,
            actual: len,
        });
    }
    Ok(())
}

/// Checks `actual` against `expected`, where `-1` is a wildcard.
pub fn check_shape(name: &'static str, actual: &[usize], expected: &[i64]) -> Result<()> {
    let matches: bool = actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(&a, &e)| e < 0 || a as i64 == e);
    if !matches {
        return Err(Error::ShapeMismatch {
            name,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        });
    }
    Ok(())
}

fn check_dtype<T: Element>(name: &'static str, actual: DType) -> Result<()> {
    if actual != T::DTYPE {
        return Err(Error::DTypeMismatch {
            name,
            expected: T::DTYPE,
            actual,
        });
    }
    Ok(())
}

impl<'a> Buffer<'a> {
    /// Wraps `data` with the given row-major `shape`.
    pub fn from_slice<T: Element>(data: &'a [T], shape: &[usize]) -> Result<Self> {
        check_shape_size(shape, data.len())?;
        Ok(Self {
            bytes: bytemuck::cast_slice(data),
            dtype: T::DTYPE,
            shape: shape.to_vec(),
        })
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Validates element type, rank and every non-wildcard dimension of
    /// `expected`, then returns a typed view whose shape holds the actual sizes.
    pub fn extract<T: Element>(&self, name: &'static str, expected: &[i64]) -> Result<ArrayView<'a, T>> {
        check_dtype::<T>(name, self.dtype)?;
        check_shape(name, &self.shape, expected)?;
        Ok(ArrayView {
            data: bytemuck::cast_slice(self.bytes),
            shape: self.shape.clone(),
        })
    }
}

impl<'a> BufferMut<'a> {
    /// Wraps `data` with the given row-major `shape`.
    pub fn from_slice<T: Element>(data: &'a mut [T], shape: &[usize]) -> Result<Self> {
        check_shape_size(shape, data.len())?;
        Ok(Self {
            bytes: bytemuck::cast_slice_mut(data),
            dtype: T::DTYPE,
            shape: shape.to_vec(),
        })
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// See [`Buffer::extract`].
    pub fn extract<T: Element>(&mut self, name: &'static str, expected: &[i64]) -> Result<ArrayViewMut<'_, T>> {
        check_dtype::<T>(name, self.dtype)?;
        check_shape(name, &self.shape, expected)?;
        Ok(ArrayViewMut {
            data: bytemuck::cast_slice_mut(self.bytes),
            shape: self.shape.clone(),
        })
    }
}

impl<'a, T> ArrayView<'a, T> {
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dim(&self, i: usize) -> usize {
        self.shape[i]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T> ArrayViewMut<'_, T> {
    pub fn data(&self) -> &[T] {
        &*self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut *self.data
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dim(&self, i: usize) -> usize {
        self.shape[i]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
