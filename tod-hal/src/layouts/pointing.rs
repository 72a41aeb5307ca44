use fnv::FnvHashMap;

use crate::{
    error::{Error, Result},
    layouts::{Device, Interval, RawSlice, RawSliceMut},
};

/// Where a pointing launch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecTarget {
    Host,
    Device(usize),
}

impl ExecTarget {
    pub fn is_host(&self) -> bool {
        matches!(self, ExecTarget::Host)
    }
}

impl From<Device> for ExecTarget {
    fn from(device: Device) -> Self {
        match device {
            Device::Host => ExecTarget::Host,
            Device::Accel(id) => ExecTarget::Device(id),
        }
    }
}

/// Validated, address-resolved arguments of one pointing launch.
///
/// `boresight`, `quats`, `intervals` and `flags` hold host addresses for a
/// host launch and device mirror addresses for a device launch; `q_index` and
/// `focalplane` are always host-resident. Shapes were checked at the
/// boundary:
///
/// - `q_index`: `n_det` rows, unique, each `< n_rows`;
/// - `focalplane`: `n_det * 4`;
/// - `boresight`: `n_samp * 4`;
/// - `quats`: `n_rows * n_samp * 4`;
/// - `intervals`: `n_view`, sorted, disjoint, inside `[0, n_samp)`;
/// - `flags`: `n_samp`.
#[derive(Debug, Clone, Copy)]
pub struct PointingArgs<'a> {
    pub q_index: &'a [i32],
    pub focalplane: &'a [f64],
    pub boresight: RawSlice<f64>,
    pub quats: RawSliceMut<f64>,
    pub intervals: RawSlice<Interval>,
    pub flags: RawSlice<u8>,
    pub n_samp: usize,
    pub mask: u8,
}

impl PointingArgs<'_> {
    #[inline(always)]
    pub fn n_det(&self) -> usize {
        self.q_index.len()
    }

    #[inline(always)]
    pub fn n_view(&self) -> usize {
        self.intervals.len()
    }
}

/// Checks that every detector addresses a distinct output row in `[0, n_rows)`.
pub fn validate_quat_index(q_index: &[i32], n_rows: usize) -> Result<()> {
    let mut seen: FnvHashMap<i32, usize> = FnvHashMap::with_capacity_and_hasher(q_index.len(), Default::default());
    for (det, &value) in q_index.iter().enumerate() {
        if value < 0 || value as usize >= n_rows {
            return Err(Error::QuatIndexOutOfRange { det, value, n_rows });
        }
        if let Some(other) = seen.insert(value, det) {
            return Err(Error::DuplicateQuatIndex { det, other, value });
        }
    }
    Ok(())
}
