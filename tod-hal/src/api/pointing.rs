use crate::{
    error::Result,
    layouts::{Backend, Buffer, BufferMut},
};

/// Detector pointing quaternions from boresight and focal-plane offsets.
pub trait PointingDetector<B: Backend> {
    /// For every detector `d` and every sample `s` inside one of `intervals`,
    /// writes `boresight[s] * focalplane[d]` into row `quat_index[d]` of
    /// `quats`. Samples whose flag byte shares a bit with `shared_flag_mask`
    /// use the identity in place of the boresight.
    ///
    /// Expected buffers (`-1` = any):
    /// - `focalplane`: `f64 {n_det, 4}`;
    /// - `boresight`: `f64 {n_samp, 4}`;
    /// - `quat_index`: `i32 {n_det}`;
    /// - `quats`: `f64 {n_rows, n_samp, 4}`;
    /// - `intervals`: [`Interval`](crate::layouts::Interval) `{n_view}`;
    /// - `shared_flags`: `u8 {n_samp}`.
    ///
    /// With `use_accel` set and an accelerator selected, the boresight, quats,
    /// intervals and flags buffers must have been staged with
    /// [`DeviceManager::stage`](crate::layouts::DeviceManager::stage) and the
    /// result stays in the mirror of `quats` until
    /// [`DeviceManager::update_host`](crate::layouts::DeviceManager::update_host).
    ///
    /// No output element is written when an error is returned.
    #[allow(clippy::too_many_arguments)]
    fn pointing_detector(
        &self,
        focalplane: &Buffer<'_>,
        boresight: &Buffer<'_>,
        quat_index: &Buffer<'_>,
        quats: &mut BufferMut<'_>,
        intervals: &Buffer<'_>,
        shared_flags: &Buffer<'_>,
        shared_flag_mask: u8,
        use_accel: bool,
    ) -> Result<()>;
}
