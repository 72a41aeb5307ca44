use tracing::{debug, trace};

use crate::{
    api::PointingDetector,
    error::Result,
    layouts::{
        ArrayView, ArrayViewMut, Backend, Buffer, BufferMut, Context, DeviceManager, ExecTarget, Interval, PointingArgs, RawSlice,
        RawSliceMut, validate_intervals, validate_quat_index,
    },
    oep::PointingDetectorImpl,
};

impl<B> PointingDetector<B> for Context<B>
where
    B: Backend + PointingDetectorImpl<B>,
{
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
    ) -> Result<()> {
        // Each extraction fixes the dimensions the next ones are checked against.
        let q_index: ArrayView<'_, i32> = quat_index.extract("quat_index", &[-1])?;
        let n_det: usize = q_index.dim(0);

        let fp: ArrayView<'_, f64> = focalplane.extract("focalplane", &[n_det as i64, 4])?;

        let bore: ArrayView<'_, f64> = boresight.extract("boresight", &[-1, 4])?;
        let n_samp: usize = bore.dim(0);

        let mut out: ArrayViewMut<'_, f64> = quats.extract("quats", &[-1, n_samp as i64, 4])?;
        let n_rows: usize = out.dim(0);

        let ivals: ArrayView<'_, Interval> = intervals.extract("intervals", &[-1])?;
        let n_view: usize = ivals.dim(0);

        let flags: ArrayView<'_, u8> = shared_flags.extract("shared_flags", &[n_samp as i64])?;

        validate_intervals(ivals.data(), n_samp)?;
        validate_quat_index(q_index.data(), n_rows)?;

        let offload: bool = !self.device_is_host() && use_accel;

        let (args, target): (PointingArgs<'_>, ExecTarget) = if offload {
            let devices: &DeviceManager = self.devices();
            let dev_ivals: RawSlice<Interval> = devices.device_ptr("intervals", ivals.data())?;
            // The launch iterates the mirror, which may differ from the host copy.
            // SAFETY: mirrors are host-addressable and registration needs
            // `&mut DeviceManager`, so nothing writes them during this borrow.
            validate_intervals(unsafe { dev_ivals.as_slice() }, n_samp)?;
            let args: PointingArgs<'_> = PointingArgs {
                q_index: q_index.data(),
                focalplane: fp.data(),
                boresight: devices.device_ptr("boresight", bore.data())?,
                quats: devices.device_ptr_mut("quats", out.data())?,
                intervals: dev_ivals,
                flags: devices.device_ptr("shared_flags", flags.data())?,
                n_samp,
                mask: shared_flag_mask,
            };
            (args, ExecTarget::from(self.get_device()))
        } else {
            let args: PointingArgs<'_> = PointingArgs {
                q_index: q_index.data(),
                focalplane: fp.data(),
                boresight: RawSlice::from_slice(bore.data()),
                quats: RawSliceMut::from_slice(out.data_mut()),
                intervals: RawSlice::from_slice(ivals.data()),
                flags: RawSlice::from_slice(flags.data()),
                n_samp,
                mask: shared_flag_mask,
            };
            (args, ExecTarget::Host)
        };

        debug!(
            backend = B::name(),
            n_det,
            n_samp,
            n_rows,
            n_view,
            n_span = ivals.data().iter().map(Interval::n_samples).sum::<usize>(),
            mask = shared_flag_mask,
            ?target,
            "pointing_detector"
        );

        if n_det == 0 || n_view == 0 {
            trace!("nothing to compute");
            return Ok(());
        }

        B::pointing_detector_impl(self, &args, target);
        Ok(())
    }
}
