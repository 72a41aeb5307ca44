use crate::{
    QUAT_IDENTITY,
    layouts::{Interval, PointingArgs},
    reference::qarray::qa_mult,
};

/// Detector quaternion of one sample.
///
/// Uses the boresight quaternion of sample `isamp` unless any bit of `mask`
/// is set in its flags, in which case the identity is used so that flagged
/// samples still get a valid rotation. The result, boresight × focal-plane
/// offset of detector `idet`, is written to row `q_index[idet]`.
///
/// This is the only place the pointing arithmetic lives: host and device
/// launch strategies all call it.
///
/// # Safety
/// `args` must satisfy the invariants documented on [`PointingArgs`], its
/// addresses must be live, `idet < n_det`, `isamp < n_samp`, and no other
/// thread may write the same `(q_index[idet], isamp)` output concurrently.
#[inline(always)]
pub unsafe fn pointing_detector_inner(args: &PointingArgs<'_>, idet: usize, isamp: usize) {
    let qidx: usize = args.q_index[idet] as usize;

    let mut bore: [f64; 4] = QUAT_IDENTITY;
    if unsafe { args.flags.get(isamp) } & args.mask == 0 {
        let off: usize = 4 * isamp;
        for (k, b) in bore.iter_mut().enumerate() {
            *b = unsafe { args.boresight.get(off + k) };
        }
    }

    let fp: &[f64; 4] = as_quat(&args.focalplane[4 * idet..4 * idet + 4]);

    let mut res: [f64; 4] = [0.0; 4];
    qa_mult(&bore, fp, &mut res);

    let out: usize = qidx * 4 * args.n_samp + 4 * isamp;
    for (k, r) in res.iter().enumerate() {
        unsafe { args.quats.write(out + k, *r) };
    }
}

#[inline(always)]
fn as_quat(x: &[f64]) -> &[f64; 4] {
    match x.first_chunk::<4>() {
        Some(q) => q,
        None => unreachable!("focal plane rows hold 4 values"),
    }
}

/// Inclusive sample range of view `iview`.
///
/// # Safety
/// `iview < n_view` and the interval addresses must be live.
#[inline(always)]
pub unsafe fn interval_samples(args: &PointingArgs<'_>, iview: usize) -> std::ops::RangeInclusive<usize> {
    let ival: Interval = unsafe { args.intervals.get(iview) };
    ival.first as usize..=ival.last as usize
}

/// Serial detector → interval → sample loop.
///
/// # Safety
/// See [`pointing_detector_inner`].
pub unsafe fn pointing_detector_ref(args: &PointingArgs<'_>) {
    for idet in 0..args.n_det() {
        for iview in 0..args.n_view() {
            for isamp in unsafe { interval_samples(args, iview) } {
                unsafe { pointing_detector_inner(args, idet, isamp) };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layouts::{RawSlice, RawSliceMut};

    #[test]
    fn flagged_sample_uses_identity() {
        let q_index: Vec<i32> = vec![1];
        let focalplane: Vec<f64> = vec![0.1, 0.2, 0.3, 0.9];
        let boresight: Vec<f64> = vec![0.5, 0.5, 0.5, 0.5, 0.0, 1.0, 0.0, 0.0];
        let flags: Vec<u8> = vec![0x02, 0x01];
        let intervals: Vec<Interval> = vec![Interval::from_samples(0, 1)];
        let mut quats: Vec<f64> = vec![-7.0; 2 * 2 * 4];

        let args: PointingArgs = PointingArgs {
            q_index: &q_index,
            focalplane: &focalplane,
            boresight: RawSlice::from_slice(&boresight),
            quats: RawSliceMut::from_slice(&mut quats),
            intervals: RawSlice::from_slice(&intervals),
            flags: RawSlice::from_slice(&flags),
            n_samp: 2,
            mask: 0x01,
        };
        unsafe { pointing_detector_ref(&args) };

        // Row 0 is not addressed by any detector.
        assert!(quats[..8].iter().all(|&x| x == -7.0));

        // Sample 0: flag bit outside the mask, boresight used.
        let mut expected: [f64; 4] = [0.0; 4];
        qa_mult(&[0.5, 0.5, 0.5, 0.5], &[0.1, 0.2, 0.3, 0.9], &mut expected);
        assert_eq!(&quats[8..12], &expected);

        // Sample 1: flagged, output is the focal plane offset.
        assert_eq!(&quats[12..16], &focalplane[..]);
    }
}
