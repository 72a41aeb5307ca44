use crate::{
    QUAT_IDENTITY,
    api::PointingDetector,
    error::{Error, Result},
    layouts::{Backend, Buffer, BufferMut, Context, DType, DeviceManager, Interval, Staged},
    reference::qarray::qa_mult,
    source::Source,
};

/// Value the output is filled with before a call, to detect stray writes.
pub const SENTINEL: f64 = -1234.5;

/// Caller-side buffers of one pointing call.
pub struct PointingFixture {
    pub focalplane: Vec<f64>,
    pub boresight: Vec<f64>,
    pub q_index: Vec<i32>,
    pub quats: Vec<f64>,
    pub intervals: Vec<Interval>,
    pub flags: Vec<u8>,
    pub n_samp: usize,
    pub n_rows: usize,
}

impl PointingFixture {
    /// Random unit boresight and offsets, random flag bytes, detectors
    /// mapped to a random subset of the `n_rows` output rows.
    pub fn random(source: &mut Source, n_det: usize, n_rows: usize, n_samp: usize, intervals: &[(i64, i64)]) -> Self {
        assert!(n_det <= n_rows);

        let mut focalplane: Vec<f64> = vec![0.0; n_det * 4];
        source.fill_unit_quats(&mut focalplane);

        let mut boresight: Vec<f64> = vec![0.0; n_samp * 4];
        source.fill_unit_quats(&mut boresight);

        let flags: Vec<u8> = (0..n_samp).map(|_| source.next_u8()).collect();

        // Partial Fisher-Yates: first n_det entries of a random permutation.
        let mut rows: Vec<i32> = (0..n_rows as i32).collect();
        for i in 0..n_det {
            let j: usize = i + source.next_usize(n_rows - i);
            rows.swap(i, j);
        }
        rows.truncate(n_det);

        let intervals: Vec<Interval> = intervals
            .iter()
            .enumerate()
            .map(|(i, &(first, last))| Interval::new(i as f64, i as f64 + 0.5, first, last))
            .collect();

        Self {
            focalplane,
            boresight,
            q_index: rows,
            quats: vec![SENTINEL; n_rows * n_samp * 4],
            intervals,
            flags,
            n_samp,
            n_rows,
        }
    }

    pub fn n_det(&self) -> usize {
        self.q_index.len()
    }

    pub fn run<B: Backend>(&mut self, ctx: &Context<B>, mask: u8, use_accel: bool) -> Result<()>
    where
        Context<B>: PointingDetector<B>,
    {
        let n_det: usize = self.n_det();
        let focalplane: Buffer = Buffer::from_slice(&self.focalplane, &[n_det, 4])?;
        let boresight: Buffer = Buffer::from_slice(&self.boresight, &[self.n_samp, 4])?;
        let q_index: Buffer = Buffer::from_slice(&self.q_index, &[n_det])?;
        let mut quats: BufferMut = BufferMut::from_slice(&mut self.quats, &[self.n_rows, self.n_samp, 4])?;
        let intervals: Buffer = Buffer::from_slice(&self.intervals, &[self.intervals.len()])?;
        let flags: Buffer = Buffer::from_slice(&self.flags, &[self.n_samp])?;
        ctx.pointing_detector(
            &focalplane,
            &boresight,
            &q_index,
            &mut quats,
            &intervals,
            &flags,
            mask,
            use_accel,
        )
    }

    /// Output the call must produce, computed directly from the definition.
    pub fn expected(&self, mask: u8) -> Vec<f64> {
        let mut out: Vec<f64> = vec![SENTINEL; self.quats.len()];
        for (d, &row) in self.q_index.iter().enumerate() {
            let fp: [f64; 4] = quat_at(&self.focalplane, d);
            for s in (0..self.n_samp).filter(|&s| self.intervals.iter().any(|ival| ival.contains(s))) {
                let bore: [f64; 4] = if self.flags[s] & mask == 0 {
                    quat_at(&self.boresight, s)
                } else {
                    QUAT_IDENTITY
                };
                let mut r: [f64; 4] = [0.0; 4];
                qa_mult(&bore, &fp, &mut r);
                let off: usize = (row as usize * self.n_samp + s) * 4;
                out[off..off + 4].copy_from_slice(&r);
            }
        }
        out
    }
}

fn quat_at(data: &[f64], i: usize) -> [f64; 4] {
    [data[4 * i], data[4 * i + 1], data[4 * i + 2], data[4 * i + 3]]
}

fn assert_bit_identical(a: &[f64], b: &[f64]) {
    assert_eq!(a.len(), b.len());
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        assert_eq!(x.to_bits(), y.to_bits(), "element {i}: {x} != {y}");
    }
}

/// Flagged samples use the identity, so their output is the focal-plane
/// offset itself; unflagged samples get `boresight * offset`.
pub fn test_pointing_flag_mask<B: Backend>(ctx: &Context<B>)
where
    Context<B>: PointingDetector<B>,
{
    let n_samp: usize = 4;
    let mut fx: PointingFixture = PointingFixture {
        focalplane: vec![0.0, 0.0, 0.0, 1.0, 0.5, 0.5, 0.5, 0.5],
        boresight: vec![
            0.0, 0.0, 1.0, 0.0, // k
            1.0, 0.0, 0.0, 0.0, // i
            0.0, 1.0, 0.0, 0.0, // j
            0.0, 0.0, 0.0, 1.0, // 1
        ],
        q_index: vec![0, 1],
        quats: vec![SENTINEL; 2 * n_samp * 4],
        intervals: vec![Interval::from_samples(0, 3)],
        flags: vec![0x00, 0x04, 0x01, 0x05],
        n_samp,
        n_rows: 2,
    };

    fx.run(ctx, 0x01, false).unwrap();

    // Detector 0 has the identity offset: output is the effective boresight.
    assert_eq!(&fx.quats[0..4], &[0.0, 0.0, 1.0, 0.0]);
    assert_eq!(&fx.quats[4..8], &[1.0, 0.0, 0.0, 0.0]);
    assert_eq!(&fx.quats[8..12], &QUAT_IDENTITY);
    assert_eq!(&fx.quats[12..16], &QUAT_IDENTITY);

    // Detector 1, flagged samples 2 and 3: the offset itself.
    assert_eq!(&fx.quats[16 + 8..16 + 12], &fx.focalplane[4..8]);
    assert_eq!(&fx.quats[16 + 12..16 + 16], &fx.focalplane[4..8]);

    assert_bit_identical(&fx.quats, &fx.expected(0x01));

    // With an empty mask no sample is flagged.
    fx.quats.fill(SENTINEL);
    fx.run(ctx, 0x00, false).unwrap();
    assert_bit_identical(&fx.quats, &fx.expected(0x00));
}

/// Samples outside every interval and rows not addressed by any detector are
/// never written.
pub fn test_pointing_intervals<B: Backend>(ctx: &Context<B>)
where
    Context<B>: PointingDetector<B>,
{
    let mut source: Source = Source::new([11u8; 32]);
    let n_samp: usize = 97;
    let mut fx: PointingFixture = PointingFixture::random(&mut source, 5, 8, n_samp, &[(0, 9), (20, 20), (31, 60), (90, 96)]);

    for mask in [0x00u8, 0x01, 0x81, 0xff] {
        fx.quats.fill(SENTINEL);
        fx.run(ctx, mask, false).unwrap();
        assert_bit_identical(&fx.quats, &fx.expected(mask));
    }

    let written: usize = fx.quats.iter().filter(|&&x| x != SENTINEL).count();
    assert_eq!(written, 5 * (10 + 1 + 30 + 7) * 4);
}

/// `use_accel` has no effect when the context has no accelerator selected.
pub fn test_pointing_use_accel_on_host<B: Backend>(ctx: &Context<B>)
where
    Context<B>: PointingDetector<B>,
{
    if !ctx.device_is_host() {
        return;
    }
    let mut source: Source = Source::new([12u8; 32]);
    let mut fx: PointingFixture = PointingFixture::random(&mut source, 3, 3, 40, &[(2, 30)]);
    fx.run(ctx, 0x02, true).unwrap();
    assert_bit_identical(&fx.quats, &fx.expected(0x02));
}

/// Empty detector or interval lists are valid and write nothing.
pub fn test_pointing_empty<B: Backend>(ctx: &Context<B>)
where
    Context<B>: PointingDetector<B>,
{
    let mut source: Source = Source::new([13u8; 32]);

    let mut fx: PointingFixture = PointingFixture::random(&mut source, 0, 2, 16, &[(0, 15)]);
    fx.run(ctx, 0x01, false).unwrap();
    assert!(fx.quats.iter().all(|&x| x == SENTINEL));

    let mut fx: PointingFixture = PointingFixture::random(&mut source, 2, 2, 16, &[]);
    fx.run(ctx, 0x01, false).unwrap();
    assert!(fx.quats.iter().all(|&x| x == SENTINEL));
}

/// Every boundary violation is reported before any output is written.
pub fn test_pointing_boundary_errors<B: Backend>(ctx: &Context<B>)
where
    Context<B>: PointingDetector<B>,
{
    let mut source: Source = Source::new([14u8; 32]);
    let n_samp: usize = 32;
    let fx: PointingFixture = PointingFixture::random(&mut source, 3, 4, n_samp, &[(0, 31)]);
    let mut quats: Vec<f64> = fx.quats.clone();

    let focalplane: Buffer = Buffer::from_slice(&fx.focalplane, &[3, 4]).unwrap();
    let boresight: Buffer = Buffer::from_slice(&fx.boresight, &[n_samp, 4]).unwrap();
    let q_index: Buffer = Buffer::from_slice(&fx.q_index, &[3]).unwrap();
    let intervals: Buffer = Buffer::from_slice(&fx.intervals, &[1]).unwrap();
    let flags: Buffer = Buffer::from_slice(&fx.flags, &[n_samp]).unwrap();

    // Focal plane with the wrong number of detectors.
    let fp_short: Buffer = Buffer::from_slice(&fx.focalplane[..8], &[2, 4]).unwrap();
    let err: Error = {
        let mut out: BufferMut = BufferMut::from_slice(&mut quats, &[4, n_samp, 4]).unwrap();
        ctx.pointing_detector(&fp_short, &boresight, &q_index, &mut out, &intervals, &flags, 1, false)
            .unwrap_err()
    };
    assert!(matches!(err, Error::ShapeMismatch { name: "focalplane", .. }), "{err}");

    // Quaternion buffer with a sample count different from the boresight.
    let err: Error = {
        let mut out: BufferMut = BufferMut::from_slice(&mut quats[..4 * (n_samp - 1) * 4], &[4, n_samp - 1, 4]).unwrap();
        ctx.pointing_detector(&focalplane, &boresight, &q_index, &mut out, &intervals, &flags, 1, false)
            .unwrap_err()
    };
    assert!(matches!(err, Error::ShapeMismatch { name: "quats", .. }), "{err}");

    // Flags of the wrong element type.
    let flags_i32: Vec<i32> = vec![0; n_samp];
    let flags_bad: Buffer = Buffer::from_slice(&flags_i32, &[n_samp]).unwrap();
    let err: Error = {
        let mut out: BufferMut = BufferMut::from_slice(&mut quats, &[4, n_samp, 4]).unwrap();
        ctx.pointing_detector(&focalplane, &boresight, &q_index, &mut out, &intervals, &flags_bad, 1, false)
            .unwrap_err()
    };
    assert_eq!(
        err,
        Error::DTypeMismatch {
            name: "shared_flags",
            expected: DType::U8,
            actual: DType::I32,
        }
    );

    // Interval running past the end of the data.
    let ivals_bad: Vec<Interval> = vec![Interval::from_samples(10, n_samp as i64)];
    let intervals_bad: Buffer = Buffer::from_slice(&ivals_bad, &[1]).unwrap();
    let err: Error = {
        let mut out: BufferMut = BufferMut::from_slice(&mut quats, &[4, n_samp, 4]).unwrap();
        ctx.pointing_detector(&focalplane, &boresight, &q_index, &mut out, &intervals_bad, &flags, 1, false)
            .unwrap_err()
    };
    assert!(matches!(err, Error::InvalidInterval { index: 0, .. }), "{err}");

    // Overlapping intervals.
    let ivals_overlap: Vec<Interval> = vec![Interval::from_samples(0, 10), Interval::from_samples(10, 20)];
    let intervals_overlap: Buffer = Buffer::from_slice(&ivals_overlap, &[2]).unwrap();
    let err: Error = {
        let mut out: BufferMut = BufferMut::from_slice(&mut quats, &[4, n_samp, 4]).unwrap();
        ctx.pointing_detector(&focalplane, &boresight, &q_index, &mut out, &intervals_overlap, &flags, 1, false)
            .unwrap_err()
    };
    assert_eq!(err, Error::OverlappingIntervals { index: 0, next: 1 });

    // Two detectors sharing an output row.
    let q_dup: Vec<i32> = vec![1, 3, 1];
    let q_index_dup: Buffer = Buffer::from_slice(&q_dup, &[3]).unwrap();
    let err: Error = {
        let mut out: BufferMut = BufferMut::from_slice(&mut quats, &[4, n_samp, 4]).unwrap();
        ctx.pointing_detector(&focalplane, &boresight, &q_index_dup, &mut out, &intervals, &flags, 1, false)
            .unwrap_err()
    };
    assert_eq!(
        err,
        Error::DuplicateQuatIndex {
            det: 2,
            other: 0,
            value: 1
        }
    );

    // Row outside the output buffer.
    let q_oob: Vec<i32> = vec![0, 1, 4];
    let q_index_oob: Buffer = Buffer::from_slice(&q_oob, &[3]).unwrap();
    let err: Error = {
        let mut out: BufferMut = BufferMut::from_slice(&mut quats, &[4, n_samp, 4]).unwrap();
        ctx.pointing_detector(&focalplane, &boresight, &q_index_oob, &mut out, &intervals, &flags, 1, false)
            .unwrap_err()
    };
    assert!(matches!(err, Error::QuatIndexOutOfRange { det: 2, value: 4, .. }), "{err}");

    assert!(quats.iter().all(|&x| x == SENTINEL));
}

/// The backend under test writes exactly what the reference backend writes.
pub fn test_pointing_cross<BR: Backend, BT: Backend>(ctx_ref: &Context<BR>, ctx_test: &Context<BT>)
where
    Context<BR>: PointingDetector<BR>,
    Context<BT>: PointingDetector<BT>,
{
    let mut source: Source = Source::new([15u8; 32]);
    let cases: [(usize, usize, usize, &[(i64, i64)]); 4] = [
        (1, 1, 1, &[(0, 0)]),
        (7, 7, 513, &[(0, 512)]),
        (16, 20, 1000, &[(0, 99), (150, 150), (200, 700), (998, 999)]),
        (3, 5, 4096, &[(1, 1023), (2048, 4000)]),
    ];
    for (n_det, n_rows, n_samp, intervals) in cases {
        let mut fx_ref: PointingFixture = PointingFixture::random(&mut source, n_det, n_rows, n_samp, intervals);
        let mut fx_test: PointingFixture = PointingFixture {
            focalplane: fx_ref.focalplane.clone(),
            boresight: fx_ref.boresight.clone(),
            q_index: fx_ref.q_index.clone(),
            quats: fx_ref.quats.clone(),
            intervals: fx_ref.intervals.clone(),
            flags: fx_ref.flags.clone(),
            n_samp,
            n_rows,
        };
        fx_ref.run(ctx_ref, 0x03, false).unwrap();
        fx_test.run(ctx_test, 0x03, false).unwrap();
        assert_bit_identical(&fx_ref.quats, &fx_test.quats);
    }
}

/// Stages every device-resident input, then checks that the device launch
/// writes only the mirror, and that the synchronized result is bit-identical
/// to the host launch.
pub fn test_pointing_offload<B: Backend>(ctx: &mut Context<B>)
where
    Context<B>: PointingDetector<B>,
{
    assert!(!ctx.device_is_host(), "test requires an accelerator context");

    let mut source: Source = Source::new([16u8; 32]);
    let mut fx: PointingFixture = PointingFixture::random(&mut source, 6, 9, 777, &[(0, 100), (300, 500), (700, 776)]);

    let devices: &mut DeviceManager = ctx.devices_mut();
    let _staged: [Staged; 4] = [
        devices.stage("boresight", &fx.boresight).unwrap(),
        devices.stage("quats", &fx.quats).unwrap(),
        devices.stage("intervals", &fx.intervals).unwrap(),
        devices.stage("shared_flags", &fx.flags).unwrap(),
    ];
    assert_eq!(devices.n_mirrors(), 4);

    fx.run(ctx, 0x01, true).unwrap();
    assert!(fx.quats.iter().all(|&x| x == SENTINEL), "device launch wrote host memory");

    ctx.devices().update_host("quats", &mut fx.quats).unwrap();
    let device_out: Vec<f64> = fx.quats.clone();

    fx.quats.fill(SENTINEL);
    fx.run(ctx, 0x01, false).unwrap();
    assert_bit_identical(&device_out, &fx.quats);
    assert_bit_identical(&device_out, &fx.expected(0x01));

    let devices = ctx.devices_mut();
    assert!(devices.release(&fx.boresight));
    assert!(devices.release(&fx.quats));
    assert!(devices.release(&fx.intervals));
    assert!(devices.release(&fx.flags));
    assert_eq!(devices.n_mirrors(), 0);
}

/// A device launch with an input that was never staged fails and leaves
/// both host output and its mirror untouched.
pub fn test_pointing_missing_mirror<B: Backend>(ctx: &mut Context<B>)
where
    Context<B>: PointingDetector<B>,
{
    assert!(!ctx.device_is_host(), "test requires an accelerator context");

    let mut source: Source = Source::new([17u8; 32]);
    let mut fx: PointingFixture = PointingFixture::random(&mut source, 2, 2, 64, &[(0, 63)]);

    let devices: &mut DeviceManager = ctx.devices_mut();
    let staged: [Staged; 3] = [
        devices.stage("boresight", &fx.boresight).unwrap(),
        devices.stage("quats", &fx.quats).unwrap(),
        devices.stage("intervals", &fx.intervals).unwrap(),
    ];

    let err: Error = fx.run(ctx, 0x01, true).unwrap_err();
    match err {
        Error::MissingDeviceMirror { name, addr } => {
            assert_eq!(name, "shared_flags");
            assert_eq!(addr, fx.flags.as_ptr() as usize);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(fx.quats.iter().all(|&x| x == SENTINEL));

    ctx.devices().update_host("quats", &mut fx.quats).unwrap();
    assert!(fx.quats.iter().all(|&x| x == SENTINEL));

    drop(staged);
    assert_eq!(ctx.devices().n_mirrors(), 0);
}
