use tod_cpu_ref::CpuRef;
use tod_hal::{
    api::{ContextNew, FftPlanAlloc},
    config::{Environment, EnvironmentBuilder},
    error::Error,
    layouts::{Context, Device, DeviceManager, Direction, FftPlan, Interval, PlanQuality, Staged},
    source::Source,
    test_suite::pointing::{PointingFixture, SENTINEL, test_pointing_missing_mirror, test_pointing_offload},
};

use crate::{CpuHost, CpuOffload};

fn env() -> Environment {
    EnvironmentBuilder::new()
        .max_threads(4)
        .accel_disabled(false)
        .build_with(|_| None)
        .expect("environment")
}

tod_hal::backend_test_suite! {
    mod cpu_host,
    backend = crate::CpuHost,
    env = super::env(),
    tests = {
        pointing_flag_mask => tod_hal::test_suite::pointing::test_pointing_flag_mask,
        pointing_intervals => tod_hal::test_suite::pointing::test_pointing_intervals,
        pointing_use_accel_on_host => tod_hal::test_suite::pointing::test_pointing_use_accel_on_host,
        pointing_empty => tod_hal::test_suite::pointing::test_pointing_empty,
        pointing_boundary_errors => tod_hal::test_suite::pointing::test_pointing_boundary_errors,
        fft_roundtrip => tod_hal::test_suite::fft::test_fft_roundtrip,
        fft_white_noise => tod_hal::test_suite::fft::test_fft_white_noise,
        fft_scale_and_repeat => tod_hal::test_suite::fft::test_fft_scale_and_repeat,
        fft_invalid_size => tod_hal::test_suite::fft::test_fft_invalid_size,
        fft_matches_reference => tod_hal::test_suite::fft::test_fft_matches_reference,
    }
}

tod_hal::backend_test_suite! {
    mod cpu_offload,
    backend = crate::CpuOffload,
    env = super::env(),
    tests = {
        pointing_flag_mask => tod_hal::test_suite::pointing::test_pointing_flag_mask,
        pointing_intervals => tod_hal::test_suite::pointing::test_pointing_intervals,
        pointing_empty => tod_hal::test_suite::pointing::test_pointing_empty,
        pointing_boundary_errors => tod_hal::test_suite::pointing::test_pointing_boundary_errors,
        fft_roundtrip => tod_hal::test_suite::fft::test_fft_roundtrip,
        fft_white_noise => tod_hal::test_suite::fft::test_fft_white_noise,
        fft_scale_and_repeat => tod_hal::test_suite::fft::test_fft_scale_and_repeat,
        fft_matches_reference => tod_hal::test_suite::fft::test_fft_matches_reference,
    }
}

tod_hal::cross_backend_test_suite! {
    mod cpu_host_vs_ref,
    backend_ref = tod_cpu_ref::CpuRef,
    backend_test = crate::CpuHost,
    env = super::env(),
    tests = {
        pointing => tod_hal::test_suite::pointing::test_pointing_cross,
        fft => tod_hal::test_suite::fft::test_fft_cross,
    }
}

tod_hal::cross_backend_test_suite! {
    mod cpu_offload_vs_ref,
    backend_ref = tod_cpu_ref::CpuRef,
    backend_test = crate::CpuOffload,
    env = super::env(),
    tests = {
        pointing => tod_hal::test_suite::pointing::test_pointing_cross,
        fft => tod_hal::test_suite::fft::test_fft_cross,
    }
}

#[test]
fn offload_selects_device_by_rank() {
    for (rank, disabled, expected) in [
        (0, false, Device::Accel(0)),
        (5, false, Device::Accel(0)),
        (0, true, Device::Host),
    ] {
        let env: Environment = EnvironmentBuilder::new()
            .max_threads(1)
            .accel_disabled(disabled)
            .node(rank, 8)
            .build_with(|_| None)
            .unwrap();
        let ctx: Context<CpuOffload> = Context::<CpuOffload>::new(&env).unwrap();
        assert_eq!(ctx.get_device(), expected);
        assert_eq!(ctx.devices().n_devices(), 1);
    }

    let ctx: Context<CpuHost> = Context::<CpuHost>::new(&env()).unwrap();
    assert!(ctx.device_is_host());
    assert_eq!(ctx.devices().n_devices(), 0);
}

fn stage_all(devices: &mut DeviceManager, fx: &PointingFixture) -> [Staged; 4] {
    [
        devices.stage("boresight", &fx.boresight).unwrap(),
        devices.stage("quats", &fx.quats).unwrap(),
        devices.stage("intervals", &fx.intervals).unwrap(),
        devices.stage("shared_flags", &fx.flags).unwrap(),
    ]
}

#[test]
fn offload_device_path() {
    let mut ctx: Context<CpuOffload> = Context::<CpuOffload>::new(&env()).unwrap();
    test_pointing_offload(&mut ctx);
}

#[test]
fn offload_missing_mirror() {
    let mut ctx: Context<CpuOffload> = Context::<CpuOffload>::new(&env()).unwrap();
    test_pointing_missing_mirror(&mut ctx);
}

/// Device output synchronized back to the host equals the serial reference.
#[test]
fn offload_device_matches_reference() {
    let mut ctx: Context<CpuOffload> = Context::<CpuOffload>::new(&env()).unwrap();
    let ctx_ref: Context<CpuRef> = Context::<CpuRef>::new(&env()).unwrap();

    let mut source: Source = Source::new([31u8; 32]);
    let mut fx: PointingFixture = PointingFixture::random(&mut source, 12, 16, 2000, &[(0, 499), (600, 1999)]);
    let mut fx_ref: PointingFixture = PointingFixture::random(&mut Source::new([31u8; 32]), 12, 16, 2000, &[(0, 499), (600, 1999)]);

    let _staged: [Staged; 4] = stage_all(ctx.devices_mut(), &fx);

    fx.run(&ctx, 0x04, true).unwrap();
    ctx.devices().update_host("quats", &mut fx.quats).unwrap();
    fx_ref.run(&ctx_ref, 0x04, false).unwrap();

    assert_eq!(
        fx.quats.iter().map(|x| x.to_bits()).collect::<Vec<u64>>(),
        fx_ref.quats.iter().map(|x| x.to_bits()).collect::<Vec<u64>>()
    );
}

/// Refreshing a staged input with `update_device` is seen by the next launch.
#[test]
fn offload_update_device() {
    let mut ctx: Context<CpuOffload> = Context::<CpuOffload>::new(&env()).unwrap();
    let mut source: Source = Source::new([32u8; 32]);
    let mut fx: PointingFixture = PointingFixture::random(&mut source, 2, 2, 100, &[(0, 99)]);

    let _staged: [Staged; 4] = stage_all(ctx.devices_mut(), &fx);

    fx.flags.fill(0xff);
    ctx.devices_mut().update_device("shared_flags", &fx.flags).unwrap();

    fx.run(&ctx, 0x01, true).unwrap();
    ctx.devices().update_host("quats", &mut fx.quats).unwrap();
    assert_eq!(fx.quats, fx.expected(0x01));

    // Every sample flagged: rows hold the focal plane offsets.
    for (d, &row) in fx.q_index.iter().enumerate() {
        let off: usize = row as usize * 100 * 4;
        assert_eq!(&fx.quats[off..off + 4], &fx.focalplane[4 * d..4 * d + 4]);
    }
}

/// The launch checks the interval mirror it iterates, not only the host copy.
#[test]
fn offload_rejects_stale_interval_mirror() {
    let mut ctx: Context<CpuOffload> = Context::<CpuOffload>::new(&env()).unwrap();
    let mut source: Source = Source::new([33u8; 32]);
    let mut fx: PointingFixture = PointingFixture::random(&mut source, 1, 1, 4, &[(0, 3)]);

    fx.intervals[0] = Interval::from_samples(0, 100_000);
    let _staged: [Staged; 4] = stage_all(ctx.devices_mut(), &fx);
    fx.intervals[0] = Interval::from_samples(0, 3);

    assert_eq!(
        fx.run(&ctx, 0x01, true),
        Err(Error::InvalidInterval {
            index: 0,
            first: 0,
            last: 100_000,
            n_samp: 4,
        })
    );

    ctx.devices().update_host("quats", &mut fx.quats).unwrap();
    assert!(fx.quats.iter().all(|&x| x == SENTINEL));

    // Once the mirror is refreshed the launch goes through.
    ctx.devices_mut().update_device("intervals", &fx.intervals).unwrap();
    fx.run(&ctx, 0x01, true).unwrap();
    ctx.devices().update_host("quats", &mut fx.quats).unwrap();
    assert_eq!(fx.quats, fx.expected(0x01));
}

#[test]
fn staging_requires_device() {
    let mut ctx: Context<CpuHost> = Context::<CpuHost>::new(&env()).unwrap();
    let data: Vec<u8> = vec![0; 16];
    assert!(matches!(
        ctx.devices_mut().stage("shared_flags", &data),
        Err(Error::NoAccelerator)
    ));
    assert!(!ctx.devices().is_staged(&data));
}

#[test]
fn exhaustive_plan_matches_fast_plan() {
    let ctx: Context<CpuHost> = Context::<CpuHost>::new(&env()).unwrap();
    let mut fast: FftPlan<CpuHost> = ctx
        .fft_plan_alloc(1000, 3, PlanQuality::Fast, Direction::Forward, 1.0)
        .unwrap();
    let mut exhaustive: FftPlan<CpuHost> = ctx
        .fft_plan_alloc(1000, 3, PlanQuality::Exhaustive, Direction::Forward, 1.0)
        .unwrap();
    assert_eq!(fast.handle().planner(), "auto");
    assert!(["auto", "scalar"].contains(&exhaustive.handle().planner()));

    let mut source: Source = Source::new([33u8; 32]);
    for i in 0..3 {
        source.fill_normal(0.0, 1.0, fast.tdata_mut(i));
        let t: Vec<f64> = fast.tdata(i).to_vec();
        exhaustive.tdata_mut(i).copy_from_slice(&t);
    }
    fast.exec();
    exhaustive.exec();
    for (a, b) in fast.fdata_all().iter().zip(exhaustive.fdata_all()) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }
}
