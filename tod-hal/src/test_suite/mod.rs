pub mod fft;
pub mod pointing;

/// Instantiates backend-generic tests taking a single `&Context<B>`.
///
/// ```ignore
/// tod_hal::backend_test_suite! {
///     mod cpu_host,
///     backend = CpuHost,
///     env = Environment::default(),
///     tests = {
///         fft_roundtrip => tod_hal::test_suite::fft::test_fft_roundtrip,
///     }
/// }
/// ```
#[macro_export]
macro_rules! backend_test_suite {
    (
        mod $modname:ident,
        backend = $backend:ty,
        env = $env:expr,
        tests = {
            $( $(#[$attr:meta])* $test_name:ident => $impl:path ),+ $(,)?
        }
    ) => {
        mod $modname {
            use $crate::{api::ContextNew, config::Environment, layouts::Context};

            use once_cell::sync::Lazy;

            static CONTEXT: Lazy<Context<$backend>> = Lazy::new(|| {
                let env: Environment = $env;
                Context::<$backend>::new(&env).expect("context creation failed")
            });

            $(
                $(#[$attr])*
                #[test]
                fn $test_name() {
                    ($impl)(&*CONTEXT);
                }
            )+
        }
    };
}

/// Instantiates tests comparing a backend against a reference backend,
/// each test taking `(&Context<BR>, &Context<BT>)`.
#[macro_export]
macro_rules! cross_backend_test_suite {
    (
        mod $modname:ident,
        backend_ref = $backend_ref:ty,
        backend_test = $backend_test:ty,
        env = $env:expr,
        tests = {
            $( $(#[$attr:meta])* $test_name:ident => $impl:path ),+ $(,)?
        }
    ) => {
        mod $modname {
            use $crate::{api::ContextNew, config::Environment, layouts::Context};

            use once_cell::sync::Lazy;

            static CONTEXT_REF: Lazy<Context<$backend_ref>> = Lazy::new(|| {
                let env: Environment = $env;
                Context::<$backend_ref>::new(&env).expect("reference context creation failed")
            });
            static CONTEXT_TEST: Lazy<Context<$backend_test>> = Lazy::new(|| {
                let env: Environment = $env;
                Context::<$backend_test>::new(&env).expect("test context creation failed")
            });

            $(
                $(#[$attr])*
                #[test]
                fn $test_name() {
                    ($impl)(&*CONTEXT_REF, &*CONTEXT_TEST);
                }
            )+
        }
    };
}
