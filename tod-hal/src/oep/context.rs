use crate::{
    config::Environment,
    error::Result,
    layouts::{Backend, Context},
};

/// # THIS TRAIT IS AN OPEN EXTENSION POINT (unsafe)
/// * See [crate::api::ContextNew] for the corresponding public API.
/// # Safety
/// The returned [Context] must own its handle, which is freed by
/// [Backend::destroy] exactly once.
pub unsafe trait ContextNewImpl<B: Backend> {
    fn new_impl(env: &Environment) -> Result<Context<B>>;
}
