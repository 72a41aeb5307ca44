use crate::{
    api::ContextNew,
    config::Environment,
    error::Result,
    layouts::{Backend, Context},
    oep::ContextNewImpl,
};

impl<B> ContextNew<B> for Context<B>
where
    B: Backend + ContextNewImpl<B>,
{
    fn new(env: &Environment) -> Result<Self> {
        let ctx: Context<B> = B::new_impl(env)?;
        tracing::debug!(backend = B::name(), device = %ctx.get_device(), "context created");
        Ok(ctx)
    }
}
