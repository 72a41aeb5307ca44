use crate::{config::Environment, error::Result, layouts::Backend};

/// Instantiate a new [crate::layouts::Context].
pub trait ContextNew<B: Backend> {
    fn new(env: &Environment) -> Result<Self>
    where
        Self: Sized;
}
