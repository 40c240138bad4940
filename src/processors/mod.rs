//! Endpoint pre/post processors resolved from open templates

mod pipeline;
mod traits;

pub use pipeline::{ProcessorPipeline, ProcessorPipelineBuilder};
pub use traits::{
    Order, PostContext, PostProcessor, PreContext, PreProcessor, ProcessorError,
    SharedPostProcessor, SharedPreProcessor,
};

use std::sync::Arc;

use crate::generics::{ClosingArguments, Factory, OpenGeneric, RegistryBuilder, RegistryError};

/// Register pre-processor `P`, the closing of template `G` over `Req`.
pub fn register_pre_processor<G, P, Req, F>(
    builder: &mut RegistryBuilder,
    make: F,
) -> Result<(), RegistryError>
where
    G: OpenGeneric,
    P: PreProcessor<Req> + 'static,
    Req: Send + Sync + 'static,
    F: Fn() -> P + Send + Sync + 'static,
{
    builder.register(
        G::open_key(),
        ClosingArguments::of::<Req>(),
        Factory::new::<P, _, _>(move || Arc::new(make()) as SharedPreProcessor<Req>),
    )
}

/// Register post-processor `P`, the closing of template `G` over `(Req, Res)`.
pub fn register_post_processor<G, P, Req, Res, F>(
    builder: &mut RegistryBuilder,
    make: F,
) -> Result<(), RegistryError>
where
    G: OpenGeneric,
    P: PostProcessor<Req, Res> + 'static,
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    F: Fn() -> P + Send + Sync + 'static,
{
    builder.register(
        G::open_key(),
        ClosingArguments::pair::<Req, Res>(),
        Factory::new::<P, _, _>(move || Arc::new(make()) as SharedPostProcessor<Req, Res>),
    )
}
