//! Every closed generic the checker endpoints use, listed up front.
//!
//! In ahead-of-time mode this table is the only way a template gets closed,
//! so an endpoint whose closing is missing here fails at startup.

use std::any::Any;
use std::sync::Arc;

use super::models::{GenericProcessorRequest, GenericProcessorResponse};
use super::probes::{
    AotGenericPostProcessor, AotGenericPostProcessorTemplate, AotGenericPreProcessor,
    AotGenericPreProcessorTemplate, EchoCommand, GenericEchoHandler, GenericEchoHandlerTemplate,
    ProcessorProbe,
};
use crate::commands::{SharedCommandHandler, register_generic_handler};
use crate::generics::{
    ClosingArguments, Factory, Instance, OpenGeneric, RegistryBuilder, RegistryError,
    ServiceActivator,
};
use crate::processors::{
    SharedPostProcessor, SharedPreProcessor, register_post_processor, register_pre_processor,
};

pub fn register_all(
    builder: &mut RegistryBuilder,
    probe: &Arc<ProcessorProbe>,
) -> Result<(), RegistryError> {
    register_pre_processor::<
        AotGenericPreProcessorTemplate,
        AotGenericPreProcessor<GenericProcessorRequest>,
        GenericProcessorRequest,
        _,
    >(builder, AotGenericPreProcessor::new)?;

    let probe = probe.clone();
    register_post_processor::<
        AotGenericPostProcessorTemplate,
        AotGenericPostProcessor<GenericProcessorRequest, GenericProcessorResponse>,
        GenericProcessorRequest,
        GenericProcessorResponse,
        _,
    >(builder, move || AotGenericPostProcessor::new(probe.clone()))?;

    register_generic_handler::<
        GenericEchoHandlerTemplate,
        GenericEchoHandler<EchoCommand>,
        EchoCommand,
        _,
    >(builder, GenericEchoHandler::new)?;

    tracing::debug!(entries = builder.len(), "Registered generic closings");
    Ok(())
}

/// Runtime construction for dynamic mode. Closes the same templates as
/// [`register_all`] by inspecting the closing arguments at call time.
pub fn dynamic_activator(probe: &Arc<ProcessorProbe>) -> ServiceActivator {
    let post_probe = probe.clone();

    ServiceActivator::new()
        .provide(Factory::new::<GenericEchoHandler<EchoCommand>, _, _>(|| {
            Arc::new(GenericEchoHandler::<EchoCommand>::new()) as SharedCommandHandler<EchoCommand>
        }))
        .provide_template(AotGenericPreProcessorTemplate::open_key(), |args| {
            (*args == ClosingArguments::of::<GenericProcessorRequest>()).then(|| {
                boxed(Arc::new(AotGenericPreProcessor::<GenericProcessorRequest>::new())
                    as SharedPreProcessor<GenericProcessorRequest>)
            })
        })
        .provide_template(AotGenericPostProcessorTemplate::open_key(), move |args| {
            let expected =
                ClosingArguments::pair::<GenericProcessorRequest, GenericProcessorResponse>();
            (*args == expected).then(|| {
                boxed(Arc::new(AotGenericPostProcessor::new(post_probe.clone()))
                    as SharedPostProcessor<GenericProcessorRequest, GenericProcessorResponse>)
            })
        })
}

fn boxed<T: Any + Send + Sync>(value: T) -> Instance {
    Box::new(value)
}
