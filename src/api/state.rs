use std::sync::Arc;
use thiserror::Error;

use super::cache::ResponseCache;
use super::models::{CachedResponse, GenericProcessorRequest, GenericProcessorResponse};
use super::probes::{
    AotGenericPostProcessorTemplate, AotGenericPreProcessorTemplate, EchoCommand,
    GenericEchoHandler, GenericEchoHandlerTemplate, ProcessorProbe, TimingStage, TracingStage,
};
use super::registrations;
use crate::commands::{CommandBus, CommandError, CommandExecutor, CommandRecorder};
use crate::config::{Config, ResolverMode};
use crate::generics::{
    Activator, GenericTypeRegistry, HandlerResolver, HandlerType, OpenGeneric, RegistryError,
    ResolveError, Unsupported,
};
use crate::observability::Metrics;
use crate::processors::{Order, ProcessorPipeline};

pub const GENERIC_PROCESSOR_ENDPOINT: &str = "generic-processor";

pub type GenericProcessorPipeline = ProcessorPipeline<GenericProcessorRequest, GenericProcessorResponse>;

/// Failures while wiring the app. All of them are fatal.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("registration failed: {0}")]
    Registry(#[from] RegistryError),
    #[error("endpoint configuration failed: {0}")]
    Resolve(#[from] ResolveError),
    #[error("command bus configuration failed: {0}")]
    Command(#[from] CommandError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub resolver: Arc<HandlerResolver>,
    pub bus: Arc<CommandBus>,
    pub processors: Arc<GenericProcessorPipeline>,
    pub probe: Arc<ProcessorProbe>,
    pub cache: Arc<ResponseCache<CachedResponse>>,
    pub commands: Arc<CommandRecorder<EchoCommand>>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Build the app with the full registration table.
    pub fn build(config: Config) -> Result<Self, StartupError> {
        let probe = Arc::new(ProcessorProbe::new());
        let mut builder = GenericTypeRegistry::builder();
        registrations::register_all(&mut builder, &probe)?;
        Self::assemble(config, builder.freeze(), probe)
    }

    /// Build the app on top of an already frozen registry.
    ///
    /// Endpoint processors are resolved here, so in ahead-of-time mode a
    /// registry missing one of their closings fails now rather than on the
    /// first request.
    pub fn assemble(
        config: Config,
        registry: GenericTypeRegistry,
        probe: Arc<ProcessorProbe>,
    ) -> Result<Self, StartupError> {
        let metrics = Arc::new(Metrics::new());
        let fallback: Arc<dyn Activator> = match config.resolver.mode {
            ResolverMode::Aot => Arc::new(Unsupported),
            ResolverMode::Dynamic => Arc::new(registrations::dynamic_activator(&probe)),
        };
        let resolver = Arc::new(
            HandlerResolver::new(Arc::new(registry), fallback).with_metrics(metrics.clone()),
        );

        let processors: GenericProcessorPipeline =
            ProcessorPipeline::builder(GENERIC_PROCESSOR_ENDPOINT, &resolver)
                .pre_processors(Order::Before, &[AotGenericPreProcessorTemplate::open_key()])?
                .post_processors(Order::After, &[AotGenericPostProcessorTemplate::open_key()])?
                .build();

        let commands: Arc<CommandRecorder<EchoCommand>> = Arc::new(CommandRecorder::new());
        let executor = CommandExecutor::<EchoCommand>::builder(resolver.clone())
            .middleware(|| TracingStage)
            .middleware(TimingStage::new)
            .receiver(commands.clone())
            .build();

        let mut bus = CommandBus::builder();
        bus.register(
            HandlerType::generic::<GenericEchoHandler<EchoCommand>, GenericEchoHandlerTemplate>(),
            executor,
        )?;

        tracing::info!(
            mode = ?config.resolver.mode,
            registrations = resolver.registry().len(),
            pre_processors = processors.pre_count(),
            post_processors = processors.post_count(),
            "Application state assembled"
        );

        Ok(Self {
            cache: Arc::new(ResponseCache::new(config.cache.response_max_age.as_duration())),
            config: Arc::new(config),
            resolver,
            bus: Arc::new(bus.build()),
            processors: Arc::new(processors),
            probe,
            commands,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_resolves_endpoint_processors() {
        let state = AppState::build(Config::default()).unwrap();
        assert_eq!(state.processors.pre_count(), 1);
        assert_eq!(state.processors.post_count(), 1);
        assert_eq!(state.bus.len(), 1);
        assert_eq!(state.metrics.snapshot().factory_hits, 2);
    }

    #[test]
    fn test_missing_registration_fails_startup_ahead_of_time() {
        let registry = GenericTypeRegistry::builder().freeze();
        let result = AppState::assemble(Config::default(), registry, Arc::new(ProcessorProbe::new()));

        assert!(matches!(
            result,
            Err(StartupError::Resolve(ResolveError::Configuration { .. }))
        ));
    }

    #[test]
    fn test_dynamic_mode_tolerates_missing_registration() {
        let mut config = Config::default();
        config.resolver.mode = ResolverMode::Dynamic;
        let registry = GenericTypeRegistry::builder().freeze();

        let state = AppState::assemble(config, registry, Arc::new(ProcessorProbe::new())).unwrap();
        assert_eq!(state.metrics.snapshot().fallback_hits, 2);
    }
}
