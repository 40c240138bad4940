use std::any::Any;
use std::sync::Arc;
use thiserror::Error;

use super::activator::{ActivationError, ActivationRequest, Activator, Unsupported};
use super::key::{ClosingArguments, OpenGeneric, OpenTypeKey, TypeIdentity};
use super::registry::{GenericTypeRegistry, Instance};
use crate::observability::Metrics;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// No factory was registered and the fallback could not build the type.
    /// Always fatal: it means the registration table is missing an entry.
    #[error("no factory registered for {target} and fallback construction failed: {source}")]
    Configuration {
        target: String,
        #[source]
        source: ActivationError,
    },

    #[error("instance built for {target} is not a {expected}")]
    TypeMismatch {
        target: String,
        expected: &'static str,
    },
}

/// Handler type token passed to the executor.
///
/// Carries the closed handler type and, for generic handlers, the open
/// template it was closed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerType {
    closed: TypeIdentity,
    open: Option<OpenTypeKey>,
}

impl HandlerType {
    /// A non-generic handler type.
    pub fn of<H: 'static>() -> Self {
        Self {
            closed: TypeIdentity::of::<H>(),
            open: None,
        }
    }

    /// A generic handler `H` closed from template `G`.
    pub fn generic<H: 'static, G: OpenGeneric>() -> Self {
        Self {
            closed: TypeIdentity::of::<H>(),
            open: Some(G::open_key()),
        }
    }

    pub fn closed(&self) -> TypeIdentity {
        self.closed
    }

    pub fn open(&self) -> Option<&OpenTypeKey> {
        self.open.as_ref()
    }

    pub fn is_generic(&self) -> bool {
        self.open.is_some()
    }
}

/// Registry-first instance resolution with an explicit fallback path.
pub struct HandlerResolver {
    registry: Arc<GenericTypeRegistry>,
    fallback: Arc<dyn Activator>,
    metrics: Arc<Metrics>,
}

impl HandlerResolver {
    pub fn new(registry: Arc<GenericTypeRegistry>, fallback: Arc<dyn Activator>) -> Self {
        Self {
            registry,
            fallback,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Resolver with no fallback, as an ahead-of-time build would have.
    pub fn ahead_of_time(registry: Arc<GenericTypeRegistry>) -> Self {
        Self::new(registry, Arc::new(Unsupported))
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn registry(&self) -> &GenericTypeRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Close `key` over `args`: registry first, then the fallback.
    pub fn create_instance(
        &self,
        key: &OpenTypeKey,
        args: &ClosingArguments,
    ) -> Result<Instance, ResolveError> {
        if let Some(factory) = self.registry.try_resolve(key, args) {
            self.metrics.factory_hit();
            return Ok(factory.invoke());
        }

        tracing::warn!(
            template = %key,
            args = %args,
            "No registered factory, trying dynamic construction"
        );
        self.activate(ActivationRequest::Generic { key, args })
    }

    /// Like [`create_instance`](Self::create_instance), downcast to `S`.
    pub fn create<S: Any>(
        &self,
        key: &OpenTypeKey,
        args: &ClosingArguments,
    ) -> Result<S, ResolveError> {
        let instance = self.create_instance(key, args)?;
        downcast(instance, || format!("{} closed over {}", key, args))
    }

    /// Resolve a handler instance for `handler_type`.
    ///
    /// Generic handlers are closed over `args` through the registry; plain
    /// handler types have nothing to close and go straight to the fallback.
    pub fn create_handler<S: Any>(
        &self,
        handler_type: &HandlerType,
        args: &ClosingArguments,
    ) -> Result<S, ResolveError> {
        let instance = match handler_type.open() {
            Some(key) => match self.registry.try_resolve(key, args) {
                Some(factory) if factory.closed_type() != handler_type.closed() => {
                    self.metrics.resolution_failed();
                    tracing::error!(
                        template = %key,
                        requested = %handler_type.closed(),
                        registered = %factory.closed_type(),
                        "Registered closing builds a different handler type"
                    );
                    return Err(ResolveError::TypeMismatch {
                        target: factory.closed_type().to_string(),
                        expected: handler_type.closed().name(),
                    });
                }
                Some(factory) => {
                    self.metrics.factory_hit();
                    factory.invoke()
                }
                None => {
                    tracing::warn!(
                        template = %key,
                        handler = %handler_type.closed(),
                        "No registered factory for generic handler, trying dynamic construction"
                    );
                    self.activate(ActivationRequest::Concrete(handler_type.closed()))?
                }
            },
            None => self.activate(ActivationRequest::Concrete(handler_type.closed()))?,
        };

        downcast(instance, || handler_type.closed().to_string())
    }

    fn activate(&self, request: ActivationRequest<'_>) -> Result<Instance, ResolveError> {
        match self.fallback.activate(request) {
            Ok(instance) => {
                self.metrics.fallback_hit();
                Ok(instance)
            }
            Err(source) => {
                self.metrics.resolution_failed();
                tracing::error!(target_type = %request, error = %source, "Handler resolution failed");
                Err(ResolveError::Configuration {
                    target: request.to_string(),
                    source,
                })
            }
        }
    }
}

impl std::fmt::Debug for HandlerResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerResolver")
            .field("registry_entries", &self.registry.len())
            .finish()
    }
}

fn downcast<S: Any>(instance: Instance, target: impl FnOnce() -> String) -> Result<S, ResolveError> {
    instance
        .downcast::<S>()
        .map(|boxed| *boxed)
        .map_err(|_| ResolveError::TypeMismatch {
            target: target(),
            expected: std::any::type_name::<S>(),
        })
}
