use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use super::key::{ClosingArguments, OpenTypeKey, TypeIdentity};
use super::registry::{Factory, Instance};

/// What the fallback path is asked to build.
#[derive(Debug, Clone, Copy)]
pub enum ActivationRequest<'a> {
    /// Close `key` over `args` at runtime.
    Generic {
        key: &'a OpenTypeKey,
        args: &'a ClosingArguments,
    },
    /// Build an already-closed concrete type.
    Concrete(TypeIdentity),
}

impl std::fmt::Display for ActivationRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivationRequest::Generic { key, args } => write!(f, "{} closed over {}", key, args),
            ActivationRequest::Concrete(ty) => write!(f, "{}", ty),
        }
    }
}

#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("dynamic construction is unavailable in ahead-of-time mode")]
    Unsupported,

    #[error("no runtime constructor provided for {0}")]
    NotProvided(String),
}

/// Fallback construction path consulted when the registry has no entry.
///
/// Implementations may build types that no registration table names, which
/// is exactly what an ahead-of-time build cannot do.
pub trait Activator: Send + Sync {
    fn activate(&self, request: ActivationRequest<'_>) -> Result<Instance, ActivationError>;
}

/// Ahead-of-time mode: every fallback fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unsupported;

impl Activator for Unsupported {
    fn activate(&self, _request: ActivationRequest<'_>) -> Result<Instance, ActivationError> {
        Err(ActivationError::Unsupported)
    }
}

type TemplateCloser = dyn Fn(&ClosingArguments) -> Option<Instance> + Send + Sync;

/// Dynamic mode: a runtime service container.
///
/// Concrete types are provided by factory; templates are provided by a
/// closer that inspects the closing arguments at call time.
#[derive(Default, Clone)]
pub struct ServiceActivator {
    concrete: HashMap<TypeIdentity, Factory>,
    templates: HashMap<OpenTypeKey, Arc<TemplateCloser>>,
}

impl ServiceActivator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide a constructor for concrete type `factory.closed_type()`.
    pub fn provide(mut self, factory: Factory) -> Self {
        self.concrete.insert(factory.closed_type(), factory);
        self
    }

    pub fn provide_template<F>(mut self, key: OpenTypeKey, closer: F) -> Self
    where
        F: Fn(&ClosingArguments) -> Option<Instance> + Send + Sync + 'static,
    {
        self.templates.insert(key, Arc::new(closer));
        self
    }
}

impl Activator for ServiceActivator {
    fn activate(&self, request: ActivationRequest<'_>) -> Result<Instance, ActivationError> {
        let instance = match request {
            ActivationRequest::Generic { key, args } => {
                self.templates.get(key).and_then(|closer| closer(args))
            }
            ActivationRequest::Concrete(ty) => self.concrete.get(&ty).map(Factory::invoke),
        };

        instance.ok_or_else(|| ActivationError::NotProvided(request.to_string()))
    }
}

impl std::fmt::Debug for ServiceActivator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceActivator")
            .field("concrete", &self.concrete.keys().collect::<Vec<_>>())
            .field("templates", &self.templates.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generics::key::ParamRole;

    struct Widget(u32);
    struct Marker;

    #[test]
    fn test_unsupported_always_fails() {
        let result = Unsupported.activate(ActivationRequest::Concrete(TypeIdentity::of::<Widget>()));
        assert!(matches!(result, Err(ActivationError::Unsupported)));
    }

    #[test]
    fn test_service_activator_concrete() {
        let activator = ServiceActivator::new().provide(Factory::new::<Widget, _, _>(|| Widget(7)));

        let instance = activator
            .activate(ActivationRequest::Concrete(TypeIdentity::of::<Widget>()))
            .unwrap();
        assert_eq!(instance.downcast_ref::<Widget>().unwrap().0, 7);

        let missing = activator.activate(ActivationRequest::Concrete(TypeIdentity::of::<Marker>()));
        assert!(matches!(missing, Err(ActivationError::NotProvided(_))));
    }

    #[test]
    fn test_service_activator_template_closer() {
        let key = OpenTypeKey::new("Boxed", [ParamRole::Request]);
        let activator = ServiceActivator::new().provide_template(key.clone(), |args| {
            if *args == ClosingArguments::of::<Widget>() {
                Some(Box::new(Widget(1)) as Instance)
            } else {
                None
            }
        });

        let args = ClosingArguments::of::<Widget>();
        let instance = activator
            .activate(ActivationRequest::Generic { key: &key, args: &args })
            .unwrap();
        assert!(instance.downcast_ref::<Widget>().is_some());

        let other = ClosingArguments::of::<Marker>();
        let result = activator.activate(ActivationRequest::Generic { key: &key, args: &other });
        assert!(matches!(result, Err(ActivationError::NotProvided(_))));
    }
}
