//! Open-generic registry and resolver
//!
//! A closed generic type such as `AotGenericPreProcessor<Req>` only exists in
//! the binary if some code names it. Instead of building closed types from
//! runtime type tokens, every (template, closing arguments) pair the
//! application needs is registered up front with a factory, and the resolver
//! turns "close this template over these types" into a table lookup.
//!
//! ## Key Components
//!
//! - [`OpenTypeKey`] / [`OpenGeneric`] - Identity of an unbound template
//! - [`ClosingArguments`] - Concrete types that close a template
//! - [`RegistryBuilder`] / [`GenericTypeRegistry`] - Populate once, read many
//! - [`HandlerResolver`] - Registry lookup with an explicit [`Activator`] fallback
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut builder = GenericTypeRegistry::builder();
//! builder.register(
//!     PreTemplate::open_key(),
//!     ClosingArguments::of::<Req>(),
//!     Factory::new::<MyPre<Req>, _, _>(|| Arc::new(MyPre::<Req>::default()) as SharedPreProcessor<Req>),
//! )?;
//!
//! let resolver = HandlerResolver::ahead_of_time(Arc::new(builder.freeze()));
//! let pre: SharedPreProcessor<Req> = resolver.create(&PreTemplate::open_key(), &ClosingArguments::of::<Req>())?;
//! ```

mod activator;
mod key;
mod registry;
mod resolver;

pub use activator::{ActivationError, ActivationRequest, Activator, ServiceActivator, Unsupported};
pub use key::{ClosingArguments, OpenGeneric, OpenTypeKey, ParamRole, TypeIdentity};
pub use registry::{
    Factory, GenericTypeRegistry, Instance, RegistryBuilder, RegistryEntry, RegistryError,
};
pub use resolver::{HandlerResolver, HandlerType, ResolveError};
