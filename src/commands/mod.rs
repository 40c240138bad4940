//! Command execution through a middleware chain
//!
//! - [`Command`] / [`CommandHandler`] - A unit of work and its terminal step
//! - [`CommandMiddleware`] / [`Next`] - Ordered wrapper stages
//! - [`CommandExecutor`] - Resolves the handler and drives the chain
//! - [`CommandBus`] - Per-command-type executors built once at startup
//! - [`CommandRecorder`] - Observer that keeps a copy of every command

mod bus;
mod executor;
mod recorder;
mod traits;

pub use bus::{CommandBus, CommandBusBuilder, CommandDefinition};
pub use executor::{CommandExecutor, CommandExecutorBuilder, MiddlewareFactory};
pub use recorder::CommandRecorder;
pub use traits::{
    Command, CommandError, CommandHandler, CommandMiddleware, CommandReceiver, Next,
    SharedCommandHandler,
};

use std::sync::Arc;

use crate::generics::{ClosingArguments, Factory, OpenGeneric, RegistryBuilder, RegistryError};

/// Register handler `H`, the closing of template `G` over command `C`.
pub fn register_generic_handler<G, H, C, F>(
    builder: &mut RegistryBuilder,
    make: F,
) -> Result<(), RegistryError>
where
    G: OpenGeneric,
    C: Command,
    H: CommandHandler<C> + 'static,
    F: Fn() -> H + Send + Sync + 'static,
{
    builder.register(
        G::open_key(),
        ClosingArguments::of::<C>(),
        Factory::new::<H, _, _>(move || Arc::new(make()) as SharedCommandHandler<C>),
    )
}
