use std::any::{Any, TypeId};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

use super::executor::CommandExecutor;
use super::traits::{Command, CommandError};
use crate::generics::HandlerType;

/// A command type's handler and its executor, created once at setup.
pub struct CommandDefinition<C: Command> {
    handler_type: HandlerType,
    executor: CommandExecutor<C>,
}

impl<C: Command> CommandDefinition<C> {
    pub fn handler_type(&self) -> &HandlerType {
        &self.handler_type
    }
}

#[derive(Default)]
pub struct CommandBusBuilder {
    definitions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl CommandBusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<C: Command>(
        &mut self,
        handler_type: HandlerType,
        executor: CommandExecutor<C>,
    ) -> Result<&mut Self, CommandError> {
        let command_type = TypeId::of::<C>();
        if self.definitions.contains_key(&command_type) {
            return Err(CommandError::DuplicateDefinition(std::any::type_name::<C>()));
        }

        tracing::debug!(
            command = std::any::type_name::<C>(),
            handler = %handler_type.closed(),
            middlewares = executor.middleware_count(),
            "Registered command definition"
        );
        self.definitions.insert(
            command_type,
            Box::new(CommandDefinition {
                handler_type,
                executor,
            }),
        );
        Ok(self)
    }

    pub fn build(self) -> CommandBus {
        CommandBus {
            definitions: self.definitions,
        }
    }
}

/// Dispatches commands to their registered definitions. Read-only once built.
pub struct CommandBus {
    definitions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl CommandBus {
    pub fn builder() -> CommandBusBuilder {
        CommandBusBuilder::new()
    }

    pub fn definition<C: Command>(&self) -> Option<&CommandDefinition<C>> {
        self.definitions
            .get(&TypeId::of::<C>())
            .and_then(|definition| definition.downcast_ref::<CommandDefinition<C>>())
    }

    pub async fn send<C: Command>(
        &self,
        command: C,
        ct: &CancellationToken,
    ) -> Result<C::Output, CommandError> {
        let definition = self
            .definition::<C>()
            .ok_or(CommandError::Unregistered(std::any::type_name::<C>()))?;

        definition
            .executor
            .execute(command, &definition.handler_type, ct)
            .await
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl std::fmt::Debug for CommandBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBus")
            .field("definitions", &self.definitions.len())
            .finish()
    }
}
