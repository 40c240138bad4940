use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::generics::ResolveError;

/// Command errors. The executor never translates these; whatever a stage or
/// handler returns reaches the caller as-is.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("command cancelled")]
    Cancelled,
    #[error("command rejected: {0}")]
    Rejected(String),
    #[error("handler failed: {0}")]
    Handler(String),
    #[error("no command definition registered for {0}")]
    Unregistered(&'static str),
    #[error("command definition already registered for {0}")]
    DuplicateDefinition(&'static str),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// A unit of work with a typed result
pub trait Command: Send + 'static {
    type Output: Send + 'static;
}

/// Terminal step of a command invocation
#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    async fn execute(&self, command: C, ct: &CancellationToken) -> Result<C::Output, CommandError>;
}

pub type SharedCommandHandler<C> = Arc<dyn CommandHandler<C>>;

/// Wrapper stage around a handler invocation.
///
/// A stage may run code before and after `next.run(..)`, replace the command
/// it forwards, or return without calling `next` at all.
#[async_trait]
pub trait CommandMiddleware<C: Command>: Send + Sync {
    async fn execute(
        &self,
        command: C,
        next: Next<'_, C>,
        ct: &CancellationToken,
    ) -> Result<C::Output, CommandError>;
}

/// Observer that sees every command before it executes.
pub trait CommandReceiver<C>: Send + Sync {
    fn add_command(&self, command: &C);
}

/// Continuation handed to a middleware stage: a cursor over the stages that
/// have not run yet, ending at the handler.
pub struct Next<'a, C: Command> {
    stages: &'a [Box<dyn CommandMiddleware<C>>],
    handler: &'a dyn CommandHandler<C>,
}

impl<'a, C: Command> Next<'a, C> {
    pub(crate) fn new(
        stages: &'a [Box<dyn CommandMiddleware<C>>],
        handler: &'a dyn CommandHandler<C>,
    ) -> Self {
        Self { stages, handler }
    }

    /// Number of stages still ahead of the handler
    pub fn remaining(&self) -> usize {
        self.stages.len()
    }

    pub async fn run(self, command: C, ct: &CancellationToken) -> Result<C::Output, CommandError> {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                stage
                    .execute(command, Next::new(rest, self.handler), ct)
                    .await
            }
            None => self.handler.execute(command, ct).await,
        }
    }
}
