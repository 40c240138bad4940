use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::traits::{
    Command, CommandError, CommandMiddleware, CommandReceiver, Next, SharedCommandHandler,
};
use crate::generics::{ClosingArguments, HandlerResolver, HandlerType};

pub type MiddlewareFactory<C> = Arc<dyn Fn() -> Box<dyn CommandMiddleware<C>> + Send + Sync>;

/// Runs one command type through its middleware chain and handler.
///
/// The chain is fixed when the executor is built. Stage instances are created
/// fresh for every invocation since they may hold per-call state.
pub struct CommandExecutor<C: Command> {
    middlewares: Vec<MiddlewareFactory<C>>,
    receiver: Option<Arc<dyn CommandReceiver<C>>>,
    test_handler: Option<SharedCommandHandler<C>>,
    resolver: Arc<HandlerResolver>,
}

impl<C: Command> CommandExecutor<C> {
    pub fn builder(resolver: Arc<HandlerResolver>) -> CommandExecutorBuilder<C> {
        CommandExecutorBuilder {
            middlewares: Vec::new(),
            receiver: None,
            test_handler: None,
            resolver,
        }
    }

    pub fn middleware_count(&self) -> usize {
        self.middlewares.len()
    }

    /// Execute `command` with the handler named by `handler_type`.
    ///
    /// Stages run in registration order on the way in and in reverse on the
    /// way out. Errors from any stage or the handler propagate unchanged.
    pub async fn execute(
        &self,
        command: C,
        handler_type: &HandlerType,
        ct: &CancellationToken,
    ) -> Result<C::Output, CommandError> {
        if let Some(receiver) = &self.receiver {
            receiver.add_command(&command);
        }

        let handler = match &self.test_handler {
            Some(handler) => handler.clone(),
            None => self
                .resolver
                .create_handler::<SharedCommandHandler<C>>(handler_type, &ClosingArguments::of::<C>())?,
        };

        let stages: Vec<Box<dyn CommandMiddleware<C>>> =
            self.middlewares.iter().map(|make| make()).collect();

        tracing::debug!(
            command = std::any::type_name::<C>(),
            handler = %handler_type.closed(),
            stages = stages.len(),
            "Executing command"
        );

        let result = Next::new(&stages, handler.as_ref()).run(command, ct).await;

        let metrics = self.resolver.metrics();
        match &result {
            Ok(_) => metrics.command_executed(),
            Err(e) => {
                metrics.command_failed();
                tracing::debug!(command = std::any::type_name::<C>(), error = %e, "Command failed");
            }
        }

        result
    }
}

pub struct CommandExecutorBuilder<C: Command> {
    middlewares: Vec<MiddlewareFactory<C>>,
    receiver: Option<Arc<dyn CommandReceiver<C>>>,
    test_handler: Option<SharedCommandHandler<C>>,
    resolver: Arc<HandlerResolver>,
}

impl<C: Command> CommandExecutorBuilder<C> {
    /// Append a stage. The first stage added is the outermost.
    pub fn middleware<M, F>(mut self, make: F) -> Self
    where
        M: CommandMiddleware<C> + 'static,
        F: Fn() -> M + Send + Sync + 'static,
    {
        self.middlewares
            .push(Arc::new(move || Box::new(make()) as Box<dyn CommandMiddleware<C>>));
        self
    }

    pub fn receiver(mut self, receiver: Arc<dyn CommandReceiver<C>>) -> Self {
        self.receiver = Some(receiver);
        self
    }

    /// Bypass handler resolution and always use `handler`.
    pub fn test_handler(mut self, handler: SharedCommandHandler<C>) -> Self {
        self.test_handler = Some(handler);
        self
    }

    pub fn build(self) -> CommandExecutor<C> {
        CommandExecutor {
            middlewares: self.middlewares,
            receiver: self.receiver,
            test_handler: self.test_handler,
            resolver: self.resolver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::recorder::CommandRecorder;
    use crate::commands::traits::CommandHandler;
    use crate::generics::{
        Factory, GenericTypeRegistry, OpenGeneric, ParamRole, ResolveError, TypeIdentity,
    };
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Log = Arc<Mutex<Vec<String>>>;

    #[derive(Debug, Clone, PartialEq)]
    struct Greet {
        name: String,
    }

    impl Command for Greet {
        type Output = String;
    }

    #[derive(Default)]
    struct GreetHandler {
        log: Option<Log>,
    }

    #[async_trait]
    impl CommandHandler<Greet> for GreetHandler {
        async fn execute(&self, command: Greet, _ct: &CancellationToken) -> Result<String, CommandError> {
            if let Some(log) = &self.log {
                log.lock().push("handler".to_string());
            }
            Ok(format!("hello {}", command.name))
        }
    }

    struct GreetTemplate;

    impl OpenGeneric for GreetTemplate {
        const TEMPLATE: &'static str = "GreetHandler";
        const ROLES: &'static [ParamRole] = &[ParamRole::Command];
    }

    struct Recording {
        name: &'static str,
        log: Log,
    }

    #[async_trait]
    impl CommandMiddleware<Greet> for Recording {
        async fn execute(
            &self,
            command: Greet,
            next: Next<'_, Greet>,
            ct: &CancellationToken,
        ) -> Result<String, CommandError> {
            self.log.lock().push(format!("{}-before", self.name));
            let result = next.run(command, ct).await;
            self.log.lock().push(format!("{}-after", self.name));
            result
        }
    }

    struct ShortCircuit;

    #[async_trait]
    impl CommandMiddleware<Greet> for ShortCircuit {
        async fn execute(
            &self,
            _command: Greet,
            _next: Next<'_, Greet>,
            _ct: &CancellationToken,
        ) -> Result<String, CommandError> {
            Ok("short-circuited".to_string())
        }
    }

    struct Shout;

    #[async_trait]
    impl CommandMiddleware<Greet> for Shout {
        async fn execute(
            &self,
            command: Greet,
            next: Next<'_, Greet>,
            ct: &CancellationToken,
        ) -> Result<String, CommandError> {
            let forwarded = Greet {
                name: command.name.to_uppercase(),
            };
            let output = next.run(forwarded, ct).await?;
            Ok(format!("{output}!"))
        }
    }

    struct CancelGuard {
        seen: Arc<Mutex<Vec<bool>>>,
        abort: bool,
    }

    #[async_trait]
    impl CommandMiddleware<Greet> for CancelGuard {
        async fn execute(
            &self,
            command: Greet,
            next: Next<'_, Greet>,
            ct: &CancellationToken,
        ) -> Result<String, CommandError> {
            self.seen.lock().push(ct.is_cancelled());
            if self.abort && ct.is_cancelled() {
                return Err(CommandError::Cancelled);
            }
            next.run(command, ct).await
        }
    }

    struct Failing;

    #[async_trait]
    impl CommandHandler<Greet> for Failing {
        async fn execute(&self, _command: Greet, _ct: &CancellationToken) -> Result<String, CommandError> {
            Err(CommandError::Handler("boom".to_string()))
        }
    }

    fn resolver_with_handler(log: Option<Log>) -> Arc<HandlerResolver> {
        let mut builder = GenericTypeRegistry::builder();
        builder
            .register(
                GreetTemplate::open_key(),
                ClosingArguments::of::<Greet>(),
                Factory::new::<GreetHandler, _, _>(move || {
                    Arc::new(GreetHandler { log: log.clone() }) as SharedCommandHandler<Greet>
                }),
            )
            .unwrap();
        Arc::new(HandlerResolver::ahead_of_time(Arc::new(builder.freeze())))
    }

    fn greet_handler_type() -> HandlerType {
        HandlerType::generic::<GreetHandler, GreetTemplate>()
    }

    fn greet(name: &str) -> Greet {
        Greet {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_no_middleware_returns_handler_result() {
        let executor = CommandExecutor::<Greet>::builder(resolver_with_handler(None)).build();

        let output = executor
            .execute(greet("ada"), &greet_handler_type(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(output, "hello ada");
    }

    #[tokio::test]
    async fn test_middleware_nesting_order() {
        let log: Log = Arc::default();
        let (a, b, c) = (log.clone(), log.clone(), log.clone());

        let executor = CommandExecutor::<Greet>::builder(resolver_with_handler(Some(log.clone())))
            .middleware(move || Recording { name: "A", log: a.clone() })
            .middleware(move || Recording { name: "B", log: b.clone() })
            .middleware(move || Recording { name: "C", log: c.clone() })
            .build();
        assert_eq!(executor.middleware_count(), 3);

        executor
            .execute(greet("ada"), &greet_handler_type(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            *log.lock(),
            vec![
                "A-before", "B-before", "C-before", "handler", "C-after", "B-after", "A-after"
            ]
        );
    }

    #[tokio::test]
    async fn test_short_circuit_skips_inner_stages_and_handler() {
        let log: Log = Arc::default();
        let (outer, inner) = (log.clone(), log.clone());

        let executor = CommandExecutor::<Greet>::builder(resolver_with_handler(Some(log.clone())))
            .middleware(move || Recording { name: "outer", log: outer.clone() })
            .middleware(|| ShortCircuit)
            .middleware(move || Recording { name: "inner", log: inner.clone() })
            .build();

        let output = executor
            .execute(greet("ada"), &greet_handler_type(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output, "short-circuited");
        assert_eq!(*log.lock(), vec!["outer-before", "outer-after"]);
    }

    #[tokio::test]
    async fn test_stage_can_transform_command_and_result() {
        let executor = CommandExecutor::<Greet>::builder(resolver_with_handler(None))
            .middleware(|| Shout)
            .build();

        let output = executor
            .execute(greet("ada"), &greet_handler_type(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(output, "hello ADA!");
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_reaches_every_stage() {
        let seen: Arc<Mutex<Vec<bool>>> = Arc::default();
        let (outer, inner) = (seen.clone(), seen.clone());

        let executor = CommandExecutor::<Greet>::builder(resolver_with_handler(None))
            .middleware(move || CancelGuard { seen: outer.clone(), abort: false })
            .middleware(move || CancelGuard { seen: inner.clone(), abort: true })
            .build();

        let ct = CancellationToken::new();
        ct.cancel();

        let result = executor.execute(greet("ada"), &greet_handler_type(), &ct).await;
        assert!(matches!(result, Err(CommandError::Cancelled)));
        assert_eq!(*seen.lock(), vec![true, true]);
    }

    #[tokio::test]
    async fn test_handler_error_propagates_and_receiver_still_records() {
        let recorder = Arc::new(CommandRecorder::<Greet>::new());
        let log: Log = Arc::default();
        let outer = log.clone();

        let executor = CommandExecutor::<Greet>::builder(resolver_with_handler(None))
            .middleware(move || Recording { name: "A", log: outer.clone() })
            .receiver(recorder.clone())
            .test_handler(Arc::new(Failing))
            .build();

        let result = executor
            .execute(greet("ada"), &greet_handler_type(), &CancellationToken::new())
            .await;

        match result {
            Err(CommandError::Handler(message)) => assert_eq!(message, "boom"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(recorder.recorded(), vec![greet("ada")]);
        assert_eq!(*log.lock(), vec!["A-before", "A-after"]);
    }

    #[tokio::test]
    async fn test_stage_instances_are_created_per_call() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let log: Log = Arc::default();

        let executor = CommandExecutor::<Greet>::builder(resolver_with_handler(None))
            .middleware(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Recording { name: "A", log: log.clone() }
            })
            .build();

        for _ in 0..3 {
            executor
                .execute(greet("ada"), &greet_handler_type(), &CancellationToken::new())
                .await
                .unwrap();
        }
        assert_eq!(created.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unresolvable_handler_is_configuration_error() {
        let empty = Arc::new(HandlerResolver::ahead_of_time(Arc::new(
            GenericTypeRegistry::builder().freeze(),
        )));
        let executor = CommandExecutor::<Greet>::builder(empty).build();

        let result = executor
            .execute(greet("ada"), &greet_handler_type(), &CancellationToken::new())
            .await;
        assert!(matches!(
            result,
            Err(CommandError::Resolve(ResolveError::Configuration { .. }))
        ));
    }

    #[test]
    fn test_handler_type_names_closed_handler() {
        assert_eq!(greet_handler_type().closed(), TypeIdentity::of::<GreetHandler>());
    }
}
