//! Generic processors, handler and middleware exercised by the checker
//! endpoints. Each one proves it ran by flipping a flag or leaving a trace.

use async_trait::async_trait;
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use super::models::GenericProcessorRequest;
use crate::commands::{Command, CommandError, CommandHandler, CommandMiddleware, Next};
use crate::generics::{OpenGeneric, ParamRole, TypeIdentity};
use crate::processors::{PostContext, PostProcessor, PreContext, PreProcessor, ProcessorError};

/// Records whether the generic post-processor has run since it was last
/// checked. Owned by the app state rather than living in a static, so
/// separate app instances never see each other's runs.
#[derive(Debug, Default)]
pub struct ProcessorProbe {
    post_processor_ran: AtomicBool,
}

impl ProcessorProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_post_processor_ran(&self) {
        self.post_processor_ran.store(true, Ordering::SeqCst);
    }

    /// Read and reset the flag.
    pub fn take(&self) -> bool {
        self.post_processor_ran.swap(false, Ordering::SeqCst)
    }
}

pub struct AotGenericPreProcessorTemplate;

impl OpenGeneric for AotGenericPreProcessorTemplate {
    const TEMPLATE: &'static str = "AotGenericPreProcessor";
    const ROLES: &'static [ParamRole] = &[ParamRole::Request];
}

pub struct AotGenericPostProcessorTemplate;

impl OpenGeneric for AotGenericPostProcessorTemplate {
    const TEMPLATE: &'static str = "AotGenericPostProcessor";
    const ROLES: &'static [ParamRole] = &[ParamRole::Request, ParamRole::Response];
}

pub struct GenericEchoHandlerTemplate;

impl OpenGeneric for GenericEchoHandlerTemplate {
    const TEMPLATE: &'static str = "GenericEchoHandler";
    const ROLES: &'static [ParamRole] = &[ParamRole::Command];
}

/// Pre-processor usable with any request type. Marks
/// [`GenericProcessorRequest`]s it sees; other requests pass untouched.
pub struct AotGenericPreProcessor<Req> {
    _request: PhantomData<fn() -> Req>,
}

impl<Req> AotGenericPreProcessor<Req> {
    pub fn new() -> Self {
        Self {
            _request: PhantomData,
        }
    }
}

impl<Req> Default for AotGenericPreProcessor<Req> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<Req> PreProcessor<Req> for AotGenericPreProcessor<Req>
where
    Req: Any + Send + Sync,
{
    async fn pre_process(
        &self,
        ctx: &mut PreContext<'_, Req>,
        _ct: &CancellationToken,
    ) -> Result<(), ProcessorError> {
        let request: &mut (dyn Any + Send) = &mut *ctx.request;
        if let Some(request) = request.downcast_mut::<GenericProcessorRequest>() {
            request.pre_processor_ran = true;
        }
        Ok(())
    }
}

/// Post-processor usable with any request/response pair. The response is
/// already fixed, so it reports through the [`ProcessorProbe`].
pub struct AotGenericPostProcessor<Req, Res> {
    probe: Arc<ProcessorProbe>,
    _types: PhantomData<fn() -> (Req, Res)>,
}

impl<Req, Res> AotGenericPostProcessor<Req, Res> {
    pub fn new(probe: Arc<ProcessorProbe>) -> Self {
        Self {
            probe,
            _types: PhantomData,
        }
    }
}

#[async_trait]
impl<Req, Res> PostProcessor<Req, Res> for AotGenericPostProcessor<Req, Res>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
{
    async fn post_process(
        &self,
        ctx: &PostContext<'_, Req, Res>,
        _ct: &CancellationToken,
    ) -> Result<(), ProcessorError> {
        tracing::debug!(endpoint = ctx.endpoint, "Generic post-processor ran");
        self.probe.mark_post_processor_ran();
        Ok(())
    }
}

/// Outcome of an echo-style command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoOutcome {
    pub message: String,
    pub handled_by: String,
    pub trace: Vec<String>,
}

/// Commands a [`GenericEchoHandler`] can answer.
pub trait Echo: Command<Output = EchoOutcome> {
    fn into_parts(self) -> (String, Vec<String>);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoCommand {
    pub message: String,
    /// Stages append their name on the way in
    pub trace: Vec<String>,
}

impl EchoCommand {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: Vec::new(),
        }
    }
}

impl Command for EchoCommand {
    type Output = EchoOutcome;
}

impl Echo for EchoCommand {
    fn into_parts(self) -> (String, Vec<String>) {
        (self.message, self.trace)
    }
}

pub struct GenericEchoHandler<C> {
    _command: PhantomData<fn() -> C>,
}

impl<C> GenericEchoHandler<C> {
    pub fn new() -> Self {
        Self {
            _command: PhantomData,
        }
    }
}

impl<C> Default for GenericEchoHandler<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<C: Echo> CommandHandler<C> for GenericEchoHandler<C> {
    async fn execute(&self, command: C, ct: &CancellationToken) -> Result<EchoOutcome, CommandError> {
        if ct.is_cancelled() {
            return Err(CommandError::Cancelled);
        }

        let (message, trace) = command.into_parts();
        Ok(EchoOutcome {
            message,
            handled_by: TypeIdentity::of::<Self>().short_name(),
            trace,
        })
    }
}

/// Outermost stage: logs the command and refuses cancelled work.
pub struct TracingStage;

#[async_trait]
impl CommandMiddleware<EchoCommand> for TracingStage {
    async fn execute(
        &self,
        mut command: EchoCommand,
        next: Next<'_, EchoCommand>,
        ct: &CancellationToken,
    ) -> Result<EchoOutcome, CommandError> {
        if ct.is_cancelled() {
            return Err(CommandError::Cancelled);
        }

        tracing::info!(text = %command.message, remaining = next.remaining(), "Echo command received");
        command.trace.push("tracing".to_string());
        let result = next.run(command, ct).await;
        tracing::info!(ok = result.is_ok(), "Echo command finished");
        result
    }
}

/// Times the rest of the chain. Holds per-call state, so a fresh instance
/// is built for every invocation.
pub struct TimingStage {
    created: Instant,
}

impl TimingStage {
    pub fn new() -> Self {
        Self {
            created: Instant::now(),
        }
    }
}

impl Default for TimingStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandMiddleware<EchoCommand> for TimingStage {
    async fn execute(
        &self,
        mut command: EchoCommand,
        next: Next<'_, EchoCommand>,
        ct: &CancellationToken,
    ) -> Result<EchoOutcome, CommandError> {
        command.trace.push("timing".to_string());
        let result = next.run(command, ct).await;
        tracing::debug!(elapsed_us = self.created.elapsed().as_micros() as u64, "Echo command timed");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::GenericProcessorResponse;

    #[tokio::test]
    async fn test_pre_processor_marks_only_its_request_type() {
        let ct = CancellationToken::new();

        let mut request = GenericProcessorRequest::default();
        let processor = AotGenericPreProcessor::<GenericProcessorRequest>::new();
        let mut ctx = PreContext {
            endpoint: "test",
            request: &mut request,
        };
        processor.pre_process(&mut ctx, &ct).await.unwrap();
        assert!(request.pre_processor_ran);

        let mut other = String::from("untouched");
        let processor = AotGenericPreProcessor::<String>::new();
        let mut ctx = PreContext {
            endpoint: "test",
            request: &mut other,
        };
        processor.pre_process(&mut ctx, &ct).await.unwrap();
        assert_eq!(other, "untouched");
    }

    #[tokio::test]
    async fn test_post_processor_reports_through_probe() {
        let probe = Arc::new(ProcessorProbe::new());
        let processor =
            AotGenericPostProcessor::<GenericProcessorRequest, GenericProcessorResponse>::new(probe.clone());

        let request = GenericProcessorRequest::default();
        let response = GenericProcessorResponse {
            output: String::new(),
            pre_processor_ran: false,
            post_processor_ran: false,
        };
        let ctx = PostContext {
            endpoint: "test",
            request: &request,
            response: &response,
        };
        processor.post_process(&ctx, &CancellationToken::new()).await.unwrap();

        assert!(probe.take());
        assert!(!probe.take());
    }

    #[tokio::test]
    async fn test_echo_handler_reports_closed_type() {
        let handler = GenericEchoHandler::<EchoCommand>::new();
        let outcome = handler
            .execute(EchoCommand::new("hi"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.message, "hi");
        assert_eq!(outcome.handled_by, "GenericEchoHandler<EchoCommand>");
    }
}
