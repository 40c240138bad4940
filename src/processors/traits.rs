use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("processing cancelled")]
    Cancelled,
    #[error("processor failed: {0}")]
    Failed(String),
}

/// Where a group of processors goes relative to those already configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Before,
    After,
}

/// What a pre-processor sees: the bound request, mutable.
pub struct PreContext<'a, Req> {
    pub endpoint: &'a str,
    pub request: &'a mut Req,
}

/// What a post-processor sees: request and response, both read-only.
pub struct PostContext<'a, Req, Res> {
    pub endpoint: &'a str,
    pub request: &'a Req,
    pub response: &'a Res,
}

/// Runs before the endpoint handler and may change the request.
#[async_trait]
pub trait PreProcessor<Req: Send + Sync>: Send + Sync {
    async fn pre_process(
        &self,
        ctx: &mut PreContext<'_, Req>,
        ct: &CancellationToken,
    ) -> Result<(), ProcessorError>;
}

/// Runs once the response has been produced.
///
/// The response is already fixed at this point; a post-processor can only
/// record side effects.
#[async_trait]
pub trait PostProcessor<Req: Send + Sync, Res: Send + Sync>: Send + Sync {
    async fn post_process(
        &self,
        ctx: &PostContext<'_, Req, Res>,
        ct: &CancellationToken,
    ) -> Result<(), ProcessorError>;
}

pub type SharedPreProcessor<Req> = Arc<dyn PreProcessor<Req>>;
pub type SharedPostProcessor<Req, Res> = Arc<dyn PostProcessor<Req, Res>>;
