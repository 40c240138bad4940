use tokio_util::sync::CancellationToken;

use super::traits::{
    Order, PostContext, PreContext, ProcessorError, SharedPostProcessor, SharedPreProcessor,
};
use crate::generics::{ClosingArguments, HandlerResolver, OpenTypeKey, ResolveError};

/// Pre/post processors configured for one endpoint.
///
/// Built once when the endpoint is configured; the processor instances are
/// shared by every request.
pub struct ProcessorPipeline<Req, Res> {
    endpoint: String,
    pre: Vec<SharedPreProcessor<Req>>,
    post: Vec<SharedPostProcessor<Req, Res>>,
}

impl<Req, Res> ProcessorPipeline<Req, Res>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
{
    pub fn builder<'r>(
        endpoint: impl Into<String>,
        resolver: &'r HandlerResolver,
    ) -> ProcessorPipelineBuilder<'r, Req, Res> {
        ProcessorPipelineBuilder {
            endpoint: endpoint.into(),
            resolver,
            pre: Vec::new(),
            post: Vec::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn pre_count(&self) -> usize {
        self.pre.len()
    }

    pub fn post_count(&self) -> usize {
        self.post.len()
    }

    /// Run pre-processors in order, stopping at the first error.
    pub async fn run_pre(&self, request: &mut Req, ct: &CancellationToken) -> Result<(), ProcessorError> {
        for processor in &self.pre {
            let mut ctx = PreContext {
                endpoint: &self.endpoint,
                request: &mut *request,
            };
            processor.pre_process(&mut ctx, ct).await?;
        }
        Ok(())
    }

    /// Run post-processors in order, stopping at the first error.
    pub async fn run_post(
        &self,
        request: &Req,
        response: &Res,
        ct: &CancellationToken,
    ) -> Result<(), ProcessorError> {
        let ctx = PostContext {
            endpoint: &self.endpoint,
            request,
            response,
        };
        for processor in &self.post {
            processor.post_process(&ctx, ct).await?;
        }
        Ok(())
    }
}

pub struct ProcessorPipelineBuilder<'r, Req, Res> {
    endpoint: String,
    resolver: &'r HandlerResolver,
    pre: Vec<SharedPreProcessor<Req>>,
    post: Vec<SharedPostProcessor<Req, Res>>,
}

impl<'r, Req, Res> ProcessorPipelineBuilder<'r, Req, Res>
where
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
{
    /// Close each open pre-processor template over `Req`.
    pub fn pre_processors(mut self, order: Order, templates: &[OpenTypeKey]) -> Result<Self, ResolveError> {
        let args = ClosingArguments::of::<Req>();
        let resolved = templates
            .iter()
            .map(|key| self.resolver.create::<SharedPreProcessor<Req>>(key, &args))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(endpoint = %self.endpoint, count = resolved.len(), ?order, "Pre-processors resolved");
        place(&mut self.pre, order, resolved);
        Ok(self)
    }

    /// Close each open post-processor template over `(Req, Res)`.
    pub fn post_processors(mut self, order: Order, templates: &[OpenTypeKey]) -> Result<Self, ResolveError> {
        let args = ClosingArguments::pair::<Req, Res>();
        let resolved = templates
            .iter()
            .map(|key| self.resolver.create::<SharedPostProcessor<Req, Res>>(key, &args))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(endpoint = %self.endpoint, count = resolved.len(), ?order, "Post-processors resolved");
        place(&mut self.post, order, resolved);
        Ok(self)
    }

    /// Add an already-closed pre-processor instance.
    pub fn pre_processor(mut self, order: Order, processor: SharedPreProcessor<Req>) -> Self {
        place(&mut self.pre, order, vec![processor]);
        self
    }

    /// Add an already-closed post-processor instance.
    pub fn post_processor(mut self, order: Order, processor: SharedPostProcessor<Req, Res>) -> Self {
        place(&mut self.post, order, vec![processor]);
        self
    }

    pub fn build(self) -> ProcessorPipeline<Req, Res> {
        ProcessorPipeline {
            endpoint: self.endpoint,
            pre: self.pre,
            post: self.post,
        }
    }
}

fn place<T>(list: &mut Vec<T>, order: Order, group: Vec<T>) {
    match order {
        Order::Before => {
            list.splice(0..0, group);
        }
        Order::After => list.extend(group),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generics::{GenericTypeRegistry, OpenGeneric, ParamRole};
    use crate::processors::traits::{PostProcessor, PreProcessor};
    use crate::processors::{register_post_processor, register_pre_processor};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct Req {
        trail: Vec<String>,
    }

    #[derive(Debug)]
    struct Res;

    struct Tag(&'static str);

    #[async_trait]
    impl PreProcessor<Req> for Tag {
        async fn pre_process(&self, ctx: &mut PreContext<'_, Req>, _ct: &CancellationToken) -> Result<(), ProcessorError> {
            ctx.request.trail.push(self.0.to_string());
            Ok(())
        }
    }

    struct Fail;

    #[async_trait]
    impl PreProcessor<Req> for Fail {
        async fn pre_process(&self, _ctx: &mut PreContext<'_, Req>, _ct: &CancellationToken) -> Result<(), ProcessorError> {
            Err(ProcessorError::Failed("nope".to_string()))
        }
    }

    struct Audit(Arc<Mutex<Vec<String>>>);

    #[async_trait]
    impl PostProcessor<Req, Res> for Audit {
        async fn post_process(&self, ctx: &PostContext<'_, Req, Res>, _ct: &CancellationToken) -> Result<(), ProcessorError> {
            self.0.lock().push(format!("{}:{}", ctx.endpoint, ctx.request.trail.join(",")));
            Ok(())
        }
    }

    struct TagTemplate;

    impl OpenGeneric for TagTemplate {
        const TEMPLATE: &'static str = "Tag";
        const ROLES: &'static [ParamRole] = &[ParamRole::Request];
    }

    struct AuditTemplate;

    impl OpenGeneric for AuditTemplate {
        const TEMPLATE: &'static str = "Audit";
        const ROLES: &'static [ParamRole] = &[ParamRole::Request, ParamRole::Response];
    }

    fn resolver(audit: Arc<Mutex<Vec<String>>>) -> HandlerResolver {
        let mut builder = GenericTypeRegistry::builder();
        register_pre_processor::<TagTemplate, Tag, Req, _>(&mut builder, || Tag("generic")).unwrap();
        register_post_processor::<AuditTemplate, Audit, Req, Res, _>(&mut builder, move || {
            Audit(audit.clone())
        })
        .unwrap();
        HandlerResolver::ahead_of_time(Arc::new(builder.freeze()))
    }

    #[tokio::test]
    async fn test_order_before_and_after_placement() {
        let resolver = resolver(Arc::default());
        let pipeline = ProcessorPipeline::<Req, Res>::builder("orders", &resolver)
            .pre_processor(Order::After, Arc::new(Tag("endpoint")))
            .pre_processors(Order::Before, &[TagTemplate::open_key()])
            .unwrap()
            .pre_processor(Order::After, Arc::new(Tag("last")))
            .build();

        let mut request = Req::default();
        pipeline.run_pre(&mut request, &CancellationToken::new()).await.unwrap();
        assert_eq!(request.trail, vec!["generic", "endpoint", "last"]);
    }

    #[tokio::test]
    async fn test_post_processors_observe_request_and_response() {
        let audit: Arc<Mutex<Vec<String>>> = Arc::default();
        let resolver = resolver(audit.clone());
        let pipeline = ProcessorPipeline::<Req, Res>::builder("orders", &resolver)
            .post_processors(Order::After, &[AuditTemplate::open_key()])
            .unwrap()
            .build();
        assert_eq!(pipeline.post_count(), 1);

        let request = Req {
            trail: vec!["x".to_string()],
        };
        pipeline
            .run_post(&request, &Res, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(*audit.lock(), vec!["orders:x"]);
    }

    #[tokio::test]
    async fn test_pre_error_stops_the_chain() {
        let resolver = resolver(Arc::default());
        let pipeline = ProcessorPipeline::<Req, Res>::builder("orders", &resolver)
            .pre_processor(Order::After, Arc::new(Fail))
            .pre_processor(Order::After, Arc::new(Tag("unreached")))
            .build();

        let mut request = Req::default();
        let result = pipeline.run_pre(&mut request, &CancellationToken::new()).await;
        assert!(matches!(result, Err(ProcessorError::Failed(_))));
        assert!(request.trail.is_empty());
    }

    #[test]
    fn test_unregistered_template_fails_at_build_time() {
        let resolver = resolver(Arc::default());
        let missing = crate::generics::OpenTypeKey::new("Missing", [ParamRole::Request]);
        let result = ProcessorPipeline::<Req, Res>::builder("orders", &resolver)
            .pre_processors(Order::Before, &[missing]);
        assert!(matches!(result, Err(ResolveError::Configuration { .. })));
    }
}
