use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderName, StatusCode, header},
    response::IntoResponse,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{
    error::ApiError,
    models::{
        CachedResponse, EchoRequest, EchoResponse, FromHeaderResponse, GenericProcessorRequest,
        GenericProcessorResponse, NullableEnumQueryRequest, NullableEnumQueryResponse,
        RegistryEntryView, VerifyPostProcessorResponse,
    },
    probes::EchoCommand,
    state::AppState,
};
use crate::generics::RegistryEntry;

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";
pub const TENANT_ID_HEADER: &str = "x-tenant-id";
const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache");

/// Token for one request. Cancelled when the handler future is dropped,
/// which is what happens when the client disconnects.
fn request_token() -> (CancellationToken, tokio_util::sync::DropGuard) {
    let ct = CancellationToken::new();
    let guard = ct.clone().drop_guard();
    (ct, guard)
}

/// Generic pre/post processor endpoint (POST /generic-processor)
///
/// Both processors are closed over this endpoint's request and response
/// types at startup. The pre-processor marks the request before the body
/// is built; the post-processor runs after and reports through the probe,
/// checked with `GET /verify-post-processor`.
pub async fn generic_processor(
    State(state): State<AppState>,
    Json(mut request): Json<GenericProcessorRequest>,
) -> Result<Json<GenericProcessorResponse>, ApiError> {
    let (ct, _guard) = request_token();

    state.processors.run_pre(&mut request, &ct).await?;

    let response = GenericProcessorResponse {
        output: format!("Processed: {}", request.input),
        pre_processor_ran: request.pre_processor_ran,
        post_processor_ran: request.post_processor_ran,
    };

    // The response is already produced; a failing post-processor is only logged.
    if let Err(e) = state.processors.run_post(&request, &response, &ct).await {
        tracing::error!(
            endpoint = state.processors.endpoint(),
            error = %e,
            "Post-processor failed"
        );
    }

    Ok(Json(response))
}

/// Report whether the post-processor ran since the last check, then reset.
pub async fn verify_post_processor(State(state): State<AppState>) -> impl IntoResponse {
    Json(VerifyPostProcessorResponse {
        post_processor_ran: state.probe.take(),
    })
}

pub async fn nullable_enum_query(
    Query(query): Query<NullableEnumQueryRequest>,
) -> Json<NullableEnumQueryResponse> {
    tracing::debug!(?query, "Bound enum query");
    Json(query.into())
}

pub async fn from_header_binding(headers: HeaderMap) -> Result<Json<FromHeaderResponse>, ApiError> {
    let correlation_id = required_header(&headers, CORRELATION_ID_HEADER)?;
    let tenant_id = required_header(&headers, TENANT_ID_HEADER)?;

    Ok(Json(FromHeaderResponse {
        correlation_id,
        tenant_id,
        all_headers_bound: true,
    }))
}

fn required_header(headers: &HeaderMap, name: &'static str) -> Result<String, ApiError> {
    let value = headers.get(name).ok_or(ApiError::MissingHeader(name))?;
    value
        .to_str()
        .map(str::to_owned)
        .map_err(|_| ApiError::InvalidPayload(format!("{name} header is not valid ASCII")))
}

/// Cached response (GET /response-caching)
///
/// The body is generated once and served until it is older than the
/// configured max-age; `x-cache` tells whether this call was a hit.
pub async fn response_caching(State(state): State<AppState>) -> impl IntoResponse {
    let (body, hit) = state.cache.get_or_insert_with(|| CachedResponse {
        data: format!("Generated at {}", chrono::Utc::now().to_rfc3339()),
        unique_id: Uuid::new_v4().to_string(),
    });

    tracing::debug!(hit, unique_id = %body.unique_id, "Response cache lookup");

    (
        [
            (header::CACHE_CONTROL, state.cache.cache_control()),
            (CACHE_STATUS_HEADER, if hit { "HIT" } else { "MISS" }.to_string()),
        ],
        Json(body),
    )
}

/// Echo a message through the command bus (POST /generic-command)
pub async fn generic_command(
    State(state): State<AppState>,
    Json(request): Json<EchoRequest>,
) -> Result<Json<EchoResponse>, ApiError> {
    let (ct, _guard) = request_token();

    let outcome = state.bus.send(EchoCommand::new(request.message), &ct).await?;

    Ok(Json(EchoResponse {
        message: outcome.message,
        handled_by: outcome.handled_by,
        trace: outcome.trace,
    }))
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}

/// List the registration table (GET /operators/registry)
pub async fn registry(State(state): State<AppState>) -> Json<Vec<RegistryEntryView>> {
    let entries = state
        .resolver
        .registry()
        .entries()
        .into_iter()
        .map(RegistryEntryView::from)
        .collect();

    Json(entries)
}

impl From<RegistryEntry<'_>> for RegistryEntryView {
    fn from(entry: RegistryEntry<'_>) -> Self {
        Self {
            template: entry.key.to_string(),
            closing_arguments: entry.args.iter().map(|arg| arg.short_name()).collect(),
            closed_type: entry.factory.closed_type().short_name(),
        }
    }
}
