//! Request and response bodies for the checker endpoints.
//!
//! JSON bodies use camelCase field names. Query parameters accept both the
//! camelCase and the PascalCase spelling (`nullableStatus` / `NullableStatus`).

use serde::{Deserialize, Serialize};

use super::binding::{self, OrderStatus, Permissions, Priority};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericProcessorRequest {
    #[serde(default)]
    pub input: String,
    /// Set by the generic pre-processor
    #[serde(default)]
    pub pre_processor_ran: bool,
    #[serde(default)]
    pub post_processor_ran: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericProcessorResponse {
    pub output: String,
    pub pre_processor_ran: bool,
    pub post_processor_ran: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPostProcessorResponse {
    pub post_processor_ran: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NullableEnumQueryRequest {
    #[serde(default, alias = "Status")]
    pub status: OrderStatus,
    #[serde(default, alias = "NullableStatus", deserialize_with = "binding::optional")]
    pub nullable_status: Option<OrderStatus>,
    #[serde(default, alias = "NullablePriority", deserialize_with = "binding::optional")]
    pub nullable_priority: Option<Priority>,
    #[serde(default, alias = "NullablePermissions", deserialize_with = "binding::optional")]
    pub nullable_permissions: Option<Permissions>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NullableEnumQueryResponse {
    pub status: OrderStatus,
    pub nullable_status: Option<OrderStatus>,
    pub nullable_priority: Option<Priority>,
    pub nullable_permissions: Option<Permissions>,
}

impl From<NullableEnumQueryRequest> for NullableEnumQueryResponse {
    fn from(req: NullableEnumQueryRequest) -> Self {
        Self {
            status: req.status,
            nullable_status: req.nullable_status,
            nullable_priority: req.nullable_priority,
            nullable_permissions: req.nullable_permissions,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FromHeaderResponse {
    pub correlation_id: String,
    pub tenant_id: String,
    pub all_headers_bound: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedResponse {
    pub data: String,
    pub unique_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EchoRequest {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EchoResponse {
    pub message: String,
    /// Closed handler type that produced the response
    pub handled_by: String,
    /// Middleware stages the command passed through, outermost first
    pub trace: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntryView {
    pub template: String,
    pub closing_arguments: Vec<String>,
    pub closed_type: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}
