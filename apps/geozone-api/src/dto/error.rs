//! Error body shared by every endpoint

use serde::Serialize;
use utoipa::ToSchema;

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error category
    #[schema(example = "not_found")]
    pub kind: String,
    /// Error description
    #[schema(example = "Not found: no match for '없는 주소'")]
    pub error: String,
}
