//! Custom Axum extractors.

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

/// JSON body extractor whose rejection is a `VALIDATION_ERROR` envelope.
///
/// The stock `Json<T>` extractor answers malformed or mistyped bodies with
/// a plain-text rejection; this wrapper keeps the uniform envelope on the
/// validation path instead.
///
/// # Example
///
/// ```ignore
/// async fn create_todo(
///     State(state): State<AppState>,
///     ValidJson(request): ValidJson<CreateTodoRequest>,
/// ) -> Result<Json<ApiResponse<Todo>>, ApiError> { ... }
/// ```
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::validation(rejection.body_text())),
        }
    }
}
