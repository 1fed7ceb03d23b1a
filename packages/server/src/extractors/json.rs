use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Body of a form post, sent as JSON in the shape of the view-model.
///
/// Malformed bodies become `AppError::Validation` so the client always gets
/// the structured error body instead of axum's plain-text rejection.
pub struct FormBody<T>(pub T);

impl<S, T> FromRequest<S> for FormBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(FormBody(value)),
            Err(rejection) => {
                tracing::debug!(status = %rejection.status(), "Rejected form body");
                Err(AppError::Validation(rejection.body_text()))
            }
        }
    }
}
