//! Signed upload endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use shop::{SignUploadInput, SignedUpload};
use store::Store;

use crate::error::ApiError;
use crate::extract::AdminUser;
use crate::state::AppState;

/// POST /api/uploads/sign
///
/// An empty body signs `upload.bin` as `application/octet-stream`.
#[tracing::instrument(skip(state, payload))]
pub async fn sign<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    _admin: AdminUser,
    payload: Result<Json<SignUploadInput>, JsonRejection>,
) -> Result<Json<SignedUpload>, ApiError> {
    let input = match payload {
        Ok(Json(input)) => input,
        Err(JsonRejection::MissingJsonContentType(_)) => SignUploadInput::default(),
        Err(rejection) => return Err(rejection.into()),
    };
    Ok(Json(state.uploads.sign(input).await?))
}
