//! Registration, sign-in and password endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use shop::{
    AuthSession, ChangePasswordInput, RegisterInput, ResetPasswordInput, SignInInput,
    SignInOutcome,
};
use store::Store;

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::state::AppState;

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NotRegisteredResponse {
    user_registered: bool,
}

/// POST /api/auth/register
pub async fn register<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthSession>), ApiError> {
    let Json(input) = payload?;
    let session = state.accounts.register(input).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// POST /api/auth/signin
///
/// An unknown email is not an error: the response tells the client to offer
/// registration instead.
pub async fn sign_in<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<SignInInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = payload?;
    let response = match state.accounts.sign_in(input).await? {
        SignInOutcome::Authenticated(session) => Json(session).into_response(),
        SignInOutcome::NotRegistered => Json(NotRegisteredResponse {
            user_registered: false,
        })
        .into_response(),
    };
    Ok(response)
}

/// POST /api/auth/change-password
pub async fn change_password<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    user: AuthUser,
    payload: Result<Json<ChangePasswordInput>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(input) = payload?;
    state.accounts.change_password(user.id(), input).await?;
    Ok(Json(MessageResponse {
        message: "Password updated",
    }))
}

/// POST /api/auth/reset-password
pub async fn reset_password<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<ResetPasswordInput>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(input) = payload?;
    state.accounts.reset_password(input).await?;
    Ok(Json(MessageResponse {
        message: "Password reset",
    }))
}
