use crate::{
    api::handlers::types::{ErrorBody, error_response},
    auth::{AccessToken, AuthError, AuthService},
};
use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::{StatusCode, header::CACHE_CONTROL},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error, instrument};

const EXPECTED_CREDENTIALS: &str = "Expected [username, password]";

#[utoipa::path(
    post,
    path= "/token",
    request_body(content = [String], description = "Two-element array: [username, password]"),
    responses (
        (status = 200, description = "Access token issued", body = AccessToken, content_type = "application/json"),
        (status = 400, description = "Invalid username or password, or malformed body", body = ErrorBody),
        (status = 500, description = "Credential store or signing failure", body = ErrorBody),
    ),
    tag= "token"
)]
#[instrument(skip(service, payload))]
pub async fn token(
    service: Extension<Arc<AuthService>>,
    payload: Result<Json<(String, String)>, JsonRejection>,
) -> Response {
    let (username, password) = match payload {
        Ok(Json(credentials)) => credentials,
        Err(rejection) => {
            debug!("Rejected token payload: {}", rejection);
            return error_response(StatusCode::BAD_REQUEST, EXPECTED_CREDENTIALS);
        }
    };

    match service.issue_token(&username, &password).await {
        Ok(token) => (
            StatusCode::OK,
            [(CACHE_CONTROL, "no-store")],
            Json(token),
        )
            .into_response(),
        Err(e @ AuthError::InvalidCredentials) => {
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => {
            error!("Error issuing token: {:?}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Error issuing token")
        }
    }
}
