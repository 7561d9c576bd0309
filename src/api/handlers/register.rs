use crate::{
    api::handlers::types::{ErrorBody, RegisterRequest, error_response},
    auth::{AuthError, AuthService},
    store::{User, ValidationError},
};
use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error, instrument};

#[utoipa::path(
    post,
    path= "/register",
    request_body = RegisterRequest,
    responses (
        (status = 200, description = "Registration successful", body = User, content_type = "application/json"),
        (status = 400, description = "Registration rules violated or username taken", body = [ValidationError]),
        (status = 500, description = "Credential store failure", body = ErrorBody),
    ),
    tag= "register"
)]
#[instrument(skip(service, payload))]
pub async fn register(
    service: Extension<Arc<AuthService>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Rejected registration payload: {}", rejection);
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    debug!("user: {:?}", request.user);

    match service.register(request.user, &request.password).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(AuthError::ValidationFailed(errors)) => {
            debug!("Registration rejected with {} error(s)", errors.len());
            (StatusCode::BAD_REQUEST, Json(errors)).into_response()
        }
        Err(e) => {
            error!("Error registering user: {:?}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Error registering user")
        }
    }
}
