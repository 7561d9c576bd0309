use crate::{
    api::handlers::{principal::require_auth, types::UserInfo},
    auth::AuthService,
};
use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

#[utoipa::path(
    get,
    path= "/user/{id}",
    params(
        ("id" = String, Path, description = "User id; the response always describes the token bearer"),
    ),
    responses (
        (status = 200, description = "Name of the authenticated user", body = UserInfo, content_type = "application/json"),
        (status = 401, description = "Missing, invalid or expired bearer token"),
    ),
    security(("bearer" = [])),
    tag= "user"
)]
/// Return the name carried by the caller's access token.
pub async fn user(
    Path(id): Path<String>,
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
) -> Response {
    let principal = match require_auth(&headers, &service) {
        Ok(principal) => principal,
        Err(response) => return response,
    };

    debug!(requested_id = %id, user_id = %principal.user_id, "Authenticated user request");

    (
        StatusCode::OK,
        Json(UserInfo {
            username: principal.username,
        }),
    )
        .into_response()
}
