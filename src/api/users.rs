use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use crate::error::{ApiResult, PathParams, ValidatedJson};
use crate::models::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::services::UserService;

pub fn user_routes(user_service: UserService) -> Router {
    Router::new()
        .route("/", post(create_user).get(list_users))
        .route("/:id", get(get_user).patch(update_user).delete(delete_user))
        .with_state(user_service)
}

#[tracing::instrument(skip(service, request))]
async fn create_user(
    State(service): State<UserService>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let user = service.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[tracing::instrument(skip(service))]
async fn list_users(State(service): State<UserService>) -> ApiResult<Json<Vec<UserResponse>>> {
    Ok(Json(service.list_users().await?))
}

#[tracing::instrument(skip(service))]
async fn get_user(
    State(service): State<UserService>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    Ok(Json(service.get_user(id).await?))
}

#[tracing::instrument(skip(service, request))]
async fn update_user(
    State(service): State<UserService>,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    Ok(Json(service.update_user(id, request).await?))
}

#[tracing::instrument(skip(service))]
async fn delete_user(
    State(service): State<UserService>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<StatusCode> {
    service.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
