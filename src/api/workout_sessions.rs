use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use crate::auth::{jwt_auth_middleware, AuthService};
use crate::error::{ApiResult, PathParams, QueryParams, ValidatedJson};
use crate::models::{
    CreateWorkoutSessionRequest, UpdateWorkoutSessionRequest, WorkoutSession, WorkoutSessionQuery,
};
use crate::services::WorkoutSessionService;

pub fn workout_session_routes(
    session_service: WorkoutSessionService,
    auth_service: AuthService,
) -> Router {
    Router::new()
        .route("/", post(create_workout_session).get(list_workout_sessions))
        .route(
            "/:id",
            get(get_workout_session)
                .patch(update_workout_session)
                .delete(delete_workout_session),
        )
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            jwt_auth_middleware,
        ))
        .with_state(session_service)
}

#[tracing::instrument(skip(service, request))]
async fn create_workout_session(
    State(service): State<WorkoutSessionService>,
    ValidatedJson(request): ValidatedJson<CreateWorkoutSessionRequest>,
) -> ApiResult<(StatusCode, Json<WorkoutSession>)> {
    let session = service.create_workout_session(request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[tracing::instrument(skip(service))]
async fn list_workout_sessions(
    State(service): State<WorkoutSessionService>,
    QueryParams(query): QueryParams<WorkoutSessionQuery>,
) -> ApiResult<Json<Vec<WorkoutSession>>> {
    Ok(Json(service.list_workout_sessions(query.workout_id).await?))
}

#[tracing::instrument(skip(service))]
async fn get_workout_session(
    State(service): State<WorkoutSessionService>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<WorkoutSession>> {
    Ok(Json(service.get_workout_session(id).await?))
}

#[tracing::instrument(skip(service, request))]
async fn update_workout_session(
    State(service): State<WorkoutSessionService>,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateWorkoutSessionRequest>,
) -> ApiResult<Json<WorkoutSession>> {
    Ok(Json(service.update_workout_session(id, request).await?))
}

#[tracing::instrument(skip(service))]
async fn delete_workout_session(
    State(service): State<WorkoutSessionService>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<WorkoutSession>> {
    Ok(Json(service.delete_workout_session(id).await?))
}
