use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use crate::error::{ApiResult, PathParams, QueryParams, ValidatedJson};
use crate::models::{CreateWorkoutRequest, UpdateWorkoutRequest, WorkoutDetails, WorkoutFilter};
use crate::services::WorkoutService;

pub fn workout_routes(workout_service: WorkoutService) -> Router {
    Router::new()
        .route("/", post(create_workout).get(list_workouts))
        .route(
            "/:id",
            get(get_workout).patch(update_workout).delete(delete_workout),
        )
        .with_state(workout_service)
}

#[tracing::instrument(skip(service, request))]
async fn create_workout(
    State(service): State<WorkoutService>,
    ValidatedJson(request): ValidatedJson<CreateWorkoutRequest>,
) -> ApiResult<(StatusCode, Json<WorkoutDetails>)> {
    let workout = service.create_workout(request).await?;
    Ok((StatusCode::CREATED, Json(workout)))
}

#[tracing::instrument(skip(service))]
async fn list_workouts(
    State(service): State<WorkoutService>,
    QueryParams(filter): QueryParams<WorkoutFilter>,
) -> ApiResult<Json<Vec<WorkoutDetails>>> {
    Ok(Json(service.list_workouts(filter).await?))
}

#[tracing::instrument(skip(service))]
async fn get_workout(
    State(service): State<WorkoutService>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<WorkoutDetails>> {
    Ok(Json(service.get_workout(id).await?))
}

/// `planExercises`, when present, becomes the complete plan.
#[tracing::instrument(skip(service, request))]
async fn update_workout(
    State(service): State<WorkoutService>,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateWorkoutRequest>,
) -> ApiResult<Json<WorkoutDetails>> {
    Ok(Json(service.update_workout(id, request).await?))
}

#[tracing::instrument(skip(service))]
async fn delete_workout(
    State(service): State<WorkoutService>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<StatusCode> {
    service.delete_workout(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
