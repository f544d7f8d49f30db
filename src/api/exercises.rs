use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use crate::error::{ApiResult, PathParams, QueryParams, ValidatedJson};
use crate::models::{
    CreateExerciseRequest, ExerciseDetails, ExerciseListQuery, UpdateExerciseRequest,
};
use crate::services::ExerciseService;

pub fn exercise_routes(exercise_service: ExerciseService) -> Router {
    Router::new()
        .route("/", post(create_exercise).get(list_exercises))
        .route(
            "/:id",
            get(get_exercise).patch(update_exercise).delete(delete_exercise),
        )
        .with_state(exercise_service)
}

#[tracing::instrument(skip(service, request))]
async fn create_exercise(
    State(service): State<ExerciseService>,
    ValidatedJson(request): ValidatedJson<CreateExerciseRequest>,
) -> ApiResult<(StatusCode, Json<ExerciseDetails>)> {
    let exercise = service.create_exercise(request).await?;
    Ok((StatusCode::CREATED, Json(exercise)))
}

/// Filters: `skip`, `take`, `title`, `type`, `muscleGroup`, `exerciseGroupId`.
#[tracing::instrument(skip(service))]
async fn list_exercises(
    State(service): State<ExerciseService>,
    QueryParams(query): QueryParams<ExerciseListQuery>,
) -> ApiResult<Json<Vec<ExerciseDetails>>> {
    Ok(Json(service.list_exercises(query).await?))
}

#[tracing::instrument(skip(service))]
async fn get_exercise(
    State(service): State<ExerciseService>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<ExerciseDetails>> {
    Ok(Json(service.get_exercise(id).await?))
}

#[tracing::instrument(skip(service, request))]
async fn update_exercise(
    State(service): State<ExerciseService>,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateExerciseRequest>,
) -> ApiResult<Json<ExerciseDetails>> {
    Ok(Json(service.update_exercise(id, request).await?))
}

#[tracing::instrument(skip(service))]
async fn delete_exercise(
    State(service): State<ExerciseService>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<StatusCode> {
    service.delete_exercise(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
