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
    CreateExerciseGroupRequest, ExerciseGroupDetails, ExerciseGroupFilter,
    UpdateExerciseGroupRequest,
};
use crate::services::ExerciseGroupService;

pub fn exercise_group_routes(group_service: ExerciseGroupService) -> Router {
    Router::new()
        .route("/", post(create_exercise_group).get(list_exercise_groups))
        .route(
            "/:id",
            get(get_exercise_group)
                .patch(update_exercise_group)
                .delete(delete_exercise_group),
        )
        .with_state(group_service)
}

#[tracing::instrument(skip(service, request))]
async fn create_exercise_group(
    State(service): State<ExerciseGroupService>,
    ValidatedJson(request): ValidatedJson<CreateExerciseGroupRequest>,
) -> ApiResult<(StatusCode, Json<ExerciseGroupDetails>)> {
    let group = service.create_exercise_group(request).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

#[tracing::instrument(skip(service))]
async fn list_exercise_groups(
    State(service): State<ExerciseGroupService>,
    QueryParams(filter): QueryParams<ExerciseGroupFilter>,
) -> ApiResult<Json<Vec<ExerciseGroupDetails>>> {
    Ok(Json(service.list_exercise_groups(filter).await?))
}

#[tracing::instrument(skip(service))]
async fn get_exercise_group(
    State(service): State<ExerciseGroupService>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<ExerciseGroupDetails>> {
    Ok(Json(service.get_exercise_group(id).await?))
}

#[tracing::instrument(skip(service, request))]
async fn update_exercise_group(
    State(service): State<ExerciseGroupService>,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateExerciseGroupRequest>,
) -> ApiResult<Json<ExerciseGroupDetails>> {
    Ok(Json(service.update_exercise_group(id, request).await?))
}

#[tracing::instrument(skip(service))]
async fn delete_exercise_group(
    State(service): State<ExerciseGroupService>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<StatusCode> {
    service.delete_exercise_group(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
