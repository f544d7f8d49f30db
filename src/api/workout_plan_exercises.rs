use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{jwt_auth_middleware, AuthService};
use crate::error::{ApiResult, PathParams, QueryParams, ValidatedJson};
use crate::models::{
    CreatePlanExerciseRequest, PlanExerciseQuery, UpdatePlanExerciseRequest, WorkoutPlanExercise,
};
use crate::services::WorkoutPlanExerciseService;

#[derive(Debug, Serialize)]
pub struct DeletedCount {
    pub count: u64,
}

pub fn workout_plan_exercise_routes(
    plan_service: WorkoutPlanExerciseService,
    auth_service: AuthService,
) -> Router {
    Router::new()
        .route("/", post(create_plan_exercise).get(list_plan_exercises))
        .route(
            "/workout/:workout_id",
            delete(delete_plan_exercises_for_workout),
        )
        .route(
            "/:id",
            get(get_plan_exercise)
                .patch(update_plan_exercise)
                .delete(delete_plan_exercise),
        )
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            jwt_auth_middleware,
        ))
        .with_state(plan_service)
}

#[tracing::instrument(skip(service, request))]
async fn create_plan_exercise(
    State(service): State<WorkoutPlanExerciseService>,
    ValidatedJson(request): ValidatedJson<CreatePlanExerciseRequest>,
) -> ApiResult<(StatusCode, Json<WorkoutPlanExercise>)> {
    let row = service.create_plan_exercise(request).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `workoutId` is required.
#[tracing::instrument(skip(service))]
async fn list_plan_exercises(
    State(service): State<WorkoutPlanExerciseService>,
    QueryParams(query): QueryParams<PlanExerciseQuery>,
) -> ApiResult<Json<Vec<WorkoutPlanExercise>>> {
    Ok(Json(service.list_plan_exercises(query.workout_id).await?))
}

#[tracing::instrument(skip(service))]
async fn get_plan_exercise(
    State(service): State<WorkoutPlanExerciseService>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<WorkoutPlanExercise>> {
    Ok(Json(service.get_plan_exercise(id).await?))
}

#[tracing::instrument(skip(service, request))]
async fn update_plan_exercise(
    State(service): State<WorkoutPlanExerciseService>,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdatePlanExerciseRequest>,
) -> ApiResult<Json<WorkoutPlanExercise>> {
    Ok(Json(service.update_plan_exercise(id, request).await?))
}

#[tracing::instrument(skip(service))]
async fn delete_plan_exercise(
    State(service): State<WorkoutPlanExerciseService>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<WorkoutPlanExercise>> {
    Ok(Json(service.delete_plan_exercise(id).await?))
}

#[tracing::instrument(skip(service))]
async fn delete_plan_exercises_for_workout(
    State(service): State<WorkoutPlanExerciseService>,
    PathParams(workout_id): PathParams<Uuid>,
) -> ApiResult<Json<DeletedCount>> {
    let count = service.delete_plan_exercises_for_workout(workout_id).await?;
    Ok(Json(DeletedCount { count }))
}
