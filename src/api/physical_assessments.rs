use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use crate::error::{ApiResult, PathParams, ValidatedJson};
use crate::models::{CreateAssessmentRequest, PhysicalAssessment, UpdateAssessmentRequest};
use crate::services::PhysicalAssessmentService;

pub fn physical_assessment_routes(assessment_service: PhysicalAssessmentService) -> Router {
    Router::new()
        .route("/", post(create_assessment))
        .route("/user/:user_id", get(list_assessments_by_user))
        .route(
            "/:id",
            get(get_assessment)
                .patch(update_assessment)
                .delete(delete_assessment),
        )
        .with_state(assessment_service)
}

#[tracing::instrument(skip(service, request))]
async fn create_assessment(
    State(service): State<PhysicalAssessmentService>,
    ValidatedJson(request): ValidatedJson<CreateAssessmentRequest>,
) -> ApiResult<(StatusCode, Json<PhysicalAssessment>)> {
    let assessment = service.create_assessment(request).await?;
    Ok((StatusCode::CREATED, Json(assessment)))
}

#[tracing::instrument(skip(service))]
async fn list_assessments_by_user(
    State(service): State<PhysicalAssessmentService>,
    PathParams(user_id): PathParams<Uuid>,
) -> ApiResult<Json<Vec<PhysicalAssessment>>> {
    Ok(Json(service.list_assessments_by_user(user_id).await?))
}

#[tracing::instrument(skip(service))]
async fn get_assessment(
    State(service): State<PhysicalAssessmentService>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<PhysicalAssessment>> {
    Ok(Json(service.get_assessment(id).await?))
}

#[tracing::instrument(skip(service, request))]
async fn update_assessment(
    State(service): State<PhysicalAssessmentService>,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateAssessmentRequest>,
) -> ApiResult<Json<PhysicalAssessment>> {
    Ok(Json(service.update_assessment(id, request).await?))
}

#[tracing::instrument(skip(service))]
async fn delete_assessment(
    State(service): State<PhysicalAssessmentService>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<StatusCode> {
    service.delete_assessment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
