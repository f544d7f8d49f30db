use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use uuid::Uuid;

use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::error::{ApiResult, PathParams, QueryParams, ValidatedJson};
use crate::models::{
    CreateSubscriptionRequest, Subscription, SubscriptionQuery, UpdateSubscriptionRequest,
};
use crate::services::SubscriptionService;

/// Every route requires a bearer token.
pub fn subscription_routes(
    subscription_service: SubscriptionService,
    auth_service: AuthService,
) -> Router {
    Router::new()
        .route("/", post(create_subscription).get(list_subscriptions))
        .route(
            "/:id",
            get(get_subscription)
                .patch(update_subscription)
                .delete(delete_subscription),
        )
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            jwt_auth_middleware,
        ))
        .with_state(subscription_service)
}

/// The subscription is created for the caller identified by the token.
#[tracing::instrument(skip(service, session, request), fields(user_id = %session.user_id))]
async fn create_subscription(
    State(service): State<SubscriptionService>,
    Extension(session): Extension<UserSession>,
    ValidatedJson(request): ValidatedJson<CreateSubscriptionRequest>,
) -> ApiResult<(StatusCode, Json<Subscription>)> {
    let subscription = service.create_subscription(session.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

#[tracing::instrument(skip(service))]
async fn list_subscriptions(
    State(service): State<SubscriptionService>,
    QueryParams(query): QueryParams<SubscriptionQuery>,
) -> ApiResult<Json<Vec<Subscription>>> {
    Ok(Json(service.list_subscriptions(query.user_id).await?))
}

#[tracing::instrument(skip(service))]
async fn get_subscription(
    State(service): State<SubscriptionService>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<Subscription>> {
    Ok(Json(service.get_subscription(id).await?))
}

#[tracing::instrument(skip(service, request))]
async fn update_subscription(
    State(service): State<SubscriptionService>,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateSubscriptionRequest>,
) -> ApiResult<Json<Subscription>> {
    Ok(Json(service.update_subscription(id, request).await?))
}

#[tracing::instrument(skip(service))]
async fn delete_subscription(
    State(service): State<SubscriptionService>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<Json<Subscription>> {
    Ok(Json(service.delete_subscription(id).await?))
}
