use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::auth::auth_routes;
use super::exercise_groups::exercise_group_routes;
use super::exercises::exercise_routes;
use super::health::health_check;
use super::physical_assessments::physical_assessment_routes;
use super::subscriptions::subscription_routes;
use super::users::user_routes;
use super::workout_plan_exercises::workout_plan_exercise_routes;
use super::workout_sessions::workout_session_routes;
use super::workouts::workout_routes;
use crate::auth::{cors_layer, security_headers_layer, AuthService, JwtService};
use crate::services::{
    ExerciseGroupService, ExerciseService, PhysicalAssessmentService, SubscriptionService,
    UserService, WorkoutPlanExerciseService, WorkoutService, WorkoutSessionService,
};
use crate::store::SharedStore;

pub fn create_routes(store: SharedStore, jwt_service: JwtService) -> Router {
    let auth_service = AuthService::new(store.clone(), jwt_service);

    Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth_routes(auth_service.clone()))
        .nest("/users", user_routes(UserService::new(store.clone())))
        .nest("/exercises", exercise_routes(ExerciseService::new(store.clone())))
        .nest(
            "/exercise-groups",
            exercise_group_routes(ExerciseGroupService::new(store.clone())),
        )
        .nest("/workouts", workout_routes(WorkoutService::new(store.clone())))
        .nest(
            "/physical-assessments",
            physical_assessment_routes(PhysicalAssessmentService::new(store.clone())),
        )
        .nest(
            "/subscriptions",
            subscription_routes(SubscriptionService::new(store.clone()), auth_service.clone()),
        )
        .nest(
            "/workout-plan-exercises",
            workout_plan_exercise_routes(
                WorkoutPlanExerciseService::new(store.clone()),
                auth_service.clone(),
            ),
        )
        .nest(
            "/workout-sessions",
            workout_session_routes(WorkoutSessionService::new(store), auth_service),
        )
        .layer(security_headers_layer())
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}
