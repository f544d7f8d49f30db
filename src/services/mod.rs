// Resource services: existence checks and error mapping over the store

pub mod exercise_group_service;
pub mod exercise_service;
pub mod physical_assessment_service;
pub mod subscription_service;
pub mod user_service;
pub mod workout_plan_exercise_service;
pub mod workout_service;
pub mod workout_session_service;

pub use exercise_group_service::ExerciseGroupService;
pub use exercise_service::ExerciseService;
pub use physical_assessment_service::PhysicalAssessmentService;
pub use subscription_service::SubscriptionService;
pub use user_service::UserService;
pub use workout_plan_exercise_service::WorkoutPlanExerciseService;
pub use workout_service::WorkoutService;
pub use workout_session_service::WorkoutSessionService;

use std::fmt::Display;

use crate::error::ApiError;

pub(crate) fn not_found(entity: &str, id: impl Display) -> ApiError {
    ApiError::NotFound(format!("{entity} with ID \"{id}\" not found"))
}
