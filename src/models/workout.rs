use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::common::{double_option, iso_date, Pagination};
use super::{PlanExerciseInput, PlanExerciseWithExercise, UserResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "workout_level", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkoutLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub frequency: Option<i32>,
    pub level: Option<WorkoutLevel>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A workout with its ordered plan and owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDetails {
    #[serde(flatten)]
    pub workout: Workout,
    pub plan_exercises: Vec<PlanExerciseWithExercise>,
    pub user: Option<UserResponse>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkoutRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub user_id: Option<Uuid>,
    pub description: Option<String>,
    #[serde(deserialize_with = "iso_date::deserialize")]
    pub start_date: DateTime<Utc>,
    #[serde(default, deserialize_with = "iso_date::option")]
    pub end_date: Option<DateTime<Utc>>,
    #[validate(range(min = 1))]
    pub frequency: Option<i32>,
    pub level: Option<WorkoutLevel>,
    #[validate(nested)]
    pub plan_exercises: Option<Vec<PlanExerciseInput>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkoutRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    /// `null` unassigns the workout from its user.
    #[serde(default, deserialize_with = "double_option")]
    pub user_id: Option<Option<Uuid>>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "iso_date::option")]
    pub start_date: Option<DateTime<Utc>>,
    /// `null` clears the end date.
    #[serde(default, deserialize_with = "iso_date::nullable")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    #[validate(range(min = 1))]
    pub frequency: Option<i32>,
    pub level: Option<WorkoutLevel>,
    /// Replaces the whole plan when present; `[]` empties it.
    #[validate(nested)]
    pub plan_exercises: Option<Vec<PlanExerciseInput>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutFilter {
    pub skip: Option<u32>,
    pub take: Option<u32>,
    pub user_id: Option<Uuid>,
    pub title: Option<String>,
}

impl WorkoutFilter {
    pub fn page(&self) -> Pagination {
        Pagination {
            skip: self.skip,
            take: self.take,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewWorkout {
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub frequency: Option<i32>,
    pub level: Option<WorkoutLevel>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkoutChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub frequency: Option<i32>,
    pub level: Option<WorkoutLevel>,
    pub user_id: Option<Option<Uuid>>,
}

impl WorkoutChanges {
    pub fn apply_to(&self, workout: &mut Workout) {
        if let Some(title) = &self.title {
            workout.title = title.clone();
        }
        if let Some(description) = &self.description {
            workout.description = Some(description.clone());
        }
        if let Some(start_date) = self.start_date {
            workout.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            workout.end_date = end_date;
        }
        if let Some(frequency) = self.frequency {
            workout.frequency = Some(frequency);
        }
        if let Some(level) = self.level {
            workout.level = Some(level);
        }
        if let Some(user_id) = self.user_id {
            workout.user_id = user_id;
        }
    }
}
