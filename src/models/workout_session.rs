use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::common::iso_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "session_intensity", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionIntensity {
    Low,
    Medium,
    High,
}

/// A performed session of a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    pub id: Uuid,
    pub workout_id: Uuid,
    pub date: DateTime<Utc>,
    /// Minutes.
    pub duration: i32,
    pub feedback: Option<String>,
    pub intensity: SessionIntensity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkoutSessionRequest {
    pub workout_id: Uuid,
    #[serde(deserialize_with = "iso_date::deserialize")]
    pub date: DateTime<Utc>,
    #[validate(range(min = 0))]
    pub duration: i32,
    pub feedback: Option<String>,
    pub intensity: SessionIntensity,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkoutSessionRequest {
    pub workout_id: Option<Uuid>,
    #[serde(default, deserialize_with = "iso_date::option")]
    pub date: Option<DateTime<Utc>>,
    #[validate(range(min = 0))]
    pub duration: Option<i32>,
    pub feedback: Option<String>,
    pub intensity: Option<SessionIntensity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSessionQuery {
    pub workout_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewWorkoutSession {
    pub workout_id: Uuid,
    pub date: DateTime<Utc>,
    pub duration: i32,
    pub feedback: Option<String>,
    pub intensity: SessionIntensity,
}

impl From<CreateWorkoutSessionRequest> for NewWorkoutSession {
    fn from(request: CreateWorkoutSessionRequest) -> Self {
        Self {
            workout_id: request.workout_id,
            date: request.date,
            duration: request.duration,
            feedback: request.feedback,
            intensity: request.intensity,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkoutSessionChanges {
    pub workout_id: Option<Uuid>,
    pub date: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
    pub feedback: Option<String>,
    pub intensity: Option<SessionIntensity>,
}

impl From<UpdateWorkoutSessionRequest> for WorkoutSessionChanges {
    fn from(request: UpdateWorkoutSessionRequest) -> Self {
        Self {
            workout_id: request.workout_id,
            date: request.date,
            duration: request.duration,
            feedback: request.feedback,
            intensity: request.intensity,
        }
    }
}

impl WorkoutSessionChanges {
    pub fn apply_to(&self, session: &mut WorkoutSession) {
        if let Some(workout_id) = self.workout_id {
            session.workout_id = workout_id;
        }
        if let Some(date) = self.date {
            session.date = date;
        }
        if let Some(duration) = self.duration {
            session.duration = duration;
        }
        if let Some(feedback) = &self.feedback {
            session.feedback = Some(feedback.clone());
        }
        if let Some(intensity) = self.intensity {
            session.intensity = intensity;
        }
    }
}
