use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::Exercise;

/// One planned exercise inside a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlanExercise {
    pub id: Uuid,
    pub workout_id: Uuid,
    pub exercise_id: Uuid,
    pub sets: i32,
    pub reps: i32,
    pub target_load: Option<f64>,
    pub target_rest_time: Option<i32>,
    pub notes: Option<String>,
    #[sqlx(rename = "order_index")]
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkoutPlanExercise {
    /// True when the row already holds every value of `input`.
    pub fn matches(&self, input: &PlanExerciseInput) -> bool {
        self.exercise_id == input.exercise_id
            && self.sets == input.sets
            && self.reps == input.reps
            && self.target_load == input.target_load
            && self.target_rest_time == input.target_rest_time
            && self.notes == input.notes
            && self.order == input.order
    }

    pub fn overwrite(&mut self, input: &PlanExerciseInput) {
        self.exercise_id = input.exercise_id;
        self.sets = input.sets;
        self.reps = input.reps;
        self.target_load = input.target_load;
        self.target_rest_time = input.target_rest_time;
        self.notes = input.notes.clone();
        self.order = input.order;
    }
}

/// Plan row as embedded in a workout, with its exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanExerciseWithExercise {
    #[serde(flatten)]
    pub plan_exercise: WorkoutPlanExercise,
    pub exercise: Exercise,
}

/// Plan entry as supplied when creating or updating a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlanExerciseInput {
    pub exercise_id: Uuid,
    #[validate(range(min = 1))]
    pub sets: i32,
    #[validate(range(min = 1))]
    pub reps: i32,
    #[validate(range(min = 0.0))]
    pub target_load: Option<f64>,
    #[validate(range(min = 0))]
    pub target_rest_time: Option<i32>,
    #[validate(length(max = 255))]
    pub notes: Option<String>,
    #[validate(range(min = 0))]
    pub order: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanExerciseRequest {
    pub workout_id: Uuid,
    pub exercise_id: Uuid,
    #[validate(range(min = 1))]
    pub sets: i32,
    #[validate(range(min = 1))]
    pub reps: i32,
    #[validate(range(min = 0.0))]
    pub target_load: Option<f64>,
    #[validate(range(min = 0))]
    pub target_rest_time: Option<i32>,
    #[validate(length(max = 255))]
    pub notes: Option<String>,
    #[validate(range(min = 0))]
    pub order: i32,
}

impl CreatePlanExerciseRequest {
    pub fn into_parts(self) -> (Uuid, PlanExerciseInput) {
        (
            self.workout_id,
            PlanExerciseInput {
                exercise_id: self.exercise_id,
                sets: self.sets,
                reps: self.reps,
                target_load: self.target_load,
                target_rest_time: self.target_rest_time,
                notes: self.notes,
                order: self.order,
            },
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlanExerciseRequest {
    pub workout_id: Option<Uuid>,
    pub exercise_id: Option<Uuid>,
    #[validate(range(min = 1))]
    pub sets: Option<i32>,
    #[validate(range(min = 1))]
    pub reps: Option<i32>,
    #[validate(range(min = 0.0))]
    pub target_load: Option<f64>,
    #[validate(range(min = 0))]
    pub target_rest_time: Option<i32>,
    #[validate(length(max = 255))]
    pub notes: Option<String>,
    #[validate(range(min = 0))]
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanExerciseQuery {
    pub workout_id: Uuid,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct PlanExerciseChanges {
    pub workout_id: Option<Uuid>,
    pub exercise_id: Option<Uuid>,
    pub sets: Option<i32>,
    pub reps: Option<i32>,
    pub target_load: Option<f64>,
    pub target_rest_time: Option<i32>,
    pub notes: Option<String>,
    pub order: Option<i32>,
}

impl From<UpdatePlanExerciseRequest> for PlanExerciseChanges {
    fn from(request: UpdatePlanExerciseRequest) -> Self {
        Self {
            workout_id: request.workout_id,
            exercise_id: request.exercise_id,
            sets: request.sets,
            reps: request.reps,
            target_load: request.target_load,
            target_rest_time: request.target_rest_time,
            notes: request.notes,
            order: request.order,
        }
    }
}

impl PlanExerciseChanges {
    pub fn apply_to(&self, row: &mut WorkoutPlanExercise) {
        if let Some(workout_id) = self.workout_id {
            row.workout_id = workout_id;
        }
        if let Some(exercise_id) = self.exercise_id {
            row.exercise_id = exercise_id;
        }
        if let Some(sets) = self.sets {
            row.sets = sets;
        }
        if let Some(reps) = self.reps {
            row.reps = reps;
        }
        if let Some(target_load) = self.target_load {
            row.target_load = Some(target_load);
        }
        if let Some(target_rest_time) = self.target_rest_time {
            row.target_rest_time = Some(target_rest_time);
        }
        if let Some(notes) = &self.notes {
            row.notes = Some(notes.clone());
        }
        if let Some(order) = self.order {
            row.order = order;
        }
    }
}
