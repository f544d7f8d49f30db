use tracing::{error, info};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreateWorkoutRequest, NewWorkout, PlanExerciseInput, UpdateWorkoutRequest, Workout,
    WorkoutChanges, WorkoutDetails, WorkoutFilter,
};
use crate::relations::{join_ids, missing_ids};
use crate::services::not_found;
use crate::store::SharedStore;

#[derive(Clone)]
pub struct WorkoutService {
    store: SharedStore,
}

impl WorkoutService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create_workout(&self, request: CreateWorkoutRequest) -> ApiResult<WorkoutDetails> {
        if let Some(user_id) = request.user_id {
            self.require_user(user_id).await?;
        }

        let plan = request.plan_exercises.unwrap_or_default();
        self.require_plan_exercises(&plan, "Exercises not found with IDs")
            .await?;

        let details = self
            .store
            .insert_workout(
                NewWorkout {
                    title: request.title,
                    description: request.description,
                    start_date: request.start_date,
                    end_date: request.end_date,
                    frequency: request.frequency,
                    level: request.level,
                    user_id: request.user_id,
                },
                &plan,
            )
            .await?;

        info!(
            workout_id = %details.workout.id,
            plan_rows = details.plan_exercises.len(),
            "Created workout"
        );
        Ok(details)
    }

    pub async fn list_workouts(&self, filter: WorkoutFilter) -> ApiResult<Vec<WorkoutDetails>> {
        Ok(self.store.list_workouts(&filter).await?)
    }

    pub async fn get_workout(&self, id: Uuid) -> ApiResult<WorkoutDetails> {
        self.store
            .find_workout_details(id)
            .await?
            .ok_or_else(|| not_found("Workout", id))
    }

    /// All references are checked before anything is written, so a bad
    /// exercise id leaves the workout untouched.
    pub async fn update_workout(
        &self,
        id: Uuid,
        request: UpdateWorkoutRequest,
    ) -> ApiResult<WorkoutDetails> {
        if self.store.find_workout(id).await?.is_none() {
            return Err(not_found("Workout", id));
        }

        if let Some(Some(user_id)) = request.user_id {
            self.require_user(user_id).await?;
        }

        if let Some(plan) = &request.plan_exercises {
            self.require_plan_exercises(plan, "Exercises not found with IDs for update")
                .await?;
        }

        let changes = WorkoutChanges {
            title: request.title,
            description: request.description,
            start_date: request.start_date,
            end_date: request.end_date,
            frequency: request.frequency,
            level: request.level,
            user_id: request.user_id,
        };

        match self
            .store
            .update_workout(id, changes, request.plan_exercises.as_deref())
            .await?
        {
            Some(details) => Ok(details),
            None => {
                error!(workout_id = %id, "Workout could not be read back after update");
                Err(ApiError::Internal(format!(
                    "Workout with ID \"{id}\" could not be read back after update"
                )))
            }
        }
    }

    pub async fn delete_workout(&self, id: Uuid) -> ApiResult<Workout> {
        let workout = self
            .store
            .delete_workout(id)
            .await?
            .ok_or_else(|| not_found("Workout", id))?;

        info!(workout_id = %id, "Deleted workout");
        Ok(workout)
    }

    async fn require_user(&self, user_id: Uuid) -> ApiResult<()> {
        match self.store.find_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(not_found("User", user_id)),
        }
    }

    async fn require_plan_exercises(&self, plan: &[PlanExerciseInput], prefix: &str) -> ApiResult<()> {
        if plan.is_empty() {
            return Ok(());
        }
        let requested: Vec<Uuid> = plan.iter().map(|item| item.exercise_id).collect();
        let found = self.store.existing_exercise_ids(&requested).await?;
        let missing = missing_ids(&requested, &found);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("{prefix}: {}", join_ids(&missing))))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::{ExerciseType, NewExercise};
    use crate::store::{ExerciseStore, MemoryStore, WorkoutStore};

    async fn seed_exercise(store: &MemoryStore, title: &str) -> Uuid {
        store
            .insert_exercise(
                NewExercise {
                    title: title.to_string(),
                    description: None,
                    image: None,
                    video: None,
                    exercise_type: ExerciseType::Strength,
                    muscle_group: None,
                    exercise_group_id: None,
                },
                &[],
            )
            .await
            .unwrap()
            .exercise
            .id
    }

    fn plan_item(exercise_id: Uuid, order: i32) -> PlanExerciseInput {
        PlanExerciseInput {
            exercise_id,
            sets: 3,
            reps: 10,
            target_load: None,
            target_rest_time: Some(90),
            notes: None,
            order,
        }
    }

    fn create_request(plan: Vec<PlanExerciseInput>) -> CreateWorkoutRequest {
        CreateWorkoutRequest {
            title: "Push day".to_string(),
            user_id: None,
            description: None,
            start_date: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            end_date: None,
            frequency: Some(3),
            level: None,
            plan_exercises: Some(plan),
        }
    }

    #[tokio::test]
    async fn test_plan_replaced_by_update() {
        let store = Arc::new(MemoryStore::new());
        let e1 = seed_exercise(&store, "Squat").await;
        let e2 = seed_exercise(&store, "Lunge").await;
        let service = WorkoutService::new(store.clone());

        let workout = service
            .create_workout(create_request(vec![plan_item(e1, 1), plan_item(e2, 2)]))
            .await
            .unwrap();

        let updated = service
            .update_workout(
                workout.workout.id,
                UpdateWorkoutRequest {
                    plan_exercises: Some(vec![plan_item(e2, 1)]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let plan: Vec<(Uuid, i32)> = updated
            .plan_exercises
            .iter()
            .map(|p| (p.plan_exercise.exercise_id, p.plan_exercise.order))
            .collect();
        assert_eq!(plan, vec![(e2, 1)]);
    }

    #[tokio::test]
    async fn test_failed_exercise_check_changes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let e1 = seed_exercise(&store, "Squat").await;
        let service = WorkoutService::new(store.clone());
        let workout = service
            .create_workout(create_request(vec![plan_item(e1, 0)]))
            .await
            .unwrap();

        let ghost = Uuid::new_v4();
        let result = service
            .update_workout(
                workout.workout.id,
                UpdateWorkoutRequest {
                    title: Some("Renamed".to_string()),
                    plan_exercises: Some(vec![plan_item(ghost, 0)]),
                    ..Default::default()
                },
            )
            .await;

        assert_matches!(
            result,
            Err(ApiError::NotFound(message)) if message == format!("Exercises not found with IDs for update: {ghost}")
        );

        let stored = store
            .find_workout_details(workout.workout.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.workout.title, "Push day");
        assert_eq!(stored.plan_exercises.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let service = WorkoutService::new(Arc::new(MemoryStore::new()));
        let mut request = create_request(vec![]);
        request.user_id = Some(Uuid::new_v4());

        assert_matches!(service.create_workout(request).await, Err(ApiError::NotFound(_)));
    }
}
