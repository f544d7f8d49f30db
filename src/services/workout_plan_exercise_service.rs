use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::{
    CreatePlanExerciseRequest, PlanExerciseChanges, UpdatePlanExerciseRequest, WorkoutPlanExercise,
};
use crate::services::not_found;
use crate::store::SharedStore;

#[derive(Clone)]
pub struct WorkoutPlanExerciseService {
    store: SharedStore,
}

impl WorkoutPlanExerciseService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create_plan_exercise(
        &self,
        request: CreatePlanExerciseRequest,
    ) -> ApiResult<WorkoutPlanExercise> {
        let (workout_id, input) = request.into_parts();
        self.require_workout(workout_id).await?;
        self.require_exercise(input.exercise_id).await?;

        Ok(self.store.insert_plan_exercise(workout_id, input).await?)
    }

    pub async fn list_plan_exercises(&self, workout_id: Uuid) -> ApiResult<Vec<WorkoutPlanExercise>> {
        self.require_workout(workout_id).await?;
        Ok(self.store.list_plan_exercises(workout_id).await?)
    }

    pub async fn get_plan_exercise(&self, id: Uuid) -> ApiResult<WorkoutPlanExercise> {
        self.store
            .find_plan_exercise(id)
            .await?
            .ok_or_else(|| not_found("WorkoutPlanExercise", id))
    }

    pub async fn update_plan_exercise(
        &self,
        id: Uuid,
        request: UpdatePlanExerciseRequest,
    ) -> ApiResult<WorkoutPlanExercise> {
        if self.store.find_plan_exercise(id).await?.is_none() {
            return Err(not_found("WorkoutPlanExercise", id));
        }
        if let Some(workout_id) = request.workout_id {
            self.require_workout(workout_id).await?;
        }
        if let Some(exercise_id) = request.exercise_id {
            self.require_exercise(exercise_id).await?;
        }

        self.store
            .update_plan_exercise(id, PlanExerciseChanges::from(request))
            .await?
            .ok_or_else(|| not_found("WorkoutPlanExercise", id))
    }

    pub async fn delete_plan_exercise(&self, id: Uuid) -> ApiResult<WorkoutPlanExercise> {
        self.store
            .delete_plan_exercise(id)
            .await?
            .ok_or_else(|| not_found("WorkoutPlanExercise", id))
    }

    /// Returns how many rows were removed.
    pub async fn delete_plan_exercises_for_workout(&self, workout_id: Uuid) -> ApiResult<u64> {
        self.require_workout(workout_id).await?;
        Ok(self.store.delete_plan_exercises_for_workout(workout_id).await?)
    }

    async fn require_workout(&self, workout_id: Uuid) -> ApiResult<()> {
        match self.store.find_workout(workout_id).await? {
            Some(_) => Ok(()),
            None => Err(not_found("Workout", workout_id)),
        }
    }

    async fn require_exercise(&self, exercise_id: Uuid) -> ApiResult<()> {
        match self.store.find_exercise(exercise_id).await? {
            Some(_) => Ok(()),
            None => Err(not_found("Exercise", exercise_id)),
        }
    }
}
