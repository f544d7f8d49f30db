use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreateExerciseGroupRequest, ExerciseGroup, ExerciseGroupChanges, ExerciseGroupDetails,
    ExerciseGroupFilter, NewExerciseGroup, UpdateExerciseGroupRequest,
};
use crate::relations::{dedup, join_ids, missing_ids};
use crate::services::not_found;
use crate::store::SharedStore;

#[derive(Clone)]
pub struct ExerciseGroupService {
    store: SharedStore,
}

impl ExerciseGroupService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create_exercise_group(
        &self,
        request: CreateExerciseGroupRequest,
    ) -> ApiResult<ExerciseGroupDetails> {
        let exercise_ids = dedup(request.exercise_ids.as_deref().unwrap_or_default());
        self.require_exercises(&exercise_ids).await?;

        let details = self
            .store
            .insert_exercise_group(
                NewExerciseGroup {
                    title: request.title,
                    description: request.description,
                },
                &exercise_ids,
            )
            .await?;

        info!(group_id = %details.group.id, members = details.exercises.len(), "Created exercise group");
        Ok(details)
    }

    pub async fn list_exercise_groups(
        &self,
        filter: ExerciseGroupFilter,
    ) -> ApiResult<Vec<ExerciseGroupDetails>> {
        Ok(self.store.list_exercise_groups(&filter).await?)
    }

    pub async fn get_exercise_group(&self, id: Uuid) -> ApiResult<ExerciseGroupDetails> {
        self.store
            .find_exercise_group_details(id)
            .await?
            .ok_or_else(|| not_found("ExerciseGroup", id))
    }

    pub async fn update_exercise_group(
        &self,
        id: Uuid,
        request: UpdateExerciseGroupRequest,
    ) -> ApiResult<ExerciseGroupDetails> {
        if self.store.find_exercise_group(id).await?.is_none() {
            return Err(not_found("ExerciseGroup", id));
        }

        let exercise_ids = request.exercise_ids.as_deref().map(dedup);
        if let Some(ids) = &exercise_ids {
            self.require_exercises(ids).await?;
        }

        let changes = ExerciseGroupChanges {
            title: request.title,
            description: request.description,
        };

        self.store
            .update_exercise_group(id, changes, exercise_ids.as_deref())
            .await?
            .ok_or_else(|| not_found("ExerciseGroup", id))
    }

    pub async fn delete_exercise_group(&self, id: Uuid) -> ApiResult<ExerciseGroup> {
        let group = self
            .store
            .delete_exercise_group(id)
            .await?
            .ok_or_else(|| not_found("ExerciseGroup", id))?;

        info!(group_id = %id, "Deleted exercise group");
        Ok(group)
    }

    async fn require_exercises(&self, ids: &[Uuid]) -> ApiResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let found = self.store.existing_exercise_ids(ids).await?;
        let missing = missing_ids(ids, &found);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!(
                "Exercises not found with IDs: {}",
                join_ids(&missing)
            )))
        }
    }
}
