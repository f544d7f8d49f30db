use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    parse_enum, CreateExerciseRequest, Exercise, ExerciseChanges, ExerciseDetails, ExerciseFilter,
    ExerciseListQuery, NewExercise, Pagination, UpdateExerciseRequest,
};
use crate::relations::{dedup, join_ids, missing_ids};
use crate::services::not_found;
use crate::store::SharedStore;

#[derive(Clone)]
pub struct ExerciseService {
    store: SharedStore,
}

impl ExerciseService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create_exercise(&self, request: CreateExerciseRequest) -> ApiResult<ExerciseDetails> {
        if let Some(group_id) = request.exercise_group_id {
            self.require_group(group_id).await?;
        }

        let similar_ids = dedup(request.similar_exercise_ids.as_deref().unwrap_or_default());
        self.require_exercises(&similar_ids, "Similar exercises not found with IDs")
            .await?;

        let details = self
            .store
            .insert_exercise(
                NewExercise {
                    title: request.title,
                    description: request.description,
                    image: request.image,
                    video: request.video,
                    exercise_type: request.exercise_type,
                    muscle_group: request.muscle_group,
                    exercise_group_id: request.exercise_group_id,
                },
                &similar_ids,
            )
            .await?;

        info!(exercise_id = %details.exercise.id, "Created exercise");
        Ok(details)
    }

    pub async fn list_exercises(&self, query: ExerciseListQuery) -> ApiResult<Vec<ExerciseDetails>> {
        let filter = ExerciseFilter {
            page: Pagination {
                skip: query.skip,
                take: query.take,
            },
            title: query.title,
            exercise_type: query.exercise_type.as_deref().and_then(|raw| {
                let parsed = parse_enum(raw);
                if parsed.is_none() {
                    warn!(value = raw, "Ignoring unknown exercise type filter");
                }
                parsed
            }),
            muscle_group: query.muscle_group.as_deref().and_then(|raw| {
                let parsed = parse_enum(raw);
                if parsed.is_none() {
                    warn!(value = raw, "Ignoring unknown muscle group filter");
                }
                parsed
            }),
            exercise_group_id: query.exercise_group_id,
        };

        Ok(self.store.list_exercises(&filter).await?)
    }

    pub async fn get_exercise(&self, id: Uuid) -> ApiResult<ExerciseDetails> {
        self.store
            .find_exercise_details(id)
            .await?
            .ok_or_else(|| not_found("Exercise", id))
    }

    /// `similarExerciseIds`, when present, replaces the similar set.
    pub async fn update_exercise(
        &self,
        id: Uuid,
        request: UpdateExerciseRequest,
    ) -> ApiResult<ExerciseDetails> {
        if self.store.find_exercise(id).await?.is_none() {
            return Err(not_found("Exercise", id));
        }

        if let Some(Some(group_id)) = request.exercise_group_id {
            self.require_group(group_id).await?;
        }

        let similar_ids = request.similar_exercise_ids.as_deref().map(dedup);
        if let Some(ids) = &similar_ids {
            self.require_exercises(ids, "Similar exercises to connect not found with IDs")
                .await?;
        }

        let changes = ExerciseChanges {
            title: request.title,
            description: request.description,
            image: request.image,
            video: request.video,
            exercise_type: request.exercise_type,
            muscle_group: request.muscle_group,
            exercise_group_id: request.exercise_group_id,
        };

        self.store
            .update_exercise(id, changes, similar_ids.as_deref())
            .await?
            .ok_or_else(|| not_found("Exercise", id))
    }

    pub async fn delete_exercise(&self, id: Uuid) -> ApiResult<Exercise> {
        let exercise = self
            .store
            .delete_exercise(id)
            .await?
            .ok_or_else(|| not_found("Exercise", id))?;

        info!(exercise_id = %id, "Deleted exercise");
        Ok(exercise)
    }

    async fn require_group(&self, group_id: Uuid) -> ApiResult<()> {
        match self.store.find_exercise_group(group_id).await? {
            Some(_) => Ok(()),
            None => Err(not_found("ExerciseGroup", group_id)),
        }
    }

    async fn require_exercises(&self, ids: &[Uuid], prefix: &str) -> ApiResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let found = self.store.existing_exercise_ids(ids).await?;
        let missing = missing_ids(ids, &found);
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

    use super::*;
    use crate::models::{ExerciseType, MuscleGroup};
    use crate::store::MemoryStore;

    fn create_request(title: &str, similar: Option<Vec<Uuid>>) -> CreateExerciseRequest {
        CreateExerciseRequest {
            title: title.to_string(),
            description: None,
            image: None,
            video: None,
            exercise_type: ExerciseType::Strength,
            muscle_group: Some(MuscleGroup::Chest),
            exercise_group_id: None,
            similar_exercise_ids: similar,
        }
    }

    #[tokio::test]
    async fn test_similar_set_replaced_then_cleared() {
        let service = ExerciseService::new(Arc::new(MemoryStore::new()));
        let a = service.create_exercise(create_request("A", None)).await.unwrap();
        let b = service.create_exercise(create_request("B", None)).await.unwrap();

        let updated = service
            .update_exercise(
                a.exercise.id,
                UpdateExerciseRequest {
                    similar_exercise_ids: Some(vec![b.exercise.id]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let similar: Vec<Uuid> = updated.similar_exercises.iter().map(|e| e.id).collect();
        assert_eq!(similar, vec![b.exercise.id]);

        let cleared = service
            .update_exercise(
                a.exercise.id,
                UpdateExerciseRequest {
                    similar_exercise_ids: Some(vec![]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(cleared.similar_exercises.is_empty());
    }

    #[tokio::test]
    async fn test_missing_similar_ids_are_all_reported() {
        let service = ExerciseService::new(Arc::new(MemoryStore::new()));
        let ghost_a = Uuid::new_v4();
        let ghost_b = Uuid::new_v4();

        let result = service
            .create_exercise(create_request("A", Some(vec![ghost_a, ghost_b])))
            .await;

        assert_matches!(result, Err(ApiError::NotFound(message)) => {
            assert_eq!(
                message,
                format!("Similar exercises not found with IDs: {ghost_a}, {ghost_b}")
            );
        });
    }

    #[tokio::test]
    async fn test_unknown_group_is_not_found() {
        let service = ExerciseService::new(Arc::new(MemoryStore::new()));
        let group_id = Uuid::new_v4();
        let mut request = create_request("A", None);
        request.exercise_group_id = Some(group_id);

        assert_matches!(
            service.create_exercise(request).await,
            Err(ApiError::NotFound(message)) if message == format!("ExerciseGroup with ID \"{group_id}\" not found")
        );
    }

    #[tokio::test]
    async fn test_unknown_enum_filter_is_ignored() {
        let service = ExerciseService::new(Arc::new(MemoryStore::new()));
        service.create_exercise(create_request("Bench press", None)).await.unwrap();

        let listed = service
            .list_exercises(ExerciseListQuery {
                exercise_type: Some("DANCING".to_string()),
                muscle_group: Some("chest".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(listed.len(), 1);
    }
}
