use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::{
    CreateWorkoutSessionRequest, NewWorkoutSession, UpdateWorkoutSessionRequest, WorkoutSession,
    WorkoutSessionChanges,
};
use crate::services::not_found;
use crate::store::SharedStore;

#[derive(Clone)]
pub struct WorkoutSessionService {
    store: SharedStore,
}

impl WorkoutSessionService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create_workout_session(
        &self,
        request: CreateWorkoutSessionRequest,
    ) -> ApiResult<WorkoutSession> {
        self.require_workout(request.workout_id).await?;
        Ok(self
            .store
            .insert_workout_session(NewWorkoutSession::from(request))
            .await?)
    }

    /// An unknown `workout_id` yields an empty list rather than Not-Found.
    pub async fn list_workout_sessions(
        &self,
        workout_id: Option<Uuid>,
    ) -> ApiResult<Vec<WorkoutSession>> {
        Ok(self.store.list_workout_sessions(workout_id).await?)
    }

    pub async fn get_workout_session(&self, id: Uuid) -> ApiResult<WorkoutSession> {
        self.store
            .find_workout_session(id)
            .await?
            .ok_or_else(|| not_found("Workout session", id))
    }

    pub async fn update_workout_session(
        &self,
        id: Uuid,
        request: UpdateWorkoutSessionRequest,
    ) -> ApiResult<WorkoutSession> {
        if self.store.find_workout_session(id).await?.is_none() {
            return Err(not_found("Workout session", id));
        }
        if let Some(workout_id) = request.workout_id {
            self.require_workout(workout_id).await?;
        }

        self.store
            .update_workout_session(id, WorkoutSessionChanges::from(request))
            .await?
            .ok_or_else(|| not_found("Workout session", id))
    }

    pub async fn delete_workout_session(&self, id: Uuid) -> ApiResult<WorkoutSession> {
        self.store
            .delete_workout_session(id)
            .await?
            .ok_or_else(|| not_found("Workout session", id))
    }

    async fn require_workout(&self, workout_id: Uuid) -> ApiResult<()> {
        match self.store.find_workout(workout_id).await? {
            Some(_) => Ok(()),
            None => Err(not_found("Workout", workout_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::error::ApiError;
    use crate::models::{NewWorkout, SessionIntensity};
    use crate::store::{MemoryStore, WorkoutStore};

    async fn seed_workout(store: &MemoryStore) -> Uuid {
        store
            .insert_workout(
                NewWorkout {
                    title: "Legs".to_string(),
                    description: None,
                    start_date: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
                    end_date: None,
                    frequency: None,
                    level: None,
                    user_id: None,
                },
                &[],
            )
            .await
            .unwrap()
            .workout
            .id
    }

    fn session_for(workout_id: Uuid) -> CreateWorkoutSessionRequest {
        CreateWorkoutSessionRequest {
            workout_id,
            date: Utc.with_ymd_and_hms(2025, 3, 2, 18, 0, 0).unwrap(),
            duration: 50,
            feedback: None,
            intensity: SessionIntensity::Medium,
        }
    }

    #[tokio::test]
    async fn test_create_requires_workout() {
        let service = WorkoutSessionService::new(Arc::new(MemoryStore::new()));
        let ghost = Uuid::new_v4();

        assert_matches!(
            service.create_workout_session(session_for(ghost)).await,
            Err(ApiError::NotFound(message)) if message == format!("Workout with ID \"{ghost}\" not found")
        );
    }

    #[tokio::test]
    async fn test_list_for_unknown_workout_is_empty() {
        let store = Arc::new(MemoryStore::new());
        let workout_id = seed_workout(&store).await;
        let service = WorkoutSessionService::new(store);
        service.create_workout_session(session_for(workout_id)).await.unwrap();

        assert_eq!(service.list_workout_sessions(Some(workout_id)).await.unwrap().len(), 1);
        assert!(service
            .list_workout_sessions(Some(Uuid::new_v4()))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_move_to_missing_workout_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let workout_id = seed_workout(&store).await;
        let service = WorkoutSessionService::new(store);
        let session = service.create_workout_session(session_for(workout_id)).await.unwrap();

        let result = service
            .update_workout_session(
                session.id,
                UpdateWorkoutSessionRequest {
                    workout_id: Some(Uuid::new_v4()),
                    duration: Some(10),
                    ..Default::default()
                },
            )
            .await;

        assert_matches!(result, Err(ApiError::NotFound(_)));
        let stored = service.get_workout_session(session.id).await.unwrap();
        assert_eq!(stored.workout_id, workout_id);
        assert_eq!(stored.duration, 50);
    }
}
