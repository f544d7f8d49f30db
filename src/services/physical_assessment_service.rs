use chrono::Utc;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    AssessmentChanges, CreateAssessmentRequest, NewAssessment, PhysicalAssessment,
    UpdateAssessmentRequest,
};
use crate::services::not_found;
use crate::store::SharedStore;

#[derive(Clone)]
pub struct PhysicalAssessmentService {
    store: SharedStore,
}

impl PhysicalAssessmentService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create_assessment(
        &self,
        request: CreateAssessmentRequest,
    ) -> ApiResult<PhysicalAssessment> {
        self.require_user(request.user_id).await?;

        Ok(self
            .store
            .insert_assessment(NewAssessment {
                user_id: request.user_id,
                date: request.date.unwrap_or_else(Utc::now),
                measurements: request.measurements,
                anamnesis: request.anamnesis,
                notes: request.notes,
            })
            .await?)
    }

    pub async fn list_assessments_by_user(
        &self,
        user_id: Uuid,
    ) -> ApiResult<Vec<PhysicalAssessment>> {
        self.require_user(user_id).await?;
        Ok(self.store.list_assessments_for_user(user_id).await?)
    }

    pub async fn get_assessment(&self, id: Uuid) -> ApiResult<PhysicalAssessment> {
        self.store
            .find_assessment(id)
            .await?
            .ok_or_else(|| not_found("PhysicalAssessment", id))
    }

    pub async fn update_assessment(
        &self,
        id: Uuid,
        request: UpdateAssessmentRequest,
    ) -> ApiResult<PhysicalAssessment> {
        if self.store.find_assessment(id).await?.is_none() {
            return Err(not_found("PhysicalAssessment", id));
        }
        if let Some(user_id) = request.user_id {
            if self.store.find_user(user_id).await?.is_none() {
                return Err(ApiError::NotFound(format!(
                    "User with ID \"{user_id}\" not found for re-assignment"
                )));
            }
        }

        self.store
            .update_assessment(id, AssessmentChanges::from(request))
            .await?
            .ok_or_else(|| not_found("PhysicalAssessment", id))
    }

    pub async fn delete_assessment(&self, id: Uuid) -> ApiResult<PhysicalAssessment> {
        self.store
            .delete_assessment(id)
            .await?
            .ok_or_else(|| not_found("PhysicalAssessment", id))
    }

    async fn require_user(&self, user_id: Uuid) -> ApiResult<()> {
        match self.store.find_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(not_found("User", user_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;

    use super::*;
    use crate::auth::UserRole;
    use crate::models::{Measurements, NewUser};
    use crate::store::{MemoryStore, UserStore};

    async fn seed_user(store: &MemoryStore) -> Uuid {
        store
            .insert_user(NewUser {
                email: "athlete@example.com".to_string(),
                password_hash: "hash".to_string(),
                name: None,
                role: UserRole::Student,
                age: None,
                weight: None,
                height: None,
                avatar: None,
            })
            .await
            .unwrap()
            .id
    }

    fn assessment_for(user_id: Uuid) -> CreateAssessmentRequest {
        CreateAssessmentRequest {
            user_id,
            date: None,
            measurements: Measurements {
                weight_kg: Some(74.0),
                ..Default::default()
            },
            anamnesis: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_date_defaults_to_now() {
        let store = Arc::new(MemoryStore::new());
        let user_id = seed_user(&store).await;
        let service = PhysicalAssessmentService::new(store);

        let before = Utc::now();
        let assessment = service.create_assessment(assessment_for(user_id)).await.unwrap();

        assert!(assessment.date >= before);
        assert!(assessment.date <= Utc::now());
        assert_eq!(assessment.weight_kg, Some(74.0));
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let service = PhysicalAssessmentService::new(Arc::new(MemoryStore::new()));
        let ghost = Uuid::new_v4();

        assert_matches!(
            service.create_assessment(assessment_for(ghost)).await,
            Err(ApiError::NotFound(_))
        );
        assert_matches!(
            service.list_assessments_by_user(ghost).await,
            Err(ApiError::NotFound(message)) if message == format!("User with ID \"{ghost}\" not found")
        );
    }

    #[tokio::test]
    async fn test_reassignment_to_missing_user_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let user_id = seed_user(&store).await;
        let service = PhysicalAssessmentService::new(store);
        let assessment = service.create_assessment(assessment_for(user_id)).await.unwrap();

        let result = service
            .update_assessment(
                assessment.id,
                UpdateAssessmentRequest {
                    user_id: Some(Uuid::new_v4()),
                    ..Default::default()
                },
            )
            .await;

        assert_matches!(
            result,
            Err(ApiError::NotFound(message)) if message.ends_with("not found for re-assignment")
        );
        assert_eq!(service.list_assessments_by_user(user_id).await.unwrap().len(), 1);
    }
}
