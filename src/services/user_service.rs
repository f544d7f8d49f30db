use tracing::info;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::error::{ApiError, ApiResult};
use crate::models::{CreateUserRequest, NewUser, UpdateUserRequest, UserChanges, UserResponse};
use crate::services::not_found;
use crate::store::{SharedStore, StoreError};

const EMAIL_TAKEN: &str = "User with this email already exists";

#[derive(Clone)]
pub struct UserService {
    store: SharedStore,
}

impl UserService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> ApiResult<UserResponse> {
        if self.store.find_user_by_email(&request.email).await?.is_some() {
            return Err(ApiError::Conflict(EMAIL_TAKEN.to_string()));
        }

        let password_hash = hash_password(&request.password)?;

        let user = self
            .store
            .insert_user(NewUser {
                email: request.email,
                password_hash,
                name: request.name,
                role: request.role.unwrap_or_default(),
                age: request.age,
                weight: request.weight,
                height: request.height,
                avatar: request.avatar,
            })
            .await
            .map_err(email_conflict)?;

        info!(user_id = %user.id, "Created user");
        Ok(user.into())
    }

    pub async fn list_users(&self) -> ApiResult<Vec<UserResponse>> {
        let users = self.store.list_users().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn get_user(&self, id: Uuid) -> ApiResult<UserResponse> {
        self.store
            .find_user(id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| not_found("User", id))
    }

    pub async fn update_user(&self, id: Uuid, request: UpdateUserRequest) -> ApiResult<UserResponse> {
        if self.store.find_user(id).await?.is_none() {
            return Err(not_found("User", id));
        }

        if let Some(email) = &request.email {
            if let Some(owner) = self.store.find_user_by_email(email).await? {
                if owner.id != id {
                    return Err(ApiError::Conflict(EMAIL_TAKEN.to_string()));
                }
            }
        }

        let password_hash = request.password.as_deref().map(hash_password).transpose()?;

        let changes = UserChanges {
            email: request.email,
            password_hash,
            name: request.name,
            role: request.role,
            age: request.age,
            weight: request.weight,
            height: request.height,
            avatar: request.avatar,
        };

        self.store
            .update_user(id, changes)
            .await
            .map_err(email_conflict)?
            .map(UserResponse::from)
            .ok_or_else(|| not_found("User", id))
    }

    pub async fn delete_user(&self, id: Uuid) -> ApiResult<UserResponse> {
        let user = self
            .store
            .delete_user(id)
            .await?
            .ok_or_else(|| not_found("User", id))?;

        info!(user_id = %id, "Deleted user");
        Ok(user.into())
    }
}

/// A unique violation that slipped past the pre-check is still a duplicate
/// email.
fn email_conflict(err: StoreError) -> ApiError {
    match err {
        StoreError::Conflict(_) => ApiError::Conflict(EMAIL_TAKEN.to_string()),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;

    use super::*;
    use crate::auth::UserRole;
    use crate::store::{MemoryStore, UserStore};

    fn create_request(email: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.to_string(),
            password: "secret1".to_string(),
            name: Some("Ana".to_string()),
            role: None,
            age: Some(31),
            weight: None,
            height: None,
            avatar: None,
        }
    }

    #[tokio::test]
    async fn test_create_user_hashes_password_and_defaults_role() {
        let store = Arc::new(MemoryStore::new());
        let service = UserService::new(store.clone());

        let user = service.create_user(create_request("ana@example.com")).await.unwrap();
        assert_eq!(user.role, UserRole::Student);

        let stored = store.find_user(user.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "secret1");
        assert!(stored.password_hash.starts_with("$2"));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_conflict() {
        let store = Arc::new(MemoryStore::new());
        let service = UserService::new(store.clone());

        service.create_user(create_request("ana@example.com")).await.unwrap();
        let second = service.create_user(create_request("ana@example.com")).await;

        assert_matches!(second, Err(ApiError::Conflict(message)) if message == EMAIL_TAKEN);
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_to_taken_email_is_a_conflict() {
        let service = UserService::new(Arc::new(MemoryStore::new()));
        service.create_user(create_request("ana@example.com")).await.unwrap();
        let bruno = service.create_user(create_request("bruno@example.com")).await.unwrap();

        let result = service
            .update_user(
                bruno.id,
                UpdateUserRequest {
                    email: Some("ana@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert_matches!(result, Err(ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_short_password_is_rejected() {
        let service = UserService::new(Arc::new(MemoryStore::new()));
        let mut request = create_request("ana@example.com");
        request.password = "abc".to_string();

        assert_matches!(service.create_user(request).await, Err(ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let service = UserService::new(Arc::new(MemoryStore::new()));
        let id = Uuid::new_v4();

        assert_matches!(service.get_user(id).await, Err(ApiError::NotFound(_)));
        assert_matches!(service.delete_user(id).await, Err(ApiError::NotFound(_)));
    }
}
