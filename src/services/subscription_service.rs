use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreateSubscriptionRequest, NewSubscription, Subscription, SubscriptionChanges,
    UpdateSubscriptionRequest,
};
use crate::services::not_found;
use crate::store::SharedStore;

#[derive(Clone)]
pub struct SubscriptionService {
    store: SharedStore,
}

impl SubscriptionService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// `user_id` is the authenticated caller, not a body field.
    pub async fn create_subscription(
        &self,
        user_id: Uuid,
        request: CreateSubscriptionRequest,
    ) -> ApiResult<Subscription> {
        if self.store.find_user(user_id).await?.is_none() {
            return Err(not_found("User", user_id));
        }

        let subscription = self
            .store
            .insert_subscription(NewSubscription::for_user(user_id, request))
            .await?;

        info!(subscription_id = %subscription.id, user_id = %user_id, "Created subscription");
        Ok(subscription)
    }

    pub async fn list_subscriptions(&self, user_id: Option<Uuid>) -> ApiResult<Vec<Subscription>> {
        if let Some(user_id) = user_id {
            if self.store.find_user(user_id).await?.is_none() {
                return Err(not_found("User", user_id));
            }
        }
        Ok(self.store.list_subscriptions(user_id).await?)
    }

    pub async fn get_subscription(&self, id: Uuid) -> ApiResult<Subscription> {
        self.store
            .find_subscription(id)
            .await?
            .ok_or_else(|| not_found("Subscription", id))
    }

    pub async fn update_subscription(
        &self,
        id: Uuid,
        request: UpdateSubscriptionRequest,
    ) -> ApiResult<Subscription> {
        if self.store.find_subscription(id).await?.is_none() {
            return Err(not_found("Subscription", id));
        }
        if let Some(user_id) = request.user_id {
            if self.store.find_user(user_id).await?.is_none() {
                return Err(ApiError::NotFound(format!(
                    "User with ID \"{user_id}\" not found for transfer"
                )));
            }
        }

        self.store
            .update_subscription(id, SubscriptionChanges::from(request))
            .await?
            .ok_or_else(|| not_found("Subscription", id))
    }

    pub async fn delete_subscription(&self, id: Uuid) -> ApiResult<Subscription> {
        self.store
            .delete_subscription(id)
            .await?
            .ok_or_else(|| not_found("Subscription", id))
    }
}
