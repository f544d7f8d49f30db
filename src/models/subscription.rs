use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::common::iso_date;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_name: String,
    pub plan_value: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The owning user comes from the bearer token, not the body.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    #[validate(length(min = 1, max = 100))]
    pub plan_name: String,
    #[validate(range(min = 0.0))]
    pub plan_value: f64,
    #[serde(deserialize_with = "iso_date::deserialize")]
    pub start_date: DateTime<Utc>,
    #[serde(deserialize_with = "iso_date::deserialize")]
    pub end_date: DateTime<Utc>,
    #[serde(default, deserialize_with = "iso_date::option")]
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionRequest {
    /// Transfers the subscription to another user.
    pub user_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100))]
    pub plan_name: Option<String>,
    #[validate(range(min = 0.0))]
    pub plan_value: Option<f64>,
    #[serde(default, deserialize_with = "iso_date::option")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "iso_date::option")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "iso_date::option")]
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionQuery {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub user_id: Uuid,
    pub plan_name: String,
    pub plan_value: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
}

impl NewSubscription {
    pub fn for_user(user_id: Uuid, request: CreateSubscriptionRequest) -> Self {
        Self {
            user_id,
            plan_name: request.plan_name,
            plan_value: request.plan_value,
            start_date: request.start_date,
            end_date: request.end_date,
            payment_date: request.payment_date,
            payment_status: request.payment_status.unwrap_or_default(),
            notes: request.notes,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubscriptionChanges {
    pub user_id: Option<Uuid>,
    pub plan_name: Option<String>,
    pub plan_value: Option<f64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
}

impl From<UpdateSubscriptionRequest> for SubscriptionChanges {
    fn from(request: UpdateSubscriptionRequest) -> Self {
        Self {
            user_id: request.user_id,
            plan_name: request.plan_name,
            plan_value: request.plan_value,
            start_date: request.start_date,
            end_date: request.end_date,
            payment_date: request.payment_date,
            payment_status: request.payment_status,
            notes: request.notes,
        }
    }
}

impl SubscriptionChanges {
    pub fn apply_to(&self, subscription: &mut Subscription) {
        if let Some(user_id) = self.user_id {
            subscription.user_id = user_id;
        }
        if let Some(plan_name) = &self.plan_name {
            subscription.plan_name = plan_name.clone();
        }
        if let Some(plan_value) = self.plan_value {
            subscription.plan_value = plan_value;
        }
        if let Some(start_date) = self.start_date {
            subscription.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            subscription.end_date = end_date;
        }
        if let Some(payment_date) = self.payment_date {
            subscription.payment_date = Some(payment_date);
        }
        if let Some(payment_status) = self.payment_status {
            subscription.payment_status = payment_status;
        }
        if let Some(notes) = &self.notes {
            subscription.notes = Some(notes.clone());
        }
    }
}
