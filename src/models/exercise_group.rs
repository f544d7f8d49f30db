use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::common::Pagination;
use super::Exercise;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseGroup {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseGroupDetails {
    #[serde(flatten)]
    pub group: ExerciseGroup,
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExerciseGroupRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    /// Existing exercises to move into the new group.
    pub exercise_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExerciseGroupRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    /// Replaces the membership when present.
    pub exercise_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseGroupFilter {
    pub skip: Option<u32>,
    pub take: Option<u32>,
    pub title: Option<String>,
}

impl ExerciseGroupFilter {
    pub fn page(&self) -> Pagination {
        Pagination {
            skip: self.skip,
            take: self.take,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewExerciseGroup {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExerciseGroupChanges {
    pub title: Option<String>,
    pub description: Option<String>,
}
