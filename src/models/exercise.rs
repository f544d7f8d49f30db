use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::common::{double_option, Pagination};
use super::ExerciseGroup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "exercise_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExerciseType {
    Strength,
    Cardio,
    Flexibility,
    Balance,
    Functional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "muscle_group", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Biceps,
    Triceps,
    Forearms,
    Abs,
    Glutes,
    Quadriceps,
    Hamstrings,
    Calves,
    FullBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub video: Option<String>,
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,
    pub muscle_group: Option<MuscleGroup>,
    pub exercise_group_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An exercise together with its relations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseDetails {
    #[serde(flatten)]
    pub exercise: Exercise,
    /// Outgoing "similar" links.
    pub similar_exercises: Vec<Exercise>,
    /// Exercises that list this one as similar.
    pub referenced_by_exercises: Vec<Exercise>,
    pub exercise_group: Option<ExerciseGroup>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExerciseRequest {
    #[validate(length(min = 1, max = 200, message = "title must not be empty"))]
    pub title: String,
    pub description: Option<String>,
    #[validate(url)]
    pub image: Option<String>,
    #[validate(url)]
    pub video: Option<String>,
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,
    pub muscle_group: Option<MuscleGroup>,
    pub exercise_group_id: Option<Uuid>,
    pub similar_exercise_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExerciseRequest {
    #[validate(length(min = 1, max = 200, message = "title must not be empty"))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(url)]
    pub image: Option<String>,
    #[validate(url)]
    pub video: Option<String>,
    #[serde(rename = "type")]
    pub exercise_type: Option<ExerciseType>,
    pub muscle_group: Option<MuscleGroup>,
    /// `null` detaches the exercise from its group.
    #[serde(default, deserialize_with = "double_option")]
    pub exercise_group_id: Option<Option<Uuid>>,
    pub similar_exercise_ids: Option<Vec<Uuid>>,
}

/// Raw list query. Enum filters stay strings so unknown values can be
/// ignored instead of rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseListQuery {
    pub skip: Option<u32>,
    pub take: Option<u32>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub exercise_type: Option<String>,
    pub muscle_group: Option<String>,
    pub exercise_group_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct ExerciseFilter {
    pub page: Pagination,
    pub title: Option<String>,
    pub exercise_type: Option<ExerciseType>,
    pub muscle_group: Option<MuscleGroup>,
    pub exercise_group_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewExercise {
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub video: Option<String>,
    pub exercise_type: ExerciseType,
    pub muscle_group: Option<MuscleGroup>,
    pub exercise_group_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct ExerciseChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub video: Option<String>,
    pub exercise_type: Option<ExerciseType>,
    pub muscle_group: Option<MuscleGroup>,
    pub exercise_group_id: Option<Option<Uuid>>,
}

impl ExerciseChanges {
    pub fn apply_to(&self, exercise: &mut Exercise) {
        if let Some(title) = &self.title {
            exercise.title = title.clone();
        }
        if let Some(description) = &self.description {
            exercise.description = Some(description.clone());
        }
        if let Some(image) = &self.image {
            exercise.image = Some(image.clone());
        }
        if let Some(video) = &self.video {
            exercise.video = Some(video.clone());
        }
        if let Some(exercise_type) = self.exercise_type {
            exercise.exercise_type = exercise_type;
        }
        if let Some(muscle_group) = self.muscle_group {
            exercise.muscle_group = Some(muscle_group);
        }
        if let Some(group) = self.exercise_group_id {
            exercise.exercise_group_id = group;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::common::parse_enum;

    #[test]
    fn test_exercise_serializes_type_field() {
        let now = Utc::now();
        let exercise = Exercise {
            id: Uuid::new_v4(),
            title: "Bench Press".to_string(),
            description: None,
            image: None,
            video: None,
            exercise_type: ExerciseType::Strength,
            muscle_group: Some(MuscleGroup::FullBody),
            exercise_group_id: None,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&exercise).unwrap();
        assert_eq!(json["type"], "STRENGTH");
        assert_eq!(json["muscleGroup"], "FULL_BODY");
        assert!(json.get("exerciseGroupId").is_some());
    }

    #[test]
    fn test_update_request_group_null_vs_absent() {
        let absent: UpdateExerciseRequest = serde_json::from_str(r#"{"title":"Row"}"#).unwrap();
        assert_eq!(absent.exercise_group_id, None);

        let detach: UpdateExerciseRequest =
            serde_json::from_str(r#"{"exerciseGroupId":null}"#).unwrap();
        assert_eq!(detach.exercise_group_id, Some(None));
    }

    #[test]
    fn test_parse_enum_filters() {
        assert_eq!(parse_enum::<ExerciseType>("cardio"), Some(ExerciseType::Cardio));
        assert_eq!(parse_enum::<MuscleGroup>("FULL_BODY"), Some(MuscleGroup::FullBody));
        assert_eq!(parse_enum::<MuscleGroup>("wings"), None);
    }
}
