use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::common::iso_date;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalAssessment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub body_fat_percentage: Option<f64>,
    pub waist_cm: Option<f64>,
    pub hip_cm: Option<f64>,
    pub chest_cm: Option<f64>,
    pub arm_left_cm: Option<f64>,
    pub arm_right_cm: Option<f64>,
    pub leg_left_cm: Option<f64>,
    pub leg_right_cm: Option<f64>,
    pub anamnesis: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body measurements shared by create and update payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Measurements {
    #[validate(range(min = 0.0))]
    pub weight_kg: Option<f64>,
    #[validate(range(min = 0.0))]
    pub height_cm: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub body_fat_percentage: Option<f64>,
    #[validate(range(min = 0.0))]
    pub waist_cm: Option<f64>,
    #[validate(range(min = 0.0))]
    pub hip_cm: Option<f64>,
    #[validate(range(min = 0.0))]
    pub chest_cm: Option<f64>,
    #[validate(range(min = 0.0))]
    pub arm_left_cm: Option<f64>,
    #[validate(range(min = 0.0))]
    pub arm_right_cm: Option<f64>,
    #[validate(range(min = 0.0))]
    pub leg_left_cm: Option<f64>,
    #[validate(range(min = 0.0))]
    pub leg_right_cm: Option<f64>,
}

impl Measurements {
    fn apply_to(&self, assessment: &mut PhysicalAssessment) {
        let pairs = [
            (self.weight_kg, &mut assessment.weight_kg),
            (self.height_cm, &mut assessment.height_cm),
            (self.body_fat_percentage, &mut assessment.body_fat_percentage),
            (self.waist_cm, &mut assessment.waist_cm),
            (self.hip_cm, &mut assessment.hip_cm),
            (self.chest_cm, &mut assessment.chest_cm),
            (self.arm_left_cm, &mut assessment.arm_left_cm),
            (self.arm_right_cm, &mut assessment.arm_right_cm),
            (self.leg_left_cm, &mut assessment.leg_left_cm),
            (self.leg_right_cm, &mut assessment.leg_right_cm),
        ];
        for (value, slot) in pairs {
            if value.is_some() {
                *slot = value;
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssessmentRequest {
    pub user_id: Uuid,
    /// Defaults to the time of the request.
    #[serde(default, deserialize_with = "iso_date::option")]
    pub date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    #[validate(nested)]
    pub measurements: Measurements,
    pub anamnesis: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssessmentRequest {
    /// Re-assigns the assessment to another user.
    pub user_id: Option<Uuid>,
    #[serde(default, deserialize_with = "iso_date::option")]
    pub date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    #[validate(nested)]
    pub measurements: Measurements,
    pub anamnesis: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAssessment {
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    pub measurements: Measurements,
    pub anamnesis: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AssessmentChanges {
    pub user_id: Option<Uuid>,
    pub date: Option<DateTime<Utc>>,
    pub measurements: Measurements,
    pub anamnesis: Option<String>,
    pub notes: Option<String>,
}

impl From<UpdateAssessmentRequest> for AssessmentChanges {
    fn from(request: UpdateAssessmentRequest) -> Self {
        Self {
            user_id: request.user_id,
            date: request.date,
            measurements: request.measurements,
            anamnesis: request.anamnesis,
            notes: request.notes,
        }
    }
}

impl AssessmentChanges {
    pub fn apply_to(&self, assessment: &mut PhysicalAssessment) {
        if let Some(user_id) = self.user_id {
            assessment.user_id = user_id;
        }
        if let Some(date) = self.date {
            assessment.date = date;
        }
        self.measurements.apply_to(assessment);
        if let Some(anamnesis) = &self.anamnesis {
            assessment.anamnesis = Some(anamnesis.clone());
        }
        if let Some(notes) = &self.notes {
            assessment.notes = Some(notes.clone());
        }
    }
}
