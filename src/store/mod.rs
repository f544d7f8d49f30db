//! Persistence gateway.
//!
//! One async trait per entity, combined into [`Store`] so services can share
//! a single `Arc<dyn Store>`. Two adapters exist: [`PgStore`] on PostgreSQL
//! and [`MemoryStore`] for development and tests. Both give the same
//! observable behavior, including cascade rules and the atomicity of
//! multi-row writes.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    AssessmentChanges, Exercise, ExerciseChanges, ExerciseDetails, ExerciseFilter,
    ExerciseGroup, ExerciseGroupChanges, ExerciseGroupDetails, ExerciseGroupFilter,
    NewAssessment, NewExercise, NewExerciseGroup, NewSubscription, NewUser, NewWorkout,
    NewWorkoutSession, PhysicalAssessment, PlanExerciseChanges, PlanExerciseInput,
    Subscription, SubscriptionChanges, User, UserChanges, Workout, WorkoutChanges,
    WorkoutDetails, WorkoutFilter, WorkoutPlanExercise, WorkoutSession, WorkoutSessionChanges,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    Conflict(String),
    #[error("Referenced record does not exist: {0}")]
    MissingReference(String),
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            if db_err.is_unique_violation() {
                return StoreError::Conflict(constraint);
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::MissingReference(constraint);
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// All users, oldest first.
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>>;

    /// Cascades to the user's assessments and subscriptions and unassigns
    /// their workouts.
    async fn delete_user(&self, id: Uuid) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait ExerciseGroupStore: Send + Sync {
    async fn find_exercise_group(&self, id: Uuid) -> StoreResult<Option<ExerciseGroup>>;

    async fn find_exercise_group_details(
        &self,
        id: Uuid,
    ) -> StoreResult<Option<ExerciseGroupDetails>>;

    /// Ordered by title ascending.
    async fn list_exercise_groups(
        &self,
        filter: &ExerciseGroupFilter,
    ) -> StoreResult<Vec<ExerciseGroupDetails>>;

    /// Creates the group and moves `exercise_ids` into it atomically.
    async fn insert_exercise_group(
        &self,
        group: NewExerciseGroup,
        exercise_ids: &[Uuid],
    ) -> StoreResult<ExerciseGroupDetails>;

    /// When `exercise_ids` is given the membership is reconciled to exactly
    /// that set in the same transaction as the scalar changes.
    async fn update_exercise_group(
        &self,
        id: Uuid,
        changes: ExerciseGroupChanges,
        exercise_ids: Option<&[Uuid]>,
    ) -> StoreResult<Option<ExerciseGroupDetails>>;

    /// Member exercises are detached, not deleted.
    async fn delete_exercise_group(&self, id: Uuid) -> StoreResult<Option<ExerciseGroup>>;
}

#[async_trait]
pub trait ExerciseStore: Send + Sync {
    async fn find_exercise(&self, id: Uuid) -> StoreResult<Option<Exercise>>;

    /// The subset of `ids` that exist.
    async fn existing_exercise_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Uuid>>;

    async fn find_exercise_details(&self, id: Uuid) -> StoreResult<Option<ExerciseDetails>>;

    async fn list_exercises(&self, filter: &ExerciseFilter) -> StoreResult<Vec<ExerciseDetails>>;

    /// Creates the exercise and its outgoing similar links atomically.
    async fn insert_exercise(
        &self,
        exercise: NewExercise,
        similar_ids: &[Uuid],
    ) -> StoreResult<ExerciseDetails>;

    /// When `similar_ids` is given the outgoing similar links are reconciled
    /// to exactly that set in the same transaction as the scalar changes.
    async fn update_exercise(
        &self,
        id: Uuid,
        changes: ExerciseChanges,
        similar_ids: Option<&[Uuid]>,
    ) -> StoreResult<Option<ExerciseDetails>>;

    /// Link rows on both sides go with the exercise.
    async fn delete_exercise(&self, id: Uuid) -> StoreResult<Option<Exercise>>;
}

#[async_trait]
pub trait WorkoutStore: Send + Sync {
    async fn find_workout(&self, id: Uuid) -> StoreResult<Option<Workout>>;

    async fn find_workout_details(&self, id: Uuid) -> StoreResult<Option<WorkoutDetails>>;

    /// Ordered by start date, newest first.
    async fn list_workouts(&self, filter: &WorkoutFilter) -> StoreResult<Vec<WorkoutDetails>>;

    async fn insert_workout(
        &self,
        workout: NewWorkout,
        plan: &[PlanExerciseInput],
    ) -> StoreResult<WorkoutDetails>;

    /// Scalar changes and, when `plan` is given, plan reconciliation run in
    /// one transaction. `Ok(None)` means the workout could not be read back.
    async fn update_workout(
        &self,
        id: Uuid,
        changes: WorkoutChanges,
        plan: Option<&[PlanExerciseInput]>,
    ) -> StoreResult<Option<WorkoutDetails>>;

    /// Plan rows and sessions cascade.
    async fn delete_workout(&self, id: Uuid) -> StoreResult<Option<Workout>>;
}

#[async_trait]
pub trait PlanExerciseStore: Send + Sync {
    async fn find_plan_exercise(&self, id: Uuid) -> StoreResult<Option<WorkoutPlanExercise>>;

    /// Ordered by `order`, then creation time.
    async fn list_plan_exercises(&self, workout_id: Uuid) -> StoreResult<Vec<WorkoutPlanExercise>>;

    async fn insert_plan_exercise(
        &self,
        workout_id: Uuid,
        input: PlanExerciseInput,
    ) -> StoreResult<WorkoutPlanExercise>;

    async fn update_plan_exercise(
        &self,
        id: Uuid,
        changes: PlanExerciseChanges,
    ) -> StoreResult<Option<WorkoutPlanExercise>>;

    async fn delete_plan_exercise(&self, id: Uuid) -> StoreResult<Option<WorkoutPlanExercise>>;

    /// Returns the number of rows removed.
    async fn delete_plan_exercises_for_workout(&self, workout_id: Uuid) -> StoreResult<u64>;
}

#[async_trait]
pub trait WorkoutSessionStore: Send + Sync {
    async fn find_workout_session(&self, id: Uuid) -> StoreResult<Option<WorkoutSession>>;

    /// Newest first, optionally restricted to one workout.
    async fn list_workout_sessions(
        &self,
        workout_id: Option<Uuid>,
    ) -> StoreResult<Vec<WorkoutSession>>;

    async fn insert_workout_session(&self, session: NewWorkoutSession)
        -> StoreResult<WorkoutSession>;

    async fn update_workout_session(
        &self,
        id: Uuid,
        changes: WorkoutSessionChanges,
    ) -> StoreResult<Option<WorkoutSession>>;

    async fn delete_workout_session(&self, id: Uuid) -> StoreResult<Option<WorkoutSession>>;
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn find_subscription(&self, id: Uuid) -> StoreResult<Option<Subscription>>;

    /// Newest start date first, optionally restricted to one user.
    async fn list_subscriptions(&self, user_id: Option<Uuid>) -> StoreResult<Vec<Subscription>>;

    async fn insert_subscription(&self, subscription: NewSubscription)
        -> StoreResult<Subscription>;

    async fn update_subscription(
        &self,
        id: Uuid,
        changes: SubscriptionChanges,
    ) -> StoreResult<Option<Subscription>>;

    async fn delete_subscription(&self, id: Uuid) -> StoreResult<Option<Subscription>>;
}

#[async_trait]
pub trait AssessmentStore: Send + Sync {
    async fn find_assessment(&self, id: Uuid) -> StoreResult<Option<PhysicalAssessment>>;

    /// Newest first.
    async fn list_assessments_for_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<PhysicalAssessment>>;

    async fn insert_assessment(&self, assessment: NewAssessment)
        -> StoreResult<PhysicalAssessment>;

    async fn update_assessment(
        &self,
        id: Uuid,
        changes: AssessmentChanges,
    ) -> StoreResult<Option<PhysicalAssessment>>;

    async fn delete_assessment(&self, id: Uuid) -> StoreResult<Option<PhysicalAssessment>>;
}

/// Every entity gateway behind one object.
pub trait Store:
    UserStore
    + ExerciseGroupStore
    + ExerciseStore
    + WorkoutStore
    + PlanExerciseStore
    + WorkoutSessionStore
    + SubscriptionStore
    + AssessmentStore
{
}

impl<T> Store for T where
    T: UserStore
        + ExerciseGroupStore
        + ExerciseStore
        + WorkoutStore
        + PlanExerciseStore
        + WorkoutSessionStore
        + SubscriptionStore
        + AssessmentStore
{
}

pub type SharedStore = Arc<dyn Store>;
