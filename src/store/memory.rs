use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AssessmentStore, ExerciseGroupStore, ExerciseStore, PlanExerciseStore, StoreError,
    StoreResult, SubscriptionStore, UserStore, WorkoutSessionStore, WorkoutStore,
};
use crate::models::{
    AssessmentChanges, Exercise, ExerciseChanges, ExerciseDetails, ExerciseFilter,
    ExerciseGroup, ExerciseGroupChanges, ExerciseGroupDetails, ExerciseGroupFilter,
    NewAssessment, NewExercise, NewExerciseGroup, NewSubscription, NewUser, NewWorkout,
    NewWorkoutSession, PhysicalAssessment, PlanExerciseChanges, PlanExerciseInput,
    PlanExerciseWithExercise, Subscription, SubscriptionChanges, User, UserChanges, Workout,
    WorkoutChanges, WorkoutDetails, WorkoutFilter, WorkoutPlanExercise, WorkoutSession,
    WorkoutSessionChanges,
};
use crate::relations::{dedup, IdDiff, PlanDiff};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    exercise_groups: Vec<ExerciseGroup>,
    exercises: Vec<Exercise>,
    /// `(exercise_id, similar_id)` link rows in insertion order.
    similar: Vec<(Uuid, Uuid)>,
    workouts: Vec<Workout>,
    plan_exercises: Vec<WorkoutPlanExercise>,
    sessions: Vec<WorkoutSession>,
    subscriptions: Vec<Subscription>,
    assessments: Vec<PhysicalAssessment>,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn missing_reference(what: &str, id: Uuid) -> StoreError {
    StoreError::MissingReference(format!("{what} {id}"))
}

impl Tables {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn exercise(&self, id: Uuid) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    fn group(&self, id: Uuid) -> Option<&ExerciseGroup> {
        self.exercise_groups.iter().find(|g| g.id == id)
    }

    fn workout(&self, id: Uuid) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == id)
    }

    fn require_exercises(&self, ids: &[Uuid]) -> StoreResult<()> {
        match ids.iter().find(|id| self.exercise(**id).is_none()) {
            Some(id) => Err(missing_reference("exercise", *id)),
            None => Ok(()),
        }
    }

    fn require_user(&self, id: Option<Uuid>) -> StoreResult<()> {
        match id {
            Some(id) if self.user(id).is_none() => Err(missing_reference("user", id)),
            _ => Ok(()),
        }
    }

    fn require_group(&self, id: Option<Uuid>) -> StoreResult<()> {
        match id {
            Some(id) if self.group(id).is_none() => Err(missing_reference("exercise group", id)),
            _ => Ok(()),
        }
    }

    fn require_workout(&self, id: Uuid) -> StoreResult<()> {
        match self.workout(id) {
            Some(_) => Ok(()),
            None => Err(missing_reference("workout", id)),
        }
    }

    fn similar_ids(&self, exercise_id: Uuid) -> Vec<Uuid> {
        self.similar
            .iter()
            .filter(|(from, _)| *from == exercise_id)
            .map(|(_, to)| *to)
            .collect()
    }

    fn exercises_by_ids(&self, ids: impl IntoIterator<Item = Uuid>) -> Vec<Exercise> {
        ids.into_iter()
            .filter_map(|id| self.exercise(id).cloned())
            .collect()
    }

    fn exercise_details(&self, exercise: &Exercise) -> ExerciseDetails {
        let referenced_by = self
            .similar
            .iter()
            .filter(|(_, to)| *to == exercise.id)
            .map(|(from, _)| *from)
            .collect::<Vec<_>>();

        ExerciseDetails {
            exercise: exercise.clone(),
            similar_exercises: self.exercises_by_ids(self.similar_ids(exercise.id)),
            referenced_by_exercises: self.exercises_by_ids(referenced_by),
            exercise_group: exercise
                .exercise_group_id
                .and_then(|group_id| self.group(group_id).cloned()),
        }
    }

    fn group_details(&self, group: &ExerciseGroup) -> ExerciseGroupDetails {
        ExerciseGroupDetails {
            group: group.clone(),
            exercises: self
                .exercises
                .iter()
                .filter(|e| e.exercise_group_id == Some(group.id))
                .cloned()
                .collect(),
        }
    }

    fn plan_rows(&self, workout_id: Uuid) -> Vec<WorkoutPlanExercise> {
        // Stable sort keeps insertion order for equal `order` values.
        let mut rows: Vec<WorkoutPlanExercise> = self
            .plan_exercises
            .iter()
            .filter(|row| row.workout_id == workout_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.order);
        rows
    }

    fn workout_details(&self, workout: &Workout) -> WorkoutDetails {
        let plan_exercises = self
            .plan_rows(workout.id)
            .into_iter()
            .filter_map(|row| {
                self.exercise(row.exercise_id)
                    .cloned()
                    .map(|exercise| PlanExerciseWithExercise {
                        plan_exercise: row,
                        exercise,
                    })
            })
            .collect();

        WorkoutDetails {
            workout: workout.clone(),
            plan_exercises,
            user: workout
                .user_id
                .and_then(|user_id| self.user(user_id).cloned().map(Into::into)),
        }
    }

    fn new_plan_row(workout_id: Uuid, input: &PlanExerciseInput) -> WorkoutPlanExercise {
        let now = Utc::now();
        WorkoutPlanExercise {
            id: Uuid::new_v4(),
            workout_id,
            exercise_id: input.exercise_id,
            sets: input.sets,
            reps: input.reps,
            target_load: input.target_load,
            target_rest_time: input.target_rest_time,
            notes: input.notes.clone(),
            order: input.order,
            created_at: now,
            updated_at: now,
        }
    }

    fn remove_exercise_links(&mut self, exercise_id: Uuid) {
        self.similar
            .retain(|(from, to)| *from != exercise_id && *to != exercise_id);
    }

    fn remove_workout_children(&mut self, workout_id: Uuid) {
        self.plan_exercises.retain(|row| row.workout_id != workout_id);
        self.sessions.retain(|s| s.workout_id != workout_id);
    }
}

/// In-process store holding every table behind one lock.
///
/// Each gateway call takes the lock once, so multi-row writes are atomic
/// with respect to other callers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.user(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables.read().await.users.clone())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            role: user.role,
            age: user.age,
            weight: user.weight,
            height: user.height,
            avatar: user.avatar,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &changes.email {
            if tables.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::Conflict("users_email_key".to_string()));
            }
        }

        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(name) = changes.name {
            user.name = Some(name);
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(age) = changes.age {
            user.age = Some(age);
        }
        if let Some(weight) = changes.weight {
            user.weight = Some(weight);
        }
        if let Some(height) = changes.height {
            user.height = Some(height);
        }
        if let Some(avatar) = changes.avatar {
            user.avatar = Some(avatar);
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        let Some(position) = tables.users.iter().position(|u| u.id == id) else {
            return Ok(None);
        };
        let user = tables.users.remove(position);

        tables.assessments.retain(|a| a.user_id != id);
        tables.subscriptions.retain(|s| s.user_id != id);
        for workout in tables.workouts.iter_mut().filter(|w| w.user_id == Some(id)) {
            workout.user_id = None;
        }
        Ok(Some(user))
    }
}

#[async_trait]
impl ExerciseGroupStore for MemoryStore {
    async fn find_exercise_group(&self, id: Uuid) -> StoreResult<Option<ExerciseGroup>> {
        Ok(self.tables.read().await.group(id).cloned())
    }

    async fn find_exercise_group_details(
        &self,
        id: Uuid,
    ) -> StoreResult<Option<ExerciseGroupDetails>> {
        let tables = self.tables.read().await;
        Ok(tables.group(id).map(|group| tables.group_details(group)))
    }

    async fn list_exercise_groups(
        &self,
        filter: &ExerciseGroupFilter,
    ) -> StoreResult<Vec<ExerciseGroupDetails>> {
        let tables = self.tables.read().await;
        let mut groups: Vec<&ExerciseGroup> = tables
            .exercise_groups
            .iter()
            .filter(|g| {
                filter
                    .title
                    .as_deref()
                    .map_or(true, |title| contains_ignore_case(&g.title, title))
            })
            .collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title));

        let details = groups.into_iter().map(|g| tables.group_details(g)).collect();
        Ok(filter.page().apply(details))
    }

    async fn insert_exercise_group(
        &self,
        group: NewExerciseGroup,
        exercise_ids: &[Uuid],
    ) -> StoreResult<ExerciseGroupDetails> {
        let mut tables = self.tables.write().await;
        tables.require_exercises(exercise_ids)?;

        let now = Utc::now();
        let group = ExerciseGroup {
            id: Uuid::new_v4(),
            title: group.title,
            description: group.description,
            created_at: now,
            updated_at: now,
        };
        tables.exercise_groups.push(group.clone());
        for exercise in tables
            .exercises
            .iter_mut()
            .filter(|e| exercise_ids.contains(&e.id))
        {
            exercise.exercise_group_id = Some(group.id);
            exercise.updated_at = now;
        }
        Ok(tables.group_details(&group))
    }

    async fn update_exercise_group(
        &self,
        id: Uuid,
        changes: ExerciseGroupChanges,
        exercise_ids: Option<&[Uuid]>,
    ) -> StoreResult<Option<ExerciseGroupDetails>> {
        let mut tables = self.tables.write().await;
        if tables.group(id).is_none() {
            return Ok(None);
        }
        if let Some(ids) = exercise_ids {
            tables.require_exercises(ids)?;
        }

        let now = Utc::now();
        if let Some(ids) = exercise_ids {
            let current: Vec<Uuid> = tables
                .exercises
                .iter()
                .filter(|e| e.exercise_group_id == Some(id))
                .map(|e| e.id)
                .collect();
            let diff = IdDiff::between(&current, ids);
            for exercise in tables.exercises.iter_mut() {
                if diff.to_connect.contains(&exercise.id) {
                    exercise.exercise_group_id = Some(id);
                    exercise.updated_at = now;
                } else if diff.to_disconnect.contains(&exercise.id) {
                    exercise.exercise_group_id = None;
                    exercise.updated_at = now;
                }
            }
        }

        let Some(group) = tables.exercise_groups.iter_mut().find(|g| g.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            group.title = title;
        }
        if let Some(description) = changes.description {
            group.description = Some(description);
        }
        group.updated_at = now;
        let group = group.clone();

        Ok(Some(tables.group_details(&group)))
    }

    async fn delete_exercise_group(&self, id: Uuid) -> StoreResult<Option<ExerciseGroup>> {
        let mut tables = self.tables.write().await;
        let Some(position) = tables.exercise_groups.iter().position(|g| g.id == id) else {
            return Ok(None);
        };
        let group = tables.exercise_groups.remove(position);
        for exercise in tables
            .exercises
            .iter_mut()
            .filter(|e| e.exercise_group_id == Some(id))
        {
            exercise.exercise_group_id = None;
        }
        Ok(Some(group))
    }
}

#[async_trait]
impl ExerciseStore for MemoryStore {
    async fn find_exercise(&self, id: Uuid) -> StoreResult<Option<Exercise>> {
        Ok(self.tables.read().await.exercise(id).cloned())
    }

    async fn existing_exercise_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Uuid>> {
        let tables = self.tables.read().await;
        Ok(dedup(ids)
            .into_iter()
            .filter(|id| tables.exercise(*id).is_some())
            .collect())
    }

    async fn find_exercise_details(&self, id: Uuid) -> StoreResult<Option<ExerciseDetails>> {
        let tables = self.tables.read().await;
        Ok(tables.exercise(id).map(|e| tables.exercise_details(e)))
    }

    async fn list_exercises(&self, filter: &ExerciseFilter) -> StoreResult<Vec<ExerciseDetails>> {
        let tables = self.tables.read().await;
        let details = tables
            .exercises
            .iter()
            .filter(|e| {
                filter
                    .title
                    .as_deref()
                    .map_or(true, |title| contains_ignore_case(&e.title, title))
            })
            .filter(|e| filter.exercise_type.map_or(true, |t| e.exercise_type == t))
            .filter(|e| filter.muscle_group.map_or(true, |m| e.muscle_group == Some(m)))
            .filter(|e| {
                filter
                    .exercise_group_id
                    .map_or(true, |g| e.exercise_group_id == Some(g))
            })
            .map(|e| tables.exercise_details(e))
            .collect();
        Ok(filter.page.apply(details))
    }

    async fn insert_exercise(
        &self,
        exercise: NewExercise,
        similar_ids: &[Uuid],
    ) -> StoreResult<ExerciseDetails> {
        let mut tables = self.tables.write().await;
        tables.require_group(exercise.exercise_group_id)?;
        tables.require_exercises(similar_ids)?;

        let now = Utc::now();
        let exercise = Exercise {
            id: Uuid::new_v4(),
            title: exercise.title,
            description: exercise.description,
            image: exercise.image,
            video: exercise.video,
            exercise_type: exercise.exercise_type,
            muscle_group: exercise.muscle_group,
            exercise_group_id: exercise.exercise_group_id,
            created_at: now,
            updated_at: now,
        };
        tables.exercises.push(exercise.clone());
        for similar_id in dedup(similar_ids) {
            tables.similar.push((exercise.id, similar_id));
        }
        Ok(tables.exercise_details(&exercise))
    }

    async fn update_exercise(
        &self,
        id: Uuid,
        changes: ExerciseChanges,
        similar_ids: Option<&[Uuid]>,
    ) -> StoreResult<Option<ExerciseDetails>> {
        let mut tables = self.tables.write().await;
        if tables.exercise(id).is_none() {
            return Ok(None);
        }
        tables.require_group(changes.exercise_group_id.flatten())?;
        if let Some(ids) = similar_ids {
            tables.require_exercises(ids)?;
        }

        if let Some(ids) = similar_ids {
            let diff = IdDiff::between(&tables.similar_ids(id), ids);
            tables
                .similar
                .retain(|(from, to)| *from != id || !diff.to_disconnect.contains(to));
            for similar_id in diff.to_connect {
                tables.similar.push((id, similar_id));
            }
        }

        let Some(exercise) = tables.exercises.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        changes.apply_to(exercise);
        exercise.updated_at = Utc::now();
        let exercise = exercise.clone();

        Ok(Some(tables.exercise_details(&exercise)))
    }

    async fn delete_exercise(&self, id: Uuid) -> StoreResult<Option<Exercise>> {
        let mut tables = self.tables.write().await;
        let Some(position) = tables.exercises.iter().position(|e| e.id == id) else {
            return Ok(None);
        };
        let exercise = tables.exercises.remove(position);
        tables.remove_exercise_links(id);
        tables.plan_exercises.retain(|row| row.exercise_id != id);
        Ok(Some(exercise))
    }
}

#[async_trait]
impl WorkoutStore for MemoryStore {
    async fn find_workout(&self, id: Uuid) -> StoreResult<Option<Workout>> {
        Ok(self.tables.read().await.workout(id).cloned())
    }

    async fn find_workout_details(&self, id: Uuid) -> StoreResult<Option<WorkoutDetails>> {
        let tables = self.tables.read().await;
        Ok(tables.workout(id).map(|w| tables.workout_details(w)))
    }

    async fn list_workouts(&self, filter: &WorkoutFilter) -> StoreResult<Vec<WorkoutDetails>> {
        let tables = self.tables.read().await;
        let mut workouts: Vec<&Workout> = tables
            .workouts
            .iter()
            .filter(|w| filter.user_id.map_or(true, |u| w.user_id == Some(u)))
            .filter(|w| {
                filter
                    .title
                    .as_deref()
                    .map_or(true, |title| contains_ignore_case(&w.title, title))
            })
            .collect();
        workouts.sort_by(|a, b| {
            b.start_date
                .cmp(&a.start_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        let details = workouts
            .into_iter()
            .map(|w| tables.workout_details(w))
            .collect();
        Ok(filter.page().apply(details))
    }

    async fn insert_workout(
        &self,
        workout: NewWorkout,
        plan: &[PlanExerciseInput],
    ) -> StoreResult<WorkoutDetails> {
        let mut tables = self.tables.write().await;
        tables.require_user(workout.user_id)?;
        let exercise_ids: Vec<Uuid> = plan.iter().map(|p| p.exercise_id).collect();
        tables.require_exercises(&exercise_ids)?;

        let now = Utc::now();
        let workout = Workout {
            id: Uuid::new_v4(),
            title: workout.title,
            description: workout.description,
            start_date: workout.start_date,
            end_date: workout.end_date,
            frequency: workout.frequency,
            level: workout.level,
            user_id: workout.user_id,
            created_at: now,
            updated_at: now,
        };
        tables.workouts.push(workout.clone());
        for input in plan {
            let row = Tables::new_plan_row(workout.id, input);
            tables.plan_exercises.push(row);
        }
        Ok(tables.workout_details(&workout))
    }

    async fn update_workout(
        &self,
        id: Uuid,
        changes: WorkoutChanges,
        plan: Option<&[PlanExerciseInput]>,
    ) -> StoreResult<Option<WorkoutDetails>> {
        let mut tables = self.tables.write().await;
        if tables.workout(id).is_none() {
            return Ok(None);
        }
        tables.require_user(changes.user_id.flatten())?;
        if let Some(plan) = plan {
            let exercise_ids: Vec<Uuid> = plan.iter().map(|p| p.exercise_id).collect();
            tables.require_exercises(&exercise_ids)?;
        }

        let now = Utc::now();
        if let Some(workout) = tables.workouts.iter_mut().find(|w| w.id == id) {
            changes.apply_to(workout);
            workout.updated_at = now;
        }

        if let Some(plan) = plan {
            let diff = PlanDiff::between(&tables.plan_rows(id), plan);
            tables.plan_exercises.retain(|row| !diff.deletes.contains(&row.id));
            for update in &diff.updates {
                if let Some(row) = tables.plan_exercises.iter_mut().find(|r| r.id == update.id) {
                    row.overwrite(&update.input);
                    row.updated_at = now;
                }
            }
            for input in &diff.inserts {
                let row = Tables::new_plan_row(id, input);
                tables.plan_exercises.push(row);
            }
        }

        Ok(tables.workout(id).map(|w| tables.workout_details(w)))
    }

    async fn delete_workout(&self, id: Uuid) -> StoreResult<Option<Workout>> {
        let mut tables = self.tables.write().await;
        let Some(position) = tables.workouts.iter().position(|w| w.id == id) else {
            return Ok(None);
        };
        let workout = tables.workouts.remove(position);
        tables.remove_workout_children(id);
        Ok(Some(workout))
    }
}

#[async_trait]
impl PlanExerciseStore for MemoryStore {
    async fn find_plan_exercise(&self, id: Uuid) -> StoreResult<Option<WorkoutPlanExercise>> {
        let tables = self.tables.read().await;
        Ok(tables.plan_exercises.iter().find(|r| r.id == id).cloned())
    }

    async fn list_plan_exercises(&self, workout_id: Uuid) -> StoreResult<Vec<WorkoutPlanExercise>> {
        Ok(self.tables.read().await.plan_rows(workout_id))
    }

    async fn insert_plan_exercise(
        &self,
        workout_id: Uuid,
        input: PlanExerciseInput,
    ) -> StoreResult<WorkoutPlanExercise> {
        let mut tables = self.tables.write().await;
        tables.require_workout(workout_id)?;
        tables.require_exercises(&[input.exercise_id])?;

        let row = Tables::new_plan_row(workout_id, &input);
        tables.plan_exercises.push(row.clone());
        Ok(row)
    }

    async fn update_plan_exercise(
        &self,
        id: Uuid,
        changes: PlanExerciseChanges,
    ) -> StoreResult<Option<WorkoutPlanExercise>> {
        let mut tables = self.tables.write().await;
        if let Some(workout_id) = changes.workout_id {
            tables.require_workout(workout_id)?;
        }
        if let Some(exercise_id) = changes.exercise_id {
            tables.require_exercises(&[exercise_id])?;
        }

        let Some(row) = tables.plan_exercises.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        changes.apply_to(row);
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete_plan_exercise(&self, id: Uuid) -> StoreResult<Option<WorkoutPlanExercise>> {
        let mut tables = self.tables.write().await;
        let Some(position) = tables.plan_exercises.iter().position(|r| r.id == id) else {
            return Ok(None);
        };
        Ok(Some(tables.plan_exercises.remove(position)))
    }

    async fn delete_plan_exercises_for_workout(&self, workout_id: Uuid) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.plan_exercises.len();
        tables.plan_exercises.retain(|r| r.workout_id != workout_id);
        Ok((before - tables.plan_exercises.len()) as u64)
    }
}

#[async_trait]
impl WorkoutSessionStore for MemoryStore {
    async fn find_workout_session(&self, id: Uuid) -> StoreResult<Option<WorkoutSession>> {
        let tables = self.tables.read().await;
        Ok(tables.sessions.iter().find(|s| s.id == id).cloned())
    }

    async fn list_workout_sessions(
        &self,
        workout_id: Option<Uuid>,
    ) -> StoreResult<Vec<WorkoutSession>> {
        let tables = self.tables.read().await;
        let mut sessions: Vec<WorkoutSession> = tables
            .sessions
            .iter()
            .filter(|s| workout_id.map_or(true, |w| s.workout_id == w))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(sessions)
    }

    async fn insert_workout_session(
        &self,
        session: NewWorkoutSession,
    ) -> StoreResult<WorkoutSession> {
        let mut tables = self.tables.write().await;
        tables.require_workout(session.workout_id)?;

        let now = Utc::now();
        let session = WorkoutSession {
            id: Uuid::new_v4(),
            workout_id: session.workout_id,
            date: session.date,
            duration: session.duration,
            feedback: session.feedback,
            intensity: session.intensity,
            created_at: now,
            updated_at: now,
        };
        tables.sessions.push(session.clone());
        Ok(session)
    }

    async fn update_workout_session(
        &self,
        id: Uuid,
        changes: WorkoutSessionChanges,
    ) -> StoreResult<Option<WorkoutSession>> {
        let mut tables = self.tables.write().await;
        if let Some(workout_id) = changes.workout_id {
            tables.require_workout(workout_id)?;
        }

        let Some(session) = tables.sessions.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        changes.apply_to(session);
        session.updated_at = Utc::now();
        Ok(Some(session.clone()))
    }

    async fn delete_workout_session(&self, id: Uuid) -> StoreResult<Option<WorkoutSession>> {
        let mut tables = self.tables.write().await;
        let Some(position) = tables.sessions.iter().position(|s| s.id == id) else {
            return Ok(None);
        };
        Ok(Some(tables.sessions.remove(position)))
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn find_subscription(&self, id: Uuid) -> StoreResult<Option<Subscription>> {
        let tables = self.tables.read().await;
        Ok(tables.subscriptions.iter().find(|s| s.id == id).cloned())
    }

    async fn list_subscriptions(&self, user_id: Option<Uuid>) -> StoreResult<Vec<Subscription>> {
        let tables = self.tables.read().await;
        let mut subscriptions: Vec<Subscription> = tables
            .subscriptions
            .iter()
            .filter(|s| user_id.map_or(true, |u| s.user_id == u))
            .cloned()
            .collect();
        subscriptions.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(subscriptions)
    }

    async fn insert_subscription(
        &self,
        subscription: NewSubscription,
    ) -> StoreResult<Subscription> {
        let mut tables = self.tables.write().await;
        tables.require_user(Some(subscription.user_id))?;

        let now = Utc::now();
        let subscription = Subscription {
            id: Uuid::new_v4(),
            user_id: subscription.user_id,
            plan_name: subscription.plan_name,
            plan_value: subscription.plan_value,
            start_date: subscription.start_date,
            end_date: subscription.end_date,
            payment_date: subscription.payment_date,
            payment_status: subscription.payment_status,
            notes: subscription.notes,
            created_at: now,
            updated_at: now,
        };
        tables.subscriptions.push(subscription.clone());
        Ok(subscription)
    }

    async fn update_subscription(
        &self,
        id: Uuid,
        changes: SubscriptionChanges,
    ) -> StoreResult<Option<Subscription>> {
        let mut tables = self.tables.write().await;
        tables.require_user(changes.user_id)?;

        let Some(subscription) = tables.subscriptions.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        changes.apply_to(subscription);
        subscription.updated_at = Utc::now();
        Ok(Some(subscription.clone()))
    }

    async fn delete_subscription(&self, id: Uuid) -> StoreResult<Option<Subscription>> {
        let mut tables = self.tables.write().await;
        let Some(position) = tables.subscriptions.iter().position(|s| s.id == id) else {
            return Ok(None);
        };
        Ok(Some(tables.subscriptions.remove(position)))
    }
}

#[async_trait]
impl AssessmentStore for MemoryStore {
    async fn find_assessment(&self, id: Uuid) -> StoreResult<Option<PhysicalAssessment>> {
        let tables = self.tables.read().await;
        Ok(tables.assessments.iter().find(|a| a.id == id).cloned())
    }

    async fn list_assessments_for_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<PhysicalAssessment>> {
        let tables = self.tables.read().await;
        let mut assessments: Vec<PhysicalAssessment> = tables
            .assessments
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        assessments.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(assessments)
    }

    async fn insert_assessment(
        &self,
        assessment: NewAssessment,
    ) -> StoreResult<PhysicalAssessment> {
        let mut tables = self.tables.write().await;
        tables.require_user(Some(assessment.user_id))?;

        let now = Utc::now();
        let m = assessment.measurements;
        let assessment = PhysicalAssessment {
            id: Uuid::new_v4(),
            user_id: assessment.user_id,
            date: assessment.date,
            weight_kg: m.weight_kg,
            height_cm: m.height_cm,
            body_fat_percentage: m.body_fat_percentage,
            waist_cm: m.waist_cm,
            hip_cm: m.hip_cm,
            chest_cm: m.chest_cm,
            arm_left_cm: m.arm_left_cm,
            arm_right_cm: m.arm_right_cm,
            leg_left_cm: m.leg_left_cm,
            leg_right_cm: m.leg_right_cm,
            anamnesis: assessment.anamnesis,
            notes: assessment.notes,
            created_at: now,
            updated_at: now,
        };
        tables.assessments.push(assessment.clone());
        Ok(assessment)
    }

    async fn update_assessment(
        &self,
        id: Uuid,
        changes: AssessmentChanges,
    ) -> StoreResult<Option<PhysicalAssessment>> {
        let mut tables = self.tables.write().await;
        tables.require_user(changes.user_id)?;

        let Some(assessment) = tables.assessments.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        changes.apply_to(assessment);
        assessment.updated_at = Utc::now();
        Ok(Some(assessment.clone()))
    }

    async fn delete_assessment(&self, id: Uuid) -> StoreResult<Option<PhysicalAssessment>> {
        let mut tables = self.tables.write().await;
        let Some(position) = tables.assessments.iter().position(|a| a.id == id) else {
            return Ok(None);
        };
        Ok(Some(tables.assessments.remove(position)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserRole;
    use crate::models::{ExerciseType, Pagination};
    use assert_matches::assert_matches;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            name: None,
            role: UserRole::Student,
            age: None,
            weight: None,
            height: None,
            avatar: None,
        }
    }

    fn new_exercise(title: &str) -> NewExercise {
        NewExercise {
            title: title.to_string(),
            description: None,
            image: None,
            video: None,
            exercise_type: ExerciseType::Strength,
            muscle_group: None,
            exercise_group_id: None,
        }
    }

    fn plan_entry(exercise_id: Uuid, order: i32) -> PlanExerciseInput {
        PlanExerciseInput {
            exercise_id,
            sets: 3,
            reps: 10,
            target_load: None,
            target_rest_time: None,
            notes: None,
            order,
        }
    }

    fn new_workout(user_id: Option<Uuid>) -> NewWorkout {
        NewWorkout {
            title: "Push day".to_string(),
            description: None,
            start_date: Utc::now(),
            end_date: None,
            frequency: Some(3),
            level: None,
            user_id,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@example.com")).await.unwrap();

        let result = store.insert_user(new_user("a@example.com")).await;

        assert_matches!(result, Err(StoreError::Conflict(_)));
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_similar_links_are_directional() {
        let store = MemoryStore::new();
        let b = store.insert_exercise(new_exercise("B"), &[]).await.unwrap();
        let a = store
            .insert_exercise(new_exercise("A"), &[b.exercise.id])
            .await
            .unwrap();

        assert_eq!(a.similar_exercises.len(), 1);
        let b = store.find_exercise_details(b.exercise.id).await.unwrap().unwrap();
        assert!(b.similar_exercises.is_empty());
        assert_eq!(b.referenced_by_exercises[0].id, a.exercise.id);
    }

    #[tokio::test]
    async fn test_deleting_exercise_removes_links() {
        let store = MemoryStore::new();
        let b = store.insert_exercise(new_exercise("B"), &[]).await.unwrap();
        let a = store
            .insert_exercise(new_exercise("A"), &[b.exercise.id])
            .await
            .unwrap();

        store.delete_exercise(b.exercise.id).await.unwrap();

        let a = store.find_exercise_details(a.exercise.id).await.unwrap().unwrap();
        assert!(a.similar_exercises.is_empty());
    }

    #[tokio::test]
    async fn test_failed_plan_reference_leaves_workout_untouched() {
        let store = MemoryStore::new();
        let e1 = store.insert_exercise(new_exercise("Squat"), &[]).await.unwrap();
        let workout = store
            .insert_workout(new_workout(None), &[plan_entry(e1.exercise.id, 0)])
            .await
            .unwrap();

        let changes = WorkoutChanges {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        let result = store
            .update_workout(
                workout.workout.id,
                changes,
                Some(&[plan_entry(Uuid::new_v4(), 0)]),
            )
            .await;

        assert_matches!(result, Err(StoreError::MissingReference(_)));
        let stored = store.find_workout_details(workout.workout.id).await.unwrap().unwrap();
        assert_eq!(stored.workout.title, "Push day");
        assert_eq!(stored.plan_exercises.len(), 1);
    }

    #[tokio::test]
    async fn test_deleting_workout_cascades_children() {
        let store = MemoryStore::new();
        let e1 = store.insert_exercise(new_exercise("Squat"), &[]).await.unwrap();
        let workout = store
            .insert_workout(new_workout(None), &[plan_entry(e1.exercise.id, 0)])
            .await
            .unwrap();
        let workout_id = workout.workout.id;

        store.delete_workout(workout_id).await.unwrap();

        assert!(store.list_plan_exercises(workout_id).await.unwrap().is_empty());
        assert_eq!(store.delete_plan_exercises_for_workout(workout_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deleting_user_unassigns_workouts() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("u@example.com")).await.unwrap();
        let workout = store.insert_workout(new_workout(Some(user.id)), &[]).await.unwrap();

        store.delete_user(user.id).await.unwrap();

        let workout = store.find_workout(workout.workout.id).await.unwrap().unwrap();
        assert_eq!(workout.user_id, None);
    }

    #[tokio::test]
    async fn test_group_membership_reconcile() {
        let store = MemoryStore::new();
        let a = store.insert_exercise(new_exercise("A"), &[]).await.unwrap();
        let b = store.insert_exercise(new_exercise("B"), &[]).await.unwrap();
        let group = store
            .insert_exercise_group(
                NewExerciseGroup {
                    title: "Legs".to_string(),
                    description: None,
                },
                &[a.exercise.id],
            )
            .await
            .unwrap();

        let updated = store
            .update_exercise_group(
                group.group.id,
                ExerciseGroupChanges::default(),
                Some(&[b.exercise.id]),
            )
            .await
            .unwrap()
            .unwrap();

        let ids: Vec<Uuid> = updated.exercises.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![b.exercise.id]);
        let a = store.find_exercise(a.exercise.id).await.unwrap().unwrap();
        assert_eq!(a.exercise_group_id, None);
    }

    #[tokio::test]
    async fn test_list_exercises_filters_and_pages() {
        let store = MemoryStore::new();
        for title in ["Bench Press", "Incline Press", "Squat"] {
            store.insert_exercise(new_exercise(title), &[]).await.unwrap();
        }

        let filter = ExerciseFilter {
            title: Some("press".to_string()),
            page: Pagination {
                skip: Some(1),
                take: Some(5),
            },
            ..Default::default()
        };
        let found = store.list_exercises(&filter).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].exercise.title, "Incline Press");
    }
}
