use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    AssessmentStore, ExerciseGroupStore, ExerciseStore, PlanExerciseStore, StoreError,
    StoreResult, SubscriptionStore, UserStore, WorkoutSessionStore, WorkoutStore,
};
use crate::models::{
    AssessmentChanges, Exercise, ExerciseChanges, ExerciseDetails, ExerciseFilter,
    ExerciseGroup, ExerciseGroupChanges, ExerciseGroupDetails, ExerciseGroupFilter,
    NewAssessment, NewExercise, NewExerciseGroup, NewSubscription, NewUser, NewWorkout,
    NewWorkoutSession, Pagination, PhysicalAssessment, PlanExerciseChanges, PlanExerciseInput,
    PlanExerciseWithExercise, Subscription, SubscriptionChanges, User, UserChanges, Workout,
    WorkoutChanges, WorkoutDetails, WorkoutFilter, WorkoutPlanExercise, WorkoutSession,
    WorkoutSessionChanges,
};
use crate::relations::{dedup, IdDiff, PlanDiff};

const USER_COLUMNS: &str =
    "id, email, password_hash, name, role, age, weight, height, avatar, created_at, updated_at";
const GROUP_COLUMNS: &str = "id, title, description, created_at, updated_at";
const EXERCISE_FIELDS: [&str; 10] = [
    "id",
    "title",
    "description",
    "image",
    "video",
    "exercise_type",
    "muscle_group",
    "exercise_group_id",
    "created_at",
    "updated_at",
];
const WORKOUT_COLUMNS: &str =
    "id, title, description, start_date, end_date, frequency, level, user_id, created_at, updated_at";
const PLAN_COLUMNS: &str = "id, workout_id, exercise_id, sets, reps, target_load, \
     target_rest_time, notes, order_index, created_at, updated_at";
const SESSION_COLUMNS: &str =
    "id, workout_id, date, duration, feedback, intensity, created_at, updated_at";
const SUBSCRIPTION_COLUMNS: &str = "id, user_id, plan_name, plan_value, start_date, end_date, \
     payment_date, payment_status, notes, created_at, updated_at";
const ASSESSMENT_COLUMNS: &str = "id, user_id, date, weight_kg, height_cm, body_fat_percentage, \
     waist_cm, hip_cm, chest_cm, arm_left_cm, arm_right_cm, leg_left_cm, leg_right_cm, \
     anamnesis, notes, created_at, updated_at";

fn exercise_columns(alias: Option<&str>) -> String {
    EXERCISE_FIELDS
        .iter()
        .map(|field| match alias {
            Some(alias) => format!("{alias}.{field}"),
            None => field.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `%needle%` with LIKE wildcards in the needle escaped.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_pagination(builder: &mut QueryBuilder<'_, Postgres>, page: Pagination) {
    if let Some(take) = page.take {
        builder.push(" LIMIT ").push_bind(i64::from(take));
    }
    if let Some(skip) = page.skip {
        builder.push(" OFFSET ").push_bind(i64::from(skip));
    }
}

#[derive(FromRow)]
struct LinkedExercise {
    owner_id: Uuid,
    #[sqlx(flatten)]
    exercise: Exercise,
}

/// PostgreSQL adapter.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn load_exercise_details(
    conn: &mut PgConnection,
    exercises: Vec<Exercise>,
) -> StoreResult<Vec<ExerciseDetails>> {
    if exercises.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = exercises.iter().map(|e| e.id).collect();
    let columns = exercise_columns(Some("e"));

    let outgoing = sqlx::query_as::<_, LinkedExercise>(&format!(
        "SELECT s.exercise_id AS owner_id, {columns}
         FROM exercise_similar s JOIN exercises e ON e.id = s.similar_id
         WHERE s.exercise_id = ANY($1)
         ORDER BY s.created_at, e.id"
    ))
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let incoming = sqlx::query_as::<_, LinkedExercise>(&format!(
        "SELECT s.similar_id AS owner_id, {columns}
         FROM exercise_similar s JOIN exercises e ON e.id = s.exercise_id
         WHERE s.similar_id = ANY($1)
         ORDER BY s.created_at, e.id"
    ))
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let group_ids: Vec<Uuid> = dedup(
        &exercises
            .iter()
            .filter_map(|e| e.exercise_group_id)
            .collect::<Vec<_>>(),
    );
    let groups: HashMap<Uuid, ExerciseGroup> = sqlx::query_as::<_, ExerciseGroup>(&format!(
        "SELECT {GROUP_COLUMNS} FROM exercise_groups WHERE id = ANY($1)"
    ))
    .bind(&group_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|g| (g.id, g))
    .collect();

    let mut similar: HashMap<Uuid, Vec<Exercise>> = HashMap::new();
    for link in outgoing {
        similar.entry(link.owner_id).or_default().push(link.exercise);
    }
    let mut referenced_by: HashMap<Uuid, Vec<Exercise>> = HashMap::new();
    for link in incoming {
        referenced_by.entry(link.owner_id).or_default().push(link.exercise);
    }

    Ok(exercises
        .into_iter()
        .map(|exercise| ExerciseDetails {
            similar_exercises: similar.remove(&exercise.id).unwrap_or_default(),
            referenced_by_exercises: referenced_by.remove(&exercise.id).unwrap_or_default(),
            exercise_group: exercise
                .exercise_group_id
                .and_then(|group_id| groups.get(&group_id).cloned()),
            exercise,
        })
        .collect())
}

async fn load_exercise_detail(
    conn: &mut PgConnection,
    id: Uuid,
) -> StoreResult<Option<ExerciseDetails>> {
    let exercise = sqlx::query_as::<_, Exercise>(&format!(
        "SELECT {} FROM exercises WHERE id = $1",
        exercise_columns(None)
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match exercise {
        Some(exercise) => Ok(load_exercise_details(conn, vec![exercise]).await?.pop()),
        None => Ok(None),
    }
}

async fn load_group_details(
    conn: &mut PgConnection,
    groups: Vec<ExerciseGroup>,
) -> StoreResult<Vec<ExerciseGroupDetails>> {
    if groups.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = groups.iter().map(|g| g.id).collect();
    let members = sqlx::query_as::<_, Exercise>(&format!(
        "SELECT {} FROM exercises WHERE exercise_group_id = ANY($1) ORDER BY created_at, id",
        exercise_columns(None)
    ))
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_group: HashMap<Uuid, Vec<Exercise>> = HashMap::new();
    for exercise in members {
        if let Some(group_id) = exercise.exercise_group_id {
            by_group.entry(group_id).or_default().push(exercise);
        }
    }

    Ok(groups
        .into_iter()
        .map(|group| ExerciseGroupDetails {
            exercises: by_group.remove(&group.id).unwrap_or_default(),
            group,
        })
        .collect())
}

async fn load_group_detail(
    conn: &mut PgConnection,
    id: Uuid,
) -> StoreResult<Option<ExerciseGroupDetails>> {
    let group = sqlx::query_as::<_, ExerciseGroup>(&format!(
        "SELECT {GROUP_COLUMNS} FROM exercise_groups WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match group {
        Some(group) => Ok(load_group_details(conn, vec![group]).await?.pop()),
        None => Ok(None),
    }
}

async fn load_workout_details(
    conn: &mut PgConnection,
    workouts: Vec<Workout>,
) -> StoreResult<Vec<WorkoutDetails>> {
    if workouts.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = workouts.iter().map(|w| w.id).collect();

    let rows = sqlx::query_as::<_, WorkoutPlanExercise>(&format!(
        "SELECT {PLAN_COLUMNS} FROM workout_plan_exercises
         WHERE workout_id = ANY($1)
         ORDER BY order_index, created_at, id"
    ))
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let exercise_ids = dedup(&rows.iter().map(|r| r.exercise_id).collect::<Vec<_>>());
    let exercises: HashMap<Uuid, Exercise> = sqlx::query_as::<_, Exercise>(&format!(
        "SELECT {} FROM exercises WHERE id = ANY($1)",
        exercise_columns(None)
    ))
    .bind(&exercise_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|e| (e.id, e))
    .collect();

    let user_ids = dedup(&workouts.iter().filter_map(|w| w.user_id).collect::<Vec<_>>());
    let users: HashMap<Uuid, User> = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
    ))
    .bind(&user_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|u| (u.id, u))
    .collect();

    let mut plans: HashMap<Uuid, Vec<PlanExerciseWithExercise>> = HashMap::new();
    for row in rows {
        if let Some(exercise) = exercises.get(&row.exercise_id) {
            plans
                .entry(row.workout_id)
                .or_default()
                .push(PlanExerciseWithExercise {
                    exercise: exercise.clone(),
                    plan_exercise: row,
                });
        }
    }

    Ok(workouts
        .into_iter()
        .map(|workout| WorkoutDetails {
            plan_exercises: plans.remove(&workout.id).unwrap_or_default(),
            user: workout
                .user_id
                .and_then(|user_id| users.get(&user_id).cloned().map(Into::into)),
            workout,
        })
        .collect())
}

async fn load_workout_detail(
    conn: &mut PgConnection,
    id: Uuid,
) -> StoreResult<Option<WorkoutDetails>> {
    let workout = sqlx::query_as::<_, Workout>(&format!(
        "SELECT {WORKOUT_COLUMNS} FROM workouts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match workout {
        Some(workout) => Ok(load_workout_details(conn, vec![workout]).await?.pop()),
        None => Ok(None),
    }
}

async fn insert_plan_row(
    conn: &mut PgConnection,
    workout_id: Uuid,
    input: &PlanExerciseInput,
) -> StoreResult<WorkoutPlanExercise> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, WorkoutPlanExercise>(&format!(
        "INSERT INTO workout_plan_exercises
             (id, workout_id, exercise_id, sets, reps, target_load, target_rest_time,
              notes, order_index, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
         RETURNING {PLAN_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(workout_id)
    .bind(input.exercise_id)
    .bind(input.sets)
    .bind(input.reps)
    .bind(input.target_load)
    .bind(input.target_rest_time)
    .bind(&input.notes)
    .bind(input.order)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row)
}

async fn connect_similar(
    conn: &mut PgConnection,
    exercise_id: Uuid,
    similar_ids: &[Uuid],
) -> StoreResult<()> {
    for similar_id in similar_ids {
        sqlx::query(
            "INSERT INTO exercise_similar (exercise_id, similar_id, created_at)
             VALUES ($1, $2, $3)
             ON CONFLICT DO NOTHING",
        )
        .bind(exercise_id)
        .bind(similar_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Points `exercise_ids` at `group_id`, failing if any of them is gone.
async fn assign_group(
    conn: &mut PgConnection,
    group_id: Option<Uuid>,
    exercise_ids: &[Uuid],
) -> StoreResult<()> {
    if exercise_ids.is_empty() {
        return Ok(());
    }
    let affected = sqlx::query(
        "UPDATE exercises SET exercise_group_id = $1, updated_at = $2 WHERE id = ANY($3)",
    )
    .bind(group_id)
    .bind(Utc::now())
    .bind(exercise_ids)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if affected < exercise_ids.len() as u64 {
        return Err(StoreError::MissingReference(
            "exercises_exercise_group_id_fkey".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users
                 (id, email, password_hash, name, role, age, weight, height, avatar,
                  created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role)
        .bind(user.age)
        .bind(user.weight)
        .bind(user.height)
        .bind(&user.avatar)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET
                 email = COALESCE($2, email),
                 password_hash = COALESCE($3, password_hash),
                 name = COALESCE($4, name),
                 role = COALESCE($5, role),
                 age = COALESCE($6, age),
                 weight = COALESCE($7, weight),
                 height = COALESCE($8, height),
                 avatar = COALESCE($9, avatar),
                 updated_at = $10
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&changes.email)
        .bind(&changes.password_hash)
        .bind(&changes.name)
        .bind(changes.role)
        .bind(changes.age)
        .bind(changes.weight)
        .bind(changes.height)
        .bind(&changes.avatar)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl ExerciseGroupStore for PgStore {
    async fn find_exercise_group(&self, id: Uuid) -> StoreResult<Option<ExerciseGroup>> {
        let group = sqlx::query_as::<_, ExerciseGroup>(&format!(
            "SELECT {GROUP_COLUMNS} FROM exercise_groups WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    async fn find_exercise_group_details(
        &self,
        id: Uuid,
    ) -> StoreResult<Option<ExerciseGroupDetails>> {
        let mut conn = self.pool.acquire().await?;
        load_group_detail(&mut conn, id).await
    }

    async fn list_exercise_groups(
        &self,
        filter: &ExerciseGroupFilter,
    ) -> StoreResult<Vec<ExerciseGroupDetails>> {
        let mut conn = self.pool.acquire().await?;

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {GROUP_COLUMNS} FROM exercise_groups WHERE TRUE"
        ));
        if let Some(title) = &filter.title {
            builder.push(" AND title ILIKE ").push_bind(like_pattern(title));
        }
        builder.push(" ORDER BY title ASC, id");
        push_pagination(&mut builder, filter.page());

        let groups = builder
            .build_query_as::<ExerciseGroup>()
            .fetch_all(&mut *conn)
            .await?;
        load_group_details(&mut conn, groups).await
    }

    async fn insert_exercise_group(
        &self,
        group: NewExerciseGroup,
        exercise_ids: &[Uuid],
    ) -> StoreResult<ExerciseGroupDetails> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let group = sqlx::query_as::<_, ExerciseGroup>(&format!(
            "INSERT INTO exercise_groups (id, title, description, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING {GROUP_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&group.title)
        .bind(&group.description)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        assign_group(&mut tx, Some(group.id), &dedup(exercise_ids)).await?;

        let details = load_group_details(&mut tx, vec![group])
            .await?
            .pop()
            .ok_or_else(|| StoreError::Database(sqlx::Error::RowNotFound))?;
        tx.commit().await?;
        Ok(details)
    }

    async fn update_exercise_group(
        &self,
        id: Uuid,
        changes: ExerciseGroupChanges,
        exercise_ids: Option<&[Uuid]>,
    ) -> StoreResult<Option<ExerciseGroupDetails>> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM exercise_groups WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Ok(None);
        }

        sqlx::query(
            "UPDATE exercise_groups SET
                 title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 updated_at = $4
             WHERE id = $1",
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if let Some(ids) = exercise_ids {
            let current = sqlx::query_scalar::<_, Uuid>(
                "SELECT id FROM exercises WHERE exercise_group_id = $1 ORDER BY created_at, id",
            )
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

            let diff = IdDiff::between(&current, ids);
            assign_group(&mut tx, None, &diff.to_disconnect).await?;
            assign_group(&mut tx, Some(id), &diff.to_connect).await?;
        }

        let details = load_group_detail(&mut tx, id).await?;
        tx.commit().await?;
        Ok(details)
    }

    async fn delete_exercise_group(&self, id: Uuid) -> StoreResult<Option<ExerciseGroup>> {
        let group = sqlx::query_as::<_, ExerciseGroup>(&format!(
            "DELETE FROM exercise_groups WHERE id = $1 RETURNING {GROUP_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }
}

#[async_trait]
impl ExerciseStore for PgStore {
    async fn find_exercise(&self, id: Uuid) -> StoreResult<Option<Exercise>> {
        let exercise = sqlx::query_as::<_, Exercise>(&format!(
            "SELECT {} FROM exercises WHERE id = $1",
            exercise_columns(None)
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(exercise)
    }

    async fn existing_exercise_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Uuid>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found = sqlx::query_scalar::<_, Uuid>("SELECT id FROM exercises WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(found)
    }

    async fn find_exercise_details(&self, id: Uuid) -> StoreResult<Option<ExerciseDetails>> {
        let mut conn = self.pool.acquire().await?;
        load_exercise_detail(&mut conn, id).await
    }

    async fn list_exercises(&self, filter: &ExerciseFilter) -> StoreResult<Vec<ExerciseDetails>> {
        let mut conn = self.pool.acquire().await?;

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM exercises WHERE TRUE",
            exercise_columns(None)
        ));
        if let Some(title) = &filter.title {
            builder.push(" AND title ILIKE ").push_bind(like_pattern(title));
        }
        if let Some(exercise_type) = filter.exercise_type {
            builder.push(" AND exercise_type = ").push_bind(exercise_type);
        }
        if let Some(muscle_group) = filter.muscle_group {
            builder.push(" AND muscle_group = ").push_bind(muscle_group);
        }
        if let Some(group_id) = filter.exercise_group_id {
            builder.push(" AND exercise_group_id = ").push_bind(group_id);
        }
        builder.push(" ORDER BY created_at, id");
        push_pagination(&mut builder, filter.page);

        let exercises = builder
            .build_query_as::<Exercise>()
            .fetch_all(&mut *conn)
            .await?;
        load_exercise_details(&mut conn, exercises).await
    }

    async fn insert_exercise(
        &self,
        exercise: NewExercise,
        similar_ids: &[Uuid],
    ) -> StoreResult<ExerciseDetails> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let exercise = sqlx::query_as::<_, Exercise>(&format!(
            "INSERT INTO exercises
                 (id, title, description, image, video, exercise_type, muscle_group,
                  exercise_group_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
             RETURNING {}",
            exercise_columns(None)
        ))
        .bind(Uuid::new_v4())
        .bind(&exercise.title)
        .bind(&exercise.description)
        .bind(&exercise.image)
        .bind(&exercise.video)
        .bind(exercise.exercise_type)
        .bind(exercise.muscle_group)
        .bind(exercise.exercise_group_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        connect_similar(&mut tx, exercise.id, &dedup(similar_ids)).await?;

        let details = load_exercise_details(&mut tx, vec![exercise])
            .await?
            .pop()
            .ok_or_else(|| StoreError::Database(sqlx::Error::RowNotFound))?;
        tx.commit().await?;
        Ok(details)
    }

    async fn update_exercise(
        &self,
        id: Uuid,
        changes: ExerciseChanges,
        similar_ids: Option<&[Uuid]>,
    ) -> StoreResult<Option<ExerciseDetails>> {
        let mut tx = self.pool.begin().await?;

        // Serialises concurrent reconciliations of the same exercise.
        let locked =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM exercises WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        sqlx::query(
            "UPDATE exercises SET
                 title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 image = COALESCE($4, image),
                 video = COALESCE($5, video),
                 exercise_type = COALESCE($6, exercise_type),
                 muscle_group = COALESCE($7, muscle_group),
                 exercise_group_id = CASE WHEN $8 THEN $9 ELSE exercise_group_id END,
                 updated_at = $10
             WHERE id = $1",
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.image)
        .bind(&changes.video)
        .bind(changes.exercise_type)
        .bind(changes.muscle_group)
        .bind(changes.exercise_group_id.is_some())
        .bind(changes.exercise_group_id.flatten())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if let Some(ids) = similar_ids {
            let current = sqlx::query_scalar::<_, Uuid>(
                "SELECT similar_id FROM exercise_similar WHERE exercise_id = $1
                 ORDER BY created_at, similar_id",
            )
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

            let diff = IdDiff::between(&current, ids);
            if !diff.to_disconnect.is_empty() {
                sqlx::query(
                    "DELETE FROM exercise_similar WHERE exercise_id = $1 AND similar_id = ANY($2)",
                )
                .bind(id)
                .bind(&diff.to_disconnect)
                .execute(&mut *tx)
                .await?;
            }
            connect_similar(&mut tx, id, &diff.to_connect).await?;
        }

        let details = load_exercise_detail(&mut tx, id).await?;
        tx.commit().await?;
        Ok(details)
    }

    async fn delete_exercise(&self, id: Uuid) -> StoreResult<Option<Exercise>> {
        let exercise = sqlx::query_as::<_, Exercise>(&format!(
            "DELETE FROM exercises WHERE id = $1 RETURNING {}",
            exercise_columns(None)
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(exercise)
    }
}

#[async_trait]
impl WorkoutStore for PgStore {
    async fn find_workout(&self, id: Uuid) -> StoreResult<Option<Workout>> {
        let workout = sqlx::query_as::<_, Workout>(&format!(
            "SELECT {WORKOUT_COLUMNS} FROM workouts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(workout)
    }

    async fn find_workout_details(&self, id: Uuid) -> StoreResult<Option<WorkoutDetails>> {
        let mut conn = self.pool.acquire().await?;
        load_workout_detail(&mut conn, id).await
    }

    async fn list_workouts(&self, filter: &WorkoutFilter) -> StoreResult<Vec<WorkoutDetails>> {
        let mut conn = self.pool.acquire().await?;

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {WORKOUT_COLUMNS} FROM workouts WHERE TRUE"
        ));
        if let Some(user_id) = filter.user_id {
            builder.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(title) = &filter.title {
            builder.push(" AND title ILIKE ").push_bind(like_pattern(title));
        }
        builder.push(" ORDER BY start_date DESC, created_at DESC");
        push_pagination(&mut builder, filter.page());

        let workouts = builder
            .build_query_as::<Workout>()
            .fetch_all(&mut *conn)
            .await?;
        load_workout_details(&mut conn, workouts).await
    }

    async fn insert_workout(
        &self,
        workout: NewWorkout,
        plan: &[PlanExerciseInput],
    ) -> StoreResult<WorkoutDetails> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let workout = sqlx::query_as::<_, Workout>(&format!(
            "INSERT INTO workouts
                 (id, title, description, start_date, end_date, frequency, level, user_id,
                  created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
             RETURNING {WORKOUT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&workout.title)
        .bind(&workout.description)
        .bind(workout.start_date)
        .bind(workout.end_date)
        .bind(workout.frequency)
        .bind(workout.level)
        .bind(workout.user_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        for input in plan {
            insert_plan_row(&mut tx, workout.id, input).await?;
        }

        let details = load_workout_details(&mut tx, vec![workout])
            .await?
            .pop()
            .ok_or_else(|| StoreError::Database(sqlx::Error::RowNotFound))?;
        tx.commit().await?;
        Ok(details)
    }

    async fn update_workout(
        &self,
        id: Uuid,
        changes: WorkoutChanges,
        plan: Option<&[PlanExerciseInput]>,
    ) -> StoreResult<Option<WorkoutDetails>> {
        let mut tx = self.pool.begin().await?;

        let locked =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM workouts WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let now = Utc::now();
        sqlx::query(
            "UPDATE workouts SET
                 title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 start_date = COALESCE($4, start_date),
                 end_date = CASE WHEN $5 THEN $6 ELSE end_date END,
                 frequency = COALESCE($7, frequency),
                 level = COALESCE($8, level),
                 user_id = CASE WHEN $9 THEN $10 ELSE user_id END,
                 updated_at = $11
             WHERE id = $1",
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.start_date)
        .bind(changes.end_date.is_some())
        .bind(changes.end_date.flatten())
        .bind(changes.frequency)
        .bind(changes.level)
        .bind(changes.user_id.is_some())
        .bind(changes.user_id.flatten())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if let Some(plan) = plan {
            let current = sqlx::query_as::<_, WorkoutPlanExercise>(&format!(
                "SELECT {PLAN_COLUMNS} FROM workout_plan_exercises
                 WHERE workout_id = $1
                 ORDER BY order_index, created_at, id"
            ))
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

            let diff = PlanDiff::between(&current, plan);
            if !diff.deletes.is_empty() {
                sqlx::query("DELETE FROM workout_plan_exercises WHERE id = ANY($1)")
                    .bind(&diff.deletes)
                    .execute(&mut *tx)
                    .await?;
            }
            for update in &diff.updates {
                sqlx::query(
                    "UPDATE workout_plan_exercises SET
                         exercise_id = $2, sets = $3, reps = $4, target_load = $5,
                         target_rest_time = $6, notes = $7, order_index = $8, updated_at = $9
                     WHERE id = $1",
                )
                .bind(update.id)
                .bind(update.input.exercise_id)
                .bind(update.input.sets)
                .bind(update.input.reps)
                .bind(update.input.target_load)
                .bind(update.input.target_rest_time)
                .bind(&update.input.notes)
                .bind(update.input.order)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            }
            for input in &diff.inserts {
                insert_plan_row(&mut tx, id, input).await?;
            }
        }

        let details = load_workout_detail(&mut tx, id).await?;
        if details.is_none() {
            return Ok(None);
        }
        tx.commit().await?;
        Ok(details)
    }

    async fn delete_workout(&self, id: Uuid) -> StoreResult<Option<Workout>> {
        let workout = sqlx::query_as::<_, Workout>(&format!(
            "DELETE FROM workouts WHERE id = $1 RETURNING {WORKOUT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(workout)
    }
}

#[async_trait]
impl PlanExerciseStore for PgStore {
    async fn find_plan_exercise(&self, id: Uuid) -> StoreResult<Option<WorkoutPlanExercise>> {
        let row = sqlx::query_as::<_, WorkoutPlanExercise>(&format!(
            "SELECT {PLAN_COLUMNS} FROM workout_plan_exercises WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_plan_exercises(&self, workout_id: Uuid) -> StoreResult<Vec<WorkoutPlanExercise>> {
        let rows = sqlx::query_as::<_, WorkoutPlanExercise>(&format!(
            "SELECT {PLAN_COLUMNS} FROM workout_plan_exercises
             WHERE workout_id = $1
             ORDER BY order_index, created_at, id"
        ))
        .bind(workout_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_plan_exercise(
        &self,
        workout_id: Uuid,
        input: PlanExerciseInput,
    ) -> StoreResult<WorkoutPlanExercise> {
        let mut conn = self.pool.acquire().await?;
        insert_plan_row(&mut conn, workout_id, &input).await
    }

    async fn update_plan_exercise(
        &self,
        id: Uuid,
        changes: PlanExerciseChanges,
    ) -> StoreResult<Option<WorkoutPlanExercise>> {
        let row = sqlx::query_as::<_, WorkoutPlanExercise>(&format!(
            "UPDATE workout_plan_exercises SET
                 workout_id = COALESCE($2, workout_id),
                 exercise_id = COALESCE($3, exercise_id),
                 sets = COALESCE($4, sets),
                 reps = COALESCE($5, reps),
                 target_load = COALESCE($6, target_load),
                 target_rest_time = COALESCE($7, target_rest_time),
                 notes = COALESCE($8, notes),
                 order_index = COALESCE($9, order_index),
                 updated_at = $10
             WHERE id = $1
             RETURNING {PLAN_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.workout_id)
        .bind(changes.exercise_id)
        .bind(changes.sets)
        .bind(changes.reps)
        .bind(changes.target_load)
        .bind(changes.target_rest_time)
        .bind(&changes.notes)
        .bind(changes.order)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_plan_exercise(&self, id: Uuid) -> StoreResult<Option<WorkoutPlanExercise>> {
        let row = sqlx::query_as::<_, WorkoutPlanExercise>(&format!(
            "DELETE FROM workout_plan_exercises WHERE id = $1 RETURNING {PLAN_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_plan_exercises_for_workout(&self, workout_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM workout_plan_exercises WHERE workout_id = $1")
            .bind(workout_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl WorkoutSessionStore for PgStore {
    async fn find_workout_session(&self, id: Uuid) -> StoreResult<Option<WorkoutSession>> {
        let session = sqlx::query_as::<_, WorkoutSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM workout_sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn list_workout_sessions(
        &self,
        workout_id: Option<Uuid>,
    ) -> StoreResult<Vec<WorkoutSession>> {
        let sessions = sqlx::query_as::<_, WorkoutSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM workout_sessions
             WHERE ($1::uuid IS NULL OR workout_id = $1)
             ORDER BY date DESC, created_at DESC"
        ))
        .bind(workout_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    async fn insert_workout_session(
        &self,
        session: NewWorkoutSession,
    ) -> StoreResult<WorkoutSession> {
        let session = sqlx::query_as::<_, WorkoutSession>(&format!(
            "INSERT INTO workout_sessions
                 (id, workout_id, date, duration, feedback, intensity, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(session.workout_id)
        .bind(session.date)
        .bind(session.duration)
        .bind(&session.feedback)
        .bind(session.intensity)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(session)
    }

    async fn update_workout_session(
        &self,
        id: Uuid,
        changes: WorkoutSessionChanges,
    ) -> StoreResult<Option<WorkoutSession>> {
        let session = sqlx::query_as::<_, WorkoutSession>(&format!(
            "UPDATE workout_sessions SET
                 workout_id = COALESCE($2, workout_id),
                 date = COALESCE($3, date),
                 duration = COALESCE($4, duration),
                 feedback = COALESCE($5, feedback),
                 intensity = COALESCE($6, intensity),
                 updated_at = $7
             WHERE id = $1
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.workout_id)
        .bind(changes.date)
        .bind(changes.duration)
        .bind(&changes.feedback)
        .bind(changes.intensity)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn delete_workout_session(&self, id: Uuid) -> StoreResult<Option<WorkoutSession>> {
        let session = sqlx::query_as::<_, WorkoutSession>(&format!(
            "DELETE FROM workout_sessions WHERE id = $1 RETURNING {SESSION_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }
}

#[async_trait]
impl SubscriptionStore for PgStore {
    async fn find_subscription(&self, id: Uuid) -> StoreResult<Option<Subscription>> {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(subscription)
    }

    async fn list_subscriptions(&self, user_id: Option<Uuid>) -> StoreResult<Vec<Subscription>> {
        let subscriptions = sqlx::query_as::<_, Subscription>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
             WHERE ($1::uuid IS NULL OR user_id = $1)
             ORDER BY start_date DESC, created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(subscriptions)
    }

    async fn insert_subscription(
        &self,
        subscription: NewSubscription,
    ) -> StoreResult<Subscription> {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            "INSERT INTO subscriptions
                 (id, user_id, plan_name, plan_value, start_date, end_date, payment_date,
                  payment_status, notes, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
             RETURNING {SUBSCRIPTION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(subscription.user_id)
        .bind(&subscription.plan_name)
        .bind(subscription.plan_value)
        .bind(subscription.start_date)
        .bind(subscription.end_date)
        .bind(subscription.payment_date)
        .bind(subscription.payment_status)
        .bind(&subscription.notes)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(subscription)
    }

    async fn update_subscription(
        &self,
        id: Uuid,
        changes: SubscriptionChanges,
    ) -> StoreResult<Option<Subscription>> {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            "UPDATE subscriptions SET
                 user_id = COALESCE($2, user_id),
                 plan_name = COALESCE($3, plan_name),
                 plan_value = COALESCE($4, plan_value),
                 start_date = COALESCE($5, start_date),
                 end_date = COALESCE($6, end_date),
                 payment_date = COALESCE($7, payment_date),
                 payment_status = COALESCE($8, payment_status),
                 notes = COALESCE($9, notes),
                 updated_at = $10
             WHERE id = $1
             RETURNING {SUBSCRIPTION_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.user_id)
        .bind(&changes.plan_name)
        .bind(changes.plan_value)
        .bind(changes.start_date)
        .bind(changes.end_date)
        .bind(changes.payment_date)
        .bind(changes.payment_status)
        .bind(&changes.notes)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        Ok(subscription)
    }

    async fn delete_subscription(&self, id: Uuid) -> StoreResult<Option<Subscription>> {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            "DELETE FROM subscriptions WHERE id = $1 RETURNING {SUBSCRIPTION_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(subscription)
    }
}

#[async_trait]
impl AssessmentStore for PgStore {
    async fn find_assessment(&self, id: Uuid) -> StoreResult<Option<PhysicalAssessment>> {
        let assessment = sqlx::query_as::<_, PhysicalAssessment>(&format!(
            "SELECT {ASSESSMENT_COLUMNS} FROM physical_assessments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(assessment)
    }

    async fn list_assessments_for_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<PhysicalAssessment>> {
        let assessments = sqlx::query_as::<_, PhysicalAssessment>(&format!(
            "SELECT {ASSESSMENT_COLUMNS} FROM physical_assessments
             WHERE user_id = $1
             ORDER BY date DESC, created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(assessments)
    }

    async fn insert_assessment(
        &self,
        assessment: NewAssessment,
    ) -> StoreResult<PhysicalAssessment> {
        let m = &assessment.measurements;
        let created = sqlx::query_as::<_, PhysicalAssessment>(&format!(
            "INSERT INTO physical_assessments
                 (id, user_id, date, weight_kg, height_cm, body_fat_percentage, waist_cm,
                  hip_cm, chest_cm, arm_left_cm, arm_right_cm, leg_left_cm, leg_right_cm,
                  anamnesis, notes, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $16)
             RETURNING {ASSESSMENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(assessment.user_id)
        .bind(assessment.date)
        .bind(m.weight_kg)
        .bind(m.height_cm)
        .bind(m.body_fat_percentage)
        .bind(m.waist_cm)
        .bind(m.hip_cm)
        .bind(m.chest_cm)
        .bind(m.arm_left_cm)
        .bind(m.arm_right_cm)
        .bind(m.leg_left_cm)
        .bind(m.leg_right_cm)
        .bind(&assessment.anamnesis)
        .bind(&assessment.notes)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_assessment(
        &self,
        id: Uuid,
        changes: AssessmentChanges,
    ) -> StoreResult<Option<PhysicalAssessment>> {
        let m = &changes.measurements;
        let updated = sqlx::query_as::<_, PhysicalAssessment>(&format!(
            "UPDATE physical_assessments SET
                 user_id = COALESCE($2, user_id),
                 date = COALESCE($3, date),
                 weight_kg = COALESCE($4, weight_kg),
                 height_cm = COALESCE($5, height_cm),
                 body_fat_percentage = COALESCE($6, body_fat_percentage),
                 waist_cm = COALESCE($7, waist_cm),
                 hip_cm = COALESCE($8, hip_cm),
                 chest_cm = COALESCE($9, chest_cm),
                 arm_left_cm = COALESCE($10, arm_left_cm),
                 arm_right_cm = COALESCE($11, arm_right_cm),
                 leg_left_cm = COALESCE($12, leg_left_cm),
                 leg_right_cm = COALESCE($13, leg_right_cm),
                 anamnesis = COALESCE($14, anamnesis),
                 notes = COALESCE($15, notes),
                 updated_at = $16
             WHERE id = $1
             RETURNING {ASSESSMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.user_id)
        .bind(changes.date)
        .bind(m.weight_kg)
        .bind(m.height_cm)
        .bind(m.body_fat_percentage)
        .bind(m.waist_cm)
        .bind(m.hip_cm)
        .bind(m.chest_cm)
        .bind(m.arm_left_cm)
        .bind(m.arm_right_cm)
        .bind(m.leg_left_cm)
        .bind(m.leg_right_cm)
        .bind(&changes.anamnesis)
        .bind(&changes.notes)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete_assessment(&self, id: Uuid) -> StoreResult<Option<PhysicalAssessment>> {
        let assessment = sqlx::query_as::<_, PhysicalAssessment>(&format!(
            "DELETE FROM physical_assessments WHERE id = $1 RETURNING {ASSESSMENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(assessment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("press"), "%press%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_exercise_columns_alias() {
        assert!(exercise_columns(Some("e")).starts_with("e.id, e.title"));
        assert!(exercise_columns(None).contains("exercise_group_id"));
    }
}
