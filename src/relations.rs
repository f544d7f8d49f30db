//! Relation reconciliation.
//!
//! Computes the minimal set of writes that turns the stored shape of a
//! relation into the shape a caller asked for. Stores apply the result
//! inside a transaction; nothing here touches persistence.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::models::{PlanExerciseInput, WorkoutPlanExercise};

/// Connect/disconnect sets for an id-keyed relation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdDiff {
    pub to_connect: Vec<Uuid>,
    pub to_disconnect: Vec<Uuid>,
}

impl IdDiff {
    /// `to_connect` keeps the order of `desired`, `to_disconnect` keeps the
    /// order of `current`. Duplicates in `desired` collapse to one id.
    pub fn between(current: &[Uuid], desired: &[Uuid]) -> Self {
        let current_set: HashSet<Uuid> = current.iter().copied().collect();
        let desired = dedup(desired);
        let desired_set: HashSet<Uuid> = desired.iter().copied().collect();

        let to_connect = desired
            .into_iter()
            .filter(|id| !current_set.contains(id))
            .collect();

        let mut seen = HashSet::new();
        let to_disconnect = current
            .iter()
            .copied()
            .filter(|id| !desired_set.contains(id) && seen.insert(*id))
            .collect();

        Self {
            to_connect,
            to_disconnect,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_connect.is_empty() && self.to_disconnect.is_empty()
    }

    /// Applies the diff to `current`, returning the resulting id set in a
    /// stable order (kept ids first, then connected ones).
    pub fn apply(&self, current: &[Uuid]) -> Vec<Uuid> {
        let removed: HashSet<Uuid> = self.to_disconnect.iter().copied().collect();
        let mut result: Vec<Uuid> = dedup(current)
            .into_iter()
            .filter(|id| !removed.contains(id))
            .collect();
        for id in &self.to_connect {
            if !result.contains(id) {
                result.push(*id);
            }
        }
        result
    }
}

/// Ids from `requested` that are absent from `found`, de-duplicated and in
/// request order.
pub fn missing_ids(requested: &[Uuid], found: &[Uuid]) -> Vec<Uuid> {
    let found: HashSet<Uuid> = found.iter().copied().collect();
    dedup(requested)
        .into_iter()
        .filter(|id| !found.contains(id))
        .collect()
}

/// Renders ids the way error messages list them: `a, b, c`.
pub fn join_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn dedup(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// An in-place change to an existing plan row.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRowUpdate {
    pub id: Uuid,
    pub input: PlanExerciseInput,
}

/// Writes needed to make a workout's plan equal a desired list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanDiff {
    pub updates: Vec<PlanRowUpdate>,
    pub inserts: Vec<PlanExerciseInput>,
    pub deletes: Vec<Uuid>,
}

impl PlanDiff {
    /// Rows are paired per exercise: the k-th desired entry for an exercise
    /// takes the k-th stored row for that exercise, stored rows ranked by
    /// `order` and then by creation time. Paired rows that already hold the
    /// desired values produce no write.
    pub fn between(current: &[WorkoutPlanExercise], desired: &[PlanExerciseInput]) -> Self {
        let mut ranked: Vec<&WorkoutPlanExercise> = current.iter().collect();
        ranked.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

        let mut pool: HashMap<Uuid, Vec<&WorkoutPlanExercise>> = HashMap::new();
        for row in ranked {
            pool.entry(row.exercise_id).or_default().push(row);
        }
        // Pop from the back, so reverse to hand rows out front-first.
        for rows in pool.values_mut() {
            rows.reverse();
        }

        let mut diff = PlanDiff::default();
        for input in desired {
            match pool.get_mut(&input.exercise_id).and_then(Vec::pop) {
                Some(row) if row.matches(input) => {}
                Some(row) => diff.updates.push(PlanRowUpdate {
                    id: row.id,
                    input: input.clone(),
                }),
                None => diff.inserts.push(input.clone()),
            }
        }

        let mut leftovers: Vec<&WorkoutPlanExercise> =
            pool.into_values().flatten().collect();
        leftovers.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        diff.deletes = leftovers.into_iter().map(|row| row.id).collect();

        diff
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.inserts.is_empty() && self.deletes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn input(exercise_id: Uuid, order: i32) -> PlanExerciseInput {
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

    fn row(workout_id: Uuid, exercise_id: Uuid, order: i32, age_secs: i64) -> WorkoutPlanExercise {
        let created = Utc::now() - Duration::seconds(age_secs);
        WorkoutPlanExercise {
            id: Uuid::new_v4(),
            workout_id,
            exercise_id,
            sets: 3,
            reps: 10,
            target_load: None,
            target_rest_time: None,
            notes: None,
            order,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_id_diff_connects_and_disconnects() {
        let all = ids(4);
        let current = vec![all[0], all[1], all[2]];
        let desired = vec![all[1], all[3], all[3]];

        let diff = IdDiff::between(&current, &desired);

        assert_eq!(diff.to_connect, vec![all[3]]);
        assert_eq!(diff.to_disconnect, vec![all[0], all[2]]);
        assert_eq!(diff.apply(&current), vec![all[1], all[3]]);
    }

    #[test]
    fn test_id_diff_to_empty_removes_everything() {
        let current = ids(2);
        let diff = IdDiff::between(&current, &[]);

        assert!(diff.to_connect.is_empty());
        assert_eq!(diff.to_disconnect, current);
        assert!(diff.apply(&current).is_empty());
    }

    #[test]
    fn test_id_diff_same_set_is_empty() {
        let current = ids(3);
        let mut desired = current.clone();
        desired.reverse();

        assert!(IdDiff::between(&current, &desired).is_empty());
    }

    #[test]
    fn test_missing_ids_reports_every_absent_id_once() {
        let all = ids(3);
        let requested = vec![all[0], all[1], all[2], all[1]];
        let found = vec![all[0]];

        assert_eq!(missing_ids(&requested, &found), vec![all[1], all[2]]);
        assert_eq!(
            join_ids(&missing_ids(&requested, &found)),
            format!("{}, {}", all[1], all[2])
        );
    }

    #[test]
    fn test_plan_diff_replaces_rows() {
        let workout = Uuid::new_v4();
        let (e1, e2) = (Uuid::new_v4(), Uuid::new_v4());
        let first = row(workout, e1, 1, 20);
        let second = row(workout, e2, 2, 10);

        let diff = PlanDiff::between(&[first.clone(), second.clone()], &[input(e2, 1)]);

        assert_eq!(diff.deletes, vec![first.id]);
        assert!(diff.inserts.is_empty());
        assert_eq!(
            diff.updates,
            vec![PlanRowUpdate {
                id: second.id,
                input: input(e2, 1)
            }]
        );
    }

    #[test]
    fn test_plan_diff_empty_desired_deletes_all() {
        let workout = Uuid::new_v4();
        let current = vec![row(workout, Uuid::new_v4(), 0, 5), row(workout, Uuid::new_v4(), 1, 4)];

        let diff = PlanDiff::between(&current, &[]);

        assert!(diff.updates.is_empty());
        assert!(diff.inserts.is_empty());
        assert_eq!(diff.deletes.len(), 2);
    }

    #[test]
    fn test_plan_diff_unchanged_rows_produce_no_writes() {
        let workout = Uuid::new_v4();
        let e1 = Uuid::new_v4();
        let current = vec![row(workout, e1, 0, 5)];

        assert!(PlanDiff::between(&current, &[input(e1, 0)]).is_empty());
    }

    #[test]
    fn test_plan_diff_pairs_repeated_exercises_in_order() {
        let workout = Uuid::new_v4();
        let e1 = Uuid::new_v4();
        let early = row(workout, e1, 0, 30);
        let late = row(workout, e1, 0, 10);

        // One desired entry keeps the earliest row and drops the other.
        let diff = PlanDiff::between(&[late.clone(), early.clone()], &[input(e1, 0)]);

        assert!(diff.updates.is_empty());
        assert!(diff.inserts.is_empty());
        assert_eq!(diff.deletes, vec![late.id]);
    }

    #[test]
    fn test_plan_diff_with_shared_order_values() {
        let workout = Uuid::new_v4();
        let (e1, e2) = (Uuid::new_v4(), Uuid::new_v4());
        let first = row(workout, e1, 1, 30);
        let second = row(workout, e2, 1, 10);
        let current = vec![second.clone(), first.clone()];

        assert!(PlanDiff::between(&current, &[input(e1, 1), input(e2, 1)]).is_empty());

        let diff = PlanDiff::between(&current, &[input(e2, 1), input(e1, 1), input(e1, 1)]);
        assert!(diff.updates.is_empty());
        assert_eq!(diff.inserts, vec![input(e1, 1)]);
        assert!(diff.deletes.is_empty());

        let diff = PlanDiff::between(&current, &[input(e2, 1)]);
        assert_eq!(diff.deletes, vec![first.id]);
    }

    proptest! {
        #[test]
        fn prop_id_diff_apply_yields_desired(
            pool_size in 1usize..8,
            current_idx in proptest::collection::vec(0usize..8, 0..8),
            desired_idx in proptest::collection::vec(0usize..8, 0..8),
        ) {
            let pool = ids(pool_size);
            let current: Vec<Uuid> = dedup(&current_idx.iter().map(|i| pool[i % pool_size]).collect::<Vec<_>>());
            let desired: Vec<Uuid> = desired_idx.iter().map(|i| pool[i % pool_size]).collect();

            let diff = IdDiff::between(&current, &desired);
            let applied: HashSet<Uuid> = diff.apply(&current).into_iter().collect();
            let expected: HashSet<Uuid> = desired.iter().copied().collect();
            prop_assert_eq!(applied, expected);

            // Ids in both sets are never touched.
            for id in current.iter().filter(|id| desired.contains(id)) {
                prop_assert!(!diff.to_connect.contains(id));
                prop_assert!(!diff.to_disconnect.contains(id));
            }
        }

        #[test]
        fn prop_plan_diff_covers_every_row(
            current_ex in proptest::collection::vec(0usize..4, 0..6),
            desired_ex in proptest::collection::vec((0usize..4, 0i32..5), 0..6),
        ) {
            let workout = Uuid::new_v4();
            let exercises = ids(4);
            let current: Vec<WorkoutPlanExercise> = current_ex
                .iter()
                .enumerate()
                .map(|(i, e)| row(workout, exercises[*e], i as i32, 100 - i as i64))
                .collect();
            let desired: Vec<PlanExerciseInput> = desired_ex
                .iter()
                .map(|(e, order)| input(exercises[*e], *order))
                .collect();

            let diff = PlanDiff::between(&current, &desired);

            // Every stored row is either kept (possibly updated) or deleted.
            let kept = current.len() - diff.deletes.len();
            prop_assert!(diff.updates.len() <= kept);
            // Kept plus inserted rows equals the desired count.
            prop_assert_eq!(kept + diff.inserts.len(), desired.len());
        }
    }
}
