mod common;

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use uuid::Uuid;

use common::{id_of, MockDataGenerator, TestApp};

fn plan_of(workout: &Value) -> Vec<(String, i64)> {
    workout["planExercises"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| {
            (
                row["exerciseId"].as_str().unwrap().to_string(),
                row["order"].as_i64().unwrap(),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_create_workout_with_plan_and_user() {
    let app = TestApp::new();
    let (user_id, _) = app.create_user().await;
    let e1 = app.create_exercise("Squat").await;
    let e2 = app.create_exercise("Lunge").await;

    let mut payload = MockDataGenerator::workout(json!([
        MockDataGenerator::plan_item(e2, 2),
        MockDataGenerator::plan_item(e1, 1),
    ]));
    payload["userId"] = json!(user_id);
    payload["endDate"] = json!("2025-06-01T00:00:00Z");

    let (status, workout) = app.post("/workouts", payload).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        plan_of(&workout),
        vec![(e1.to_string(), 1), (e2.to_string(), 2)]
    );
    assert_eq!(workout["planExercises"][0]["exercise"]["title"], "Squat");
    assert_eq!(workout["user"]["id"], user_id.to_string());
    assert!(workout["user"].get("password").is_none());
    assert_eq!(workout["startDate"], "2025-03-01T00:00:00Z");
}

#[tokio::test]
async fn test_plan_update_replaces_rows() {
    let app = TestApp::new();
    let e1 = app.create_exercise("Squat").await;
    let e2 = app.create_exercise("Lunge").await;
    let id = app
        .create_workout(json!([
            MockDataGenerator::plan_item(e1, 1),
            MockDataGenerator::plan_item(e2, 2),
        ]))
        .await;

    let (status, workout) = app
        .patch(
            &format!("/workouts/{id}"),
            json!({ "planExercises": [MockDataGenerator::plan_item(e2, 1)] }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(plan_of(&workout), vec![(e2.to_string(), 1)]);
}

#[tokio::test]
async fn test_empty_plan_removes_all_rows() {
    let app = TestApp::new();
    let e1 = app.create_exercise("Squat").await;
    let id = app
        .create_workout(json!([MockDataGenerator::plan_item(e1, 0)]))
        .await;

    let (status, workout) = app
        .patch(&format!("/workouts/{id}"), json!({ "planExercises": [] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(plan_of(&workout).is_empty());

    let (_, fetched) = app.get(&format!("/workouts/{id}")).await;
    assert!(plan_of(&fetched).is_empty());
}

#[tokio::test]
async fn test_failed_update_leaves_workout_unchanged() {
    let app = TestApp::new();
    let e1 = app.create_exercise("Squat").await;
    let id = app
        .create_workout(json!([MockDataGenerator::plan_item(e1, 0)]))
        .await;
    let (_, before) = app.get(&format!("/workouts/{id}")).await;

    let ghost = Uuid::new_v4();
    let (status, body) = app
        .patch(
            &format!("/workouts/{id}"),
            json!({
                "title": "Should not stick",
                "planExercises": [MockDataGenerator::plan_item(ghost, 0)],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        format!("Exercises not found with IDs for update: {ghost}")
    );

    let (_, after) = app.get(&format!("/workouts/{id}")).await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_workout_end_date_and_user_can_be_cleared() {
    let app = TestApp::new();
    let (user_id, _) = app.create_user().await;
    let mut payload = MockDataGenerator::workout(json!([]));
    payload["userId"] = json!(user_id);
    payload["endDate"] = json!("2025-04-01");
    let (_, workout) = app.post("/workouts", payload).await;
    let id = id_of(&workout);

    let (status, workout) = app
        .patch(
            &format!("/workouts/{id}"),
            json!({ "endDate": null, "userId": null }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(workout["endDate"].is_null());
    assert!(workout["userId"].is_null());
    assert!(workout["user"].is_null());
}

#[tokio::test]
async fn test_invalid_workout_payloads() {
    let app = TestApp::new();

    let mut payload = MockDataGenerator::workout(json!([]));
    payload["startDate"] = json!("first of march");
    let (status, _) = app.post("/workouts", payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let e1 = app.create_exercise("Squat").await;
    let payload = MockDataGenerator::workout(json!([
        { "exerciseId": e1, "sets": 0, "reps": 10, "order": 0 }
    ]));
    let (status, _) = app.post("/workouts", payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_workout_delete_cascades_to_plan_and_sessions() {
    let app = TestApp::new();
    let (user_id, email) = app.create_user().await;
    let token = app.token_for(user_id, &email);
    let e1 = app.create_exercise("Squat").await;
    let id = app
        .create_workout(json!([MockDataGenerator::plan_item(e1, 0)]))
        .await;

    let (status, session) = app
        .send(
            Method::POST,
            "/workout-sessions",
            Some(json!({
                "workoutId": id,
                "date": "2025-03-02",
                "duration": 45,
                "intensity": "HIGH",
            })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let session_id = id_of(&session);

    let (status, _) = app.delete(&format!("/workouts/{id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send(
            Method::GET,
            &format!("/workout-sessions/{session_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get(&format!("/workouts/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_plan_exercise_endpoints() {
    let app = TestApp::new();
    let (user_id, email) = app.create_user().await;
    let token = app.token_for(user_id, &email);
    let e1 = app.create_exercise("Squat").await;
    let workout_id = app.create_workout(json!([])).await;

    let mut item = MockDataGenerator::plan_item(e1, 0);
    item["workoutId"] = json!(workout_id);
    let (status, row) = app
        .send(Method::POST, "/workout-plan-exercises", Some(item.clone()), Some(&token))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let row_id = id_of(&row);

    let (status, _) = app
        .send(Method::POST, "/workout-plan-exercises", Some(item), Some(&token))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, rows) = app
        .send(
            Method::GET,
            &format!("/workout-plan-exercises?workoutId={workout_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows.as_array().unwrap().len(), 2);

    let (status, _) = app
        .send(Method::GET, "/workout-plan-exercises", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = app
        .send(
            Method::PATCH,
            &format!("/workout-plan-exercises/{row_id}"),
            Some(json!({ "sets": 5, "notes": "slow eccentric" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["sets"], 5);

    let (status, deleted) = app
        .send(
            Method::DELETE,
            &format!("/workout-plan-exercises/{row_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["id"], row_id.to_string());

    let (status, body) = app
        .send(
            Method::DELETE,
            &format!("/workout-plan-exercises/workout/{workout_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "count": 1 }));
}

#[tokio::test]
async fn test_plan_exercise_with_unknown_parents() {
    let app = TestApp::new();
    let (user_id, email) = app.create_user().await;
    let token = app.token_for(user_id, &email);
    let workout_id = app.create_workout(json!([])).await;
    let ghost = Uuid::new_v4();

    let mut item = MockDataGenerator::plan_item(ghost, 0);
    item["workoutId"] = json!(workout_id);
    let (status, body) = app
        .send(Method::POST, "/workout-plan-exercises", Some(item), Some(&token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], format!("Exercise with ID \"{ghost}\" not found"));

    let (status, _) = app
        .send(
            Method::GET,
            &format!("/workout-plan-exercises?workoutId={ghost}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_session_list_by_unknown_workout_is_empty() {
    let app = TestApp::new();
    let (user_id, email) = app.create_user().await;
    let token = app.token_for(user_id, &email);

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/workout-sessions?workoutId={}", Uuid::new_v4()),
            None,
            Some(&token),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new();

    for uri in ["/workout-sessions", "/workout-plan-exercises?workoutId=00000000-0000-0000-0000-000000000000", "/subscriptions"] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"], "Unauthorized");
    }

    let (status, _) = app
        .send(Method::GET, "/workout-sessions", None, Some("not-a-jwt"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_shared_order_values_keep_creation_order() {
    let app = TestApp::new();
    let e1 = app.create_exercise("Squat").await;
    let e2 = app.create_exercise("Lunge").await;
    let id = app
        .create_workout(json!([
            MockDataGenerator::plan_item(e1, 1),
            MockDataGenerator::plan_item(e2, 1),
        ]))
        .await;

    let (status, workout) = app.get(&format!("/workouts/{id}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        plan_of(&workout),
        vec![(e1.to_string(), 1), (e2.to_string(), 1)]
    );
}

#[tokio::test]
async fn test_deleting_missing_workout_records_is_not_found_every_time() {
    let app = TestApp::new();
    let (user_id, email) = app.create_user().await;
    let token = app.token_for(user_id, &email);
    let ghost = Uuid::new_v4();

    let cases = [
        ("/workouts", "Workout"),
        ("/workout-sessions", "Workout session"),
        ("/workout-plan-exercises", "WorkoutPlanExercise"),
    ];
    for (base, entity) in cases {
        for _ in 0..2 {
            let (status, body) = app
                .send(Method::DELETE, &format!("{base}/{ghost}"), None, Some(&token))
                .await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{base}");
            assert_eq!(
                body["message"],
                format!("{entity} with ID \"{ghost}\" not found")
            );
        }
    }
}

#[tokio::test]
async fn test_malformed_path_id_uses_error_body() {
    let app = TestApp::new();
    let (user_id, email) = app.create_user().await;
    let token = app.token_for(user_id, &email);

    let (status, body) = app.get("/workouts/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
    assert!(body["message"].is_string());

    let (status, body) = app
        .send(Method::DELETE, "/workout-sessions/42", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
}
