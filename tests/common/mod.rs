#![allow(dead_code)]

use std::sync::{Arc, Once};

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use fake::{Fake, Faker};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use fitcoach::api::routes::create_routes;
use fitcoach::auth::{JwtService, UserRole};
use fitcoach::store::{MemoryStore, SharedStore};

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_only";

static INIT: Once = Once::new();

/// Initialize test logging
pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("fitcoach=debug")
            .with_test_writer()
            .init();
    });
}

/// Full router over a fresh in-memory store.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    jwt_service: JwtService,
}

impl TestApp {
    pub fn new() -> Self {
        init_test_logging();
        let store = Arc::new(MemoryStore::new());
        let jwt_service = JwtService::new(TEST_JWT_SECRET, 60);
        let shared: SharedStore = store.clone();
        let router = create_routes(shared, jwt_service.clone());
        Self {
            router,
            store,
            jwt_service,
        }
    }

    pub fn token_for(&self, user_id: Uuid, email: &str) -> String {
        self.jwt_service
            .create_access_token(user_id, email, UserRole::Student)
            .unwrap()
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body), None).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(body), None).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None, None).await
    }

    /// Creates a user through the API and returns its id.
    pub async fn create_user(&self) -> (Uuid, String) {
        let payload = MockDataGenerator::user();
        let email = payload["email"].as_str().unwrap().to_string();
        let (status, body) = self.post("/users", payload).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (id_of(&body), email)
    }

    pub async fn create_exercise(&self, title: &str) -> Uuid {
        let (status, body) = self.post("/exercises", MockDataGenerator::exercise(title)).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        id_of(&body)
    }

    pub async fn create_workout(&self, plan: Value) -> Uuid {
        let (status, body) = self
            .post("/workouts", MockDataGenerator::workout(plan))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        id_of(&body)
    }
}

pub fn id_of(body: &Value) -> Uuid {
    body["id"].as_str().unwrap().parse().unwrap()
}

/// Mock request payloads
pub struct MockDataGenerator;

impl MockDataGenerator {
    pub fn user() -> Value {
        json!({
            "email": format!("user{}@example.com", Faker.fake::<u32>()),
            "password": "secret123",
            "name": "Test Athlete",
            "age": (18..70).fake::<i32>(),
            "weight": (50.0..110.0).fake::<f64>(),
            "height": (150.0..200.0).fake::<f64>(),
        })
    }

    pub fn exercise(title: &str) -> Value {
        json!({
            "title": title,
            "description": "Generated test exercise",
            "type": "STRENGTH",
            "muscleGroup": "CHEST",
        })
    }

    pub fn workout(plan: Value) -> Value {
        json!({
            "title": format!("Workout {}", (1..1000).fake::<u32>()),
            "startDate": "2025-03-01",
            "frequency": (1..7).fake::<i32>(),
            "level": "BEGINNER",
            "planExercises": plan,
        })
    }

    pub fn plan_item(exercise_id: Uuid, order: i32) -> Value {
        json!({
            "exerciseId": exercise_id,
            "sets": (1..6).fake::<i32>(),
            "reps": (5..15).fake::<i32>(),
            "order": order,
        })
    }

    pub fn subscription() -> Value {
        json!({
            "planName": "Monthly",
            "planValue": 99.9,
            "startDate": "2025-01-01",
            "endDate": "2025-02-01",
        })
    }
}
