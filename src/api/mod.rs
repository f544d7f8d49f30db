// API routes and handlers

pub mod auth;
pub mod exercise_groups;
pub mod exercises;
pub mod health;
pub mod physical_assessments;
pub mod routes;
pub mod subscriptions;
pub mod users;
pub mod workout_plan_exercises;
pub mod workout_sessions;
pub mod workouts;
