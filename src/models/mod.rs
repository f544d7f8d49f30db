// Domain records, request payloads and store change sets

pub mod common;
pub mod exercise;
pub mod exercise_group;
pub mod physical_assessment;
pub mod subscription;
pub mod user;
pub mod workout;
pub mod workout_plan_exercise;
pub mod workout_session;

pub use common::{parse_enum, parse_iso_datetime, Pagination};
pub use exercise::*;
pub use exercise_group::*;
pub use physical_assessment::*;
pub use subscription::*;
pub use user::*;
pub use workout::*;
pub use workout_plan_exercise::*;
pub use workout_session::*;
