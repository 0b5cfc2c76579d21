//! Catalog records as stored in the document database.
//!
//! Field names follow the existing stored documents (camelCase). The one
//! irregular key is the workout visibility flag, stored as `"public"`.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// A reusable movement definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Exercise {
    /// Document id; empty until persisted and never written into the body.
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub muscle_groups: Vec<String>,
    pub difficulty: String,
    pub equipment: Vec<String>,
    pub instructions: Vec<String>,
    pub video_url: String,
    pub image_url: String,
    pub created_by: String,
    pub created_by_name: String,
    #[serde(rename = "isPublic")]
    pub is_public: bool,
    pub rating: f64,
    pub rating_count: i32,
    pub timestamp: i64,
}

impl Default for Exercise {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            category: String::new(),
            muscle_groups: Vec::new(),
            difficulty: String::new(),
            equipment: Vec::new(),
            instructions: Vec::new(),
            video_url: String::new(),
            image_url: String::new(),
            created_by: String::new(),
            created_by_name: String::new(),
            is_public: true,
            rating: 0.0,
            rating_count: 0,
            timestamp: now_millis(),
        }
    }
}

/// An exercise embedded in a workout by copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkoutExercise {
    pub exercise_id: String,
    pub exercise_name: String,
    pub sets: i32,
    pub reps: i32,
    /// Seconds, for timed movements.
    pub duration: i32,
    /// Seconds.
    pub rest_time: i32,
    pub notes: String,
}

impl WorkoutExercise {
    /// Entry staged by "add exercise" before the user edits it.
    pub fn placeholder() -> Self {
        Self {
            exercise_name: "New Exercise".into(),
            sets: 3,
            reps: 10,
            rest_time: 60,
            notes: "Tap to edit details.".into(),
            ..Default::default()
        }
    }

    pub fn from_exercise(exercise: &Exercise) -> Self {
        Self {
            exercise_id: exercise.id.clone(),
            exercise_name: exercise.name.clone(),
            sets: 3,
            reps: 10,
            rest_time: 60,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Workout {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub description: String,
    pub exercises: Vec<WorkoutExercise>,
    pub category: String,
    pub difficulty: String,
    pub duration_minutes: i32,
    pub created_by: String,
    pub created_by_name: String,
    /// Stored as `"public"`, not `"isPublic"`; existing documents depend on it.
    #[serde(rename = "public")]
    pub is_public: bool,
    /// Viewer-relative; resolved from the favorites collection, never stored.
    #[serde(skip)]
    pub is_favorite: bool,
    pub rating: f64,
    pub rating_count: i32,
    pub timestamp: i64,
}

impl Default for Workout {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            exercises: Vec::new(),
            category: String::new(),
            difficulty: String::new(),
            duration_minutes: 0,
            created_by: String::new(),
            created_by_name: String::new(),
            is_public: true,
            is_favorite: false,
            rating: 0.0,
            rating_count: 0,
            timestamp: now_millis(),
        }
    }
}

impl Workout {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        !self.created_by.is_empty() && self.created_by == user_id
    }
}
