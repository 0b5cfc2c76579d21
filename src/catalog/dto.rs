use serde::{Deserialize, Serialize};

use crate::catalog::builder::{BuilderError, WorkoutBuilder};
use crate::catalog::model::{Exercise, Workout, WorkoutExercise};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Free-text filter applied to the fetched page.
    #[serde(default)]
    pub q: Option<String>,
    /// `All` or absent lists every public record.
    #[serde(default)]
    pub category: Option<String>,
}

impl ListQuery {
    pub fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseView {
    pub id: String,
    #[serde(flatten)]
    pub exercise: Exercise,
}

impl From<Exercise> for ExerciseView {
    fn from(exercise: Exercise) -> Self {
        Self {
            id: exercise.id.clone(),
            exercise,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutView {
    pub id: String,
    #[serde(flatten)]
    pub workout: Workout,
    pub is_favorite: bool,
    pub exercise_count: usize,
}

impl From<Workout> for WorkoutView {
    fn from(workout: Workout) -> Self {
        Self {
            id: workout.id.clone(),
            is_favorite: workout.is_favorite,
            exercise_count: workout.exercises.len(),
            workout,
        }
    }
}

/// Body of `POST /workouts` and `PUT /workouts/:id`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveWorkoutRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub duration_minutes: i32,
    #[serde(rename = "public", alias = "isPublic", default = "default_public")]
    pub is_public: bool,
    #[serde(default)]
    pub exercises: Vec<WorkoutExercise>,
}

fn default_public() -> bool {
    true
}

impl SaveWorkoutRequest {
    /// Copies the form into the builder, replacing any staged exercises.
    pub fn apply_to(self, builder: &mut WorkoutBuilder) -> Result<(), BuilderError> {
        builder.name = self.name;
        builder.description = self.description;
        builder.category = self.category;
        builder.difficulty = self.difficulty;
        builder.duration_minutes = self.duration_minutes;
        builder.is_public = self.is_public;
        builder.clear_exercises();
        for exercise in self.exercises {
            builder.add_entry(exercise)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    pub workout_id: String,
    pub is_favorite: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedResponse {
    pub exercises: usize,
    pub workout_id: String,
}
