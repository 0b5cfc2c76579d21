//! Staging area for a workout being authored or edited.
//!
//! Entries carry a locally generated `EntryKey`, so an edit aimed at one
//! entry still lands on it after other entries were removed.

use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::Session;
use crate::catalog::gateway::{GatewayError, Lookup, WorkoutGateway};
use crate::catalog::model::{Exercise, Workout, WorkoutExercise};

#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("Workout name cannot be empty.")]
    EmptyName,
    #[error("A workout must have at least one exercise.")]
    NoExercises,
    #[error("Exercise name cannot be empty")]
    EmptyExerciseName,
    #[error("no staged exercise with key {0}")]
    UnknownEntry(EntryKey),
    #[error("no staged exercise at position {0}")]
    IndexOutOfRange(usize),
    #[error("Failed to load workout: {0}")]
    LoadFailed(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey(u64);

impl std::fmt::Display for EntryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StagedExercise {
    pub key: EntryKey,
    pub exercise: WorkoutExercise,
}

#[derive(Debug, Clone, Default)]
pub struct WorkoutBuilder {
    editing: Option<String>,
    pub name: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub duration_minutes: i32,
    pub is_public: bool,
    entries: Vec<StagedExercise>,
    next_key: u64,
}

impl WorkoutBuilder {
    pub fn new() -> Self {
        Self {
            is_public: true,
            ..Default::default()
        }
    }

    /// Edit mode: fields and exercises come from the existing workout.
    pub fn edit(workout: Workout) -> Self {
        let mut builder = Self {
            editing: Some(workout.id),
            name: workout.name,
            description: workout.description,
            category: workout.category,
            difficulty: workout.difficulty,
            duration_minutes: workout.duration_minutes,
            is_public: workout.is_public,
            ..Default::default()
        };
        for exercise in workout.exercises {
            builder.push(exercise);
        }
        builder
    }

    pub async fn load(
        gateway: &WorkoutGateway,
        session: Option<&Session>,
        workout_id: &str,
    ) -> Result<Self, BuilderError> {
        match gateway.get_workout(session, workout_id).await {
            Lookup::Found(workout) => Ok(Self::edit(workout)),
            Lookup::NotFound => {
                warn!(%workout_id, "workout to edit not found");
                Err(GatewayError::NotFound.into())
            }
            Lookup::Failed(reason) => Err(BuilderError::LoadFailed(reason)),
        }
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn entries(&self) -> &[StagedExercise] {
        &self.entries
    }

    pub fn clear_exercises(&mut self) {
        self.entries.clear();
    }

    pub fn exercises(&self) -> Vec<WorkoutExercise> {
        self.entries.iter().map(|e| e.exercise.clone()).collect()
    }

    fn push(&mut self, exercise: WorkoutExercise) -> EntryKey {
        let key = EntryKey(self.next_key);
        self.next_key += 1;
        self.entries.push(StagedExercise { key, exercise });
        key
    }

    fn position(&self, key: EntryKey) -> Result<usize, BuilderError> {
        self.entries
            .iter()
            .position(|e| e.key == key)
            .ok_or(BuilderError::UnknownEntry(key))
    }

    fn key_at(&self, index: usize) -> Result<EntryKey, BuilderError> {
        self.entries
            .get(index)
            .map(|e| e.key)
            .ok_or(BuilderError::IndexOutOfRange(index))
    }

    /// Appends a default entry to be edited afterwards.
    pub fn add_exercise(&mut self) -> EntryKey {
        self.push(WorkoutExercise::placeholder())
    }

    pub fn add_from_catalog(&mut self, exercise: &Exercise) -> EntryKey {
        self.push(WorkoutExercise::from_exercise(exercise))
    }

    /// Appends an entry as given, e.g. from a submitted form.
    pub fn add_entry(&mut self, exercise: WorkoutExercise) -> Result<EntryKey, BuilderError> {
        if exercise.exercise_name.trim().is_empty() {
            return Err(BuilderError::EmptyExerciseName);
        }
        Ok(self.push(exercise))
    }

    /// Replaces the entry's values. Its catalog reference is kept.
    pub fn update(&mut self, key: EntryKey, mut exercise: WorkoutExercise) -> Result<(), BuilderError> {
        let name = exercise.exercise_name.trim();
        if name.is_empty() {
            return Err(BuilderError::EmptyExerciseName);
        }
        exercise.exercise_name = name.to_string();
        exercise.notes = exercise.notes.trim().to_string();
        let pos = self.position(key)?;
        exercise.exercise_id = std::mem::take(&mut self.entries[pos].exercise.exercise_id);
        self.entries[pos].exercise = exercise;
        Ok(())
    }

    pub fn update_at(&mut self, index: usize, exercise: WorkoutExercise) -> Result<(), BuilderError> {
        let key = self.key_at(index)?;
        self.update(key, exercise)
    }

    /// Removes the entry; later entries shift down to close the gap.
    pub fn remove(&mut self, key: EntryKey) -> Result<WorkoutExercise, BuilderError> {
        let pos = self.position(key)?;
        let removed = self.entries.remove(pos).exercise;
        debug!(exercise = %removed.exercise_name, "staged exercise removed");
        Ok(removed)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<WorkoutExercise, BuilderError> {
        let key = self.key_at(index)?;
        self.remove(key)
    }

    pub fn validate(&self) -> Result<(), BuilderError> {
        if self.name.trim().is_empty() {
            return Err(BuilderError::EmptyName);
        }
        if self.entries.is_empty() {
            return Err(BuilderError::NoExercises);
        }
        Ok(())
    }

    pub fn to_workout(&self) -> Workout {
        Workout {
            id: self.editing.clone().unwrap_or_default(),
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            exercises: self.exercises(),
            category: self.category.clone(),
            difficulty: self.difficulty.clone(),
            duration_minutes: self.duration_minutes,
            is_public: self.is_public,
            ..Default::default()
        }
    }

    /// Validates locally, then creates or overwrites the workout.
    /// Returns the workout id.
    pub async fn commit(
        &self,
        gateway: &WorkoutGateway,
        session: Option<&Session>,
    ) -> Result<String, BuilderError> {
        self.validate()?;
        let workout = self.to_workout();
        match &self.editing {
            Some(id) => {
                gateway.update_workout(session, id, workout).await?;
                Ok(id.clone())
            }
            None => Ok(gateway.create_workout(session, workout).await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::{CountingStore, FailingStore};
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn session() -> Session {
        Session {
            user_id: "u1".into(),
            display_name: "lifter".into(),
            email: "lifter@fit.io".into(),
        }
    }

    fn squats() -> WorkoutExercise {
        WorkoutExercise {
            exercise_name: "Squats".into(),
            sets: 3,
            reps: 10,
            ..Default::default()
        }
    }

    #[test]
    fn add_then_remove_only_entry_leaves_empty_list() {
        let mut b = WorkoutBuilder::new();
        b.add_exercise();
        b.remove_at(0).unwrap();
        assert!(b.exercises().is_empty());
    }

    #[test]
    fn placeholder_defaults() {
        let mut b = WorkoutBuilder::new();
        b.add_exercise();
        let e = &b.entries()[0].exercise;
        assert_eq!(e.exercise_name, "New Exercise");
        assert_eq!((e.sets, e.reps, e.rest_time), (3, 10, 60));
        assert_eq!(e.notes, "Tap to edit details.");
        assert!(b.is_public);
    }

    #[test]
    fn keyed_update_survives_earlier_removal() {
        let mut b = WorkoutBuilder::new();
        let first = b.add_exercise();
        let second = b.add_exercise();
        b.remove(first).unwrap();
        b.update(second, squats()).unwrap();
        assert_eq!(b.exercises(), vec![squats()]);
        assert!(matches!(b.remove(first), Err(BuilderError::UnknownEntry(_))));
    }

    #[test]
    fn update_keeps_catalog_reference_and_rejects_blank_name() {
        let mut b = WorkoutBuilder::new();
        let pushups = Exercise {
            id: "ex-1".into(),
            name: "Push-ups".into(),
            ..Default::default()
        };
        let key = b.add_from_catalog(&pushups);
        b.update(
            key,
            WorkoutExercise {
                exercise_name: "  Wide Push-ups ".into(),
                sets: 4,
                ..Default::default()
            },
        )
        .unwrap();
        let e = &b.entries()[0].exercise;
        assert_eq!(e.exercise_id, "ex-1");
        assert_eq!(e.exercise_name, "Wide Push-ups");
        assert_eq!(e.sets, 4);

        let err = b
            .update_at(
                0,
                WorkoutExercise {
                    exercise_name: "   ".into(),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, BuilderError::EmptyExerciseName));
        assert!(matches!(b.update_at(5, squats()), Err(BuilderError::IndexOutOfRange(5))));
    }

    #[tokio::test]
    async fn empty_name_rejected_without_touching_store() {
        let store = Arc::new(CountingStore::new(Arc::new(MemoryStore::new())));
        let gw = WorkoutGateway::new(store.clone());
        let mut b = WorkoutBuilder::new();
        b.name = "   ".into();
        b.add_exercise();

        let err = b.commit(&gw, Some(&session())).await.unwrap_err();
        assert!(matches!(err, BuilderError::EmptyName));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn no_exercises_rejected_without_touching_store() {
        let store = Arc::new(CountingStore::new(Arc::new(MemoryStore::new())));
        let gw = WorkoutGateway::new(store.clone());
        let mut b = WorkoutBuilder::new();
        b.name = "Leg Day".into();

        let err = b.commit(&gw, Some(&session())).await.unwrap_err();
        assert!(matches!(err, BuilderError::NoExercises));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn commit_without_session_is_not_authenticated() {
        let gw = WorkoutGateway::new(Arc::new(MemoryStore::new()));
        let mut b = WorkoutBuilder::new();
        b.name = "Leg Day".into();
        b.add_exercise();
        let err = b.commit(&gw, None).await.unwrap_err();
        assert!(matches!(err, BuilderError::Gateway(GatewayError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn create_then_edit_round_trip() {
        let gw = WorkoutGateway::new(Arc::new(MemoryStore::new()));
        let me = session();

        let mut b = WorkoutBuilder::new();
        b.name = "Leg Day".into();
        b.category = "Lower Body".into();
        let key = b.add_exercise();
        b.update(key, squats()).unwrap();
        let id = b.commit(&gw, Some(&me)).await.unwrap();

        let mut edit = WorkoutBuilder::load(&gw, Some(&me), &id).await.unwrap();
        assert_eq!(edit.editing(), Some(id.as_str()));
        assert_eq!(edit.name, "Leg Day");
        assert_eq!(edit.exercises(), vec![squats()]);

        edit.name = "Leg Day II".into();
        edit.add_exercise();
        let same = edit.commit(&gw, Some(&me)).await.unwrap();
        assert_eq!(same, id);

        let stored = gw.get_workout(None, &id).await.found().unwrap();
        assert_eq!(stored.name, "Leg Day II");
        assert_eq!(stored.exercises.len(), 2);
        assert_eq!(stored.category, "Lower Body");
    }

    #[tokio::test]
    async fn load_missing_workout_fails() {
        let gw = WorkoutGateway::new(Arc::new(MemoryStore::new()));
        let err = WorkoutBuilder::load(&gw, None, "missing").await.unwrap_err();
        assert!(matches!(err, BuilderError::Gateway(GatewayError::NotFound)));

        let broken = WorkoutGateway::new(Arc::new(FailingStore));
        let err = WorkoutBuilder::load(&broken, None, "any").await.unwrap_err();
        assert!(matches!(err, BuilderError::LoadFailed(_)));
    }
}
