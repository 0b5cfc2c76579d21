//! Translates catalog operations into document-store reads and writes.
//!
//! Reads never fail outward: store errors are logged and become an empty
//! list, `Lookup::Failed` or `false`. Writes return a tagged `GatewayError`.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::FromRef;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::auth::Session;
use crate::catalog::listing::FavoriteAction;
use crate::catalog::model::{now_millis, Exercise, Workout};
use crate::state::AppState;
use crate::store::{nested, Document, DocumentStore, Filter};

pub const EXERCISES: &str = "exercises";
pub const WORKOUTS: &str = "workouts";
pub const USER_WORKOUTS: &str = "user_workouts";
pub const FAVORITES: &str = "favorites";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("User not logged in")]
    NotAuthenticated,
    #[error("only the creator can modify this workout")]
    NotOwner,
    #[error("workout not found")]
    NotFound,
    #[error("encode document: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// Result of a point read. Keeps "absent" apart from "could not ask".
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    Failed(String),
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(v) => Some(v),
            _ => None,
        }
    }
}

trait Identified: DeserializeOwned {
    fn with_id(self, id: String) -> Self;
}

impl Identified for Exercise {
    fn with_id(mut self, id: String) -> Self {
        self.id = id;
        self
    }
}

impl Identified for Workout {
    fn with_id(mut self, id: String) -> Self {
        self.id = id;
        self
    }
}

/// Undecodable documents are skipped, not fatal.
fn decode_docs<T: Identified>(collection: &str, docs: Vec<Document>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| match doc.decode::<T>() {
            Ok(record) => Some(record.with_id(doc.id)),
            Err(e) => {
                warn!(%collection, id = %doc.id, error = %e, "skipping undecodable document");
                None
            }
        })
        .collect()
}

fn require(session: Option<&Session>) -> Result<&Session, GatewayError> {
    session.ok_or(GatewayError::NotAuthenticated)
}

pub fn favorites_path(user_id: &str) -> String {
    nested(USER_WORKOUTS, user_id, FAVORITES)
}

#[derive(Clone)]
pub struct WorkoutGateway {
    store: Arc<dyn DocumentStore>,
}

impl FromRef<AppState> for WorkoutGateway {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.store.clone())
    }
}

impl WorkoutGateway {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn fetch<T: Identified>(
        &self,
        collection: &str,
        filters: &[Filter],
        limit: Option<usize>,
    ) -> anyhow::Result<Vec<T>> {
        let docs = self.store.query(collection, filters, limit).await?;
        Ok(decode_docs(collection, docs))
    }

    async fn lookup<T: Identified>(&self, collection: &str, id: &str) -> Lookup<T> {
        match self.store.get(collection, id).await {
            Ok(Some(doc)) => match doc.decode::<T>() {
                Ok(record) => Lookup::Found(record.with_id(doc.id)),
                Err(e) => {
                    warn!(%collection, %id, error = %e, "document failed to decode");
                    Lookup::Failed(e.to_string())
                }
            },
            Ok(None) => Lookup::NotFound,
            Err(e) => {
                warn!(%collection, %id, error = %e, "point lookup failed");
                Lookup::Failed(e.to_string())
            }
        }
    }

    // --- exercises ---

    pub async fn list_public_exercises(&self) -> Vec<Exercise> {
        match self
            .fetch::<Exercise>(EXERCISES, &[Filter::eq("isPublic", true)], None)
            .await
        {
            Ok(mut exercises) => {
                exercises.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                exercises
            }
            Err(e) => {
                warn!(error = %e, "list_public_exercises failed");
                Vec::new()
            }
        }
    }

    pub async fn list_exercises_by_category(&self, category: &str) -> Vec<Exercise> {
        let filters = [Filter::eq("isPublic", true), Filter::eq("category", category)];
        self.fetch(EXERCISES, &filters, None)
            .await
            .unwrap_or_else(|e| {
                warn!(%category, error = %e, "list_exercises_by_category failed");
                Vec::new()
            })
    }

    pub async fn get_exercise(&self, id: &str) -> Lookup<Exercise> {
        self.lookup(EXERCISES, id).await
    }

    pub async fn create_exercise(
        &self,
        session: Option<&Session>,
        mut exercise: Exercise,
    ) -> Result<String, GatewayError> {
        let session = require(session)?;
        exercise.created_by = session.user_id.clone();
        exercise.created_by_name = session.display_name.clone();
        exercise.timestamp = now_millis();
        exercise.rating = 0.0;
        exercise.rating_count = 0;
        let id = self
            .store
            .add(EXERCISES, serde_json::to_value(&exercise)?)
            .await
            .map_err(|e| {
                error!(user_id = %session.user_id, error = %e, "create_exercise failed");
                GatewayError::Store(e)
            })?;
        info!(exercise_id = %id, user_id = %session.user_id, "exercise created");
        Ok(id)
    }

    pub async fn list_user_exercises(&self, session: Option<&Session>) -> Vec<Exercise> {
        let Some(session) = session else {
            return Vec::new();
        };
        self.fetch(EXERCISES, &[Filter::eq("createdBy", session.user_id.as_str())], None)
            .await
            .unwrap_or_else(|e| {
                warn!(user_id = %session.user_id, error = %e, "list_user_exercises failed");
                Vec::new()
            })
    }

    // --- workouts ---

    async fn annotate(&self, session: Option<&Session>, mut workouts: Vec<Workout>) -> Vec<Workout> {
        if let Some(session) = session {
            let ids = self.favorite_ids(session).await;
            for w in &mut workouts {
                w.is_favorite = ids.contains(&w.id);
            }
        }
        workouts
    }

    /// Public workouts, newest first. The store has no index for
    /// visibility plus timestamp, so the ordering happens here.
    pub async fn list_public_workouts(&self, session: Option<&Session>) -> Vec<Workout> {
        match self
            .fetch::<Workout>(WORKOUTS, &[Filter::eq("public", true)], None)
            .await
        {
            Ok(mut workouts) => {
                workouts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                self.annotate(session, workouts).await
            }
            Err(e) => {
                warn!(error = %e, "list_public_workouts failed");
                Vec::new()
            }
        }
    }

    pub async fn list_workouts_by_category(
        &self,
        session: Option<&Session>,
        category: &str,
    ) -> Vec<Workout> {
        let filters = [Filter::eq("public", true), Filter::eq("category", category)];
        match self.fetch::<Workout>(WORKOUTS, &filters, None).await {
            Ok(workouts) => self.annotate(session, workouts).await,
            Err(e) => {
                warn!(%category, error = %e, "list_workouts_by_category failed");
                Vec::new()
            }
        }
    }

    pub async fn get_workout(&self, session: Option<&Session>, id: &str) -> Lookup<Workout> {
        match self.lookup::<Workout>(WORKOUTS, id).await {
            Lookup::Found(mut workout) => {
                if let Some(session) = session {
                    workout.is_favorite = self.is_favorited(session, id).await;
                }
                Lookup::Found(workout)
            }
            other => other,
        }
    }

    pub async fn create_workout(
        &self,
        session: Option<&Session>,
        mut workout: Workout,
    ) -> Result<String, GatewayError> {
        let session = require(session)?;
        workout.created_by = session.user_id.clone();
        workout.created_by_name = session.display_name.clone();
        workout.timestamp = now_millis();
        let id = self
            .store
            .add(WORKOUTS, serde_json::to_value(&workout)?)
            .await
            .map_err(|e| {
                error!(user_id = %session.user_id, error = %e, "create_workout failed");
                GatewayError::Store(e)
            })?;
        info!(workout_id = %id, user_id = %session.user_id, "workout created");
        Ok(id)
    }

    async fn owned_workout(&self, session: &Session, id: &str) -> Result<Workout, GatewayError> {
        match self.lookup::<Workout>(WORKOUTS, id).await {
            Lookup::Found(w) if w.is_owned_by(&session.user_id) => Ok(w),
            Lookup::Found(w) => {
                warn!(workout_id = %id, owner = %w.created_by, user_id = %session.user_id, "not the owner");
                Err(GatewayError::NotOwner)
            }
            Lookup::NotFound => Err(GatewayError::NotFound),
            Lookup::Failed(reason) => Err(GatewayError::Store(anyhow::anyhow!(reason))),
        }
    }

    /// Full overwrite by the owner. No version check: the last write wins.
    /// The creator id and creation timestamp carry over from the stored record.
    pub async fn update_workout(
        &self,
        session: Option<&Session>,
        id: &str,
        mut workout: Workout,
    ) -> Result<(), GatewayError> {
        let session = require(session)?;
        let existing = self.owned_workout(session, id).await?;
        workout.created_by = existing.created_by;
        workout.created_by_name = session.display_name.clone();
        workout.timestamp = existing.timestamp;
        self.store
            .set(WORKOUTS, id, serde_json::to_value(&workout)?)
            .await
            .map_err(|e| {
                error!(workout_id = %id, error = %e, "update_workout failed");
                GatewayError::Store(e)
            })?;
        info!(workout_id = %id, user_id = %session.user_id, "workout updated");
        Ok(())
    }

    pub async fn delete_workout(&self, session: Option<&Session>, id: &str) -> Result<(), GatewayError> {
        let session = require(session)?;
        self.owned_workout(session, id).await?;
        self.store.delete(WORKOUTS, id).await.map_err(|e| {
            error!(workout_id = %id, error = %e, "delete_workout failed");
            GatewayError::Store(e)
        })?;
        info!(workout_id = %id, user_id = %session.user_id, "workout deleted");
        Ok(())
    }

    pub async fn list_user_workouts(&self, session: Option<&Session>) -> Vec<Workout> {
        let Some(session) = session else {
            return Vec::new();
        };
        let filters = [Filter::eq("createdBy", session.user_id.as_str())];
        match self.fetch::<Workout>(WORKOUTS, &filters, None).await {
            Ok(workouts) => self.annotate(Some(session), workouts).await,
            Err(e) => {
                warn!(user_id = %session.user_id, error = %e, "list_user_workouts failed");
                Vec::new()
            }
        }
    }

    /// Snapshots stored at favoriting time, not the live workouts.
    pub async fn list_favorite_workouts(&self, session: Option<&Session>) -> Vec<Workout> {
        let Some(session) = session else {
            return Vec::new();
        };
        let path = favorites_path(&session.user_id);
        match self.fetch::<Workout>(&path, &[], None).await {
            Ok(workouts) => workouts
                .into_iter()
                .map(|mut w| {
                    w.is_favorite = true;
                    w
                })
                .collect(),
            Err(e) => {
                warn!(user_id = %session.user_id, error = %e, "list_favorite_workouts failed");
                Vec::new()
            }
        }
    }

    // --- favorites ---

    pub async fn favorite_ids(&self, session: &Session) -> HashSet<String> {
        match self.store.list(&favorites_path(&session.user_id)).await {
            Ok(docs) => docs.into_iter().map(|d| d.id).collect(),
            Err(e) => {
                warn!(user_id = %session.user_id, error = %e, "favorite_ids failed");
                HashSet::new()
            }
        }
    }

    pub async fn is_favorited(&self, session: &Session, workout_id: &str) -> bool {
        match self
            .store
            .get(&favorites_path(&session.user_id), workout_id)
            .await
        {
            Ok(doc) => doc.is_some(),
            Err(e) => {
                warn!(user_id = %session.user_id, %workout_id, error = %e, "is_favorited failed");
                false
            }
        }
    }

    pub async fn add_to_favorites(
        &self,
        session: Option<&Session>,
        workout: &Workout,
    ) -> Result<(), GatewayError> {
        let session = require(session)?;
        if workout.id.is_empty() {
            return Err(GatewayError::NotFound);
        }
        self.store
            .set(
                &favorites_path(&session.user_id),
                &workout.id,
                serde_json::to_value(workout)?,
            )
            .await?;
        debug!(user_id = %session.user_id, workout_id = %workout.id, "favorite added");
        Ok(())
    }

    pub async fn remove_from_favorites(
        &self,
        session: Option<&Session>,
        workout_id: &str,
    ) -> Result<(), GatewayError> {
        let session = require(session)?;
        self.store
            .delete(&favorites_path(&session.user_id), workout_id)
            .await?;
        debug!(user_id = %session.user_id, %workout_id, "favorite removed");
        Ok(())
    }

    /// Flips the favorite state and returns the new one.
    pub async fn toggle_favorite(
        &self,
        session: Option<&Session>,
        workout_id: &str,
    ) -> Result<bool, GatewayError> {
        let session = require(session)?;
        let current = self.is_favorited(session, workout_id).await;
        match FavoriteAction::from_current(current) {
            FavoriteAction::Add => {
                let workout = match self.get_workout(Some(session), workout_id).await {
                    Lookup::Found(w) => w,
                    Lookup::NotFound => return Err(GatewayError::NotFound),
                    Lookup::Failed(reason) => {
                        return Err(GatewayError::Store(anyhow::anyhow!(reason)))
                    }
                };
                self.add_to_favorites(Some(session), &workout).await?;
                Ok(true)
            }
            FavoriteAction::Remove => {
                self.remove_from_favorites(Some(session), workout_id).await?;
                Ok(false)
            }
        }
    }
}
