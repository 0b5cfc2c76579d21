use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{MaybeSession, Session},
    state::AppState,
};

use super::builder::{BuilderError, WorkoutBuilder};
use super::dto::{
    CreatedResponse, ExerciseView, FavoriteResponse, ListQuery, SaveWorkoutRequest, SeedResponse,
    WorkoutView,
};
use super::gateway::{GatewayError, Lookup, WorkoutGateway};
use super::listing::{CatalogList, Searchable};
use super::model::Exercise;
use super::seed::{seed_exercises, seed_workouts, SeedError};

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/exercises", get(list_exercises))
        .route("/exercises/mine", get(my_exercises))
        .route("/exercises/:id", get(get_exercise))
        .route("/workouts", get(list_workouts))
        .route("/workouts/mine", get(my_workouts))
        .route("/workouts/favorites", get(favorite_workouts))
        .route("/workouts/:id", get(get_workout))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/exercises", post(create_exercise))
        .route("/workouts", post(create_workout))
        .route("/workouts/:id", put(update_workout).delete(delete_workout))
        .route(
            "/workouts/:id/favorite",
            put(add_favorite).delete(remove_favorite),
        )
        .route("/workouts/:id/favorite/toggle", post(toggle_favorite))
        .route("/seed", post(seed))
}

// --- error mapping ---

type ApiError = (StatusCode, String);

fn gateway_error(e: GatewayError) -> ApiError {
    let status = match &e {
        GatewayError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        GatewayError::NotOwner => StatusCode::FORBIDDEN,
        GatewayError::NotFound => StatusCode::NOT_FOUND,
        GatewayError::Encode(_) | GatewayError::Store(_) => {
            error!(error = %e, "catalog write failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}

fn builder_error(e: BuilderError) -> ApiError {
    match e {
        BuilderError::Gateway(e) => gateway_error(e),
        e @ BuilderError::LoadFailed(_) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
        other => (StatusCode::BAD_REQUEST, other.to_string()),
    }
}

fn found<T>(lookup: Lookup<T>, what: &str) -> Result<T, ApiError> {
    match lookup {
        Lookup::Found(v) => Ok(v),
        Lookup::NotFound => Err((StatusCode::NOT_FOUND, format!("{what} not found"))),
        Lookup::Failed(reason) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Failed to load {what}: {reason}"),
        )),
    }
}

fn filtered<T: Searchable>(items: Vec<T>, q: Option<&str>) -> Vec<T> {
    let mut list = CatalogList::new();
    list.submit(items);
    if let Some(q) = q {
        list.filter(q);
    }
    list.into_visible()
}

// --- exercises ---

#[instrument(skip(gateway))]
pub async fn list_exercises(
    State(gateway): State<WorkoutGateway>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<ExerciseView>> {
    let exercises = match query.category() {
        Some(category) => gateway.list_exercises_by_category(category).await,
        None => gateway.list_public_exercises().await,
    };
    let items = filtered(exercises, query.q.as_deref());
    Json(items.into_iter().map(ExerciseView::from).collect())
}

#[instrument(skip(gateway))]
pub async fn my_exercises(
    State(gateway): State<WorkoutGateway>,
    session: Session,
) -> Json<Vec<ExerciseView>> {
    let exercises = gateway.list_user_exercises(Some(&session)).await;
    Json(exercises.into_iter().map(ExerciseView::from).collect())
}

#[instrument(skip(gateway))]
pub async fn get_exercise(
    State(gateway): State<WorkoutGateway>,
    Path(id): Path<String>,
) -> Result<Json<ExerciseView>, ApiError> {
    let exercise = found(gateway.get_exercise(&id).await, "Exercise")?;
    Ok(Json(exercise.into()))
}

#[instrument(skip(gateway, payload))]
pub async fn create_exercise(
    State(gateway): State<WorkoutGateway>,
    session: Session,
    Json(mut payload): Json<Exercise>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    payload.name = payload.name.trim().to_string();
    if payload.name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Exercise name cannot be empty".into()));
    }
    let id = gateway
        .create_exercise(Some(&session), payload)
        .await
        .map_err(gateway_error)?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

// --- workouts ---

#[instrument(skip(gateway, session))]
pub async fn list_workouts(
    State(gateway): State<WorkoutGateway>,
    MaybeSession(session): MaybeSession,
    Query(query): Query<ListQuery>,
) -> Json<Vec<WorkoutView>> {
    let workouts = match query.category() {
        Some(category) => {
            gateway
                .list_workouts_by_category(session.as_ref(), category)
                .await
        }
        None => gateway.list_public_workouts(session.as_ref()).await,
    };
    let items = filtered(workouts, query.q.as_deref());
    Json(items.into_iter().map(WorkoutView::from).collect())
}

#[instrument(skip(gateway))]
pub async fn my_workouts(
    State(gateway): State<WorkoutGateway>,
    session: Session,
) -> Json<Vec<WorkoutView>> {
    let workouts = gateway.list_user_workouts(Some(&session)).await;
    Json(workouts.into_iter().map(WorkoutView::from).collect())
}

#[instrument(skip(gateway))]
pub async fn favorite_workouts(
    State(gateway): State<WorkoutGateway>,
    session: Session,
) -> Json<Vec<WorkoutView>> {
    let workouts = gateway.list_favorite_workouts(Some(&session)).await;
    Json(workouts.into_iter().map(WorkoutView::from).collect())
}

#[instrument(skip(gateway, session))]
pub async fn get_workout(
    State(gateway): State<WorkoutGateway>,
    MaybeSession(session): MaybeSession,
    Path(id): Path<String>,
) -> Result<Json<WorkoutView>, ApiError> {
    let workout = found(gateway.get_workout(session.as_ref(), &id).await, "Workout")?;
    Ok(Json(workout.into()))
}

#[instrument(skip(gateway, payload))]
pub async fn create_workout(
    State(gateway): State<WorkoutGateway>,
    session: Session,
    Json(payload): Json<SaveWorkoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut builder = WorkoutBuilder::new();
    payload.apply_to(&mut builder).map_err(builder_error)?;
    let id = builder
        .commit(&gateway, Some(&session))
        .await
        .map_err(builder_error)?;

    info!(workout_id = %id, user_id = %session.user_id, "workout saved");
    let location = format!("/api/v1/workouts/{id}");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(CreatedResponse { id }),
    ))
}

#[instrument(skip(gateway, payload))]
pub async fn update_workout(
    State(gateway): State<WorkoutGateway>,
    session: Session,
    Path(id): Path<String>,
    Json(payload): Json<SaveWorkoutRequest>,
) -> Result<Json<WorkoutView>, ApiError> {
    let mut builder = WorkoutBuilder::load(&gateway, Some(&session), &id)
        .await
        .map_err(builder_error)?;
    payload.apply_to(&mut builder).map_err(builder_error)?;
    builder
        .commit(&gateway, Some(&session))
        .await
        .map_err(builder_error)?;

    let workout = found(gateway.get_workout(Some(&session), &id).await, "Workout")?;
    Ok(Json(workout.into()))
}

#[instrument(skip(gateway))]
pub async fn delete_workout(
    State(gateway): State<WorkoutGateway>,
    session: Session,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    gateway
        .delete_workout(Some(&session), &id)
        .await
        .map_err(gateway_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- favorites ---

#[instrument(skip(gateway))]
pub async fn add_favorite(
    State(gateway): State<WorkoutGateway>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<FavoriteResponse>, ApiError> {
    let workout = found(gateway.get_workout(Some(&session), &id).await, "Workout")?;
    gateway
        .add_to_favorites(Some(&session), &workout)
        .await
        .map_err(gateway_error)?;
    Ok(Json(FavoriteResponse {
        workout_id: id,
        is_favorite: true,
    }))
}

#[instrument(skip(gateway))]
pub async fn remove_favorite(
    State(gateway): State<WorkoutGateway>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<FavoriteResponse>, ApiError> {
    gateway
        .remove_from_favorites(Some(&session), &id)
        .await
        .map_err(gateway_error)?;
    Ok(Json(FavoriteResponse {
        workout_id: id,
        is_favorite: false,
    }))
}

#[instrument(skip(gateway))]
pub async fn toggle_favorite(
    State(gateway): State<WorkoutGateway>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<FavoriteResponse>, ApiError> {
    let is_favorite = gateway
        .toggle_favorite(Some(&session), &id)
        .await
        .map_err(gateway_error)?;
    Ok(Json(FavoriteResponse {
        workout_id: id,
        is_favorite,
    }))
}

// --- seeding ---

#[instrument(skip(gateway))]
pub async fn seed(
    State(gateway): State<WorkoutGateway>,
    session: Session,
) -> Result<Json<SeedResponse>, ApiError> {
    let exercises = seed_exercises(&gateway, Some(&session))
        .await
        .map_err(seed_error)?;
    let workout_id = seed_workouts(&gateway, Some(&session))
        .await
        .map_err(seed_error)?;
    Ok(Json(SeedResponse {
        exercises,
        workout_id,
    }))
}

fn seed_error(e: SeedError) -> ApiError {
    match e {
        e @ SeedError::NoExercises => {
            warn!("seed_workouts found no strength exercises");
            (StatusCode::CONFLICT, e.to_string())
        }
        SeedError::Gateway(e) => gateway_error(e),
        SeedError::Builder(e) => builder_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtKeys;
    use axum::{body::Body, extract::FromRef, http::Request};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn session(user_id: &str, name: &str) -> Session {
        Session {
            user_id: user_id.into(),
            display_name: name.into(),
            email: format!("{name}@fit.io"),
        }
    }

    fn app(state: &AppState) -> Router {
        crate::catalog::router().with_state(state.clone())
    }

    fn bearer(state: &AppState, session: &Session) -> String {
        let token = JwtKeys::from_ref(state).sign_access(session).unwrap();
        format!("Bearer {token}")
    }

    async fn call(
        state: &AppState,
        method: &str,
        uri: &str,
        who: Option<&Session>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(s) = who {
            req = req.header(header::AUTHORIZATION, bearer(state, s));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app(state).oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn leg_day() -> Value {
        json!({
            "name": "Leg Day",
            "category": "Strength",
            "difficulty": "Intermediate",
            "durationMinutes": 45,
            "exercises": [{ "exerciseName": "Squats", "sets": 4, "reps": 8, "restTime": 90 }]
        })
    }

    #[tokio::test]
    async fn create_then_get_workout_over_http() {
        let state = AppState::fake();
        let ana = session("u1", "ana");

        let (status, created) = call(&state, "POST", "/workouts", Some(&ana), Some(leg_day())).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, body) = call(&state, "GET", &format!("/workouts/{id}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], json!("Leg Day"));
        assert_eq!(body["createdByName"], json!("ana"));
        assert_eq!(body["exerciseCount"], json!(1));
        assert_eq!(body["isFavorite"], json!(false));
    }

    #[tokio::test]
    async fn writes_require_a_session() {
        let state = AppState::fake();
        let (status, _) = call(&state, "POST", "/workouts", None, Some(leg_day())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(&state, "GET", "/workouts/favorites", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_workout_is_rejected_before_saving() {
        let state = AppState::fake();
        let ana = session("u1", "ana");
        let body = json!({ "name": "  ", "exercises": [{ "exerciseName": "Squats" }] });
        let (status, _) = call(&state, "POST", "/workouts", Some(&ana), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let body = json!({ "name": "Empty" });
        let (status, _) = call(&state, "POST", "/workouts", Some(&ana), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, list) = call(&state, "GET", "/workouts", None, None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn missing_workout_is_404() {
        let state = AppState::fake();
        let (status, _) = call(&state, "GET", "/workouts/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn only_the_owner_can_update_or_delete() {
        let state = AppState::fake();
        let ana = session("u1", "ana");
        let bo = session("u2", "bo");
        let (_, created) = call(&state, "POST", "/workouts", Some(&ana), Some(leg_day())).await;
        let uri = format!("/workouts/{}", created["id"].as_str().unwrap());

        let (status, _) = call(&state, "PUT", &uri, Some(&bo), Some(leg_day())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = call(&state, "DELETE", &uri, Some(&bo), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let mut renamed = leg_day();
        renamed["name"] = json!("Leg Day v2");
        let (status, body) = call(&state, "PUT", &uri, Some(&ana), Some(renamed)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], json!("Leg Day v2"));

        let (status, _) = call(&state, "DELETE", &uri, Some(&ana), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&state, "GET", &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn favorites_are_per_viewer() {
        let state = AppState::fake();
        let ana = session("u1", "ana");
        let bo = session("u2", "bo");
        let (_, created) = call(&state, "POST", "/workouts", Some(&ana), Some(leg_day())).await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, body) = call(
            &state,
            "POST",
            &format!("/workouts/{id}/favorite/toggle"),
            Some(&bo),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isFavorite"], json!(true));

        let (_, for_bo) = call(&state, "GET", "/workouts", Some(&bo), None).await;
        assert_eq!(for_bo[0]["isFavorite"], json!(true));
        let (_, for_ana) = call(&state, "GET", "/workouts", Some(&ana), None).await;
        assert_eq!(for_ana[0]["isFavorite"], json!(false));

        let (_, favs) = call(&state, "GET", "/workouts/favorites", Some(&bo), None).await;
        assert_eq!(favs.as_array().unwrap().len(), 1);

        let (_, body) = call(&state, "DELETE", &format!("/workouts/{id}/favorite"), Some(&bo), None).await;
        assert_eq!(body["isFavorite"], json!(false));
        let (_, favs) = call(&state, "GET", "/workouts/favorites", Some(&bo), None).await;
        assert_eq!(favs, json!([]));
    }

    #[tokio::test]
    async fn exercise_listing_filters_by_category_and_query() {
        let state = AppState::fake();
        let ana = session("u1", "ana");
        let (status, body) = call(&state, "POST", "/seed", Some(&ana), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["exercises"].as_u64().unwrap() > 0);

        let (_, cardio) = call(&state, "GET", "/exercises?category=Cardio", None, None).await;
        assert!(cardio
            .as_array()
            .unwrap()
            .iter()
            .all(|e| e["category"] == json!("Cardio")));

        let (_, all) = call(&state, "GET", "/exercises?category=All&q=glutes", None, None).await;
        let names: Vec<&str> = all
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"Squats"));
        assert!(names.contains(&"Deadlifts"));
        assert!(!names.contains(&"Plank"));
    }

    #[tokio::test]
    async fn created_exercise_starts_unrated() {
        let state = AppState::fake();
        let ana = session("u1", "ana");
        let body = json!({ "name": "Plank", "category": "Strength", "rating": 4.9, "ratingCount": 120 });
        let (status, created) = call(&state, "POST", "/exercises", Some(&ana), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);

        let uri = format!("/exercises/{}", created["id"].as_str().unwrap());
        let (_, fetched) = call(&state, "GET", &uri, None, None).await;
        assert_eq!(fetched["rating"], json!(0.0));
        assert_eq!(fetched["ratingCount"], json!(0));
        assert_eq!(fetched["createdByName"], json!("ana"));
    }
}
