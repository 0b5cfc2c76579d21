use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, JwtKeys, LoginRequest, PublicUser, RefreshRequest, RegisterRequest,
            UpdateProfileRequest,
        },
        extractors::Session,
        repo_types::User,
        services::{hash_password, is_strong_password, is_valid_email, is_valid_username, verify_password},
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me).patch(update_me))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn session_for(user: &User) -> Session {
    Session {
        user_id: user.id.clone(),
        display_name: user.username.clone(),
        email: user.email.clone(),
    }
}

fn issue_tokens(state: &AppState, user: User) -> Result<AuthResponse, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(state);
    let session = session_for(&user);
    let access_token = keys.sign_access(&session).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        internal(e)
    })?;
    let refresh_token = keys.sign_refresh(&session).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        internal(e)
    })?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();
    payload.username = payload.username.trim().to_string();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Enter a valid email".into()));
    }

    if !is_valid_username(&payload.username) {
        warn!(username = %payload.username, "invalid username");
        return Err((
            StatusCode::BAD_REQUEST,
            "Username must be 4-12 characters and only contain letters and numbers.".into(),
        ));
    }

    if !is_strong_password(&payload.password) {
        warn!("weak password");
        return Err((
            StatusCode::BAD_REQUEST,
            "Password must be at least 8 characters, include upper & lower case, a number, and a symbol"
                .into(),
        ));
    }

    let store = state.store.as_ref();

    match User::find_by_email(store, &payload.email).await {
        Ok(Some(_)) => {
            warn!(email = %payload.email, "email already registered");
            return Err((StatusCode::CONFLICT, "Email already registered".into()));
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(internal(e));
        }
    }

    match User::find_by_username(store, &payload.username).await {
        Ok(Some(_)) => {
            warn!(username = %payload.username, "username taken");
            return Err((StatusCode::CONFLICT, "This username is already taken".into()));
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "find_by_username failed");
            return Err(internal(e));
        }
    }

    let hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        internal(e)
    })?;

    let user = User::create(store, &payload.email, &payload.username, &hash)
        .await
        .map_err(|e| {
            error!(error = %e, "create user failed");
            internal(e)
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(issue_tokens(&state, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let identifier = payload.identifier.trim();
    if identifier.is_empty() || payload.password.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Please fill in all fields".into()));
    }

    let store = state.store.as_ref();
    let lookup = if identifier.contains('@') {
        User::find_by_email(store, &identifier.to_lowercase()).await
    } else {
        User::find_by_username(store, identifier).await
    };

    let user = match lookup {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(%identifier, "login unknown identifier");
            return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
        }
        Err(e) => {
            error!(error = %e, "user lookup failed");
            return Err(internal(e));
        }
    };

    let ok = verify_password(&payload.password, &user.password_hash).map_err(|e| {
        error!(error = %e, "verify_password failed");
        internal(e)
    })?;

    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| (StatusCode::UNAUTHORIZED, format!("{}", e)))?;

    // Reload so renamed users get fresh claims
    let user = User::find_by_id(state.store.as_ref(), &claims.sub)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = User::find_by_id(state.store.as_ref(), &session.user_id)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %session.user_id, "user lookup failed");
            internal(e)
        })?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let username = payload.username.trim();
    if !is_valid_username(username) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Username must be 4-12 characters and only contain letters and numbers.".into(),
        ));
    }

    let store = state.store.as_ref();
    if let Some(other) = User::find_by_username(store, username).await.map_err(internal)? {
        if other.id != session.user_id {
            return Err((StatusCode::CONFLICT, "This username is already taken".into()));
        }
    }

    User::update_username(store, &session.user_id, username)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %session.user_id, "update username failed");
            internal(e)
        })?;

    info!(user_id = %session.user_id, %username, "profile updated");
    get_me(State(state), session).await
}
