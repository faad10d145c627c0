use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::auth::{
    dto::{LoginRequest, PublicUser, RegisterRequest, TokenResponse},
    extractors::CurrentUser,
    jwt::JwtKeys,
    password::{hash_password, verify_password},
    policy::{self, Operation},
    repo::User,
};
use crate::error::ApiError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::InvalidInput(
            "username and password are required".into(),
        ));
    }

    let user = match User::find_by_username(&state.db, username).await? {
        Some(u) => u,
        None => {
            warn!(%username, "login with unknown username");
            return Err(ApiError::Unauthenticated("invalid credentials"));
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(ApiError::Unauthenticated("invalid credentials"));
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(&user)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
        user: PublicUser::from(user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    caller: CurrentUser,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    policy::authorize(caller.role, Operation::RegisterUser)?;

    let username = payload.username.trim();
    if username.is_empty() {
        return Err(ApiError::InvalidInput("username is required".into()));
    }
    if payload.password.is_empty() {
        return Err(ApiError::InvalidInput("password is required".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, username, &hash, payload.role).await?;

    info!(user_id = %user.id, username = %user.username, role = ?user.role, "operator registered");
    Ok((StatusCode::CREATED, Json(PublicUser::from(user))))
}
