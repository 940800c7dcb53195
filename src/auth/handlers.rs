use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginForm, PublicUser, RegisterRequest, TokenResponse},
        extractors::AuthUser,
        password::{hash_password, verify_password},
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    let Json(payload) = payload?;

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::Validation(
            "email: value is not a valid email address".into(),
        ));
    }

    if state.users.find_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::DuplicateEmail);
    }

    let hash = hash_password(&payload.password)?;

    // The store re-checks uniqueness, so a concurrent registration that slipped
    // past the lookup above still ends as DuplicateEmail.
    let user = state
        .users
        .create(&payload.email, payload.full_name.as_deref(), &hash)
        .await
        .map_err(|e| {
            warn!(email = %payload.email, error = %e, "create user failed");
            AppError::from(e)
        })?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> AppResult<Json<TokenResponse>> {
    let Form(form) = form?;

    let user = match state.users.find_by_email(&form.username).await? {
        Some(u) => u,
        None => {
            warn!(email = %form.username, "login unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };

    if !verify_password(&form.password, &user.hashed_password) {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = state.keys.issue(&user.id.to_string())?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(TokenResponse::bearer(token)))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = state.users.find_by_id(user_id).await?.ok_or_else(|| {
        warn!(user_id, "token subject no longer exists");
        AppError::UserNotFound
    })?;
    Ok(Json(user.into()))
}

/// Tokens are stateless, so there is nothing to revoke; clients drop the token.
pub async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}
