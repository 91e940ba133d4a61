use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{error, info};

use plaza_db::Database;
use plaza_db::models::NewUser;
use plaza_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest, UserEnvelope};

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::{run_db, validation};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: impl Into<String>, token_ttl: chrono::Duration) -> AppState {
        Arc::new(Self {
            db,
            jwt_secret: jwt_secret.into(),
            token_ttl,
        })
    }
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let RegisterRequest {
        username,
        email,
        password,
        bio,
    } = req;

    validation::username(&username)?;
    validation::email(&email)?;
    validation::password(&password)?;
    validation::optional_text("Bio", bio.as_deref(), validation::BIO_MAX_CHARS)?;

    // Argon2id hashing is CPU-bound, run it on the blocking pool
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })??;

    let user = run_db(&state, move |db| {
        db.create_user(&NewUser {
            username: &username,
            email: &email,
            password_hash: &password_hash,
            bio: bio.as_deref(),
        })
    })
    .await?;

    let token = create_token(&state, user.id)?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Missing username or password"));
    }

    let username = req.username.clone();
    let credentials = run_db(&state, move |db| db.get_credentials(&username))
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let password = req.password;
    let stored_hash = credentials.password_hash;
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?;
    if !verified {
        return Err(ApiError::InvalidCredentials);
    }

    let user_id = credentials.id;
    let user = run_db(&state, move |db| db.get_user(user_id)).await?;
    let token = create_token(&state, user.id)?;

    info!(user_id, "User logged in");
    Ok(Json(AuthResponse { token, user }))
}

/// GET /auth/me: the authenticated user's own profile.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = run_db(&state, move |db| db.get_user(claims.sub)).await?;
    Ok(Json(UserEnvelope { user }))
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            ApiError::Internal
        })
}

fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            error!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

pub fn create_token(state: &AppStateInner, user_id: i64) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        exp: (chrono::Utc::now() + state.token_ttl).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        error!("Token encoding failed: {}", e);
        ApiError::Internal
    })
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized)
}
