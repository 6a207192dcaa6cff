use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{session::Session, user::User},
    state::AppState,
};

pub const SESSION_COOKIE: &str = "rides_session";

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub uuid: String,
    pub username: String,
    pub session_id: String,
}

/// Session of the caller, if any. Handlers decide whether absence is a 401
/// or a redirect.
#[derive(Debug, Clone, Default)]
pub struct CurrentSession(pub Option<AuthenticatedUser>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::from_headers(&parts.headers, state.cookie_key.clone());
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Ok(Self(None));
        };
        Ok(Self(find_session(state, cookie.value()).await?))
    }
}

impl CurrentSession {
    pub fn require(&self) -> Result<&AuthenticatedUser, AppError> {
        self.0.as_ref().ok_or(AppError::Unauthorized)
    }

    pub fn is_active(&self) -> bool {
        self.0.is_some()
    }
}

pub async fn register_user(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<User, AppError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::BadRequest("El usuario es obligatorio".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "La contraseña debe tener al menos {MIN_PASSWORD_LEN} caracteres"
        )));
    }
    let taken: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = ?1")
        .bind(username)
        .fetch_optional(&state.db)
        .await?;
    if taken.is_some() {
        return Err(AppError::BadRequest("El usuario ya existe".into()));
    }

    let password_hash = hash_password(password)?;
    let user = sqlx::query_as::<_, User>(
        r#"INSERT INTO users (uuid, username, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)
           RETURNING id, uuid, username, password_hash, created_at, last_login_at"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(username)
    .bind(password_hash)
    .bind(Utc::now())
    .fetch_one(&state.db)
    .await?;
    info!(username = %user.username, "registered admin user");
    Ok(user)
}

/// Creates the account unless a user with that name already exists.
pub async fn ensure_user(state: &AppState, username: &str, password: &str) -> Result<(), AppError> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = ?1")
        .bind(username.trim())
        .fetch_optional(&state.db)
        .await?;
    if existing.is_none() {
        register_user(state, username, password).await?;
    }
    Ok(())
}

pub async fn authenticate_user(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, uuid, username, password_hash, created_at, last_login_at FROM users WHERE username = ?1",
    )
    .bind(username.trim())
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::Unauthorized)?;

    let parsed = PasswordHash::new(&user.password_hash)
        .map_err(|err| AppError::Other(anyhow::anyhow!("stored hash is invalid: {err}")))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AppError::Unauthorized)?;

    sqlx::query("UPDATE users SET last_login_at = ?1 WHERE id = ?2")
        .bind(Utc::now())
        .bind(user.id)
        .execute(&state.db)
        .await?;
    Ok(user)
}

pub async fn create_session(state: &AppState, user_id: i64) -> Result<String, AppError> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let ttl = chrono::Duration::from_std(state.config.session_ttl)
        .map_err(|err| AppError::Config(format!("session ttl out of range: {err}")))?;
    sqlx::query(
        "INSERT INTO sessions (id, user_id, created_at, last_seen_at, expires_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&id)
    .bind(user_id)
    .bind(now)
    .bind(now)
    .bind(now + ttl)
    .execute(&state.db)
    .await?;
    debug!(user_id, "session created");
    Ok(id)
}

/// Resolves a session id to its user. Expired sessions are removed and
/// treated as absent.
pub async fn find_session(
    state: &AppState,
    session_id: &str,
) -> Result<Option<AuthenticatedUser>, AppError> {
    let session = sqlx::query_as::<_, Session>(
        "SELECT id, user_id, created_at, last_seen_at, expires_at FROM sessions WHERE id = ?1",
    )
    .bind(session_id)
    .fetch_optional(&state.db)
    .await?;
    let Some(session) = session else {
        return Ok(None);
    };

    let now = Utc::now();
    if session.is_expired(now) {
        destroy_session(state, &session.id).await?;
        return Ok(None);
    }

    let user = sqlx::query_as::<_, User>(
        "SELECT id, uuid, username, password_hash, created_at, last_login_at FROM users WHERE id = ?1",
    )
    .bind(session.user_id)
    .fetch_optional(&state.db)
    .await?;
    let Some(user) = user else {
        return Ok(None);
    };

    sqlx::query("UPDATE sessions SET last_seen_at = ?1 WHERE id = ?2")
        .bind(now)
        .bind(&session.id)
        .execute(&state.db)
        .await?;

    Ok(Some(AuthenticatedUser {
        id: user.id,
        uuid: user.uuid,
        username: user.username,
        session_id: session.id,
    }))
}

pub async fn destroy_session(state: &AppState, session_id: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM sessions WHERE id = ?1")
        .bind(session_id)
        .execute(&state.db)
        .await?;
    Ok(())
}

pub fn apply_session_cookie(jar: PrivateCookieJar, session_id: &str) -> PrivateCookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}

pub fn clear_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/").build())
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AppError::Other(anyhow::anyhow!("password hashing failed: {err}")))
}
