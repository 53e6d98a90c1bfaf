use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{HouseholdRow, UserRow};
use shared::{RegisterRequest, User, UserStatus};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid invite code")]
    InvalidInviteCode,
    #[error("Stored user record is corrupt")]
    CorruptRecord,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Password hashing error")]
    HashingError,
    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| AuthError::HashingError)
}

/// Register a new user.
///
/// With an invite code the user joins that household as a regular member;
/// without one a fresh household is created and the user becomes its admin.
/// A previously deactivated account with the same email is reactivated in
/// place so its expense history stays attached.
pub async fn register_user(pool: &SqlitePool, request: &RegisterRequest) -> Result<User, AuthError> {
    let email = request.email.trim().to_lowercase();
    let display_name = match &request.display_name {
        Some(name) if !name.is_empty() => name.clone(),
        _ => email.split('@').next().unwrap_or(&email).to_string(),
    };

    let existing: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(pool)
        .await?;

    if let Some(user) = existing {
        if user.is_active() {
            return Err(AuthError::EmailTaken);
        }
        return reactivate_user(pool, &user, &request.password, &display_name).await;
    }

    let password_hash = hash_password(&request.password)?;
    let user_id = Uuid::new_v4();
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    let (household_id, is_admin) = match &request.invite_code {
        Some(code) => {
            let household: Option<HouseholdRow> =
                sqlx::query_as("SELECT * FROM households WHERE invite_code = ?")
                    .bind(code)
                    .fetch_optional(&mut *tx)
                    .await?;
            let household = household.ok_or(AuthError::InvalidInviteCode)?;
            (household.id, false)
        }
        None => {
            let household_id = Uuid::new_v4();
            let household_name = match &request.household_name {
                Some(name) if !name.is_empty() => name.clone(),
                _ => format!("{}'s Household", display_name),
            };
            sqlx::query(
                r#"
                INSERT INTO households (id, name, invite_code, budget, created_by, created_at)
                VALUES (?, ?, ?, 0, ?, ?)
                "#,
            )
            .bind(household_id.to_string())
            .bind(&household_name)
            .bind(generate_invite_code())
            .bind(user_id.to_string())
            .bind(now)
            .execute(&mut *tx)
            .await?;
            (household_id.to_string(), true)
        }
    };

    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, display_name, household_id, status, is_admin, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id.to_string())
    .bind(&email)
    .bind(&password_hash)
    .bind(&display_name)
    .bind(&household_id)
    .bind(UserStatus::Active.as_str())
    .bind(is_admin)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(User {
        id: user_id,
        email,
        display_name,
        household_id: Uuid::parse_str(&household_id).ok(),
        status: UserStatus::Active,
        is_admin,
        created_at: now,
        updated_at: now,
    })
}

async fn reactivate_user(
    pool: &SqlitePool,
    user: &UserRow,
    password: &str,
    display_name: &str,
) -> Result<User, AuthError> {
    let password_hash = hash_password(password)?;
    let now = Utc::now();

    sqlx::query(
        "UPDATE users SET password_hash = ?, display_name = ?, status = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&password_hash)
    .bind(display_name)
    .bind(UserStatus::Active.as_str())
    .bind(now)
    .bind(&user.id)
    .execute(pool)
    .await?;

    let refreshed: UserRow = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(&user.id)
        .fetch_one(pool)
        .await?;

    refreshed.to_shared().ok_or(AuthError::CorruptRecord)
}

pub async fn login_user(
    pool: &SqlitePool,
    request: &shared::LoginRequest,
) -> Result<User, AuthError> {
    let email = request.email.trim().to_lowercase();

    let user: UserRow = sqlx::query_as("SELECT * FROM users WHERE email = ? AND status = ?")
        .bind(&email)
        .bind(UserStatus::Active.as_str())
        .fetch_optional(pool)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let password_hash = user
        .password_hash
        .as_ref()
        .ok_or(AuthError::InvalidCredentials)?;

    let parsed_hash =
        PasswordHash::new(password_hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(request.password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)?;

    user.to_shared().ok_or(AuthError::CorruptRecord)
}

/// Invite codes are the 8-char prefix of a v4 uuid; the column's UNIQUE
/// constraint backstops the (vanishingly unlikely) collision.
pub fn generate_invite_code() -> String {
    Uuid::new_v4().to_string()[..8].to_string()
}

pub fn create_jwt(user_id: &Uuid, secret: &str, expiration_hours: i64) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::hours(expiration_hours);

    let claims = Claims {
        sub: user_id.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn verify_jwt(token: &str, secret: &str) -> Result<Uuid, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Uuid::parse_str(&token_data.claims.sub).map_err(|_| AuthError::InvalidCredentials)
}
