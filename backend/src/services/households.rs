use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{HouseholdRow, UserRow};
use shared::{Household, Member, UserStatus};

#[derive(Debug, Error)]
pub enum HouseholdError {
    #[error("Household not found")]
    NotFound,
    #[error("Invalid invite code")]
    InvalidInviteCode,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

pub async fn get_household(
    pool: &SqlitePool,
    household_id: &Uuid,
) -> Result<Option<Household>, HouseholdError> {
    let household: Option<HouseholdRow> = sqlx::query_as("SELECT * FROM households WHERE id = ?")
        .bind(household_id.to_string())
        .fetch_optional(pool)
        .await?;

    Ok(household.and_then(|h| h.to_shared()))
}

pub async fn find_by_invite_code(
    pool: &SqlitePool,
    invite_code: &str,
) -> Result<Option<Household>, HouseholdError> {
    let household: Option<HouseholdRow> =
        sqlx::query_as("SELECT * FROM households WHERE invite_code = ?")
            .bind(invite_code)
            .fetch_optional(pool)
            .await?;

    Ok(household.and_then(|h| h.to_shared()))
}

/// Point the user at the household behind the invite code. Joining while
/// already in another household simply switches membership.
pub async fn join_household(
    pool: &SqlitePool,
    user_id: &Uuid,
    invite_code: &str,
) -> Result<Household, HouseholdError> {
    let household = find_by_invite_code(pool, invite_code)
        .await?
        .ok_or(HouseholdError::InvalidInviteCode)?;

    sqlx::query("UPDATE users SET household_id = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(household.id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    Ok(household)
}

/// Active members only; deactivated users are invisible here but keep their
/// historical expense and split rows.
pub async fn list_active_members(
    pool: &SqlitePool,
    household_id: &Uuid,
) -> Result<Vec<Member>, HouseholdError> {
    let users: Vec<UserRow> = sqlx::query_as(
        "SELECT * FROM users WHERE household_id = ? AND status = ? ORDER BY created_at ASC",
    )
    .bind(household_id.to_string())
    .bind(UserStatus::Active.as_str())
    .fetch_all(pool)
    .await?;

    Ok(users
        .into_iter()
        .filter_map(|u| {
            let id = u.uuid()?;
            Some(Member {
                id,
                email: u.email,
                display_name: u.display_name,
                is_admin: u.is_admin,
            })
        })
        .collect())
}

pub async fn set_budget(
    pool: &SqlitePool,
    household_id: &Uuid,
    amount: f64,
) -> Result<(), HouseholdError> {
    let updated = sqlx::query("UPDATE households SET budget = ? WHERE id = ?")
        .bind(amount)
        .bind(household_id.to_string())
        .execute(pool)
        .await?;

    if updated.rows_affected() == 0 {
        return Err(HouseholdError::NotFound);
    }

    Ok(())
}
