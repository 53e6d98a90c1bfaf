use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::UserRow;
use shared::UserStatus;

#[derive(Debug, Error)]
pub enum UserAdminError {
    #[error("User not found")]
    NotFound,
    #[error("Cannot delete yourself")]
    CannotDeleteSelf,
    #[error("Invalid users")]
    InvalidUsers,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

pub async fn get_user_row(
    pool: &SqlitePool,
    user_id: &Uuid,
) -> Result<Option<UserRow>, UserAdminError> {
    let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Fetch a user that must belong to the same household as the acting admin.
async fn get_household_peer(
    pool: &SqlitePool,
    admin: &UserRow,
    user_id: &Uuid,
) -> Result<Option<UserRow>, UserAdminError> {
    let user = get_user_row(pool, user_id).await?;

    Ok(user.filter(|u| u.household_id.is_some() && u.household_id == admin.household_id))
}

/// Soft-delete: the account is marked deactivated so historical expenses
/// and splits keep their references.
pub async fn deactivate_user(
    pool: &SqlitePool,
    admin: &UserRow,
    target_id: &Uuid,
) -> Result<(), UserAdminError> {
    let target = get_household_peer(pool, admin, target_id)
        .await?
        .ok_or(UserAdminError::NotFound)?;

    if target.id == admin.id {
        return Err(UserAdminError::CannotDeleteSelf);
    }

    sqlx::query("UPDATE users SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(UserStatus::Deactivated.as_str())
        .bind(&target.id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Reassign all of `from`'s expenses and splits to `to`, then deactivate
/// `from`. Runs in one transaction so ownership never ends up half-moved.
pub async fn transfer_and_deactivate(
    pool: &SqlitePool,
    admin: &UserRow,
    from_id: &Uuid,
    to_id: &Uuid,
) -> Result<(), UserAdminError> {
    let from = get_household_peer(pool, admin, from_id).await?;
    let to = get_household_peer(pool, admin, to_id).await?;
    let (from, to) = match (from, to) {
        (Some(from), Some(to)) => (from, to),
        _ => return Err(UserAdminError::InvalidUsers),
    };

    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE expenses SET payer_id = ? WHERE payer_id = ?")
        .bind(&to.id)
        .bind(&from.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE splits SET user_id = ? WHERE user_id = ?")
        .bind(&to.id)
        .bind(&from.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE users SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(UserStatus::Deactivated.as_str())
        .bind(&from.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

pub async fn make_admin(
    pool: &SqlitePool,
    admin: &UserRow,
    target_id: &Uuid,
) -> Result<(), UserAdminError> {
    let target = get_household_peer(pool, admin, target_id)
        .await?
        .ok_or(UserAdminError::NotFound)?;

    sqlx::query("UPDATE users SET is_admin = TRUE, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(&target.id)
        .execute(pool)
        .await?;

    Ok(())
}
