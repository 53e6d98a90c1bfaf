use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use shared::UserStatus;

/// Database model for users
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub display_name: String,
    pub household_id: Option<String>,
    pub status: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// None when the stored id is not a valid uuid.
    pub fn to_shared(&self) -> Option<shared::User> {
        Some(shared::User {
            id: self.uuid()?,
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            household_id: self.household_uuid(),
            status: self.status.parse().unwrap_or(UserStatus::Active),
            is_admin: self.is_admin,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    pub fn uuid(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.id).ok()
    }

    pub fn is_active(&self) -> bool {
        self.status
            .parse::<UserStatus>()
            .map(|s| s.is_active())
            .unwrap_or(false)
    }

    pub fn household_uuid(&self) -> Option<Uuid> {
        self.household_id
            .as_ref()
            .and_then(|id| Uuid::parse_str(id).ok())
    }
}
