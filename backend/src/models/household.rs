use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for households
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct HouseholdRow {
    pub id: String,
    pub name: String,
    pub invite_code: String,
    pub budget: f64,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl HouseholdRow {
    /// None when the stored id is not a valid uuid.
    pub fn to_shared(&self) -> Option<shared::Household> {
        Some(shared::Household {
            id: Uuid::parse_str(&self.id).ok()?,
            name: self.name.clone(),
            invite_code: self.invite_code.clone(),
            budget: self.budget,
            created_by: self
                .created_by
                .as_ref()
                .and_then(|id| Uuid::parse_str(id).ok()),
            created_at: self.created_at,
        })
    }
}
