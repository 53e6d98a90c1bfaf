use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for expense splits
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SplitRow {
    pub id: String,
    pub expense_id: String,
    pub user_id: String,
    pub share_amount: f64,
}
