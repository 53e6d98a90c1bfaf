use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for expenses
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExpenseRow {
    pub id: String,
    pub item: String,
    pub amount: f64,
    pub payer_id: String,
    pub household_id: String,
    pub category: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

impl ExpenseRow {
    /// Wall-clock time formatted the way listings and reports show it.
    pub fn time_hhmm(&self) -> String {
        self.time.format("%H:%M").to_string()
    }
}
