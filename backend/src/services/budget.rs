use chrono::{Datelike, NaiveDate};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::HouseholdRow;
use shared::{BudgetSummary, Period};

#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Inclusive date bounds implied by a period keyword, relative to `today`.
pub fn period_range(period: Period, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
    match period {
        Period::Daily => (Some(today), Some(today)),
        Period::Monthly => (
            Some(NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap()),
            None,
        ),
        Period::Yearly => (Some(NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap()), None),
        Period::Full => (None, None),
    }
}

/// Sum of expense amounts for a household, optionally bounded by an
/// inclusive date range.
pub async fn spent_in_range(
    pool: &SqlitePool,
    household_id: &Uuid,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<f64, BudgetError> {
    let mut sql =
        String::from("SELECT COALESCE(SUM(amount), 0.0) FROM expenses WHERE household_id = ?");
    if start.is_some() {
        sql.push_str(" AND date >= ?");
    }
    if end.is_some() {
        sql.push_str(" AND date <= ?");
    }

    let mut query = sqlx::query_scalar::<_, f64>(&sql).bind(household_id.to_string());
    if let Some(start) = start {
        query = query.bind(start);
    }
    if let Some(end) = end {
        query = query.bind(end);
    }

    Ok(query.fetch_one(pool).await?)
}

/// Budget, spent and remaining for the household over the given range.
/// A user without a household (or an unknown household) yields all zeros
/// rather than an error.
pub async fn budget_summary(
    pool: &SqlitePool,
    household_id: Option<Uuid>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<BudgetSummary, BudgetError> {
    let Some(household_id) = household_id else {
        return Ok(BudgetSummary::empty());
    };

    let household: Option<HouseholdRow> = sqlx::query_as("SELECT * FROM households WHERE id = ?")
        .bind(household_id.to_string())
        .fetch_optional(pool)
        .await?;

    let Some(household) = household else {
        return Ok(BudgetSummary::empty());
    };

    let spent = spent_in_range(pool, &household_id, start, end).await?;

    Ok(BudgetSummary::new(household.budget, spent))
}
