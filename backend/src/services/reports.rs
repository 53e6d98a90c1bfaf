use chrono::{Local, NaiveDate};
use rust_xlsxwriter::{Workbook, XlsxError};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ExpenseRow, SplitRow, UserRow};
use crate::services::budget::{self, period_range};
use crate::services::expenses::display_label;
use shared::{BudgetSummary, Period};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error(transparent)]
    BudgetError(#[from] crate::services::budget::BudgetError),
    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(#[from] XlsxError),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

const EXPENSE_HEADERS: [&str; 7] = [
    "Item",
    "Amount",
    "Payer",
    "Category",
    "Date",
    "Time",
    "Participants (share)",
];

/// One line of the "Expenses" sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub item: String,
    pub amount: f64,
    pub payer: String,
    pub category: String,
    pub date: String,
    pub time: String,
    pub participants: String,
}

/// Collect the report lines for a period, oldest first, together with the
/// budget summary over the same period.
pub async fn build_report(
    pool: &SqlitePool,
    household_id: Option<Uuid>,
    period: Period,
    today: NaiveDate,
) -> Result<(Vec<ReportRow>, BudgetSummary), ReportError> {
    let Some(household_id) = household_id else {
        return Ok((Vec::new(), BudgetSummary::empty()));
    };

    let (start, end) = period_range(period, today);

    let mut sql = String::from("SELECT * FROM expenses WHERE household_id = ?");
    if start.is_some() {
        sql.push_str(" AND date >= ?");
    }
    if end.is_some() {
        sql.push_str(" AND date <= ?");
    }
    sql.push_str(" ORDER BY date ASC, time ASC");

    let mut query = sqlx::query_as::<_, ExpenseRow>(&sql).bind(household_id.to_string());
    if let Some(start) = start {
        query = query.bind(start);
    }
    if let Some(end) = end {
        query = query.bind(end);
    }

    let expenses = query.fetch_all(pool).await?;

    let mut rows = Vec::with_capacity(expenses.len());
    for expense in &expenses {
        let splits: Vec<SplitRow> = sqlx::query_as("SELECT * FROM splits WHERE expense_id = ?")
            .bind(&expense.id)
            .fetch_all(pool)
            .await?;

        let mut participants = Vec::with_capacity(splits.len());
        for split in &splits {
            let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
                .bind(&split.user_id)
                .fetch_optional(pool)
                .await?;
            participants.push(format!(
                "{} ({:.2})",
                display_label(user.as_ref(), "Unknown User"),
                split.share_amount
            ));
        }

        let payer: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(&expense.payer_id)
            .fetch_optional(pool)
            .await?;

        rows.push(ReportRow {
            item: expense.item.clone(),
            amount: expense.amount,
            payer: display_label(payer.as_ref(), "Unknown Payer"),
            category: expense.category.clone().unwrap_or_default(),
            date: expense.date.to_string(),
            time: expense.time_hhmm(),
            participants: participants.join("; "),
        });
    }

    let summary = budget::budget_summary(pool, Some(household_id), start, end).await?;

    Ok((rows, summary))
}

fn write_workbook(
    path: &Path,
    rows: &[ReportRow],
    summary: &BudgetSummary,
) -> Result<(), ReportError> {
    let mut workbook = Workbook::new();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Expenses")?;
        for (col, header) in EXPENSE_HEADERS.iter().enumerate() {
            sheet.write_string(0, col as u16, *header)?;
        }
        for (i, row) in rows.iter().enumerate() {
            let r = (i + 1) as u32;
            sheet.write_string(r, 0, &row.item)?;
            sheet.write_number(r, 1, row.amount)?;
            sheet.write_string(r, 2, &row.payer)?;
            sheet.write_string(r, 3, &row.category)?;
            sheet.write_string(r, 4, &row.date)?;
            sheet.write_string(r, 5, &row.time)?;
            sheet.write_string(r, 6, &row.participants)?;
        }
    }

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        sheet.write_string(0, 0, "Metric")?;
        sheet.write_string(0, 1, "Value")?;
        sheet.write_string(1, 0, "Budget")?;
        sheet.write_number(1, 1, summary.budget)?;
        sheet.write_string(2, 0, "Total Spent")?;
        sheet.write_number(2, 1, summary.spent)?;
        sheet.write_string(3, 0, "Remaining")?;
        sheet.write_number(3, 1, summary.remaining)?;
    }

    workbook.save(path)?;
    Ok(())
}

/// Export a period report into the reports directory and return the path
/// of the written file. An empty expense set still produces a headered
/// "Expenses" sheet and a (budget, 0, budget) summary.
pub async fn generate_report(
    pool: &SqlitePool,
    reports_dir: &str,
    household_id: Option<Uuid>,
    period: Period,
) -> Result<PathBuf, ReportError> {
    let today = Local::now().date_naive();
    let (rows, summary) = build_report(pool, household_id, period, today).await?;

    std::fs::create_dir_all(reports_dir)?;

    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let filename = format!("report_{}_{}.xlsx", period.as_str(), stamp);
    let path = Path::new(reports_dir).join(filename);

    write_workbook(&path, &rows, &summary)?;

    log::info!("Wrote {} report with {} rows to {:?}", period.as_str(), rows.len(), path);

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::test_pool;
    use crate::services::auth::register_user;
    use crate::services::expenses::record_expense;
    use crate::services::households::set_budget;
    use shared::{CreateExpenseRequest, RegisterRequest};

    async fn register(pool: &SqlitePool, email: &str) -> shared::User {
        register_user(
            pool,
            &RegisterRequest {
                email: email.to_string(),
                password: "test_password123".to_string(),
                display_name: None,
                invite_code: None,
                household_name: None,
            },
        )
        .await
        .unwrap()
    }

    async fn user_row(pool: &SqlitePool, id: &Uuid) -> UserRow {
        sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_one(pool)
            .await
            .unwrap()
    }

    fn expense(item: &str, amount: f64, day: u32) -> CreateExpenseRequest {
        CreateExpenseRequest {
            item: item.to_string(),
            amount,
            category: Some("food".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 8, day),
            time: Some("08:15".to_string()),
        }
    }

    #[tokio::test]
    async fn test_build_report_rows_ascending_with_participants() {
        let pool = test_pool().await;

        let user = register(&pool, "solo@example.com").await;
        let household_id = user.household_id;
        set_budget(&pool, &household_id.unwrap(), 100.0).await.unwrap();

        let row = user_row(&pool, &user.id).await;
        record_expense(&pool, &row, &expense("Later", 45.0, 20)).await.unwrap();
        record_expense(&pool, &row, &expense("Earlier", 30.0, 5)).await.unwrap();

        let today = NaiveDate::from_ymd_opt(2025, 8, 25).unwrap();
        let (rows, summary) = build_report(&pool, household_id, Period::Monthly, today)
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].item, "Earlier");
        assert_eq!(rows[1].item, "Later");
        assert_eq!(rows[0].date, "2025-08-05");
        assert_eq!(rows[0].time, "08:15");
        assert_eq!(rows[0].category, "food");
        assert_eq!(rows[0].payer, "solo");
        assert_eq!(rows[0].participants, "solo (30.00)");

        assert_eq!(summary.budget, 100.0);
        assert_eq!(summary.spent, 75.0);
        assert_eq!(summary.remaining, 25.0);
    }

    #[tokio::test]
    async fn test_build_report_period_filter() {
        let pool = test_pool().await;

        let user = register(&pool, "solo@example.com").await;
        let household_id = user.household_id;
        let row = user_row(&pool, &user.id).await;

        record_expense(&pool, &row, &expense("Today", 10.0, 25)).await.unwrap();
        record_expense(&pool, &row, &expense("Earlier", 20.0, 5)).await.unwrap();

        let today = NaiveDate::from_ymd_opt(2025, 8, 25).unwrap();

        let (daily, _) = build_report(&pool, household_id, Period::Daily, today)
            .await
            .unwrap();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].item, "Today");

        let (full, _) = build_report(&pool, household_id, Period::Full, today)
            .await
            .unwrap();
        assert_eq!(full.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_report_keeps_budget_summary() {
        let pool = test_pool().await;

        let user = register(&pool, "solo@example.com").await;
        let household_id = user.household_id;
        set_budget(&pool, &household_id.unwrap(), 80.0).await.unwrap();

        let today = NaiveDate::from_ymd_opt(2025, 8, 25).unwrap();
        let (rows, summary) = build_report(&pool, household_id, Period::Daily, today)
            .await
            .unwrap();

        assert!(rows.is_empty());
        assert_eq!(summary.budget, 80.0);
        assert_eq!(summary.spent, 0.0);
        assert_eq!(summary.remaining, 80.0);
    }

    #[tokio::test]
    async fn test_generate_report_writes_file() {
        let pool = test_pool().await;

        let user = register(&pool, "solo@example.com").await;
        let row = user_row(&pool, &user.id).await;
        record_expense(&pool, &row, &expense("Groceries", 12.0, 10)).await.unwrap();

        let dir = std::env::temp_dir().join(format!("reports-{}", Uuid::new_v4()));
        let path = generate_report(
            &pool,
            dir.to_str().unwrap(),
            user.household_id,
            Period::Full,
        )
        .await
        .unwrap();

        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("report_full_"));
        assert!(name.ends_with(".xlsx"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
