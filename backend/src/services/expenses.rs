use chrono::{Local, NaiveDate, NaiveTime, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ExpenseRow, SplitRow, UserRow};
use shared::{CreateExpenseRequest, ExpenseList, ExpenseShare, ExpenseWithShares, UserStatus};

#[derive(Debug, Error)]
pub enum ExpenseError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("User not in a household")]
    NoHousehold,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Divide an amount equally across members, in whole cents. The rounding
/// remainder goes to the payer so the shares always sum to the amount.
pub fn equal_shares(amount: f64, members: &[Uuid], payer_id: &Uuid) -> Vec<(Uuid, f64)> {
    let total_cents = (amount * 100.0).round() as i64;
    let n = members.len() as i64;
    let base = total_cents / n;
    let remainder = total_cents - base * n;

    members
        .iter()
        .map(|&id| {
            let mut cents = base;
            if id == *payer_id {
                cents += remainder;
            }
            (id, cents as f64 / 100.0)
        })
        .collect()
}

fn parse_time(time: &str) -> Result<NaiveTime, ExpenseError> {
    NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|_| ExpenseError::InvalidInput("Time must be HH:MM".to_string()))
}

pub(crate) fn display_label(user: Option<&UserRow>, fallback: &str) -> String {
    match user {
        Some(u) if u.is_active() => u.display_name.clone(),
        _ => fallback.to_string(),
    }
}

/// Record an expense and its split allocation in a single transaction.
/// The amount is split equally across all active members of the payer's
/// household at recording time.
pub async fn record_expense(
    pool: &SqlitePool,
    payer: &UserRow,
    request: &CreateExpenseRequest,
) -> Result<Uuid, ExpenseError> {
    let item = request.item.trim();
    if item.is_empty() {
        return Err(ExpenseError::InvalidInput("Item is required".to_string()));
    }
    if request.amount <= 0.0 {
        return Err(ExpenseError::InvalidInput(
            "Amount must be positive".to_string(),
        ));
    }

    let household_id = payer.household_uuid().ok_or(ExpenseError::NoHousehold)?;
    let payer_id = payer.uuid().ok_or(ExpenseError::NoHousehold)?;

    let date = match request.date {
        Some(date) => date,
        None => Local::now().date_naive(),
    };
    let time = match &request.time {
        Some(time) => parse_time(time)?,
        None => Local::now().time(),
    };

    let member_ids: Vec<String> =
        sqlx::query_scalar("SELECT id FROM users WHERE household_id = ? AND status = ?")
            .bind(household_id.to_string())
            .bind(UserStatus::Active.as_str())
            .fetch_all(pool)
            .await?;

    let mut members: Vec<Uuid> = member_ids
        .iter()
        .filter_map(|id| Uuid::parse_str(id).ok())
        .collect();
    if !members.contains(&payer_id) {
        members.push(payer_id);
    }

    let shares = equal_shares(request.amount, &members, &payer_id);

    let expense_id = Uuid::new_v4();
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO expenses (id, item, amount, payer_id, household_id, category, date, time, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(expense_id.to_string())
    .bind(item)
    .bind(request.amount)
    .bind(payer_id.to_string())
    .bind(household_id.to_string())
    .bind(&request.category)
    .bind(date)
    .bind(time)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    for (user_id, share_amount) in &shares {
        sqlx::query(
            "INSERT INTO splits (id, expense_id, user_id, share_amount) VALUES (?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(expense_id.to_string())
        .bind(user_id.to_string())
        .bind(share_amount)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(expense_id)
}

/// Household expenses with their shares, newest first, optionally bounded
/// by an inclusive date range. Deactivated participants show up under
/// fallback labels.
pub async fn list_expenses(
    pool: &SqlitePool,
    household_id: Option<Uuid>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<ExpenseList, ExpenseError> {
    let Some(household_id) = household_id else {
        return Ok(ExpenseList {
            expenses: Vec::new(),
            total: 0.0,
        });
    };

    let mut sql = String::from("SELECT * FROM expenses WHERE household_id = ?");
    if start.is_some() {
        sql.push_str(" AND date >= ?");
    }
    if end.is_some() {
        sql.push_str(" AND date <= ?");
    }
    sql.push_str(" ORDER BY date DESC, time DESC");

    let mut query = sqlx::query_as::<_, ExpenseRow>(&sql).bind(household_id.to_string());
    if let Some(start) = start {
        query = query.bind(start);
    }
    if let Some(end) = end {
        query = query.bind(end);
    }

    let rows = query.fetch_all(pool).await?;

    let mut expenses = Vec::with_capacity(rows.len());
    let mut total = 0.0;

    for expense in rows {
        // Rows with unparseable ids are skipped rather than aborting the listing
        let (Ok(id), Ok(payer_id)) = (
            Uuid::parse_str(&expense.id),
            Uuid::parse_str(&expense.payer_id),
        ) else {
            log::warn!("Skipping expense with unparseable id: {}", expense.id);
            continue;
        };

        let splits: Vec<SplitRow> = sqlx::query_as("SELECT * FROM splits WHERE expense_id = ?")
            .bind(&expense.id)
            .fetch_all(pool)
            .await?;

        let mut shares = Vec::with_capacity(splits.len());
        for split in splits {
            let Ok(user_id) = Uuid::parse_str(&split.user_id) else {
                log::warn!("Skipping split with unparseable user id: {}", split.user_id);
                continue;
            };

            let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
                .bind(&split.user_id)
                .fetch_optional(pool)
                .await?;

            shares.push(ExpenseShare {
                user_id,
                share_amount: split.share_amount,
                display_name: display_label(user.as_ref(), "Unknown User"),
            });
        }

        let payer: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(&expense.payer_id)
            .fetch_optional(pool)
            .await?;

        total += expense.amount;
        expenses.push(ExpenseWithShares {
            id,
            item: expense.item.clone(),
            amount: expense.amount,
            payer_id,
            payer_name: display_label(payer.as_ref(), "Unknown Payer"),
            category: expense.category.clone(),
            date: expense.date,
            time: expense.time_hhmm(),
            shares,
        });
    }

    Ok(ExpenseList { expenses, total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::test_pool;
    use crate::services::auth::register_user;
    use crate::services::households::get_household;
    use shared::RegisterRequest;

    async fn register(pool: &SqlitePool, email: &str, invite: Option<String>) -> shared::User {
        register_user(
            pool,
            &RegisterRequest {
                email: email.to_string(),
                password: "test_password123".to_string(),
                display_name: None,
                invite_code: invite,
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

    async fn invite_of(pool: &SqlitePool, user: &shared::User) -> String {
        get_household(pool, &user.household_id.unwrap())
            .await
            .unwrap()
            .unwrap()
            .invite_code
    }

    fn expense_request(item: &str, amount: f64) -> CreateExpenseRequest {
        CreateExpenseRequest {
            item: item.to_string(),
            amount,
            category: None,
            date: Some(NaiveDate::from_ymd_opt(2025, 8, 10).unwrap()),
            time: Some("12:30".to_string()),
        }
    }

    #[test]
    fn test_equal_shares_even_division() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let shares = equal_shares(50.0, &[a, b], &a);
        assert_eq!(shares, vec![(a, 25.0), (b, 25.0)]);
    }

    #[test]
    fn test_equal_shares_remainder_to_payer() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let shares = equal_shares(100.0, &[a, b, c], &b);
        let by_id: std::collections::HashMap<_, _> = shares.iter().cloned().collect();

        assert_eq!(by_id[&a], 33.33);
        assert_eq!(by_id[&b], 33.34);
        assert_eq!(by_id[&c], 33.33);

        let cents: i64 = shares.iter().map(|(_, s)| (s * 100.0).round() as i64).sum();
        assert_eq!(cents, 10000);
    }

    #[test]
    fn test_equal_shares_single_member() {
        let a = Uuid::new_v4();
        assert_eq!(equal_shares(42.5, &[a], &a), vec![(a, 42.5)]);
    }

    #[tokio::test]
    async fn test_record_expense_writes_expense_and_splits() {
        let pool = test_pool().await;

        let admin = register(&pool, "admin@example.com", None).await;
        let invite = invite_of(&pool, &admin).await;
        register(&pool, "member@example.com", Some(invite)).await;

        let payer = user_row(&pool, &admin.id).await;
        let expense_id = record_expense(&pool, &payer, &expense_request("Groceries", 33.0))
            .await
            .unwrap();

        let expense: ExpenseRow = sqlx::query_as("SELECT * FROM expenses WHERE id = ?")
            .bind(expense_id.to_string())
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(expense.item, "Groceries");
        assert_eq!(expense.amount, 33.0);

        let splits: Vec<SplitRow> = sqlx::query_as("SELECT * FROM splits WHERE expense_id = ?")
            .bind(expense_id.to_string())
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(splits.len(), 2);

        let sum: f64 = splits.iter().map(|s| s.share_amount).sum();
        assert!((sum - 33.0).abs() < 0.005);
    }

    #[tokio::test]
    async fn test_record_expense_validation() {
        let pool = test_pool().await;

        let admin = register(&pool, "admin@example.com", None).await;
        let payer = user_row(&pool, &admin.id).await;

        let empty_item = record_expense(&pool, &payer, &expense_request("  ", 10.0)).await;
        assert!(matches!(empty_item, Err(ExpenseError::InvalidInput(_))));

        let zero_amount = record_expense(&pool, &payer, &expense_request("Coffee", 0.0)).await;
        assert!(matches!(zero_amount, Err(ExpenseError::InvalidInput(_))));

        let bad_time = record_expense(
            &pool,
            &payer,
            &CreateExpenseRequest {
                time: Some("noon".to_string()),
                ..expense_request("Coffee", 5.0)
            },
        )
        .await;
        assert!(matches!(bad_time, Err(ExpenseError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_record_expense_requires_household() {
        let pool = test_pool().await;

        let admin = register(&pool, "admin@example.com", None).await;
        sqlx::query("UPDATE users SET household_id = NULL WHERE id = ?")
            .bind(admin.id.to_string())
            .execute(&pool)
            .await
            .unwrap();

        let payer = user_row(&pool, &admin.id).await;
        let result = record_expense(&pool, &payer, &expense_request("Coffee", 5.0)).await;
        assert!(matches!(result, Err(ExpenseError::NoHousehold)));
    }

    #[tokio::test]
    async fn test_deactivated_members_are_not_allocated() {
        let pool = test_pool().await;

        let admin = register(&pool, "admin@example.com", None).await;
        let invite = invite_of(&pool, &admin).await;
        let member = register(&pool, "member@example.com", Some(invite)).await;

        sqlx::query("UPDATE users SET status = 'deactivated' WHERE id = ?")
            .bind(member.id.to_string())
            .execute(&pool)
            .await
            .unwrap();

        let payer = user_row(&pool, &admin.id).await;
        let expense_id = record_expense(&pool, &payer, &expense_request("Solo", 20.0))
            .await
            .unwrap();

        let splits: Vec<SplitRow> = sqlx::query_as("SELECT * FROM splits WHERE expense_id = ?")
            .bind(expense_id.to_string())
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(splits.len(), 1);
        assert_eq!(splits[0].user_id, admin.id.to_string());
        assert_eq!(splits[0].share_amount, 20.0);
    }

    #[tokio::test]
    async fn test_list_expenses_order_range_and_labels() {
        let pool = test_pool().await;

        let admin = register(&pool, "admin@example.com", None).await;
        let invite = invite_of(&pool, &admin).await;
        let member = register(&pool, "member@example.com", Some(invite)).await;
        let household_id = admin.household_id;

        let member_row = user_row(&pool, &member.id).await;
        for (item, amount, day) in [("Early", 10.0, 5), ("Late", 20.0, 20)] {
            record_expense(
                &pool,
                &member_row,
                &CreateExpenseRequest {
                    date: Some(NaiveDate::from_ymd_opt(2025, 8, day).unwrap()),
                    ..expense_request(item, amount)
                },
            )
            .await
            .unwrap();
        }

        let list = list_expenses(&pool, household_id, None, None).await.unwrap();
        assert_eq!(list.expenses.len(), 2);
        assert_eq!(list.expenses[0].item, "Late");
        assert_eq!(list.expenses[1].item, "Early");
        assert_eq!(list.total, 30.0);
        assert_eq!(list.expenses[0].payer_name, "member");
        assert_eq!(list.expenses[0].time, "12:30");

        // Range filter keeps only the later expense
        let filtered = list_expenses(
            &pool,
            household_id,
            Some(NaiveDate::from_ymd_opt(2025, 8, 10).unwrap()),
            None,
        )
        .await
        .unwrap();
        assert_eq!(filtered.expenses.len(), 1);
        assert_eq!(filtered.total, 20.0);

        // Deactivated payer falls back to the unknown labels
        sqlx::query("UPDATE users SET status = 'deactivated' WHERE id = ?")
            .bind(member.id.to_string())
            .execute(&pool)
            .await
            .unwrap();

        let after = list_expenses(&pool, household_id, None, None).await.unwrap();
        assert_eq!(after.expenses[0].payer_name, "Unknown Payer");
        assert!(after.expenses[0]
            .shares
            .iter()
            .any(|s| s.display_name == "Unknown User"));
    }

    #[tokio::test]
    async fn test_list_expenses_skips_unparseable_rows() {
        let pool = test_pool().await;

        let admin = register(&pool, "admin@example.com", None).await;
        let payer = user_row(&pool, &admin.id).await;
        let expense_id = record_expense(&pool, &payer, &expense_request("Keep", 10.0))
            .await
            .unwrap();

        // Rows predating the uuid id convention must not break the listing
        sqlx::query(
            r#"
            INSERT INTO expenses (id, item, amount, payer_id, household_id, category, date, time, created_at)
            VALUES ('legacy', 'Drop', 20.0, ?, ?, NULL, '2025-08-01', '08:00:00', CURRENT_TIMESTAMP)
            "#,
        )
        .bind(&payer.id)
        .bind(payer.household_id.as_ref().unwrap())
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, display_name, household_id, status, is_admin, created_at, updated_at)
            VALUES ('legacy', 'legacy@example.com', NULL, 'legacy', ?, 'active', FALSE, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
            "#,
        )
        .bind(payer.household_id.as_ref().unwrap())
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO splits (id, expense_id, user_id, share_amount) VALUES ('legacy-split', ?, 'legacy', 5.0)",
        )
        .bind(expense_id.to_string())
        .execute(&pool)
        .await
        .unwrap();

        let list = list_expenses(&pool, admin.household_id, None, None).await.unwrap();
        assert_eq!(list.expenses.len(), 1);
        assert_eq!(list.expenses[0].item, "Keep");
        assert_eq!(list.expenses[0].shares.len(), 1);
        assert_eq!(list.total, 10.0);
    }

    #[tokio::test]
    async fn test_list_expenses_without_household() {
        let pool = test_pool().await;

        let list = list_expenses(&pool, None, None, None).await.unwrap();
        assert!(list.expenses.is_empty());
        assert_eq!(list.total, 0.0);
    }
}
