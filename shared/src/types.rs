use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// User Types
// ============================================================================

/// Lifecycle state of a user account. Deactivated users stay referenced by
/// historical expenses and splits but are excluded from member listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Deactivated,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Deactivated => "deactivated",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, UserStatus::Active)
    }
}

impl FromStr for UserStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(UserStatus::Active),
            "deactivated" => Ok(UserStatus::Deactivated),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub household_id: Option<Uuid>,
    pub status: UserStatus,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
    /// Joins an existing household when present; otherwise a new household
    /// is created and the registering user becomes its admin.
    pub invite_code: Option<String>,
    pub household_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// ============================================================================
// Household Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Household {
    pub id: Uuid,
    pub name: String,
    pub invite_code: String,
    pub budget: f64,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinHouseholdRequest {
    pub invite_code: String,
}

/// Active member of a household, as returned by the members listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberList {
    pub members: Vec<Member>,
}

// ============================================================================
// Budget Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetBudgetRequest {
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub budget: f64,
    pub spent: f64,
    pub remaining: f64,
}

impl BudgetSummary {
    pub fn new(budget: f64, spent: f64) -> Self {
        Self {
            budget,
            spent,
            remaining: budget - spent,
        }
    }

    pub fn empty() -> Self {
        Self::new(0.0, 0.0)
    }
}

// ============================================================================
// Expense Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExpenseRequest {
    pub item: String,
    pub amount: f64,
    pub category: Option<String>,
    /// Defaults to today when omitted.
    pub date: Option<NaiveDate>,
    /// "HH:MM", defaults to the current time when omitted.
    pub time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExpenseResponse {
    pub expense_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseShare {
    pub user_id: Uuid,
    pub share_amount: f64,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseWithShares {
    pub id: Uuid,
    pub item: String,
    pub amount: f64,
    pub payer_id: Uuid,
    pub payer_name: String,
    pub category: Option<String>,
    pub date: NaiveDate,
    pub time: String,
    pub shares: Vec<ExpenseShare>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseList {
    pub expenses: Vec<ExpenseWithShares>,
    pub total: f64,
}

/// Optional inclusive date range for expense listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseRangeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

// ============================================================================
// Report Types
// ============================================================================

/// Reporting period keyword used by the budget aggregator and report export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Monthly,
    Yearly,
    Full,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Monthly => "monthly",
            Period::Yearly => "yearly",
            Period::Full => "full",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown period: {0}")]
pub struct ParsePeriodError(pub String);

impl FromStr for Period {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Period::Daily),
            "monthly" => Ok(Period::Monthly),
            "yearly" => Ok(Period::Yearly),
            "full" => Ok(Period::Full),
            other => Err(ParsePeriodError(other.to_string())),
        }
    }
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSuccess<T> {
    pub data: T,
}

impl<T> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Tests
// ============================================================================
