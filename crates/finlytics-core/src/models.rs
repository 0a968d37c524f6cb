//! Domain models for Finlytics

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Income/expense discriminator shared by transactions and categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// UI theme preference, stored per user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(format!("Unknown theme: {}", s)),
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An account owner. The password hash never leaves the store layer.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub theme: Theme,
    pub created_at: DateTime<Utc>,
}

/// A bearer session issued at sign-up/sign-in
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// A transaction category. Valid for exactly one transaction kind.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub icon: String,
    pub kind: TransactionKind,
    pub created_at: DateTime<Utc>,
}

/// Category display fields joined onto a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub name: String,
    pub icon: String,
    pub kind: TransactionKind,
}

/// An income or expense record.
///
/// `amount` is a non-negative magnitude; direction is derived from `kind`
/// only. `category` carries the joined display fields when the transaction
/// has one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category_id: Option<i64>,
    pub category: Option<CategoryInfo>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a transaction
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    pub title: String,
    pub description: Option<String>,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category_id: Option<i64>,
    pub date: NaiveDate,
}

/// An opening balance for one calendar month
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyBalance {
    pub id: i64,
    pub month: u32,
    pub year: i32,
    pub initial_balance: f64,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a monthly balance
#[derive(Debug, Clone, Deserialize)]
pub struct NewMonthlyBalance {
    pub month: u32,
    pub year: i32,
    pub initial_balance: f64,
}
