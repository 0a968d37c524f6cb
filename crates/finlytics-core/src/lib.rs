//! Finlytics Core Library
//!
//! Shared functionality for the Finlytics personal finance tracker:
//! - Record store (SQLite) with owner-scoped transactions, categories, and
//!   monthly opening balances
//! - Identity provider: accounts, Argon2id password hashing, bearer sessions
//! - Aggregation engine: pure functions for period totals, trend series,
//!   category breakdowns, and health ratios
//! - Rule-based chat responder answering from the same aggregates

pub mod aggregate;
pub mod chat;
pub mod db;
pub mod error;
pub mod models;

pub use aggregate::{
    category_breakdown, health_ratios, period_totals, trend_series, CategoryTotal, HealthRatios,
    PeriodKey, PeriodTotals, PeriodUnit, TrendPoint, UNCATEGORIZED,
};
pub use chat::ChatContext;
pub use db::Database;
pub use error::{Error, Result};
pub use models::{
    Category, CategoryInfo, MonthlyBalance, NewMonthlyBalance, NewTransaction, Session, Theme,
    Transaction, TransactionKind, User,
};
