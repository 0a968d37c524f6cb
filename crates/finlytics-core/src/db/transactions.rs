//! Transaction operations
//!
//! Reads come back joined with the category display fields and ordered date
//! descending for display; any other ordering the aggregation engine needs
//! is its own concern. Edit/delete are acknowledged future capabilities and
//! intentionally absent.

use chrono::{NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{CategoryInfo, NewTransaction, Transaction, TransactionKind};

const TX_SELECT: &str = "
    SELECT t.id, t.title, t.description, t.amount, t.kind, t.category_id,
           t.date, t.created_at, c.name, c.icon, c.kind
    FROM transactions t
    LEFT JOIN categories c ON c.id = t.category_id
";

fn map_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let kind: String = row.get(4)?;
    let date: String = row.get(6)?;
    let created_at: String = row.get(7)?;
    let category_name: Option<String> = row.get(8)?;

    let category = match category_name {
        Some(name) => {
            let icon: String = row.get(9)?;
            let cat_kind: String = row.get(10)?;
            Some(CategoryInfo {
                name,
                icon,
                kind: cat_kind.parse().unwrap_or(TransactionKind::Expense),
            })
        }
        None => None,
    };

    Ok(Transaction {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        kind: kind.parse().unwrap_or(TransactionKind::Expense),
        category_id: row.get(5)?,
        category,
        date: NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .unwrap_or_else(|_| Utc::now().date_naive()),
        created_at: parse_datetime(&created_at),
    })
}

impl Database {
    /// List an owner's transactions joined with category display fields,
    /// newest date first.
    pub fn list_transactions(&self, user_id: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let sql = format!(
            "{} WHERE t.user_id = ?1 ORDER BY t.date DESC, t.id DESC",
            TX_SELECT
        );
        let mut stmt = conn.prepare(&sql)?;
        let transactions = stmt
            .query_map(params![user_id], map_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(transactions)
    }

    /// Fetch one of an owner's transactions by id
    pub fn get_transaction(&self, user_id: i64, transaction_id: i64) -> Result<Transaction> {
        let conn = self.conn()?;
        let sql = format!("{} WHERE t.user_id = ?1 AND t.id = ?2", TX_SELECT);
        conn.query_row(&sql, params![user_id, transaction_id], map_transaction)
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("Transaction not found: {}", transaction_id)))
    }

    /// Insert a transaction for an owner, returning the created record with
    /// its category joined.
    ///
    /// The amount is stored as a non-negative magnitude rounded to currency
    /// precision; a referenced category must belong to the owner and share
    /// the transaction's kind.
    pub fn insert_transaction(&self, user_id: i64, tx: &NewTransaction) -> Result<Transaction> {
        let title = tx.title.trim();
        if title.is_empty() {
            return Err(Error::InvalidData("Title is required".to_string()));
        }
        if !tx.amount.is_finite() || tx.amount < 0.0 {
            return Err(Error::InvalidData(
                "Amount must be a non-negative number".to_string(),
            ));
        }
        let amount = (tx.amount * 100.0).round() / 100.0;

        if let Some(category_id) = tx.category_id {
            let category = self
                .get_category(user_id, category_id)?
                .ok_or_else(|| Error::NotFound(format!("Category not found: {}", category_id)))?;
            if category.kind != tx.kind {
                return Err(Error::InvalidData(format!(
                    "Category '{}' is a {} category and cannot be used on a {} transaction",
                    category.name, category.kind, tx.kind
                )));
            }
        }

        let description = tx
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO transactions (user_id, title, description, amount, kind, category_id, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user_id,
                title,
                description,
                amount,
                tx.kind.as_str(),
                tx.category_id,
                tx.date.to_string(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_transaction(user_id, id)
    }
}
