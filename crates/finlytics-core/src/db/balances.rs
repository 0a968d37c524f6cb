//! Monthly opening balance operations
//!
//! The store accepts duplicate (owner, month, year) records; reads resolve
//! a period to the most recently created record.

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{MonthlyBalance, NewMonthlyBalance};

fn map_balance(row: &Row<'_>) -> rusqlite::Result<MonthlyBalance> {
    let created_at: String = row.get(4)?;
    Ok(MonthlyBalance {
        id: row.get(0)?,
        month: row.get(1)?,
        year: row.get(2)?,
        initial_balance: row.get(3)?,
        created_at: parse_datetime(&created_at),
    })
}

impl Database {
    /// List an owner's monthly balances, year then month descending
    pub fn list_monthly_balances(&self, user_id: i64) -> Result<Vec<MonthlyBalance>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, month, year, initial_balance, created_at
             FROM monthly_balances
             WHERE user_id = ?1
             ORDER BY year DESC, month DESC, id DESC",
        )?;
        let balances = stmt
            .query_map(params![user_id], map_balance)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(balances)
    }

    /// Resolve an owner's opening balance for one period.
    ///
    /// When duplicates exist for the period, the most recently created
    /// record wins.
    pub fn resolve_monthly_balance(
        &self,
        user_id: i64,
        month: u32,
        year: i32,
    ) -> Result<Option<MonthlyBalance>> {
        let conn = self.conn()?;
        let balance = conn
            .query_row(
                "SELECT id, month, year, initial_balance, created_at
                 FROM monthly_balances
                 WHERE user_id = ?1 AND month = ?2 AND year = ?3
                 ORDER BY created_at DESC, id DESC
                 LIMIT 1",
                params![user_id, month, year],
                map_balance,
            )
            .optional()?;
        Ok(balance)
    }

    /// Insert an opening balance for an owner
    pub fn insert_monthly_balance(
        &self,
        user_id: i64,
        balance: &NewMonthlyBalance,
    ) -> Result<MonthlyBalance> {
        if !(1..=12).contains(&balance.month) {
            return Err(Error::InvalidData(format!(
                "Month must be between 1 and 12, got {}",
                balance.month
            )));
        }
        if !balance.initial_balance.is_finite() {
            return Err(Error::InvalidData(
                "Initial balance must be a finite number".to_string(),
            ));
        }
        let initial_balance = (balance.initial_balance * 100.0).round() / 100.0;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO monthly_balances (user_id, month, year, initial_balance)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, balance.month, balance.year, initial_balance],
        )?;
        let id = conn.last_insert_rowid();

        conn.query_row(
            "SELECT id, month, year, initial_balance, created_at
             FROM monthly_balances
             WHERE id = ?1",
            params![id],
            map_balance,
        )
        .map_err(Into::into)
    }
}
