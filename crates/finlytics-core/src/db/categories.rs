//! Category operations
//!
//! Categories are read-only from the aggregation layer's perspective: a
//! default set is provisioned once per new owner and listed afterwards.

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{Category, TransactionKind};

/// Default set provisioned for every new owner
const DEFAULT_CATEGORIES: &[(&str, &str, TransactionKind)] = &[
    ("Alimentação", "🍽️", TransactionKind::Expense),
    ("Transporte", "🚗", TransactionKind::Expense),
    ("Moradia", "🏠", TransactionKind::Expense),
    ("Saúde", "💊", TransactionKind::Expense),
    ("Lazer", "🎮", TransactionKind::Expense),
    ("Educação", "📚", TransactionKind::Expense),
    ("Assinaturas", "📺", TransactionKind::Expense),
    ("Outros", "📦", TransactionKind::Expense),
    ("Salário", "💰", TransactionKind::Income),
    ("Freelance", "💼", TransactionKind::Income),
    ("Investimentos", "📈", TransactionKind::Income),
    ("Outras Receitas", "🪙", TransactionKind::Income),
];

fn map_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    let kind: String = row.get(3)?;
    let created_at: String = row.get(4)?;
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        icon: row.get(2)?,
        kind: kind.parse().unwrap_or(TransactionKind::Expense),
        created_at: parse_datetime(&created_at),
    })
}

impl Database {
    /// Provision the default category set for an owner.
    ///
    /// Idempotent: names the owner already has are left untouched.
    pub fn seed_default_categories(&self, user_id: i64) -> Result<()> {
        let conn = self.conn()?;
        for (name, icon, kind) in DEFAULT_CATEGORIES {
            conn.execute(
                "INSERT OR IGNORE INTO categories (user_id, name, icon, kind)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user_id, name, icon, kind.as_str()],
            )?;
        }
        Ok(())
    }

    /// List an owner's categories, ordered by name
    pub fn list_categories(&self, user_id: i64) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, icon, kind, created_at
             FROM categories
             WHERE user_id = ?1
             ORDER BY name",
        )?;
        let categories = stmt
            .query_map(params![user_id], map_category)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// Fetch one of an owner's categories by id
    pub fn get_category(&self, user_id: i64, category_id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                "SELECT id, name, icon, kind, created_at
                 FROM categories
                 WHERE user_id = ?1 AND id = ?2",
                params![user_id, category_id],
                map_category,
            )
            .optional()?;
        Ok(category)
    }
}
