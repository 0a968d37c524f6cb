//! Transaction handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{AppError, AppState};
use finlytics_core::models::{NewTransaction, Transaction, TransactionKind, User};

/// Query parameters for the transaction list. All filters are display
/// concerns applied on top of the owner's full list.
#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    /// Case-insensitive match against title and description
    pub search: Option<String>,
    /// income or expense
    pub kind: Option<String>,
    /// Filter to one category
    pub category_id: Option<i64>,
}

/// GET /api/transactions - List the owner's transactions, newest first
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(params): Query<TransactionQuery>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let kind: Option<TransactionKind> = params
        .kind
        .as_deref()
        .map(str::parse)
        .transpose()
        .map_err(|e: String| AppError::bad_request(&e))?;

    let mut transactions = state.db.list_transactions(user.id)?;

    if let Some(search) = params.search.as_deref().map(str::to_lowercase) {
        if !search.trim().is_empty() {
            transactions.retain(|t| {
                t.title.to_lowercase().contains(&search)
                    || t.description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&search))
            });
        }
    }
    if let Some(kind) = kind {
        transactions.retain(|t| t.kind == kind);
    }
    if let Some(category_id) = params.category_id {
        transactions.retain(|t| t.category_id == Some(category_id));
    }

    Ok(Json(transactions))
}

/// POST /api/transactions - Record a transaction
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<NewTransaction>,
) -> Result<Json<Transaction>, AppError> {
    let created = state.db.insert_transaction(user.id, &req)?;
    Ok(Json(created))
}
