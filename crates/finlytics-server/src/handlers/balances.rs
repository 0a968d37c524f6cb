//! Monthly balance handlers

use std::sync::Arc;

use axum::{extract::State, Extension, Json};

use crate::{AppError, AppState};
use finlytics_core::models::{MonthlyBalance, NewMonthlyBalance, User};

/// GET /api/balances - List the owner's monthly balances, newest period first
pub async fn list_balances(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<MonthlyBalance>>, AppError> {
    let balances = state.db.list_monthly_balances(user.id)?;
    Ok(Json(balances))
}

/// POST /api/balances - Set an opening balance for a month
pub async fn create_balance(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<NewMonthlyBalance>,
) -> Result<Json<MonthlyBalance>, AppError> {
    let created = state.db.insert_monthly_balance(user.id, &req)?;
    Ok(Json(created))
}
