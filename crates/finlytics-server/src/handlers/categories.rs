//! Category handlers

use std::sync::Arc;

use axum::{extract::State, Extension, Json};

use crate::{AppError, AppState};
use finlytics_core::models::{Category, User};

/// GET /api/categories - List the owner's categories, ordered by name
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = state.db.list_categories(user.id)?;
    Ok(Json(categories))
}
