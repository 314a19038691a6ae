//! Tag listing.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::Result;
use crate::router::AppState;
use crate::store::models::Tag;
use crate::store::queries;

/// `GET /api/tools/tags`
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Tag>>> {
    let tags = queries::list_tags(&state.db).await?;
    Ok(Json(tags))
}
