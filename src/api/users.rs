use axum::extract::State;
use std::sync::Arc;
use tracing::info;

use super::{AppError, AppState};

pub const SEED_USERNAME: &str = "rishabh";
pub const SEED_EMAIL: &str = "rishabh@example.com";

/// Registers the seed user once. Repeat calls report that it exists and
/// change nothing.
pub async fn add_user(State(state): State<Arc<AppState>>) -> Result<String, AppError> {
    if state
        .store()
        .find_user_by_username(SEED_USERNAME)
        .await?
        .is_some()
    {
        info!(username = SEED_USERNAME, "Seed user already present");
        return Ok("User already exists.".to_string());
    }

    let user = state.store().create_user(SEED_USERNAME, SEED_EMAIL).await?;
    Ok(format!("User {} added.", user.username))
}
