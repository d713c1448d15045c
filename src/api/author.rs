use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;
use std::sync::Arc;

use super::AppState;

/// The user a submitted post is attributed to.
///
/// There is no login, so this resolves to the configured
/// `posting.author_id` for every request. Handlers only see this type, so an
/// authenticated session can replace the lookup without touching them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    id: String,
}

impl Author {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl FromRequestParts<Arc<AppState>> for Author {
    type Rejection = Infallible;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self {
            id: state.config().posting.author_id.clone(),
        })
    }
}
