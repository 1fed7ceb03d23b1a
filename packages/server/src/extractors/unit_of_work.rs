use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::data::UnitOfWork;
use crate::state::AppState;

/// Each request gets its own unit of work over the shared pool, dropped
/// (and rolled back if still open) when the handler returns.
impl FromRequestParts<AppState> for UnitOfWork {
    type Rejection = Infallible;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(UnitOfWork::new(state.db.clone()))
    }
}
