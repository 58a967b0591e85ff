/// API routes and handlers
pub mod author;
pub mod bonus;
pub mod regions;
pub mod stage;
pub mod status;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(stage::routes())
        .merge(author::routes())
        .merge(bonus::routes())
        .merge(status::routes())
        .merge(regions::routes())
}
