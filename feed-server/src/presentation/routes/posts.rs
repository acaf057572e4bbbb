use axum::Router;
use axum::middleware;
use axum::routing::get;

use crate::presentation::AppState;
use crate::presentation::handlers::posts::list_posts;
use crate::presentation::middleware::auth::session_auth_middleware;

pub(crate) fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts))
        .layer(middleware::from_fn_with_state(
            state,
            session_auth_middleware,
        ))
}
