use axum::Router;
use axum::middleware;
use axum::routing::{delete, get};

use crate::presentation::AppState;
use crate::presentation::handlers::comments::{create_comment, delete_comment, list_comments};
use crate::presentation::middleware::auth::session_auth_middleware;

/// Все операции с комментариями проходят через сессионный гейт,
/// включая чтение.
pub(crate) fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_comments).post(create_comment))
        .route("/{commentId}", delete(delete_comment))
        .layer(middleware::from_fn_with_state(
            state,
            session_auth_middleware,
        ))
}
