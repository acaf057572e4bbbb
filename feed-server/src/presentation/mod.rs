use std::sync::Arc;

use crate::application::auth_service::AuthService;
use crate::application::comment_service::CommentService;
use crate::data::post_catalog::PostCatalog;
use crate::data::repositories::postgres::comment_repository::PostgresCommentRepository;
use crate::data::repositories::postgres::user_repository::PostgresUserRepository;

pub(crate) mod app_error;
pub(crate) mod handlers;
pub(crate) mod http_handlers;
pub(crate) mod middleware;
pub(crate) mod openapi;
pub(crate) mod routes;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) auth_service: Arc<AuthService<PostgresUserRepository>>,
    pub(crate) comment_service:
        Arc<CommentService<PostgresCommentRepository, PostgresUserRepository>>,
    pub(crate) catalog: Arc<PostCatalog>,
    pub(crate) cookie_secure: bool,
}

impl AppState {
    pub(crate) fn new(
        auth_service: Arc<AuthService<PostgresUserRepository>>,
        comment_service: Arc<
            CommentService<PostgresCommentRepository, PostgresUserRepository>,
        >,
        catalog: Arc<PostCatalog>,
        cookie_secure: bool,
    ) -> Self {
        Self {
            auth_service,
            comment_service,
            catalog,
            cookie_secure,
        }
    }
}
