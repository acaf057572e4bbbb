use std::sync::Arc;

use anyhow::Result;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use application::auth_service::AuthService;
use application::comment_service::CommentService;
use data::post_catalog::PostCatalog;
use data::repositories::postgres::comment_repository::PostgresCommentRepository;
use data::repositories::postgres::user_repository::PostgresUserRepository;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::logging::init_logging;
use infrastructure::settings::Settings;
use infrastructure::token::TokenService;
use presentation::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level)?;

    let pool = create_pool(&settings.database_url).await?;
    run_migrations(&pool).await?;

    let catalog = Arc::new(PostCatalog::sample());

    let auth_service = Arc::new(AuthService::new(
        PostgresUserRepository::new(pool.clone()),
        TokenService::new(&settings.jwt_secret, settings.jwt_ttl_seconds),
    ));
    let comment_service = Arc::new(CommentService::new(
        PostgresCommentRepository::new(pool.clone()),
        PostgresUserRepository::new(pool),
        catalog.clone(),
    ));

    let state = AppState::new(
        auth_service,
        comment_service,
        catalog,
        settings.cookie_secure,
    );

    server::run_http(&settings, state).await
}
