use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::presentation::handlers::auth::{
    AuthResponseDto, LoginDto, LogoutResponseDto, RegisterDto, UserDto,
};
use crate::presentation::handlers::comments::{
    CommentDto, CreateCommentDto, DeleteCommentResponseDto, ListCommentsQuery,
    ListCommentsResponseDto, PaginationDto,
};
use crate::presentation::handlers::posts::{ListPostsResponseDto, PostDto};
use crate::presentation::middleware::auth::SESSION_COOKIE;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::handlers::auth::register,
        crate::presentation::handlers::auth::login,
        crate::presentation::handlers::auth::logout,
        crate::presentation::handlers::posts::list_posts,
        crate::presentation::handlers::comments::list_comments,
        crate::presentation::handlers::comments::create_comment,
        crate::presentation::handlers::comments::delete_comment
    ),
    components(
        schemas(
            RegisterDto,
            LoginDto,
            AuthResponseDto,
            UserDto,
            LogoutResponseDto,
            PostDto,
            ListPostsResponseDto,
            ListCommentsQuery,
            CreateCommentDto,
            CommentDto,
            PaginationDto,
            ListCommentsResponseDto,
            DeleteCommentResponseDto
        )
    ),
    tags(
        (name = "auth", description = "Session endpoints"),
        (name = "posts", description = "Static feed catalog"),
        (name = "comments", description = "Comment endpoints")
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

pub(crate) struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.take().unwrap_or_default();
        components.add_security_scheme(
            "cookie_auth",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
        );
        openapi.components = Some(components);
    }
}
