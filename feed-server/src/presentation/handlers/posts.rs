use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use utoipa::ToSchema;

use crate::data::post_catalog::PostEntry;
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::middleware::auth::AuthenticatedUser;

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostDto {
    pub(crate) id: String,
    pub(crate) author: String,
    pub(crate) title: String,
    pub(crate) body: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ListPostsResponseDto {
    pub(crate) posts: Vec<PostDto>,
}

impl From<&PostEntry> for PostDto {
    fn from(entry: &PostEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            author: entry.author.to_string(),
            title: entry.title.to_string(),
            body: entry.body.to_string(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    security(
        ("cookie_auth" = [])
    ),
    responses(
        (status = 200, description = "Feed posts", body = ListPostsResponseDto),
        (status = 401, description = "Unauthorized")
    )
)]
pub(crate) async fn list_posts(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
) -> AppResult<(StatusCode, Json<ListPostsResponseDto>)> {
    let posts = state.catalog.all().iter().map(PostDto::from).collect();

    Ok((StatusCode::OK, Json(ListPostsResponseDto { posts })))
}
