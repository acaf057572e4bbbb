use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::comment_service::{CommentPage, CommentView};
use crate::domain::comment::CreateCommentRequest;
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::middleware::auth::AuthenticatedUser;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct ListCommentsQuery {
    #[serde(rename = "postId")]
    #[validate(length(min = 1, max = 64))]
    pub(crate) post_id: String,
    #[validate(range(min = 1))]
    pub(crate) page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub(crate) limit: Option<u32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateCommentDto {
    #[validate(length(min = 1, max = 64))]
    pub(crate) post_id: String,
    #[validate(length(min = 1, max = 500))]
    pub(crate) text: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommentDto {
    pub(crate) id: i64,
    pub(crate) post_id: String,
    pub(crate) user_id: i64,
    pub(crate) username: String,
    pub(crate) text: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) is_own: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PaginationDto {
    pub(crate) page: u32,
    pub(crate) limit: u32,
    pub(crate) total: i64,
    pub(crate) total_pages: i64,
    pub(crate) has_more: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ListCommentsResponseDto {
    pub(crate) comments: Vec<CommentDto>,
    pub(crate) pagination: PaginationDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct DeleteCommentResponseDto {
    pub(crate) message: String,
}

impl From<CommentView> for CommentDto {
    fn from(view: CommentView) -> Self {
        Self {
            id: view.comment.id,
            post_id: view.comment.post_id,
            user_id: view.comment.user_id,
            username: view.comment.username,
            text: view.comment.text,
            created_at: view.comment.created_at,
            updated_at: view.comment.updated_at,
            is_own: view.is_own,
        }
    }
}

impl From<CommentPage> for ListCommentsResponseDto {
    fn from(page: CommentPage) -> Self {
        Self {
            comments: page.comments.into_iter().map(CommentDto::from).collect(),
            pagination: PaginationDto {
                page: page.page,
                limit: page.limit,
                total: page.total,
                total_pages: page.total_pages,
                has_more: page.has_more,
            },
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/comment",
    tag = "comments",
    security(
        ("cookie_auth" = [])
    ),
    params(
        ("postId" = String, Query, description = "Post id"),
        ("page" = Option<u32>, Query, description = "Page number (>= 1, default 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (1..=100, default 20)")
    ),
    responses(
        (status = 200, description = "Comments listed", body = ListCommentsResponseDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_comments(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(query): Query<ListCommentsQuery>,
) -> AppResult<(StatusCode, Json<ListCommentsResponseDto>)> {
    query.validate()?;

    let page = state
        .comment_service
        .list_comments(auth.user_id, &query.post_id, query.page, query.limit)
        .await?;

    Ok((StatusCode::OK, Json(ListCommentsResponseDto::from(page))))
}

#[utoipa::path(
    post,
    path = "/api/comment",
    tag = "comments",
    security(
        ("cookie_auth" = [])
    ),
    request_body = CreateCommentDto,
    responses(
        (status = 201, description = "Comment created", body = CommentDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post or user not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn create_comment(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(dto): Json<CreateCommentDto>,
) -> AppResult<(StatusCode, Json<CommentDto>)> {
    dto.validate()?;
    let req = CreateCommentRequest {
        post_id: dto.post_id,
        text: dto.text,
    };

    let comment = state
        .comment_service
        .create_comment(auth.user_id, req)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentDto::from(CommentView {
            comment,
            is_own: true,
        })),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/comment/{commentId}",
    tag = "comments",
    security(
        ("cookie_auth" = [])
    ),
    params(
        ("commentId" = i64, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "Comment deleted", body = DeleteCommentResponseDto),
        (status = 400, description = "Malformed comment id"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the comment owner"),
        (status = 404, description = "Comment not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(comment_id): Path<i64>,
) -> AppResult<(StatusCode, Json<DeleteCommentResponseDto>)> {
    state
        .comment_service
        .delete_comment(auth.user_id, comment_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(DeleteCommentResponseDto {
            message: "comment deleted".to_string(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{CommentDto, ListCommentsResponseDto};
    use crate::application::comment_service::{CommentPage, CommentView};
    use crate::domain::comment::Comment;

    #[test]
    fn comment_dto_serializes_with_camel_case_keys() {
        let now = Utc::now();
        let comment =
            Comment::new(1, "p1", 10, "alice", "hi", now, now).expect("comment must be valid");
        let dto = CommentDto::from(CommentView {
            comment,
            is_own: true,
        });

        let json = serde_json::to_value(&dto).expect("must serialize");
        assert!(json.get("postId").is_some());
        assert!(json.get("isOwn").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("post_id").is_none());
    }

    #[test]
    fn pagination_block_serializes_with_camel_case_keys() {
        let page = CommentPage {
            comments: vec![],
            page: 1,
            limit: 20,
            total: 25,
            total_pages: 2,
            has_more: true,
        };
        let dto = ListCommentsResponseDto::from(page);

        let json = serde_json::to_value(&dto).expect("must serialize");
        let pagination = json.get("pagination").expect("pagination must exist");
        assert_eq!(pagination.get("hasMore"), Some(&serde_json::json!(true)));
        assert_eq!(pagination.get("totalPages"), Some(&serde_json::json!(2)));
    }
}
