use std::sync::Arc;

use crate::data::comment_repository::{CommentRepository, NewComment};
use crate::data::post_catalog::PostCatalog;
use crate::data::user_repository::UserRepository;
use crate::domain::comment::{Comment, CreateCommentRequest};
use crate::domain::error::DomainError;

pub(crate) const DEFAULT_PAGE_LIMIT: u32 = 20;
pub(crate) const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone)]
pub(crate) struct CommentView {
    pub(crate) comment: Comment,
    pub(crate) is_own: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct CommentPage {
    pub(crate) comments: Vec<CommentView>,
    pub(crate) page: u32,
    pub(crate) limit: u32,
    pub(crate) total: i64,
    pub(crate) total_pages: i64,
    pub(crate) has_more: bool,
}

pub(crate) struct CommentService<C: CommentRepository, U: UserRepository> {
    comments: C,
    users: U,
    catalog: Arc<PostCatalog>,
}

impl<C: CommentRepository, U: UserRepository> CommentService<C, U> {
    pub(crate) fn new(comments: C, users: U, catalog: Arc<PostCatalog>) -> Self {
        Self {
            comments,
            users,
            catalog,
        }
    }

    /// Страница комментариев поста для конкретного читателя.
    ///
    /// `total` считается отдельным запросом и не атомарен с выборкой окна:
    /// при конкурентных вставках счётчик может разойтись с окном на одну
    /// итерацию опроса. Это осознанное ограничение offset-пагинации.
    pub(crate) async fn list_comments(
        &self,
        caller_id: i64,
        post_id: &str,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<CommentPage, DomainError> {
        let post_id = post_id.trim();
        if post_id.is_empty() {
            return Err(DomainError::Validation {
                field: "post_id",
                message: "must not be empty",
            });
        }

        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(DomainError::Validation {
                field: "page",
                message: "must be >= 1",
            });
        }

        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if limit < 1 || limit > MAX_PAGE_LIMIT {
            return Err(DomainError::Validation {
                field: "limit",
                message: "must be 1..100",
            });
        }

        let offset = i64::from(page - 1) * i64::from(limit);
        let comments = self
            .comments
            .list_by_post(post_id, offset, i64::from(limit))
            .await?;
        let total = self.comments.count_by_post(post_id).await?;

        let comments = comments
            .into_iter()
            .map(|comment| {
                let is_own = comment.user_id == caller_id;
                CommentView { comment, is_own }
            })
            .collect();

        let total_pages = (total + i64::from(limit) - 1) / i64::from(limit);
        let has_more = i64::from(page) * i64::from(limit) < total;

        Ok(CommentPage {
            comments,
            page,
            limit,
            total,
            total_pages,
            has_more,
        })
    }

    pub(crate) async fn create_comment(
        &self,
        caller_id: i64,
        req: CreateCommentRequest,
    ) -> Result<Comment, DomainError> {
        let req = req.validate()?;

        if !self.catalog.contains(&req.post_id) {
            return Err(DomainError::NotFound(format!("post id: {}", req.post_id)));
        }

        // Аккаунт мог быть удалён между проверкой токена и вставкой;
        // заодно отсюда берётся актуальный username для денормализации.
        let user = self
            .users
            .find_by_id(caller_id)
            .await?
            .ok_or(DomainError::NotFound(format!("user id: {caller_id}")))?;

        self.comments
            .insert_comment(NewComment {
                post_id: req.post_id,
                user_id: user.id,
                username: user.username,
                text: req.text,
            })
            .await
    }

    pub(crate) async fn delete_comment(
        &self,
        caller_id: i64,
        comment_id: i64,
    ) -> Result<(), DomainError> {
        let comment = self
            .comments
            .get_comment(comment_id)
            .await?
            .ok_or(DomainError::NotFound(format!("comment id: {comment_id}")))?;

        if comment.user_id != caller_id {
            return Err(DomainError::Forbidden);
        }

        let deleted = self.comments.delete_comment(comment_id).await?;
        if !deleted {
            // конкурентное удаление успело раньше
            return Err(DomainError::NotFound(format!("comment id: {comment_id}")));
        }
        Ok(())
    }
}
