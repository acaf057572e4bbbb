use async_trait::async_trait;

use crate::domain::comment::Comment;
use crate::domain::error::DomainError;

#[derive(Debug, Clone)]
pub(crate) struct NewComment {
    pub(crate) post_id: String,
    pub(crate) user_id: i64,
    pub(crate) username: String,
    pub(crate) text: String,
}

#[async_trait]
pub(crate) trait CommentRepository: Send + Sync {
    async fn insert_comment(&self, input: NewComment) -> Result<Comment, DomainError>;
    async fn get_comment(&self, id: i64) -> Result<Option<Comment>, DomainError>;
    /// Страница комментариев поста, новые первыми (`created_at DESC, id DESC`).
    async fn list_by_post(
        &self,
        post_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Comment>, DomainError>;
    /// Отдельный count-запрос по тому же фильтру, что и `list_by_post`.
    async fn count_by_post(&self, post_id: &str) -> Result<i64, DomainError>;
    /// Удаление по id идемпотентно: отсутствие строки — не ошибка,
    /// проверки существования и владения живут уровнем выше.
    async fn delete_comment(&self, id: i64) -> Result<bool, DomainError>;
}
