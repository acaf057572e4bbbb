use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Публичная модель пользователя.
pub struct User {
    /// Идентификатор пользователя.
    pub id: i64,
    /// Логин.
    pub username: String,
    /// Дата и время создания пользователя (UTC).
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Публичная модель комментария.
pub struct Comment {
    /// Идентификатор комментария.
    pub id: i64,
    /// Идентификатор поста.
    pub post_id: String,
    /// Идентификатор автора.
    pub user_id: i64,
    /// Username автора на момент создания комментария.
    pub username: String,
    /// Текст комментария.
    pub text: String,
    /// Дата и время создания (UTC).
    pub created_at: DateTime<Utc>,
    /// Дата и время обновления (UTC).
    pub updated_at: DateTime<Utc>,
    /// Принадлежит ли комментарий текущему пользователю.
    #[serde(default)]
    pub is_own: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Блок пагинации из ответа сервера.
pub struct Pagination {
    /// Номер страницы (с 1).
    pub page: u32,
    /// Размер страницы.
    pub limit: u32,
    /// Общее количество комментариев поста.
    pub total: i64,
    /// Количество страниц.
    pub total_pages: i64,
    /// Есть ли ещё страницы после текущей.
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Страница комментариев с пагинацией.
pub struct CommentList {
    /// Комментарии текущей страницы, новые первыми.
    pub comments: Vec<Comment>,
    /// Блок пагинации.
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Ответ после успешной регистрации или входа.
pub struct AuthResponse {
    /// Сессионный токен.
    pub access_token: String,
    /// Данные пользователя.
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Пост из статического каталога ленты.
pub struct Post {
    /// Идентификатор поста.
    pub id: String,
    /// Автор.
    pub author: String,
    /// Заголовок.
    pub title: String,
    /// Текст поста.
    pub body: String,
}
