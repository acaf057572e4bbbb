//! Клиентская библиотека ленты комментариев feed-server.
//!
//! `FeedClient` ходит к серверу по HTTP (`reqwest`), хранит сессионный
//! токен после `register`/`login` и автоматически подставляет его в
//! защищённые операции. Поверх клиента модуль [`thread`] даёт
//! `CommentThread` — машину состояний треда комментариев с оптимистичной
//! отправкой и фоновым опросом.
#![warn(missing_docs)]

mod error;
mod http;
mod models;
pub mod thread;

pub use error::{FeedClientError, FeedClientResult};
pub use models::{AuthResponse, Comment, CommentList, Pagination, Post, User};
pub use thread::{
    CommentApi, CommentThread, DeleteOutcome, SubmitOutcome, ThreadEntry, ThreadPhase, Viewer,
};

use async_trait::async_trait;
use http::HttpClient;

#[derive(Debug, Clone)]
/// Клиент ленты комментариев поверх HTTP API сервера.
pub struct FeedClient {
    http_client: HttpClient,
    token: Option<String>,
}

impl FeedClient {
    /// Создаёт клиент с базовым URL сервера, например `http://127.0.0.1:8080`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: HttpClient::new(base_url),
            token: None,
        }
    }

    /// Устанавливает сессионный токен вручную.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Возвращает текущий сессионный токен, если он установлен.
    pub fn get_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Очищает сохранённый сессионный токен.
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Регистрирует пользователя и сохраняет полученный токен в клиенте.
    pub async fn register(
        &mut self,
        username: &str,
        password: &str,
    ) -> FeedClientResult<AuthResponse> {
        let result = self.http_client.register(username, password).await?;
        self.token = Some(result.access_token.clone());
        Ok(result)
    }

    /// Выполняет вход и сохраняет полученный токен в клиенте.
    pub async fn login(&mut self, username: &str, password: &str) -> FeedClientResult<AuthResponse> {
        let result = self.http_client.login(username, password).await?;
        self.token = Some(result.access_token.clone());
        Ok(result)
    }

    /// Завершает сессию на сервере и очищает токен в клиенте.
    ///
    /// Токен очищается даже если сервер ответил ошибкой.
    pub async fn logout(&mut self) -> FeedClientResult<()> {
        let token = self.require_token()?.to_string();
        let result = self.http_client.logout(&token).await;
        self.token = None;
        result
    }

    /// Возвращает список постов ленты.
    ///
    /// Требует установленный сессионный токен.
    pub async fn list_posts(&self) -> FeedClientResult<Vec<Post>> {
        let token = self.require_token()?;
        self.http_client.list_posts(token).await
    }

    /// Возвращает страницу комментариев поста, новые первыми.
    ///
    /// Требует установленный сессионный токен.
    pub async fn list_comments(
        &self,
        post_id: &str,
        page: u32,
        limit: u32,
    ) -> FeedClientResult<CommentList> {
        let token = self.require_token()?;
        self.http_client
            .list_comments(token, post_id, page, limit)
            .await
    }

    /// Создаёт комментарий к посту.
    ///
    /// Требует установленный сессионный токен.
    pub async fn create_comment(&self, post_id: &str, text: &str) -> FeedClientResult<Comment> {
        let token = self.require_token()?;
        self.http_client.create_comment(token, post_id, text).await
    }

    /// Удаляет свой комментарий по идентификатору.
    ///
    /// Требует установленный сессионный токен.
    pub async fn delete_comment(&self, id: i64) -> FeedClientResult<()> {
        let token = self.require_token()?;
        self.http_client.delete_comment(token, id).await
    }

    fn require_token(&self) -> FeedClientResult<&str> {
        self.token.as_deref().ok_or(FeedClientError::Unauthorized)
    }
}

#[async_trait]
impl CommentApi for FeedClient {
    async fn fetch_page(
        &self,
        post_id: &str,
        page: u32,
        limit: u32,
    ) -> FeedClientResult<CommentList> {
        self.list_comments(post_id, page, limit).await
    }

    async fn create(&self, post_id: &str, text: &str) -> FeedClientResult<Comment> {
        self.create_comment(post_id, text).await
    }

    async fn delete(&self, comment_id: i64) -> FeedClientResult<()> {
        self.delete_comment(comment_id).await
    }
}
