use reqwest::{Client, Method, header};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

use crate::error::{FeedClientError, FeedClientResult};
use crate::models::{AuthResponse, Comment, CommentList, Post};

const SESSION_COOKIE: &str = "feed_token";

#[derive(Debug, Serialize)]
struct RegisterRequestDto<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct LoginRequestDto<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateCommentRequestDto<'a> {
    #[serde(rename = "postId")]
    post_id: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct ListCommentsQuery<'a> {
    #[serde(rename = "postId")]
    post_id: &'a str,
    page: u32,
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorResponseDto {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListPostsResponseDto {
    posts: Vec<Post>,
}

#[derive(Debug, Clone)]
/// HTTP-клиент для REST API `feed-server`.
pub struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    /// Создаёт новый HTTP-клиент с базовым URL сервера.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()
            .expect("failed to build reqwest client");

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn decode_error(response: reqwest::Response) -> FeedClientError {
        let status = response.status();

        let message = match response.json::<ErrorResponseDto>().await {
            Ok(body) => body
                .message
                .unwrap_or_else(|| format!("http status {status}")),
            Err(_) => format!("http status {status}"),
        };
        FeedClientError::from_http_status(status, Some(message))
    }

    fn with_session(request: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
        // сервер ждёт сессионный токен в httpOnly-куке
        match token {
            Some(token) => request.header(header::COOKIE, format!("{SESSION_COOKIE}={token}")),
            None => request,
        }
    }

    /// универсальный helper для отправки запросов с json-payload
    async fn send_json<TReq, TRes>(
        &self,
        method: Method,
        path: &str,
        body: &TReq,
        token: Option<&str>,
    ) -> FeedClientResult<TRes>
    where
        TReq: Serialize,
        TRes: DeserializeOwned,
    {
        let url = self.endpoint(path);

        let request = Self::with_session(self.client.request(method, url), token).json(body);

        let response = request
            .send()
            .await
            .map_err(FeedClientError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }

        response
            .json::<TRes>()
            .await
            .map_err(FeedClientError::from_reqwest)
    }

    /// Регистрирует пользователя и возвращает токен + данные пользователя.
    pub async fn register(&self, username: &str, password: &str) -> FeedClientResult<AuthResponse> {
        let payload = RegisterRequestDto { username, password };
        self.send_json(Method::POST, "/api/auth/register", &payload, None)
            .await
    }

    /// Выполняет вход и возвращает токен + данные пользователя.
    pub async fn login(&self, username: &str, password: &str) -> FeedClientResult<AuthResponse> {
        let payload = LoginRequestDto { username, password };
        self.send_json(Method::POST, "/api/auth/login", &payload, None)
            .await
    }

    /// Завершает сессию на сервере.
    pub async fn logout(&self, token: &str) -> FeedClientResult<()> {
        let url = self.endpoint("/api/auth/logout");

        let request = Self::with_session(self.client.request(Method::POST, url), Some(token));

        let response = request
            .send()
            .await
            .map_err(FeedClientError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }

        Ok(())
    }

    /// Возвращает статический каталог постов ленты.
    pub async fn list_posts(&self, token: &str) -> FeedClientResult<Vec<Post>> {
        let url = self.endpoint("/api/posts");

        let request = Self::with_session(self.client.request(Method::GET, url), Some(token));

        let response = request
            .send()
            .await
            .map_err(FeedClientError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }

        let dto = response
            .json::<ListPostsResponseDto>()
            .await
            .map_err(FeedClientError::from_reqwest)?;
        Ok(dto.posts)
    }

    /// Возвращает страницу комментариев поста.
    pub async fn list_comments(
        &self,
        token: &str,
        post_id: &str,
        page: u32,
        limit: u32,
    ) -> FeedClientResult<CommentList> {
        let url = self.endpoint("/api/comment");

        let query = ListCommentsQuery {
            post_id,
            page,
            limit,
        };

        let request =
            Self::with_session(self.client.request(Method::GET, url), Some(token)).query(&query);

        let response = request
            .send()
            .await
            .map_err(FeedClientError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }

        response
            .json::<CommentList>()
            .await
            .map_err(FeedClientError::from_reqwest)
    }

    /// Создаёт комментарий к посту.
    pub async fn create_comment(
        &self,
        token: &str,
        post_id: &str,
        text: &str,
    ) -> FeedClientResult<Comment> {
        let payload = CreateCommentRequestDto { post_id, text };
        self.send_json(Method::POST, "/api/comment", &payload, Some(token))
            .await
    }

    /// Удаляет комментарий по идентификатору.
    pub async fn delete_comment(&self, token: &str, id: i64) -> FeedClientResult<()> {
        let url = self.endpoint(&format!("/api/comment/{id}"));

        let request = Self::with_session(self.client.request(Method::DELETE, url), Some(token));

        let response = request
            .send()
            .await
            .map_err(FeedClientError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }

        Ok(())
    }
}
