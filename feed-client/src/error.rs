use thiserror::Error;

#[derive(Debug, Error)]
/// Ошибки клиентской библиотеки `feed-client`.
///
/// Любой исход сетевого вызова возвращается значением: транспортные сбои,
/// не-2xx статусы и ошибки декодирования становятся `Err`, наружу ничего
/// не "вылетает".
pub enum FeedClientError {
    /// Ошибка HTTP-транспорта (`reqwest`).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Требуется авторизация (отсутствует/просрочен токен).
    #[error("unauthorized")]
    Unauthorized,

    /// Операция запрещена владением: ресурс принадлежит другому пользователю.
    #[error("forbidden")]
    Forbidden,

    /// Запрошенный ресурс не найден.
    #[error("not found")]
    NotFound,

    /// Некорректный запрос или бизнес-ошибка валидации.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Результат операций `feed-client`.
pub type FeedClientResult<T> = Result<T, FeedClientError>;

impl FeedClientError {
    pub(crate) fn from_http_status(status: reqwest::StatusCode, message: Option<String>) -> Self {
        match status {
            reqwest::StatusCode::UNAUTHORIZED => Self::Unauthorized,
            reqwest::StatusCode::FORBIDDEN => Self::Forbidden,
            reqwest::StatusCode::NOT_FOUND => Self::NotFound,
            _ => {
                let message = message.unwrap_or_else(|| format!("http status {status}"));
                Self::InvalidRequest(message)
            }
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_http_status(status, None);
        }
        Self::Http(err)
    }

    /// Сообщение для показа пользователю.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(_) => "network error, try again".to_string(),
            Self::Unauthorized => "session expired, log in again".to_string(),
            Self::Forbidden => "you can only delete your own comments".to_string(),
            Self::NotFound => "not found".to_string(),
            Self::InvalidRequest(message) => message.clone(),
        }
    }
}
