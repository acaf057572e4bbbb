use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::presentation::AppState;
use crate::presentation::app_error::AppError;

pub(crate) const SESSION_COOKIE: &str = "feed_token";

#[derive(Debug, Clone)]
pub(crate) struct AuthenticatedUser {
    pub(crate) user_id: i64,
    pub(crate) username: String,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Гейт для защищённых операций: достаёт сессионный токен из httpOnly-куки
/// (запасной вариант — заголовок Authorization), проверяет его и заново
/// разрешает subject по каталогу пользователей. Отсутствие и невалидность
/// токена наружу неразличимы — обе дают 401.
pub(crate) async fn session_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_cookie(&request, SESSION_COOKIE)
        .or_else(|| extract_bearer(&request))
        .ok_or(AppError::Unauthorized)?;

    let session = state
        .auth_service
        .verify_session(&token)
        .await
        .map_err(|_| AppError::Unauthorized)?;

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: session.user_id,
        username: session.username,
    });

    Ok(next.run(request).await)
}

fn extract_cookie(request: &Request, name: &str) -> Option<String> {
    let raw = request
        .headers()
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())?;

    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        if key == name && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

fn extract_bearer(request: &Request) -> Option<String> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())?;

    let mut parts = auth_header.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    if token.trim().is_empty() {
        return None;
    }
    Some(token.trim().to_string())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::header;

    use super::{SESSION_COOKIE, extract_bearer, extract_cookie};

    fn request_with_header(name: header::HeaderName, value: &str) -> Request {
        Request::builder()
            .header(name, value)
            .body(Body::empty())
            .expect("request must build")
    }

    #[test]
    fn extract_cookie_finds_token_among_other_cookies() {
        let request = request_with_header(
            header::COOKIE,
            "theme=dark; feed_token=abc.def.ghi; lang=en",
        );
        assert_eq!(
            extract_cookie(&request, SESSION_COOKIE).as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn extract_cookie_ignores_empty_value() {
        let request = request_with_header(header::COOKIE, "feed_token=");
        assert!(extract_cookie(&request, SESSION_COOKIE).is_none());
    }

    #[test]
    fn extract_bearer_accepts_case_insensitive_scheme() {
        let request = request_with_header(header::AUTHORIZATION, "BEARER abc.def.ghi");
        assert_eq!(extract_bearer(&request).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn extract_bearer_rejects_extra_parts_and_wrong_scheme() {
        let extra = request_with_header(header::AUTHORIZATION, "Bearer a b");
        assert!(extract_bearer(&extra).is_none());

        let basic = request_with_header(header::AUTHORIZATION, "Basic abc");
        assert!(extract_bearer(&basic).is_none());
    }
}
