use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::OsRng,
    },
};

use crate::data::user_repository::{NewUser, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::user::{LoginRequest, RegisterRequest, User};
use crate::infrastructure::token::TokenService;

#[derive(Debug, Clone)]
pub(crate) struct AuthResult {
    pub(crate) user: User,
    pub(crate) access_token: String,
}

/// Идентичность, восстановленная из валидного сессионного токена.
#[derive(Debug, Clone)]
pub(crate) struct SessionUser {
    pub(crate) user_id: i64,
    pub(crate) username: String,
}

pub(crate) struct AuthService<R: UserRepository> {
    repo: R,
    tokens: TokenService,
}

impl<R: UserRepository> AuthService<R> {
    const DUMMY_PASSWORD_HASH: &'static str = "$argon2id$v=19$m=19456,t=2,p=1$MDEyMzQ1Njc4OWFiY2RlZg$gwN6hT1sNdk9kI95f7n2Gl3fL0qRmBf2Ffkj2r90/0M";

    pub(crate) fn new(repo: R, tokens: TokenService) -> Self {
        Self { repo, tokens }
    }

    pub(crate) async fn register(&self, req: RegisterRequest) -> Result<AuthResult, DomainError> {
        let req = req.validate()?;

        let password_hash = self.hash_password(&req.password)?;
        let user = self
            .repo
            .create_user(NewUser {
                username: req.username,
                password_hash,
            })
            .await?;

        let access_token = self
            .tokens
            .issue(user.id, &user.username)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;

        Ok(AuthResult { user, access_token })
    }

    pub(crate) async fn login(&self, req: LoginRequest) -> Result<AuthResult, DomainError> {
        let req = req.validate()?;

        let user_creds = match self.repo.find_by_username(&req.username).await? {
            Some(user_creds) => user_creds,
            None => {
                // стремимся к одинаковому времени ответа если user не найден
                match self.verify_password(&req.password, Self::DUMMY_PASSWORD_HASH) {
                    Ok(()) | Err(DomainError::InvalidCredentials) => {}
                    Err(err) => return Err(err),
                }
                return Err(DomainError::InvalidCredentials);
            }
        };

        self.verify_password(&req.password, &user_creds.password_hash)?;

        let access_token = self
            .tokens
            .issue(user_creds.user.id, &user_creds.user.username)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;

        Ok(AuthResult {
            user: user_creds.user,
            access_token,
        })
    }

    /// Проверяет предъявленный токен и заново разрешает subject по каталогу
    /// пользователей: структурно валидный токен удалённого аккаунта
    /// равнозначен невалидному. Любой отказ схлопывается в
    /// `InvalidCredentials`, чтобы наружу не утекала причина.
    pub(crate) async fn verify_session(&self, raw_token: &str) -> Result<SessionUser, DomainError> {
        let claims = self
            .tokens
            .verify(raw_token)
            .map_err(|_| DomainError::InvalidCredentials)?;

        let user = self
            .repo
            .find_by_id(claims.user_id)
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        Ok(SessionUser {
            user_id: user.id,
            username: user.username,
        })
    }

    pub(crate) fn session_ttl_seconds(&self) -> i64 {
        self.tokens.ttl_seconds
    }

    pub(crate) fn hash_password(&self, raw_password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Self::argon2()?
            .hash_password(raw_password.as_bytes(), &salt)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;
        Ok(password_hash.to_string())
    }

    pub(crate) fn verify_password(
        &self,
        raw_password: &str,
        password_hash: &str,
    ) -> Result<(), DomainError> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;
        Self::argon2()?
            .verify_password(raw_password.as_bytes(), &parsed_hash)
            .map_err(|err| match err {
                PasswordHashError::Password => DomainError::InvalidCredentials,
                _ => DomainError::Unexpected(err.to_string()),
            })?;

        Ok(())
    }

    fn argon2() -> Result<Argon2<'static>, DomainError> {
        let params = Params::new(19 * 1024, 2, 1, None)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;

    use super::AuthService;
    use crate::data::user_repository::{NewUser, UserCredentials, UserRepository};
    use crate::domain::error::DomainError;
    use crate::domain::user::{LoginRequest, RegisterRequest, User};
    use crate::infrastructure::token::TokenService;

    #[derive(Clone)]
    struct FakeUserRepo {
        created_input: Arc<Mutex<Option<NewUser>>>,
        login_credentials: Arc<Mutex<Option<UserCredentials>>>,
        user_by_id: Arc<Mutex<Option<User>>>,
        create_user_out: User,
    }

    impl FakeUserRepo {
        fn new(create_user_out: User) -> Self {
            Self {
                created_input: Arc::new(Mutex::new(None)),
                login_credentials: Arc::new(Mutex::new(None)),
                user_by_id: Arc::new(Mutex::new(None)),
                create_user_out,
            }
        }

        fn set_login_credentials(&self, creds: Option<UserCredentials>) {
            *self
                .login_credentials
                .lock()
                .expect("login credentials mutex poisoned") = creds;
        }

        fn set_user_by_id(&self, user: Option<User>) {
            *self.user_by_id.lock().expect("user_by_id mutex poisoned") = user;
        }
    }

    #[async_trait]
    impl UserRepository for FakeUserRepo {
        async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
            *self
                .created_input
                .lock()
                .expect("created input mutex poisoned") = Some(input);
            Ok(self.create_user_out.clone())
        }

        async fn find_by_username(
            &self,
            _username: &str,
        ) -> Result<Option<UserCredentials>, DomainError> {
            Ok(self
                .login_credentials
                .lock()
                .expect("login credentials mutex poisoned")
                .clone())
        }

        async fn find_by_id(&self, _id: i64) -> Result<Option<User>, DomainError> {
            Ok(self
                .user_by_id
                .lock()
                .expect("user_by_id mutex poisoned")
                .clone())
        }
    }

    #[tokio::test]
    async fn register_creates_user_and_returns_token() {
        let repo = FakeUserRepo::new(sample_user(1, "valid_user"));
        let service = AuthService::new(repo.clone(), test_tokens());

        let req = RegisterRequest {
            username: "  valid_user  ".to_string(),
            password: "very-secure-password".to_string(),
        };

        let result = service.register(req).await.expect("register must succeed");

        assert_eq!(result.user.username, "valid_user");
        assert!(!result.access_token.is_empty());

        let created = repo
            .created_input
            .lock()
            .expect("created input mutex poisoned")
            .clone()
            .expect("create_user must be called");
        assert_eq!(created.username, "valid_user");
        assert!(!created.password_hash.is_empty());
    }

    #[tokio::test]
    async fn login_returns_invalid_credentials_for_missing_user() {
        let repo = FakeUserRepo::new(sample_user(1, "valid_user"));
        repo.set_login_credentials(None);
        let service = AuthService::new(repo, test_tokens());

        let req = LoginRequest {
            username: "valid_user".to_string(),
            password: "some-password".to_string(),
        };

        let err = service.login(req).await.expect_err("login must fail");
        assert!(matches!(err, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_returns_invalid_credentials_for_wrong_password() {
        let repo = FakeUserRepo::new(sample_user(1, "valid_user"));
        let service = AuthService::new(repo.clone(), test_tokens());

        let hash = service
            .hash_password("correct-password")
            .expect("hash must be created");
        repo.set_login_credentials(Some(UserCredentials {
            user: sample_user(1, "valid_user"),
            password_hash: hash,
        }));

        let req = LoginRequest {
            username: "valid_user".to_string(),
            password: "wrong-password".to_string(),
        };

        let err = service.login(req).await.expect_err("login must fail");
        assert!(matches!(err, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_returns_token_for_valid_credentials() {
        let repo = FakeUserRepo::new(sample_user(1, "valid_user"));
        let service = AuthService::new(repo.clone(), test_tokens());

        let hash = service
            .hash_password("correct-password")
            .expect("hash must be created");
        repo.set_login_credentials(Some(UserCredentials {
            user: sample_user(1, "valid_user"),
            password_hash: hash,
        }));

        let req = LoginRequest {
            username: "valid_user".to_string(),
            password: "correct-password".to_string(),
        };

        let result = service.login(req).await.expect("login must succeed");
        assert_eq!(result.user.id, 1);
        assert!(!result.access_token.is_empty());
    }

    #[tokio::test]
    async fn verify_session_resolves_existing_user() {
        let repo = FakeUserRepo::new(sample_user(1, "valid_user"));
        repo.set_user_by_id(Some(sample_user(7, "alice")));
        let service = AuthService::new(repo, test_tokens());

        let token = test_tokens().issue(7, "alice").expect("token must issue");
        let session = service
            .verify_session(&token)
            .await
            .expect("session must verify");

        assert_eq!(session.user_id, 7);
        assert_eq!(session.username, "alice");
    }

    #[tokio::test]
    async fn verify_session_rejects_deleted_subject() {
        let repo = FakeUserRepo::new(sample_user(1, "valid_user"));
        repo.set_user_by_id(None);
        let service = AuthService::new(repo, test_tokens());

        let token = test_tokens().issue(7, "alice").expect("token must issue");
        let err = service
            .verify_session(&token)
            .await
            .expect_err("deleted subject must be rejected");
        assert!(matches!(err, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn verify_session_rejects_malformed_token() {
        let repo = FakeUserRepo::new(sample_user(1, "valid_user"));
        repo.set_user_by_id(Some(sample_user(7, "alice")));
        let service = AuthService::new(repo, test_tokens());

        let err = service
            .verify_session("garbage")
            .await
            .expect_err("malformed token must be rejected");
        assert!(matches!(err, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn verify_session_returns_current_username_not_token_claim() {
        // токен несёт старое имя, каталог — новое; побеждает каталог
        let repo = FakeUserRepo::new(sample_user(1, "valid_user"));
        repo.set_user_by_id(Some(sample_user(7, "alice_renamed")));
        let service = AuthService::new(repo, test_tokens());

        let token = test_tokens().issue(7, "alice").expect("token must issue");
        let session = service
            .verify_session(&token)
            .await
            .expect("session must verify");
        assert_eq!(session.username, "alice_renamed");
    }

    fn sample_user(id: i64, username: &str) -> User {
        User::new(id, username.to_string(), Utc::now()).expect("sample user must be valid")
    }

    fn test_tokens() -> TokenService {
        TokenService::new("0123456789abcdef0123456789abcdef", 3600)
    }
}
