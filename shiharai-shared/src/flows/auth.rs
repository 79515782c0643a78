//! Registration, login and token refresh
//!
//! Password hashing and verification are CPU-heavy and run on tokio's
//! blocking pool, as does token signing and validation. Unknown emails and
//! wrong passwords are reported identically as
//! [`DomainError::InvalidCredentials`].

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::auth::jwt::{Claims, TokenPair, TokenService};
use crate::auth::password::PasswordHasher;
use crate::error::{DomainError, DomainResult};
use crate::models::user::EMAIL_UNIQUE_CONSTRAINT;
use crate::models::CreateUser;
use crate::store::{StoreError, UserStore};

/// Input for registering a user
#[derive(Clone)]
pub struct RegisterInput {
    pub company_id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterInput")
            .field("company_id", &self.company_id)
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Input for logging in
#[derive(Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginInput")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Credential lifecycle over a user store
#[derive(Clone)]
pub struct AuthFlow {
    tokens: Arc<TokenService>,
    hasher: Arc<dyn PasswordHasher>,
    users: Arc<dyn UserStore>,
}

impl AuthFlow {
    pub fn new(
        tokens: Arc<TokenService>,
        hasher: Arc<dyn PasswordHasher>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self { tokens, hasher, users }
    }

    /// Token service backing this flow
    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// Registers a user and issues their first token pair
    ///
    /// # Errors
    ///
    /// - `EmailAlreadyExists` if the email is taken (checked up front and
    ///   again by the store's unique constraint)
    /// - `InvalidInput` if the company does not exist
    #[instrument(skip(self, input), fields(company_id = input.company_id))]
    pub async fn register(&self, input: RegisterInput) -> DomainResult<TokenPair> {
        if self.users.exists_by_email(&input.email).await? {
            debug!("Registration rejected: email already registered");
            return Err(DomainError::EmailAlreadyExists);
        }

        let hasher = self.hasher.clone();
        let password = input.password;
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

        let created = self
            .users
            .create(CreateUser {
                company_id: input.company_id,
                name: input.name,
                email: input.email,
                password_hash,
            })
            .await;

        let user = match created {
            Ok(user) => user,
            Err(err) if err.is_unique_violation_of(EMAIL_UNIQUE_CONSTRAINT) => {
                debug!("Registration lost a race on the email constraint");
                return Err(DomainError::EmailAlreadyExists);
            }
            Err(StoreError::ForeignKeyViolation(_)) => {
                return Err(DomainError::InvalidInput(format!(
                    "company {} does not exist",
                    input.company_id
                )));
            }
            Err(err) => return Err(err.into()),
        };

        info!(user_id = user.id, "User registered");
        self.issue_pair(user.id, user.company_id).await
    }

    /// Authenticates by email and password
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` for an unknown email, a wrong password, or a
    /// stored hash that cannot be verified
    #[instrument(skip(self, input))]
    pub async fn login(&self, input: LoginInput) -> DomainResult<TokenPair> {
        let Some(user) = self.users.find_by_email(&input.email).await? else {
            debug!("Login rejected: unknown email");
            return Err(DomainError::InvalidCredentials);
        };

        let hasher = self.hasher.clone();
        let password = input.password;
        let stored_hash = user.password_hash.clone();
        let verified =
            tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash)).await?;

        match verified {
            Ok(true) => {}
            Ok(false) => {
                debug!(user_id = user.id, "Login rejected: wrong password");
                return Err(DomainError::InvalidCredentials);
            }
            Err(e) => {
                warn!(user_id = user.id, error = %e, "Stored password hash could not be verified");
                return Err(DomainError::InvalidCredentials);
            }
        }

        info!(user_id = user.id, "User logged in");
        self.issue_pair(user.id, user.company_id).await
    }

    /// Exchanges a valid refresh token for a brand-new pair
    ///
    /// The new pair carries the user's current company, which may differ
    /// from the one in the presented token. The presented token stays valid
    /// until its own expiry.
    ///
    /// # Errors
    ///
    /// - `InvalidToken` / `ExpiredToken` from validation
    /// - `InvalidCredentials` if the subject user no longer exists
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_token(&self, refresh_token: &str) -> DomainResult<TokenPair> {
        let claims = self.validate(refresh_token).await?;

        let Some(user) = self.users.find_by_id(claims.user_id).await? else {
            debug!(user_id = claims.user_id, "Refresh rejected: user no longer exists");
            return Err(DomainError::InvalidCredentials);
        };

        info!(user_id = user.id, "Token pair refreshed");
        self.issue_pair(user.id, user.company_id).await
    }

    /// Validates a token on the blocking pool
    pub async fn validate(&self, token: &str) -> DomainResult<Claims> {
        let tokens = self.tokens.clone();
        let token = token.to_string();

        let claims = tokio::task::spawn_blocking(move || tokens.validate_token(&token)).await??;
        Ok(claims)
    }

    async fn issue_pair(&self, user_id: i64, company_id: i64) -> DomainResult<TokenPair> {
        let tokens = self.tokens.clone();

        let pair =
            tokio::task::spawn_blocking(move || tokens.issue_pair(user_id, company_id)).await??;
        Ok(pair)
    }
}

impl std::fmt::Debug for AuthFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthFlow").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::PasswordError;
    use crate::clock::FixedClock;
    use crate::models::{CreateCompany, User};
    use crate::store::{CompanyStore, InMemoryStore, StoreResult};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    const SECRET: &[u8] = b"test-secret-key-at-least-32-bytes-long";

    /// Reversible stand-in so tests skip Argon2's cost
    struct PlainHasher;

    impl PasswordHasher for PlainHasher {
        fn hash(&self, password: &str) -> Result<String, PasswordError> {
            Ok(format!("plain:{}", password))
        }

        fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
            match hash.strip_prefix("plain:") {
                Some(stored) => Ok(stored == password),
                None => Err(PasswordError::InvalidHash(hash.to_string())),
            }
        }
    }

    struct Fixture {
        flow: AuthFlow,
        store: Arc<InMemoryStore>,
        clock: Arc<FixedClock>,
        company_id: i64,
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 1, 23, 45).unwrap()
    }

    async fn fixture() -> Fixture {
        let clock = Arc::new(FixedClock::new(start()));
        let store = Arc::new(InMemoryStore::with_clock(clock.clone()));
        let company = CompanyStore::create(
            store.as_ref(),
            CreateCompany {
                name: "Acme".to_string(),
                representative_name: "Rep".to_string(),
                phone_number: "03-0000-0000".to_string(),
                zip_code: "100-0001".to_string(),
                address: "Tokyo".to_string(),
            },
        )
        .await
        .unwrap();

        let tokens = Arc::new(TokenService::new(SECRET, clock.clone()));
        let flow = AuthFlow::new(tokens, Arc::new(PlainHasher), store.clone());

        Fixture {
            flow,
            store,
            clock,
            company_id: company.id,
        }
    }

    fn register_input(company_id: i64, email: &str) -> RegisterInput {
        RegisterInput {
            company_id,
            name: "Taro".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_issues_pair_and_stores_hash() {
        let fx = fixture().await;

        let pair = fx
            .flow
            .register(register_input(fx.company_id, "taro@example.com"))
            .await
            .unwrap();

        assert_eq!(pair.access_expires_at, start() + Duration::minutes(15));
        assert_eq!(pair.refresh_expires_at, start() + Duration::days(7));

        let user = fx.store.find_by_email("taro@example.com").await.unwrap().unwrap();
        assert_eq!(user.password_hash, "plain:password123");

        let claims = fx.flow.tokens().validate_token(&pair.access_token).unwrap();
        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.company_id, fx.company_id);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let fx = fixture().await;
        fx.flow
            .register(register_input(fx.company_id, "taro@example.com"))
            .await
            .unwrap();

        let err = fx
            .flow
            .register(register_input(fx.company_id, "taro@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::EmailAlreadyExists));
    }

    #[tokio::test]
    async fn test_register_unknown_company() {
        let fx = fixture().await;
        let err = fx
            .flow
            .register(register_input(9999, "taro@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    /// Always reports emails as free, leaving the constraint to the store
    struct RacyUsers(Arc<InMemoryStore>);

    #[async_trait]
    impl UserStore for RacyUsers {
        async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
            UserStore::find_by_id(self.0.as_ref(), id).await
        }

        async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
            self.0.find_by_email(email).await
        }

        async fn exists_by_email(&self, _email: &str) -> StoreResult<bool> {
            Ok(false)
        }

        async fn create(&self, data: CreateUser) -> StoreResult<User> {
            UserStore::create(self.0.as_ref(), data).await
        }

        async fn update_password(&self, id: i64, password_hash: &str) -> StoreResult<Option<User>> {
            self.0.update_password(id, password_hash).await
        }
    }

    #[tokio::test]
    async fn test_register_constraint_violation_maps_to_email_exists() {
        let fx = fixture().await;
        let flow = AuthFlow::new(
            fx.flow.tokens().clone(),
            Arc::new(PlainHasher),
            Arc::new(RacyUsers(fx.store.clone())),
        );

        flow.register(register_input(fx.company_id, "taro@example.com"))
            .await
            .unwrap();
        let err = flow
            .register(register_input(fx.company_id, "taro@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::EmailAlreadyExists));
    }

    #[tokio::test]
    async fn test_login_success() {
        let fx = fixture().await;
        fx.flow
            .register(register_input(fx.company_id, "taro@example.com"))
            .await
            .unwrap();

        let pair = fx
            .flow
            .login(LoginInput {
                email: "taro@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap();

        let claims = fx.flow.tokens().validate_token(&pair.access_token).unwrap();
        assert_eq!(claims.company_id, fx.company_id);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let fx = fixture().await;
        fx.flow
            .register(register_input(fx.company_id, "taro@example.com"))
            .await
            .unwrap();

        let unknown = fx
            .flow
            .login(LoginInput {
                email: "nobody@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap_err();
        let wrong = fx
            .flow
            .login(LoginInput {
                email: "taro@example.com".to_string(),
                password: "wrong-password".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(unknown, DomainError::InvalidCredentials));
        assert!(matches!(wrong, DomainError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_login_with_unparseable_hash() {
        let fx = fixture().await;
        UserStore::create(
            fx.store.as_ref(),
            CreateUser {
                company_id: fx.company_id,
                name: "Broken".to_string(),
                email: "broken@example.com".to_string(),
                password_hash: "not-a-hash".to_string(),
            },
        )
        .await
        .unwrap();

        let err = fx
            .flow
            .login(LoginInput {
                email: "broken@example.com".to_string(),
                password: "anything".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_refresh_issues_new_pair() {
        let fx = fixture().await;
        let pair = fx
            .flow
            .register(register_input(fx.company_id, "taro@example.com"))
            .await
            .unwrap();

        fx.clock.advance(Duration::hours(1));
        let refreshed = fx.flow.refresh_token(&pair.refresh_token).await.unwrap();

        assert_eq!(refreshed.access_expires_at, start() + Duration::hours(1) + Duration::minutes(15));
        assert_eq!(refreshed.refresh_expires_at, start() + Duration::hours(1) + Duration::days(7));

        // Not rotated: the first refresh token still works
        assert!(fx.flow.refresh_token(&pair.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_expired_token() {
        let fx = fixture().await;
        let pair = fx
            .flow
            .register(register_input(fx.company_id, "taro@example.com"))
            .await
            .unwrap();

        fx.clock.advance(Duration::days(7));
        let err = fx.flow.refresh_token(&pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, DomainError::ExpiredToken));
    }

    #[tokio::test]
    async fn test_refresh_invalid_token() {
        let fx = fixture().await;
        let err = fx.flow.refresh_token("not.a.token").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidToken));
    }

    #[tokio::test]
    async fn test_refresh_for_missing_user() {
        let fx = fixture().await;
        let (token, _) = fx.flow.tokens().generate_refresh_token(4242, fx.company_id).unwrap();

        let err = fx.flow.refresh_token(&token).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_refresh_uses_current_company() {
        let fx = fixture().await;
        fx.flow
            .register(register_input(fx.company_id, "taro@example.com"))
            .await
            .unwrap();
        let user = fx.store.find_by_email("taro@example.com").await.unwrap().unwrap();

        let stale = Claims::new(user.id, 777, start(), Duration::days(7));
        let token = fx.flow.tokens().sign(&stale).unwrap();

        let pair = fx.flow.refresh_token(&token).await.unwrap();
        let claims = fx.flow.tokens().validate_token(&pair.access_token).unwrap();
        assert_eq!(claims.company_id, fx.company_id);
    }
}
