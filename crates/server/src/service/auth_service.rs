use crate::repository::user_repository::{NewUser, UserRecord, UserRepository};
use crate::service::error::{ServiceError, ServiceResult};
use anyhow::anyhow;
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::{Duration, Utc};
use coursehub_core::domain::{Role, UserId, required_text};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// The caller behind a verified access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Clone)]
pub struct TokenIssuer {
    secret: Vec<u8>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], access_ttl_minutes: i64, refresh_ttl_days: i64) -> Self {
        Self {
            secret: secret.to_vec(),
            access_ttl: Duration::minutes(access_ttl_minutes),
            refresh_ttl: Duration::days(refresh_ttl_days),
        }
    }

    fn sign(&self, user_id: UserId, role: Role, kind: TokenKind, ttl: Duration) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.as_str().to_string(),
            kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(&self.secret);
        Ok(encode(&header, &claims, &key)?)
    }

    pub fn issue(&self, user_id: UserId, role: Role) -> anyhow::Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.sign(user_id, role, TokenKind::Access, self.access_ttl)?,
            refresh_token: self.sign(user_id, role, TokenKind::Refresh, self.refresh_ttl)?,
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    pub fn verify(&self, token: &str, expected: TokenKind) -> ServiceResult<Claims> {
        let key = DecodingKey::from_secret(&self.secret);
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &key, &validation).map_err(|err| {
            ServiceError::Unauthorized(format!("invalid or expired token: {err}"))
        })?;

        if data.claims.kind != expected {
            return Err(ServiceError::Unauthorized("wrong token type".to_string()));
        }
        Ok(data.claims)
    }
}

/// Argon2 PHC string with a fresh random salt, computed on the blocking pool.
pub async fn hash_password(password: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow!("failed to hash password: {e}"))
    })
    .await?
}

/// A malformed stored hash never verifies.
pub async fn verify_password(password: String, password_hash: String) -> anyhow::Result<bool> {
    let verified = tokio::task::spawn_blocking(move || match PasswordHash::new(&password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("unreadable password hash: {e}");
            false
        }
    })
    .await?;
    Ok(verified)
}

fn validate_email(email: String) -> ServiceResult<String> {
    let email = required_text("email", email, 254)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(ServiceError::Validation(format!("invalid email: {email}"))),
    }
}

fn validate_username(username: String) -> ServiceResult<String> {
    let username = required_text("username", username, 32)?;
    if username.chars().count() < 3 {
        return Err(ServiceError::Validation(
            "username must be at least 3 characters".to_string(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(ServiceError::Validation(
            "username may only contain letters, digits, '.', '_' and '-'".to_string(),
        ));
    }
    Ok(username)
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenIssuer) -> Self {
        Self { users, tokens }
    }

    #[tracing::instrument(skip_all, fields(username = %registration.username))]
    pub async fn register(&self, registration: Registration) -> ServiceResult<UserRecord> {
        let role = match registration.role.as_deref() {
            None => Role::default(),
            Some(raw) => Role::from_str(raw)?,
        };
        if !role.is_self_assignable() {
            return Err(ServiceError::Forbidden(format!(
                "role '{role}' cannot be chosen at registration"
            )));
        }

        self.create_user(
            registration.username,
            registration.email,
            registration.password,
            role,
        )
        .await
    }

    /// Creates the configured admin account unless the username is taken.
    #[tracing::instrument(skip(self, email, password))]
    pub async fn ensure_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> ServiceResult<()> {
        if self.users.find_by_username(username).await?.is_some() {
            return Ok(());
        }
        self.create_user(
            username.to_string(),
            email.to_string(),
            password.to_string(),
            Role::Admin,
        )
        .await?;
        info!("admin account created");
        Ok(())
    }

    async fn create_user(
        &self,
        username: String,
        email: String,
        password: String,
        role: Role,
    ) -> ServiceResult<UserRecord> {
        let username = validate_username(username)?;
        let email = validate_email(email)?.to_lowercase();
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ServiceError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        if self.users.find_by_username(&username).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "username '{username}' is already taken"
            )));
        }
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "email '{email}' is already registered"
            )));
        }

        let password_hash = hash_password(password).await?;
        let user = self
            .users
            .create(NewUser {
                username,
                email,
                role,
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    /// Accepts either the username or the email as `identifier`.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, identifier: &str, password: &str) -> ServiceResult<TokenPair> {
        let identifier = identifier.trim();
        let user = match self.users.find_by_username(identifier).await? {
            Some(user) => Some(user),
            None => self.users.find_by_email(&identifier.to_lowercase()).await?,
        };

        let verified = match &user {
            Some(user) => {
                verify_password(password.to_string(), user.password_hash.clone()).await?
            }
            None => false,
        };
        let Some(user) = user.filter(|_| verified) else {
            warn!("login rejected");
            return Err(ServiceError::Unauthorized(
                "invalid username or password".to_string(),
            ));
        };

        info!(user_id = %user.id, "user logged in");
        Ok(self.tokens.issue(user.id, user.role)?)
    }

    #[tracing::instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> ServiceResult<TokenPair> {
        let claims = self.tokens.verify(refresh_token, TokenKind::Refresh)?;
        let user_id = UserId::from_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("invalid token subject".to_string()))?;

        // role may have changed since the refresh token was issued
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("user no longer exists".to_string()))?;

        Ok(self.tokens.issue(user.id, user.role)?)
    }

    pub fn authenticate(&self, access_token: &str) -> ServiceResult<AuthenticatedUser> {
        let claims = self.tokens.verify(access_token, TokenKind::Access)?;
        let id = UserId::from_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("invalid token subject".to_string()))?;
        let role = Role::from_str(&claims.role)
            .map_err(|e| ServiceError::Internal(anyhow!("token carries {e}")))?;

        Ok(AuthenticatedUser { id, role })
    }

    pub async fn find_user(&self, user_id: UserId) -> ServiceResult<UserRecord> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("user"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_password_hash_is_salted_phc_string() {
        let a = hash_password("password1".to_string()).await.expect("hash");
        let b = hash_password("password1".to_string()).await.expect("hash");

        assert!(a.starts_with("$argon2id$"));
        assert_ne!(a, b);
        assert!(a.len() <= 255);
    }

    #[tokio::test]
    async fn test_verify_password() {
        let hash = hash_password("password1".to_string()).await.expect("hash");

        let right = verify_password("password1".to_string(), hash.clone()).await;
        let wrong = verify_password("password2".to_string(), hash).await;
        let garbage =
            verify_password("password1".to_string(), "not-a-phc-string".to_string()).await;

        assert!(right.expect("verify"));
        assert!(!wrong.expect("verify"));
        assert!(!garbage.expect("verify"));
    }

    #[test]
    fn test_issue_and_verify_tokens() {
        let issuer = TokenIssuer::new(b"secret", 15, 7);
        let user_id = UserId::new();
        let pair = issuer.issue(user_id, Role::Educator).expect("tokens");

        let claims = issuer
            .verify(&pair.access_token, TokenKind::Access)
            .expect("valid access token");
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, "educator");
        assert_eq!(pair.expires_in, 15 * 60);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let issuer = TokenIssuer::new(b"secret", 15, 7);
        let pair = issuer.issue(UserId::new(), Role::Student).expect("tokens");

        assert!(matches!(
            issuer.verify(&pair.refresh_token, TokenKind::Access),
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issuer = TokenIssuer::new(b"secret", 15, 7);
        let other = TokenIssuer::new(b"another", 15, 7);
        let pair = other.issue(UserId::new(), Role::Student).expect("tokens");

        assert!(issuer.verify(&pair.access_token, TokenKind::Access).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issuer = TokenIssuer::new(b"secret", -10, 7);
        let pair = issuer.issue(UserId::new(), Role::Student).expect("tokens");

        assert!(issuer.verify(&pair.access_token, TokenKind::Access).is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email("a@b.io".to_string()).is_ok());
        assert!(validate_email("nobody".to_string()).is_err());
        assert!(validate_email("@b.io".to_string()).is_err());
    }

    #[test]
    fn test_username_validation() {
        assert!(validate_username("jo".to_string()).is_err());
        assert!(validate_username("john doe".to_string()).is_err());
        assert_eq!(
            validate_username("  john_doe ".to_string()).expect("valid"),
            "john_doe"
        );
    }
}
