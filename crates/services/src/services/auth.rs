//! Login sessions: argon2 password hashes, HS256 access tokens and opaque
//! refresh tokens whose SHA-256 is persisted per session.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use db::{
    DBService,
    models::{
        session::Session,
        user::{CreateUser, CreateUserRequest, UpdateUser, UpdateUserRequest, User, UserRole},
    },
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::config::{AdminSeed, Config};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("session is no longer valid")]
    SessionExpired,
    #[error("user is inactive")]
    InactiveUser,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("token encoding failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Access token payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub sid: Uuid,
    pub rol: UserRole,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl JwtService {
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::default(),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn issue(&self, user_id: Uuid, session_id: Uuid, rol: UserRole) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            sid: session_id,
            rol,
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}

pub async fn hash_password(password: &str) -> Result<String, AuthError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Hashing(e.to_string()))?
}

/// `false` for both a wrong password and an unparsable stored hash.
pub async fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let password = password.to_owned();
    let stored_hash = stored_hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let Ok(parsed) = PasswordHash::new(&stored_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
    .await
    .map_err(|e| AuthError::Hashing(e.to_string()))
}

pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn hash_refresh_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub refresh_token: String,
    pub session_id: Uuid,
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub token: String,
    pub session_id: Uuid,
    pub expires_in: i64,
}

/// Identity resolved from a bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub session_id: Uuid,
}

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    pub fn rol(&self) -> UserRole {
        self.user.rol
    }
}

#[derive(Clone)]
pub struct AuthService {
    db: DBService,
    jwt: JwtService,
    refresh_ttl: Duration,
}

impl AuthService {
    pub fn new(db: DBService, config: &Config) -> Self {
        Self {
            db,
            jwt: JwtService::new(config.jwt_secret_bytes(), config.access_ttl_secs()),
            refresh_ttl: Duration::seconds(config.refresh_ttl_secs()),
        }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let Some(user) = User::find_by_email(&self.db.pool, email).await? else {
            warn!(email = %email, "Login attempt for unknown email");
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(password, &user.password_hash).await? {
            warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(AuthError::InvalidCredentials);
        }
        if !user.activo {
            return Err(AuthError::InactiveUser);
        }

        let refresh_token = generate_refresh_token();
        let session = Session::create(
            &self.db.pool,
            Uuid::new_v4(),
            user.id,
            &hash_refresh_token(&refresh_token),
            Utc::now() + self.refresh_ttl,
        )
        .await?;
        let token = self.jwt.issue(user.id, session.id, user.rol)?;

        info!(user_id = %user.id, session_id = %session.id, "User logged in");
        Ok(LoginResponse {
            token,
            refresh_token,
            session_id: session.id,
            expires_in: self.jwt.ttl_secs(),
            user,
        })
    }

    /// Issues a new access token for the session owning `refresh_token`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, AuthError> {
        let session = Session::find_by_refresh_hash(&self.db.pool, &hash_refresh_token(refresh_token))
            .await?
            .ok_or(AuthError::InvalidToken)?;
        if !session.is_active(Utc::now()) {
            return Err(AuthError::SessionExpired);
        }
        let user = self.active_user(session.usuario_id).await?;
        let token = self.jwt.issue(user.id, session.id, user.rol)?;
        Ok(RefreshResponse {
            token,
            session_id: session.id,
            expires_in: self.jwt.ttl_secs(),
        })
    }

    pub async fn logout(&self, session_id: Uuid) -> Result<(), AuthError> {
        Session::revoke(&self.db.pool, session_id).await?;
        info!(session_id = %session_id, "Session revoked");
        Ok(())
    }

    /// Verifies the token signature, then that its session is still open and
    /// its user still active, so logout and deactivation take effect immediately.
    pub async fn authenticate(&self, token: &str) -> Result<CurrentUser, AuthError> {
        let claims = self.jwt.verify(token)?;
        let session = Session::find_by_id(&self.db.pool, claims.sid)
            .await?
            .filter(|s| s.usuario_id == claims.sub)
            .ok_or(AuthError::InvalidToken)?;
        if !session.is_active(Utc::now()) {
            return Err(AuthError::SessionExpired);
        }
        let user = self.active_user(claims.sub).await?;
        Ok(CurrentUser {
            user,
            session_id: session.id,
        })
    }

    /// Creates the configured administrator unless that email is taken.
    pub async fn seed_admin(&self, seed: &AdminSeed) -> Result<Option<User>, AuthError> {
        if User::find_by_email(&self.db.pool, &seed.email).await?.is_some() {
            return Ok(None);
        }
        let data = CreateUser {
            email: seed.email.clone(),
            nombre: "Administrador".to_string(),
            password_hash: hash_password(seed.password.expose_secret()).await?,
            rol: UserRole::Admin,
        };
        let user = User::create(&self.db.pool, &data, Uuid::new_v4()).await?;
        info!(user_id = %user.id, email = %user.email, "Seeded administrator");
        Ok(Some(user))
    }

    /// Hashes the password and inserts the user. A taken email surfaces as a
    /// unique-constraint `AuthError::Database`.
    pub async fn create_user(&self, data: &CreateUserRequest) -> Result<User, AuthError> {
        let row = CreateUser {
            email: data.email.clone(),
            nombre: data.nombre.clone(),
            password_hash: hash_password(&data.password).await?,
            rol: data.rol.unwrap_or_default(),
        };
        let user = User::create(&self.db.pool, &row, Uuid::new_v4()).await?;
        info!(user_id = %user.id, rol = %user.rol, "User created");
        Ok(user)
    }

    /// Applies the present fields, hashing a new password. Turning `activo`
    /// off here also closes the user's sessions.
    pub async fn update_user(
        &self,
        id: Uuid,
        data: &UpdateUserRequest,
    ) -> Result<Option<User>, AuthError> {
        let password_hash = match &data.password {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };
        let row = UpdateUser {
            email: data.email.clone(),
            nombre: data.nombre.clone(),
            password_hash,
            rol: data.rol,
            activo: data.activo,
        };
        let user = User::update(&self.db.pool, id, &row).await?;
        if data.activo == Some(false) && user.is_some() {
            Session::revoke_all_for_user(&self.db.pool, id).await?;
        }
        Ok(user)
    }

    /// Soft-deletes the user and closes their sessions. `false` when the user
    /// is unknown or already inactive.
    pub async fn deactivate_user(&self, id: Uuid) -> Result<bool, AuthError> {
        if User::deactivate(&self.db.pool, id).await? == 0 {
            return Ok(false);
        }
        let closed = Session::revoke_all_for_user(&self.db.pool, id).await?;
        info!(user_id = %id, sessions_closed = closed, "User deactivated");
        Ok(true)
    }

    async fn active_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        match User::find_by_id(&self.db.pool, user_id).await? {
            Some(user) if user.activo => Ok(user),
            Some(_) => Err(AuthError::InactiveUser),
            None => Err(AuthError::InvalidToken),
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn test_config() -> Config {
        Config::from_lookup(|key| match key {
            "JWT_SECRET" => Some("pruebas-pruebas-pruebas".to_string()),
            _ => None,
        })
        .unwrap()
    }

    async fn service_with_user(email: &str, password: &str) -> (AuthService, User) {
        let db = DBService::new_in_memory().await.unwrap();
        let data = CreateUser {
            email: email.to_string(),
            nombre: "Coordinadora".to_string(),
            password_hash: hash_password(password).await.unwrap(),
            rol: UserRole::Coordinador,
        };
        let user = User::create(&db.pool, &data, Uuid::new_v4()).await.unwrap();
        (AuthService::new(db, &test_config()), user)
    }

    #[test]
    fn jwt_roundtrip_and_tamper_detection() {
        let jwt = JwtService::new(b"pruebas-pruebas-pruebas", 60);
        let (user_id, session_id) = (Uuid::new_v4(), Uuid::new_v4());
        let token = jwt.issue(user_id, session_id, UserRole::Bodega).unwrap();

        let claims = jwt.verify(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.sid, session_id);
        assert_eq!(claims.rol, UserRole::Bodega);
        assert_eq!(claims.exp - claims.iat, 60);

        let other = JwtService::new(b"otra-clave-distinta-123", 60);
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
        assert!(matches!(jwt.verify("not.a.token"), Err(AuthError::InvalidToken)));
    }

    /// Signs claims that expired well past the default 60s leeway.
    fn expired_token(secret: &[u8], sub: Uuid, sid: Uuid) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub,
            sid,
            rol: UserRole::Coordinador,
            iat: now - 600,
            exp: now - 120,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let secret = b"pruebas-pruebas-pruebas";
        let jwt = JwtService::new(secret, 60);
        let token = expired_token(secret, Uuid::new_v4(), Uuid::new_v4());
        assert!(matches!(jwt.verify(&token), Err(AuthError::InvalidToken)));

        let already_expired = JwtService::new(secret, -120);
        let token = already_expired
            .issue(Uuid::new_v4(), Uuid::new_v4(), UserRole::Tecnico)
            .unwrap();
        assert!(matches!(jwt.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn authenticate_rejects_expired_token_for_open_session() {
        let (auth, user) = service_with_user("vence@clinica.co", "clave-segura").await;
        let login = auth.login("vence@clinica.co", "clave-segura").await.unwrap();
        assert!(auth.authenticate(&login.token).await.is_ok());

        let token = expired_token(b"pruebas-pruebas-pruebas", user.id, login.session_id);
        assert!(matches!(
            auth.authenticate(&token).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn refresh_tokens_are_random_and_hashed() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert_eq!(hash_refresh_token(&a), hash_refresh_token(&a));
        assert_ne!(hash_refresh_token(&a), a);
    }

    #[tokio::test]
    async fn password_hash_verifies_only_the_original() {
        let hash = hash_password("clave-segura").await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("clave-segura", &hash).await.unwrap());
        assert!(!verify_password("otra", &hash).await.unwrap());
        assert!(!verify_password("clave-segura", "not-a-phc-string").await.unwrap());
    }

    #[tokio::test]
    async fn login_refresh_logout_flow() {
        let (auth, user) = service_with_user("coord@clinica.co", "clave-segura").await;

        assert!(matches!(
            auth.login("coord@clinica.co", "incorrecta").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nadie@clinica.co", "clave-segura").await,
            Err(AuthError::InvalidCredentials)
        ));

        let login = auth.login("COORD@clinica.co", "clave-segura").await.unwrap();
        assert_eq!(login.user.id, user.id);
        assert_eq!(login.expires_in, 86_400);

        let current = auth.authenticate(&login.token).await.unwrap();
        assert_eq!(current.id(), user.id);
        assert_eq!(current.session_id, login.session_id);

        let refreshed = auth.refresh(&login.refresh_token).await.unwrap();
        assert_eq!(refreshed.session_id, login.session_id);
        assert!(auth.authenticate(&refreshed.token).await.is_ok());

        auth.logout(login.session_id).await.unwrap();
        assert!(matches!(
            auth.authenticate(&login.token).await,
            Err(AuthError::SessionExpired)
        ));
        assert!(matches!(
            auth.refresh(&login.refresh_token).await,
            Err(AuthError::SessionExpired)
        ));
    }

    #[tokio::test]
    async fn inactive_users_cannot_log_in() {
        let (auth, user) = service_with_user("baja@clinica.co", "clave-segura").await;
        User::deactivate(&auth.db.pool, user.id).await.unwrap();
        assert!(matches!(
            auth.login("baja@clinica.co", "clave-segura").await,
            Err(AuthError::InactiveUser)
        ));
    }

    #[tokio::test]
    async fn managed_users_log_in_until_deactivated() {
        let db = DBService::new_in_memory().await.unwrap();
        let auth = AuthService::new(db, &test_config());
        let request = CreateUserRequest {
            email: "bodega@clinica.co".to_string(),
            nombre: "Almacén Central".to_string(),
            password: "clave-bodega".to_string(),
            rol: Some(UserRole::Bodega),
        };
        let user = auth.create_user(&request).await.unwrap();
        assert_eq!(user.rol, UserRole::Bodega);
        assert_ne!(user.password_hash, "clave-bodega");
        assert!(matches!(
            auth.create_user(&request).await,
            Err(AuthError::Database(_))
        ));

        let login = auth.login("bodega@clinica.co", "clave-bodega").await.unwrap();
        let changed = UpdateUserRequest {
            password: Some("clave-nueva-123".to_string()),
            ..Default::default()
        };
        auth.update_user(user.id, &changed).await.unwrap().unwrap();
        assert!(auth.login("bodega@clinica.co", "clave-bodega").await.is_err());
        assert!(auth.login("bodega@clinica.co", "clave-nueva-123").await.is_ok());

        assert!(auth.deactivate_user(user.id).await.unwrap());
        assert!(!auth.deactivate_user(user.id).await.unwrap());
        assert!(auth.authenticate(&login.token).await.is_err());
        assert!(matches!(
            auth.login("bodega@clinica.co", "clave-nueva-123").await,
            Err(AuthError::InactiveUser)
        ));
    }

    #[tokio::test]
    async fn admin_seed_is_idempotent() {
        let db = DBService::new_in_memory().await.unwrap();
        let auth = AuthService::new(db, &test_config());
        let seed = AdminSeed {
            email: "admin@clinica.co".to_string(),
            password: SecretString::from("admin-inicial".to_string()),
        };

        let created = auth.seed_admin(&seed).await.unwrap().unwrap();
        assert_eq!(created.rol, UserRole::Admin);
        assert!(auth.seed_admin(&seed).await.unwrap().is_none());
        assert!(auth.login("admin@clinica.co", "admin-inicial").await.is_ok());
    }
}
