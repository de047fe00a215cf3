//! Authentication service for login, password changes and token checks

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::{validate_password, User};
use sqlx::SqlitePool;

use crate::config::{BootstrapConfig, Config};
use crate::error::{AppError, AppResult};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: SqlitePool,
    jwt_secret: String,
    access_token_expiry: i64,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub username: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    /// The client should force a password change before anything else
    pub must_change_password: bool,
    pub user: User,
}

/// User row including the credential hash
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    full_name: Option<String>,
    role: String,
    active: bool,
    must_change_password: bool,
    created_at: chrono::DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            full_name: row.full_name,
            role: row.role,
            active: row.active,
            must_change_password: row.must_change_password,
            created_at: row.created_at,
        }
    }
}

const USER_COLUMNS: &str =
    "id, username, password_hash, full_name, role, active, must_change_password, created_at";

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: SqlitePool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
        }
    }

    /// Authenticate with username and password
    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginResponse> {
        let user = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE username = ?",
            USER_COLUMNS
        ))
        .bind(username.trim())
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !user.active {
            return Err(AppError::Unauthorized {
                message: "Account is disabled".to_string(),
                message_es: "La cuenta está desactivada".to_string(),
            });
        }

        let valid = verify(password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(user.id)
            .execute(&self.db)
            .await?;

        let access_token = self.generate_token(user.id, &user.username, &user.role)?;
        tracing::info!(user_id = user.id, username = %user.username, "User logged in");

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
            must_change_password: user.must_change_password,
            user: user.into(),
        })
    }

    /// Replace a user's password after checking the current one
    pub async fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        validate_password(new_password).map_err(|msg| {
            AppError::validation(
                "new_password",
                msg,
                "La contraseña debe tener al menos 8 caracteres",
            )
        })?;

        let user = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        let valid = verify(current_password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::validation(
                "current_password",
                "Current password is incorrect",
                "La contraseña actual es incorrecta",
            ));
        }
        if current_password == new_password {
            return Err(AppError::validation(
                "new_password",
                "New password must differ from the current one",
                "La nueva contraseña debe ser distinta de la actual",
            ));
        }

        let password_hash = Self::hash_password(new_password)?;
        sqlx::query("UPDATE users SET password_hash = ?, must_change_password = 0 WHERE id = ?")
            .bind(&password_hash)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        tracing::info!(user_id, "Password changed");
        Ok(())
    }

    /// Create the first admin account from configuration when the user
    /// table is empty. Returns whether an account was created.
    pub async fn ensure_bootstrap_admin(&self, bootstrap: &BootstrapConfig) -> AppResult<bool> {
        let (Some(username), Some(password)) = (
            bootstrap.admin_username.as_deref().map(str::trim).filter(|u| !u.is_empty()),
            bootstrap.admin_password.as_deref().filter(|p| !p.is_empty()),
        ) else {
            return Ok(false);
        };

        let users = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;
        if users > 0 {
            return Ok(false);
        }

        let password_hash = Self::hash_password(password)?;
        sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, full_name, role, active, must_change_password, created_at)
            VALUES (?, ?, 'Administrador', 'admin', 1, 1, ?)
            "#,
        )
        .bind(username)
        .bind(&password_hash)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        tracing::warn!(username, "Bootstrap admin created; password change required on first login");
        Ok(true)
    }

    fn generate_token(&self, user_id: i64, username: &str, role: &str) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role: role.to_string(),
            exp: (now + Duration::seconds(self.access_token_expiry)).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    fn hash_password(password: &str) -> AppResult<String> {
        hash(password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }
}

/// Decode and verify an HS256 access token
pub fn decode_token(secret: &str, token: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::InvalidToken)
}
