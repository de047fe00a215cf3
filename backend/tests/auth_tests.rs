//! Authentication tests
//!
//! Bootstrap admin, login, password changes and token checks.

mod common;

use common::Harness;
use stockroom_backend::{
    config::BootstrapConfig,
    error::AppError,
    services::{auth::decode_token, AuthService},
};

fn bootstrap(username: &str, password: &str) -> BootstrapConfig {
    BootstrapConfig {
        admin_username: Some(username.to_string()),
        admin_password: Some(password.to_string()),
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn bootstrap_admin_is_created_once() {
        let h = Harness::new().await;
        let auth = AuthService::new(h.pool.clone(), &h.config);

        assert!(auth.ensure_bootstrap_admin(&bootstrap("admin", "Admin2025!")).await.unwrap());
        assert!(!auth.ensure_bootstrap_admin(&bootstrap("other", "Other2025!")).await.unwrap());
        assert!(!auth.ensure_bootstrap_admin(&BootstrapConfig::default()).await.unwrap());
    }

    #[tokio::test]
    async fn login_returns_token_and_password_flag() {
        let h = Harness::new().await;
        let auth = AuthService::new(h.pool.clone(), &h.config);
        auth.ensure_bootstrap_admin(&bootstrap("admin", "Admin2025!")).await.unwrap();

        let response = auth.login("admin", "Admin2025!").await.unwrap();

        assert!(response.must_change_password);
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.user.username, "admin");

        let claims = decode_token(&h.config.jwt.secret, &response.access_token).unwrap();
        assert_eq!(claims.sub, response.user.id.to_string());
        assert_eq!(claims.role, "admin");
        assert!(matches!(
            decode_token("another-secret", &response.access_token),
            Err(AppError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn wrong_credentials_are_rejected() {
        let h = Harness::new().await;
        let auth = AuthService::new(h.pool.clone(), &h.config);
        auth.ensure_bootstrap_admin(&bootstrap("admin", "Admin2025!")).await.unwrap();

        assert!(matches!(
            auth.login("admin", "wrong-password").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody", "Admin2025!").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn password_change_clears_flag() {
        let h = Harness::new().await;
        let auth = AuthService::new(h.pool.clone(), &h.config);
        auth.ensure_bootstrap_admin(&bootstrap("admin", "Admin2025!")).await.unwrap();
        let user_id = auth.login("admin", "Admin2025!").await.unwrap().user.id;

        assert!(matches!(
            auth.change_password(user_id, "Admin2025!", "short").await,
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            auth.change_password(user_id, "not-current", "Nueva2025!").await,
            Err(AppError::Validation { .. })
        ));

        auth.change_password(user_id, "Admin2025!", "Nueva2025!").await.unwrap();

        assert!(auth.login("admin", "Admin2025!").await.is_err());
        let response = auth.login("admin", "Nueva2025!").await.unwrap();
        assert!(!response.must_change_password);
    }

    #[tokio::test]
    async fn disabled_accounts_cannot_log_in() {
        let h = Harness::new().await;
        let auth = AuthService::new(h.pool.clone(), &h.config);
        auth.ensure_bootstrap_admin(&bootstrap("admin", "Admin2025!")).await.unwrap();
        sqlx::query("UPDATE users SET active = 0")
            .execute(&h.pool)
            .await
            .unwrap();

        assert!(matches!(
            auth.login("admin", "Admin2025!").await,
            Err(AppError::Unauthorized { .. })
        ));
    }
}
