//! Account and session endpoints

use crate::error::Result;
use crate::http::{ApiClient, RequestConfig};
use crate::types::{JsonValue, Method};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

const BASE: &str = "/users/";

/// Login credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Create credentials
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Account registration details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    /// Confirmation; must equal `password`
    pub password2: String,
}

/// Link parameters from an account verification email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountToken {
    pub user_id: u64,
    pub user_uuid: String,
    pub token: String,
}

/// New password set through a reset link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordChange {
    pub user_id: u64,
    pub user_uuid: String,
    pub token: String,
    pub password: String,
    /// Confirmation; must equal `password`
    pub password2: String,
}

/// Session and profile operations
///
/// Every mutating call makes sure a CSRF token exists first.
#[derive(Debug, Clone)]
pub struct UserService {
    client: ApiClient,
}

impl UserService {
    /// Create a service on a shared client
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Ask the backend to set the CSRF cookie
    pub async fn init_csrf(&self) {
        self.client.init_csrf().await;
    }

    /// Start a session; returns the user
    pub async fn login(&self, credentials: &Credentials) -> Result<JsonValue> {
        self.client.ensure_csrf().await;
        let user = self.client.post(&format!("{BASE}login/"), credentials).await?;
        info!(email = %credentials.email, "Logged in");
        Ok(user)
    }

    /// Create an account
    pub async fn register(&self, details: &Registration) -> Result<()> {
        self.client.ensure_csrf().await;
        let _: JsonValue = self
            .client
            .post(&format!("{BASE}register/"), details)
            .await?;
        Ok(())
    }

    /// End the session
    pub async fn logout(&self) -> Result<()> {
        self.client.ensure_csrf().await;
        let _: JsonValue = self
            .client
            .request_json(Method::POST, &format!("{BASE}logout/"), RequestConfig::new())
            .await?;
        Ok(())
    }

    /// The logged-in user
    pub async fn current_user(&self) -> Result<JsonValue> {
        self.client.get(&format!("{BASE}me/")).await
    }

    /// Update first and last name
    pub async fn update_profile(&self, payload: &JsonValue) -> Result<JsonValue> {
        self.client.ensure_csrf().await;
        self.client.put(&format!("{BASE}me/"), payload).await
    }

    /// Confirm an account from its verification link
    ///
    /// True when the backend answers 200.
    pub async fn verify_account(&self, token: &AccountToken) -> Result<bool> {
        self.send_for_ok(Method::POST, "verify-account/", serde_json::to_value(token)?)
            .await
    }

    /// Send the verification email again
    pub async fn resend_verification(&self, email: &str) -> Result<()> {
        self.send_for_ok(
            Method::POST,
            "resend-verification-link/",
            json!({ "email": email }),
        )
        .await?;
        Ok(())
    }

    /// Email a password reset link
    pub async fn send_password_reset(&self, email: &str) -> Result<()> {
        self.send_for_ok(
            Method::POST,
            "send-password-reset-link/",
            json!({ "email": email }),
        )
        .await?;
        Ok(())
    }

    /// Set a new password from a reset link
    pub async fn change_password(&self, change: &PasswordChange) -> Result<bool> {
        let ok = self
            .send_for_ok(Method::PUT, "change-password/", serde_json::to_value(change)?)
            .await?;
        if ok {
            info!(user_id = change.user_id, "Password changed");
        }
        Ok(ok)
    }

    async fn send_for_ok(&self, method: Method, endpoint: &str, body: JsonValue) -> Result<bool> {
        self.client.ensure_csrf().await;
        let response = self
            .client
            .send(method, &format!("{BASE}{endpoint}"), RequestConfig::new().json(body))
            .await?;
        Ok(response.status().as_u16() == 200)
    }
}
