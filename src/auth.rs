//! Mock sign-in and the admin gate.
//!
//! There is no identity provider behind any of this: credentials other than
//! the fixed owner pair always succeed. The admin gate only reads the role of
//! the stored user, so it keeps honest clients out of the console and nothing
//! more.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::entities::user::{AuthProvider, Role, User};
use crate::domain::errors::AuthError;
use crate::persistence::repository::SessionRepository;

const ADMIN_EMAIL: &str = "admin@goldmaster.com";
const ADMIN_PASSWORD: &str = "GoldMasterOwner2024";
const ADMIN_ID: &str = "admin_001";
const ADMIN_NAME: &str = "Gold Master Owner";
const ADMIN_BALANCE: f64 = 1_000_000.0;

const DEFAULT_MEMBER_NAME: &str = "GM Member";
const DEFAULT_MEMBER_EMAIL: &str = "trader@goldmaster.com";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub mode: AuthMode,
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AuthOutcome {
    SignedIn { user: User },
    /// Registration only sends a confirmation email, nobody is signed in
    EmailSent,
}

fn short_id(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}

/// Email form submission. The owner pair wins in either mode.
pub fn email_sign_in(credentials: &Credentials) -> AuthOutcome {
    let email = credentials.email.trim();
    if email == ADMIN_EMAIL && credentials.password == ADMIN_PASSWORD {
        return AuthOutcome::SignedIn {
            user: User {
                id: ADMIN_ID.to_string(),
                name: ADMIN_NAME.to_string(),
                email: email.to_string(),
                avatar: None,
                is_vip: true,
                role: Role::Admin,
                provider: AuthProvider::Email,
                balance: ADMIN_BALANCE,
            },
        };
    }

    if credentials.mode == AuthMode::Register {
        return AuthOutcome::EmailSent;
    }

    let name = credentials.name.trim();
    AuthOutcome::SignedIn {
        user: User {
            id: format!("user_{}", short_id(6)),
            name: if name.is_empty() { DEFAULT_MEMBER_NAME } else { name }.to_string(),
            email: if email.is_empty() { DEFAULT_MEMBER_EMAIL } else { email }.to_string(),
            avatar: None,
            is_vip: false,
            role: Role::User,
            provider: AuthProvider::Email,
            balance: 0.0,
        },
    }
}

pub fn parse_social_provider(name: &str) -> Result<AuthProvider, AuthError> {
    match name.trim().to_lowercase().as_str() {
        "google" => Ok(AuthProvider::Google),
        "line" => Ok(AuthProvider::Line),
        "apple" => Ok(AuthProvider::Apple),
        "facebook" => Ok(AuthProvider::Facebook),
        "" => Err(AuthError::MissingField("provider")),
        other => Err(AuthError::UnknownProvider(other.to_string())),
    }
}

pub fn social_sign_in(provider: AuthProvider) -> Result<User, AuthError> {
    let slug = provider.as_str();
    let name = match provider {
        AuthProvider::Email => return Err(AuthError::UnknownProvider(slug.to_string())),
        AuthProvider::Line => "LINE User".to_string(),
        _ => {
            let mut chars = slug.chars();
            let first = chars.next().map(|c| c.to_ascii_uppercase()).unwrap_or_default();
            format!("{}{} Trader", first, chars.as_str())
        }
    };

    Ok(User {
        id: short_id(6),
        name,
        email: format!("{}_user@example.com", slug),
        avatar: None,
        is_vip: false,
        role: Role::User,
        provider,
        balance: 0.0,
    })
}

/// Middleware for the admin console routes
pub async fn require_admin(
    State(session): State<SessionRepository>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user = session.current_user().map_err(|e| {
        tracing::error!("Failed to read session for admin check: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match user {
        Some(user) if user.is_admin() => Ok(next.run(request).await),
        Some(user) => {
            tracing::warn!("User {} attempted an admin action", user.id);
            Err(StatusCode::FORBIDDEN)
        }
        None => {
            tracing::warn!("Anonymous admin action rejected");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
