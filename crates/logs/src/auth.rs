//! Credentials — the headers every streaming and tailing request carries.
//!
//! Token acquisition and refresh happen upstream; this module only asks the
//! collaborator for the current header values.

use std::sync::Arc;

pub const PROXY_USER_HEADER: &str = "Proxy-User";

const LEGACY_TOKEN_PREFIX: &str = "0408";

/// Supplies request credentials. Implementations must be cheap to call;
/// they are consulted once per request or handshake.
pub trait Credentials: Send + Sync {
    /// Full `Authorization` header value, if any.
    fn authorization(&self) -> Option<String>;

    /// Value for the `Proxy-User` header, if any.
    fn proxy_user(&self) -> Option<String> {
        None
    }
}

pub type SharedCredentials = Arc<dyn Credentials>;

/// No credentials at all (anonymous endpoints, tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl Credentials for Anonymous {
    fn authorization(&self) -> Option<String> {
        None
    }
}

/// A fixed access token, e.g. from configuration.
#[derive(Debug, Clone)]
pub struct StaticToken {
    header: String,
    proxy_user: Option<String>,
}

impl StaticToken {
    pub fn new(token: impl AsRef<str>) -> Self {
        Self {
            header: normalize_token(token.as_ref()),
            proxy_user: None,
        }
    }

    pub fn with_proxy_user(mut self, user: impl Into<String>) -> Self {
        self.proxy_user = Some(user.into());
        self
    }
}

impl Credentials for StaticToken {
    fn authorization(&self) -> Option<String> {
        Some(self.header.clone())
    }

    fn proxy_user(&self) -> Option<String> {
        self.proxy_user.clone()
    }
}

/// Bare UAA tokens get a `Bearer ` prefix; already-typed and legacy tokens
/// are sent verbatim.
pub fn normalize_token(token: &str) -> String {
    let token = token.trim();
    if token.starts_with(LEGACY_TOKEN_PREFIX) || token.to_ascii_lowercase().starts_with("bearer") {
        token.to_string()
    } else {
        format!("Bearer {}", token)
    }
}
