//! Identity service seam.
//!
//! The session only ever asks for an access token during the identify
//! handshake; the other operations exist for front-ends that log in.

use std::future::Future;

use crate::error::AuthError;

/// Auth collaborator.
pub trait AuthProvider {
    /// Fetches an access token for `credential`.
    fn access_token(&self, credential: &str)
        -> impl Future<Output = Result<String, AuthError>> + Send;

    /// Checks whether `credential` is still accepted.
    fn validate(&self, credential: &str) -> impl Future<Output = Result<bool, AuthError>> + Send;

    /// Exchanges a login code for a credential.
    fn exchange_code(&self, code: &str) -> impl Future<Output = Result<String, AuthError>> + Send;
}

/// Fixed-answer provider for demos and tests.
#[derive(Clone, Debug, Default)]
pub struct StaticAuth {
    credential: String,
    token: Option<String>,
}

impl StaticAuth {
    /// Accepts `credential` and answers with `token`.
    #[must_use]
    pub fn new(credential: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            credential: credential.into(),
            token: Some(token.into()),
        }
    }

    /// Provider whose service is down.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::default()
    }

    fn check(&self, credential: &str) -> Result<&str, AuthError> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| AuthError::Unavailable("static provider has no token".into()))?;
        if credential != self.credential {
            return Err(AuthError::Rejected("unknown credential".into()));
        }
        Ok(token)
    }
}

impl AuthProvider for StaticAuth {
    async fn access_token(&self, credential: &str) -> Result<String, AuthError> {
        self.check(credential).map(str::to_owned)
    }

    async fn validate(&self, credential: &str) -> Result<bool, AuthError> {
        match self.check(credential) {
            Ok(_) => Ok(true),
            Err(AuthError::Rejected(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        if code.is_empty() {
            return Err(AuthError::Rejected("empty login code".into()));
        }
        self.check(&self.credential).map(|_| self.credential.clone())
    }
}
