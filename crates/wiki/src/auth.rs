//! Session management and the identity-provider seam.
//!
//! Authentication is delegated entirely to an external provider; this
//! module only holds the resulting session. The session is an explicit
//! instance, never ambient global state, so embedding applications can run
//! several independent wikis side by side.

use crate::error::{WikiError, WikiResult};
use async_trait::async_trait;
use foliant_core::{Principal, SessionToken};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// An authenticated session as issued by the identity provider.
#[derive(Clone, Debug)]
pub struct AuthSession {
    pub principal: Principal,
    pub token: SessionToken,
}

/// External identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Exchange credentials for a session.
    async fn sign_in(&self, username: &str, password: &str) -> WikiResult<AuthSession>;

    /// Exchange a token for a fresh one before it expires.
    async fn refresh(&self, token: &SessionToken) -> WikiResult<SessionToken>;

    /// Re-derive the principal from a persisted token at application start.
    async fn resume(&self, token: &SessionToken) -> WikiResult<AuthSession>;

    /// Invalidate a token server-side.
    async fn sign_out(&self, token: &SessionToken) -> WikiResult<()>;
}

struct ActiveSession {
    /// Local correlation id for logs; not the provider's session id.
    id: Uuid,
    auth: AuthSession,
}

/// Holder of the current session.
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    session: RwLock<Option<ActiveSession>>,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            session: RwLock::new(None),
        }
    }

    /// Sign in and install the session. Replaces any existing session.
    pub async fn login(&self, username: &str, password: &str) -> WikiResult<Principal> {
        let auth = self.provider.sign_in(username, password).await?;
        let principal = auth.principal.clone();
        self.install(auth).await;
        Ok(principal)
    }

    /// Rebuild the session from a persisted token at startup.
    pub async fn resume(&self, token: &SessionToken) -> WikiResult<Principal> {
        let auth = self.provider.resume(token).await?;
        let principal = auth.principal.clone();
        self.install(auth).await;
        Ok(principal)
    }

    /// Clear the session and invalidate the token with the provider.
    ///
    /// The local session is gone regardless of whether the provider call
    /// succeeds; a failed sign-out only means the token dies by expiry.
    pub async fn logout(&self) {
        let taken = self.session.write().await.take();
        if let Some(active) = taken {
            tracing::debug!(session_id = %active.id, "logging out");
            if let Err(e) = self.provider.sign_out(&active.auth.token).await {
                tracing::warn!(error = %e, "provider sign-out failed; token will expire on its own");
            }
        }
    }

    /// The current principal, if signed in.
    pub async fn current_user(&self) -> Option<Principal> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|active| active.auth.principal.clone())
    }

    /// A copy of the current token, for persisting across restarts.
    pub async fn current_token(&self) -> Option<SessionToken> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|active| active.auth.token.clone())
    }

    /// Refresh the session token.
    ///
    /// A failed refresh clears the session entirely (forced logout): a
    /// session whose token cannot be renewed is not half-valid.
    pub async fn refresh_session(&self) -> WikiResult<()> {
        let mut guard = self.session.write().await;
        let Some(active) = guard.as_mut() else {
            return Err(WikiError::AuthFailed("no active session".to_string()));
        };

        match self.provider.refresh(&active.auth.token).await {
            Ok(token) => {
                active.auth.token = token;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(session_id = %active.id, error = %e, "token refresh failed, forcing logout");
                *guard = None;
                Err(WikiError::AuthFailed(format!("token refresh failed: {e}")))
            }
        }
    }

    async fn install(&self, auth: AuthSession) {
        let active = ActiveSession {
            id: Uuid::new_v4(),
            auth,
        };
        tracing::debug!(session_id = %active.id, username = %active.auth.principal.username, "session established");
        *self.session.write().await = Some(active);
    }
}
