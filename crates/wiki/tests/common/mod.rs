//! Shared fixtures for wiki integration tests.

pub mod mocks;

use foliant_core::{Principal, Role, SessionToken};
use foliant_storage::{MemoryBackend, ObjectStore};
use foliant_wiki::error::{WikiError, WikiResult};
use foliant_wiki::{AuthSession, IdentityProvider, Wiki};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};

/// Identity provider backed by a fixed user table.
///
/// Tokens are the username itself, which keeps `resume` trivial. `refresh`
/// can be made to fail to exercise the forced-logout path.
pub struct MockIdentityProvider {
    users: HashMap<String, Principal>,
    fail_refresh: AtomicBool,
}

impl MockIdentityProvider {
    pub fn with_standard_users() -> Self {
        let mut users = HashMap::new();
        for (username, role) in [
            ("guest", Role::Guest),
            ("reggie", Role::Regular),
            ("root", Role::Admin),
        ] {
            users.insert(
                username.to_string(),
                Principal {
                    id: format!("id-{username}"),
                    username: username.to_string(),
                    role,
                    email: format!("{username}@example.com"),
                },
            );
        }
        Self {
            users,
            fail_refresh: AtomicBool::new(false),
        }
    }

    pub fn fail_next_refresh(&self) {
        self.fail_refresh.store(true, Ordering::SeqCst);
    }

    fn token_for(username: &str) -> SessionToken {
        SessionToken {
            access_token: username.to_string(),
            refresh_token: Some(format!("refresh-{username}")),
            expires_at: OffsetDateTime::now_utc() + Duration::hours(1),
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn sign_in(&self, username: &str, password: &str) -> WikiResult<AuthSession> {
        if password != "hunter2" {
            return Err(WikiError::AuthFailed("bad credentials".to_string()));
        }
        let principal = self
            .users
            .get(username)
            .cloned()
            .ok_or_else(|| WikiError::AuthFailed("unknown user".to_string()))?;
        Ok(AuthSession {
            principal,
            token: Self::token_for(username),
        })
    }

    async fn refresh(&self, token: &SessionToken) -> WikiResult<SessionToken> {
        if self.fail_refresh.swap(false, Ordering::SeqCst) {
            return Err(WikiError::AuthFailed("refresh rejected".to_string()));
        }
        Ok(Self::token_for(&token.access_token))
    }

    async fn resume(&self, token: &SessionToken) -> WikiResult<AuthSession> {
        let principal = self
            .users
            .get(&token.access_token)
            .cloned()
            .ok_or_else(|| WikiError::AuthFailed("unknown token".to_string()))?;
        Ok(AuthSession {
            principal,
            token: token.clone(),
        })
    }

    async fn sign_out(&self, _token: &SessionToken) -> WikiResult<()> {
        Ok(())
    }
}

/// A wiki over a fresh in-memory store, plus handles to the store and the
/// provider for direct manipulation.
pub fn wiki() -> (Wiki, Arc<dyn ObjectStore>, Arc<MockIdentityProvider>) {
    let store: Arc<dyn ObjectStore> = Arc::new(MemoryBackend::new());
    let provider = Arc::new(MockIdentityProvider::with_standard_users());
    let provider_dyn: Arc<dyn IdentityProvider> = provider.clone();
    let wiki = Wiki::new(Arc::clone(&store), provider_dyn);
    (wiki, store, provider)
}

/// A wiki with an admin already signed in.
pub async fn admin_wiki() -> (Wiki, Arc<dyn ObjectStore>, Arc<MockIdentityProvider>) {
    let (wiki, store, provider) = wiki();
    wiki.login("root", "hunter2").await.expect("admin login");
    (wiki, store, provider)
}
