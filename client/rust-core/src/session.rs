//! Signed-in state, constructed explicitly at startup and handed by reference
//! to everything that talks to the backend.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::{AuthTokens, UserProfile, UserRole};

/// Where the access token survives restarts.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Option<AuthTokens>>;
    async fn save(&self, tokens: &AuthTokens) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

/// Keeps the tokens as a JSON file.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<AuthTokens>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&raw) {
            Ok(tokens) => Ok(Some(tokens)),
            Err(e) => {
                // A corrupt file means signed out, not a startup failure.
                tracing::warn!(path = %self.path.display(), error = %e, "Discarding unreadable session file");
                Ok(None)
            }
        }
    }

    async fn save(&self, tokens: &AuthTokens) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let raw = serde_json::to_vec(tokens)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<Option<AuthTokens>>,
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<AuthTokens>> {
        Ok(self.tokens.read().await.clone())
    }

    async fn save(&self, tokens: &AuthTokens) -> Result<()> {
        *self.tokens.write().await = Some(tokens.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.tokens.write().await = None;
        Ok(())
    }
}

pub struct AuthSession {
    store: Arc<dyn TokenStore>,
    tokens: Option<AuthTokens>,
}

impl AuthSession {
    /// Signed-out session backed by `store`.
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            tokens: None,
        }
    }

    /// Picks up a previously persisted sign-in, if any.
    pub async fn restore(store: Arc<dyn TokenStore>) -> Result<Self> {
        let tokens = store.load().await?;
        match &tokens {
            Some(t) => tracing::info!(user_id = %t.user.id, "Restored session"),
            None => tracing::debug!("No stored session"),
        }
        Ok(Self { store, tokens })
    }

    pub async fn sign_in(&mut self, tokens: AuthTokens) -> Result<()> {
        self.store.save(&tokens).await?;
        tracing::info!(user_id = %tokens.user.id, "Signed in");
        self.tokens = Some(tokens);
        Ok(())
    }

    pub async fn logout(&mut self) -> Result<()> {
        self.store.clear().await?;
        if let Some(tokens) = self.tokens.take() {
            tracing::info!(user_id = %tokens.user.id, "Signed out");
        }
        Ok(())
    }

    /// Refreshes the cached profile, e.g. after `/auth/me`.
    pub async fn update_user(&mut self, user: UserProfile) -> Result<()> {
        if let Some(tokens) = self.tokens.as_mut() {
            tokens.user = user;
            self.store.save(tokens).await?;
        }
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_some()
    }

    pub fn bearer(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.access_token.as_str())
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.tokens.as_ref().map(|t| &t.user)
    }

    pub fn is_parent(&self) -> bool {
        self.user().is_some_and(|u| u.role == UserRole::Parent)
    }
}
