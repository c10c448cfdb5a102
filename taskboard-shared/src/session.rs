//! Session provider
//!
//! The signed-in user scopes every board query. Consumers read the current
//! user or watch it change (sign-in, sign-out, token refresh).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

/// Authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,

    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    pub fn new(id: Uuid) -> Self {
        User { id, email: None }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Source of the current user
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The signed-in user, if any
    async fn current_user(&self) -> Option<User>;

    /// Receiver that observes every session change
    fn watch(&self) -> watch::Receiver<Option<User>>;

    async fn sign_out(&self);
}

/// Session held in process
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::session::{LocalSession, SessionProvider, User};
/// use uuid::Uuid;
///
/// # async fn example() {
/// let session = LocalSession::new();
/// let mut changes = session.watch();
///
/// session.sign_in(User::new(Uuid::new_v4()));
/// changes.changed().await.ok();
/// assert!(session.current_user().await.is_some());
/// # }
/// ```
#[derive(Debug)]
pub struct LocalSession {
    tx: watch::Sender<Option<User>>,
}

impl LocalSession {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        LocalSession { tx }
    }

    pub fn signed_in(user: User) -> Self {
        let (tx, _rx) = watch::channel(Some(user));
        LocalSession { tx }
    }

    pub fn sign_in(&self, user: User) {
        tracing::info!(user_id = %user.id, "Signed in");
        self.tx.send_replace(Some(user));
    }
}

impl Default for LocalSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionProvider for LocalSession {
    async fn current_user(&self) -> Option<User> {
        self.tx.borrow().clone()
    }

    fn watch(&self) -> watch::Receiver<Option<User>> {
        self.tx.subscribe()
    }

    async fn sign_out(&self) {
        if let Some(user) = self.tx.send_replace(None) {
            tracing::info!(user_id = %user.id, "Signed out");
        }
    }
}
