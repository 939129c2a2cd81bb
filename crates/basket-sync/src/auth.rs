//! # Auth Provider Seam
//!
//! The core never authenticates anyone; it only needs a stable user id to
//! scope queries. The application wires in whatever identity provider it
//! uses; tests wire in [`StaticAuth`].

use std::sync::RwLock;

/// Supplies the currently authenticated user, if any.
///
/// The sync engine re-checks this before every cycle and skips silently when
/// no user is signed in; the façade surfaces `NotAuthenticated` instead.
pub trait AuthProvider: Send + Sync {
    /// Stable id of the signed-in user, or `None` when signed out.
    fn current_user(&self) -> Option<String>;
}

/// Auth provider with a fixed (but switchable) user. For tests and
/// single-user embedding.
pub struct StaticAuth {
    user_id: RwLock<Option<String>>,
}

impl StaticAuth {
    /// Creates a provider signed in as the given user.
    pub fn new(user_id: impl Into<String>) -> Self {
        StaticAuth {
            user_id: RwLock::new(Some(user_id.into())),
        }
    }

    /// Simulates signing out.
    pub fn sign_out(&self) {
        *write(&self.user_id) = None;
    }

    /// Simulates signing in.
    pub fn sign_in(&self, user_id: impl Into<String>) {
        *write(&self.user_id) = Some(user_id.into());
    }
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl AuthProvider for StaticAuth {
    fn current_user(&self) -> Option<String> {
        self.user_id
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Provider that is never signed in.
pub struct NoAuth;

impl AuthProvider for NoAuth {
    fn current_user(&self) -> Option<String> {
        None
    }
}
