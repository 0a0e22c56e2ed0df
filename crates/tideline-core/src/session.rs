use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::notifier::{ExpiryNotifier, ExpirySource, NotifierState};
use crate::store::TokenStore;
use crate::token::{self, Claims};

/// Shared handle to the logged-in state: the token slot plus the expiry
/// notifier. Cheap to clone; every clone sees the same session.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    store: Box<dyn TokenStore>,
    notifier: ExpiryNotifier,
}

impl SessionContext {
    pub fn new(store: impl TokenStore + 'static, countdown_secs: u64) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                store: Box::new(store),
                notifier: ExpiryNotifier::new(countdown_secs),
            }),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.inner.store.get()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token().is_some()
    }

    pub fn set_token(&self, token: &str) -> anyhow::Result<()> {
        self.inner.store.set(token)
    }

    pub fn clear_token(&self) -> anyhow::Result<()> {
        self.inner.store.clear()
    }

    /// Unverified claims of the current token, `None` when absent or unreadable.
    pub fn claims(&self) -> Option<Claims> {
        let token = self.token()?;
        match token::decode(&token) {
            Ok(claims) => Some(claims),
            Err(err) => {
                debug!(error = %err, "token claims unreadable");
                None
            }
        }
    }

    /// Display-only name of whoever the token says is logged in.
    pub fn current_user(&self) -> Option<String> {
        self.claims().and_then(|claims| claims.display_name())
    }

    /// Drops the token and raises the expiry signal. Returns true only for
    /// the call that actually fired it.
    pub fn expire(&self, source: ExpirySource) -> bool {
        if let Err(err) = self.clear_token() {
            warn!(error = %err, "failed clearing expired token");
        }
        self.inner.notifier.trigger(source)
    }

    pub fn notifier(&self) -> &ExpiryNotifier {
        &self.inner.notifier
    }

    pub fn subscribe(&self) -> watch::Receiver<NotifierState> {
        self.inner.notifier.subscribe()
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("logged_in", &self.is_logged_in())
            .field("expiry", &self.inner.notifier.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTokenStore;
    use crate::token::encode_unsigned;

    #[test]
    fn expire_clears_and_fires_once() {
        let session = SessionContext::new(MemoryTokenStore::with_token("a.b.c"), 3);
        assert!(session.is_logged_in());

        assert!(session.expire(ExpirySource::Unauthorized));
        assert!(!session.is_logged_in());
        assert!(!session.expire(ExpirySource::Unauthorized));
    }

    #[test]
    fn current_user_comes_from_claims() {
        let token = encode_unsigned(&Claims {
            username: Some("marin".to_string()),
            exp: Some(4_000_000_000),
            ..Claims::default()
        })
        .expect("encode");

        let session = SessionContext::new(MemoryTokenStore::new(), 3);
        assert_eq!(session.current_user(), None);

        session.set_token(&token).expect("set");
        assert_eq!(session.current_user().as_deref(), Some("marin"));

        session.set_token("not-a-jwt").expect("set");
        assert_eq!(session.claims(), None);
        assert!(session.is_logged_in());
    }
}
