//! Drives the expiry notifier: polls the token's `exp` claim, and once the
//! notifier fires, counts down, clears the token and leaves for the login
//! entry point.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::notifier::{ExpirySource, NotifierState};
use crate::session::SessionContext;
use crate::token;

/// Leaves the current screen for `target` with no client state carried over.
pub trait Navigator: Send + Sync {
    fn redirect(&self, target: &str);
}

#[derive(Debug, Clone)]
pub struct WatchdogSettings {
    pub poll_interval: Duration,
    pub login_path: String,
}

impl Default for WatchdogSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            login_path: "/login".to_string(),
        }
    }
}

pub struct SessionWatchdog {
    session: SessionContext,
    settings: WatchdogSettings,
    navigator: Arc<dyn Navigator>,
}

impl SessionWatchdog {
    pub fn new(
        session: SessionContext,
        settings: WatchdogSettings,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            session,
            settings,
            navigator,
        }
    }

    /// One expiry check. True if this call fired the notifier.
    pub fn check_now(&self) -> bool {
        let Some(raw) = self.session.token() else {
            return false;
        };
        if self.session.notifier().has_fired() {
            return false;
        }

        match token::decode(&raw) {
            Ok(claims) => {
                let now = Utc::now().timestamp();
                debug!(exp = ?claims.exp, now, "polled token expiry");
                if claims.is_expired_at(now) {
                    info!("token expired locally");
                    return self.session.expire(ExpirySource::Poll);
                }
                false
            }
            Err(err) => {
                warn!(error = %err, "token decode failed; skipping expiry check");
                false
            }
        }
    }

    pub fn spawn(self) -> WatchdogHandle {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(self.run(cancel.clone()));
        WatchdogHandle { cancel, handle }
    }

    #[instrument(skip_all)]
    pub async fn run(self, cancel: CancellationToken) {
        let mut state = self.session.subscribe();
        let mut ticker = interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let current = *state.borrow_and_update();
            match current {
                NotifierState::Armed => {}
                NotifierState::Firing { .. } => {
                    self.countdown(&cancel).await;
                    return;
                }
                NotifierState::Done => return,
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("watchdog cancelled");
                    return;
                }
                _ = ticker.tick() => {
                    self.check_now();
                }
                changed = state.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    }

    async fn countdown(&self, cancel: &CancellationToken) {
        let notifier = self.session.notifier();
        for remaining in (1..=notifier.countdown_secs()).rev() {
            notifier.tick(remaining);
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(remaining, "countdown cancelled");
                    return;
                }
                _ = sleep(Duration::from_secs(1)) => {}
            }
        }

        if let Err(err) = self.session.clear_token() {
            warn!(error = %err, "failed clearing token before redirect");
        }
        info!(target = %self.settings.login_path, "redirecting to login");
        self.navigator.redirect(&self.settings.login_path);
        notifier.finish();
    }
}

pub struct WatchdogHandle {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl WatchdogHandle {
    /// Stops polling. A countdown already under way is abandoned.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(err) = self.handle.await {
            warn!(error = %err, "watchdog task failed");
        }
    }

    /// Waits for the watchdog to finish on its own (redirect done).
    pub async fn finished(self) {
        if let Err(err) = self.handle.await {
            warn!(error = %err, "watchdog task failed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::store::MemoryTokenStore;
    use crate::token::{Claims, encode_unsigned};

    #[derive(Default)]
    struct RecordingNavigator {
        visits: Mutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn redirect(&self, target: &str) {
            self.visits.lock().push(target.to_string());
        }
    }

    fn token_expiring_at(exp: i64) -> String {
        encode_unsigned(&Claims {
            username: Some("marin".to_string()),
            exp: Some(exp),
            ..Claims::default()
        })
        .expect("encode")
    }

    fn watchdog(session: &SessionContext) -> (SessionWatchdog, Arc<RecordingNavigator>) {
        let navigator = Arc::new(RecordingNavigator::default());
        let dog = SessionWatchdog::new(
            session.clone(),
            WatchdogSettings::default(),
            navigator.clone(),
        );
        (dog, navigator)
    }

    #[test]
    fn check_now_ignores_live_and_unreadable_tokens() {
        let session = SessionContext::new(MemoryTokenStore::new(), 3);
        let (dog, _) = watchdog(&session);
        assert!(!dog.check_now());

        session
            .set_token(&token_expiring_at(Utc::now().timestamp() + 3600))
            .expect("set");
        assert!(!dog.check_now());

        session.set_token("garbage").expect("set");
        assert!(!dog.check_now());
        assert!(session.is_logged_in());
        assert!(!session.notifier().has_fired());
    }

    #[test]
    fn expired_token_fires_exactly_once() {
        let session = SessionContext::new(
            MemoryTokenStore::with_token(token_expiring_at(Utc::now().timestamp() - 5)),
            3,
        );
        let (dog, _) = watchdog(&session);
        assert!(dog.check_now());
        assert!(!session.is_logged_in());
        assert!(!dog.check_now());
    }

    #[tokio::test(start_paused = true)]
    async fn polled_expiry_counts_down_then_redirects() {
        let session = SessionContext::new(
            MemoryTokenStore::with_token(token_expiring_at(Utc::now().timestamp() - 1)),
            3,
        );
        let (dog, navigator) = watchdog(&session);

        dog.spawn().finished().await;

        assert_eq!(*navigator.visits.lock(), vec!["/login".to_string()]);
        assert_eq!(session.notifier().state(), NotifierState::Done);
        assert!(!session.is_logged_in());
    }

    #[tokio::test(start_paused = true)]
    async fn unauthorized_signal_wakes_the_watchdog() {
        let session = SessionContext::new(
            MemoryTokenStore::with_token(token_expiring_at(Utc::now().timestamp() + 3600)),
            2,
        );
        let (dog, navigator) = watchdog(&session);
        let handle = dog.spawn();

        tokio::task::yield_now().await;
        assert!(session.expire(ExpirySource::Unauthorized));
        handle.finished().await;

        assert_eq!(navigator.visits.lock().len(), 1);
        assert_eq!(session.notifier().state(), NotifierState::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn stopping_an_armed_watchdog_never_redirects() {
        let session = SessionContext::new(
            MemoryTokenStore::with_token(token_expiring_at(Utc::now().timestamp() + 3600)),
            3,
        );
        let (dog, navigator) = watchdog(&session);
        let handle = dog.spawn();

        tokio::time::sleep(Duration::from_secs(12)).await;
        handle.stop().await;

        assert!(navigator.visits.lock().is_empty());
        assert_eq!(session.notifier().state(), NotifierState::Armed);
        assert!(session.is_logged_in());
    }
}
