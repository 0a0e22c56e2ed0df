use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::{debug, info};

/// What noticed the session was gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirySource {
    /// Local check of the token's `exp` claim.
    Poll,
    /// The backend answered 401.
    Unauthorized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierState {
    Armed,
    Firing {
        source: ExpirySource,
        remaining_secs: u64,
    },
    Done,
}

/// One-shot "your session expired" signal.
///
/// The first `trigger` wins; every later one is a no-op until a new
/// notifier is built.
#[derive(Debug)]
pub struct ExpiryNotifier {
    fired: AtomicBool,
    countdown_secs: u64,
    state: watch::Sender<NotifierState>,
}

impl ExpiryNotifier {
    pub fn new(countdown_secs: u64) -> Self {
        let (state, _) = watch::channel(NotifierState::Armed);
        Self {
            fired: AtomicBool::new(false),
            countdown_secs,
            state,
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn trigger(&self, source: ExpirySource) -> bool {
        if self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(?source, "session expiry already signalled; ignoring");
            return false;
        }

        info!(?source, countdown_secs = self.countdown_secs, "session expired");
        self.state.send_replace(NotifierState::Firing {
            source,
            remaining_secs: self.countdown_secs,
        });
        true
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    pub fn countdown_secs(&self) -> u64 {
        self.countdown_secs
    }

    pub fn state(&self) -> NotifierState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<NotifierState> {
        self.state.subscribe()
    }

    pub(crate) fn tick(&self, remaining_secs: u64) {
        self.state.send_if_modified(|state| match state {
            NotifierState::Firing {
                remaining_secs: current,
                ..
            } if *current != remaining_secs => {
                *current = remaining_secs;
                true
            }
            _ => false,
        });
    }

    pub(crate) fn finish(&self) {
        self.state.send_if_modified(|state| {
            if matches!(state, NotifierState::Firing { .. }) {
                *state = NotifierState::Done;
                true
            } else {
                false
            }
        });
    }
}
