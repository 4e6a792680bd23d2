//! Single media resource load lifecycle.
//!
//! # Responsibility
//! - Track one `(record, uri)` resource from `Idle` to a terminal state.
//! - Deliver exactly one settle notification to at most one observer.
//!
//! # Invariants
//! - `Loaded` and `Errored` are terminal; later signals are ignored.
//! - A blank URI settles as `Errored(NoMedia)` without entering `Loading`.
//! - `Loading` is left either by an environment signal or by `expire`.

use crate::media::MediaError;
use std::fmt::{Debug, Formatter};
use std::time::{Duration, Instant};

/// Why a media load ended in `Errored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaErrorReason {
    /// Record carries no media URI.
    NoMedia,
    /// Environment reported a network, decode or HTTP failure.
    FetchFailed,
    /// Load did not settle before the configured deadline.
    TimedOut,
}

impl MediaErrorReason {
    /// Stable reason tag exposed to views.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoMedia => "no-media",
            Self::FetchFailed => "fetch-failed",
            Self::TimedOut => "timed-out",
        }
    }
}

/// Presentation state of one media resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaState {
    Idle,
    Loading,
    Loaded,
    Errored(MediaErrorReason),
}

impl MediaState {
    /// Returns whether the state is terminal.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Loaded | Self::Errored(_))
    }

    /// Reason tag for `Errored`, `None` otherwise.
    pub fn reason(self) -> Option<&'static str> {
        match self {
            Self::Errored(reason) => Some(reason.as_str()),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Errored(_) => "errored",
        }
    }
}

/// Result of feeding one signal into a [`MediaLoad`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved { from: MediaState, to: MediaState },
    /// Signal did not apply to the current state.
    Ignored,
}

/// Callback fired once when a load settles.
pub type SettleObserver = Box<dyn FnOnce(MediaState) + Send>;

/// State machine for one media resource instance.
pub struct MediaLoad {
    uri: String,
    state: MediaState,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
    observer: Option<SettleObserver>,
    observer_registered: bool,
}

impl Debug for MediaLoad {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaLoad")
            .field("uri", &self.uri)
            .field("state", &self.state)
            .field("timeout", &self.timeout)
            .field("deadline", &self.deadline)
            .field("observer_registered", &self.observer_registered)
            .finish()
    }
}

impl MediaLoad {
    /// Creates an `Idle` instance; `timeout = None` disables expiry.
    pub fn new(uri: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            uri: uri.into(),
            state: MediaState::Idle,
            timeout,
            deadline: None,
            observer: None,
            observer_registered: false,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn state(&self) -> MediaState {
        self.state
    }

    /// Deadline for the current `Loading` attempt, if bounded.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Dispatches the load: `Idle -> Loading`, or `Idle -> Errored(NoMedia)`
    /// for a blank URI.
    pub fn begin(&mut self, now: Instant) -> Transition {
        if self.state != MediaState::Idle {
            return Transition::Ignored;
        }

        if self.uri.trim().is_empty() {
            return self.settle(MediaState::Errored(MediaErrorReason::NoMedia));
        }

        // A deadline past the representable range means the load is unbounded.
        self.deadline = self
            .timeout
            .and_then(|timeout| now.checked_add(timeout));
        self.move_to(MediaState::Loading)
    }

    /// Environment success signal.
    pub fn mark_loaded(&mut self) -> Transition {
        if self.state != MediaState::Loading {
            return Transition::Ignored;
        }
        self.settle(MediaState::Loaded)
    }

    /// Environment failure signal.
    pub fn mark_failed(&mut self) -> Transition {
        if self.state != MediaState::Loading {
            return Transition::Ignored;
        }
        self.settle(MediaState::Errored(MediaErrorReason::FetchFailed))
    }

    /// Settles an overdue `Loading` instance as `Errored(TimedOut)`.
    pub fn expire(&mut self, now: Instant) -> Transition {
        match (self.state, self.deadline) {
            (MediaState::Loading, Some(deadline)) if now >= deadline => {
                self.settle(MediaState::Errored(MediaErrorReason::TimedOut))
            }
            _ => Transition::Ignored,
        }
    }

    /// Registers the single settle observer.
    ///
    /// Fires immediately when the instance has already settled.
    ///
    /// # Errors
    /// - `MediaError::ObserverAlreadyRegistered` on a second registration.
    pub fn observe(&mut self, observer: SettleObserver) -> Result<(), MediaError> {
        if self.observer_registered {
            return Err(MediaError::ObserverAlreadyRegistered);
        }
        self.observer_registered = true;

        if self.state.is_settled() {
            observer(self.state);
        } else {
            self.observer = Some(observer);
        }
        Ok(())
    }

    fn move_to(&mut self, to: MediaState) -> Transition {
        let from = self.state;
        self.state = to;
        Transition::Moved { from, to }
    }

    fn settle(&mut self, to: MediaState) -> Transition {
        let transition = self.move_to(to);
        self.deadline = None;
        if let Some(observer) = self.observer.take() {
            observer(to);
        }
        transition
    }
}
