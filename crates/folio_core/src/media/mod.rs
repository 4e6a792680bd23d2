//! Media-load tracking for cards and modals.
//!
//! State lives here instead of in view-local flags so that it can be keyed,
//! queried and tested without a rendering environment.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod registry;
pub mod state;

pub use registry::{MediaKey, MediaRegistry};
pub use state::{MediaErrorReason, MediaLoad, MediaState, SettleObserver, Transition};

/// Media registry/state machine errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// No instance is mounted for this key.
    UnknownKey(MediaKey),
    /// A settle observer is already registered for the instance.
    ObserverAlreadyRegistered,
}

impl Display for MediaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownKey(key) => write!(
                f,
                "media instance not mounted: record={} uri={}",
                key.record_id, key.uri
            ),
            Self::ObserverAlreadyRegistered => {
                write!(f, "settle observer already registered")
            }
        }
    }
}

impl Error for MediaError {}
