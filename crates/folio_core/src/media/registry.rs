//! Per-view registry of media load instances.
//!
//! # Responsibility
//! - Own one [`MediaLoad`] per `(record id, media URI)` key.
//! - Route environment signals and expiry sweeps to the right instance.
//!
//! # Invariants
//! - Mounting an existing key never resets its state.
//! - A changed URI for the same record is a new key with a fresh instance.
//! - Mutation goes through `&mut self`, which serializes updates per key.

use crate::config::DEFAULT_MEDIA_LOAD_TIMEOUT;
use crate::media::state::{MediaLoad, MediaState, SettleObserver, Transition};
use crate::media::MediaError;
use crate::model::record::{ContentRecord, RecordId};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Identity of one media load instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaKey {
    pub record_id: RecordId,
    /// Empty when the record has no media.
    pub uri: String,
}

impl MediaKey {
    pub fn new(record_id: impl Into<RecordId>, uri: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            uri: uri.into(),
        }
    }

    /// Key for the media currently attached to `record`.
    pub fn for_record(record: &ContentRecord) -> Self {
        Self::new(record.id.clone(), record.media_uri().unwrap_or_default())
    }
}

/// Media load instances for one rendered view.
#[derive(Debug)]
pub struct MediaRegistry {
    loads: HashMap<MediaKey, MediaLoad>,
    timeout: Option<Duration>,
}

impl Default for MediaRegistry {
    fn default() -> Self {
        Self::new(Some(DEFAULT_MEDIA_LOAD_TIMEOUT))
    }
}

impl MediaRegistry {
    /// Creates a registry; `timeout = None` leaves loads unbounded.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            loads: HashMap::new(),
            timeout,
        }
    }

    pub fn len(&self) -> usize {
        self.loads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }

    /// Mounts the instance for `key` and dispatches its load.
    ///
    /// Idempotent: an existing key keeps its current state.
    pub fn mount(&mut self, key: MediaKey, now: Instant) -> MediaState {
        if let Some(existing) = self.loads.get(&key) {
            return existing.state();
        }

        let mut load = MediaLoad::new(key.uri.clone(), self.timeout);
        let transition = load.begin(now);
        log_transition(&key, transition);
        let state = load.state();
        self.loads.insert(key, load);
        state
    }

    /// Mounts the media instance for one record and returns its key.
    pub fn mount_record(&mut self, record: &ContentRecord, now: Instant) -> MediaKey {
        let key = MediaKey::for_record(record);
        self.mount(key.clone(), now);
        key
    }

    /// Current state for `key`, `None` when not mounted.
    pub fn state(&self, key: &MediaKey) -> Option<MediaState> {
        self.loads.get(key).map(MediaLoad::state)
    }

    /// Routes the environment success signal.
    pub fn signal_loaded(&mut self, key: &MediaKey) -> Result<Transition, MediaError> {
        let transition = self.load_mut(key)?.mark_loaded();
        log_transition(key, transition);
        Ok(transition)
    }

    /// Routes the environment failure signal.
    pub fn signal_failed(&mut self, key: &MediaKey) -> Result<Transition, MediaError> {
        let transition = self.load_mut(key)?.mark_failed();
        log_transition(key, transition);
        Ok(transition)
    }

    /// Registers the single settle observer for `key`.
    pub fn observe(&mut self, key: &MediaKey, observer: SettleObserver) -> Result<(), MediaError> {
        self.load_mut(key)?.observe(observer)
    }

    /// Settles every overdue `Loading` instance and returns the affected keys.
    pub fn expire_overdue(&mut self, now: Instant) -> Vec<MediaKey> {
        let mut expired = Vec::new();
        for (key, load) in self.loads.iter_mut() {
            let transition = load.expire(now);
            if transition != Transition::Ignored {
                log_transition(key, transition);
                expired.push(key.clone());
            }
        }
        expired.sort();
        expired
    }

    /// Earliest pending deadline, for scheduling the next sweep.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.loads.values().filter_map(MediaLoad::deadline).min()
    }

    /// Drops the instance for `key`; returns whether one existed.
    pub fn unmount(&mut self, key: &MediaKey) -> bool {
        self.loads.remove(key).is_some()
    }

    /// Keeps only instances whose keys are still displayed.
    pub fn retain<'a>(&mut self, displayed: impl IntoIterator<Item = &'a MediaKey>) {
        let keep: HashSet<&MediaKey> = displayed.into_iter().collect();
        self.loads.retain(|key, _| keep.contains(key));
    }

    fn load_mut(&mut self, key: &MediaKey) -> Result<&mut MediaLoad, MediaError> {
        self.loads
            .get_mut(key)
            .ok_or_else(|| MediaError::UnknownKey(key.clone()))
    }
}

fn log_transition(key: &MediaKey, transition: Transition) {
    if let Transition::Moved { from, to } = transition {
        debug!(
            "event=media_transition module=media status=ok record_id={} from={} to={} reason={}",
            key.record_id,
            from.as_str(),
            to.as_str(),
            to.reason().unwrap_or("none")
        );
    }
}
