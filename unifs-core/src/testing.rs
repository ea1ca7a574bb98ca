//! Backends used by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Result, UnifsError};
use crate::matcher::StandardPathMatching;
use crate::path::VirtualPath;
use crate::traits::{
    Backend, PathMatching, Principal, PrincipalKind, PrincipalLookup, WatchEvent, WatchEventKind,
    WatchService, WatchSupport,
};
use crate::types::{MountIdentity, MountOptions};

pub fn id(text: &str) -> MountIdentity {
    MountIdentity::new(text).unwrap()
}

#[derive(Debug, Default)]
pub struct Counters {
    opened: AtomicUsize,
    released: AtomicUsize,
}

impl Counters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

/// Counts `open` and `release` calls.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    counters: Arc<Counters>,
}

impl RecordingBackend {
    pub fn counters(&self) -> Arc<Counters> {
        Arc::clone(&self.counters)
    }

    pub fn opened(&self) -> usize {
        self.counters.opened()
    }

    pub fn released(&self) -> usize {
        self.counters.released()
    }
}

impl Backend for RecordingBackend {
    type Path = VirtualPath;
    type Handle = ();

    fn scheme(&self) -> &str {
        "mem"
    }

    fn open(&self, _identity: &MountIdentity, _options: &MountOptions) -> Result<()> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&self, _identity: &MountIdentity, _handle: &()) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Fails the first `failures` construction attempts.
#[derive(Debug)]
pub struct FlakyBackend {
    failures: usize,
    attempts: AtomicUsize,
}

impl FlakyBackend {
    pub fn failing_first(failures: usize) -> Self {
        Self {
            failures,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Backend for FlakyBackend {
    type Path = VirtualPath;
    type Handle = ();

    fn scheme(&self) -> &str {
        "mem"
    }

    fn open(&self, identity: &MountIdentity, _options: &MountOptions) -> Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err(UnifsError::construction(identity, "connection refused"));
        }
        Ok(())
    }
}

/// Handle whose changes are reported to watch services.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Arc<Mutex<Vec<WatchEvent>>>,
}

impl EventQueue {
    pub fn touch(&self, path: VirtualPath) {
        self.events.lock().push(WatchEvent {
            kind: WatchEventKind::Modified,
            path,
        });
    }
}

struct QueueWatcher {
    events: Arc<Mutex<Vec<WatchEvent>>>,
}

impl WatchService for QueueWatcher {
    fn poll(&mut self) -> Vec<WatchEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

/// Implements every optional capability.
#[derive(Debug, Default)]
pub struct CapableBackend;

impl Backend for CapableBackend {
    type Path = VirtualPath;
    type Handle = EventQueue;

    fn scheme(&self) -> &str {
        "mem"
    }

    fn open(&self, _identity: &MountIdentity, _options: &MountOptions) -> Result<EventQueue> {
        Ok(EventQueue::default())
    }

    fn path_matching(&self) -> Option<&dyn PathMatching> {
        Some(&StandardPathMatching)
    }

    fn principal_lookup(&self) -> Option<&dyn PrincipalLookup> {
        Some(self)
    }

    fn watch_support(&self) -> Option<&dyn WatchSupport<EventQueue>> {
        Some(self)
    }
}

impl PrincipalLookup for CapableBackend {
    fn lookup_user(&self, name: &str) -> Result<Principal> {
        Ok(Principal {
            name: name.to_string(),
            kind: PrincipalKind::User,
        })
    }

    fn lookup_group(&self, name: &str) -> Result<Principal> {
        Ok(Principal {
            name: name.to_string(),
            kind: PrincipalKind::Group,
        })
    }
}

impl WatchSupport<EventQueue> for CapableBackend {
    fn new_watch_service(
        &self,
        _identity: &MountIdentity,
        handle: &EventQueue,
    ) -> Result<Box<dyn WatchService>> {
        Ok(Box::new(QueueWatcher {
            events: Arc::clone(&handle.events),
        }))
    }
}
