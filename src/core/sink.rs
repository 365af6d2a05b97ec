//! Destination contract and shared destination handles

use super::record::Record;
use parking_lot::{const_mutex, Mutex};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// A consumer of log records: a console, a file, a stream.
///
/// Destinations may be shared by several loggers and called from several
/// threads at once. There is no error channel: a destination deals with its
/// own I/O failures.
///
/// `message` runs while the calling logger's destination set is read-locked:
/// adding, removing or toggling destinations of the same hierarchy from
/// inside it deadlocks (or panics, for a single-threaded hierarchy).
pub trait Sink: Send + Sync {
    /// Consume one record. Call [`Record::message`] only if the text is needed;
    /// the message is produced on first access.
    fn message(&self, record: &Record<'_>);

    fn flush(&self);

    fn name(&self) -> &str {
        "sink"
    }
}

/// Identity of a destination. Every handle over the same allocation gets the
/// same id. Ids increase in the order destinations are first wrapped, which
/// is the order they are visited during dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(u64);

/// Live destinations by allocation address.
///
/// The `Weak` keeps the allocation (not the destination) alive, so an address
/// in this map cannot be handed out to another destination until its entry
/// is pruned.
static REGISTRY: Mutex<BTreeMap<usize, (Weak<dyn Sink>, SinkId)>> =
    const_mutex(BTreeMap::new());

impl SinkId {
    fn of(sink: &Arc<dyn Sink>) -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);

        let address = Arc::as_ptr(sink) as *const () as usize;
        let mut registry = REGISTRY.lock();
        if let Some((_, id)) = registry.get(&address) {
            return *id;
        }

        registry.retain(|_, (weak, _)| weak.strong_count() > 0);
        let id = SinkId(NEXT.fetch_add(1, Ordering::Relaxed));
        registry.insert(address, (Arc::downgrade(sink), id));
        id
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sink#{}", self.0)
    }
}

/// A shareable destination with a stable identity.
///
/// Cloning the handle shares the destination. Handles built from clones of
/// one `Arc` have the same [`SinkId`], so any of them can add, remove or
/// toggle that destination, and adding it twice to a logger is rejected.
#[derive(Clone)]
pub struct SinkHandle {
    id: SinkId,
    sink: Arc<dyn Sink>,
}

impl SinkHandle {
    pub fn new<S: Sink + 'static>(sink: S) -> Self {
        Self::from_arc(Arc::new(sink))
    }

    /// Wrap a destination the caller keeps its own reference to.
    pub fn shared<S: Sink + 'static>(sink: Arc<S>) -> Self {
        Self::from_arc(sink)
    }

    pub fn from_arc(sink: Arc<dyn Sink>) -> Self {
        Self {
            id: SinkId::of(&sink),
            sink,
        }
    }

    #[inline]
    pub fn id(&self) -> SinkId {
        self.id
    }

    #[inline]
    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }
}

impl PartialEq for SinkHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SinkHandle {}

impl fmt::Debug for SinkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkHandle")
            .field("id", &self.id)
            .field("name", &self.sink.name())
            .finish()
    }
}
