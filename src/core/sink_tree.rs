//! Hierarchical destination routing
//!
//! Loggers form a tree. Each node keeps a *local* map of destinations
//! (enabled or disabled) and an *effective* map: the destinations a call on
//! that node actually reaches, each tagged with the node that owns it. The
//! effective map is derived, never edited directly:
//!
//! ```text
//! effective(root) = local enabled entries of root
//! effective(n)    = effective(parent(n))
//!                   + local enabled entries of n (overwriting)
//!                   - local disabled entries of n
//! ```
//!
//! Nodes live in a slab arena and refer to each other by [`NodeId`].
//! Mutations (adding, removing, enabling or disabling a destination, moving
//! or dropping a node) are serialized by the arena's lock. After a mutation
//! the affected subtree is refreshed breadth-first, so every parent's cache is
//! current before any of its children is rebuilt; each node's cache is swapped
//! under that node's own write lock. Dispatch reads only the calling node's
//! cache, so it never waits on the arena and only contends with a refresh
//! that touches the same node.

use super::log_level::LevelFilter;
use super::record::Record;
use super::sink::{Sink, SinkHandle, SinkId};
use super::sync_policy::{LockCell, MultiThreaded, SyncPolicy};
use slab::Slab;
use std::any::Any;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Stable handle of a node in a [`SinkTree`].
///
/// Arena slots are reused once a node is dropped, so an id also carries the
/// generation it was minted with. An id whose node is gone never matches the
/// node that later takes its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u64,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.index)
    }
}

/// A destination as seen by dispatch: who owns it, and at what level.
#[derive(Clone)]
pub struct EffectiveEntry {
    sink: Arc<dyn Sink>,
    owner: NodeId,
    owner_level: LevelFilter,
}

impl EffectiveEntry {
    #[inline]
    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    #[inline]
    pub fn owner(&self) -> NodeId {
        self.owner
    }
}

/// Effective destinations of one node, in [`SinkId`] order.
pub type EffectiveSinks = BTreeMap<SinkId, EffectiveEntry>;

struct LocalEntry {
    handle: SinkHandle,
    enabled: bool,
}

struct Node<P: SyncPolicy> {
    id: NodeId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local: BTreeMap<SinkId, LocalEntry>,
    level: LevelFilter,
    effective: Arc<P::Cell<EffectiveSinks>>,
}

/// Arena of logger nodes sharing one synchronization policy.
pub struct SinkTree<P: SyncPolicy = MultiThreaded> {
    nodes: Arc<P::Cell<Slab<Node<P>>>>,
}

impl<P: SyncPolicy> Clone for SinkTree<P> {
    fn clone(&self) -> Self {
        Self {
            nodes: Arc::clone(&self.nodes),
        }
    }
}

impl<P: SyncPolicy> Default for SinkTree<P> {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup<P: SyncPolicy>(nodes: &Slab<Node<P>>, id: NodeId) -> Option<&Node<P>> {
    nodes.get(id.index).filter(|node| node.id == id)
}

fn lookup_mut<P: SyncPolicy>(nodes: &mut Slab<Node<P>>, id: NodeId) -> Option<&mut Node<P>> {
    nodes.get_mut(id.index).filter(|node| node.id == id)
}

impl<P: SyncPolicy> SinkTree<P> {
    pub fn new() -> Self {
        Self {
            nodes: Arc::new(P::cell(Slab::new())),
        }
    }

    /// Register a node under `parent` (or as a root) and derive its cache.
    ///
    /// The node is removed again when the returned driver is dropped. A
    /// `parent` that is not in this tree is treated as `None`.
    pub fn attach(&self, parent: Option<NodeId>, level: LevelFilter) -> SinkDriver<P> {
        let effective = Arc::new(P::cell(EffectiveSinks::new()));
        let id = {
            let mut nodes = self.nodes.write();
            let parent = parent.filter(|&p| lookup(&*nodes, p).is_some());
            let slot = nodes.vacant_entry();
            let id = NodeId {
                index: slot.key(),
                generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            };
            slot.insert(Node {
                id,
                parent,
                children: Vec::new(),
                local: BTreeMap::new(),
                level: level.clone(),
                effective: Arc::clone(&effective),
            });
            if let Some(parent) = parent {
                nodes[parent.index].children.push(id);
            }
            Self::refresh(&nodes, &[id]);
            id
        };

        SinkDriver {
            tree: self.clone(),
            id,
            level,
            effective,
        }
    }

    /// `true` if both handles refer to the same arena.
    pub fn same_tree(&self, other: &SinkTree<P>) -> bool {
        Arc::ptr_eq(&self.nodes, &other.nodes)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        lookup(&*self.nodes.read(), id).and_then(|node| node.parent)
    }

    pub fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        lookup(&*self.nodes.read(), id)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    fn add_sink(&self, id: NodeId, handle: &SinkHandle) -> bool {
        let mut nodes = self.nodes.write();
        let Some(node) = lookup_mut(&mut *nodes, id) else {
            return false;
        };
        if node.local.contains_key(&handle.id()) {
            return false;
        }
        node.local.insert(
            handle.id(),
            LocalEntry {
                handle: handle.clone(),
                enabled: true,
            },
        );
        Self::refresh(&nodes, &[id]);
        true
    }

    fn remove_sink(&self, id: NodeId, sink: SinkId) -> bool {
        let mut nodes = self.nodes.write();
        let removed =
            lookup_mut(&mut *nodes, id).is_some_and(|node| node.local.remove(&sink).is_some());
        if removed {
            Self::refresh(&nodes, &[id]);
        }
        removed
    }

    fn set_sink_enabled(&self, id: NodeId, sink: SinkId, enabled: bool) -> bool {
        let mut nodes = self.nodes.write();
        let Some(entry) =
            lookup_mut(&mut *nodes, id).and_then(|node| node.local.get_mut(&sink))
        else {
            return false;
        };
        if entry.enabled != enabled {
            entry.enabled = enabled;
            Self::refresh(&nodes, &[id]);
        }
        true
    }

    /// Move `id` under `new_parent` (or make it a root).
    ///
    /// Returns `false`, changing nothing, if either node is unknown or the
    /// move would make a node its own ancestor.
    pub fn set_parent(&self, id: NodeId, new_parent: Option<NodeId>) -> bool {
        let mut nodes = self.nodes.write();
        if lookup(&*nodes, id).is_none() {
            return false;
        }
        if let Some(target) = new_parent {
            let mut cursor = Some(target);
            while let Some(current) = cursor {
                if current == id {
                    return false;
                }
                match lookup(&*nodes, current) {
                    Some(node) => cursor = node.parent,
                    None => return false,
                }
            }
        }

        let old_parent = nodes[id.index].parent;
        if old_parent == new_parent {
            return true;
        }
        if let Some(old) = old_parent {
            nodes[old.index].children.retain(|&child| child != id);
        }
        if let Some(new) = new_parent {
            nodes[new.index].children.push(id);
        }
        nodes[id.index].parent = new_parent;
        Self::refresh(&nodes, &[id]);
        true
    }

    /// Remove `id`, handing its children to its parent first.
    fn detach(&self, id: NodeId) {
        let mut nodes = self.nodes.write();
        let Some(parent) = lookup(&*nodes, id).map(|node| node.parent) else {
            return;
        };

        let children = std::mem::take(&mut nodes[id.index].children);
        for &child in &children {
            nodes[child.index].parent = parent;
        }
        if let Some(parent) = parent {
            let siblings = &mut nodes[parent.index].children;
            siblings.retain(|&child| child != id);
            siblings.extend(children.iter().copied());
        }
        nodes.remove(id.index);
        Self::refresh(&nodes, &children);
    }

    /// Rebuild the caches of `start` and all their descendants, level by level.
    fn refresh(nodes: &Slab<Node<P>>, start: &[NodeId]) {
        let mut queue: VecDeque<NodeId> = start.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            let Some(node) = lookup(nodes, id) else {
                continue;
            };

            let mut effective = match node.parent.and_then(|parent| lookup(nodes, parent)) {
                Some(parent) => parent.effective.read().clone(),
                None => EffectiveSinks::new(),
            };
            for (sink_id, entry) in &node.local {
                if entry.enabled {
                    effective.insert(
                        *sink_id,
                        EffectiveEntry {
                            sink: Arc::clone(entry.handle.sink()),
                            owner: id,
                            owner_level: node.level.clone(),
                        },
                    );
                } else {
                    effective.remove(sink_id);
                }
            }

            *node.effective.write() = effective;
            queue.extend(node.children.iter().copied());
        }
    }
}

/// One logger's handle into its [`SinkTree`].
///
/// Owns the node: dropping the driver splices the node's children onto its
/// parent and removes it from the tree.
pub struct SinkDriver<P: SyncPolicy = MultiThreaded> {
    tree: SinkTree<P>,
    id: NodeId,
    level: LevelFilter,
    effective: Arc<P::Cell<EffectiveSinks>>,
}

impl<P: SyncPolicy> SinkDriver<P> {
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn tree(&self) -> &SinkTree<P> {
        &self.tree
    }

    /// The owning logger's level, shared with the entries this node owns.
    #[inline]
    pub fn level(&self) -> &LevelFilter {
        &self.level
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.tree.parent_of(self.id)
    }

    /// Add a destination to this node. `false` if it is already there.
    pub fn add_sink(&self, handle: &SinkHandle) -> bool {
        self.tree.add_sink(self.id, handle)
    }

    /// Remove a destination from this node. `false` if it was not there.
    ///
    /// A destination inherited from an ancestor is not affected; disable it
    /// locally instead.
    pub fn remove_sink(&self, handle: &SinkHandle) -> bool {
        self.tree.remove_sink(self.id, handle.id())
    }

    /// Enable or disable a destination of this node. `false` if this node has
    /// no entry for it.
    pub fn set_sink_enabled(&self, handle: &SinkHandle, enabled: bool) -> bool {
        self.tree.set_sink_enabled(self.id, handle.id(), enabled)
    }

    /// Move this node under `parent`, or make it a root with `None`.
    ///
    /// `false` if `parent` belongs to another tree or is a descendant.
    pub fn set_parent(&self, parent: Option<&SinkDriver<P>>) -> bool {
        match parent {
            Some(parent) if !self.tree.same_tree(&parent.tree) => false,
            Some(parent) => self.tree.set_parent(self.id, Some(parent.id)),
            None => self.tree.set_parent(self.id, None),
        }
    }

    /// Snapshot of the effective destinations and their owners.
    pub fn effective_sinks(&self) -> Vec<(SinkId, NodeId)> {
        self.effective
            .read()
            .iter()
            .map(|(id, entry)| (*id, entry.owner))
            .collect()
    }

    pub fn has_sinks(&self) -> bool {
        !self.effective.read().is_empty()
    }

    /// Deliver `record` to every effective destination whose owner accepts
    /// its level, in [`SinkId`] order. Returns the number of deliveries.
    ///
    /// A destination that panics is reported on stderr and skipped; the
    /// remaining destinations still receive the record.
    pub fn dispatch(&self, record: &Record<'_>) -> usize {
        let sinks = self.effective.read();
        let mut delivered = 0;

        for (sink_id, entry) in sinks.iter() {
            if !entry.owner_level.enabled(record.level()) {
                continue;
            }

            let result = panic::catch_unwind(AssertUnwindSafe(|| entry.sink.message(record)));
            match result {
                Ok(()) => delivered += 1,
                Err(panic_info) => {
                    eprintln!(
                        "[LOGGER CRITICAL] Sink {} ({}) panicked: {}. \
                         Other sinks continue to function.",
                        sink_id,
                        entry.sink.name(),
                        panic_message(&*panic_info)
                    );
                }
            }
        }

        delivered
    }

    /// Flush every effective destination.
    pub fn flush(&self) {
        for entry in self.effective.read().values() {
            entry.sink.flush();
        }
    }
}

impl<P: SyncPolicy> Drop for SinkDriver<P> {
    fn drop(&mut self) {
        self.tree.detach(self.id);
    }
}

impl<P: SyncPolicy> fmt::Debug for SinkDriver<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkDriver")
            .field("id", &self.id)
            .field("level", &self.level.get())
            .finish()
    }
}

pub(crate) fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sync_policy::SingleThreaded;
    use crate::core::LogLevel;
    use crate::sinks::MemorySink;

    fn sink() -> (Arc<MemorySink>, SinkHandle) {
        let memory = Arc::new(MemorySink::new());
        let handle = SinkHandle::shared(Arc::clone(&memory));
        (memory, handle)
    }

    fn info() -> LevelFilter {
        LevelFilter::new(LogLevel::Info)
    }

    #[test]
    fn test_inheritance_and_transitive_disable() {
        let tree: SinkTree = SinkTree::new();
        let (_, a) = sink();
        let (_, b) = sink();

        let root = tree.attach(None, info());
        assert!(root.add_sink(&a));
        let child = tree.attach(Some(root.id()), info());
        assert_eq!(child.effective_sinks(), vec![(a.id(), root.id())]);

        assert!(child.add_sink(&b));
        assert_eq!(
            child.effective_sinks(),
            vec![(a.id(), root.id()), (b.id(), child.id())]
        );

        assert!(root.set_sink_enabled(&a, false));
        assert!(root.effective_sinks().is_empty());
        assert_eq!(child.effective_sinks(), vec![(b.id(), child.id())]);
    }

    #[test]
    fn test_duplicate_and_unknown_sinks() {
        let tree: SinkTree<SingleThreaded> = SinkTree::new();
        let (_, a) = sink();
        let root = tree.attach(None, info());

        assert!(root.add_sink(&a));
        assert!(!root.add_sink(&a));
        assert!(root.set_sink_enabled(&a, true));
        assert!(root.remove_sink(&a));
        assert!(!root.remove_sink(&a));
        assert!(!root.set_sink_enabled(&a, false));
    }

    #[test]
    fn test_local_override_of_inherited_sink() {
        let tree: SinkTree = SinkTree::new();
        let (_, a) = sink();
        let root = tree.attach(None, info());
        let child = tree.attach(Some(root.id()), info());
        root.add_sink(&a);

        // Unknown locally: cannot be disabled until the child has an entry.
        assert!(!child.set_sink_enabled(&a, false));

        assert!(child.add_sink(&a));
        assert_eq!(child.effective_sinks(), vec![(a.id(), child.id())]);
        assert!(child.set_sink_enabled(&a, false));
        assert!(child.effective_sinks().is_empty());
        assert_eq!(root.effective_sinks(), vec![(a.id(), root.id())]);

        assert!(child.remove_sink(&a));
        assert_eq!(child.effective_sinks(), vec![(a.id(), root.id())]);
    }

    #[test]
    fn test_deep_chain_refreshes_in_order() {
        let tree: SinkTree = SinkTree::new();
        let (_, a) = sink();
        let root = tree.attach(None, info());
        let mut chain = vec![tree.attach(Some(root.id()), info())];
        for _ in 0..20 {
            let parent = chain.last().map(SinkDriver::id);
            chain.push(tree.attach(parent, info()));
        }

        root.add_sink(&a);
        for node in &chain {
            assert_eq!(node.effective_sinks(), vec![(a.id(), root.id())]);
        }
        root.remove_sink(&a);
        assert!(chain.iter().all(|node| !node.has_sinks()));
    }

    #[test]
    fn test_drop_splices_children_onto_parent() {
        let tree: SinkTree = SinkTree::new();
        let (_, a) = sink();
        let (_, b) = sink();
        let (_, c_only) = sink();

        let root = tree.attach(None, info());
        root.add_sink(&a);
        root.add_sink(&b);
        let middle = tree.attach(Some(root.id()), info());
        middle.add_sink(&c_only);
        let leaf = tree.attach(Some(middle.id()), info());
        leaf.add_sink(&b);
        leaf.set_sink_enabled(&b, false);

        assert_eq!(
            leaf.effective_sinks(),
            vec![(a.id(), root.id()), (c_only.id(), middle.id())]
        );

        let middle_id = middle.id();
        drop(middle);
        assert_eq!(leaf.parent(), Some(root.id()));
        assert!(tree.children_of(root.id()).contains(&leaf.id()));
        assert!(!tree.children_of(root.id()).contains(&middle_id));

        let direct = tree.attach(Some(root.id()), info());
        direct.add_sink(&b);
        direct.set_sink_enabled(&b, false);

        let owners = |driver: &SinkDriver| -> Vec<SinkId> {
            driver.effective_sinks().into_iter().map(|(id, _)| id).collect()
        };
        assert_eq!(owners(&leaf), owners(&direct));
        assert_eq!(leaf.effective_sinks(), vec![(a.id(), root.id())]);
    }

    #[test]
    fn test_dropping_root_promotes_children() {
        let tree: SinkTree = SinkTree::new();
        let (_, a) = sink();
        let root = tree.attach(None, info());
        root.add_sink(&a);
        let child = tree.attach(Some(root.id()), info());
        assert!(child.has_sinks());

        drop(root);
        assert_eq!(child.parent(), None);
        assert!(!child.has_sinks());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_set_parent_moves_subtree() {
        let tree: SinkTree = SinkTree::new();
        let (_, a) = sink();
        let (_, b) = sink();
        let left = tree.attach(None, info());
        left.add_sink(&a);
        let right = tree.attach(None, info());
        right.add_sink(&b);
        let node = tree.attach(Some(left.id()), info());
        let below = tree.attach(Some(node.id()), info());

        assert!(node.set_parent(Some(&right)));
        assert_eq!(below.effective_sinks(), vec![(b.id(), right.id())]);

        assert!(node.set_parent(None));
        assert!(!below.has_sinks());
    }

    #[test]
    fn test_set_parent_rejects_cycles_and_foreign_trees() {
        let tree: SinkTree = SinkTree::new();
        let root = tree.attach(None, info());
        let child = tree.attach(Some(root.id()), info());
        let grandchild = tree.attach(Some(child.id()), info());

        assert!(!root.set_parent(Some(&grandchild)));
        assert!(!child.set_parent(Some(&child)));
        assert_eq!(root.parent(), None);

        let other: SinkTree = SinkTree::new();
        let stranger = other.attach(None, info());
        assert!(!child.set_parent(Some(&stranger)));
        assert_eq!(child.parent(), Some(root.id()));
    }

    #[test]
    fn test_stale_id_does_not_reach_reused_slot() {
        let tree: SinkTree = SinkTree::new();
        let root = tree.attach(None, info());
        let gone = tree.attach(Some(root.id()), info());
        let stale = gone.id();
        drop(gone);

        let reused = tree.attach(Some(root.id()), info());
        assert_eq!(reused.id().to_string(), stale.to_string());
        assert_ne!(reused.id(), stale);

        let orphan = tree.attach(Some(stale), info());
        assert_eq!(orphan.parent(), None);
        assert!(!tree.set_parent(stale, None));
        assert_eq!(tree.parent_of(stale), None);
        assert!(tree.children_of(stale).is_empty());
        assert_eq!(reused.parent(), Some(root.id()));
    }

    #[test]
    fn test_panic_message_reads_payload() {
        let literal = panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(&*literal), "boom");

        let formatted = panic::catch_unwind(|| panic!("code {}", 7)).unwrap_err();
        assert_eq!(panic_message(&*formatted), "code 7");
    }

    #[test]
    fn test_dispatch_respects_owner_level() {
        let tree: SinkTree = SinkTree::new();
        let (root_memory, root_sink) = sink();
        let (child_memory, child_sink) = sink();

        let root = tree.attach(None, LevelFilter::new(LogLevel::Warning));
        root.add_sink(&root_sink);
        let child = tree.attach(Some(root.id()), LevelFilter::new(LogLevel::Trace));
        child.add_sink(&child_sink);

        let delivered = child.dispatch(&Record::new(LogLevel::Debug, "debug"));
        assert_eq!(delivered, 1);
        assert_eq!(root_memory.len(), 0);
        assert_eq!(child_memory.lines(), vec!["debug"]);

        let delivered = child.dispatch(&Record::new(LogLevel::Error, "error"));
        assert_eq!(delivered, 2);
        assert_eq!(root_memory.lines(), vec!["error"]);

        root.level().set(LogLevel::Trace);
        assert_eq!(child.dispatch(&Record::new(LogLevel::Trace, "t")), 2);
    }

    struct Exploding;

    impl Sink for Exploding {
        fn message(&self, _record: &Record<'_>) {
            panic!("boom");
        }

        fn flush(&self) {}

        fn name(&self) -> &str {
            "exploding"
        }
    }

    #[test]
    fn test_panicking_sink_is_isolated() {
        let tree: SinkTree = SinkTree::new();
        let bad = SinkHandle::new(Exploding);
        let (memory, good) = sink();
        let root = tree.attach(None, info());
        root.add_sink(&bad);
        root.add_sink(&good);

        assert_eq!(root.dispatch(&Record::new(LogLevel::Info, "still here")), 1);
        assert_eq!(memory.lines(), vec!["still here"]);
    }

    #[test]
    fn test_single_threaded_policy() {
        let tree: SinkTree<SingleThreaded> = SinkTree::new();
        let (memory, a) = sink();
        let root = tree.attach(None, info());
        let child = tree.attach(Some(root.id()), info());
        root.add_sink(&a);

        assert_eq!(child.dispatch(&Record::new(LogLevel::Info, "x")), 1);
        assert_eq!(memory.len(), 1);
        drop(root);
        assert!(!child.has_sinks());
    }
}
