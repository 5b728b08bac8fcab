/* src/signal/node.rs */

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Process-unique identity of a node in the signal graph.
pub(crate) type NodeId = u64;

static NEXT_NODE: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_node_id() -> NodeId {
	NEXT_NODE.fetch_add(1, Ordering::Relaxed)
}

/// A node whose reads can be recorded as a dependency.
pub(crate) trait Source: Send + Sync {
	fn node_id(&self) -> NodeId;
	fn add_dependent(&self, id: NodeId, dependent: Weak<dyn Dependent>);
	fn remove_dependent(&self, id: NodeId);
}

/// A node caching a value computed from other nodes.
pub(crate) trait Dependent: Send + Sync {
	fn node_id(&self) -> NodeId;
	/// Marks the cached value stale and propagates the mark downstream.
	fn invalidate(&self);
	/// Brings the cached value up to date, notifying subscribers if it changed.
	fn refresh(&self);
}

/// The downstream edges of a source.
#[derive(Default)]
pub(crate) struct Dependents {
	entries: Mutex<Vec<(NodeId, Weak<dyn Dependent>)>>,
}

impl Dependents {
	pub(crate) fn add(&self, id: NodeId, dependent: Weak<dyn Dependent>) {
		let mut entries = self.entries.lock();
		if !entries.iter().any(|(existing, _)| *existing == id) {
			entries.push((id, dependent));
		}
	}

	pub(crate) fn remove(&self, id: NodeId) {
		self.entries.lock().retain(|(existing, _)| *existing != id);
	}

	/// Invalidates every live dependent. Dropped dependents are pruned.
	pub(crate) fn invalidate_all(&self) {
		let live: Vec<Arc<dyn Dependent>> = {
			let mut entries = self.entries.lock();
			entries.retain(|(_, weak)| weak.strong_count() > 0);
			entries.iter().filter_map(|(_, weak)| weak.upgrade()).collect()
		};

		// Invalidation may add or remove edges on this node, so the lock is released first.
		for dependent in live {
			dependent.invalidate();
		}
	}

	#[cfg(test)]
	pub(crate) fn len(&self) -> usize {
		self.entries.lock().len()
	}
}
