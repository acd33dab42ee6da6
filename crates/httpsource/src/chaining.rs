//! API Chaining Coordinator (spec §4.8, §3 ChainEdge).

use crate::config::ChainEdge;
use httpsource_core::EndpointId;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::Notify;

#[derive(Debug, Error)]
pub enum ChainingError {
    #[error("chaining edges contain a cycle through endpoint {0}")]
    Cycle(EndpointId),
}

/// One unit of work handed to a child runner: the parent's substitution value.
#[derive(Debug, Clone)]
pub struct ChainWorkItem {
    pub parent: EndpointId,
    pub parent_value: String,
}

/// Resolves the parent-child forest and fans each parent record out to its
/// children's input buffers. Config validation proper is out of scope (spec
/// §1); this coordinator still refuses to construct on a cyclic edge set
/// rather than deadlocking at runtime.
pub struct ChainingCoordinator {
    children_of_parent: HashMap<EndpointId, Vec<EndpointId>>,
    buffers: HashMap<EndpointId, Mutex<VecDeque<ChainWorkItem>>>,
    notifiers: HashMap<EndpointId, Arc<Notify>>,
}

impl ChainingCoordinator {
    pub fn new(edges: Vec<ChainEdge>) -> Result<Self, ChainingError> {
        detect_cycle(&edges)?;

        let mut children_of_parent: HashMap<EndpointId, Vec<EndpointId>> = HashMap::new();
        let mut buffers = HashMap::new();
        let mut notifiers = HashMap::new();
        for edge in edges {
            children_of_parent.entry(edge.parent).or_default().push(edge.child);
            buffers.entry(edge.child).or_insert_with(|| Mutex::new(VecDeque::new()));
            notifiers.entry(edge.child).or_insert_with(|| Arc::new(Notify::new()));
        }

        Ok(Self { children_of_parent, buffers, notifiers })
    }

    pub fn children_of(&self, parent: EndpointId) -> &[EndpointId] {
        self.children_of_parent.get(&parent).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_chaining_parent(&self, endpoint: EndpointId) -> bool {
        self.children_of_parent.contains_key(&endpoint)
    }

    /// A chain child is driven purely by its parent's deliveries rather than
    /// its own fixed poll interval (spec §4.8).
    pub fn is_chain_child(&self, endpoint: EndpointId) -> bool {
        self.buffers.contains_key(&endpoint)
    }

    /// The wakeup a child's runner task awaits instead of sleeping on a
    /// fixed interval.
    pub fn notifier(&self, child: EndpointId) -> Option<Arc<Notify>> {
        self.notifiers.get(&child).cloned()
    }

    /// Delivers one parent record's chaining value to every child of
    /// `parent` (fan-out; each child receives the same value independently).
    /// A `None` value means the chaining pointer missed on this record; the
    /// caller is expected to have already logged a warning and skipped
    /// delivery for it (spec §4.8), so this is simply a no-op here.
    pub fn deliver(&self, parent: EndpointId, parent_value: Option<String>) {
        let Some(value) = parent_value else { return };
        for child in self.children_of(parent) {
            if let Some(buffer) = self.buffers.get(child) {
                buffer.lock().unwrap().push_back(ChainWorkItem {
                    parent,
                    parent_value: value.clone(),
                });
            }
            if let Some(notify) = self.notifiers.get(child) {
                notify.notify_one();
            }
        }
    }

    /// Drains all pending work for `child`; the child runner consumes this
    /// before its own next scheduled poll (spec §4.8).
    pub fn drain(&self, child: EndpointId) -> Vec<ChainWorkItem> {
        match self.buffers.get(&child) {
            Some(buffer) => buffer.lock().unwrap().drain(..).collect(),
            None => Vec::new(),
        }
    }
}

fn detect_cycle(edges: &[ChainEdge]) -> Result<(), ChainingError> {
    let mut adjacency: HashMap<EndpointId, Vec<EndpointId>> = HashMap::new();
    for edge in edges {
        adjacency.entry(edge.parent).or_default().push(edge.child);
    }

    let mut visited = HashSet::new();
    let mut on_stack = HashSet::new();

    for &start in adjacency.keys() {
        if !visited.contains(&start) && has_cycle_from(start, &adjacency, &mut visited, &mut on_stack) {
            return Err(ChainingError::Cycle(start));
        }
    }
    Ok(())
}

fn has_cycle_from(
    node: EndpointId,
    adjacency: &HashMap<EndpointId, Vec<EndpointId>>,
    visited: &mut HashSet<EndpointId>,
    on_stack: &mut HashSet<EndpointId>,
) -> bool {
    visited.insert(node);
    on_stack.insert(node);

    if let Some(children) = adjacency.get(&node) {
        for &child in children {
            if on_stack.contains(&child) {
                return true;
            }
            if !visited.contains(&child) && has_cycle_from(child, adjacency, visited, on_stack) {
                return true;
            }
        }
    }

    on_stack.remove(&node);
    false
}
