//! 12-ary trie over phone number symbols.
//!
//! Nodes live in a `NodeArena` and refer to each other by [`NodeId`]. Child
//! slots own their subtree: freeing a node always frees everything below it.
//! The parent index is only a way back up for the deletion walk; it never
//! keeps anything alive.
//!
//! Every walk is iterative, so arbitrarily long numbers cannot exhaust the
//! call stack.

use std::collections::TryReserveError;

use crate::alloc;
use crate::numbers::{NumberList, Removal};
use crate::symbol::{self, SYMBOL_COUNT};

// =============================================================================
// Node handle
// =============================================================================

/// Index of a node slot in the arena. `NULL` marks an empty child slot or a
/// missing parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
    pub const NULL: NodeId = NodeId(usize::MAX);

    #[inline]
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

struct Node {
    payload: Option<NumberList>,
    /// Parent while live, next free slot while on the free list.
    parent: NodeId,
    /// Slot this node occupies in its parent.
    symbol: u8,
    children: [NodeId; SYMBOL_COUNT],
}

impl Node {
    const EMPTY: Node = Node {
        payload: None,
        parent: NodeId::NULL,
        symbol: 0,
        children: [NodeId::NULL; SYMBOL_COUNT],
    };

    #[inline]
    fn first_child(&self) -> Option<NodeId> {
        self.children.iter().copied().find(|c| !c.is_null())
    }

    #[inline]
    fn child_count(&self) -> usize {
        self.children.iter().filter(|c| !c.is_null()).count()
    }
}

// =============================================================================
// Node Arena
// =============================================================================

/// Node storage with an intrusive free list threaded through `parent`.
struct NodeArena {
    nodes: Vec<Node>,
    free_head: NodeId,
    live: usize,
}

impl NodeArena {
    fn with_capacity(n: usize) -> Self {
        let mut nodes = Vec::with_capacity(n.max(1));
        nodes.push(Node::EMPTY);
        Self {
            nodes,
            free_head: NodeId::NULL,
            live: 1,
        }
    }

    fn try_with_capacity(n: usize) -> Result<Self, TryReserveError> {
        let mut nodes = alloc::vec_with_capacity(n.max(1))?;
        nodes.push(Node::EMPTY);
        Ok(Self {
            nodes,
            free_head: NodeId::NULL,
            live: 1,
        })
    }

    #[inline]
    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Allocate a blank node. Reuses a freed slot before growing.
    fn alloc(&mut self) -> Result<NodeId, TryReserveError> {
        alloc::checkpoint()?;
        let id = if self.free_head.is_null() {
            if self.nodes.len() == self.nodes.capacity() {
                self.nodes.try_reserve_exact(self.nodes.capacity().max(1))?;
            }
            self.nodes.push(Node::EMPTY);
            NodeId(self.nodes.len() - 1)
        } else {
            let id = self.free_head;
            self.free_head = self.node(id).parent;
            *self.node_mut(id) = Node::EMPTY;
            id
        };
        self.live += 1;
        Ok(id)
    }

    /// Release a slot and hand back whatever payload it carried.
    fn free(&mut self, id: NodeId) -> Option<NumberList> {
        debug_assert_ne!(id, NodeId::ROOT, "the root is never freed");
        let free_head = self.free_head;
        let node = self.node_mut(id);
        let payload = node.payload.take();
        node.children = [NodeId::NULL; SYMBOL_COUNT];
        node.parent = free_head;
        self.free_head = id;
        self.live -= 1;
        payload
    }

    fn capacity(&self) -> usize {
        self.nodes.capacity()
    }
}

// =============================================================================
// Undo record and prune path
// =============================================================================

/// Where the first node created by [`Trie::get_or_create_path`] was attached.
///
/// Severing that one slot and freeing the subtree below it undoes the whole
/// call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct Undo {
    attach: Option<(NodeId, usize)>,
}

impl Undo {
    pub const NONE: Undo = Undo { attach: None };
}

/// Result of walking a number for removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrunePath {
    /// Node reached by the full number.
    pub end: NodeId,
    /// Highest node whose subtree holds nothing but the path down to `end`
    /// (and whatever hangs below `end`).
    pub cut: NodeId,
}

// =============================================================================
// Trie
// =============================================================================

pub struct Trie {
    arena: NodeArena,
}

impl Trie {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            arena: NodeArena::with_capacity(nodes),
        }
    }

    pub fn try_with_capacity(nodes: usize) -> Result<Self, TryReserveError> {
        Ok(Self {
            arena: NodeArena::try_with_capacity(nodes)?,
        })
    }

    /// Live nodes, root included.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.arena.live
    }

    /// True when only the root remains and it carries nothing.
    pub fn is_empty(&self) -> bool {
        self.arena.live == 1 && self.arena.node(NodeId::ROOT).payload.is_none()
    }

    #[inline]
    pub fn payload(&self, id: NodeId) -> Option<&NumberList> {
        self.arena.node(id).payload.as_ref()
    }

    #[inline]
    pub fn payload_mut(&mut self, id: NodeId) -> Option<&mut NumberList> {
        self.arena.node_mut(id).payload.as_mut()
    }

    /// Install `payload` at `id`, returning the one it replaced.
    pub fn set_payload(&mut self, id: NodeId, payload: NumberList) -> Option<NumberList> {
        self.arena.node_mut(id).payload.replace(payload)
    }

    pub fn take_payload(&mut self, id: NodeId) -> Option<NumberList> {
        self.arena.node_mut(id).payload.take()
    }

    #[inline]
    pub fn child(&self, id: NodeId, symbol: usize) -> NodeId {
        self.arena.node(id).children[symbol]
    }

    #[inline]
    pub fn count_children(&self, id: NodeId) -> usize {
        self.arena.node(id).child_count()
    }

    /// Walk `number` without creating anything.
    pub fn find(&self, number: &str) -> Option<NodeId> {
        let mut node = NodeId::ROOT;
        for s in symbol::symbols(number) {
            node = self.child(node, s);
            if node.is_null() {
                return None;
            }
        }
        Some(node)
    }

    /// Walk `number`, creating missing nodes.
    ///
    /// On allocation failure every node created by this call is freed again
    /// before the error is returned, so the trie is left untouched.
    pub fn get_or_create_path(&mut self, number: &str) -> Result<(NodeId, Undo), TryReserveError> {
        let mut node = NodeId::ROOT;
        let mut undo = Undo::NONE;
        for s in symbol::symbols(number) {
            let child = self.child(node, s);
            if !child.is_null() {
                node = child;
                continue;
            }
            let created = match self.arena.alloc() {
                Ok(id) => id,
                Err(e) => {
                    self.rollback(undo);
                    return Err(e);
                }
            };
            let n = self.arena.node_mut(created);
            n.parent = node;
            n.symbol = s as u8;
            self.arena.node_mut(node).children[s] = created;
            if undo.attach.is_none() {
                undo.attach = Some((node, s));
            }
            node = created;
        }
        Ok((node, undo))
    }

    /// Free everything a [`get_or_create_path`](Self::get_or_create_path)
    /// call created.
    pub fn rollback(&mut self, undo: Undo) {
        let Some((parent, s)) = undo.attach else {
            return;
        };
        let first = self.child(parent, s);
        if !first.is_null() {
            self.delete_subtree(first);
        }
    }

    /// Unlink `id` from its parent. Afterwards `id` is the root of a detached
    /// subtree whose walk stops at `id`.
    fn detach(&mut self, id: NodeId) {
        let node = self.arena.node_mut(id);
        let parent = std::mem::replace(&mut node.parent, NodeId::NULL);
        let s = node.symbol as usize;
        if !parent.is_null() {
            self.arena.node_mut(parent).children[s] = NodeId::NULL;
        }
    }

    /// Free `id` and its whole subtree, dropping payloads.
    pub fn delete_subtree(&mut self, id: NodeId) {
        self.delete_subtree_with(id, drop);
    }

    /// Free `id` and its whole subtree, handing each payload to `on_payload`.
    ///
    /// The root is permanent: passing it clears the trie in place.
    pub fn delete_subtree_with<F>(&mut self, id: NodeId, mut on_payload: F)
    where
        F: FnMut(NumberList),
    {
        if id != NodeId::ROOT {
            self.peel(id, &mut on_payload);
            return;
        }
        for s in 0..SYMBOL_COUNT {
            let child = self.child(NodeId::ROOT, s);
            if !child.is_null() {
                self.peel(child, &mut on_payload);
            }
        }
        if let Some(p) = self.take_payload(NodeId::ROOT) {
            on_payload(p);
        }
    }

    /// Detach `id`, then peel leaves bottom-up: descend to any leaf, free
    /// it, clear its slot in the parent and continue from the parent, until
    /// `id` itself is freed.
    fn peel<F>(&mut self, id: NodeId, on_payload: &mut F)
    where
        F: FnMut(NumberList),
    {
        self.detach(id);
        let mut current = id;
        loop {
            if let Some(child) = self.arena.node(current).first_child() {
                current = child;
                continue;
            }
            let parent = self.arena.node(current).parent;
            let s = self.arena.node(current).symbol as usize;
            if let Some(p) = self.arena.free(current) {
                on_payload(p);
            }
            if parent.is_null() {
                break;
            }
            self.arena.node_mut(parent).children[s] = NodeId::NULL;
            current = parent;
        }
    }

    /// Walk `number` and find where a removal ending at it should cut.
    ///
    /// The cut starts at the first node below the root and moves down past
    /// every node that carries a payload or branches, so cutting there only
    /// discards the single chain leading to `end`.
    pub fn locate_prune_point(&self, number: &str) -> Option<PrunePath> {
        let mut node = NodeId::ROOT;
        let mut cut = NodeId::NULL;
        for s in symbol::symbols(number) {
            let child = self.child(node, s);
            if child.is_null() {
                return None;
            }
            if self.payload(node).is_some() || self.count_children(node) > 1 || cut.is_null() {
                cut = child;
            }
            node = child;
        }
        if cut.is_null() {
            return None;
        }
        Some(PrunePath { end: node, cut })
    }

    /// Free the node at `number`, and the chain above it that only led
    /// there, once it has neither payload nor children.
    pub fn prune_empty(&mut self, number: &str) {
        let Some(path) = self.locate_prune_point(number) else {
            return;
        };
        let end = self.arena.node(path.end);
        if end.payload.is_none() && end.child_count() == 0 {
            self.delete_subtree(path.cut);
        }
    }

    /// Remove the first entry equal to `value` from the payload at `number`,
    /// pruning the node if that empties it.
    pub fn remove_value(&mut self, number: &str, value: &str) -> Removal {
        let Some(id) = self.find(number) else {
            return Removal::Missing;
        };
        let Some(list) = self.payload_mut(id) else {
            return Removal::Missing;
        };
        let removal = list.remove_value(value);
        if removal == Removal::Emptied {
            self.take_payload(id);
            self.prune_empty(number);
        }
        removal
    }

    /// Remove every entry starting with `prefix` from the payload at
    /// `number`, pruning the node if that empties it.
    pub fn remove_all_with_prefix(&mut self, number: &str, prefix: &str) -> Removal {
        let Some(id) = self.find(number) else {
            return Removal::Missing;
        };
        let Some(list) = self.payload_mut(id) else {
            return Removal::Missing;
        };
        let removal = list.remove_all_with_prefix(prefix);
        if removal == Removal::Emptied {
            self.take_payload(id);
            self.prune_empty(number);
        }
        removal
    }

    /// Payload-carrying nodes along `number`, as `(depth, payload)` with
    /// depth counted in symbols from the root.
    pub fn payloads_along<'a>(
        &'a self,
        number: &'a str,
    ) -> impl Iterator<Item = (usize, &'a NumberList)> + 'a {
        let mut node = NodeId::ROOT;
        symbol::symbols(number)
            .map_while(move |s| {
                node = self.child(node, s);
                (!node.is_null()).then_some(node)
            })
            .enumerate()
            .filter_map(move |(i, id)| self.payload(id).map(|p| (i + 1, p)))
    }

    /// Deepest payload on the path of `number`, with its depth.
    pub fn find_longest_payload_prefix<'a>(
        &'a self,
        number: &'a str,
    ) -> Option<(&'a NumberList, usize)> {
        self.payloads_along(number)
            .last()
            .map(|(depth, payload)| (payload, depth))
    }

    /// Iterate over every payload in symbol order of its key.
    pub fn iter(&self) -> Iter<'_> {
        let mut stack = Vec::new();
        if !self.is_empty() {
            stack.push(Frame {
                node: NodeId::ROOT,
                next: 0,
                visited: false,
            });
        }
        Iter {
            trie: self,
            stack,
            key: Vec::new(),
        }
    }

    /// Approximate heap bytes held by the trie.
    pub fn memory_usage(&self) -> usize {
        let payloads: usize = self
            .arena
            .nodes
            .iter()
            .filter_map(|n| n.payload.as_ref())
            .map(NumberList::memory_usage)
            .sum();
        self.arena.capacity() * std::mem::size_of::<Node>() + payloads
    }

    /// Release spare arena capacity. Freed slots in the middle stay on the
    /// free list; trailing ones cannot be returned without renumbering.
    pub fn shrink_to_fit(&mut self) {
        self.arena.nodes.shrink_to_fit();
    }
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Iteration
// =============================================================================

struct Frame {
    node: NodeId,
    next: usize,
    visited: bool,
}

/// Depth-first iterator over `(key, payload)` pairs, keys in symbol order.
pub struct Iter<'a> {
    trie: &'a Trie,
    stack: Vec<Frame>,
    key: Vec<u8>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (String, &'a NumberList);

    fn next(&mut self) -> Option<Self::Item> {
        let trie: &'a Trie = self.trie;
        while let Some(frame) = self.stack.last_mut() {
            let node = trie.arena.node(frame.node);
            if !frame.visited {
                frame.visited = true;
                if let Some(p) = node.payload.as_ref() {
                    let key = self.key.iter().map(|&c| c as char).collect();
                    return Some((key, p));
                }
            }

            let mut descended = false;
            while frame.next < SYMBOL_COUNT {
                let s = frame.next;
                frame.next += 1;
                let child = node.children[s];
                if child.is_null() {
                    continue;
                }
                if let Some(c) = symbol::decode(s) {
                    self.key.push(c);
                }
                self.stack.push(Frame {
                    node: child,
                    next: 0,
                    visited: false,
                });
                descended = true;
                break;
            }

            if !descended {
                let popped = self.stack.pop();
                if popped.is_some_and(|f| f.node != NodeId::ROOT) {
                    self.key.pop();
                }
            }
        }
        None
    }
}

#[cfg(test)]
impl Trie {
    /// Structural checks: parent links agree with child slots, no dead
    /// leaves below the root, and the live count matches what is reachable.
    pub(crate) fn validate(&self) {
        let mut reachable = 0usize;
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            reachable += 1;
            let node = self.arena.node(id);
            if id != NodeId::ROOT {
                assert!(
                    node.payload.is_some() || node.child_count() > 0,
                    "dead node {id:?} left in trie"
                );
            }
            if let Some(p) = &node.payload {
                assert!(!p.is_empty(), "empty payload list at {id:?}");
            }
            for (s, &child) in node.children.iter().enumerate() {
                if child.is_null() {
                    continue;
                }
                let c = self.arena.node(child);
                assert_eq!(c.parent, id, "parent link of {child:?}");
                assert_eq!(c.symbol as usize, s, "symbol of {child:?}");
                stack.push(child);
            }
        }
        assert_eq!(reachable, self.arena.live, "live count must match reachable nodes");
    }
}
