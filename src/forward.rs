//! The forwarding table: two mirrored tries behind one API.
//!
//! Mirror invariant: the forward node for `P` holds `[Q]` exactly when the
//! reverse node for `Q` holds `P`. `add` stages every allocation it needs
//! before touching either trie, so a failure at any step leaves the table as
//! it was.

use std::collections::TryReserveError;
use std::fmt;

use tracing::{debug, trace, warn};

use crate::alloc;
use crate::error::{Error, Result};
use crate::numbers::{NumberList, Removal};
use crate::symbol;
use crate::trie::{NodeId, Trie, Undo};
use crate::Config;

/// Everything `add` has to allocate, prepared ahead of the commit.
struct Staged {
    /// New forward payload, `[to]`.
    target: NumberList,
    /// Copy of `from` for the reverse payload.
    source: String,
    reverse_node: NodeId,
    /// Fresh reverse payload when the node had none yet.
    reverse_list: Option<NumberList>,
    reverse_undo: Undo,
}

pub struct ForwardingTable {
    forward: Trie,
    reverse: Trie,
    rules: usize,
}

impl ForwardingTable {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            forward: Trie::with_capacity(config.initial_nodes),
            reverse: Trie::with_capacity(config.initial_nodes),
            rules: 0,
        }
    }

    /// Like [`with_config`](Self::with_config), but reports allocation
    /// failure instead of aborting.
    pub fn try_with_config(config: Config) -> Result<Self> {
        Ok(Self {
            forward: Trie::try_with_capacity(config.initial_nodes)?,
            reverse: Trie::try_with_capacity(config.initial_nodes)?,
            rules: 0,
        })
    }

    /// Number of forwarding rules.
    #[inline]
    pub fn len(&self) -> usize {
        self.rules
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules == 0
    }

    /// Forward every number starting with `from` to the same number with
    /// that prefix replaced by `to`, replacing any earlier rule for `from`.
    ///
    /// Fails on invalid numbers, on `from == to`, and on allocation failure.
    /// On failure nothing changes.
    pub fn add(&mut self, from: &str, to: &str) -> Result<()> {
        for n in [from, to] {
            if !symbol::is_number(n) {
                return Err(Error::InvalidNumber(n.to_owned()));
            }
        }
        if !symbol::are_suitable_for_rewrite(from, to) {
            return Err(Error::SelfForward(from.to_owned()));
        }
        if self.forwarding_of(from) == Some(to) {
            trace!(from, to, "forwarding already present");
            return Ok(());
        }

        let (node, forward_undo) = self.forward.get_or_create_path(from)?;
        let staged = match self.stage(from, to) {
            Ok(staged) => staged,
            Err(e) => {
                warn!(from, to, error = %e, "allocation failed, rolling back forwarding");
                self.forward.rollback(forward_undo);
                return Err(e.into());
            }
        };

        let previous = self.forward.set_payload(node, staged.target);
        if let Some(list) = staged.reverse_list {
            self.reverse.set_payload(staged.reverse_node, list);
        }
        if let Some(list) = self.reverse.payload_mut(staged.reverse_node) {
            list.append_reserved(staged.source);
        }

        // Un-mirror only after the new entry is in place: its payload keeps
        // the pruning below from reaching the new reverse node.
        match previous.as_ref().and_then(NumberList::first) {
            Some(old) => {
                let removal = self.reverse.remove_value(old, from);
                debug_assert_ne!(removal, Removal::Missing, "no reverse entry for {from} under {old}");
                debug!(from, to, replaced = old, "forwarding replaced");
            }
            None => {
                self.rules += 1;
                debug!(from, to, "forwarding added");
            }
        }
        Ok(())
    }

    fn stage(&mut self, from: &str, to: &str) -> std::result::Result<Staged, TryReserveError> {
        let mut target = NumberList::try_with_capacity(1)?;
        target.append_reserved(alloc::copy_number(to)?);
        let source = alloc::copy_number(from)?;

        let (reverse_node, reverse_undo) = self.reverse.get_or_create_path(to)?;
        let reserved = match self.reverse.payload_mut(reverse_node) {
            Some(list) => list.reserve_one().map(|()| None),
            None => NumberList::try_with_capacity(1).map(Some),
        };
        match reserved {
            Ok(reverse_list) => Ok(Staged {
                target,
                source,
                reverse_node,
                reverse_list,
                reverse_undo,
            }),
            Err(e) => {
                self.reverse.rollback(reverse_undo);
                Err(e)
            }
        }
    }

    /// Drop every rule whose `from` starts with `prefix`.
    ///
    /// Invalid or unknown prefixes are a no-op. Returns the number of rules
    /// removed.
    pub fn remove(&mut self, prefix: &str) -> usize {
        if !symbol::is_number(prefix) {
            return 0;
        }
        let Some(path) = self.forward.locate_prune_point(prefix) else {
            trace!(prefix, "nothing to remove");
            return 0;
        };

        let Self {
            forward, reverse, ..
        } = self;
        let mut removed = 0usize;
        forward.delete_subtree_with(path.cut, |targets| {
            for target in &targets {
                let _ = reverse.remove_all_with_prefix(target, prefix);
                removed += 1;
            }
        });
        self.rules -= removed;
        debug!(prefix, removed, "forwardings removed");
        removed
    }

    /// Where `number` is forwarded: one element, the number itself when no
    /// rule applies. Invalid input yields an empty list.
    pub fn get(&self, number: &str) -> Result<NumberList> {
        if !symbol::is_number(number) {
            return Ok(NumberList::new());
        }
        let forwarded = match self.forward.find_longest_payload_prefix(number) {
            Some((targets, depth)) => match targets.first() {
                Some(target) => alloc::splice(target, &number[depth..])?,
                None => alloc::copy_number(number)?,
            },
            None => alloc::copy_number(number)?,
        };
        let mut out = NumberList::try_with_capacity(1)?;
        out.append_reserved(forwarded);
        Ok(out)
    }

    /// Numbers that may be forwarded to `number`, sorted and deduplicated.
    ///
    /// For every prefix of `number` that some rule targets, each source of
    /// such a rule is spliced onto the remaining suffix. `number` itself is
    /// always included. Invalid input yields an empty list.
    pub fn reverse(&self, number: &str) -> Result<NumberList> {
        if !symbol::is_number(number) {
            return Ok(NumberList::new());
        }
        let mut out = NumberList::new();
        for (depth, sources) in self.reverse.payloads_along(number) {
            let tail = &number[depth..];
            for source in sources.iter() {
                out.append(alloc::splice(source, tail)?)?;
            }
        }
        out.append(alloc::copy_number(number)?)?;
        out.sort();
        out.dedup();
        Ok(out)
    }

    /// Target of the rule for exactly `prefix`, if there is one.
    pub fn forwarding_of(&self, prefix: &str) -> Option<&str> {
        if !symbol::is_number(prefix) {
            return None;
        }
        let node = self.forward.find(prefix)?;
        self.forward.payload(node)?.first()
    }

    /// All rules as `(from, to)`, in symbol order of `from`.
    pub fn rules(&self) -> impl Iterator<Item = (String, &str)> + '_ {
        self.forward
            .iter()
            .filter_map(|(from, targets)| targets.first().map(|to| (from, to)))
    }

    /// Drop every rule.
    pub fn clear(&mut self) {
        self.forward.delete_subtree(NodeId::ROOT);
        self.reverse.delete_subtree(NodeId::ROOT);
        self.rules = 0;
        debug!("forwarding table cleared");
    }

    /// Live trie nodes on both sides, the two roots included.
    pub fn node_count(&self) -> usize {
        self.forward.node_count() + self.reverse.node_count()
    }

    /// Approximate heap bytes held by the table.
    pub fn memory_usage(&self) -> usize {
        self.forward.memory_usage() + self.reverse.memory_usage()
    }

    pub fn shrink_to_fit(&mut self) {
        self.forward.shrink_to_fit();
        self.reverse.shrink_to_fit();
    }
}

impl Default for ForwardingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ForwardingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardingTable")
            .field("rules", &self.rules)
            .field("forward_nodes", &self.forward.node_count())
            .field("reverse_nodes", &self.reverse.node_count())
            .finish()
    }
}

#[cfg(test)]
impl ForwardingTable {
    /// Check both tries and the mirror invariant between them.
    pub(crate) fn validate(&self) {
        self.forward.validate();
        self.reverse.validate();

        let mut pairs = 0usize;
        for (from, targets) in self.forward.iter() {
            assert_eq!(targets.len(), 1, "forward payload of {from} must be a single target");
            let to = &targets[0];
            let node = self
                .reverse
                .find(to)
                .unwrap_or_else(|| panic!("no reverse node for {from} -> {to}"));
            let sources = self
                .reverse
                .payload(node)
                .unwrap_or_else(|| panic!("no reverse payload for {from} -> {to}"));
            assert!(sources.contains(&from), "{from} missing from reverse of {to}");
            pairs += 1;
        }
        assert_eq!(pairs, self.rules, "rule count must match forward payloads");

        let mut mirrored = 0usize;
        for (to, sources) in self.reverse.iter() {
            for from in sources.iter() {
                assert_eq!(
                    self.forwarding_of(from),
                    Some(to.as_str()),
                    "reverse entry {from} under {to} has no forward rule"
                );
                mirrored += 1;
            }
        }
        assert_eq!(mirrored, self.rules, "reverse entries must match rule count");
    }

    /// Full observable state, for before/after comparisons.
    pub(crate) fn snapshot(&self) -> (Vec<(String, Vec<String>)>, Vec<(String, Vec<String>)>, usize) {
        let dump = |t: &Trie| -> Vec<(String, Vec<String>)> {
            t.iter()
                .map(|(k, p)| (k, p.iter().map(str::to_owned).collect()))
                .collect()
        };
        (dump(&self.forward), dump(&self.reverse), self.node_count())
    }
}
