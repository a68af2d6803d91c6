//! Weighted containment: is a search pattern present somewhere inside a decay
//! tree?
//!
//! A pattern may name an intermediate resonance, or spell out its daughters
//! instead, or mix both. A match at a node has to account for the node's
//! whole weight, and every element of the pattern has to be used.

use tracing::trace;

use crate::particle::ParticleName;

use super::tree::{DecayNode, trees_equal};

/// Tunables for [`contains_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Compare names with a trailing `sig` removed (`B0sig` matches `B0`).
    /// Exact equality via [`trees_equal`] is unaffected.
    pub strip_sig_suffix: bool,
}

impl MatchOptions {
    fn key<'a>(&self, name: &'a ParticleName) -> &'a str {
        if self.strip_sig_suffix {
            name.without_sig_suffix()
        } else {
            name.as_str()
        }
    }

    fn same_name(&self, a: &ParticleName, b: &ParticleName) -> bool {
        self.key(a) == self.key(b)
    }
}

// ─── Public API ─────────────────────────────────────────────────────────────

/// True if `pattern` is present anywhere inside `target`.
pub fn contains(target: &DecayNode, pattern: &DecayNode) -> bool {
    contains_with(target, pattern, MatchOptions::default())
}

/// [`contains`] with explicit options.
pub fn contains_with(target: &DecayNode, pattern: &DecayNode, options: MatchOptions) -> bool {
    let target = target.canonical();
    let pattern = pattern.canonical();
    let found = search(&target, &pattern, options);
    trace!(%target, %pattern, found, "containment");
    found
}

// ─── Core matching functions ─────────────────────────────────────────────────

/// Try `pattern` at `target`, then at every sub-decay below it.
fn search(target: &DecayNode, pattern: &DecayNode, options: MatchOptions) -> bool {
    matches_at(target, pattern, options)
        || target
            .daughters()
            .iter()
            .filter(|d| d.is_decay())
            .any(|d| search(d, pattern, options))
}

/// Does `pattern` describe `target` itself (not something deeper)?
fn matches_at(target: &DecayNode, pattern: &DecayNode, options: MatchOptions) -> bool {
    if !options.same_name(target.name(), pattern.name()) {
        return false;
    }
    if trees_equal(target, pattern) {
        return true;
    }

    let mut pending = Pending::new(pattern.daughters(), options);
    let matched: usize = target
        .daughters()
        .iter()
        .map(|d| match_weight(d, &mut pending))
        .sum();
    let weight = target.weight();
    trace!(
        mother = %target.name(),
        matched,
        weight,
        leftover = pending.len(),
        "weighted sub-match"
    );
    matched == weight && pending.is_empty()
}

/// How much of `node`'s weight the pending elements account for, consuming
/// the elements used.
fn match_weight(node: &DecayNode, pending: &mut Pending<'_>) -> usize {
    if pending.take_name(node.name()) {
        return node.weight();
    }
    let DecayNode::Decay(decay) = node else {
        return 0;
    };
    if pending.take_subtree(node) || pending.take_names(decay.daughters()) {
        return node.weight();
    }
    decay
        .daughters()
        .iter()
        .map(|d| match_weight(d, pending))
        .sum()
}

/// The multiset of pattern elements not yet matched, scoped to a single
/// [`matches_at`] call.
///
/// Leaf entries are matched by name, sub-decay entries by matching at a node
/// with the same mother. Duplicates count individually.
struct Pending<'a> {
    entries: Vec<&'a DecayNode>,
    options: MatchOptions,
}

impl<'a> Pending<'a> {
    fn new(elements: &'a [DecayNode], options: MatchOptions) -> Self {
        Self {
            entries: elements.iter().collect(),
            options,
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First unclaimed leaf entry named `name`.
    fn find_name(&self, name: &ParticleName, claimed: &[usize]) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(i, _)| !claimed.contains(i))
            .find(|(_, entry)| entry.is_leaf() && self.options.same_name(entry.name(), name))
            .map(|(i, _)| i)
    }

    /// Remove one leaf entry named `name`.
    fn take_name(&mut self, name: &ParticleName) -> bool {
        match self.find_name(name, &[]) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    /// Remove one leaf entry per daughter name, or nothing if any is missing.
    fn take_names(&mut self, daughters: &[DecayNode]) -> bool {
        let mut claimed = Vec::with_capacity(daughters.len());
        for daughter in daughters {
            match self.find_name(daughter.name(), &claimed) {
                Some(i) => claimed.push(i),
                None => return false,
            }
        }
        claimed.sort_unstable();
        for i in claimed.into_iter().rev() {
            self.entries.remove(i);
        }
        true
    }

    /// Remove one sub-decay entry that matches at `node`.
    fn take_subtree(&mut self, node: &DecayNode) -> bool {
        let found = self
            .entries
            .iter()
            .position(|entry| entry.is_decay() && matches_at(node, entry, self.options));
        match found {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }
}
