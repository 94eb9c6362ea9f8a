//! Per-build registry of declared type names.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::common::NodeHash;

/// Outcome of [`NameRegistry::claim`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// A structurally identical declaration is already registered under
    /// this name; no new declaration must be emitted.
    Existing(String),
    /// A fresh name, now taken.
    New(String),
}

/// Unique identifiers handed out during one build.
///
/// A base name that is already taken by a different declaration gets the
/// smallest free numeric suffix, starting at `2`: `Address`, `Address2`,
/// `Address3`.
#[derive(Debug, Default)]
pub struct NameRegistry {
    taken: HashSet<String>,
    by_fingerprint: HashMap<NodeHash, String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declaration by structural fingerprint.
    pub fn claim(&mut self, base: &str, fingerprint: NodeHash) -> Claim {
        if let Some(existing) = self.by_fingerprint.get(&fingerprint) {
            trace!(base, existing = existing.as_str(), "reusing structurally identical type");
            return Claim::Existing(existing.clone());
        }
        let name = self.reserve(base);
        self.by_fingerprint.insert(fingerprint, name.clone());
        Claim::New(name)
    }

    /// Take a fresh name without a fingerprint; see [`settle`](NameRegistry::settle).
    pub fn reserve(&mut self, base: &str) -> String {
        let name = self.next_free(base);
        if name != base {
            trace!(base, name = name.as_str(), "renamed colliding type");
        }
        self.taken.insert(name.clone());
        name
    }

    /// Attach a fingerprint to a name taken earlier with [`reserve`].
    ///
    /// When another declaration already owns the fingerprint that name is
    /// returned as [`Claim::Existing`] and `name` stays taken until it is
    /// [`release`]d.
    ///
    /// [`reserve`]: NameRegistry::reserve
    /// [`release`]: NameRegistry::release
    pub fn settle(&mut self, name: &str, fingerprint: NodeHash) -> Claim {
        if let Some(existing) = self.by_fingerprint.get(&fingerprint) {
            trace!(name, existing = existing.as_str(), "reserved type matches an earlier one");
            return Claim::Existing(existing.clone());
        }
        self.by_fingerprint.insert(fingerprint, name.to_string());
        Claim::New(name.to_string())
    }

    /// Give back a reserved name that ended up without a declaration.
    pub fn release(&mut self, name: &str) {
        if self.taken.remove(name) {
            trace!(name, "released type name");
        }
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    fn next_free(&self, base: &str) -> String {
        if !self.taken.contains(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base}{n}"))
            .find(|candidate| !self.taken.contains(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(value: u64) -> NodeHash {
        NodeHash {
            hash_value: value,
            count: 1,
        }
    }

    #[test]
    fn identical_fingerprints_share_a_name() {
        let mut registry = NameRegistry::new();
        assert_eq!(registry.claim("Address", hash(1)), Claim::New("Address".into()));
        assert_eq!(registry.claim("Location", hash(1)), Claim::Existing("Address".into()));
        assert!(!registry.is_taken("Location"));
    }

    #[test]
    fn different_fingerprints_get_suffixes() {
        let mut registry = NameRegistry::new();
        assert_eq!(registry.claim("Address", hash(1)), Claim::New("Address".into()));
        assert_eq!(registry.claim("Address", hash(2)), Claim::New("Address2".into()));
        assert_eq!(registry.claim("Address", hash(3)), Claim::New("Address3".into()));
        assert_eq!(registry.claim("Address", hash(2)), Claim::Existing("Address2".into()));
    }

    #[test]
    fn reserved_names_are_never_reused() {
        let mut registry = NameRegistry::new();
        assert_eq!(registry.reserve("Node"), "Node");
        assert_eq!(registry.reserve("Node"), "Node2");
        assert_eq!(registry.claim("Node", hash(7)), Claim::New("Node3".into()));
    }

    #[test]
    fn suffix_skips_names_taken_literally() {
        let mut registry = NameRegistry::new();
        registry.reserve("Item2");
        registry.reserve("Item");
        assert_eq!(registry.reserve("Item"), "Item3");
    }

    #[test]
    fn settled_reservations_deduplicate_later_ones() {
        let mut registry = NameRegistry::new();
        let tree = registry.reserve("Tree");
        assert_eq!(registry.settle(&tree, hash(9)), Claim::New("Tree".into()));

        let second = registry.reserve("Tree");
        assert_eq!(second, "Tree2");
        assert_eq!(registry.settle(&second, hash(9)), Claim::Existing("Tree".into()));
        registry.release(&second);
        assert!(!registry.is_taken("Tree2"));
        assert!(registry.is_taken("Tree"));

        assert_eq!(registry.claim("Tree", hash(4)), Claim::New("Tree2".into()));
        assert_eq!(registry.claim("Forest", hash(9)), Claim::Existing("Tree".into()));
    }
}
