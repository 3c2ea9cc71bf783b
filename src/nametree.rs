//! A generic trie keyed by domain-name labels, supporting exact match,
//! `*` wildcard fallback, and closest-enclosing-node lookup.
//!
//! Grounded on the teacher's `zones::ZoneRecords` (`src/zones/mod.rs`):
//! the same recursive `children` map plus a `wildcards` fallback, descended
//! label by label from the root of the relative name. Generalized here to
//! an arbitrary value type `T` and to the explicit node-key variants
//! (`Root`/`Namespace`/`Label`) the specification calls for.

use crate::name::Name;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    DuplicateValue,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a value already exists for this key")
    }
}

impl std::error::Error for Error {}

/// The key identifying a node: the sentinel root of a free-standing tree,
/// the anchored origin of a zone, or a single label under its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKey {
    Root,
    Namespace(Name),
    Label(Vec<u8>),
}

pub struct Node<T> {
    key: NodeKey,
    value: Option<T>,
    children: HashMap<Vec<u8>, Node<T>>,
}

impl<T> Node<T> {
    fn new(key: NodeKey, value: Option<T>) -> Node<T> {
        Node {
            key,
            value,
            children: HashMap::new(),
        }
    }

    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn value_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    /// Returns the node's value, initializing it with `T::default()` first
    /// if absent. Used by zone configuration to append a record to
    /// whatever list already lives at a node.
    pub fn value_or_default(&mut self) -> &mut T
    where
        T: Default,
    {
        self.value.get_or_insert_with(T::default)
    }

    /// Inserts (or reuses) the child keyed by `label`, per the promotion
    /// rules in the specification:
    /// - no sibling under `label` -> create one with `value`.
    /// - sibling exists with no value, `value` given -> attach it.
    /// - sibling exists with a value, `value` given -> [`Error::DuplicateValue`].
    /// - sibling exists (with or without a value), no `value` given -> return it unchanged.
    pub fn add_child(&mut self, label: &[u8], value: Option<T>) -> Result<&mut Node<T>, Error> {
        let key = normalize(label);
        if let Some(existing) = self.children.get(&key) {
            if existing.value.is_some() && value.is_some() {
                return Err(Error::DuplicateValue);
            }
        }
        let entry = self
            .children
            .entry(key.clone())
            .or_insert_with(|| Node::new(NodeKey::Label(key), None));
        if entry.value.is_none() {
            if let Some(v) = value {
                entry.value = Some(v);
            }
        }
        Ok(entry)
    }

    pub fn child(&self, label: &[u8]) -> Option<&Node<T>> {
        self.children.get(&normalize(label))
    }

    pub fn child_mut(&mut self, label: &[u8]) -> Option<&mut Node<T>> {
        self.children.get_mut(&normalize(label))
    }

    /// Walks one label at a time, exact match first and falling back to
    /// the literal `*` child, returning the deepest node reached.
    fn descend<'a, 'n>(&'a self, mut labels: impl Iterator<Item = &'n [u8]>) -> &'a Node<T> {
        match labels.next() {
            None => self,
            Some(label) => {
                let key = normalize(label);
                if let Some(child) = self.children.get(&key) {
                    child.descend(labels)
                } else if let Some(wildcard) = self.children.get(WILDCARD) {
                    wildcard.descend(labels)
                } else {
                    self
                }
            }
        }
    }
}

const WILDCARD: &[u8] = b"*";

fn normalize(label: &[u8]) -> Vec<u8> {
    label.to_ascii_lowercase()
}

/// A free-standing or zone-anchored trie.
pub struct NameTree<T> {
    root: Node<T>,
}

impl<T> NameTree<T> {
    pub fn new_root() -> NameTree<T> {
        NameTree {
            root: Node::new(NodeKey::Root, None),
        }
    }

    pub fn new_namespace(name: Name) -> NameTree<T> {
        NameTree {
            root: Node::new(NodeKey::Namespace(name), None),
        }
    }

    pub fn root(&self) -> &Node<T> {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node<T> {
        &mut self.root
    }

    /// Walks the tree following `name`'s labels TLD-down, returning the
    /// deepest node reached (possibly the root itself, possibly a node
    /// with no value -- callers interpret that as "zone cut but no RR at
    /// this exact name").
    pub fn find(&self, name: &Name) -> &Node<T> {
        self.root.descend(name.labels_reverse())
    }

    /// Like [`NameTree::find`], but walks only the labels of `name`
    /// strictly below `origin` (see [`Name::iter_context`]).
    pub fn find_with_context(
        &self,
        name: &Name,
        origin: &Name,
    ) -> Result<&Node<T>, crate::name::Error> {
        match name.iter_context(origin)? {
            None => Ok(&self.root),
            Some(labels) => Ok(self.root.descend(labels.into_iter())),
        }
    }
}
