//! The parameter tree: a recursive store of named, typed parameters.
//!
//! Nodes are shared (`Rc<RefCell<..>>`) between the editing UI and any number
//! of navigation cursors; the single-threaded cooperative scheduler is what
//! makes the unlocked sharing sound. No operation here returns an error:
//! missing keys yield `None`, never a panic or exception.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::param::ParamValue;

/// Shared handle to one tree node.
pub type ParamNode = Rc<RefCell<ParamEntry>>;

/// A single parameter slot. A slot may hold a value, a namespace of children,
/// both at once (a vector parameter carrying derived sub-parameters), or
/// neither.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParamEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<ParamTree>,
}

impl ParamEntry {
    pub fn with_value(value: ParamValue) -> Self {
        Self {
            value: Some(value),
            children: None,
        }
    }

    pub fn with_children(children: ParamTree) -> Self {
        Self {
            value: None,
            children: Some(children),
        }
    }

    pub fn into_node(self) -> ParamNode {
        Rc::new(RefCell::new(self))
    }

    /// Deep copy of this entry and everything below it.
    pub fn deep_copy(&self) -> ParamEntry {
        ParamEntry {
            value: self.value.clone(),
            children: self.children.as_ref().map(ParamTree::deep_copy),
        }
    }
}

/// Mapping from string keys to entries. Cloning a `ParamTree` clones the
/// handle, not the contents; use [`ParamTree::deep_copy`] for a real copy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamTree {
    entries: Rc<RefCell<BTreeMap<String, ParamNode>>>,
}

impl ParamTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<ParamNode> {
        self.entries.borrow().get(key).cloned()
    }

    /// Insert or replace the entry at `key`, returning its node handle.
    pub fn insert(&self, key: impl Into<String>, entry: ParamEntry) -> ParamNode {
        let node = entry.into_node();
        self.entries
            .borrow_mut()
            .insert(key.into(), node.clone());
        node
    }

    /// Remove a key entirely: value and children go together. Returns the
    /// detached node, if any.
    pub fn remove(&self, key: &str) -> Option<ParamNode> {
        self.entries.borrow_mut().remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    /// Snapshot of the entries, for iteration without holding the borrow.
    pub fn nodes(&self) -> Vec<(String, ParamNode)> {
        self.entries
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// The editor treats integer-keyed children as an ordered collection by
    /// convention. This only observes the convention: true when non-empty and
    /// every key parses as a non-negative integer.
    pub fn looks_like_array(&self) -> bool {
        let entries = self.entries.borrow();
        !entries.is_empty() && entries.keys().all(|k| k.parse::<u32>().is_ok())
    }

    /// Recursively normalize every value in the tree (see
    /// [`ParamValue::clean`]). Applied after deserialization or duplication.
    pub fn clean(&self) {
        for (_, node) in self.nodes() {
            let mut entry = node.borrow_mut();
            if let Some(value) = entry.value.as_mut() {
                value.clean();
            }
            if let Some(children) = entry.children.as_ref() {
                children.clean();
            }
        }
    }

    /// Deep copy of the whole tree, sharing nothing with the original.
    pub fn deep_copy(&self) -> ParamTree {
        let copy = ParamTree::new();
        for (key, node) in self.nodes() {
            copy.insert(key, node.borrow().deep_copy());
        }
        copy
    }

    /// Duplicate-with-normalization, the copy path of the editor.
    pub fn duplicate(&self) -> ParamTree {
        let copy = self.deep_copy();
        copy.clean();
        copy
    }
}
