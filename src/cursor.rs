//! Navigation cursor over a parameter tree.
//!
//! The cursor keeps two parallel lists: `context`, the ordered keys the script
//! has pushed (always rooted at a sentinel), and `stack`, the resolved node
//! handles for a prefix of `context`. When a pushed key does not exist the
//! stack simply stops growing: the cursor is "diverged" and every read yields
//! nothing until matching pops bring the two lists back to the same length.
//! Divergence is a state, not an error; nothing in this module can fail.


use crate::tree::{ParamEntry, ParamNode, ParamTree};

/// Sentinel key occupying the first slot of every context.
pub const ROOT_KEY: &str = "root";

#[derive(Debug)]
pub struct ContextStack {
    context: Vec<String>,
    stack: Vec<ParamNode>,
    root: ParamNode,
}

impl ContextStack {
    pub fn new(root: ParamNode) -> Self {
        let mut cursor = Self {
            context: Vec::new(),
            stack: Vec::new(),
            root,
        };
        cursor.reset();
        cursor
    }

    /// Root the cursor at a value-less entry wrapping the given tree.
    pub fn from_tree(tree: ParamTree) -> Self {
        Self::new(ParamEntry::with_children(tree).into_node())
    }

    /// Restore `context = [root]`, `stack = [root entry]`. Runs at the start
    /// of every lifecycle invocation so a dangling cursor can never leak
    /// across frames.
    pub fn reset(&mut self) {
        self.context.clear();
        self.context.push(ROOT_KEY.to_string());
        self.stack.clear();
        self.stack.push(self.root.clone());
    }

    /// True when every key in `context` resolved to a real entry.
    pub fn is_valid(&self) -> bool {
        self.stack.len() == self.context.len()
    }

    pub fn context(&self) -> &[String] {
        &self.context
    }

    pub fn resolved_len(&self) -> usize {
        self.stack.len()
    }

    /// The entry the cursor points at, or `None` while diverged.
    pub fn current(&self) -> Option<ParamNode> {
        if self.is_valid() {
            self.stack.last().cloned()
        } else {
            None
        }
    }

    fn child_of_top(&self, key: &str) -> Option<ParamNode> {
        let top = self.stack.last()?;
        let entry = top.borrow();
        entry.children.as_ref()?.get(key)
    }

    /// Append `key` to the context. The stack follows only when the cursor is
    /// currently valid and the key resolves; otherwise the push deepens the
    /// divergence and nothing else happens. Once diverged, pushes never
    /// attempt re-resolution.
    pub fn push(&mut self, key: impl Into<String>) {
        let key = key.into();
        let child = if self.is_valid() {
            self.child_of_top(&key)
        } else {
            None
        };
        self.context.push(key);
        if let Some(child) = child {
            self.stack.push(child);
        }
    }

    /// Remove the last pushed key. A no-op at the root. The stack shrinks
    /// only if it was tracking the context, which is exactly what unwinds a
    /// divergence one level at a time.
    pub fn pop(&mut self) {
        if self.context.len() <= 1 {
            return;
        }
        if self.is_valid() {
            self.stack.pop();
        }
        self.context.pop();
    }

    /// Resolve a relative path through the children of the current entry to a
    /// final node. Does not touch `context`/`stack`. Empty paths and any
    /// missing segment yield `None`.
    pub fn resolve_entry(&self, keys: &[String]) -> Option<ParamNode> {
        let (last, prefix) = keys.split_last()?;
        let mut tree = self.current()?.borrow().children.clone()?;
        for key in prefix {
            let next = tree.get(key)?.borrow().children.clone()?;
            tree = next;
        }
        tree.get(last)
    }

    /// Resolve a relative path to the sub-tree of children at its end. An
    /// empty path yields the current entry's own children.
    pub fn resolve_tree(&self, keys: &[String]) -> Option<ParamTree> {
        let mut tree = self.current()?.borrow().children.clone()?;
        for key in keys {
            let next = tree.get(key)?.borrow().children.clone()?;
            tree = next;
        }
        Some(tree)
    }

    /// Number of children at the relative path; 0 when the path is missing.
    pub fn count(&self, keys: &[String]) -> usize {
        self.resolve_tree(keys).map_or(0, |tree| tree.len())
    }
}
