// ── keebot-vault / tree ────────────────────────────────────────────────────────
//
// Arena-backed document tree: groups, entries and field strings with ordered
// children and parent links. Paging and the active node live in `navigator`,
// the search overlay in `search`.

use super::error::{VaultError, VaultResult};
use super::types::*;

/// Default children per page when no settings are supplied.
pub const DEFAULT_PAGE_LENGTH: usize = 10;

/// In-memory vault document plus the navigator state of one session.
#[derive(Debug, Clone)]
pub struct VaultTree {
    nodes: Vec<Option<Node>>,
    root: NodeKey,
    pub(crate) active: NodeKey,
    pub(crate) search_group: Option<NodeKey>,
    pub(crate) page_length: usize,
}

impl VaultTree {
    /// Create a tree holding only a root group; the root is active.
    pub fn new(root_id: impl Into<String>, root: Group) -> Self {
        let root_node = Node::new(root_id.into(), NodeData::Group(root));
        Self {
            nodes: vec![Some(root_node)],
            root: NodeKey(0),
            active: NodeKey(0),
            search_group: None,
            page_length: DEFAULT_PAGE_LENGTH,
        }
    }

    pub fn with_page_length(mut self, page_length: usize) -> Self {
        self.page_length = page_length.max(1);
        self
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn page_length(&self) -> usize {
        self.page_length
    }

    // ─── Lookup ───────────────────────────────────────────────────────

    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key.0).and_then(|n| n.as_ref())
    }

    pub(crate) fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key.0).and_then(|n| n.as_mut())
    }

    /// Like [`node`](Self::node) but a missing slot is an error.
    pub fn get(&self, key: NodeKey) -> VaultResult<&Node> {
        self.node(key)
            .ok_or_else(|| VaultError::NotFound(format!("node #{}", key.0)))
    }

    pub(crate) fn get_mut(&mut self, key: NodeKey) -> VaultResult<&mut Node> {
        self.node_mut(key)
            .ok_or_else(|| VaultError::NotFound(format!("node #{}", key.0)))
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.node(key).is_some()
    }

    pub fn kind(&self, key: NodeKey) -> VaultResult<ItemKind> {
        Ok(self.get(key)?.kind())
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.node(key).map(|n| n.children()).unwrap_or(&[])
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.node(key).and_then(|n| n.parent)
    }

    /// Live child count of a group or entry.
    pub fn size(&self, key: NodeKey) -> usize {
        self.children(key).len()
    }

    pub fn group(&self, key: NodeKey) -> VaultResult<&Group> {
        self.get(key)?
            .as_group()
            .ok_or_else(|| VaultError::NotFound(format!("group #{}", key.0)))
    }

    pub fn group_mut(&mut self, key: NodeKey) -> VaultResult<&mut Group> {
        match &mut self.get_mut(key)?.data {
            NodeData::Group(g) => Ok(g),
            _ => Err(VaultError::NotFound(format!("group #{}", key.0))),
        }
    }

    pub fn entry(&self, key: NodeKey) -> VaultResult<&Entry> {
        self.get(key)?
            .as_entry()
            .ok_or_else(|| VaultError::NotFound(format!("entry #{}", key.0)))
    }

    pub fn entry_mut(&mut self, key: NodeKey) -> VaultResult<&mut Entry> {
        match &mut self.get_mut(key)?.data {
            NodeData::Entry(e) => Ok(e),
            _ => Err(VaultError::NotFound(format!("entry #{}", key.0))),
        }
    }

    /// Group name, entry title, or field key.
    pub fn name(&self, key: NodeKey) -> String {
        match self.node(key).map(|n| &n.data) {
            Some(NodeData::Group(g)) => g.name.clone(),
            Some(NodeData::Entry(_)) => self.entry_name(key),
            Some(NodeData::Field(f)) => f.key.clone(),
            None => String::new(),
        }
    }

    /// Derived entry name: the value of its first `Title` field.
    ///
    /// Read from the children every time, so it can never go stale.
    pub fn entry_name(&self, key: NodeKey) -> String {
        self.get_item(key, FIELD_TITLE)
            .and_then(|f| f.value.clone())
            .unwrap_or_default()
    }

    // ─── Construction ─────────────────────────────────────────────────

    fn alloc(&mut self, id: Option<String>, data: NodeData) -> NodeKey {
        let id = id.filter(|s| !s.is_empty()).unwrap_or_else(new_item_id);
        self.nodes.push(Some(Node::new(id, data)));
        NodeKey(self.nodes.len() - 1)
    }

    /// Allocate a detached group; a missing id gets a fresh one.
    pub fn new_group(&mut self, group: Group, id: Option<String>) -> NodeKey {
        self.alloc(id, NodeData::Group(group))
    }

    pub fn new_entry(&mut self, entry: Entry, id: Option<String>) -> NodeKey {
        self.alloc(id, NodeData::Entry(entry))
    }

    pub fn new_field(&mut self, field: FieldString) -> NodeKey {
        self.alloc(None, NodeData::Field(field))
    }

    /// Attach `child` as the last child of `parent`.
    ///
    /// Groups accept groups and entries; entries accept field strings only.
    /// A child that already has a parent is moved.
    pub fn append(&mut self, parent: NodeKey, child: NodeKey) -> VaultResult<()> {
        let parent_kind = self.kind(parent)?;
        let child_kind = self.kind(child)?;
        match (parent_kind, child_kind) {
            (ItemKind::Group, ItemKind::Group | ItemKind::Entry) => {}
            (ItemKind::Entry, ItemKind::FieldString) => {}
            (ItemKind::Group, _) => {
                return Err(VaultError::TypeConstraint {
                    parent: parent_kind,
                    accepts: "Group or Entry",
                    child: child_kind,
                })
            }
            _ => {
                return Err(VaultError::TypeConstraint {
                    parent: parent_kind,
                    accepts: "FieldString",
                    child: child_kind,
                })
            }
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(VaultError::Unsupported(
                "Cannot move a group into its own descendant".to_string(),
            ));
        }

        if let Some(old_parent) = self.parent(child) {
            if let Some(p) = self.node_mut(old_parent) {
                p.children.retain(|c| *c != child);
            }
        }
        self.get_mut(child)?.parent = Some(parent);
        self.get_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Push `child` into `parent`'s list without re-parenting it.
    ///
    /// Used by the search overlay: the field keeps its canonical owner.
    pub(crate) fn push_alias(&mut self, parent: NodeKey, child: NodeKey) -> VaultResult<()> {
        self.get(child)?;
        self.get_mut(parent)?.children.push(child);
        Ok(())
    }

    fn is_ancestor(&self, ancestor: NodeKey, mut key: NodeKey) -> bool {
        while let Some(parent) = self.parent(key) {
            if parent == ancestor {
                return true;
            }
            key = parent;
        }
        false
    }

    // ─── Field access ─────────────────────────────────────────────────

    /// First field of `entry` whose key matches.
    pub fn get_item_key(&self, entry: NodeKey, key: &str) -> Option<NodeKey> {
        self.children(entry).iter().copied().find(|c| {
            self.node(*c)
                .and_then(|n| n.as_field())
                .map(|f| f.key == key)
                .unwrap_or(false)
        })
    }

    pub fn get_item(&self, entry: NodeKey, key: &str) -> Option<&FieldString> {
        self.get_item_key(entry, key)
            .and_then(|k| self.node(k))
            .and_then(|n| n.as_field())
    }

    /// Replace the value of the first field with a matching key.
    ///
    /// An unknown key is a no-op.
    pub fn update_item(&mut self, entry: NodeKey, key: &str, value: Option<String>) -> VaultResult<()> {
        self.entry(entry)?;
        if let Some(field) = self.get_item_key(entry, key) {
            self.set_field_value(field, value)?;
        }
        Ok(())
    }

    /// Explicit setter for a field's value.
    pub fn set_field_value(&mut self, field: NodeKey, value: Option<String>) -> VaultResult<()> {
        match &mut self.get_mut(field)?.data {
            NodeData::Field(f) => {
                f.value = value;
                Ok(())
            }
            _ => Err(VaultError::NotFound(format!("field #{}", field.0))),
        }
    }

    // ─── Delete ───────────────────────────────────────────────────────

    pub fn pending_delete(&self, key: NodeKey) -> bool {
        self.node(key)
            .and_then(|n| n.deletable())
            .map(|d| d.pending_delete())
            .unwrap_or(false)
    }

    pub fn set_pending_delete(&mut self, key: NodeKey, pending: bool) -> VaultResult<()> {
        let kind = self.kind(key)?;
        self.get_mut(key)?
            .deletable_mut()
            .ok_or_else(|| VaultError::Unsupported(format!("{} cannot be deleted", kind)))?
            .set_pending_delete(pending);
        Ok(())
    }

    /// Deactivate `key`, detach it from its parent and drop its subtree.
    ///
    /// Unconditional: confirmation is the caller's job. The caller also
    /// re-encodes and persists the document afterwards.
    pub fn delete(&mut self, key: NodeKey) -> VaultResult<()> {
        let node = self.get(key)?;
        if node.deletable().is_none() {
            return Err(VaultError::Unsupported(format!("{} cannot be deleted", node.kind())));
        }
        if self.search_group == Some(key) {
            return Err(VaultError::Unsupported("Cannot delete the search results".to_string()));
        }
        let parent = node
            .parent
            .ok_or_else(|| VaultError::Unsupported("Cannot delete the root group".to_string()))?;

        self.deactivate(key);
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != key);
        }
        self.free_subtree(key);

        self.prune_search();
        self.reclaim_tail();
        if !self.contains(self.active) {
            self.active = parent;
        }
        Ok(())
    }

    /// Release `key` and every descendant it owns. Aliased children are kept.
    pub(crate) fn free_subtree(&mut self, key: NodeKey) {
        let Some(node) = self.nodes.get_mut(key.0).and_then(|n| n.take()) else {
            return;
        };
        for child in node.children {
            if self.parent(child) == Some(key) {
                self.free_subtree(child);
            }
        }
    }

    /// Give back trailing slots emptied by a delete or a cleared overlay.
    pub(crate) fn reclaim_tail(&mut self) {
        while matches!(self.nodes.last(), Some(None)) {
            self.nodes.pop();
        }
    }

    /// Number of arena slots, live or not.
    pub fn slot_count(&self) -> usize {
        self.nodes.len()
    }

    // ─── Traversal ────────────────────────────────────────────────────

    /// Walk the parent chain from `key` (inclusive) to the first group.
    pub fn enclosing_group(&self, key: NodeKey) -> NodeKey {
        let mut current = key;
        loop {
            match self.node(current) {
                Some(n) if n.kind() == ItemKind::Group => return current,
                Some(n) => match n.parent {
                    Some(p) => current = p,
                    None => return self.root,
                },
                None => return self.root,
            }
        }
    }

    /// Pre-order walk of groups and entries below `start` (inclusive).
    pub fn walk(&self, start: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(key) = stack.pop() {
            let Some(node) = self.node(key) else { continue };
            if node.kind() == ItemKind::FieldString {
                continue;
            }
            out.push(key);
            if node.kind() == ItemKind::Group {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Number of live groups and entries reachable from the root.
    pub fn item_count(&self) -> usize {
        self.walk(self.root).len()
    }
}
