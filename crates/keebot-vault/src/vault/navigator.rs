// ── keebot-vault / navigator ───────────────────────────────────────────────────
//
// The single active node and per-node page cursors. Page bounds are derived
// from the live child count on every call.

use super::tree::VaultTree;
use super::types::NodeKey;

impl VaultTree {
    pub fn active(&self) -> NodeKey {
        self.active
    }

    pub fn activate(&mut self, key: NodeKey) {
        if self.contains(key) {
            self.active = key;
        }
    }

    /// Step out of `key`: the active node becomes its parent.
    ///
    /// If the search overlay is active it is discarded first, and the node
    /// that was active before the search takes over. The root has no parent,
    /// so deactivating it leaves the root active.
    pub fn deactivate(&mut self, key: NodeKey) {
        let parent = self.parent(key);
        if self.search_group.is_some() && self.search_group == Some(self.active) {
            self.clear_search();
        }
        if let Some(parent) = parent {
            if self.contains(parent) {
                self.active = parent;
            }
        }
    }

    /// Current 1-based page of `key`.
    pub fn page(&self, key: NodeKey) -> usize {
        self.node(key).map(|n| n.page).unwrap_or(1)
    }

    /// `ceil(size / page_length)`, never below 1.
    pub fn page_count(&self, key: NodeKey) -> usize {
        self.size(key).div_ceil(self.page_length).max(1)
    }

    pub fn next_page(&mut self, key: NodeKey) {
        let size = self.size(key);
        let page_length = self.page_length;
        if let Some(node) = self.node_mut(key) {
            if node.page * page_length < size {
                node.page += 1;
            } else {
                node.page = 1;
            }
        }
    }

    pub fn previous_page(&mut self, key: NodeKey) {
        let last = self.page_count(key);
        if let Some(node) = self.node_mut(key) {
            if node.page > 1 {
                node.page -= 1;
            } else {
                node.page = last;
            }
        }
    }

    /// Children visible on the current page of `key`.
    pub fn page_items(&self, key: NodeKey) -> &[NodeKey] {
        let children = self.children(key);
        let start = (self.page(key).saturating_sub(1) * self.page_length).min(children.len());
        let end = (start + self.page_length).min(children.len());
        &children[start..end]
    }
}

#[cfg(test)]
mod tests {
    use crate::vault::types::*;
    use crate::vault::tree::VaultTree;

    fn tree_with_children(count: usize, page_length: usize) -> VaultTree {
        let mut tree = VaultTree::new(new_item_id(), Group::new("Root", "", 37))
            .with_page_length(page_length);
        let root = tree.root();
        for i in 0..count {
            let g = tree.new_group(Group::new(format!("g{i}"), "", 37), None);
            tree.append(root, g).unwrap();
        }
        tree
    }

    #[test]
    fn next_page_wraps_after_last() {
        let mut tree = tree_with_children(11, 5);
        let root = tree.root();
        assert_eq!(tree.page_count(root), 3);
        tree.next_page(root);
        tree.next_page(root);
        assert_eq!(tree.page(root), 3);
        tree.next_page(root);
        assert_eq!(tree.page(root), 1);
    }

    #[test]
    fn exact_multiple_wraps_on_last_full_page() {
        let mut tree = tree_with_children(10, 5);
        let root = tree.root();
        tree.next_page(root);
        assert_eq!(tree.page(root), 2);
        tree.next_page(root);
        assert_eq!(tree.page(root), 1);
    }

    #[test]
    fn previous_page_wraps_to_last() {
        let mut tree = tree_with_children(11, 5);
        let root = tree.root();
        tree.previous_page(root);
        assert_eq!(tree.page(root), 3);
        tree.previous_page(root);
        assert_eq!(tree.page(root), 2);
    }

    #[test]
    fn empty_container_stays_on_first_page() {
        let mut tree = tree_with_children(0, 5);
        let root = tree.root();
        tree.previous_page(root);
        assert_eq!(tree.page(root), 1);
        tree.next_page(root);
        assert_eq!(tree.page(root), 1);
    }

    #[test]
    fn page_items_slices_children() {
        let mut tree = tree_with_children(7, 3);
        let root = tree.root();
        assert_eq!(tree.page_items(root).len(), 3);
        tree.previous_page(root);
        let last: Vec<String> = tree.page_items(root).iter().map(|k| tree.name(*k)).collect();
        assert_eq!(last, vec!["g6".to_string()]);
    }

    #[test]
    fn deactivate_moves_to_parent_and_root_stays() {
        let mut tree = tree_with_children(1, 5);
        let root = tree.root();
        let child = tree.children(root)[0];
        tree.activate(child);
        assert_eq!(tree.active(), child);
        tree.deactivate(child);
        assert_eq!(tree.active(), root);
        tree.deactivate(root);
        assert_eq!(tree.active(), root);
    }
}
