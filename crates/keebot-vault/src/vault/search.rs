// ── keebot-vault / search ──────────────────────────────────────────────────────
//
// Name search over the canonical tree and the ephemeral "Search" group built
// from its matches. Overlay entries are fresh nodes whose children are the
// *same* field nodes as the matched entries, so editing a search result edits
// the canonical data. Matched groups are listed by reference.

use super::error::VaultResult;
use super::tree::VaultTree;
use super::types::*;

impl VaultTree {
    /// Depth-first, case-insensitive substring match on names.
    ///
    /// Groups are tested and then recursed into, so a matching group and its
    /// matching descendants are all reported, each once, in visit order.
    pub fn search_items(&self, term: &str) -> Vec<NodeKey> {
        let needle = term.to_lowercase();
        self.walk(self.root())
            .into_iter()
            .filter(|k| self.name(*k).to_lowercase().contains(&needle))
            .collect()
    }

    /// Build the overlay group for `term` and make it active.
    ///
    /// Its parent is the node that was active before the search, which is
    /// where deactivating the overlay returns to.
    pub fn search(&mut self, term: &str, group_name: &str) -> VaultResult<NodeKey> {
        if self.search_group.is_some() {
            self.clear_search();
        }
        let matches = self.search_items(term);
        let previous = self.active();

        let overlay = self.new_group(Group::new(group_name, "", 37), None);
        self.get_mut(overlay)?.parent = Some(previous);
        self.search_group = Some(overlay);

        for key in matches {
            match self.kind(key)? {
                ItemKind::Entry => {
                    let autotype = self.entry(key)?.autotype.clone();
                    let icon_id = self.entry(key)?.icon_id;
                    let proxy = self.new_entry(Entry::new(icon_id, autotype), None);
                    for field in self.children(key).to_vec() {
                        self.push_alias(proxy, field)?;
                    }
                    self.get_mut(proxy)?.parent = Some(overlay);
                    self.get_mut(overlay)?.children.push(proxy);
                }
                ItemKind::Group => self.push_alias(overlay, key)?,
                _ => {}
            }
        }

        self.activate(overlay);
        log::debug!(
            "Search for {} chars matched {} items",
            term.chars().count(),
            self.size(overlay)
        );
        Ok(overlay)
    }

    pub fn search_group(&self) -> Option<NodeKey> {
        self.search_group
    }

    /// Drop the overlay and the proxy entries it owns.
    ///
    /// If the active node lived inside the overlay, the node that was active
    /// before the search becomes active again.
    pub fn clear_search(&mut self) {
        let Some(overlay) = self.search_group.take() else {
            return;
        };
        let previous = self.parent(overlay).unwrap_or(self.root());
        let active_inside = self.active == overlay || self.parent(self.active) == Some(overlay);
        self.free_subtree(overlay);
        self.reclaim_tail();
        if active_inside || !self.contains(self.active) {
            self.active = if self.contains(previous) { previous } else { self.root() };
        }
    }

    /// Drop overlay children whose canonical node is gone.
    ///
    /// A proxy entry goes with the fields it aliases.
    pub(crate) fn prune_search(&mut self) {
        let Some(overlay) = self.search_group else {
            return;
        };
        let mut live = Vec::new();
        for child in self.children(overlay).to_vec() {
            let owned = self.parent(child) == Some(overlay);
            let stale = !self.contains(child)
                || (owned && self.children(child).iter().any(|f| !self.contains(*f)));
            if !stale {
                live.push(child);
            } else if owned {
                self.free_subtree(child);
            }
        }
        if let Some(o) = self.node_mut(overlay) {
            o.children = live;
        }
    }

    /// Depth-first lookup by identifier, scoped to the overlay when present.
    pub fn get_item_by_uuid(&self, id: &str) -> Option<NodeKey> {
        let scope = self.search_group.unwrap_or(self.root());
        self.walk(scope)
            .into_iter()
            .find(|k| self.node(*k).map(|n| n.id == id).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        tree: VaultTree,
        mail: NodeKey,
        gmail: NodeKey,
        bank: NodeKey,
    }

    fn add_entry(tree: &mut VaultTree, parent: NodeKey, title: &str, password: &str) -> NodeKey {
        let entry = tree.new_entry(Entry::new(0, AutoTypeSettings::default()), None);
        for (k, v) in [(FIELD_TITLE, title), (FIELD_PASSWORD, password)] {
            let f = tree.new_field(FieldString::new(k, Some(v.to_string())));
            tree.append(entry, f).unwrap();
        }
        tree.append(parent, entry).unwrap();
        entry
    }

    fn fixture() -> Fixture {
        let mut tree = VaultTree::new(new_item_id(), Group::new("Root", "", 37));
        let root = tree.root();
        let mail = tree.new_group(Group::new("Mail", "", 37), None);
        tree.append(root, mail).unwrap();
        let gmail = add_entry(&mut tree, mail, "Gmail", "x");
        let bank = add_entry(&mut tree, root, "Bank", "y");
        Fixture { tree, mail, gmail, bank }
    }

    #[test]
    fn search_items_is_dfs_and_case_insensitive() {
        let f = fixture();
        assert_eq!(f.tree.search_items("MAIL"), vec![f.mail, f.gmail]);
        assert_eq!(f.tree.search_items("bank"), vec![f.bank]);
    }

    #[test]
    fn no_match_gives_empty_overlay() {
        let mut f = fixture();
        let overlay = f.tree.search("zzz", "Search").unwrap();
        assert_eq!(f.tree.size(overlay), 0);
        assert_eq!(f.tree.active(), overlay);
        assert_eq!(f.tree.name(overlay), "Search");
    }

    #[test]
    fn overlay_entries_alias_canonical_fields() {
        let mut f = fixture();
        let overlay = f.tree.search("gmail", "Search").unwrap();
        assert_eq!(f.tree.size(overlay), 1);
        let proxy = f.tree.children(overlay)[0];
        assert_ne!(proxy, f.gmail);
        assert_eq!(f.tree.entry_name(proxy), "Gmail");

        f.tree.update_item(proxy, FIELD_PASSWORD, Some("changed".into())).unwrap();
        assert_eq!(
            f.tree.get_item(f.gmail, FIELD_PASSWORD).unwrap().value.as_deref(),
            Some("changed")
        );
        // Canonical tree is structurally untouched.
        assert_eq!(f.tree.size(f.mail), 1);
        assert_eq!(f.tree.parent(f.tree.children(proxy)[0]), Some(f.gmail));
    }

    #[test]
    fn matched_groups_are_referenced() {
        let mut f = fixture();
        let overlay = f.tree.search("mail", "Search").unwrap();
        let children = f.tree.children(overlay).to_vec();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0], f.mail);
        assert_eq!(f.tree.parent(f.mail), Some(f.tree.root()));
    }

    #[test]
    fn deactivating_overlay_restores_previous_active() {
        let mut f = fixture();
        f.tree.activate(f.mail);
        let overlay = f.tree.search("bank", "Search").unwrap();
        let proxy = f.tree.children(overlay)[0];
        f.tree.deactivate(overlay);
        assert_eq!(f.tree.active(), f.mail);
        assert!(f.tree.search_group().is_none());
        assert!(!f.tree.contains(proxy));
        // Canonical fields survive the overlay.
        assert_eq!(f.tree.entry_name(f.bank), "Bank");
    }

    #[test]
    fn deleting_canonical_entry_drops_its_proxy() {
        let mut f = fixture();
        let overlay = f.tree.search("mail", "Search").unwrap();
        assert_eq!(f.tree.size(overlay), 2);
        let proxy = f.tree.children(overlay)[1];

        f.tree.activate(f.mail);
        f.tree.activate(f.gmail);
        f.tree.delete(f.gmail).unwrap();

        assert!(!f.tree.contains(proxy));
        assert_eq!(f.tree.children(overlay), &[f.mail]);
        assert_eq!(f.tree.size(f.mail), 0);
        assert_eq!(f.tree.active(), f.mail);
        for key in f.tree.walk(overlay) {
            assert!(f.tree.children(key).iter().all(|c| f.tree.contains(*c)));
        }
    }

    #[test]
    fn overlay_itself_cannot_be_deleted() {
        let mut f = fixture();
        let overlay = f.tree.search("bank", "Search").unwrap();
        assert!(f.tree.delete(overlay).is_err());
        assert_eq!(f.tree.search_group(), Some(overlay));
        assert_eq!(f.tree.size(overlay), 1);
    }

    #[test]
    fn repeated_searches_reuse_arena_slots() {
        let mut f = fixture();
        let before = f.tree.slot_count();
        for _ in 0..20 {
            let overlay = f.tree.search("a", "Search").unwrap();
            f.tree.deactivate(overlay);
        }
        assert_eq!(f.tree.slot_count(), before);
        assert_eq!(f.tree.item_count(), 4);
    }

    #[test]
    fn uuid_lookup_is_scoped_to_overlay() {
        let mut f = fixture();
        let bank_id = f.tree.get(f.bank).unwrap().id.clone();
        assert_eq!(f.tree.get_item_by_uuid(&bank_id), Some(f.bank));

        let overlay = f.tree.search("gmail", "Search").unwrap();
        assert_eq!(f.tree.get_item_by_uuid(&bank_id), None);
        let proxy = f.tree.children(overlay)[0];
        let proxy_id = f.tree.get(proxy).unwrap().id.clone();
        assert_eq!(f.tree.get_item_by_uuid(&proxy_id), Some(proxy));
    }
}
