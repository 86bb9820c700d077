// ── keebot-vault / edit ────────────────────────────────────────────────────────
//
// Add/Edit draft for groups and entries: an ordered field map with a cursor,
// committed into the tree by `apply`.

use super::error::{VaultError, VaultResult};
use super::password;
use super::settings::VaultSettings;
use super::tree::VaultTree;
use super::types::*;

/// What a draft is started for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftTarget {
    /// Create a new node of this kind.
    Add(ItemKind),
    /// Edit an existing group or entry.
    Edit(NodeKey),
}

/// In-progress field values for one add/edit workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct EditDraft {
    kind: ItemKind,
    process: ProcessKind,
    target: Option<NodeKey>,
    /// Insertion order is display and navigation order.
    fields: Vec<(String, Option<String>)>,
    required: Vec<String>,
    current_field: String,
}

impl EditDraft {
    /// Start a draft. `Add` accepts only `Group` or `Entry`; `Edit`
    /// pre-populates the fields from the node.
    pub fn start(tree: &VaultTree, target: DraftTarget) -> VaultResult<Self> {
        match target {
            DraftTarget::Add(kind) => Self::new(Some(kind), None),
            DraftTarget::Edit(key) => Self::new(None, Some((tree, key))),
        }
    }

    /// Explicit kind means Add; otherwise the existing node's kind selects Edit.
    pub fn new(kind: Option<ItemKind>, existing: Option<(&VaultTree, NodeKey)>) -> VaultResult<Self> {
        let (kind, process, target) = match kind {
            Some(k @ (ItemKind::Group | ItemKind::Entry)) => (k, ProcessKind::Add, None),
            _ => match existing {
                Some((tree, key)) => (tree.kind(key)?, ProcessKind::Edit, Some(key)),
                None => {
                    return Err(VaultError::InvalidDraft(
                        "choices are (Entry, Group)".to_string(),
                    ))
                }
            },
        };

        let mut draft = match kind {
            ItemKind::Entry => Self::blank(kind, process, &ENTRY_FIELDS, &[FIELD_TITLE, FIELD_PASSWORD]),
            ItemKind::Group => Self::blank(kind, process, &GROUP_FIELDS, &[FIELD_NAME]),
            other => {
                return Err(VaultError::InvalidDraft(format!("{other} cannot be edited")));
            }
        };
        draft.target = target;

        if let (Some(key), Some((tree, _))) = (target, existing) {
            match kind {
                ItemKind::Entry => {
                    for (name, value) in draft.fields.iter_mut() {
                        *value = tree.get_item(key, name).and_then(|f| f.value.clone());
                    }
                }
                _ => {
                    let group = tree.group(key)?;
                    draft.fields[0].1 = Some(group.name.clone());
                    draft.fields[1].1 = Some(group.notes.clone());
                }
            }
        }
        Ok(draft)
    }

    fn blank(kind: ItemKind, process: ProcessKind, fields: &[&str], required: &[&str]) -> Self {
        Self {
            kind,
            process,
            target: None,
            fields: fields.iter().map(|f| (f.to_string(), None)).collect(),
            required: required.iter().map(|f| f.to_string()).collect(),
            current_field: fields[0].to_string(),
        }
    }

    // ─── Accessors ────────────────────────────────────────────────────

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn process(&self) -> ProcessKind {
        self.process
    }

    pub fn target(&self) -> Option<NodeKey> {
        self.target
    }

    pub fn current_field(&self) -> &str {
        &self.current_field
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn value(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn is_required(&self, field: &str) -> bool {
        self.required.iter().any(|r| r == field)
    }

    /// `(field, value)` pairs in field order.
    pub fn raw_strings(&self) -> &[(String, Option<String>)] {
        &self.fields
    }

    // ─── Cursor ───────────────────────────────────────────────────────

    /// Move the cursor to `field`; unknown names leave it in place.
    pub fn set_current_field(&mut self, field: &str) -> bool {
        if self.fields.iter().any(|(name, _)| name == field) {
            self.current_field = field.to_string();
            true
        } else {
            false
        }
    }

    /// Advance the cursor; the last field wraps to the first.
    pub fn next_field(&mut self) {
        let pos = self.cursor_position();
        let next = (pos + 1) % self.fields.len();
        self.current_field = self.fields[next].0.clone();
    }

    /// Step the cursor back; on the first field this is a no-op.
    pub fn prev_field(&mut self) {
        let pos = self.cursor_position();
        if pos > 0 {
            self.current_field = self.fields[pos - 1].0.clone();
        }
    }

    fn cursor_position(&self) -> usize {
        self.fields
            .iter()
            .position(|(name, _)| *name == self.current_field)
            .unwrap_or(0)
    }

    // ─── Values ───────────────────────────────────────────────────────

    /// Write into the field under the cursor.
    pub fn set_value(&mut self, value: impl Into<String>) {
        let current = self.current_field.clone();
        self.set_field(&current, Some(value.into()));
    }

    fn set_field(&mut self, field: &str, value: Option<String>) {
        if let Some((_, v)) = self.fields.iter_mut().find(|(name, _)| name == field) {
            *v = value;
        }
    }

    /// Fill the Password field with a fresh password; the cursor stays put.
    ///
    /// Group drafts have no Password field, so this does nothing for them.
    pub fn generate_password(&mut self, length: usize) {
        let generated = password::generate_password(length);
        self.set_field(FIELD_PASSWORD, Some(generated));
    }

    /// Required fields that are still empty.
    pub fn missing_required(&self) -> Vec<&str> {
        self.required
            .iter()
            .filter(|r| self.value(r).map(str::is_empty).unwrap_or(true))
            .map(String::as_str)
            .collect()
    }

    // ─── Commit ───────────────────────────────────────────────────────

    /// Commit the draft into `tree`, returning the enclosing group, which is
    /// re-activated.
    ///
    /// The enclosing group is found by walking up from the active node.
    /// Adding a group only reads `Name` (`"None"` if never set).
    pub fn apply(self, tree: &mut VaultTree, settings: &VaultSettings) -> VaultResult<NodeKey> {
        let group_key = tree.enclosing_group(tree.active());

        match (self.kind, self.process) {
            (ItemKind::Entry, ProcessKind::Add) => {
                let entry = tree.new_entry(
                    Entry::new(settings.default_entry_icon, AutoTypeSettings::default()),
                    None,
                );
                for (key, value) in self.fields {
                    let field = tree.new_field(FieldString::new(key, value));
                    tree.append(entry, field)?;
                }
                tree.append(group_key, entry)?;
            }
            (ItemKind::Entry, ProcessKind::Edit) => {
                let entry = self.target.unwrap_or(tree.active());
                for (key, value) in self.fields {
                    tree.update_item(entry, &key, value)?;
                }
            }
            (ItemKind::Group, ProcessKind::Add) => {
                let name = self
                    .value(FIELD_NAME)
                    .map(str::to_string)
                    .unwrap_or_else(|| "None".to_string());
                let group = tree.new_group(Group::new(name, "", settings.default_group_icon), None);
                tree.append(group_key, group)?;
            }
            (ItemKind::Group, ProcessKind::Edit) => {
                let target = self.target.unwrap_or(tree.active());
                let name = self.value(FIELD_NAME).unwrap_or_default().to_string();
                let notes = self.value(FIELD_NOTES).unwrap_or_default().to_string();
                let group = tree.group_mut(target)?;
                group.name = name;
                group.notes = notes;
            }
            (other, _) => {
                return Err(VaultError::InvalidDraft(format!("{other} cannot be committed")));
            }
        }

        tree.activate(group_key);
        Ok(group_key)
    }
}
