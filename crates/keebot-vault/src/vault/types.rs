// ── keebot-vault / types ───────────────────────────────────────────────────────
//
// Node payloads, kinds and identifiers for the in-memory vault tree.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ─── Kinds ────────────────────────────────────────────────────────────────────

/// Kind tag carried by every tree item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Group,
    Entry,
    FieldString,
    AutoType,
}

impl ItemKind {
    /// Element name used by the KeePass XML body.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Group => "Group",
            Self::Entry => "Entry",
            Self::FieldString => "String",
            Self::AutoType => "AutoType",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Whether a draft creates a new node or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessKind {
    Add,
    Edit,
}

// ─── Identifiers ──────────────────────────────────────────────────────────────

/// Arena slot of a node inside one [`VaultTree`](super::tree::VaultTree).
///
/// Slots are never reused, so a key held after a delete simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub(crate) usize);

/// KeePass placeholder for "no entry" (`LastTopVisibleEntry`).
pub const NULL_ITEM_ID: &str = "AAAAAAAAAAAAAAAAAAAAAA==";

/// Generate a fresh item identifier: 16 random bytes, padded base64 (24 chars).
pub fn new_item_id() -> String {
    STANDARD.encode(Uuid::new_v4().as_bytes())
}

// ─── Standard field keys ──────────────────────────────────────────────────────

pub const FIELD_TITLE: &str = "Title";
pub const FIELD_USERNAME: &str = "UserName";
pub const FIELD_PASSWORD: &str = "Password";
pub const FIELD_URL: &str = "URL";
pub const FIELD_NOTES: &str = "Notes";
pub const FIELD_NAME: &str = "Name";

/// Entry fields in display order.
pub const ENTRY_FIELDS: [&str; 5] = [FIELD_TITLE, FIELD_USERNAME, FIELD_PASSWORD, FIELD_URL, FIELD_NOTES];

/// Group fields in display order.
pub const GROUP_FIELDS: [&str; 2] = [FIELD_NAME, FIELD_NOTES];

// ─── Payloads ─────────────────────────────────────────────────────────────────

/// Confirmation flag for destructive actions on groups and entries.
///
/// The tree never consults it; the session toggles it between the `Delete`
/// and `ReallyDelete` commands.
pub trait Deletable {
    fn pending_delete(&self) -> bool;
    fn set_pending_delete(&mut self, pending: bool);
}

/// A folder holding ordered child groups and entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    pub notes: String,
    pub icon_id: u32,
    pub pending_delete: bool,
}

impl Group {
    pub fn new(name: impl Into<String>, notes: impl Into<String>, icon_id: u32) -> Self {
        Self {
            name: name.into(),
            notes: notes.into(),
            icon_id,
            pending_delete: false,
        }
    }
}

impl Deletable for Group {
    fn pending_delete(&self) -> bool {
        self.pending_delete
    }

    fn set_pending_delete(&mut self, pending: bool) {
        self.pending_delete = pending;
    }
}

/// A password record; its fields are child [`FieldString`] nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub icon_id: u32,
    pub autotype: AutoTypeSettings,
    pub pending_delete: bool,
}

impl Entry {
    pub fn new(icon_id: u32, autotype: AutoTypeSettings) -> Self {
        Self {
            icon_id,
            autotype,
            pending_delete: false,
        }
    }
}

impl Deletable for Entry {
    fn pending_delete(&self) -> bool {
        self.pending_delete
    }

    fn set_pending_delete(&mut self, pending: bool) {
        self.pending_delete = pending;
    }
}

/// A single `Key = Value` pair inside an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldString {
    pub key: String,
    pub value: Option<String>,
}

impl FieldString {
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn is_title(&self) -> bool {
        self.key == FIELD_TITLE
    }
}

impl fmt::Display for FieldString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.key, self.value.as_deref().unwrap_or(""))
    }
}

/// Window/keystroke association of an auto-type block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoTypeAssociation {
    pub window: String,
    pub keystroke_sequence: String,
}

/// Per-entry auto-type block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoTypeSettings {
    pub enabled: bool,
    pub data_transfer_obfuscation: u32,
    pub association: Option<AutoTypeAssociation>,
}

impl AutoTypeSettings {
    pub const KIND: ItemKind = ItemKind::AutoType;
}

impl Default for AutoTypeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            data_transfer_obfuscation: 0,
            association: None,
        }
    }
}

// ─── Nodes ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Group(Group),
    Entry(Entry),
    Field(FieldString),
}

/// One arena slot: identity, links, paging cursor and payload.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
    /// 1-based page cursor; only meaningful for groups and entries.
    pub page: usize,
    pub data: NodeData,
}

impl Node {
    pub(crate) fn new(id: String, data: NodeData) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            page: 1,
            data,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self.data {
            NodeData::Group(_) => ItemKind::Group,
            NodeData::Entry(_) => ItemKind::Entry,
            NodeData::Field(_) => ItemKind::FieldString,
        }
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    /// Live child count.
    pub fn size(&self) -> usize {
        self.children.len()
    }

    pub fn as_group(&self) -> Option<&Group> {
        match &self.data {
            NodeData::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_entry(&self) -> Option<&Entry> {
        match &self.data {
            NodeData::Entry(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&FieldString> {
        match &self.data {
            NodeData::Field(f) => Some(f),
            _ => None,
        }
    }

    pub(crate) fn deletable(&self) -> Option<&dyn Deletable> {
        match &self.data {
            NodeData::Group(g) => Some(g),
            NodeData::Entry(e) => Some(e),
            NodeData::Field(_) => None,
        }
    }

    pub(crate) fn deletable_mut(&mut self) -> Option<&mut dyn Deletable> {
        match &mut self.data {
            NodeData::Group(g) => Some(g),
            NodeData::Entry(e) => Some(e),
            NodeData::Field(_) => None,
        }
    }
}
