// ── keebot-vault / view ────────────────────────────────────────────────────────
//
// Message text and inline keyboards for the active node and for an open
// draft, as plain data for whatever chat SDK sends them.

use serde::{Deserialize, Serialize};

use super::edit::EditDraft;
use super::error::VaultResult;
use super::tree::VaultTree;
use super::types::*;

pub const ARROW_LEFT: &str = "\u{2b05}\u{fe0f}";
pub const ARROW_UP: &str = "\u{2b06}\u{fe0f}";
pub const ARROW_RIGHT: &str = "\u{27a1}\u{fe0f}";
pub const ARROW_DOWN: &str = "\u{2b07}\u{fe0f}";
pub const LOCK: &str = "\u{1f512}";
pub const PENCIL: &str = "\u{270f}\u{fe0f}";
pub const REPEAT: &str = "\u{1f501}";
pub const CROSS: &str = "\u{274c}";
pub const HEAVY_CROSS: &str = "\u{2716}\u{fe0f}";
pub const BACK: &str = "\u{1f519}";
pub const KEY: &str = "\u{1f511}";
pub const FOLDER: &str = "\u{1f4c1}";

const RULE: &str = "_______";

/// A single inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl KeyboardButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Text plus keyboard rows, ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewMessage {
    pub text: String,
    pub keyboard: Vec<Vec<KeyboardButton>>,
}

impl ViewMessage {
    /// Every callback token on the keyboard, row by row.
    pub fn callbacks(&self) -> Vec<&str> {
        self.keyboard
            .iter()
            .flatten()
            .map(|b| b.callback_data.as_str())
            .collect()
    }
}

// ─── Tree view ────────────────────────────────────────────────────────────────

/// Render the active node: header, current page of children, page footer.
pub fn render_tree(tree: &VaultTree) -> VaultResult<ViewMessage> {
    let active = tree.active();
    let kind = tree.kind(active)?;
    let mut text = String::new();

    match kind {
        ItemKind::Entry => {
            text.push_str(&format!("{RULE}{KEY}{}{RULE}\n", tree.entry_name(active)));
            for child in tree.page_items(active) {
                if let Some(field) = tree.node(*child).and_then(|n| n.as_field()) {
                    text.push_str(&format!("{field}\n"));
                }
            }
        }
        _ => {
            text.push_str(&format!("{RULE}{}{RULE}\n", display_name(tree, active)));
            for child in tree.page_items(active) {
                let glyph = match tree.kind(*child)? {
                    ItemKind::Group => FOLDER,
                    _ => KEY,
                };
                text.push_str(&format!("{glyph}{}\n", display_name(tree, *child)));
            }
        }
    }
    text.push_str(&format!(
        "{RULE}Page {} of {}{RULE}\n",
        tree.page(active),
        tree.page_count(active)
    ));

    Ok(ViewMessage {
        text,
        keyboard: tree_keyboard(tree, active, kind)?,
    })
}

fn display_name(tree: &VaultTree, key: NodeKey) -> String {
    let name = tree.name(key);
    if name.is_empty() {
        " ".to_string()
    } else {
        name
    }
}

fn tree_keyboard(tree: &VaultTree, active: NodeKey, kind: ItemKind) -> VaultResult<Vec<Vec<KeyboardButton>>> {
    let mut rows = vec![vec![
        KeyboardButton::new(ARROW_LEFT, "Left"),
        KeyboardButton::new(ARROW_UP, "Back"),
        KeyboardButton::new(LOCK, "Lock"),
        KeyboardButton::new(ARROW_RIGHT, "Right"),
    ]];

    let is_root = active == tree.root();
    if !is_root && tree.pending_delete(active) {
        rows.push(vec![
            KeyboardButton::new(format!("Yes, I am sure{CROSS}"), "ReallyDelete"),
            KeyboardButton::new(format!("No, keep it{BACK}"), "NoDelete"),
        ]);
    } else if tree.search_group().is_none() {
        let delete = if is_root {
            KeyboardButton::new(HEAVY_CROSS, "Nothing")
        } else {
            KeyboardButton::new(CROSS, "Delete")
        };
        rows.push(vec![
            KeyboardButton::new(PENCIL, format!("Edit_{}", tree.get(active)?.id)),
            KeyboardButton::new(REPEAT, "Resend"),
            KeyboardButton::new(ARROW_DOWN, "Download"),
            delete,
        ]);
    }

    if kind == ItemKind::Group {
        for child in tree.page_items(active) {
            rows.push(vec![KeyboardButton::new(
                display_name(tree, *child),
                tree.get(*child)?.id.clone(),
            )]);
        }
    }
    Ok(rows)
}

// ─── Draft view ───────────────────────────────────────────────────────────────

/// Render an open draft; required fields are bold (HTML parse mode).
pub fn render_draft(draft: &EditDraft) -> ViewMessage {
    let mut text = format!("{RULE}{}{RULE}\n", draft.kind());
    for (field, value) in draft.raw_strings() {
        if field == draft.current_field() {
            text.push_str(ARROW_RIGHT);
        } else {
            text.push_str("      ");
        }
        if draft.is_required(field) {
            text.push_str(&format!("<b>{field}</b>: "));
        } else {
            text.push_str(&format!("{field}: "));
        }
        text.push_str(&escape_html(value.as_deref().unwrap_or("")));
        text.push('\n');
    }

    let mut keyboard = vec![vec![
        KeyboardButton::new(ARROW_LEFT, "create_Left"),
        KeyboardButton::new(ARROW_UP, "create_Back"),
        KeyboardButton::new(LOCK, "Lock"),
        KeyboardButton::new(ARROW_RIGHT, "create_Right"),
    ]];
    for field in draft.field_names() {
        let mut row = vec![KeyboardButton::new(field, format!("create_{field}"))];
        if field == FIELD_PASSWORD {
            row.push(KeyboardButton::new("Generate", "create_generate_password"));
        }
        keyboard.push(row);
    }
    keyboard.push(vec![KeyboardButton::new("---Done---", "create_done")]);

    ViewMessage { text, keyboard }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::edit::DraftTarget;

    fn sample(children: usize) -> (VaultTree, NodeKey) {
        let mut tree = VaultTree::new(new_item_id(), Group::new("Root", "", 37)).with_page_length(3);
        let root = tree.root();
        let mail = tree.new_group(Group::new("Mail", "", 37), None);
        tree.append(root, mail).unwrap();
        let mut entry = mail;
        for i in 0..children {
            entry = tree.new_entry(Entry::new(0, AutoTypeSettings::default()), None);
            let title = tree.new_field(FieldString::new(FIELD_TITLE, Some(format!("site{i}"))));
            let pw = tree.new_field(FieldString::new(FIELD_PASSWORD, None));
            tree.append(entry, title).unwrap();
            tree.append(entry, pw).unwrap();
            tree.append(root, entry).unwrap();
        }
        (tree, entry)
    }

    #[test]
    fn root_view_lists_first_page() {
        let (tree, _) = sample(4);
        let view = render_tree(&tree).unwrap();
        let lines: Vec<&str> = view.text.lines().collect();
        assert_eq!(lines[0], "_______Root_______");
        assert_eq!(lines[1], format!("{FOLDER}Mail"));
        assert_eq!(lines[2], format!("{KEY}site0"));
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[4], "_______Page 1 of 2_______");

        let callbacks = view.callbacks();
        assert_eq!(&callbacks[..4], &["Left", "Back", "Lock", "Right"]);
        assert!(callbacks.contains(&"Nothing"));
        assert!(!callbacks.contains(&"Delete"));
        // nav row, action row, three child rows
        assert_eq!(view.keyboard.len(), 5);
    }

    #[test]
    fn entry_view_shows_fields_and_delete() {
        let (mut tree, entry) = sample(1);
        tree.activate(entry);
        let view = render_tree(&tree).unwrap();
        assert!(view.text.starts_with(&format!("_______{KEY}site0_______")));
        assert!(view.text.contains("Title = site0\n"));
        assert!(view.text.contains("Password = \n"));
        let id = tree.get(entry).unwrap().id.clone();
        assert!(view.callbacks().contains(&format!("Edit_{id}").as_str()));
        assert!(view.callbacks().contains(&"Delete"));
        assert_eq!(view.keyboard.len(), 2);
    }

    #[test]
    fn pending_delete_swaps_action_row() {
        let (mut tree, entry) = sample(1);
        tree.activate(entry);
        tree.set_pending_delete(entry, true).unwrap();
        let callbacks = render_tree(&tree).unwrap().callbacks().join(",");
        assert!(callbacks.contains("ReallyDelete,NoDelete"));
        assert!(!callbacks.contains("Resend"));
    }

    #[test]
    fn overlay_hides_action_row() {
        let (mut tree, _) = sample(2);
        tree.search("site1", "Search").unwrap();
        let view = render_tree(&tree).unwrap();
        assert!(view.text.starts_with("_______Search_______"));
        assert!(!view.callbacks().contains(&"Resend"));
        assert_eq!(view.keyboard.len(), 2);
    }

    #[test]
    fn draft_view_marks_cursor_and_required() {
        let (tree, _) = sample(0);
        let mut draft = EditDraft::start(&tree, DraftTarget::Add(ItemKind::Entry)).unwrap();
        draft.set_value("a<b");
        let view = render_draft(&draft);
        let lines: Vec<&str> = view.text.lines().collect();
        assert_eq!(lines[0], "_______Entry_______");
        assert_eq!(lines[1], format!("{ARROW_RIGHT}<b>Title</b>: a&lt;b"));
        assert_eq!(lines[2], "      UserName: ");

        let callbacks = view.callbacks();
        assert_eq!(callbacks.first(), Some(&"create_Left"));
        assert_eq!(callbacks.last(), Some(&"create_done"));
        assert!(view
            .keyboard
            .iter()
            .any(|row| row.len() == 2 && row[1].callback_data == "create_generate_password"));
    }
}
