//! KeePass XML body writer.
//!
//! Serializes a [`VaultTree`] back into a `KeePassFile` document:
//! - `<Meta>` replayed from the decoded block
//! - `<Root>` holding the root `<Group>` and an empty `<DeletedObjects/>`
//! - bookkeeping fields (`Times`, expansion, auto-type defaults) regenerated
//!
//! Group notes are not written back; `<Notes>` is always empty on groups.

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

use super::error::{VaultError, VaultResult};
use super::tree::VaultTree;
use super::types::*;
use super::xml_reader::{MetaBlock, VaultDocument};

/// Timestamp layout used for every `Times` child.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Encode a decoded document, stamping bookkeeping times with `now`.
pub fn encode_document(doc: &VaultDocument, now: DateTime<Utc>) -> VaultResult<String> {
    encode_tree(&doc.meta, &doc.tree, now)
}

/// Encode `tree` from its root, with `meta` passed through.
///
/// The search overlay is not reachable from the root and is never written.
pub fn encode_tree(meta: &MetaBlock, tree: &VaultTree, now: DateTime<Utc>) -> VaultResult<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 4);
    let stamp = now.format(TIME_FORMAT).to_string();

    write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("utf-8"), Some("yes"))))?;
    write(&mut writer, Event::Start(BytesStart::new("KeePassFile")))?;

    if meta.is_empty() {
        write(&mut writer, Event::Empty(BytesStart::new("Meta")))?;
    } else {
        for event in &meta.events {
            write(&mut writer, event.clone())?;
        }
    }

    write(&mut writer, Event::Start(BytesStart::new("Root")))?;
    write_group(&mut writer, tree, tree.root(), &stamp)?;
    write(&mut writer, Event::Empty(BytesStart::new("DeletedObjects")))?;
    write(&mut writer, Event::End(BytesEnd::new("Root")))?;

    write(&mut writer, Event::End(BytesEnd::new("KeePassFile")))?;

    let result = writer.into_inner().into_inner();
    String::from_utf8(result).map_err(|e| VaultError::Xml(e.to_string()))
}

// ─── Primitives ───────────────────────────────────────────────────────────────

fn write(writer: &mut XmlWriter, event: Event<'_>) -> VaultResult<()> {
    writer
        .write_event(event)
        .map_err(|e| VaultError::Xml(e.to_string()))
}

fn start(writer: &mut XmlWriter, name: &str) -> VaultResult<()> {
    write(writer, Event::Start(BytesStart::new(name)))
}

fn end(writer: &mut XmlWriter, name: &str) -> VaultResult<()> {
    write(writer, Event::End(BytesEnd::new(name)))
}

fn empty(writer: &mut XmlWriter, name: &str) -> VaultResult<()> {
    write(writer, Event::Empty(BytesStart::new(name)))
}

/// `<name>text</name>`, escaped. An empty string still gets both tags.
fn text_element(writer: &mut XmlWriter, name: &str, text: &str) -> VaultResult<()> {
    start(writer, name)?;
    write(writer, Event::Text(BytesText::new(text)))?;
    end(writer, name)
}

fn bool_str(v: bool) -> &'static str {
    if v {
        "True"
    } else {
        "False"
    }
}

fn write_times(writer: &mut XmlWriter, stamp: &str) -> VaultResult<()> {
    start(writer, "Times")?;
    text_element(writer, "CreationTime", stamp)?;
    text_element(writer, "LastModificationTime", stamp)?;
    text_element(writer, "LastAccessTime", stamp)?;
    text_element(writer, "ExpiryTime", stamp)?;
    text_element(writer, "Expires", "False")?;
    text_element(writer, "UsageCount", "0")?;
    text_element(writer, "LocationChanged", stamp)?;
    end(writer, "Times")
}

// ─── Items ────────────────────────────────────────────────────────────────────

fn write_group(writer: &mut XmlWriter, tree: &VaultTree, key: NodeKey, stamp: &str) -> VaultResult<()> {
    let node = tree.get(key)?;
    let group = tree.group(key)?;

    start(writer, "Group")?;
    text_element(writer, "UUID", &node.id)?;
    text_element(writer, "Name", &group.name)?;
    text_element(writer, "Notes", "")?;
    text_element(writer, "IconID", &group.icon_id.to_string())?;
    write_times(writer, stamp)?;
    text_element(writer, "IsExpanded", "True")?;
    text_element(writer, "DefaultAutoTypeSequence", "")?;
    text_element(writer, "EnableAutoType", "null")?;
    text_element(writer, "EnableSearching", "null")?;
    text_element(writer, "LastTopVisibleEntry", NULL_ITEM_ID)?;

    for child in tree.children(key) {
        match tree.kind(*child)? {
            ItemKind::Group => write_group(writer, tree, *child, stamp)?,
            ItemKind::Entry => write_entry(writer, tree, *child, stamp)?,
            _ => {}
        }
    }

    end(writer, "Group")
}

fn write_entry(writer: &mut XmlWriter, tree: &VaultTree, key: NodeKey, stamp: &str) -> VaultResult<()> {
    let node = tree.get(key)?;
    let entry = tree.entry(key)?;

    start(writer, "Entry")?;
    text_element(writer, "UUID", &node.id)?;
    text_element(writer, "IconID", &entry.icon_id.to_string())?;
    empty(writer, "ForegroundColor")?;
    empty(writer, "BackgroundColor")?;
    empty(writer, "OverrideURL")?;
    empty(writer, "Tags")?;
    write_times(writer, stamp)?;

    for child in tree.children(key) {
        if let Some(field) = tree.node(*child).and_then(|n| n.as_field()) {
            write_string(writer, field)?;
        }
    }

    write_autotype(writer, &entry.autotype)?;
    empty(writer, "History")?;
    end(writer, "Entry")
}

fn write_string(writer: &mut XmlWriter, field: &FieldString) -> VaultResult<()> {
    start(writer, "String")?;
    text_element(writer, "Key", &field.key)?;
    match &field.value {
        Some(value) => text_element(writer, "Value", value)?,
        None => empty(writer, "Value")?,
    }
    end(writer, "String")
}

fn write_autotype(writer: &mut XmlWriter, autotype: &AutoTypeSettings) -> VaultResult<()> {
    start(writer, AutoTypeSettings::KIND.tag())?;
    text_element(writer, "Enabled", bool_str(autotype.enabled))?;
    text_element(
        writer,
        "DataTransferObfuscation",
        &autotype.data_transfer_obfuscation.to_string(),
    )?;
    if let Some(association) = &autotype.association {
        start(writer, "Association")?;
        text_element(writer, "Window", &association.window)?;
        text_element(writer, "KeystrokeSequence", &association.keystroke_sequence)?;
        end(writer, "Association")?;
    }
    end(writer, AutoTypeSettings::KIND.tag())
}
