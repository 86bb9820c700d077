//! KeePass XML body reader.
//!
//! Decodes the `KeePassFile` document handed over by the container:
//! - `<Meta>` is kept as raw events and written back untouched
//! - `<Root>/<Group>` is walked recursively into a [`VaultTree`]
//! - `<Times>`, `<History>` and any unknown elements are skipped
//!
//! Any decode failure surfaces as [`VaultError::Corruption`].

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;

use super::error::{VaultError, VaultResult};
use super::settings::VaultSettings;
use super::tree::VaultTree;
use super::types::*;

/// Raw `<Meta>` events, replayed verbatim on encode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaBlock {
    pub(crate) events: Vec<Event<'static>>,
}

impl MetaBlock {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// A decoded vault: the pass-through Meta block and the group tree.
#[derive(Debug, Clone)]
pub struct VaultDocument {
    pub meta: MetaBlock,
    pub tree: VaultTree,
}

// ─── Intermediate records ─────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct RawGroup {
    uuid: Option<String>,
    name: Option<String>,
    notes: Option<String>,
    icon_id: Option<u32>,
    children: Vec<RawChild>,
}

#[derive(Debug, Default)]
struct RawEntry {
    uuid: Option<String>,
    icon_id: Option<u32>,
    strings: Vec<FieldString>,
    autotype: Option<AutoTypeSettings>,
}

#[derive(Debug)]
enum RawChild {
    Group(RawGroup),
    Entry(RawEntry),
}

// ─── Public API ───────────────────────────────────────────────────────────────

/// Decode a `KeePassFile` XML body into a document.
pub fn decode_document(xml: &str, settings: &VaultSettings) -> VaultResult<VaultDocument> {
    let (meta, root) = parse_body(xml).map_err(|e| {
        log::warn!("Failed to decode vault XML: {}", e);
        VaultError::Corruption
    })?;
    let root = root.ok_or_else(|| {
        log::warn!("Vault XML has no Root/Group element");
        VaultError::Corruption
    })?;
    let tree = build_tree(root, settings)?;
    log::debug!("Decoded vault with {} items", tree.item_count());
    Ok(VaultDocument { meta, tree })
}

fn parse_body(xml: &str) -> VaultResult<(MetaBlock, Option<RawGroup>)> {
    // Element text is kept as written; the loops below skip whitespace
    // between elements.
    let mut reader = Reader::from_str(xml);

    let mut meta = MetaBlock::default();
    let mut root_group: Option<RawGroup> = None;
    let mut in_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"KeePassFile" => {}
                b"Root" => in_root = true,
                b"Meta" => meta = capture_element(&mut reader, e)?,
                b"Group" if in_root && root_group.is_none() => {
                    root_group = Some(read_group(&mut reader)?);
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(ref e) => {
                if e.name().as_ref() == b"Meta" {
                    meta = MetaBlock {
                        events: vec![Event::Empty(e.clone().into_owned())],
                    };
                }
            }
            Event::End(ref e) => {
                if e.name().as_ref() == b"Root" {
                    in_root = false;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((meta, root_group))
}

// ─── Element readers ──────────────────────────────────────────────────────────

/// Collect `start` and everything up to its matching end tag as owned events.
///
/// Indentation between elements is dropped so the writer can re-indent;
/// whitespace that is an element's whole content is kept.
fn capture_element(reader: &mut Reader<&[u8]>, start: &BytesStart) -> VaultResult<MetaBlock> {
    let mut events = vec![Event::Start(start.clone().into_owned())];
    let mut pending: Option<Event<'static>> = None;
    let mut depth = 1usize;
    while depth > 0 {
        let event = reader.read_event()?.into_owned();
        if matches!(&event, Event::Text(t) if is_blank(t)) {
            pending = Some(event);
            continue;
        }
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if matches!(events.last(), Some(Event::Start(_))) {
                    events.extend(pending.take());
                }
            }
            Event::Eof => return Err(VaultError::Xml("unexpected end of Meta".into())),
            _ => {}
        }
        pending = None;
        events.push(event);
    }
    Ok(MetaBlock { events })
}

fn is_blank(text: &BytesText) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

/// Text content up to the closing tag. Self-closing elements never get here.
fn read_text(reader: &mut Reader<&[u8]>) -> VaultResult<String> {
    let mut text = String::new();
    let mut depth = 0usize;
    loop {
        match reader.read_event()? {
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::CData(c) => {
                let raw = c.into_inner();
                text.push_str(
                    std::str::from_utf8(&raw).map_err(|e| VaultError::Xml(e.to_string()))?,
                );
            }
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => return Ok(text),
            Event::End(_) => depth -= 1,
            Event::Eof => return Err(VaultError::Xml("unexpected end of text element".into())),
            _ => {}
        }
    }
}

fn read_u32(reader: &mut Reader<&[u8]>, what: &str) -> VaultResult<u32> {
    let text = read_text(reader)?;
    text.trim()
        .parse()
        .map_err(|_| VaultError::Xml(format!("invalid {}: {:?}", what, text)))
}

fn read_group(reader: &mut Reader<&[u8]>) -> VaultResult<RawGroup> {
    let mut group = RawGroup::default();
    loop {
        match reader.read_event()? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"UUID" => group.uuid = Some(read_text(reader)?),
                b"Name" => group.name = Some(read_text(reader)?),
                b"Notes" => group.notes = Some(read_text(reader)?),
                b"IconID" => group.icon_id = Some(read_u32(reader, "IconID")?),
                b"Group" => group.children.push(RawChild::Group(read_group(reader)?)),
                b"Entry" => group.children.push(RawChild::Entry(read_entry(reader)?)),
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(ref e) => match e.name().as_ref() {
                b"Name" => group.name = Some(String::new()),
                b"Notes" => group.notes = Some(String::new()),
                _ => {}
            },
            Event::End(ref e) if e.name().as_ref() == b"Group" => return Ok(group),
            Event::Eof => return Err(VaultError::Xml("unexpected end inside Group".into())),
            _ => {}
        }
    }
}

fn read_entry(reader: &mut Reader<&[u8]>) -> VaultResult<RawEntry> {
    let mut entry = RawEntry::default();
    loop {
        match reader.read_event()? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"UUID" => entry.uuid = Some(read_text(reader)?),
                b"IconID" => entry.icon_id = Some(read_u32(reader, "IconID")?),
                b"String" => entry.strings.push(read_string(reader)?),
                b"AutoType" => entry.autotype = Some(read_autotype(reader)?),
                // History holds whole Entry snapshots; never descend into it.
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::End(ref e) if e.name().as_ref() == b"Entry" => return Ok(entry),
            Event::Eof => return Err(VaultError::Xml("unexpected end inside Entry".into())),
            _ => {}
        }
    }
}

fn read_string(reader: &mut Reader<&[u8]>) -> VaultResult<FieldString> {
    let mut key = String::new();
    let mut value = None;
    loop {
        match reader.read_event()? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"Key" => key = read_text(reader)?,
                b"Value" => value = Some(read_text(reader)?),
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(ref e) if e.name().as_ref() == b"Value" => value = None,
            Event::End(ref e) if e.name().as_ref() == b"String" => {
                return Ok(FieldString::new(key, value));
            }
            Event::Eof => return Err(VaultError::Xml("unexpected end inside String".into())),
            _ => {}
        }
    }
}

fn read_autotype(reader: &mut Reader<&[u8]>) -> VaultResult<AutoTypeSettings> {
    let mut autotype = AutoTypeSettings::default();
    loop {
        match reader.read_event()? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"Enabled" => autotype.enabled = parse_bool(&read_text(reader)?),
                b"DataTransferObfuscation" => {
                    autotype.data_transfer_obfuscation = read_u32(reader, "DataTransferObfuscation")?
                }
                b"Association" => autotype.association = Some(read_association(reader)?),
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::End(ref e) if e.name().as_ref() == b"AutoType" => return Ok(autotype),
            Event::Eof => return Err(VaultError::Xml("unexpected end inside AutoType".into())),
            _ => {}
        }
    }
}

fn read_association(reader: &mut Reader<&[u8]>) -> VaultResult<AutoTypeAssociation> {
    let mut association = AutoTypeAssociation {
        window: String::new(),
        keystroke_sequence: String::new(),
    };
    loop {
        match reader.read_event()? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"Window" => association.window = read_text(reader)?,
                b"KeystrokeSequence" => association.keystroke_sequence = read_text(reader)?,
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::End(ref e) if e.name().as_ref() == b"Association" => return Ok(association),
            Event::Eof => return Err(VaultError::Xml("unexpected end inside Association".into())),
            _ => {}
        }
    }
}

fn parse_bool(val: &str) -> bool {
    matches!(val.trim().to_ascii_lowercase().as_str(), "true" | "1")
}

// ─── Tree construction ────────────────────────────────────────────────────────

fn build_tree(root: RawGroup, settings: &VaultSettings) -> VaultResult<VaultTree> {
    let root_id = root.uuid.clone().filter(|s| !s.is_empty()).unwrap_or_else(new_item_id);
    let mut tree = VaultTree::new(root_id, raw_group_payload(&root, settings))
        .with_page_length(settings.page_length);
    let root_key = tree.root();
    append_children(&mut tree, root_key, root.children, settings)?;
    Ok(tree)
}

fn raw_group_payload(raw: &RawGroup, settings: &VaultSettings) -> Group {
    Group::new(
        raw.name.clone().unwrap_or_default(),
        raw.notes.clone().unwrap_or_default(),
        raw.icon_id.unwrap_or(settings.default_group_icon),
    )
}

fn append_children(
    tree: &mut VaultTree,
    parent: NodeKey,
    children: Vec<RawChild>,
    settings: &VaultSettings,
) -> VaultResult<()> {
    for child in children {
        match child {
            RawChild::Group(raw) => {
                let key = tree.new_group(raw_group_payload(&raw, settings), raw.uuid.clone());
                tree.append(parent, key)?;
                append_children(tree, key, raw.children, settings)?;
            }
            RawChild::Entry(raw) => {
                let entry = Entry::new(
                    raw.icon_id.unwrap_or(settings.default_entry_icon),
                    raw.autotype.unwrap_or_default(),
                );
                let key = tree.new_entry(entry, raw.uuid);
                for field in raw.strings {
                    let field_key = tree.new_field(field);
                    tree.append(key, field_key)?;
                }
                tree.append(parent, key)?;
            }
        }
    }
    Ok(())
}
