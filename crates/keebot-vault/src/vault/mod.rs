// ── keebot-vault / vault module ────────────────────────────────────────────────
//
// KeePass vault session providing:
//   • Arena-backed group/entry/field tree with ordered children
//   • Navigator (active node, paging, activate/deactivate)
//   • Name search overlay with aliased field strings
//   • Add/Edit draft state machine for groups and entries
//   • KeePass XML body reader and writer (Meta passed through verbatim)
//   • Container and user-record collaborator contracts
//   • Text/keyboard rendering and callback-token dispatch

pub mod types;
pub mod error;
pub mod settings;
pub mod tree;
pub mod navigator;
pub mod search;
pub mod password;
pub mod edit;
pub mod xml_reader;
pub mod xml_writer;
pub mod container;
pub mod store;
pub mod view;
pub mod commands;
pub mod service;

pub use types::*;
pub use error::{VaultError, VaultResult};
pub use settings::VaultSettings;
pub use tree::VaultTree;
pub use edit::{DraftTarget, EditDraft};
pub use xml_reader::{decode_document, MetaBlock, VaultDocument};
pub use xml_writer::{encode_document, encode_tree};
pub use container::{ContainerBackend, ContainerError, ContainerHandle, XmlFileContainer};
pub use store::{JsonFileUserStore, MemoryUserStore, UserRecord, UserStore};
pub use view::{KeyboardButton, ViewMessage};
pub use commands::{Command, CommandOutcome};
pub use service::VaultSession;
