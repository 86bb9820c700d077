//! # keebot-vault: KeePass vault session core
//!
//! In-memory KeePass document tree driven by a chat bot:
//! - **Tree**: groups, entries and field strings with parent links
//! - **Navigation**: active node, per-node paging, back/forward
//! - **Search**: ephemeral "Search" group built from a name match
//! - **Drafts**: add/edit workflow for groups and entries
//! - **XML**: KeePass 2.x `KeePassFile` body decode/encode
//! - **Session**: open, commit, delete, persist through the container and
//!   user-record collaborators

pub mod vault;

pub use vault::*;
