//! Error types for the vault crate.

use thiserror::Error;

use super::types::ItemKind;

/// Message shown when the container rejects the master key.
pub const AUTHENTICATION_MESSAGE: &str = "Master password or key-file wrong";

/// Message shown when the container content cannot be decoded.
pub const CORRUPTION_MESSAGE: &str = "Critical error, please report to administrator.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// A tree operation was attempted before a document was loaded.
    #[error("Database not opened")]
    NotOpen,
    /// Wrong password or key file reported by the container.
    #[error("{}", AUTHENTICATION_MESSAGE)]
    Authentication,
    /// Undecodable container or document content.
    #[error("{}", CORRUPTION_MESSAGE)]
    Corruption,
    /// A node of the wrong kind was appended.
    #[error("{parent} accepts only {accepts} items, got {child}")]
    TypeConstraint {
        parent: ItemKind,
        accepts: &'static str,
        child: ItemKind,
    },
    /// Draft constructed without a usable target.
    #[error("Invalid draft: {0}")]
    InvalidDraft(String),
    /// Operation not allowed on this node.
    #[error("{0}")]
    Unsupported(String),
    /// Node or record lookup failed.
    #[error("Not found: {0}")]
    NotFound(String),
    /// XML encode/decode error
    #[error("XML error: {0}")]
    Xml(String),
    /// User-record store failure
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type VaultResult<T> = Result<T, VaultError>;

impl From<std::io::Error> for VaultError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<quick_xml::Error> for VaultError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for VaultError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(e.to_string())
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}
