// ── keebot-vault / container ───────────────────────────────────────────────────
//
// Contract for the storage-container collaborator that opens a vault file and
// exposes its XML body, plus a plain XML-file backend. Encryption lives behind
// this trait and is not part of this crate.

use std::path::{Path, PathBuf};
use thiserror::Error;

use super::error::VaultError;

/// Failure reported by a container backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    /// Wrong master password or key file.
    #[error("credentials rejected: {0}")]
    Credentials(String),
    #[error("container I/O error: {0}")]
    Io(String),
    /// Container opened but its payload is not text.
    #[error("container payload undecodable: {0}")]
    Decode(String),
}

impl From<std::io::Error> for ContainerError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<ContainerError> for VaultError {
    /// Translate at the open boundary: the cause is logged, never returned.
    fn from(e: ContainerError) -> Self {
        match e {
            ContainerError::Credentials(_) | ContainerError::Io(_) => {
                log::error!("Container open failed: {}", e);
                VaultError::Authentication
            }
            ContainerError::Decode(_) => {
                log::error!("Container content unreadable: {}", e);
                VaultError::Corruption
            }
        }
    }
}

/// Opens vault containers.
pub trait ContainerBackend {
    fn open(
        &self,
        path: &Path,
        password: Option<&str>,
        key_file: Option<&Path>,
    ) -> Result<Box<dyn ContainerHandle>, ContainerError>;
}

/// One open container.
pub trait ContainerHandle {
    /// The XML body as handed over at open time.
    fn document(&self) -> &str;

    /// Replace the body with `xml` and return the full container bytes.
    fn write(&mut self, xml: &str) -> Result<Vec<u8>, ContainerError>;

    fn close(&mut self);
}

// ─── Plain XML file backend ───────────────────────────────────────────────────

/// Unencrypted backend: the file *is* the XML body.
///
/// An optional expected password and a key-file existence check stand in for
/// real credential verification.
#[derive(Debug, Clone, Default)]
pub struct XmlFileContainer {
    expected_password: Option<String>,
}

impl XmlFileContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject opens whose password differs from `password`.
    pub fn with_password(password: impl Into<String>) -> Self {
        Self {
            expected_password: Some(password.into()),
        }
    }
}

impl ContainerBackend for XmlFileContainer {
    fn open(
        &self,
        path: &Path,
        password: Option<&str>,
        key_file: Option<&Path>,
    ) -> Result<Box<dyn ContainerHandle>, ContainerError> {
        if let Some(expected) = &self.expected_password {
            if password != Some(expected.as_str()) {
                return Err(ContainerError::Credentials(format!(
                    "password mismatch for {}",
                    path.display()
                )));
            }
        }
        if let Some(key_file) = key_file {
            if !key_file.is_file() {
                return Err(ContainerError::Credentials(format!(
                    "key file not found: {}",
                    key_file.display()
                )));
            }
        }

        let bytes = std::fs::read(path)?;
        let document =
            String::from_utf8(bytes).map_err(|e| ContainerError::Decode(e.to_string()))?;
        log::debug!("Opened XML container {}", path.display());

        Ok(Box::new(XmlFileHandle {
            path: path.to_path_buf(),
            document,
            open: true,
        }))
    }
}

#[derive(Debug)]
struct XmlFileHandle {
    path: PathBuf,
    document: String,
    open: bool,
}

impl ContainerHandle for XmlFileHandle {
    fn document(&self) -> &str {
        &self.document
    }

    fn write(&mut self, xml: &str) -> Result<Vec<u8>, ContainerError> {
        if !self.open {
            return Err(ContainerError::Io(format!(
                "container closed: {}",
                self.path.display()
            )));
        }
        self.document = xml.to_string();
        Ok(self.document.as_bytes().to_vec())
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            log::debug!("Closed XML container {}", self.path.display());
        }
    }
}
