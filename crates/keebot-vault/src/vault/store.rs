// ── keebot-vault / store ───────────────────────────────────────────────────────
//
// User-record persistence: the per-chat record that carries the open flag, the
// edit permission and the latest container bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::error::{VaultError, VaultResult};

/// Persistent state of one chat user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub chat_id: i64,
    #[serde(default)]
    pub is_opened: bool,
    /// Whether commits from this user are applied.
    #[serde(default)]
    pub create_state: bool,
    /// Latest container bytes, base64 in JSON.
    #[serde(default, with = "file_b64")]
    pub file: Option<Vec<u8>>,
}

impl UserRecord {
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            is_opened: false,
            create_state: true,
            file: None,
        }
    }
}

mod file_b64 {
    use super::*;

    pub fn serialize<S: Serializer>(file: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match file {
            Some(bytes) => s.serialize_some(&STANDARD.encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(d)?;
        encoded
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Load/save user records by chat id.
pub trait UserStore {
    fn load(&self, chat_id: i64) -> VaultResult<Option<UserRecord>>;
    fn save(&mut self, record: &UserRecord) -> VaultResult<()>;
}

// ─── In-memory ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    records: HashMap<i64, UserRecord>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, record: UserRecord) -> Self {
        self.records.insert(record.chat_id, record);
        self
    }
}

impl UserStore for MemoryUserStore {
    fn load(&self, chat_id: i64) -> VaultResult<Option<UserRecord>> {
        Ok(self.records.get(&chat_id).cloned())
    }

    fn save(&mut self, record: &UserRecord) -> VaultResult<()> {
        self.records.insert(record.chat_id, record.clone());
        Ok(())
    }
}

// ─── JSON file ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
struct UserFile {
    #[serde(default)]
    users: Vec<UserRecord>,
}

/// All records in one JSON document; a missing file reads as empty.
#[derive(Debug, Clone)]
pub struct JsonFileUserStore {
    path: PathBuf,
}

impl JsonFileUserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> VaultResult<UserFile> {
        if !self.path.exists() {
            return Ok(UserFile::default());
        }
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| VaultError::Persistence(e.to_string()))?;
        if raw.trim().is_empty() {
            return Ok(UserFile::default());
        }
        serde_json::from_str(&raw).map_err(|e| VaultError::Persistence(e.to_string()))
    }

    fn write_file(&self, file: &UserFile) -> VaultResult<()> {
        let json = serde_json::to_string_pretty(file)
            .map_err(|e| VaultError::Persistence(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| VaultError::Persistence(e.to_string()))
    }
}

impl UserStore for JsonFileUserStore {
    fn load(&self, chat_id: i64) -> VaultResult<Option<UserRecord>> {
        Ok(self
            .read_file()?
            .users
            .into_iter()
            .find(|u| u.chat_id == chat_id))
    }

    fn save(&mut self, record: &UserRecord) -> VaultResult<()> {
        let mut file = self.read_file()?;
        match file.users.iter_mut().find(|u| u.chat_id == record.chat_id) {
            Some(existing) => *existing = record.clone(),
            None => file.users.push(record.clone()),
        }
        self.write_file(&file)?;
        log::debug!("Saved user record {} to {}", record.chat_id, self.path.display());
        Ok(())
    }
}
