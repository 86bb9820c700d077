// ── keebot-vault / settings ────────────────────────────────────────────────────
//
// Session settings, loadable from a JSON file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{VaultError, VaultResult};

/// Settings handed to every [`VaultSession`](super::service::VaultSession).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultSettings {
    /// Children shown per page
    pub page_length: usize,
    /// Length of passwords produced by the draft generator
    pub generated_password_length: usize,
    /// Name of the ephemeral search group
    pub search_group_name: String,
    /// Icon index for newly created groups
    pub default_group_icon: u32,
    /// Icon index for newly created entries
    pub default_entry_icon: u32,
    /// Appended to the root group name for downloads
    pub download_file_suffix: String,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            page_length: 10,
            generated_password_length: 8,
            search_group_name: "Search".to_string(),
            default_group_icon: 37,
            default_entry_icon: 0,
            download_file_suffix: ".kdbx".to_string(),
        }
    }
}

impl VaultSettings {
    /// Parse settings from JSON; absent keys keep their defaults.
    pub fn from_json_str(json: &str) -> VaultResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> VaultResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        log::debug!("Loaded vault settings from {}", path.as_ref().display());
        Self::from_json_str(&raw)
    }

    fn validate(&self) -> VaultResult<()> {
        if self.page_length == 0 {
            return Err(VaultError::Config("page_length must be at least 1".into()));
        }
        if self.generated_password_length > super::password::ALPHABET.len() {
            return Err(VaultError::Config(format!(
                "generated_password_length cannot exceed {}",
                super::password::ALPHABET.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let s = VaultSettings::from_json_str(r#"{"page_length": 4}"#).unwrap();
        assert_eq!(s.page_length, 4);
        assert_eq!(s.generated_password_length, 8);
        assert_eq!(s.search_group_name, "Search");
    }

    #[test]
    fn zero_page_length_is_rejected() {
        let err = VaultSettings::from_json_str(r#"{"page_length": 0}"#).unwrap_err();
        assert!(matches!(err, VaultError::Config(_)));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(
            VaultSettings::from_json_str("{page_length"),
            Err(VaultError::Config(_))
        ));
    }
}
