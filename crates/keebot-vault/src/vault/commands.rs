// ── keebot-vault / commands ────────────────────────────────────────────────────
//
// Callback-token vocabulary shared with the chat layer, and the outcome a
// session hands back after running one.

use std::str::FromStr;

use super::error::VaultError;
use super::view::ViewMessage;

/// One inbound callback token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Navigation
    Left,
    Right,
    Back,
    Lock,
    Resend,
    Download,
    /// Placeholder on the root's delete button.
    Nothing,
    // Delete confirmation
    Delete,
    ReallyDelete,
    NoDelete,
    /// `Edit_<id>`
    Edit(String),
    // Draft mode
    DraftLeft,
    DraftRight,
    DraftBack,
    DraftDone,
    GeneratePassword,
    /// `create_<field>`
    DraftField(String),
    /// Any other token is a child's identifier.
    Select(String),
}

impl FromStr for Command {
    type Err = VaultError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let cmd = match token {
            "" => return Err(VaultError::Unsupported("Empty command".to_string())),
            "Left" => Self::Left,
            "Right" => Self::Right,
            "Back" => Self::Back,
            "Lock" => Self::Lock,
            "Resend" => Self::Resend,
            "Download" => Self::Download,
            "Nothing" => Self::Nothing,
            "Delete" => Self::Delete,
            "ReallyDelete" => Self::ReallyDelete,
            "NoDelete" => Self::NoDelete,
            "create_Left" => Self::DraftLeft,
            "create_Right" => Self::DraftRight,
            "create_Back" => Self::DraftBack,
            "create_done" => Self::DraftDone,
            "create_generate_password" => Self::GeneratePassword,
            _ => {
                if let Some(id) = token.strip_prefix("Edit_") {
                    if id.is_empty() {
                        return Err(VaultError::Unsupported(format!("Malformed command: {token}")));
                    }
                    Self::Edit(id.to_string())
                } else if let Some(field) = token.strip_prefix("create_") {
                    if field.is_empty() {
                        return Err(VaultError::Unsupported(format!("Malformed command: {token}")));
                    }
                    Self::DraftField(field.to_string())
                } else {
                    Self::Select(token.to_string())
                }
            }
        };
        Ok(cmd)
    }
}

/// What the chat layer should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Send or replace the current message.
    Render(ViewMessage),
    /// The vault was closed.
    Locked,
    /// Send the container file.
    Download { file_name: String, bytes: Vec<u8> },
    /// Nothing changed.
    Ignored,
}
