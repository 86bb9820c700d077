// ── keebot-vault / service ─────────────────────────────────────────────────────
//
// Per-chat vault session: owns the decoded document, the navigator state and
// the open draft, and drives the container and user-record collaborators.
// Every committed mutation re-encodes the whole document and persists it.

use chrono::Utc;
use std::path::{Path, PathBuf};

use super::commands::{Command, CommandOutcome};
use super::container::{ContainerBackend, ContainerHandle};
use super::edit::{DraftTarget, EditDraft};
use super::error::{VaultError, VaultResult};
use super::settings::VaultSettings;
use super::store::{UserRecord, UserStore};
use super::tree::VaultTree;
use super::types::*;
use super::view::{self, ViewMessage};
use super::xml_reader::{decode_document, VaultDocument};
use super::xml_writer::encode_document;

/// One user's session over one vault file.
pub struct VaultSession {
    chat_id: i64,
    path: PathBuf,
    settings: VaultSettings,
    backend: Box<dyn ContainerBackend>,
    store: Box<dyn UserStore>,
    handle: Option<Box<dyn ContainerHandle>>,
    document: Option<VaultDocument>,
    draft: Option<EditDraft>,
    user: Option<UserRecord>,
}

impl VaultSession {
    pub fn new(
        chat_id: i64,
        path: impl Into<PathBuf>,
        settings: VaultSettings,
        backend: Box<dyn ContainerBackend>,
        store: Box<dyn UserStore>,
    ) -> Self {
        Self {
            chat_id,
            path: path.into(),
            settings,
            backend,
            store,
            handle: None,
            document: None,
            draft: None,
            user: None,
        }
    }

    // ─── Lifecycle ────────────────────────────────────────────────────

    /// Open the container, decode its body and activate the root group.
    ///
    /// Container failures come back as [`VaultError::Authentication`] or
    /// [`VaultError::Corruption`]; the cause is only logged.
    pub fn open(&mut self, password: Option<&str>, key_file: Option<&Path>) -> VaultResult<()> {
        let mut user = self
            .store
            .load(self.chat_id)?
            .ok_or_else(|| VaultError::NotFound(format!("user {}", self.chat_id)))?;

        let mut handle = self.backend.open(&self.path, password, key_file)?;
        let document = match decode_document(handle.document(), &self.settings) {
            Ok(doc) => doc,
            Err(e) => {
                handle.close();
                return Err(e);
            }
        };

        user.is_opened = true;
        self.store.save(&user)?;

        log::info!(
            "Opened vault {} for chat {} ({} items)",
            self.path.display(),
            self.chat_id,
            document.tree.item_count()
        );
        self.user = Some(user);
        self.handle = Some(handle);
        self.document = Some(document);
        self.draft = None;
        Ok(())
    }

    /// Close the container and drop the tree, overlay and draft.
    pub fn close(&mut self) -> VaultResult<()> {
        if let Some(mut handle) = self.handle.take() {
            handle.close();
        }
        self.document = None;
        self.draft = None;
        if let Some(mut user) = self.user.take() {
            user.is_opened = false;
            self.store.save(&user)?;
        }
        log::info!("Closed vault {} for chat {}", self.path.display(), self.chat_id);
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.document.is_some()
    }

    // ─── Accessors ────────────────────────────────────────────────────

    pub fn settings(&self) -> &VaultSettings {
        &self.settings
    }

    pub fn user(&self) -> Option<&UserRecord> {
        self.user.as_ref()
    }

    /// Toggle the edit permission checked at commit time.
    pub fn set_create_state(&mut self, allowed: bool) {
        if let Some(user) = self.user.as_mut() {
            user.create_state = allowed;
        }
    }

    pub fn tree(&self) -> VaultResult<&VaultTree> {
        self.document.as_ref().map(|d| &d.tree).ok_or(VaultError::NotOpen)
    }

    pub fn tree_mut(&mut self) -> VaultResult<&mut VaultTree> {
        self.document.as_mut().map(|d| &mut d.tree).ok_or(VaultError::NotOpen)
    }

    pub fn draft(&self) -> Option<&EditDraft> {
        self.draft.as_ref()
    }

    /// `<root group name><download_file_suffix>`
    pub fn download_file_name(&self) -> VaultResult<String> {
        let tree = self.tree()?;
        Ok(format!("{}{}", tree.name(tree.root()), self.settings.download_file_suffix))
    }

    // ─── Search ───────────────────────────────────────────────────────

    pub fn search(&mut self, term: &str) -> VaultResult<NodeKey> {
        let group_name = self.settings.search_group_name.clone();
        self.tree_mut()?.search(term, &group_name)
    }

    pub fn get_item_by_uuid(&self, id: &str) -> VaultResult<Option<NodeKey>> {
        Ok(self.tree()?.get_item_by_uuid(id))
    }

    // ─── Drafts ───────────────────────────────────────────────────────

    /// Open a draft, replacing any previous one, and render it.
    pub fn start_add_edit(&mut self, target: DraftTarget) -> VaultResult<ViewMessage> {
        let draft = EditDraft::start(self.tree()?, target)?;
        let message = view::render_draft(&draft);
        self.draft = Some(draft);
        Ok(message)
    }

    /// Commit the open draft if the user may edit, then discard it.
    ///
    /// Returns whether anything was committed.
    pub fn finish_add_edit(&mut self) -> VaultResult<bool> {
        let Some(draft) = self.draft.take() else {
            return Ok(false);
        };
        let allowed = self.user.as_ref().map(|u| u.create_state).unwrap_or(false);
        if !allowed {
            log::warn!("Chat {} may not edit; draft discarded", self.chat_id);
            return Ok(false);
        }

        let (kind, process) = (draft.kind(), draft.process());
        let settings = self.settings.clone();
        draft.apply(self.tree_mut()?, &settings)?;
        log::info!("Committed {:?} of {} for chat {}", process, kind, self.chat_id);
        self.persist()?;
        Ok(true)
    }

    // ─── Mutation ─────────────────────────────────────────────────────

    /// Delete `key` unconditionally and persist.
    pub fn delete(&mut self, key: NodeKey) -> VaultResult<()> {
        let kind = self.tree()?.kind(key)?;
        self.tree_mut()?.delete(key)?;
        log::info!("Deleted {} for chat {}", kind, self.chat_id);
        self.persist()
    }

    /// Re-encode the whole document, write it through the container and store
    /// the resulting bytes on the user record.
    pub fn persist(&mut self) -> VaultResult<()> {
        let document = self.document.as_ref().ok_or(VaultError::NotOpen)?;
        let xml = encode_document(document, Utc::now())?;
        let handle = self.handle.as_mut().ok_or(VaultError::NotOpen)?;
        let bytes = handle
            .write(&xml)
            .map_err(|e| VaultError::Persistence(e.to_string()))?;

        let user = self.user.as_mut().ok_or(VaultError::NotOpen)?;
        user.file = Some(bytes);
        self.store.save(user)?;
        log::info!("Persisted vault {} for chat {}", self.path.display(), self.chat_id);
        Ok(())
    }

    // ─── Rendering ────────────────────────────────────────────────────

    /// The draft view while a draft is open, else the active node.
    pub fn render(&self) -> VaultResult<ViewMessage> {
        match &self.draft {
            Some(draft) => Ok(view::render_draft(draft)),
            None => view::render_tree(self.tree()?),
        }
    }

    fn rendered(&self) -> VaultResult<CommandOutcome> {
        Ok(CommandOutcome::Render(self.render()?))
    }

    // ─── Dispatch ─────────────────────────────────────────────────────

    /// Run one callback token.
    pub fn handle_command(&mut self, token: &str) -> VaultResult<CommandOutcome> {
        let command: Command = token.parse()?;
        if command == Command::Lock {
            self.close()?;
            return Ok(CommandOutcome::Locked);
        }
        if !self.is_open() {
            return Err(VaultError::NotOpen);
        }
        log::debug!("Chat {} command {:?}", self.chat_id, command);

        match command {
            Command::Left => {
                let tree = self.tree_mut()?;
                tree.previous_page(tree.active());
                self.rendered()
            }
            Command::Right => {
                let tree = self.tree_mut()?;
                tree.next_page(tree.active());
                self.rendered()
            }
            Command::Back => {
                let tree = self.tree_mut()?;
                tree.deactivate(tree.active());
                self.rendered()
            }
            Command::Resend => self.rendered(),
            Command::Nothing => Ok(CommandOutcome::Ignored),
            Command::Download => {
                if self.user.as_ref().and_then(|u| u.file.as_ref()).is_none() {
                    self.persist()?;
                }
                let bytes = self
                    .user
                    .as_ref()
                    .and_then(|u| u.file.clone())
                    .unwrap_or_default();
                Ok(CommandOutcome::Download {
                    file_name: self.download_file_name()?,
                    bytes,
                })
            }
            Command::Delete => {
                let tree = self.tree_mut()?;
                let active = tree.active();
                if active == tree.root() || tree.search_group() == Some(active) {
                    return Ok(CommandOutcome::Ignored);
                }
                tree.set_pending_delete(active, true)?;
                self.rendered()
            }
            Command::ReallyDelete => {
                let tree = self.tree()?;
                let active = tree.active();
                if !tree.pending_delete(active) {
                    return Ok(CommandOutcome::Ignored);
                }
                self.delete(active)?;
                self.rendered()
            }
            Command::NoDelete => {
                let tree = self.tree_mut()?;
                let active = tree.active();
                if tree.pending_delete(active) {
                    tree.set_pending_delete(active, false)?;
                }
                self.rendered()
            }
            Command::Edit(id) => match self.get_item_by_uuid(&id)? {
                Some(key) => Ok(CommandOutcome::Render(
                    self.start_add_edit(DraftTarget::Edit(key))?,
                )),
                None => Ok(CommandOutcome::Ignored),
            },
            Command::Select(id) => match self.get_item_by_uuid(&id)? {
                Some(key) => {
                    self.tree_mut()?.activate(key);
                    self.rendered()
                }
                None => Ok(CommandOutcome::Ignored),
            },
            Command::DraftBack => {
                self.draft = None;
                self.rendered()
            }
            Command::DraftDone => {
                self.finish_add_edit()?;
                self.rendered()
            }
            draft_command => {
                let length = self.settings.generated_password_length;
                let Some(draft) = self.draft.as_mut() else {
                    return Ok(CommandOutcome::Ignored);
                };
                match draft_command {
                    Command::DraftLeft => draft.prev_field(),
                    Command::DraftRight => draft.next_field(),
                    Command::GeneratePassword => draft.generate_password(length),
                    Command::DraftField(field) => {
                        draft.set_current_field(&field);
                    }
                    _ => return Ok(CommandOutcome::Ignored),
                }
                self.rendered()
            }
        }
    }

    /// Free text: a value for the current draft field, otherwise a search term.
    pub fn handle_text(&mut self, text: &str) -> VaultResult<CommandOutcome> {
        if !self.is_open() {
            return Err(VaultError::NotOpen);
        }
        match self.draft.as_mut() {
            Some(draft) => draft.set_value(text),
            None => {
                self.search(text)?;
            }
        }
        self.rendered()
    }
}
