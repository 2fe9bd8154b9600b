//! The one explicit session record: persisted state, the unsaved-changes
//! flag, the file adapter and the stats display, plus the dispatch loop
//! that runs each command's effects.

use std::time::Instant;

use crate::commands::{apply, Command, Effect};
use crate::error::Result;
use crate::file_io::{FileAdapter, FileOutcome, FilePlatform};
use crate::persistence::PersistenceManager;
use crate::state::PersistedState;
use crate::stats::{Flash, StatsDisplay};
use crate::store::KeyValueStore;

/// Something the front end has to show the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Blocking; stays until dismissed.
    Alert(String),
}

pub struct Session<S> {
    state: PersistedState,
    unsaved_changes: bool,
    files: FileAdapter,
    persistence: PersistenceManager<S>,
    display: StatsDisplay,
    save_flash: Flash,
    notifications: Vec<Notification>,
}

impl<S: KeyValueStore> Session<S> {
    /// Loads the persisted record and computes the initial stats.
    pub fn start(persistence: PersistenceManager<S>) -> Self {
        let state = persistence.load();
        let mut session = Session {
            state,
            unsaved_changes: false,
            files: FileAdapter::new(),
            persistence,
            display: StatsDisplay::default(),
            save_flash: Flash::default(),
            notifications: Vec::new(),
        };
        session.recompute_stats(Instant::now());
        tracing::info!(
            file = %session.state.file_name,
            theme = session.state.theme.name(),
            font = session.state.font.name(),
            "session started"
        );
        session
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn display(&self) -> &StatsDisplay {
        &self.display
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved_changes
    }

    pub fn is_persisted(&self) -> bool {
        self.persistence.is_saved()
    }

    pub fn files(&self) -> &FileAdapter {
        &self.files
    }

    /// True while either the save or the stats acknowledgment is showing.
    pub fn acknowledgment_visible(&self, now: Instant) -> bool {
        self.save_flash.is_visible(now) || self.display.flash.is_visible(now)
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn dispatch(&mut self, command: Command) -> Result<()> {
        if matches!(command, Command::EditText(_)) {
            self.unsaved_changes = true;
        }

        let transition = apply(&self.state, command);
        self.state = transition.state;

        let now = Instant::now();
        for effect in transition.effects {
            match effect {
                Effect::RecomputeStats => self.recompute_stats(now),
                Effect::Persist => self.persist(now)?,
            }
        }
        Ok(())
    }

    pub fn open_file(&mut self, platform: &mut dyn FilePlatform) -> Result<()> {
        let outcome = self.files.open(platform);
        self.finish_file_operation(outcome)
    }

    pub fn save_file(&mut self, platform: &mut dyn FilePlatform) -> Result<()> {
        let outcome = self.files.save(platform, &self.state.file_name, &self.state.text);
        self.finish_file_operation(outcome)
    }

    pub fn new_document(&mut self, platform: &mut dyn FilePlatform) -> Result<()> {
        let outcome = self
            .files
            .new_document(platform, &self.state.text, self.unsaved_changes);
        self.finish_file_operation(outcome)
    }

    fn finish_file_operation(&mut self, outcome: FileOutcome) -> Result<()> {
        match outcome {
            FileOutcome::Opened { file_name, text } => {
                self.unsaved_changes = false;
                self.dispatch(Command::LoadDocument { file_name, text })
            }
            FileOutcome::Saved { file_name } => {
                self.unsaved_changes = false;
                self.dispatch(Command::RenameDocument(file_name))
            }
            FileOutcome::Reset => {
                self.unsaved_changes = false;
                self.dispatch(Command::ResetDocument)
            }
            FileOutcome::Cancelled => Ok(()),
            FileOutcome::Failed(message) => {
                self.notifications.push(Notification::Alert(message));
                Ok(())
            }
        }
    }

    fn recompute_stats(&mut self, now: Instant) {
        self.display
            .recompute(&self.state.text, self.state.limit, self.state.limit_enabled, now);
    }

    fn persist(&mut self, now: Instant) -> Result<()> {
        self.persistence.save(&self.state)?;
        self.save_flash.trigger(now);
        Ok(())
    }

    #[cfg(test)]
    fn persistence(&self) -> &PersistenceManager<S> {
        &self.persistence
    }
}
