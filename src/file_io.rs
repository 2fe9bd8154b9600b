//! Bridges the document to the host file system through one of two
//! strategies: handle-based pickers, or upload/download.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::state::is_placeholder_name;

pub const FALLBACK_SAVE_NAME: &str = "my-writing.txt";
pub const NEW_DOCUMENT_PROMPT: &str = "Start a new document? Unsaved changes will be lost.";

/// Plain text and markdown only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTypeFilter {
    pub description: &'static str,
    pub extensions: &'static [&'static str],
}

pub const TEXT_FILES: FileTypeFilter = FileTypeFilter {
    description: "Text Files",
    extensions: &["txt", "md"],
};

impl FileTypeFilter {
    pub fn accepts(&self, name: &str) -> bool {
        name.rsplit_once('.')
            .map(|(_, ext)| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

/// A named, write-capable reference to a file picked by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub name: String,
    pub path: PathBuf,
}

/// A file chosen through the upload control. Read once, never written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub path: PathBuf,
}

/// Result of a user-driven picker. Dismissing the dialog is not a failure.
#[derive(Debug)]
pub enum PickerOutcome<T> {
    Picked(T),
    Cancelled,
    Failed(io::Error),
}

pub trait FilePlatform {
    /// Asked on every operation, never cached.
    fn supports_file_handles(&self) -> bool;

    fn show_open_picker(&mut self, filter: &FileTypeFilter) -> PickerOutcome<FileHandle>;
    fn show_save_picker(
        &mut self,
        suggested_name: &str,
        filter: &FileTypeFilter,
    ) -> PickerOutcome<FileHandle>;
    fn read_handle(&mut self, handle: &FileHandle) -> io::Result<String>;
    /// Truncate, write, close.
    fn write_handle(&mut self, handle: &FileHandle, text: &str) -> io::Result<()>;

    fn select_upload(&mut self, filter: &FileTypeFilter) -> Option<UploadedFile>;
    fn read_upload(&mut self, file: &UploadedFile) -> io::Result<String>;
    fn download(&mut self, file_name: &str, text: &str) -> io::Result<()>;

    /// `None` when the prompt is dismissed.
    fn prompt(&mut self, message: &str, default: &str) -> Option<String>;
    fn confirm(&mut self, message: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Opened { file_name: String, text: String },
    Saved { file_name: String },
    Reset,
    Cancelled,
    /// Message for a blocking alert.
    Failed(String),
}

#[derive(Debug)]
struct SaveFailure(io::Error);

impl fmt::Display for SaveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to save file: {}", self.0)
    }
}

impl From<SaveFailure> for FileOutcome {
    fn from(failure: SaveFailure) -> Self {
        FileOutcome::Failed(failure.to_string())
    }
}

/// Owns the retained file handle for the lifetime of the session.
#[derive(Debug, Default)]
pub struct FileAdapter {
    handle: Option<FileHandle>,
}

impl FileAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> Option<&FileHandle> {
        self.handle.as_ref()
    }

    pub fn open(&mut self, platform: &mut dyn FilePlatform) -> FileOutcome {
        if platform.supports_file_handles() {
            self.open_with_picker(platform)
        } else {
            self.open_with_upload(platform)
        }
    }

    pub fn save(&mut self, platform: &mut dyn FilePlatform, file_name: &str, text: &str) -> FileOutcome {
        if platform.supports_file_handles() {
            self.save_with_handle(platform, file_name, text)
        } else {
            self.save_with_download(platform, file_name, text)
        }
    }

    pub fn new_document(
        &mut self,
        platform: &mut dyn FilePlatform,
        text: &str,
        unsaved_changes: bool,
    ) -> FileOutcome {
        if unsaved_changes && !text.trim().is_empty() && !platform.confirm(NEW_DOCUMENT_PROMPT) {
            return FileOutcome::Cancelled;
        }
        self.handle = None;
        FileOutcome::Reset
    }

    fn open_with_picker(&mut self, platform: &mut dyn FilePlatform) -> FileOutcome {
        let handle = match platform.show_open_picker(&TEXT_FILES) {
            PickerOutcome::Picked(handle) => handle,
            PickerOutcome::Cancelled => return FileOutcome::Cancelled,
            PickerOutcome::Failed(e) => {
                tracing::warn!(error = %e, "open picker failed");
                return FileOutcome::Cancelled;
            }
        };

        match platform.read_handle(&handle) {
            Ok(text) => {
                tracing::info!(file = %handle.name, "opened file through handle");
                let file_name = handle.name.clone();
                self.handle = Some(handle);
                FileOutcome::Opened { file_name, text }
            }
            Err(e) => {
                tracing::warn!(file = %handle.name, error = %e, "could not read picked file");
                FileOutcome::Cancelled
            }
        }
    }

    fn open_with_upload(&mut self, platform: &mut dyn FilePlatform) -> FileOutcome {
        let Some(file) = platform.select_upload(&TEXT_FILES) else {
            return FileOutcome::Cancelled;
        };

        match platform.read_upload(&file) {
            Ok(text) => {
                tracing::info!(file = %file.name, "opened uploaded file");
                self.handle = None;
                FileOutcome::Opened {
                    file_name: file.name,
                    text,
                }
            }
            Err(e) => {
                tracing::warn!(file = %file.name, error = %e, "could not read uploaded file");
                FileOutcome::Cancelled
            }
        }
    }

    fn save_with_handle(&mut self, platform: &mut dyn FilePlatform, file_name: &str, text: &str) -> FileOutcome {
        if let Some(handle) = &self.handle {
            return match platform.write_handle(handle, text) {
                Ok(()) => FileOutcome::Saved {
                    file_name: handle.name.clone(),
                },
                Err(e) => {
                    tracing::error!(file = %handle.name, error = %e, "write through handle failed");
                    SaveFailure(e).into()
                }
            };
        }

        let handle = match platform.show_save_picker(file_name, &TEXT_FILES) {
            PickerOutcome::Picked(handle) => handle,
            PickerOutcome::Cancelled => return FileOutcome::Cancelled,
            PickerOutcome::Failed(e) => {
                tracing::error!(error = %e, "save picker failed");
                return SaveFailure(e).into();
            }
        };

        let name = if handle.name.is_empty() {
            file_name.to_string()
        } else {
            handle.name.clone()
        };
        match platform.write_handle(&handle, text) {
            Ok(()) => {
                self.handle = Some(handle);
                FileOutcome::Saved { file_name: name }
            }
            Err(e) => {
                tracing::error!(file = %name, error = %e, "write through new handle failed");
                SaveFailure(e).into()
            }
        }
    }

    fn save_with_download(&mut self, platform: &mut dyn FilePlatform, file_name: &str, text: &str) -> FileOutcome {
        let name = if is_placeholder_name(file_name) {
            platform
                .prompt("Enter file name to save:", FALLBACK_SAVE_NAME)
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_SAVE_NAME.to_string())
        } else {
            file_name.to_string()
        };

        match platform.download(&name, text) {
            Ok(()) => {
                tracing::info!(file = %name, "document downloaded");
                FileOutcome::Saved { file_name: name }
            }
            Err(e) => {
                tracing::error!(file = %name, error = %e, "download failed");
                SaveFailure(e).into()
            }
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::{HashMap, VecDeque};

    /// Scripted platform: queued answers for pickers and prompts, an
    /// in-memory file system, and a log of every call made.
    #[derive(Default)]
    pub struct ScriptedPlatform {
        pub handles_supported: bool,
        pub open_picks: VecDeque<PickerOutcome<FileHandle>>,
        pub save_picks: VecDeque<PickerOutcome<FileHandle>>,
        pub uploads: VecDeque<Option<UploadedFile>>,
        pub prompt_answers: VecDeque<Option<String>>,
        pub confirm_answers: VecDeque<bool>,
        pub files: HashMap<PathBuf, String>,
        pub downloads: Vec<(String, String)>,
        pub fail_writes: bool,
        pub calls: Vec<&'static str>,
    }

    impl ScriptedPlatform {
        pub fn with_handles() -> Self {
            ScriptedPlatform {
                handles_supported: true,
                ..Self::default()
            }
        }

        pub fn fallback() -> Self {
            Self::default()
        }

        pub fn handle_calls(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| matches!(**c, "show_open_picker" | "show_save_picker" | "read_handle" | "write_handle"))
                .count()
        }
    }

    pub fn handle(name: &str) -> FileHandle {
        FileHandle {
            name: name.to_string(),
            path: PathBuf::from(format!("/docs/{}", name)),
        }
    }

    pub fn upload(name: &str) -> UploadedFile {
        UploadedFile {
            name: name.to_string(),
            path: PathBuf::from(format!("/uploads/{}", name)),
        }
    }

    fn not_found() -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, "no such file")
    }

    impl FilePlatform for ScriptedPlatform {
        fn supports_file_handles(&self) -> bool {
            self.handles_supported
        }

        fn show_open_picker(&mut self, _filter: &FileTypeFilter) -> PickerOutcome<FileHandle> {
            self.calls.push("show_open_picker");
            self.open_picks.pop_front().unwrap_or(PickerOutcome::Cancelled)
        }

        fn show_save_picker(&mut self, _suggested: &str, _filter: &FileTypeFilter) -> PickerOutcome<FileHandle> {
            self.calls.push("show_save_picker");
            self.save_picks.pop_front().unwrap_or(PickerOutcome::Cancelled)
        }

        fn read_handle(&mut self, handle: &FileHandle) -> io::Result<String> {
            self.calls.push("read_handle");
            self.files.get(&handle.path).cloned().ok_or_else(not_found)
        }

        fn write_handle(&mut self, handle: &FileHandle, text: &str) -> io::Result<()> {
            self.calls.push("write_handle");
            if self.fail_writes {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "disk is read-only"));
            }
            self.files.insert(handle.path.clone(), text.to_string());
            Ok(())
        }

        fn select_upload(&mut self, _filter: &FileTypeFilter) -> Option<UploadedFile> {
            self.calls.push("select_upload");
            self.uploads.pop_front().flatten()
        }

        fn read_upload(&mut self, file: &UploadedFile) -> io::Result<String> {
            self.calls.push("read_upload");
            self.files.get(&file.path).cloned().ok_or_else(not_found)
        }

        fn download(&mut self, file_name: &str, text: &str) -> io::Result<()> {
            self.calls.push("download");
            if self.fail_writes {
                return Err(io::Error::new(io::ErrorKind::Other, "no space left"));
            }
            self.downloads.push((file_name.to_string(), text.to_string()));
            Ok(())
        }

        fn prompt(&mut self, _message: &str, _default: &str) -> Option<String> {
            self.calls.push("prompt");
            self.prompt_answers.pop_front().flatten()
        }

        fn confirm(&mut self, _message: &str) -> bool {
            self.calls.push("confirm");
            self.confirm_answers.pop_front().unwrap_or(false)
        }
    }
}
