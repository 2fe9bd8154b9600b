//! Terminal implementation of the file platform. Pickers, prompts and
//! confirmations are modal line inputs drawn on the bottom row.

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    style::{Attribute, Print, SetAttribute},
    terminal::{self, Clear, ClearType},
};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::file_io::{FileHandle, FilePlatform, FileTypeFilter, PickerOutcome, UploadedFile, FALLBACK_SAVE_NAME};

pub struct TerminalPlatform {
    file_handles: bool,
    downloads_dir: PathBuf,
}

impl TerminalPlatform {
    pub fn new(file_handles: bool, downloads_dir: impl Into<PathBuf>) -> Self {
        TerminalPlatform {
            file_handles,
            downloads_dir: downloads_dir.into(),
        }
    }

    /// Shows `message` until any key is pressed.
    pub fn alert(&mut self, message: &str) -> io::Result<()> {
        draw_prompt_line(&format!("{}  [press any key]", message), "")?;
        loop {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Reads one line at the bottom row. Esc or Ctrl+C dismiss it.
    pub fn read_line(&mut self, label: &str, initial: &str) -> io::Result<Option<String>> {
        let mut input = initial.to_string();
        loop {
            draw_prompt_line(label, &input)?;
            let key = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => key,
                _ => continue,
            };
            match edit_line(&mut input, key) {
                LineEdit::Submit => return Ok(Some(input)),
                LineEdit::Dismiss => return Ok(None),
                LineEdit::Continue => {}
            }
        }
    }

    fn pick_path(&mut self, label: &str, initial: &str) -> PickerOutcome<PathBuf> {
        match self.read_line(label, initial) {
            Ok(Some(input)) if !input.trim().is_empty() => PickerOutcome::Picked(PathBuf::from(input.trim())),
            Ok(_) => PickerOutcome::Cancelled,
            Err(e) => PickerOutcome::Failed(e),
        }
    }
}

enum LineEdit {
    Continue,
    Submit,
    Dismiss,
}

fn edit_line(input: &mut String, key: KeyEvent) -> LineEdit {
    match key.code {
        KeyCode::Enter => LineEdit::Submit,
        KeyCode::Esc => LineEdit::Dismiss,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => LineEdit::Dismiss,
        KeyCode::Backspace => {
            input.pop();
            LineEdit::Continue
        }
        KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            input.push(c);
            LineEdit::Continue
        }
        _ => LineEdit::Continue,
    }
}

fn draw_prompt_line(label: &str, input: &str) -> io::Result<()> {
    let (_, height) = terminal::size()?;
    let y = height.saturating_sub(1);
    let mut stdout = io::stdout();
    execute!(
        stdout,
        Hide,
        MoveTo(0, y),
        Clear(ClearType::CurrentLine),
        SetAttribute(Attribute::Reverse),
        Print(label),
        SetAttribute(Attribute::Reset),
        Print(" "),
        Print(input),
        Show
    )?;
    stdout.flush()
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn type_error(filter: &FileTypeFilter, name: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("{} is not one of the {} (.{})", name, filter.description, filter.extensions.join(", .")),
    )
}

/// Picks a name inside `dir` that does not exist yet, the way browsers
/// number repeated downloads: `notes.txt`, `notes (1).txt`, ...
/// Only the final component of a typed name is kept, so a download always
/// lands inside the downloads directory.
fn download_name(file_name: &str) -> &str {
    Path::new(file_name.trim())
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(FALLBACK_SAVE_NAME)
}

fn read_lossy(path: &Path) -> io::Result<String> {
    Ok(String::from_utf8_lossy(&fs::read(path)?).into_owned())
}

pub fn unique_download_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    };
    (1..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{} ({}).{}", stem, n, ext)),
            None => dir.join(format!("{} ({})", stem, n)),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

pub fn write_through(path: &Path, text: &str) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(text.as_bytes())?;
    file.sync_all()
}

impl FilePlatform for TerminalPlatform {
    fn supports_file_handles(&self) -> bool {
        self.file_handles
    }

    fn show_open_picker(&mut self, filter: &FileTypeFilter) -> PickerOutcome<FileHandle> {
        let path = match self.pick_path("Open file:", "") {
            PickerOutcome::Picked(path) => path,
            PickerOutcome::Cancelled => return PickerOutcome::Cancelled,
            PickerOutcome::Failed(e) => return PickerOutcome::Failed(e),
        };
        let name = file_name_of(&path);
        if !filter.accepts(&name) {
            return PickerOutcome::Failed(type_error(filter, &name));
        }
        // Opening read+write up front is what makes the handle write-capable.
        match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(_) => PickerOutcome::Picked(FileHandle { name, path }),
            Err(e) => PickerOutcome::Failed(e),
        }
    }

    fn show_save_picker(&mut self, suggested_name: &str, filter: &FileTypeFilter) -> PickerOutcome<FileHandle> {
        let path = match self.pick_path("Save as:", suggested_name) {
            PickerOutcome::Picked(path) => path,
            PickerOutcome::Cancelled => return PickerOutcome::Cancelled,
            PickerOutcome::Failed(e) => return PickerOutcome::Failed(e),
        };
        let name = file_name_of(&path);
        if !filter.accepts(&name) {
            return PickerOutcome::Failed(type_error(filter, &name));
        }
        PickerOutcome::Picked(FileHandle { name, path })
    }

    fn read_handle(&mut self, handle: &FileHandle) -> io::Result<String> {
        read_lossy(&handle.path)
    }

    fn write_handle(&mut self, handle: &FileHandle, text: &str) -> io::Result<()> {
        write_through(&handle.path, text)
    }

    fn select_upload(&mut self, filter: &FileTypeFilter) -> Option<UploadedFile> {
        match self.pick_path("Upload file:", "") {
            PickerOutcome::Picked(path) => {
                let name = file_name_of(&path);
                if filter.accepts(&name) {
                    Some(UploadedFile { name, path })
                } else {
                    tracing::warn!(file = %name, "upload ignored, not a text file");
                    None
                }
            }
            PickerOutcome::Cancelled => None,
            PickerOutcome::Failed(e) => {
                tracing::warn!(error = %e, "upload selection failed");
                None
            }
        }
    }

    fn read_upload(&mut self, file: &UploadedFile) -> io::Result<String> {
        read_lossy(&file.path)
    }

    fn download(&mut self, file_name: &str, text: &str) -> io::Result<()> {
        fs::create_dir_all(&self.downloads_dir)?;
        let path = unique_download_path(&self.downloads_dir, download_name(file_name));
        write_through(&path, text)?;
        tracing::debug!(path = %path.display(), "download written");
        Ok(())
    }

    fn prompt(&mut self, message: &str, default: &str) -> Option<String> {
        self.read_line(message, default).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "prompt failed");
            None
        })
    }

    fn confirm(&mut self, message: &str) -> bool {
        let answer = self.read_line(&format!("{} (y/n)", message), "").unwrap_or_else(|e| {
            tracing::warn!(error = %e, "confirmation failed");
            None
        });
        matches!(answer.as_deref().map(str::trim), Some("y" | "Y" | "yes"))
    }
}
