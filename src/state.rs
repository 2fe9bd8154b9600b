//! Document and preference state, the record that gets persisted.

use serde::{Deserialize, Serialize};

pub const DEFAULT_FILE_NAME: &str = "untitled.txt";
pub const DEFAULT_LIMIT: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Theme {
    #[default]
    White,
    Dark,
    Coffee,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::White, Theme::Dark, Theme::Coffee];

    pub fn name(self) -> &'static str {
        match self {
            Theme::White => "white",
            Theme::Dark => "dark",
            Theme::Coffee => "coffee",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|theme| theme.name() == name)
    }

    pub fn next(self) -> Self {
        match self {
            Theme::White => Theme::Dark,
            Theme::Dark => Theme::Coffee,
            Theme::Coffee => Theme::White,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Font {
    #[default]
    Georgia,
    Serif,
    Sans,
    Mono,
    Writer,
    Lora,
    OpenSans,
    Playfair,
}

impl Font {
    pub const ALL: [Font; 8] = [
        Font::Georgia,
        Font::Serif,
        Font::Sans,
        Font::Mono,
        Font::Writer,
        Font::Lora,
        Font::OpenSans,
        Font::Playfair,
    ];

    /// Name used in the stored record.
    pub fn name(self) -> &'static str {
        match self {
            Font::Georgia => "georgia",
            Font::Serif => "serif",
            Font::Sans => "sans",
            Font::Mono => "mono",
            Font::Writer => "writer",
            Font::Lora => "lora",
            Font::OpenSans => "openSans",
            Font::Playfair => "playfair",
        }
    }

    /// Human readable label for the controls panel.
    pub fn label(self) -> &'static str {
        match self {
            Font::Georgia => "Georgia",
            Font::Serif => "Serif",
            Font::Sans => "Sans",
            Font::Mono => "Mono",
            Font::Writer => "Writer",
            Font::Lora => "Lora",
            Font::OpenSans => "Open Sans",
            Font::Playfair => "Playfair",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|font| font.name() == name)
    }

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

/// The single durable record: document text plus preferences.
///
/// `lastSaved` is only ever written, so it lives on the wire type in
/// `persistence` rather than here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedState {
    pub text: String,
    pub theme: Theme,
    pub font: Font,
    pub limit: u32,
    pub limit_enabled: bool,
    pub file_name: String,
}

impl Default for PersistedState {
    fn default() -> Self {
        PersistedState {
            text: String::new(),
            theme: Theme::default(),
            font: Font::default(),
            limit: DEFAULT_LIMIT,
            limit_enabled: false,
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }
}

/// True while the document has never been given a real name.
pub fn is_placeholder_name(name: &str) -> bool {
    name.is_empty() || name == DEFAULT_FILE_NAME
}
