//! Every user action as a discrete command, reduced by a single pure
//! function into the next state plus the effects to run.

use crate::state::{Font, PersistedState, Theme, DEFAULT_FILE_NAME};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    EditText(String),
    SetTheme(Theme),
    SetFont(Font),
    ToggleLimit,
    /// Raw text from the limit input; parsed and validated here.
    SetLimit(String),
    LoadDocument { file_name: String, text: String },
    RenameDocument(String),
    ResetDocument,
    Autosave,
}

/// Side effects, run by the session in the order given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    RecomputeStats,
    Persist,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: PersistedState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(state: &PersistedState) -> Self {
        Transition {
            state: state.clone(),
            effects: Vec::new(),
        }
    }
}

pub fn apply(state: &PersistedState, command: Command) -> Transition {
    use Effect::{Persist, RecomputeStats};

    let mut next = state.clone();
    let effects = match command {
        Command::EditText(text) => {
            next.text = text;
            vec![RecomputeStats, Persist]
        }
        Command::SetTheme(theme) => {
            next.theme = theme;
            vec![Persist]
        }
        Command::SetFont(font) => {
            next.font = font;
            vec![Persist]
        }
        Command::ToggleLimit => {
            next.limit_enabled = !next.limit_enabled;
            vec![RecomputeStats, Persist]
        }
        Command::SetLimit(input) => match parse_limit(&input) {
            Some(limit) => {
                next.limit = limit;
                vec![RecomputeStats, Persist]
            }
            None => return Transition::unchanged(state),
        },
        Command::LoadDocument { file_name, text } => {
            next.file_name = file_name;
            next.text = text;
            vec![RecomputeStats, Persist]
        }
        Command::RenameDocument(file_name) => {
            next.file_name = file_name;
            vec![RecomputeStats, Persist]
        }
        Command::ResetDocument => {
            next.text.clear();
            next.file_name = DEFAULT_FILE_NAME.to_string();
            vec![RecomputeStats, Persist]
        }
        Command::Autosave => vec![Persist],
    };

    Transition { state: next, effects }
}

/// Leading-integer parse: optional whitespace and sign, then digits; any
/// trailing junk is ignored. Only positive values are accepted.
pub fn parse_limit(input: &str) -> Option<u32> {
    let s = input.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if negative || digits.is_empty() {
        return None;
    }
    match digits.parse::<u32>() {
        Ok(0) => None,
        Ok(n) => Some(n),
        // Too many digits for u32, still a positive number
        Err(_) => Some(u32::MAX),
    }
}
