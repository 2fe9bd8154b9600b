//! Load/save of the persisted record through a key-value store.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::state::{Font, PersistedState, Theme, DEFAULT_LIMIT};
use crate::store::KeyValueStore;

pub const STORAGE_KEY: &str = "zenNote";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Record<'a> {
    text: &'a str,
    theme: Theme,
    font: Font,
    limit: u32,
    limit_enabled: bool,
    file_name: &'a str,
    last_saved: String,
}

pub struct PersistenceManager<S> {
    store: S,
    saved: bool,
}

impl<S: KeyValueStore> PersistenceManager<S> {
    pub fn new(store: S) -> Self {
        PersistenceManager { store, saved: false }
    }

    /// Never fails: anything missing or malformed falls back to defaults
    /// field by field.
    pub fn load(&self) -> PersistedState {
        let raw = match self.store.get(STORAGE_KEY) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "could not read store, using defaults");
                None
            }
        };

        let fields = raw
            .and_then(|raw| match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(fields)) => Some(fields),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "stored record is not valid JSON");
                    None
                }
            })
            .unwrap_or_default();

        decode(&fields)
    }

    /// Overwrites the whole record under a single key.
    pub fn save(&mut self, state: &PersistedState) -> Result<()> {
        let record = Record {
            text: &state.text,
            theme: state.theme,
            font: state.font,
            limit: state.limit,
            limit_enabled: state.limit_enabled,
            file_name: &state.file_name,
            last_saved: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        self.store.set(STORAGE_KEY, &serde_json::to_string(&record)?)?;
        self.saved = true;
        tracing::debug!(chars = state.text.len(), file = %state.file_name, "state persisted");
        Ok(())
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }
}

fn decode(fields: &Map<String, Value>) -> PersistedState {
    let defaults = PersistedState::default();
    PersistedState {
        text: string_field(fields, "text").unwrap_or(defaults.text),
        theme: fields
            .get("theme")
            .and_then(Value::as_str)
            .and_then(Theme::from_name)
            .unwrap_or(defaults.theme),
        font: fields
            .get("font")
            .and_then(Value::as_str)
            .and_then(Font::from_name)
            .unwrap_or(defaults.font),
        limit: fields.get("limit").and_then(coerce_limit).unwrap_or(DEFAULT_LIMIT),
        limit_enabled: fields.get("limitEnabled").is_some_and(truthy),
        file_name: string_field(fields, "fileName").unwrap_or(defaults.file_name),
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Numbers and numeric strings are accepted; fractions are truncated.
/// Returns `None` for anything that is not a positive count.
fn coerce_limit(value: &Value) -> Option<u32> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    if !number.is_finite() || number < 1.0 {
        return None;
    }
    Some(number.trunc().min(u32::MAX as f64) as u32)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{JsonFileStore, MemoryStore};
    use serde_json::json;

    fn manager_with(raw: &str) -> PersistenceManager<MemoryStore> {
        let mut store = MemoryStore::default();
        store.entries.insert(STORAGE_KEY.to_string(), raw.to_string());
        PersistenceManager::new(store)
    }

    #[test]
    fn empty_store_loads_defaults() {
        let manager = PersistenceManager::new(MemoryStore::default());
        let state = manager.load();
        assert_eq!(state, PersistedState::default());
        assert_eq!(state.text, "");
        assert_eq!(state.theme, Theme::White);
        assert_eq!(state.font, Font::Georgia);
        assert_eq!(state.limit, 500);
        assert!(!state.limit_enabled);
        assert_eq!(state.file_name, "untitled.txt");
    }

    #[test]
    fn malformed_json_loads_defaults() {
        assert_eq!(manager_with("{not json").load(), PersistedState::default());
        assert_eq!(manager_with("[1,2,3]").load(), PersistedState::default());
        assert_eq!(manager_with("null").load(), PersistedState::default());
    }

    #[test]
    fn round_trip_keeps_every_field() {
        let state = PersistedState {
            text: "line one\n\nline  two ".to_string(),
            theme: Theme::Coffee,
            font: Font::OpenSans,
            limit: 1200,
            limit_enabled: true,
            file_name: "draft.md".to_string(),
        };
        let mut manager = PersistenceManager::new(MemoryStore::default());
        manager.save(&state).unwrap();
        assert_eq!(manager.load(), state);
    }

    #[test]
    fn save_writes_camel_case_record_with_timestamp() {
        let mut manager = PersistenceManager::new(MemoryStore::default());
        assert!(!manager.is_saved());
        manager.save(&PersistedState::default()).unwrap();
        assert!(manager.is_saved());

        let raw = manager.store().entries.get(STORAGE_KEY).unwrap();
        let value: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(value["font"], "georgia");
        assert_eq!(value["limitEnabled"], false);
        assert_eq!(value["fileName"], "untitled.txt");
        let stamp = value["lastSaved"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn invalid_fields_default_individually() {
        let raw = json!({
            "text": 42,
            "theme": "neon",
            "font": "openSans",
            "limit": "250",
            "limitEnabled": 1,
            "fileName": null,
        })
        .to_string();
        let state = manager_with(&raw).load();
        assert_eq!(state.text, "");
        assert_eq!(state.theme, Theme::White);
        assert_eq!(state.font, Font::OpenSans);
        assert_eq!(state.limit, 250);
        assert!(state.limit_enabled);
        assert_eq!(state.file_name, "untitled.txt");
    }

    #[test]
    fn limit_coercion() {
        assert_eq!(coerce_limit(&json!(300)), Some(300));
        assert_eq!(coerce_limit(&json!(" 75 ")), Some(75));
        assert_eq!(coerce_limit(&json!(12.9)), Some(12));
        assert_eq!(coerce_limit(&json!(0)), None);
        assert_eq!(coerce_limit(&json!(-5)), None);
        assert_eq!(coerce_limit(&json!("")), None);
        assert_eq!(coerce_limit(&json!("lots")), None);
        assert_eq!(coerce_limit(&json!(true)), None);
    }

    #[test]
    fn limit_enabled_truthiness() {
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!("yes")));
        assert!(truthy(&json!({})));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!(null)));
    }

    #[test]
    fn round_trip_through_file_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        let state = PersistedState {
            text: "hello".to_string(),
            theme: Theme::Dark,
            ..PersistedState::default()
        };

        PersistenceManager::new(JsonFileStore::new(&path)).save(&state).unwrap();
        assert_eq!(PersistenceManager::new(JsonFileStore::new(&path)).load(), state);
    }
}
