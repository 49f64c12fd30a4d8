use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Fields assigned by the backend; never accepted from form input
const SYSTEM_FIELDS: &[&str] = &["id", "created_at"];

/// Errors that can occur during record operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("System field '{0}' cannot be set from form input")]
    SystemFieldNotAllowed(String),
    #[error("Invalid JSON format: {0}")]
    InvalidJson(String),
    #[error("Unsupported language '{0}' (expected 'en' or 'ar')")]
    InvalidLanguage(String),
}

/// Content language tag used by the public pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Ar,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "ar" => Ok(Language::Ar),
            other => Err(RecordError::InvalidLanguage(other.to_string())),
        }
    }
}

/// One row of a content table: a JSON object with a server-assigned `id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRecord {
    fields: Map<String, Value>,
}

impl ContentRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a backend row (system fields allowed)
    pub fn from_row(value: Value) -> Result<Self, RecordError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(RecordError::InvalidJson("Expected JSON object".to_string())),
        }
    }

    /// Build from user input, rejecting system fields
    pub fn from_input(value: Value) -> Result<Self, RecordError> {
        let record = Self::from_row(value)?;
        if let Some(field) = record.fields.keys().find(|k| SYSTEM_FIELDS.contains(&k.as_str())) {
            return Err(RecordError::SystemFieldNotAllowed(field.clone()));
        }
        Ok(record)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set a field value. System fields are ignored with a warning.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        if SYSTEM_FIELDS.contains(&key.as_str()) {
            tracing::warn!("Attempted to set system field '{}' - ignoring", key);
            return self;
        }
        self.fields.insert(key, value.into());
        self
    }

    /// Used by backends and fixtures to assign `id`/`created_at`
    pub fn set_system_field(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Overlay another record's fields onto this one
    pub fn merge(&mut self, other: &ContentRecord) -> &mut Self {
        for (key, value) in &other.fields {
            self.set(key.clone(), value.clone());
        }
        self
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Writable fields only, for insert/update bodies
    pub fn payload(&self) -> ContentRecord {
        let fields = self
            .fields
            .iter()
            .filter(|(k, _)| !SYSTEM_FIELDS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        ContentRecord { fields }
    }

    // ========================================
    // Standard field accessors
    // ========================================

    /// Server-assigned identifier; numeric ids are rendered as strings
    pub fn id(&self) -> Option<String> {
        match self.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn language(&self) -> Option<Language> {
        self.text("language").and_then(|s| s.parse().ok())
    }

    pub fn display_order(&self) -> Option<i64> {
        self.get("display_order").and_then(|v| v.as_i64())
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.text("created_at")
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// String value of a field, if present and a string
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    /// True when the field is absent, null, blank text or an empty list
    pub fn is_blank(&self, key: &str) -> bool {
        match self.get(key) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(Value::Array(items)) => items.is_empty(),
            Some(_) => false,
        }
    }

    // ========================================
    // Achievements (string list)
    // ========================================

    /// The `achievements` list; anything that is not an array reads as empty
    pub fn achievements(&self) -> Vec<String> {
        match self.get("achievements") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn set_achievements(&mut self, achievements: Vec<String>) -> &mut Self {
        self.set("achievements", Value::Array(achievements.into_iter().map(Value::String).collect()))
    }

    /// Coerce a non-array `achievements` value into an empty list
    pub fn normalize_achievements(&mut self) -> &mut Self {
        if self.get("achievements").is_some() {
            let current = self.achievements();
            self.set_achievements(current);
        }
        self
    }

    /// Case-insensitive substring match over the given fields
    pub fn matches_search(&self, term: &str, fields: &[&str]) -> bool {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        fields
            .iter()
            .filter_map(|f| self.text(f))
            .any(|value| value.to_lowercase().contains(&needle))
    }
}

impl From<Map<String, Value>> for ContentRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}
