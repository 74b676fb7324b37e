use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
#[cfg(test)]
use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use ratatui::style::Color;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::PrefsError;

pub const ACCENT_KEY: &str = "pomodoro:accent";
pub const DEFAULT_ACCENT: &str = "#4f46e5";
pub const PRESSED_DARKEN: f64 = 0.12;
pub const RING_ALPHA: f64 = 0.35;

// ============================================================================
// Colors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Accepts `#rgb` or `#rrggbb`, with or without the leading `#`.
    pub fn parse_hex(s: &str) -> Result<Self, PrefsError> {
        let invalid = || PrefsError::InvalidColor(s.to_string());
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let full = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => digits.to_string(),
            _ => return Err(invalid()),
        };
        let n = u32::from_str_radix(&full, 16).map_err(|_| invalid())?;
        Ok(Self::new((n >> 16) as u8, (n >> 8) as u8, n as u8))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Scales every channel by `1 - amount`, rounding down.
    pub fn darken(self, amount: f64) -> Self {
        let d = |v: u8| (v as f64 * (1.0 - amount)).floor().max(0.0) as u8;
        Self::new(d(self.r), d(self.g), d(self.b))
    }

    /// Alpha-composites this color over `background`.
    pub fn over(self, background: Rgb, alpha: f64) -> Self {
        let mix = |fg: u8, bg: u8| (fg as f64 * alpha + bg as f64 * (1.0 - alpha)).round() as u8;
        Self::new(mix(self.r, background.r), mix(self.g, background.g), mix(self.b, background.b))
    }

    pub fn css_rgba(self, alpha: f64) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
    }
}

impl From<Rgb> for Color {
    fn from(c: Rgb) -> Self {
        Color::Rgb(c.r, c.g, c.b)
    }
}

/// Base accent plus the shades derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accent {
    pub base: Rgb,
}

impl Accent {
    pub fn new(base: Rgb) -> Self {
        Self { base }
    }

    pub fn pressed(&self) -> Rgb {
        self.base.darken(PRESSED_DARKEN)
    }

    pub fn ring(&self, background: Rgb) -> Rgb {
        self.base.over(background, RING_ALPHA)
    }
}

impl Default for Accent {
    fn default() -> Self {
        Self::new(Rgb::new(0x4f, 0x46, 0xe5))
    }
}

// ============================================================================
// Preference Stores
// ============================================================================

/// String key-value slot that survives restarts.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PrefsError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError>;
}

/// JSON object on disk. Keys it does not know about are kept on write,
/// whatever their value type.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<Map<String, Value>, PrefsError> {
        match fs::read_to_string(&self.path) {
            Ok(s) if s.trim().is_empty() => Ok(Map::new()),
            Ok(s) => Ok(serde_json::from_str(&s)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PrefsError> {
        // A non-string value surfaces as its JSON text and fails color parsing.
        Ok(self.read_all()?.remove(key).map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        }))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        let mut all = self.read_all()?;
        all.insert(key.to_string(), Value::String(value.to_string()));
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&all)?)?;
        Ok(())
    }
}

/// Process-local store; clones share the same slots.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Rc<RefCell<BTreeMap<String, String>>>,
}

#[cfg(test)]
impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PrefsError> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ============================================================================
// Accent Preference
// ============================================================================

/// Loads and saves the accent color. An unreadable store falls back to the
/// default color and stops persisting for the rest of the run.
pub struct AccentPreference {
    store: Box<dyn PreferenceStore>,
    persist: bool,
}

impl AccentPreference {
    pub fn new(store: Box<dyn PreferenceStore>) -> Self {
        Self { store, persist: true }
    }

    pub fn is_persisting(&self) -> bool {
        self.persist
    }

    pub fn load(&mut self) -> String {
        match self.store.get(ACCENT_KEY) {
            Ok(Some(saved)) => match Rgb::parse_hex(&saved) {
                Ok(c) => {
                    debug!(accent = %saved, "loaded accent");
                    c.to_hex()
                }
                Err(e) => {
                    warn!(error = %e, "ignoring saved accent");
                    DEFAULT_ACCENT.to_string()
                }
            },
            Ok(None) => DEFAULT_ACCENT.to_string(),
            Err(e) => {
                warn!(error = %e, "preference store unavailable, accent will not be saved");
                self.persist = false;
                DEFAULT_ACCENT.to_string()
            }
        }
    }

    /// Validates and stores `color`, returning its normalized form. Store
    /// failures are logged and swallowed; only a malformed color is an error.
    pub fn save(&mut self, color: &str) -> Result<String, PrefsError> {
        let hex = Rgb::parse_hex(color)?.to_hex();
        if !self.persist {
            debug!(accent = %hex, "not persisting accent");
            return Ok(hex);
        }
        match self.store.set(ACCENT_KEY, &hex) {
            Ok(()) => info!(accent = %hex, "saved accent"),
            Err(e) => warn!(error = %e, "could not save accent"),
        }
        Ok(hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl PreferenceStore for BrokenStore {
        fn get(&self, _: &str) -> Result<Option<String>, PrefsError> {
            Err(PrefsError::Io(std::io::Error::new(ErrorKind::PermissionDenied, "denied")))
        }

        fn set(&mut self, _: &str, _: &str) -> Result<(), PrefsError> {
            panic!("must not write after a failed load");
        }
    }

    struct ReadOnlyStore;

    impl PreferenceStore for ReadOnlyStore {
        fn get(&self, _: &str) -> Result<Option<String>, PrefsError> {
            Ok(None)
        }

        fn set(&mut self, _: &str, _: &str) -> Result<(), PrefsError> {
            Err(PrefsError::Io(std::io::Error::new(ErrorKind::PermissionDenied, "read-only")))
        }
    }

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(Rgb::parse_hex("#4f46e5").unwrap(), Rgb::new(0x4f, 0x46, 0xe5));
        assert_eq!(Rgb::parse_hex("abc").unwrap(), Rgb::new(0xaa, 0xbb, 0xcc));
        assert!(Rgb::parse_hex("#12345").is_err());
        assert!(Rgb::parse_hex("#gg0000").is_err());
        assert!(Rgb::parse_hex("").is_err());
        assert!(Rgb::parse_hex("##abc").is_err());
        assert!(Rgb::parse_hex("#a#bc").is_err());
    }

    #[test]
    fn derived_shades_are_deterministic() {
        let accent = Accent::default();
        assert_eq!(accent.pressed().to_hex(), "#453dc9");
        assert_eq!(accent.base.css_rgba(RING_ALPHA), "rgba(79, 70, 229, 0.35)");
        assert_eq!(accent.ring(Rgb::new(255, 255, 255)), Rgb::new(193, 190, 246));
        assert_eq!(accent.ring(Rgb::new(0, 0, 0)), Rgb::new(28, 25, 80));
    }

    #[test]
    fn round_trips_through_a_new_instance() {
        let store = MemoryStore::default();
        let mut first = AccentPreference::new(Box::new(store.clone()));
        assert_eq!(first.save("#112233").unwrap(), "#112233");

        let mut second = AccentPreference::new(Box::new(store));
        assert_eq!(second.load(), "#112233");
    }

    #[test]
    fn defaults_without_prior_save() {
        let mut prefs = AccentPreference::new(Box::new(MemoryStore::default()));
        assert_eq!(prefs.load(), DEFAULT_ACCENT);
    }

    #[test]
    fn rejects_malformed_colors_without_writing() {
        let store = MemoryStore::default();
        let mut prefs = AccentPreference::new(Box::new(store.clone()));
        assert!(matches!(prefs.save("teal"), Err(PrefsError::InvalidColor(_))));
        assert_eq!(store.get(ACCENT_KEY).unwrap(), None);
    }

    #[test]
    fn unavailable_store_degrades_to_default() {
        let mut prefs = AccentPreference::new(Box::new(BrokenStore));
        assert_eq!(prefs.load(), DEFAULT_ACCENT);
        assert!(!prefs.is_persisting());
        assert_eq!(prefs.save("#abcdef").unwrap(), "#abcdef");
    }

    #[test]
    fn failed_write_still_returns_the_color() {
        let mut prefs = AccentPreference::new(Box::new(ReadOnlyStore));
        assert_eq!(prefs.load(), DEFAULT_ACCENT);
        assert!(prefs.is_persisting());
        assert_eq!(prefs.save("#abcdef").unwrap(), "#abcdef");
        assert_eq!(prefs.save("#ABC").unwrap(), "#aabbcc");
    }

    #[test]
    fn file_store_keeps_non_string_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, r##"{"other": 1, "nested": {"on": true}, "pomodoro:accent": "#0f0"}"##).unwrap();

        let mut prefs = AccentPreference::new(Box::new(JsonFileStore::new(&path)));
        assert_eq!(prefs.load(), "#00ff00");
        assert!(prefs.is_persisting());
        prefs.save("#112233").unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["other"], 1);
        assert_eq!(raw["nested"]["on"], true);
        assert_eq!(raw[ACCENT_KEY], "#112233");
    }

    #[test]
    fn non_string_accent_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, r#"{"pomodoro:accent": 42}"#).unwrap();

        let mut prefs = AccentPreference::new(Box::new(JsonFileStore::new(&path)));
        assert_eq!(prefs.load(), DEFAULT_ACCENT);
        assert!(prefs.is_persisting());
    }

    #[test]
    fn file_store_round_trip_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"other": "value"}"#).unwrap();

        let mut prefs = AccentPreference::new(Box::new(JsonFileStore::new(&path)));
        prefs.save("#112233").unwrap();

        let mut reopened = AccentPreference::new(Box::new(JsonFileStore::new(&path)));
        assert_eq!(reopened.load(), "#112233");

        let raw: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.get("other").map(String::as_str), Some("value"));
    }

    #[test]
    fn missing_file_loads_default_and_save_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tomatick").join("prefs.json");
        let mut prefs = AccentPreference::new(Box::new(JsonFileStore::new(&path)));
        assert_eq!(prefs.load(), DEFAULT_ACCENT);
        prefs.save("#0a0b0c").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn corrupt_file_degrades_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "not json").unwrap();
        let mut prefs = AccentPreference::new(Box::new(JsonFileStore::new(&path)));
        assert_eq!(prefs.load(), DEFAULT_ACCENT);
        assert!(!prefs.is_persisting());
    }
}
