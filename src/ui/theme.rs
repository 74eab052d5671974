//! Light/dark theme and the environment's color-scheme preference.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::PreferenceStore;

/// Preference key holding `"dark"` or `"light"`. Absent means "follow the environment".
pub const THEME_KEY: &str = "theme";

/// Display theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Parse a stored value. Anything but `"dark"` or `"light"` is rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn from_prefers_dark(prefers_dark: bool) -> Self {
        if prefers_dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The theme the user pinned, if any
pub fn stored_theme(store: &dyn PreferenceStore) -> Option<Theme> {
    store.get(THEME_KEY).and_then(|value| Theme::parse(&value))
}

/// Whether the user has pinned a theme. Unrecognised values do not count.
pub fn has_stored_preference(store: &dyn PreferenceStore) -> bool {
    stored_theme(store).is_some()
}

/// Stored theme when present, otherwise the environment's preference
pub fn initial_theme(store: &dyn PreferenceStore, system_prefers_dark: bool) -> Theme {
    stored_theme(store).unwrap_or_else(|| Theme::from_prefers_dark(system_prefers_dark))
}

/// Source of the environment's color-scheme preference
pub trait Appearance {
    fn prefers_dark(&self) -> bool;
}

/// Reads the preference from environment variables.
///
/// `DOIBIB_COLOR_SCHEME` (`dark`/`light`) wins; otherwise the terminal's
/// `COLORFGBG` background index decides. Light when neither says anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvAppearance;

impl Appearance for EnvAppearance {
    fn prefers_dark(&self) -> bool {
        if let Some(theme) = std::env::var("DOIBIB_COLOR_SCHEME")
            .ok()
            .and_then(|v| Theme::parse(v.trim().to_lowercase().as_str()))
        {
            return theme.is_dark();
        }
        std::env::var("COLORFGBG")
            .ok()
            .and_then(|v| colorfgbg_is_dark(&v))
            .unwrap_or(false)
    }
}

/// Interpret a `COLORFGBG` value such as `15;0` or `0;default;15`.
///
/// The last field is the background palette index; 0-6 and 8 are dark.
pub fn colorfgbg_is_dark(value: &str) -> Option<bool> {
    let background: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    Some(matches!(background, 0..=6 | 8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MemoryPreferenceStore;

    #[test]
    fn test_parse_and_display() {
        assert_eq!(Theme::parse("dark"), Some(Theme::Dark));
        assert_eq!(Theme::parse("light"), Some(Theme::Light));
        assert_eq!(Theme::parse("Dark"), None);
        assert_eq!(Theme::parse("blue"), None);
        assert_eq!(Theme::Dark.to_string(), "dark");
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
    }

    #[test]
    fn test_initial_theme_prefers_store() {
        let mut store = MemoryPreferenceStore::new();
        assert_eq!(initial_theme(&store, true), Theme::Dark);
        assert_eq!(initial_theme(&store, false), Theme::Light);

        store.set(THEME_KEY, "light").unwrap();
        assert_eq!(initial_theme(&store, true), Theme::Light);
    }

    #[test]
    fn test_unrecognised_value_is_not_a_preference() {
        let mut store = MemoryPreferenceStore::new();
        store.set(THEME_KEY, "sepia").unwrap();
        assert!(!has_stored_preference(&store));
        assert_eq!(stored_theme(&store), None);
        assert_eq!(initial_theme(&store, true), Theme::Dark);
    }

    #[test]
    fn test_colorfgbg() {
        assert_eq!(colorfgbg_is_dark("15;0"), Some(true));
        assert_eq!(colorfgbg_is_dark("0;15"), Some(false));
        assert_eq!(colorfgbg_is_dark("15;default;8"), Some(true));
        assert_eq!(colorfgbg_is_dark("0;7"), Some(false));
        assert_eq!(colorfgbg_is_dark("15;default"), None);
        assert_eq!(colorfgbg_is_dark(""), None);
    }
}
