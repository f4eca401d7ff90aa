//! User preference singleton.

use super::SortSpec;
use serde::{Deserialize, Serialize};

/// Colour scheme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    /// Light palette.
    Light,
    /// Dark palette.
    Dark,
    /// Follow the host setting.
    #[default]
    System,
}

/// Task list layout preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// One task per row.
    #[default]
    List,
    /// Cards in a grid.
    Grid,
}

/// Persisted user preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    /// Colour scheme.
    pub theme: Theme,
    /// Initial layout.
    pub default_view: ViewMode,
    /// Ordering applied to task listings.
    pub default_sort: SortSpec,
    /// Whether completed tasks are shown by default.
    pub show_completed: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            default_view: ViewMode::default(),
            default_sort: SortSpec::default(),
            show_completed: true,
        }
    }
}
