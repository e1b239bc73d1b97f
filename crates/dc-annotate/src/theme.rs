//! Light/dark theme resolution and the ink palette derived from it.

use dc_core::Color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Colours applied to drawable objects and the brush.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemePalette {
    pub ink: Color,
    pub stroke_width: f64,
    pub background: Color,
}

const LIGHT: ThemePalette = ThemePalette {
    ink: Color::rgba(0.118, 0.118, 0.118, 1.0),
    stroke_width: 2.0,
    background: Color::WHITE,
};

const DARK: ThemePalette = ThemePalette {
    ink: Color::rgba(0.961, 0.961, 0.961, 1.0),
    stroke_width: 2.0,
    background: Color::rgba(0.071, 0.071, 0.078, 1.0),
};

impl Theme {
    pub fn palette(self) -> ThemePalette {
        match self {
            Theme::Light => LIGHT,
            Theme::Dark => DARK,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// Raw inputs the theme is derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThemeSignals {
    /// Explicit theme class on the document root, if any.
    pub document: Option<Theme>,
    /// `prefers-color-scheme: dark`.
    pub system_dark: bool,
}

impl ThemeSignals {
    /// The document class wins; otherwise follow the system preference.
    pub fn resolve(self) -> Theme {
        match self.document {
            Some(theme) => theme,
            None if self.system_dark => Theme::Dark,
            None => Theme::Light,
        }
    }
}

/// Tracks the signals and reports when the effective theme flips.
#[derive(Debug, Clone, Default)]
pub struct ThemeWatcher {
    signals: ThemeSignals,
    current: Theme,
}

impl ThemeWatcher {
    pub fn new(signals: ThemeSignals) -> Self {
        Self {
            signals,
            current: signals.resolve(),
        }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    pub fn signals(&self) -> ThemeSignals {
        self.signals
    }

    /// Store new signals; returns the theme if it changed.
    pub fn update(&mut self, signals: ThemeSignals) -> Option<Theme> {
        self.signals = signals;
        let next = signals.resolve();
        if next == self.current {
            return None;
        }
        log::debug!("THEME {} -> {}", self.current.as_str(), next.as_str());
        self.current = next;
        Some(next)
    }
}
