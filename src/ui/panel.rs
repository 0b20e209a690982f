//! Panel navigation state machine.
//!
//! Exactly one of the four analysis panels is active at a time. The
//! controller owns that value and keeps the view's panel marker and
//! navigation marker in agreement with it.

use std::fmt;
use std::str::FromStr;

use super::PanelView;

/// One of the four mutually exclusive analysis views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Panel {
    #[default]
    Single,
    Batch,
    Upload,
    Analytics,
}

impl Panel {
    pub const ALL: [Panel; 4] = [Self::Single, Self::Batch, Self::Upload, Self::Analytics];

    pub fn id(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Batch => "batch",
            Self::Upload => "upload",
            Self::Analytics => "analytics",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Single => "Single Text",
            Self::Batch => "Batch Analysis",
            Self::Upload => "CSV Upload",
            Self::Analytics => "Analytics",
        }
    }

    /// Panel bound to a keyboard chord: modifier + `1`..`4`.
    pub fn from_chord(chord: &KeyChord) -> Option<Panel> {
        if !chord.modifier {
            return None;
        }
        match chord.key {
            Key::Char('1') => Some(Self::Single),
            Key::Char('2') => Some(Self::Batch),
            Key::Char('3') => Some(Self::Upload),
            Key::Char('4') => Some(Self::Analytics),
            _ => None,
        }
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.id())
    }
}

/// A panel id that names no panel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown panel '{0}'")]
pub struct UnknownPanel(pub String);

impl FromStr for Panel {
    type Err = UnknownPanel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.id().eq_ignore_ascii_case(id))
            .ok_or_else(|| UnknownPanel(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Keyboard
// ---------------------------------------------------------------------------

/// A key the front end can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
}

/// A key press with the platform modifier (Ctrl, or Cmd on macOS) either
/// held or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub modifier: bool,
    pub key: Key,
}

impl KeyChord {
    pub fn with_modifier(c: char) -> Self {
        Self {
            modifier: true,
            key: Key::Char(c),
        }
    }

    pub fn plain(key: Key) -> Self {
        Self {
            modifier: false,
            key,
        }
    }

    pub fn escape() -> Self {
        Self::plain(Key::Escape)
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Outcome of a successful panel change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Panel,
    pub to: Panel,
    /// Entering analytics: the caller should refresh the visualization once
    /// layout has settled.
    pub refresh_analytics: bool,
}

/// Owner of the active-panel value.
#[derive(Debug, Default)]
pub struct PanelController {
    active: Panel,
}

impl PanelController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Panel {
        self.active
    }

    /// Activate the panel named `id`.
    ///
    /// Unknown ids are reported without touching the view, so the previous
    /// panel stays visibly active.
    pub fn set_active(
        &mut self,
        id: &str,
        view: &mut dyn PanelView,
    ) -> Result<Transition, UnknownPanel> {
        let panel: Panel = id.parse()?;
        Ok(self.activate(panel, view))
    }

    /// Activate a known panel.
    pub fn activate(&mut self, panel: Panel, view: &mut dyn PanelView) -> Transition {
        for p in Panel::ALL {
            view.set_panel_active(p, false);
            view.set_nav_active(p, false);
        }
        view.set_panel_active(panel, true);
        view.set_nav_active(panel, true);

        let from = self.active;
        self.active = panel;
        Transition {
            from,
            to: panel,
            refresh_analytics: panel == Panel::Analytics,
        }
    }

    /// Apply the initial markers for the current panel.
    pub fn sync(&mut self, view: &mut dyn PanelView) {
        self.activate(self.active, view);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
