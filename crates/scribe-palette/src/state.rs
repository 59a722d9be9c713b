use serde::{Deserialize, Serialize};

use crate::geom::OverlayPoint;
use crate::resolver::AnchorRef;

/// Auxiliary-input flavors a command can request after commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalKind {
    UrlInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PaletteState {
    Closed,
    Open {
        position: OverlayPoint,
        anchor: AnchorRef,
        query: String,
    },
}

impl Default for PaletteState {
    fn default() -> Self {
        PaletteState::Closed
    }
}

impl PaletteState {
    pub fn is_open(&self) -> bool {
        matches!(self, PaletteState::Open { .. })
    }

    pub fn query(&self) -> Option<&str> {
        match self {
            PaletteState::Open { query, .. } => Some(query),
            PaletteState::Closed => None,
        }
    }

    pub fn anchor(&self) -> Option<&AnchorRef> {
        match self {
            PaletteState::Open { anchor, .. } => Some(anchor),
            PaletteState::Closed => None,
        }
    }
}

/// Modal substate, independent of the main palette: a modal routinely stays
/// open after the palette that spawned it has closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ModalState {
    Closed,
    Open {
        kind: ModalKind,
        command: String,
        position: OverlayPoint,
    },
}

impl Default for ModalState {
    fn default() -> Self {
        ModalState::Closed
    }
}

impl ModalState {
    pub fn is_open(&self) -> bool {
        matches!(self, ModalState::Open { .. })
    }
}

#[derive(Debug, Clone)]
pub struct PaletteConfig {
    pub trigger_glyph: char,
    pub line_height: f32,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            trigger_glyph: '/',
            line_height: crate::trigger::LINE_HEIGHT,
        }
    }
}

/// Token identifying one open/close cycle. Deferred work scheduled while the
/// palette was open must re-check its token before applying results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessToken {
    generation: u64,
}

/// Owns the palette and modal state and exposes the only transitions that
/// mutate them. Invalid transitions are silent no-ops: mutation notifications
/// can race with an already-closing palette, so none of these can afford to
/// panic or error.
#[derive(Debug, Default)]
pub struct PaletteStateMachine {
    palette: PaletteState,
    modal: ModalState,
    generation: u64,
}

impl PaletteStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn palette(&self) -> &PaletteState {
        &self.palette
    }

    pub fn modal(&self) -> &ModalState {
        &self.modal
    }

    pub fn is_open(&self) -> bool {
        self.palette.is_open()
    }

    pub fn open(&mut self, position: OverlayPoint, anchor: AnchorRef) {
        self.generation += 1;
        self.palette = PaletteState::Open {
            position,
            anchor,
            query: String::new(),
        };
    }

    /// No-op unless the palette is open.
    pub fn update_query(&mut self, next: impl Into<String>) {
        if let PaletteState::Open { query, .. } = &mut self.palette {
            *query = next.into();
        }
    }

    /// Idempotent; always legal.
    pub fn close(&mut self) {
        self.palette = PaletteState::Closed;
    }

    pub fn open_modal(&mut self, kind: ModalKind, command: impl Into<String>, position: OverlayPoint) {
        self.modal = ModalState::Open {
            kind,
            command: command.into(),
            position,
        };
    }

    pub fn close_modal(&mut self) {
        self.modal = ModalState::Closed;
    }

    pub fn liveness(&self) -> LivenessToken {
        LivenessToken {
            generation: self.generation,
        }
    }

    /// True while the open cycle the token was minted in is still current.
    pub fn is_live(&self, token: LivenessToken) -> bool {
        self.palette.is_open() && token.generation == self.generation
    }
}
