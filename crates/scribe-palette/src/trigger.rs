use serde::{Deserialize, Serialize};

use scribe_doc::Document;

use crate::geom::{OverlayPoint, Viewport};
use crate::resolver::AnchorRef;
use crate::state::PaletteConfig;

/// Vertical fallback offset when the selection rect is degenerate and the
/// overlay has to hang off the anchor element's own rect instead.
pub const LINE_HEIGHT: f32 = 24.0;

/// Keyboard input as the engine sees it. The host maps its native key events
/// onto this before calling in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", rename_all = "snake_case")]
pub enum KeyEvent {
    Character { ch: char },
    ArrowUp,
    ArrowDown,
    Enter,
    Tab,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "pointer", rename_all = "snake_case")]
pub enum PointerEvent {
    /// Hover over the filtered candidate at this index.
    Hover { index: usize },
    /// Pointer-down inside the overlay's root element.
    DownInside,
    /// Pointer-down anywhere outside the overlay.
    DownOutside,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerHit {
    pub anchor: AnchorRef,
    pub position: OverlayPoint,
}

/// Decides whether a keydown should open the palette.
///
/// Fires when the key is the trigger glyph, the cursor is collapsed, and the
/// glyph would start a word: offset 0 in a text node, right after whitespace,
/// or inside an element with no text yet. Never consumes the keystroke; the
/// host still inserts the glyph normally.
pub fn detect(
    doc: &Document,
    key: &KeyEvent,
    viewport: &dyn Viewport,
    config: &PaletteConfig,
) -> Option<TriggerHit> {
    let KeyEvent::Character { ch } = key else {
        return None;
    };
    if *ch != config.trigger_glyph {
        return None;
    }

    let cursor = doc.collapsed_cursor()?;

    let at_word_start = if doc.is_text(cursor.key) {
        let content = doc.text_content(cursor.key)?;
        cursor.offset == 0
            || content
                .get(..cursor.offset)
                .and_then(|prefix| prefix.chars().next_back())
                .is_some_and(char::is_whitespace)
    } else if doc.is_element(cursor.key) {
        // An element the cursor can sit in directly has no text yet.
        doc.first_text_child(cursor.key).is_none()
    } else {
        false
    };
    if !at_word_start {
        return None;
    }

    let position = overlay_position(doc, viewport, &cursor, config.line_height);
    Some(TriggerHit {
        anchor: AnchorRef::new(cursor.key, cursor.offset),
        position,
    })
}

fn overlay_position(
    doc: &Document,
    viewport: &dyn Viewport,
    cursor: &scribe_doc::Cursor,
    line_height: f32,
) -> OverlayPoint {
    if let Some(rect) = viewport.selection_rect(doc) {
        if !rect.is_zero_sized() {
            return rect.bottom_left();
        }
    }

    // A caret in an empty element bounds no glyph, so the selection rect is
    // always zero-sized there. Hang the overlay off the element's own rect,
    // shifted down one line.
    let element = if doc.is_element(cursor.key) {
        Some(cursor.key)
    } else {
        doc.parent_key(cursor.key)
    };
    element
        .and_then(|key| viewport.node_rect(doc, key))
        .map(|rect| OverlayPoint::new(rect.x, rect.y + line_height))
        .unwrap_or_default()
}
