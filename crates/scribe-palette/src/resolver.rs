use serde::{Deserialize, Serialize};

use scribe_doc::{Document, Node, NodeKey};

/// The node/offset pair captured at trigger time.
///
/// Interpretation is derived, never stored: when the anchor is an element, the
/// effective text anchor migrates to the element's first text child once one
/// exists, with the trigger offset redefined as 0. The migration is re-derived
/// on every resolution so the ref itself stays immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRef {
    pub key: NodeKey,
    pub offset: usize,
}

impl AnchorRef {
    pub fn new(key: NodeKey, offset: usize) -> Self {
        Self { key, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    AnchorDeleted,
    AnchorInvalid,
    TriggerRemoved,
    SelectionLost,
    SelectionMovedOutside,
    CursorBeforeTrigger,
    /// The query ran into whitespace. Deliberate policy: any whitespace in the
    /// query closes the palette, which also forecloses multi-word queries.
    QueryInvalid,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::AnchorDeleted => "anchor_deleted",
            CloseReason::AnchorInvalid => "anchor_invalid",
            CloseReason::TriggerRemoved => "trigger_removed",
            CloseReason::SelectionLost => "selection_lost",
            CloseReason::SelectionMovedOutside => "selection_moved_outside",
            CloseReason::CursorBeforeTrigger => "cursor_before_trigger",
            CloseReason::QueryInvalid => "query_invalid",
        }
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one resolution pass over a fresh document snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Nothing to do; the palette stays open as-is (e.g. an element anchor
    /// still waiting for its first text child).
    Keep,
    Update {
        query: String,
    },
    Close {
        reason: CloseReason,
    },
}

/// Effective anchor after element-to-text-child migration: the text node that
/// actually holds the trigger glyph, and the glyph's byte offset within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EffectiveAnchor {
    pub text_key: NodeKey,
    pub trigger_offset: usize,
}

pub(crate) enum AnchorLookup {
    Resolved(EffectiveAnchor),
    /// Element anchor with no text child yet; keep waiting.
    Pending,
    Dead(CloseReason),
}

pub(crate) fn effective_anchor(doc: &Document, anchor: &AnchorRef) -> AnchorLookup {
    let Some(node) = doc.node(anchor.key) else {
        return AnchorLookup::Dead(CloseReason::AnchorDeleted);
    };
    match node {
        Node::Text(_) => AnchorLookup::Resolved(EffectiveAnchor {
            text_key: anchor.key,
            trigger_offset: anchor.offset,
        }),
        Node::Element(_) => match doc.first_text_child(anchor.key) {
            Some(text_key) => AnchorLookup::Resolved(EffectiveAnchor {
                text_key,
                trigger_offset: 0,
            }),
            None => AnchorLookup::Pending,
        },
        Node::Void(_) => AnchorLookup::Dead(CloseReason::AnchorInvalid),
    }
}

/// Re-resolves the anchor against the current snapshot and derives the live
/// query or a close reason. Pure; first failing condition wins. Only
/// anchor-local lookups are used (resolve-by-key, child list, text read), so
/// the cost is independent of document size.
pub fn resolve(doc: &Document, anchor: &AnchorRef, glyph: char) -> Resolution {
    let effective = match effective_anchor(doc, anchor) {
        AnchorLookup::Resolved(eff) => eff,
        AnchorLookup::Pending => return Resolution::Keep,
        AnchorLookup::Dead(reason) => return Resolution::Close { reason },
    };

    let Some(Node::Text(text_node)) = doc.node(effective.text_key) else {
        return Resolution::Close {
            reason: CloseReason::AnchorInvalid,
        };
    };
    let content = text_node.text.as_str();

    let glyph_present = content
        .get(effective.trigger_offset..)
        .is_some_and(|tail| tail.starts_with(glyph));
    if !glyph_present {
        return Resolution::Close {
            reason: CloseReason::TriggerRemoved,
        };
    }

    let Some(cursor) = doc.collapsed_cursor() else {
        return Resolution::Close {
            reason: CloseReason::SelectionLost,
        };
    };

    if cursor.key != anchor.key && cursor.key != effective.text_key {
        return Resolution::Close {
            reason: CloseReason::SelectionMovedOutside,
        };
    }

    let query_start = effective.trigger_offset + glyph.len_utf8();
    if cursor.offset < query_start {
        return Resolution::Close {
            reason: CloseReason::CursorBeforeTrigger,
        };
    }
    let Some(query) = content.get(query_start..cursor.offset) else {
        // Cursor offset past the end of the node or off a char boundary;
        // nothing sensible to derive from it.
        return Resolution::Close {
            reason: CloseReason::QueryInvalid,
        };
    };
    if query.chars().any(char::is_whitespace) {
        return Resolution::Close {
            reason: CloseReason::QueryInvalid,
        };
    }

    Resolution::Update {
        query: query.to_string(),
    }
}
