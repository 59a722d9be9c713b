use scribe_doc::{Cursor, Document, NodeKey};

use crate::resolver::{AnchorLookup, AnchorRef, effective_anchor};

/// Byte span of the trigger glyph plus the live query inside the effective
/// anchor text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerSpan {
    pub text_key: NodeKey,
    pub start: usize,
    pub end: usize,
}

/// Derives the span to remove on commit from the current snapshot: trigger
/// offset through the collapsed cursor. `None` when the anchor no longer
/// resolves to a text node holding the glyph with the cursor past it.
pub fn trigger_span(doc: &Document, anchor: &AnchorRef, glyph: char) -> Option<TriggerSpan> {
    let effective = match effective_anchor(doc, anchor) {
        AnchorLookup::Resolved(eff) => eff,
        AnchorLookup::Pending | AnchorLookup::Dead(_) => return None,
    };
    let content = doc.node(effective.text_key)?.as_text()?.text.clone();
    if !content
        .get(effective.trigger_offset..)
        .is_some_and(|tail| tail.starts_with(glyph))
    {
        return None;
    }
    let cursor = doc.collapsed_cursor()?;
    if cursor.key != anchor.key && cursor.key != effective.text_key {
        return None;
    }
    let end = cursor
        .offset
        .max(effective.trigger_offset + glyph.len_utf8())
        .min(content.len());
    Some(TriggerSpan {
        text_key: effective.text_key,
        start: effective.trigger_offset,
        end,
    })
}

/// One atomic edit removing the trigger glyph and the query substring:
/// `new_text = prefix_before_trigger + suffix_after_query`.
///
/// If the node ends up empty the selection moves to the parent container
/// rather than staying inside a now-empty, soon-to-be-pruned text node;
/// otherwise the cursor lands where the trigger used to be.
pub fn remove_trigger_span(doc: &mut Document, span: TriggerSpan) {
    doc.perform_edit(|ed| {
        let Some(text) = ed.node(span.text_key).and_then(|node| node.as_text()) else {
            return;
        };
        let (Some(prefix), Some(suffix)) = (text.text.get(..span.start), text.text.get(span.end..))
        else {
            return;
        };
        let mut new_text = String::with_capacity(prefix.len() + suffix.len());
        new_text.push_str(prefix);
        new_text.push_str(suffix);
        let emptied = new_text.is_empty();

        if ed.set_text(span.text_key, new_text).is_err() {
            return;
        }

        if emptied {
            if let Some(parent) = ed.parent_key(span.text_key) {
                ed.set_cursor(Cursor::new(parent, 0));
                return;
            }
        }
        ed.set_cursor(Cursor::new(span.text_key, span.start));
    });
}
