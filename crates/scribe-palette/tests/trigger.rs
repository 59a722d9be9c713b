use scribe_doc::{Cursor, Document, NodeKey, Selection};
use scribe_palette::{KeyEvent, LINE_HEIGHT, PaletteConfig, Rect, Viewport, detect};

struct FixedViewport {
    selection: Option<Rect>,
    node: Option<Rect>,
}

impl Viewport for FixedViewport {
    fn selection_rect(&self, _doc: &Document) -> Option<Rect> {
        self.selection
    }

    fn node_rect(&self, _doc: &Document, _key: NodeKey) -> Option<Rect> {
        self.node
    }
}

fn caret_viewport() -> FixedViewport {
    FixedViewport {
        selection: Some(Rect::new(40.0, 100.0, 2.0, 18.0)),
        node: Some(Rect::new(10.0, 96.0, 600.0, 24.0)),
    }
}

fn slash() -> KeyEvent {
    KeyEvent::Character { ch: '/' }
}

#[test]
fn fires_at_offset_zero_in_a_text_node() {
    let (mut doc, _para, leaf) = Document::with_paragraph("hello");
    doc.perform_edit(|ed| ed.set_cursor(Cursor::new(leaf, 0)));

    let hit = detect(&doc, &slash(), &caret_viewport(), &PaletteConfig::default()).expect("trigger");
    assert_eq!(hit.anchor.key, leaf);
    assert_eq!(hit.anchor.offset, 0);
}

#[test]
fn fires_after_whitespace() {
    let (mut doc, _para, leaf) = Document::with_paragraph("hello ");
    doc.perform_edit(|ed| ed.set_cursor(Cursor::new(leaf, 6)));

    let hit = detect(&doc, &slash(), &caret_viewport(), &PaletteConfig::default()).expect("trigger");
    assert_eq!(hit.anchor.offset, 6);
}

#[test]
fn does_not_fire_mid_word() {
    let (mut doc, _para, leaf) = Document::with_paragraph("hello");
    doc.perform_edit(|ed| ed.set_cursor(Cursor::new(leaf, 3)));

    assert!(detect(&doc, &slash(), &caret_viewport(), &PaletteConfig::default()).is_none());
}

#[test]
fn does_not_fire_for_other_keys_or_glyphs() {
    let (mut doc, _para, leaf) = Document::with_paragraph("");
    doc.perform_edit(|ed| ed.set_cursor(Cursor::new(leaf, 0)));

    assert!(detect(&doc, &KeyEvent::Character { ch: 'a' }, &caret_viewport(), &PaletteConfig::default()).is_none());
    assert!(detect(&doc, &KeyEvent::Enter, &caret_viewport(), &PaletteConfig::default()).is_none());
}

#[test]
fn does_not_fire_on_a_ranged_selection() {
    let (mut doc, _para, leaf) = Document::with_paragraph("hello world");
    doc.perform_edit(|ed| {
        ed.set_selection(Selection {
            anchor: Cursor::new(leaf, 6),
            focus: Cursor::new(leaf, 11),
        });
    });

    assert!(detect(&doc, &slash(), &caret_viewport(), &PaletteConfig::default()).is_none());
}

#[test]
fn position_hangs_below_the_caret_rect() {
    let (mut doc, _para, leaf) = Document::with_paragraph("");
    doc.perform_edit(|ed| ed.set_cursor(Cursor::new(leaf, 0)));

    let hit = detect(&doc, &slash(), &caret_viewport(), &PaletteConfig::default()).expect("trigger");
    assert_eq!(hit.position.x, 40.0);
    assert_eq!(hit.position.y, 118.0);
}

#[test]
fn empty_element_falls_back_to_the_element_rect() {
    let mut doc = Document::new();
    let para = doc.perform_edit(|ed| {
        let para = ed.add_root_element("paragraph");
        ed.set_cursor(Cursor::new(para, 0));
        para
    });

    // No glyph to bound: selection rect is zero-sized.
    let viewport = FixedViewport {
        selection: Some(Rect::new(40.0, 100.0, 0.0, 0.0)),
        node: Some(Rect::new(10.0, 96.0, 600.0, 24.0)),
    };

    let hit = detect(&doc, &slash(), &viewport, &PaletteConfig::default()).expect("trigger");
    assert_eq!(hit.anchor.key, para);
    assert_eq!(hit.anchor.offset, 0);
    assert_eq!(hit.position.x, 10.0);
    assert_eq!(hit.position.y, 96.0 + LINE_HEIGHT);
}

#[test]
fn custom_trigger_glyph() {
    let (mut doc, _para, leaf) = Document::with_paragraph("");
    doc.perform_edit(|ed| ed.set_cursor(Cursor::new(leaf, 0)));

    let config = PaletteConfig {
        trigger_glyph: ':',
        ..PaletteConfig::default()
    };
    assert!(detect(&doc, &KeyEvent::Character { ch: ':' }, &caret_viewport(), &config).is_some());
    assert!(detect(&doc, &slash(), &caret_viewport(), &config).is_none());
}
