use scribe_doc::{Cursor, Document, Node, NodeKey};
use scribe_palette::{
    AnchorRef, KeyEvent, ModalState, PaletteState, Rect, SlashPalette, Viewport,
    remove_trigger_span, trigger_span,
};

struct NullViewport;

impl Viewport for NullViewport {
    fn selection_rect(&self, _doc: &Document) -> Option<Rect> {
        Some(Rect::new(0.0, 0.0, 1.0, 16.0))
    }

    fn node_rect(&self, _doc: &Document, _key: NodeKey) -> Option<Rect> {
        None
    }
}

/// Types `text` one character at a time the way a host would: keydown into
/// the palette, insert into the document, then deliver the mutation.
fn type_chars(palette: &mut SlashPalette, doc: &mut Document, text: &str) {
    for ch in text.chars() {
        palette.handle_key(doc, &KeyEvent::Character { ch }, &NullViewport);
        doc.perform_edit(|ed| ed.insert_text_at_cursor(&ch.to_string()).unwrap());
        palette.on_document_mutation(doc);
    }
}

#[test]
fn span_covers_trigger_and_query() {
    let (mut doc, _para, leaf) = Document::with_paragraph("say /tab rest");
    doc.perform_edit(|ed| ed.set_cursor(Cursor::new(leaf, 8)));

    let span = trigger_span(&doc, &AnchorRef::new(leaf, 4), '/').expect("span");
    assert_eq!(span.start, 4);
    assert_eq!(span.end, 8);

    remove_trigger_span(&mut doc, span);
    assert_eq!(doc.text_content(leaf).as_deref(), Some("say  rest"));
    assert_eq!(doc.collapsed_cursor(), Some(Cursor::new(leaf, 4)));
}

#[test]
fn emptied_text_node_moves_selection_to_the_parent() {
    let (mut doc, para, leaf) = Document::with_paragraph("/x");
    doc.perform_edit(|ed| ed.set_cursor(Cursor::new(leaf, 2)));

    let span = trigger_span(&doc, &AnchorRef::new(leaf, 0), '/').expect("span");
    remove_trigger_span(&mut doc, span);

    assert_eq!(doc.text_content(leaf).as_deref(), Some(""));
    assert_eq!(doc.collapsed_cursor(), Some(Cursor::new(para, 0)));
}

#[test]
fn commit_round_trip_runs_the_table_command() {
    let (mut doc, _para, leaf) = Document::with_paragraph("");
    doc.perform_edit(|ed| ed.set_cursor(Cursor::new(leaf, 0)));

    let mut palette = SlashPalette::with_stock_commands();
    type_chars(&mut palette, &mut doc, "/table");
    assert_eq!(palette.state().query(), Some("table"));
    assert_eq!(palette.filtered_commands().len(), 1);

    palette.handle_key(&mut doc, &KeyEvent::Enter, &NullViewport);

    // The trigger text is gone and the palette is closed.
    assert_eq!(doc.text_content(leaf).as_deref(), Some(""));
    assert_eq!(palette.state(), &PaletteState::Closed);

    // The command's effect landed: a 3x3 table after the paragraph.
    let table = doc.roots()[1];
    let Some(Node::Element(el)) = doc.node(table) else {
        panic!("expected table element");
    };
    assert_eq!(el.kind, "table");
    assert_eq!(doc.child_keys(table).len(), 3);
    let row = doc.child_keys(table)[0];
    assert_eq!(doc.child_keys(row).len(), 3);
}

#[test]
fn commit_with_tab_behaves_like_enter() {
    let (mut doc, _para, leaf) = Document::with_paragraph("");
    doc.perform_edit(|ed| ed.set_cursor(Cursor::new(leaf, 0)));

    let mut palette = SlashPalette::with_stock_commands();
    type_chars(&mut palette, &mut doc, "/divider");

    palette.handle_key(&mut doc, &KeyEvent::Tab, &NullViewport);

    assert_eq!(palette.state(), &PaletteState::Closed);
    assert!(doc.roots().len() == 2 && doc.is_void(doc.roots()[1]));
}

#[test]
fn modal_command_defers_execution() {
    let (mut doc, _para, leaf) = Document::with_paragraph("");
    doc.perform_edit(|ed| ed.set_cursor(Cursor::new(leaf, 0)));

    let mut palette = SlashPalette::with_stock_commands();
    type_chars(&mut palette, &mut doc, "/video");
    palette.handle_key(&mut doc, &KeyEvent::Enter, &NullViewport);

    // Trigger text removed, palette closed, but no video node yet: the
    // command is waiting on the modal.
    assert_eq!(doc.text_content(leaf).as_deref(), Some(""));
    assert_eq!(palette.state(), &PaletteState::Closed);
    assert!(matches!(
        palette.modal_state(),
        ModalState::Open { command, .. } if command == "video"
    ));
    assert_eq!(doc.roots().len(), 1);

    palette
        .submit_modal(&mut doc, serde_json::json!({ "url": "https://vimeo.com/1" }))
        .unwrap();

    assert_eq!(palette.modal_state(), &ModalState::Closed);
    assert_eq!(doc.roots().len(), 2);
    assert!(doc.is_void(doc.roots()[1]));
}

#[test]
fn dismissing_the_modal_abandons_the_command() {
    let (mut doc, _para, leaf) = Document::with_paragraph("");
    doc.perform_edit(|ed| ed.set_cursor(Cursor::new(leaf, 0)));

    let mut palette = SlashPalette::with_stock_commands();
    type_chars(&mut palette, &mut doc, "/image");
    palette.handle_key(&mut doc, &KeyEvent::Enter, &NullViewport);
    assert!(palette.modal_state().is_open());

    palette.dismiss_modal();
    assert_eq!(palette.modal_state(), &ModalState::Closed);
    assert_eq!(doc.roots().len(), 1);

    // Submitting now is a registration-visible error, not a panic.
    assert!(
        palette
            .submit_modal(&mut doc, serde_json::json!({ "src": "x" }))
            .is_err()
    );
}

#[test]
fn commit_while_closed_is_a_noop() {
    let (mut doc, _para, leaf) = Document::with_paragraph("unchanged");
    doc.perform_edit(|ed| ed.set_cursor(Cursor::new(leaf, 0)));

    let mut palette = SlashPalette::with_stock_commands();
    palette.commit_selected(&mut doc);

    assert_eq!(doc.text_content(leaf).as_deref(), Some("unchanged"));
    assert_eq!(palette.state(), &PaletteState::Closed);
}
