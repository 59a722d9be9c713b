//! Headless walkthrough of the palette pipeline: trigger, query tracking,
//! navigation, and commit, with the resolver's decisions logged.
//!
//! Run with `RUST_LOG=debug cargo run -p scribe-palette --example scripted`.

use scribe_doc::{Cursor, Document, NodeKey};
use scribe_palette::{KeyEvent, Rect, SlashPalette, Viewport};

struct StubViewport;

impl Viewport for StubViewport {
    fn selection_rect(&self, _doc: &Document) -> Option<Rect> {
        Some(Rect::new(120.0, 48.0, 2.0, 18.0))
    }

    fn node_rect(&self, _doc: &Document, _key: NodeKey) -> Option<Rect> {
        Some(Rect::new(0.0, 40.0, 640.0, 26.0))
    }
}

fn main() {
    env_logger::init();

    let (mut doc, _para, leaf) = Document::with_paragraph("");
    doc.perform_edit(|ed| ed.set_cursor(Cursor::new(leaf, 0)));

    let mut palette = SlashPalette::with_stock_commands();

    for ch in "/table".chars() {
        palette.handle_key(&mut doc, &KeyEvent::Character { ch }, &StubViewport);
        doc.perform_edit(|ed| {
            ed.insert_text_at_cursor(&ch.to_string())
                .expect("cursor sits in a text node");
        });
        palette.on_document_mutation(&doc);
        println!(
            "typed {ch:?}: query={:?} candidates={}",
            palette.state().query(),
            palette.filtered_commands().len()
        );
    }

    palette.handle_key(&mut doc, &KeyEvent::Enter, &StubViewport);
    println!("committed; document now has {} blocks", doc.roots().len());
    for &root in doc.roots() {
        if let Some(node) = doc.node(root) {
            println!("  {root}: {node:?}");
        }
    }
}
