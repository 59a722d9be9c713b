use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;

use crate::key::NodeKey;
use crate::node::{Attrs, Cursor, ElementNode, Node, Selection, TextNode, VoidNode};

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("unknown node key {0}")]
    UnknownKey(NodeKey),
    #[error("node {0} is not an element")]
    NotAnElement(NodeKey),
    #[error("node {0} is not a text node")]
    NotAText(NodeKey),
    #[error("child index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },
}

#[derive(Debug, Clone)]
struct NodeSlot {
    node: Node,
    parent: Option<NodeKey>,
}

type MutationCallback = Rc<RefCell<dyn FnMut(&Document)>>;

/// Handle returned by [`Document::subscribe`]; pass it back to
/// [`Document::unsubscribe`] to stop receiving mutation notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    id: u64,
}

/// A tree document held in an arena addressed by opaque [`NodeKey`]s.
///
/// Elements own their children; the parent link stored alongside each node is
/// a lookup-only back-reference. All mutation goes through
/// [`Document::perform_edit`], which commits the whole closure as one atomic
/// edit and then notifies subscribers exactly once.
pub struct Document {
    slots: HashMap<NodeKey, NodeSlot>,
    roots: Vec<NodeKey>,
    selection: Option<Selection>,
    next_key: u64,
    revision: u64,
    subscribers: RefCell<Vec<(u64, MutationCallback)>>,
    next_subscriber_id: Cell<u64>,
    notifying: Cell<bool>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            roots: Vec::new(),
            selection: None,
            next_key: 0,
            revision: 0,
            subscribers: RefCell::new(Vec::new()),
            next_subscriber_id: Cell::new(0),
            notifying: Cell::new(false),
        }
    }

    /// A document holding a single paragraph with one text child. Returns the
    /// paragraph and text keys alongside the document; the selection is left
    /// unset.
    pub fn with_paragraph(text: impl Into<String>) -> (Self, NodeKey, NodeKey) {
        let mut doc = Self::new();
        let (para, leaf) = doc.perform_edit(|ed| {
            let para = ed.add_root_element("paragraph");
            let leaf = ed
                .append_text(para, text)
                .unwrap_or_else(|_| unreachable!("paragraph was just created"));
            (para, leaf)
        });
        (doc, para, leaf)
    }

    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.slots.get(&key).map(|slot| &slot.node)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.slots.contains_key(&key)
    }

    pub fn parent_key(&self, key: NodeKey) -> Option<NodeKey> {
        self.slots.get(&key).and_then(|slot| slot.parent)
    }

    pub fn child_keys(&self, key: NodeKey) -> &[NodeKey] {
        match self.node(key) {
            Some(Node::Element(el)) => &el.children,
            _ => &[],
        }
    }

    pub fn index_in_parent(&self, key: NodeKey) -> Option<usize> {
        let siblings = match self.parent_key(key) {
            Some(parent) => self.child_keys(parent),
            None => &self.roots,
        };
        siblings.iter().position(|&k| k == key)
    }

    /// First direct child that is a text node, skipping voids and nested
    /// elements. Anchor-local: cost is bounded by the element's child count.
    pub fn first_text_child(&self, key: NodeKey) -> Option<NodeKey> {
        self.child_keys(key)
            .iter()
            .copied()
            .find(|&child| self.is_text(child))
    }

    pub fn is_element(&self, key: NodeKey) -> bool {
        matches!(self.node(key), Some(Node::Element(_)))
    }

    pub fn is_text(&self, key: NodeKey) -> bool {
        matches!(self.node(key), Some(Node::Text(_)))
    }

    pub fn is_void(&self, key: NodeKey) -> bool {
        matches!(self.node(key), Some(Node::Void(_)))
    }

    /// Concatenated text of the node and its descendants. `None` only when
    /// the key does not resolve.
    pub fn text_content(&self, key: NodeKey) -> Option<String> {
        let node = self.node(key)?;
        let mut out = String::new();
        self.collect_text(node, &mut out);
        Some(out)
    }

    fn collect_text(&self, node: &Node, out: &mut String) {
        match node {
            Node::Text(t) => out.push_str(&t.text),
            Node::Element(el) => {
                for &child in &el.children {
                    if let Some(child_node) = self.node(child) {
                        self.collect_text(child_node, out);
                    }
                }
            }
            Node::Void(_) => {}
        }
    }

    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// The collapsed cursor, if the current selection is collapsed.
    pub fn collapsed_cursor(&self) -> Option<Cursor> {
        self.selection
            .as_ref()
            .filter(|sel| sel.is_collapsed())
            .map(|sel| sel.focus)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Runs `f` as one atomic edit, then bumps the revision and notifies every
    /// subscriber once. Nested `perform_edit` from inside a notification is a
    /// host bug and panics in debug builds.
    pub fn perform_edit<R>(&mut self, f: impl FnOnce(&mut DocumentEditor) -> R) -> R {
        debug_assert!(
            !self.notifying.get(),
            "perform_edit re-entered from a mutation notification"
        );
        let out = f(&mut DocumentEditor { doc: self });
        self.revision += 1;
        log::trace!("document edit committed, revision {}", self.revision);
        self.notify();
        out
    }

    pub fn subscribe(&self, callback: impl FnMut(&Document) + 'static) -> Subscription {
        let id = self.next_subscriber_id.get();
        self.next_subscriber_id.set(id + 1);
        let callback: MutationCallback = Rc::new(RefCell::new(callback));
        self.subscribers.borrow_mut().push((id, callback));
        Subscription { id }
    }

    pub fn unsubscribe(&self, subscription: Subscription) {
        self.subscribers
            .borrow_mut()
            .retain(|(id, _)| *id != subscription.id);
    }

    fn notify(&self) {
        self.notifying.set(true);
        let entries: Vec<(u64, MutationCallback)> = self.subscribers.borrow().clone();
        for (id, callback) in entries {
            let still_subscribed = self
                .subscribers
                .borrow()
                .iter()
                .any(|(live, _)| *live == id);
            if still_subscribed {
                (callback.borrow_mut())(self);
            }
        }
        self.notifying.set(false);
    }

    fn alloc(&mut self, node: Node, parent: Option<NodeKey>) -> NodeKey {
        let key = NodeKey::new(self.next_key);
        self.next_key += 1;
        self.slots.insert(key, NodeSlot { node, parent });
        key
    }
}

/// Mutable view handed to the [`Document::perform_edit`] closure. Derefs to
/// [`Document`] for the read API.
pub struct DocumentEditor<'a> {
    doc: &'a mut Document,
}

impl std::ops::Deref for DocumentEditor<'_> {
    type Target = Document;

    fn deref(&self) -> &Document {
        self.doc
    }
}

impl DocumentEditor<'_> {
    pub fn add_root_element(&mut self, kind: impl Into<String>) -> NodeKey {
        let key = self.doc.alloc(
            Node::Element(ElementNode {
                kind: kind.into(),
                attrs: Attrs::default(),
                children: Vec::new(),
            }),
            None,
        );
        self.doc.roots.push(key);
        key
    }

    pub fn append_element(
        &mut self,
        parent: NodeKey,
        kind: impl Into<String>,
    ) -> Result<NodeKey, EditError> {
        let index = self.doc.child_keys(parent).len();
        self.insert_element_at(parent, index, kind)
    }

    pub fn insert_element_at(
        &mut self,
        parent: NodeKey,
        index: usize,
        kind: impl Into<String>,
    ) -> Result<NodeKey, EditError> {
        let node = Node::Element(ElementNode {
            kind: kind.into(),
            attrs: Attrs::default(),
            children: Vec::new(),
        });
        self.insert_child(parent, index, node)
    }

    pub fn append_text(
        &mut self,
        parent: NodeKey,
        text: impl Into<String>,
    ) -> Result<NodeKey, EditError> {
        let index = self.doc.child_keys(parent).len();
        let node = Node::Text(TextNode { text: text.into() });
        self.insert_child(parent, index, node)
    }

    pub fn append_void(
        &mut self,
        parent: NodeKey,
        kind: impl Into<String>,
    ) -> Result<NodeKey, EditError> {
        let index = self.doc.child_keys(parent).len();
        self.insert_void_at(parent, index, kind)
    }

    pub fn insert_void_at(
        &mut self,
        parent: NodeKey,
        index: usize,
        kind: impl Into<String>,
    ) -> Result<NodeKey, EditError> {
        let node = Node::Void(VoidNode {
            kind: kind.into(),
            attrs: Attrs::default(),
        });
        self.insert_child(parent, index, node)
    }

    /// Inserts a freshly allocated root element at `index` among the roots.
    pub fn insert_root_element_at(
        &mut self,
        index: usize,
        kind: impl Into<String>,
    ) -> Result<NodeKey, EditError> {
        if index > self.doc.roots.len() {
            return Err(EditError::IndexOutOfBounds {
                index,
                len: self.doc.roots.len(),
            });
        }
        let key = self.doc.alloc(
            Node::Element(ElementNode {
                kind: kind.into(),
                attrs: Attrs::default(),
                children: Vec::new(),
            }),
            None,
        );
        self.doc.roots.insert(index, key);
        Ok(key)
    }

    pub fn insert_root_void_at(
        &mut self,
        index: usize,
        kind: impl Into<String>,
    ) -> Result<NodeKey, EditError> {
        if index > self.doc.roots.len() {
            return Err(EditError::IndexOutOfBounds {
                index,
                len: self.doc.roots.len(),
            });
        }
        let key = self.doc.alloc(
            Node::Void(VoidNode {
                kind: kind.into(),
                attrs: Attrs::default(),
            }),
            None,
        );
        self.doc.roots.insert(index, key);
        Ok(key)
    }

    fn insert_child(
        &mut self,
        parent: NodeKey,
        index: usize,
        node: Node,
    ) -> Result<NodeKey, EditError> {
        match self.doc.node(parent) {
            Some(Node::Element(el)) => {
                if index > el.children.len() {
                    return Err(EditError::IndexOutOfBounds {
                        index,
                        len: el.children.len(),
                    });
                }
            }
            Some(_) => return Err(EditError::NotAnElement(parent)),
            None => return Err(EditError::UnknownKey(parent)),
        }
        let key = self.doc.alloc(node, Some(parent));
        let Some(NodeSlot {
            node: Node::Element(el),
            ..
        }) = self.doc.slots.get_mut(&parent)
        else {
            unreachable!("parent checked above");
        };
        el.children.insert(index, key);
        Ok(key)
    }

    pub fn set_text(&mut self, key: NodeKey, text: impl Into<String>) -> Result<(), EditError> {
        let slot = self
            .doc
            .slots
            .get_mut(&key)
            .ok_or(EditError::UnknownKey(key))?;
        match &mut slot.node {
            Node::Text(t) => {
                t.text = text.into();
                Ok(())
            }
            _ => Err(EditError::NotAText(key)),
        }
    }

    pub fn insert_text(
        &mut self,
        key: NodeKey,
        offset: usize,
        text: &str,
    ) -> Result<(), EditError> {
        let slot = self
            .doc
            .slots
            .get_mut(&key)
            .ok_or(EditError::UnknownKey(key))?;
        let Node::Text(t) = &mut slot.node else {
            return Err(EditError::NotAText(key));
        };
        let offset = clamp_to_char_boundary(&t.text, offset);
        t.text.insert_str(offset, text);
        transform_selection_insert_text(&mut self.doc.selection, key, offset, text.len());
        Ok(())
    }

    pub fn remove_text(&mut self, key: NodeKey, range: Range<usize>) -> Result<(), EditError> {
        let slot = self
            .doc
            .slots
            .get_mut(&key)
            .ok_or(EditError::UnknownKey(key))?;
        let Node::Text(t) = &mut slot.node else {
            return Err(EditError::NotAText(key));
        };
        let start = clamp_to_char_boundary(&t.text, range.start.min(t.text.len()));
        let end = clamp_to_char_boundary(&t.text, range.end.min(t.text.len()));
        if start >= end {
            return Ok(());
        }
        t.text.replace_range(start..end, "");
        transform_selection_remove_text(&mut self.doc.selection, key, start..end);
        Ok(())
    }

    /// Inserts `text` at the collapsed cursor and advances it, the way a
    /// keystroke would.
    pub fn insert_text_at_cursor(&mut self, text: &str) -> Result<(), EditError> {
        let Some(cursor) = self.doc.collapsed_cursor() else {
            return Ok(());
        };
        self.insert_text(cursor.key, cursor.offset, text)
    }

    pub fn set_kind(&mut self, key: NodeKey, kind: impl Into<String>) -> Result<(), EditError> {
        let slot = self
            .doc
            .slots
            .get_mut(&key)
            .ok_or(EditError::UnknownKey(key))?;
        match &mut slot.node {
            Node::Element(el) => {
                el.kind = kind.into();
                Ok(())
            }
            Node::Void(v) => {
                v.kind = kind.into();
                Ok(())
            }
            Node::Text(_) => Err(EditError::NotAnElement(key)),
        }
    }

    pub fn set_attr(
        &mut self,
        key: NodeKey,
        name: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<(), EditError> {
        let slot = self
            .doc
            .slots
            .get_mut(&key)
            .ok_or(EditError::UnknownKey(key))?;
        match &mut slot.node {
            Node::Element(el) => {
                el.attrs.insert(name.into(), value);
                Ok(())
            }
            Node::Void(v) => {
                v.attrs.insert(name.into(), value);
                Ok(())
            }
            Node::Text(_) => Err(EditError::NotAnElement(key)),
        }
    }

    /// Removes the node and its whole subtree, detaching it from the parent
    /// (or root list). A selection pointing into the removed subtree is
    /// cleared.
    pub fn remove_node(&mut self, key: NodeKey) -> Result<(), EditError> {
        if !self.doc.contains(key) {
            return Err(EditError::UnknownKey(key));
        }

        match self.doc.parent_key(key) {
            Some(parent) => {
                if let Some(NodeSlot {
                    node: Node::Element(el),
                    ..
                }) = self.doc.slots.get_mut(&parent)
                {
                    el.children.retain(|&k| k != key);
                }
            }
            None => self.doc.roots.retain(|&k| k != key),
        }

        let mut removed = Vec::new();
        collect_subtree(self.doc, key, &mut removed);
        for k in &removed {
            self.doc.slots.remove(k);
        }

        let selection_gone = self
            .doc
            .selection
            .as_ref()
            .is_some_and(|sel| removed.contains(&sel.anchor.key) || removed.contains(&sel.focus.key));
        if selection_gone {
            self.doc.selection = None;
        }
        Ok(())
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.doc.selection = Some(selection);
    }

    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.doc.selection = Some(Selection::collapsed(cursor));
    }

    pub fn clear_selection(&mut self) {
        self.doc.selection = None;
    }
}

fn collect_subtree(doc: &Document, key: NodeKey, out: &mut Vec<NodeKey>) {
    out.push(key);
    for child in doc.child_keys(key).to_vec() {
        collect_subtree(doc, child, out);
    }
}

fn clamp_to_char_boundary(s: &str, mut ix: usize) -> usize {
    ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}

fn transform_selection_insert_text(
    selection: &mut Option<Selection>,
    key: NodeKey,
    offset: usize,
    len: usize,
) {
    let Some(sel) = selection else { return };
    for point in [&mut sel.anchor, &mut sel.focus] {
        if point.key == key && point.offset >= offset {
            point.offset = point.offset.saturating_add(len);
        }
    }
}

fn transform_selection_remove_text(
    selection: &mut Option<Selection>,
    key: NodeKey,
    range: Range<usize>,
) {
    let Some(sel) = selection else { return };
    let removed_len = range.end.saturating_sub(range.start);
    for point in [&mut sel.anchor, &mut sel.focus] {
        if point.key != key {
            continue;
        }
        if point.offset <= range.start {
            continue;
        }
        if point.offset >= range.end {
            point.offset = point.offset.saturating_sub(removed_len);
        } else {
            point.offset = range.start;
        }
    }
}
