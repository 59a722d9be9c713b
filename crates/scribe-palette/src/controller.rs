use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use scribe_doc::{Document, Subscription};

use crate::catalog::{CatalogError, CommandCatalog, CommandError, CommandSpec};
use crate::commit::{remove_trigger_span, trigger_span};
use crate::geom::{OverlayPoint, Viewport};
use crate::navigation::NavigationController;
use crate::resolver::{AnchorRef, Resolution, resolve};
use crate::state::{LivenessToken, ModalState, PaletteConfig, PaletteState, PaletteStateMachine};
use crate::trigger::{KeyEvent, PointerEvent, detect};

/// The palette engine's host-facing surface: detection, query tracking,
/// navigation, and commit, wired over one document.
///
/// All methods run synchronously inside the host's event handlers or its
/// mutation-commit callback; nothing here suspends.
pub struct SlashPalette {
    config: PaletteConfig,
    catalog: CommandCatalog,
    state: PaletteStateMachine,
    navigation: NavigationController,
}

impl SlashPalette {
    pub fn new(config: PaletteConfig) -> Self {
        Self {
            config,
            catalog: CommandCatalog::new(),
            state: PaletteStateMachine::new(),
            navigation: NavigationController::new(),
        }
    }

    pub fn with_stock_commands() -> Self {
        Self {
            config: PaletteConfig::default(),
            catalog: CommandCatalog::stock(),
            state: PaletteStateMachine::new(),
            navigation: NavigationController::new(),
        }
    }

    /// The sole extension point for the catalog.
    pub fn register_command(&mut self, command: CommandSpec) -> Result<(), CatalogError> {
        self.catalog.register(command)
    }

    pub fn config(&self) -> &PaletteConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CommandCatalog {
        &self.catalog
    }

    pub fn state(&self) -> &PaletteState {
        self.state.palette()
    }

    pub fn modal_state(&self) -> &ModalState {
        self.state.modal()
    }

    pub fn selected_index(&self) -> usize {
        self.navigation.selected_index()
    }

    /// The catalog filtered by the live query (full catalog while closed).
    pub fn filtered_commands(&self) -> Vec<&CommandSpec> {
        let query = self.state.palette().query().unwrap_or("");
        self.catalog.filter(query)
    }

    pub fn open(&mut self, position: OverlayPoint, anchor: AnchorRef) {
        log::debug!("palette open at anchor {} offset {}", anchor.key, anchor.offset);
        self.state.open(position, anchor);
        self.navigation.reset();
        self.navigation.sync(&self.catalog.filter(""));
    }

    /// Unconditional and idempotent; safe to call regardless of in-flight
    /// work. Immediately invalidates the anchor for resolution purposes.
    pub fn close(&mut self) {
        if self.state.is_open() {
            log::debug!("palette closed");
        }
        self.state.close();
        self.navigation.reset();
    }

    pub fn liveness(&self) -> LivenessToken {
        self.state.liveness()
    }

    pub fn is_live(&self, token: LivenessToken) -> bool {
        self.state.is_live(token)
    }

    /// Resolution entry point for deferred/scheduled callbacks: applies the
    /// mutation tick only if the open cycle the token was minted in is still
    /// current, discarding stale results.
    pub fn resolve_if_live(&mut self, doc: &Document, token: LivenessToken) {
        if self.is_live(token) {
            self.on_document_mutation(doc);
        }
    }

    /// One resolver pass; invoked per document-mutation notification while
    /// the palette is open. A no-op while closed.
    pub fn on_document_mutation(&mut self, doc: &Document) {
        let Some(anchor) = self.state.palette().anchor().copied() else {
            return;
        };
        match resolve(doc, &anchor, self.config.trigger_glyph) {
            Resolution::Keep => {}
            Resolution::Update { query } => {
                self.state.update_query(query);
                self.sync_navigation();
            }
            Resolution::Close { reason } => {
                log::debug!("palette closing: {reason}");
                self.close();
            }
        }
    }

    /// Routes a keydown. Returns `true` when the palette consumed the key.
    /// The trigger glyph itself is never consumed: detection only opens the
    /// palette as a side effect and lets the glyph insert normally.
    pub fn handle_key(
        &mut self,
        doc: &mut Document,
        key: &KeyEvent,
        viewport: &dyn Viewport,
    ) -> bool {
        if !self.state.is_open() {
            if let Some(hit) = detect(doc, key, viewport, &self.config) {
                self.open(hit.position, hit.anchor);
            }
            return false;
        }

        match key {
            KeyEvent::ArrowDown => {
                self.navigation.select_next();
                true
            }
            KeyEvent::ArrowUp => {
                self.navigation.select_previous();
                true
            }
            KeyEvent::Enter | KeyEvent::Tab => {
                self.commit_selected(doc);
                true
            }
            KeyEvent::Escape => {
                self.close();
                true
            }
            KeyEvent::Character { .. } => false,
        }
    }

    /// Routes pointer input. Hover moves the highlight, pointer-down outside
    /// the overlay closes without committing; the event is never consumed on
    /// the way out so the host still places its own cursor.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> bool {
        if !self.state.is_open() {
            return false;
        }
        match event {
            PointerEvent::Hover { index } => {
                self.navigation.hover(*index);
                true
            }
            PointerEvent::DownInside => true,
            PointerEvent::DownOutside => {
                self.close();
                false
            }
        }
    }

    /// Commits the currently selected command: one atomic edit removing the
    /// trigger and query text, close palette and modal, then hand off to the
    /// command (or open its modal when it needs auxiliary input).
    pub fn commit_selected(&mut self, doc: &mut Document) {
        let (anchor, position) = match self.state.palette() {
            PaletteState::Open {
                anchor, position, ..
            } => (*anchor, *position),
            PaletteState::Closed => return,
        };

        let command = self
            .filtered_commands()
            .get(self.navigation.selected_index())
            .map(|cmd| (*cmd).clone());
        let Some(command) = command else {
            self.close();
            return;
        };

        if let Some(span) = trigger_span(doc, &anchor, self.config.trigger_glyph) {
            remove_trigger_span(doc, span);
        }

        self.close();
        self.state.close_modal();

        match command.modal_kind {
            Some(kind) => {
                log::debug!("command '{}' deferred to modal input", command.name);
                self.state.open_modal(kind, command.name, position);
            }
            None => {
                log::debug!("executing command '{}'", command.name);
                if let Err(err) = (command.handler)(doc, None) {
                    log::warn!("command '{}' failed: {}", command.name, err.message());
                }
            }
        }
    }

    /// Completes a deferred command with the args collected by the modal
    /// (e.g. a URL).
    pub fn submit_modal(&mut self, doc: &mut Document, args: Value) -> Result<(), CommandError> {
        let name = match self.state.modal() {
            ModalState::Open { command, .. } => command.clone(),
            ModalState::Closed => return Err(CommandError::new("No modal open")),
        };
        self.state.close_modal();
        let Some(command) = self.catalog.get(&name).cloned() else {
            return Err(CommandError::new(format!("Unknown command: {name}")));
        };
        (command.handler)(doc, Some(args))
    }

    pub fn dismiss_modal(&mut self) {
        self.state.close_modal();
    }

    /// Subscribes a shared controller to the document's mutation channel.
    ///
    /// The subscription holds a weak handle and skips notifications that fire
    /// while the controller is already borrowed (its own commit edit) or
    /// after it has been dropped, so stale ticks are discarded instead of
    /// re-entering.
    pub fn attach(palette: &Rc<RefCell<SlashPalette>>, doc: &Document) -> Subscription {
        let weak = Rc::downgrade(palette);
        doc.subscribe(move |doc| {
            let Some(cell) = weak.upgrade() else { return };
            let Ok(mut palette) = cell.try_borrow_mut() else {
                return;
            };
            palette.on_document_mutation(doc);
        })
    }

    fn sync_navigation(&mut self) {
        let query = self.state.palette().query().unwrap_or("").to_string();
        self.navigation.sync(&self.catalog.filter(&query));
    }
}
