use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use scribe_doc::{Document, NodeKey};

use crate::state::ModalKind;

/// Failure reported by a command's `execute`. By the time a handler runs the
/// trigger-removal edit has committed and the palette has closed, so the
/// failure is the command's own concern; it cannot roll the edit back.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Registration-time failures. These fail fast at startup, unlike the
/// steady-state close reasons which are plain values.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate command name: {0}")]
    DuplicateName(String),
}

pub type CommandHandler =
    Arc<dyn Fn(&mut Document, Option<Value>) -> Result<(), CommandError> + Send + Sync>;

/// A palette entry: metadata for filtering and display plus an opaque effect
/// against the document. The handler is required at construction, so a
/// command without an execute path is unrepresentable.
#[derive(Clone)]
pub struct CommandSpec {
    pub name: String,
    pub label: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub icon: Option<String>,
    pub modal_kind: Option<ModalKind>,
    pub handler: CommandHandler,
}

impl CommandSpec {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        handler: impl Fn(&mut Document, Option<Value>) -> Result<(), CommandError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            description: None,
            keywords: Vec::new(),
            icon: None,
            modal_kind: None,
            handler: Arc::new(handler),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Marks the command as deferring execution to an auxiliary input flow.
    pub fn modal(mut self, kind: ModalKind) -> Self {
        self.modal_kind = Some(kind);
        self
    }

    fn matches(&self, needle: &str) -> bool {
        if self.name.to_lowercase().contains(needle) || self.label.to_lowercase().contains(needle) {
            return true;
        }
        self.keywords
            .iter()
            .any(|kw| kw.to_lowercase().contains(needle))
    }
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("keywords", &self.keywords)
            .field("modal_kind", &self.modal_kind)
            .finish_non_exhaustive()
    }
}

/// Registry of available commands, kept in registration order.
#[derive(Debug, Default)]
pub struct CommandCatalog {
    commands: Vec<CommandSpec>,
    names: HashSet<String>,
}

impl CommandCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: CommandSpec) -> Result<(), CatalogError> {
        if !self.names.insert(command.name.clone()) {
            return Err(CatalogError::DuplicateName(command.name));
        }
        self.commands.push(command);
        Ok(())
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.iter().find(|cmd| cmd.name == name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Empty query: the full list in registration order. Otherwise keeps a
    /// command iff its name, label, or any keyword contains the query as a
    /// case-insensitive substring. No match is an empty list, never an error.
    pub fn filter(&self, query: &str) -> Vec<&CommandSpec> {
        if query.is_empty() {
            return self.commands.iter().collect();
        }
        let needle = query.to_lowercase();
        self.commands
            .iter()
            .filter(|cmd| cmd.matches(&needle))
            .collect()
    }

    /// The stock command set.
    pub fn stock() -> Self {
        let mut catalog = Self::new();
        for command in stock_commands() {
            catalog
                .register(command)
                .unwrap_or_else(|err| unreachable!("stock catalog must be valid: {err}"));
        }
        catalog
    }
}

/// The element containing the collapsed cursor: the cursor's node when it is
/// an element, otherwise its parent.
fn cursor_block(doc: &Document) -> Option<NodeKey> {
    let cursor = doc.collapsed_cursor()?;
    if doc.is_element(cursor.key) {
        Some(cursor.key)
    } else {
        doc.parent_key(cursor.key)
    }
}

/// Root-level index right after the block containing the cursor, falling back
/// to the end of the document.
fn insertion_index(doc: &Document, block: Option<NodeKey>) -> usize {
    block
        .and_then(|key| {
            let mut top = key;
            while let Some(parent) = doc.parent_key(top) {
                top = parent;
            }
            doc.index_in_parent(top).map(|ix| ix + 1)
        })
        .unwrap_or(doc.roots().len())
}

fn arg_str(args: &Option<Value>, field: &str) -> Option<String> {
    args.as_ref()
        .and_then(|v| v.get(field))
        .and_then(|v| v.as_str())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn stock_commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new("paragraph", "Paragraph", |doc, _args| {
            let Some(block) = cursor_block(doc) else {
                return Err(CommandError::new("No cursor block for paragraph"));
            };
            doc.perform_edit(|ed| ed.set_kind(block, "paragraph"))
                .map_err(|err| CommandError::new(format!("Failed to set paragraph: {err}")))
        })
        .description("Turn the current block into a plain paragraph.")
        .keywords(["text", "plain", "body"])
        .icon("paragraph"),
        CommandSpec::new("heading", "Heading", |doc, args| {
            let level = args
                .as_ref()
                .and_then(|v| v.get("level"))
                .and_then(|v| v.as_u64())
                .unwrap_or(1)
                .clamp(1, 3);
            let Some(block) = cursor_block(doc) else {
                return Err(CommandError::new("No cursor block for heading"));
            };
            doc.perform_edit(|ed| {
                ed.set_kind(block, "heading")?;
                ed.set_attr(block, "level", serde_json::json!(level))
            })
            .map_err(|err| CommandError::new(format!("Failed to set heading: {err}")))
        })
        .description("Turn the current block into a heading.")
        .keywords(["title", "h1", "h2", "h3"])
        .icon("heading"),
        CommandSpec::new("divider", "Divider", |doc, _args| {
            let at = insertion_index(doc, cursor_block(doc));
            doc.perform_edit(|ed| ed.insert_root_void_at(at, "divider").map(|_| ()))
                .map_err(|err| CommandError::new(format!("Failed to insert divider: {err}")))
        })
        .description("Insert a horizontal divider below the current block.")
        .keywords(["hr", "rule", "separator"])
        .icon("divider"),
        CommandSpec::new("table", "Table", |doc, args| {
            let rows = args
                .as_ref()
                .and_then(|v| v.get("rows"))
                .and_then(|v| v.as_u64())
                .unwrap_or(3);
            let cols = args
                .as_ref()
                .and_then(|v| v.get("cols"))
                .and_then(|v| v.as_u64())
                .unwrap_or(3);
            let at = insertion_index(doc, cursor_block(doc));
            doc.perform_edit(|ed| {
                let table = ed.insert_root_element_at(at, "table")?;
                ed.set_attr(table, "rows", serde_json::json!(rows))?;
                ed.set_attr(table, "cols", serde_json::json!(cols))?;
                for _ in 0..rows {
                    let row = ed.append_element(table, "table_row")?;
                    for _ in 0..cols {
                        let cell = ed.append_element(row, "table_cell")?;
                        ed.append_text(cell, "")?;
                    }
                }
                Ok(())
            })
            .map_err(|err: scribe_doc::EditError| {
                CommandError::new(format!("Failed to insert table: {err}"))
            })
        })
        .description("Insert a table below the current block.")
        .keywords(["grid", "rows", "cells"])
        .icon("table"),
        CommandSpec::new("image", "Image", |doc, args| {
            let src = arg_str(&args, "src").ok_or_else(|| CommandError::new("Missing args.src"))?;
            let at = insertion_index(doc, cursor_block(doc));
            doc.perform_edit(|ed| {
                let image = ed.insert_root_void_at(at, "image")?;
                ed.set_attr(image, "src", serde_json::json!(src))
            })
            .map_err(|err| CommandError::new(format!("Failed to insert image: {err}")))
        })
        .description("Insert an image from a URL.")
        .keywords(["img", "photo", "media"])
        .icon("image")
        .modal(ModalKind::UrlInput),
        CommandSpec::new("video", "Video", |doc, args| {
            let url = arg_str(&args, "url").ok_or_else(|| CommandError::new("Missing args.url"))?;
            let at = insertion_index(doc, cursor_block(doc));
            doc.perform_edit(|ed| {
                let video = ed.insert_root_void_at(at, "video")?;
                ed.set_attr(video, "url", serde_json::json!(url))
            })
            .map_err(|err| CommandError::new(format!("Failed to insert video: {err}")))
        })
        .description("Embed a video from a URL.")
        .keywords(["youtube", "vimeo", "embed"])
        .icon("video")
        .modal(ModalKind::UrlInput),
    ]
}
