//! Drill-down navigation stack.
//!
//! Frame 0 is the server connection. Activating an item in a frame builds
//! the next frame first and only then discards everything to the right of
//! the activated column, so a failed activation leaves the stack as it was.
//! Every frame past the root was created by its parent's most recent
//! activation: `frames[i].origin() == frames[i - 1].activated()`.
//!
//! Columns are the frames from `offset` on. When the browser starts inside
//! a database the connection frame stays at index 0 but is not shown.

mod frame;

pub use frame::{Column, ColumnItem, EditState, EditView, Frame, FrameKind};

use frame::scroll_for;

use crate::codec::{self, DecodeError};
use crate::editor::EditField;
use crate::perf;
use crate::sequence::LazySequence;
use crate::store::{CollectionRef, Store, StoreError};
use crate::value::{Document, ID_FIELD, Node, PathError, PathSegment, Value, ValuePath};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("no column {0}")]
    NoSuchColumn(usize),
    #[error("no item {item} in column {column}")]
    NoSuchItem { column: usize, item: usize },
    #[error("`_id` cannot be edited")]
    ReadOnlyIdentifier,
    #[error("no document is open")]
    NoDocument,
    #[error("column {0} is not being edited")]
    NotEditing(usize),
}

/// Outcome of [`Navigator::activate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    /// A new frame was pushed to the right of the activated column.
    Descended,
    /// The identifier lookup missed; nothing was pushed.
    NotFound(Value),
    /// A scalar is now being edited in place.
    EditStarted,
    /// The edited text was decoded and written into the document.
    Committed(Value),
}

/// Optional field name and encoded text of one item.
type Entry = (Option<String>, String);

enum Step {
    Push(FrameKind),
    Edit { path: ValuePath, text: String },
    Miss(Value),
}

#[derive(Debug)]
pub struct Navigator {
    frames: Vec<Frame>,
    offset: usize,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            frames: vec![Frame::new(
                FrameKind::Connection {
                    databases: Vec::new(),
                },
                None,
            )],
            offset: 0,
        }
    }
}

impl Navigator {
    /// List the server's databases and, if `database` is given, open it.
    ///
    /// # Errors
    ///
    /// Fails when either listing fails; this is fatal at startup.
    pub fn connect(store: &dyn Store, database: Option<&str>) -> Result<Self, StoreError> {
        let _scope = perf::scope("nav.connect");
        let mut databases = store.list_databases()?;
        let Some(name) = database else {
            return Ok(Self {
                frames: vec![Frame::new(FrameKind::Connection { databases }, None)],
                offset: 0,
            });
        };
        let collections = store.list_collections(name)?;
        // An empty database may not be listed yet.
        let idx = databases
            .iter()
            .position(|db| db == name)
            .unwrap_or_else(|| {
                databases.push(name.to_string());
                databases.len() - 1
            });
        let mut root = Frame::new(FrameKind::Connection { databases }, None);
        root.selected = idx;
        root.activated = Some(idx);
        let database = Frame::new(
            FrameKind::Database {
                name: name.to_string(),
                collections,
            },
            Some(idx),
        );
        tracing::debug!(database = name, "opened database");
        Ok(Self {
            frames: vec![root, database],
            offset: 1,
        })
    }

    /// Number of frames, including a hidden connection frame.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Frames hidden to the left of column 0.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    pub fn column_count(&self) -> usize {
        self.frames.len() - self.offset
    }

    pub fn frame(&self, column: usize) -> Option<&Frame> {
        self.frames.get(self.offset + column)
    }

    pub fn selected(&self, column: usize) -> Option<usize> {
        self.frame(column).map(Frame::selected)
    }

    /// Activate `item` in `column`.
    ///
    /// Re-activating the item being edited commits the edit. Otherwise the
    /// transition is planned (which may block on the store), the stack is
    /// truncated to `column`, and the planned frame or edit is applied.
    ///
    /// # Errors
    ///
    /// Store failures, an identifier that does not decode, an out-of-range
    /// item, and editing `_id` all fail without changing the stack.
    pub fn activate(
        &mut self,
        store: &dyn Store,
        column: usize,
        item: usize,
    ) -> Result<Activation, NavError> {
        let idx = self.frame_index(column)?;
        if self.frames[idx]
            .edit
            .as_ref()
            .is_some_and(|edit| edit.item == item)
        {
            return self.commit_edit(column).map(Activation::Committed);
        }

        let step = self.plan(store, idx, column, item)?;
        self.frames.truncate(idx + 1);
        let frame = &mut self.frames[idx];
        frame.selected = item;
        frame.edit = None;
        tracing::debug!(column, item, kind = frame.kind.name(), "activate");
        Ok(match step {
            Step::Push(kind) => {
                frame.activated = Some(item);
                self.frames.push(Frame::new(kind, Some(item)));
                Activation::Descended
            }
            Step::Edit { path, text } => {
                frame.activated = Some(item);
                frame.edit = Some(EditState {
                    item,
                    path,
                    field: EditField::from_text(&text),
                });
                Activation::EditStarted
            }
            Step::Miss(id) => {
                frame.activated = None;
                Activation::NotFound(id)
            }
        })
    }

    fn plan(
        &mut self,
        store: &dyn Store,
        idx: usize,
        column: usize,
        item: usize,
    ) -> Result<Step, NavError> {
        let no_item = NavError::NoSuchItem { column, item };
        match &mut self.frames[idx].kind {
            FrameKind::Connection { databases } => {
                let name = databases.get(item).ok_or(no_item)?;
                let collections = {
                    let _scope = perf::scope("store.list_collections");
                    store.list_collections(name)?
                };
                return Ok(Step::Push(FrameKind::Database {
                    name: name.clone(),
                    collections,
                }));
            }
            FrameKind::Database { name, collections } => {
                let coll = collections.get(item).ok_or(no_item)?;
                let collection = CollectionRef::new(name.clone(), coll.clone());
                let cursor = store.open_cursor(&collection)?;
                return Ok(Step::Push(FrameKind::Collection {
                    collection,
                    documents: LazySequence::new(cursor),
                }));
            }
            FrameKind::Collection {
                collection,
                documents,
            } => {
                let doc = documents.at(item)?.ok_or(no_item)?;
                let label = doc
                    .id()
                    .map(codec::encode)
                    .ok_or(StoreError::MissingIdentifier)?;
                let id = codec::decode(&label)?;
                let found = {
                    let _scope = perf::scope("store.find_by_identifier");
                    store.find_by_identifier(collection, &id)?
                };
                return Ok(match found {
                    Some(document) => Step::Push(FrameKind::Document {
                        collection: collection.clone(),
                        document,
                        loaded_id: id,
                        modified: false,
                    }),
                    None => {
                        tracing::debug!(%collection, id = %label, "identifier lookup missed");
                        Step::Miss(id)
                    }
                });
            }
            FrameKind::Document { .. } | FrameKind::Nested { .. } => {}
        }
        self.plan_value(idx, column, item)
    }

    fn plan_value(&self, idx: usize, column: usize, item: usize) -> Result<Step, NavError> {
        let path = self.container_path(idx).ok_or(NavError::NoDocument)?;
        let document = self.root_document(idx)?;
        let (segment, value) = document
            .node_at(&path)?
            .entry(item)
            .ok_or(NavError::NoSuchItem { column, item })?;
        let child = path.child(segment);
        if value.is_container() {
            return Ok(Step::Push(FrameKind::Nested { path: child }));
        }
        if is_identifier(&child) {
            return Err(NavError::ReadOnlyIdentifier);
        }
        Ok(Step::Edit {
            text: codec::encode(value),
            path: child,
        })
    }

    /// Decode the edit text of `column` and write it into the document.
    ///
    /// # Errors
    ///
    /// On a decode failure the edit stays open with its text intact.
    pub fn commit_edit(&mut self, column: usize) -> Result<Value, NavError> {
        let idx = self.frame_index(column)?;
        let (path, text) = match &self.frames[idx].edit {
            Some(edit) => (edit.path.clone(), edit.field.text()),
            None => return Err(NavError::NotEditing(column)),
        };
        let value = codec::decode(&text)?;
        let root = self.document_index(idx).ok_or(NavError::NoDocument)?;
        let FrameKind::Document {
            document, modified, ..
        } = &mut self.frames[root].kind
        else {
            return Err(NavError::NoDocument);
        };
        let previous = document.set_at(&path, value.clone())?;
        if previous != value {
            *modified = true;
        }
        self.frames[idx].edit = None;
        tracing::debug!(%path, "committed edit");
        Ok(value)
    }

    /// Leave edit mode in `column`, discarding the edit text.
    ///
    /// Returns `false` if the column was not being edited.
    pub fn cancel_edit(&mut self, column: usize) -> bool {
        self.frames
            .get_mut(self.offset + column)
            .and_then(|frame| frame.edit.take())
            .is_some()
    }

    /// Column holding the open edit, if any.
    pub fn editing_column(&self) -> Option<usize> {
        self.frames
            .iter()
            .position(|frame| frame.edit.is_some())
            .and_then(|idx| idx.checked_sub(self.offset))
    }

    pub fn edit_field_mut(&mut self, column: usize) -> Option<&mut EditField> {
        self.frames
            .get_mut(self.offset + column)?
            .edit
            .as_mut()
            .map(|edit| &mut edit.field)
    }

    /// Persist the open document as a whole.
    ///
    /// The stored copy always carries the identifier the document was
    /// loaded with. On success the in-memory tree is replaced by what the
    /// codec reads back from the stored form and the modified flag clears.
    ///
    /// # Errors
    ///
    /// [`NavError::NoDocument`] when no document is open, or the store
    /// failure; the tree and its modified flag are then left untouched.
    pub fn save(&mut self, store: &dyn Store) -> Result<(), NavError> {
        let _scope = perf::scope("nav.save");
        let Some((collection, document, loaded_id, modified)) =
            self.frames.iter_mut().find_map(|frame| match &mut frame.kind {
                FrameKind::Document {
                    collection,
                    document,
                    loaded_id,
                    modified,
                } => Some((collection, document, loaded_id, modified)),
                _ => None,
            })
        else {
            return Err(NavError::NoDocument);
        };

        let mut outgoing = document.clone();
        outgoing.insert(ID_FIELD, loaded_id.clone());
        store.replace_whole(collection, &outgoing)?;
        match codec::decode(&codec::encode(&Value::Document(outgoing))) {
            Ok(Value::Document(stored)) => *document = stored,
            Ok(other) => tracing::warn!(kind = other.type_name(), "saved document read back as another type"),
            Err(err) => tracing::warn!(%err, "saved document does not read back"),
        }
        *modified = false;
        tracing::debug!(%collection, "saved document");
        Ok(())
    }

    /// The open document, if any.
    pub fn document(&self) -> Option<&Document> {
        self.frames.iter().find_map(|frame| match &frame.kind {
            FrameKind::Document { document, .. } => Some(document),
            _ => None,
        })
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.frames
            .iter()
            .any(|frame| matches!(frame.kind, FrameKind::Document { modified: true, .. }))
    }

    /// Move the selection down one item.
    ///
    /// In a collection column this may pull the next document from the
    /// cursor. Returns whether the selection moved.
    ///
    /// # Errors
    ///
    /// Fails on an unknown column or a cursor failure.
    pub fn select_next(&mut self, column: usize) -> Result<bool, NavError> {
        let idx = self.frame_index(column)?;
        let next = self.frames[idx].selected + 1;
        let exists = match &mut self.frames[idx].kind {
            FrameKind::Collection { documents, .. } => documents.at(next)?.is_some(),
            _ => next < self.item_count(idx),
        };
        if exists {
            self.frames[idx].selected = next;
        }
        Ok(exists)
    }

    /// Move the selection up one item. Returns whether it moved.
    ///
    /// # Errors
    ///
    /// Fails on an unknown column.
    pub fn select_prev(&mut self, column: usize) -> Result<bool, NavError> {
        let idx = self.frame_index(column)?;
        let frame = &mut self.frames[idx];
        if frame.selected == 0 {
            return Ok(false);
        }
        frame.selected -= 1;
        Ok(true)
    }

    /// Move the selection to the first item.
    ///
    /// # Errors
    ///
    /// Fails on an unknown column.
    pub fn select_first(&mut self, column: usize) -> Result<(), NavError> {
        let idx = self.frame_index(column)?;
        self.frames[idx].selected = 0;
        Ok(())
    }

    /// Render tree: one column per visible frame with at most `rows` items
    /// each, scrolled so the selection is visible.
    pub fn columns(&mut self, rows: usize) -> Vec<Column> {
        let rows = rows.max(1);
        (self.offset..self.frames.len())
            .map(|idx| self.column(idx, rows))
            .collect()
    }

    fn column(&mut self, idx: usize, rows: usize) -> Column {
        let mut error = None;
        let frame = &mut self.frames[idx];
        frame.scroll = scroll_for(frame.selected, frame.scroll, rows);
        let first = frame.scroll;
        if let FrameKind::Collection { documents, .. } = &mut frame.kind
            && let Err(err) = documents.at(first + rows - 1)
        {
            tracing::warn!(%err, "cursor failed while listing documents");
            error = Some(err.to_string());
        }

        let entries = match self.entries(idx, first, rows) {
            Ok(entries) => entries,
            Err(err) => {
                error = Some(err.to_string());
                Vec::new()
            }
        };
        let frame = &self.frames[idx];
        let items = entries
            .into_iter()
            .enumerate()
            .map(|(offset, (key, text))| {
                let index = first + offset;
                let editing = frame
                    .edit
                    .as_ref()
                    .filter(|edit| edit.item == index)
                    .map(|edit| EditView {
                        text: edit.field.text(),
                        before_cursor: edit.field.text_before_cursor(),
                    });
                ColumnItem {
                    index,
                    key,
                    text,
                    selected: index == frame.selected,
                    activated: frame.activated == Some(index),
                    editing,
                }
            })
            .collect();

        Column {
            title: self.title(idx),
            kind: frame.kind.name(),
            items,
            first,
            selected: frame.selected,
            modified: self.document_index(idx).is_some_and(|root| {
                matches!(self.frames[root].kind, FrameKind::Document { modified: true, .. })
            }),
            error,
        }
    }

    fn entries(
        &self,
        idx: usize,
        first: usize,
        rows: usize,
    ) -> Result<Vec<Entry>, NavError> {
        let listed = |names: &[String]| -> Vec<Entry> {
            names
                .iter()
                .skip(first)
                .take(rows)
                .map(|name| (None, name.clone()))
                .collect()
        };
        Ok(match &self.frames[idx].kind {
            FrameKind::Connection { databases } => listed(databases.as_slice()),
            FrameKind::Database { collections, .. } => listed(collections.as_slice()),
            FrameKind::Collection { documents, .. } => documents
                .cached()
                .iter()
                .enumerate()
                .skip(first)
                .take(rows)
                .map(|(position, doc)| (None, document_label(doc, position)))
                .collect(),
            FrameKind::Document { .. } | FrameKind::Nested { .. } => {
                let node = self.node(idx)?;
                (first..node.len().min(first + rows))
                    .filter_map(|i| node.entry(i))
                    .map(|(segment, value)| match segment {
                        PathSegment::Field(key) => (Some(key), codec::encode(value)),
                        PathSegment::Index(_) => (None, codec::encode(value)),
                    })
                    .collect()
            }
        })
    }

    fn title(&self, idx: usize) -> String {
        match &self.frames[idx].kind {
            FrameKind::Connection { .. } => "databases".to_string(),
            FrameKind::Database { name, .. } => name.clone(),
            FrameKind::Collection { collection, .. } => collection.name.clone(),
            FrameKind::Document { loaded_id, .. } => codec::encode(loaded_id),
            FrameKind::Nested { path } => path.to_string(),
        }
    }

    /// Database, collection, document and nested path of the deepest frame.
    pub fn breadcrumb(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        for (idx, frame) in self.frames.iter().enumerate() {
            match frame.kind {
                FrameKind::Connection { .. } => {}
                FrameKind::Nested { .. } => {
                    if idx + 1 == self.frames.len() {
                        parts.push(self.title(idx));
                    }
                }
                _ => parts.push(self.title(idx)),
            }
        }
        parts.join(" / ")
    }

    fn item_count(&self, idx: usize) -> usize {
        match &self.frames[idx].kind {
            FrameKind::Connection { databases } => databases.len(),
            FrameKind::Database { collections, .. } => collections.len(),
            FrameKind::Collection { documents, .. } => documents.cached_len(),
            FrameKind::Document { .. } | FrameKind::Nested { .. } => {
                self.node(idx).map_or(0, |node| node.len())
            }
        }
    }

    fn frame_index(&self, column: usize) -> Result<usize, NavError> {
        let idx = self.offset + column;
        if idx < self.frames.len() {
            Ok(idx)
        } else {
            Err(NavError::NoSuchColumn(column))
        }
    }

    /// Nearest `Document` frame at or before `idx`.
    fn document_index(&self, idx: usize) -> Option<usize> {
        (0..=idx)
            .rev()
            .find(|&i| matches!(self.frames[i].kind, FrameKind::Document { .. }))
    }

    fn root_document(&self, idx: usize) -> Result<&Document, NavError> {
        let root = self.document_index(idx).ok_or(NavError::NoDocument)?;
        match &self.frames[root].kind {
            FrameKind::Document { document, .. } => Ok(document),
            _ => Err(NavError::NoDocument),
        }
    }

    fn container_path(&self, idx: usize) -> Option<ValuePath> {
        match &self.frames[idx].kind {
            FrameKind::Document { .. } => Some(ValuePath::root()),
            FrameKind::Nested { path } => Some(path.clone()),
            _ => None,
        }
    }

    fn node(&self, idx: usize) -> Result<Node<'_>, NavError> {
        let path = self.container_path(idx).ok_or(NavError::NoDocument)?;
        Ok(self.root_document(idx)?.node_at(&path)?)
    }
}

fn is_identifier(path: &ValuePath) -> bool {
    matches!(path.segments(), [PathSegment::Field(name)] if name == ID_FIELD)
}

/// Collection column label: the encoded `_id`, else `name`, else the position.
fn document_label(doc: &Document, position: usize) -> String {
    doc.id()
        .or_else(|| doc.get("name"))
        .map_or_else(|| format!("#{position}"), codec::encode)
}
