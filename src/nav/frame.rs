use crate::editor::EditField;
use crate::sequence::LazySequence;
use crate::store::CollectionRef;
use crate::value::{Document, Value, ValuePath};

/// What a column shows and what activating one of its items does.
#[derive(Debug)]
pub enum FrameKind {
    /// Database names on the server.
    Connection { databases: Vec<String> },
    /// Collection names in one database.
    Database {
        name: String,
        collections: Vec<String>,
    },
    /// Documents of one collection, pulled on demand.
    Collection {
        collection: CollectionRef,
        documents: LazySequence,
    },
    /// A loaded document. Owns the tree every deeper frame points into.
    Document {
        collection: CollectionRef,
        document: Document,
        /// Identifier the document was looked up by; saves replace by it.
        loaded_id: Value,
        modified: bool,
    },
    /// A list or sub-document inside the nearest `Document` frame.
    Nested { path: ValuePath },
}

impl FrameKind {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "connection",
            Self::Database { .. } => "database",
            Self::Collection { .. } => "collection",
            Self::Document { .. } => "document",
            Self::Nested { .. } => "nested",
        }
    }
}

/// In-place edit of one scalar item.
#[derive(Debug)]
pub struct EditState {
    pub(super) item: usize,
    pub(super) path: ValuePath,
    pub(super) field: EditField,
}

impl EditState {
    pub const fn item(&self) -> usize {
        self.item
    }

    /// Where the committed value will be written.
    pub const fn path(&self) -> &ValuePath {
        &self.path
    }

    pub const fn field(&self) -> &EditField {
        &self.field
    }
}

/// One level of the navigation stack, rendered as one column.
#[derive(Debug)]
pub struct Frame {
    pub(super) kind: FrameKind,
    pub(super) origin: Option<usize>,
    pub(super) selected: usize,
    pub(super) activated: Option<usize>,
    pub(super) scroll: usize,
    pub(super) edit: Option<EditState>,
}

impl Frame {
    pub(super) const fn new(kind: FrameKind, origin: Option<usize>) -> Self {
        Self {
            kind,
            origin,
            selected: 0,
            activated: None,
            scroll: 0,
            edit: None,
        }
    }

    pub const fn kind(&self) -> &FrameKind {
        &self.kind
    }

    /// Index of the parent item whose activation created this frame.
    pub const fn origin(&self) -> Option<usize> {
        self.origin
    }

    pub const fn selected(&self) -> usize {
        self.selected
    }

    /// The item most recently activated in this frame.
    pub const fn activated(&self) -> Option<usize> {
        self.activated
    }

    pub const fn scroll(&self) -> usize {
        self.scroll
    }

    pub const fn edit(&self) -> Option<&EditState> {
        self.edit.as_ref()
    }
}

/// Render-ready view of one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub title: String,
    pub kind: &'static str,
    /// Items from `first` on, at most the requested number of rows.
    pub items: Vec<ColumnItem>,
    pub first: usize,
    pub selected: usize,
    /// Set when the document this column shows has unsaved edits.
    pub modified: bool,
    /// Failure while pulling items for this column.
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnItem {
    pub index: usize,
    /// Field name for document entries.
    pub key: Option<String>,
    pub text: String,
    pub selected: bool,
    pub activated: bool,
    pub editing: Option<EditView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditView {
    pub text: String,
    pub before_cursor: String,
}

/// Keep `selected` inside a window of `rows` starting at the returned offset.
pub(super) const fn scroll_for(selected: usize, scroll: usize, rows: usize) -> usize {
    if selected < scroll {
        selected
    } else if selected >= scroll + rows {
        selected + 1 - rows
    } else {
        scroll
    }
}
