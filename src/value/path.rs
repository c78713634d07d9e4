use std::fmt;

use super::{Document, Value};

/// One step from a container to a child value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(idx) => write!(f, "[{idx}]"),
        }
    }
}

/// Address of a value inside a root document.
///
/// The empty path addresses the root document itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValuePath {
    segments: Vec<PathSegment>,
}

impl ValuePath {
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    #[must_use]
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 && matches!(segment, PathSegment::Field(_)) {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl From<Vec<PathSegment>> for ValuePath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("no field `{0}`")]
    MissingField(String),
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("`{0}` does not address a document or list")]
    NotAContainer(String),
    #[error("cannot assign to the document root")]
    Root,
}

/// Borrowed view of a container inside a document tree.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Document(&'a Document),
    List(&'a [Value]),
}

impl<'a> Node<'a> {
    pub fn len(&self) -> usize {
        match self {
            Self::Document(doc) => doc.len(),
            Self::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The segment and value at a display position.
    pub fn entry(self, idx: usize) -> Option<(PathSegment, &'a Value)> {
        match self {
            Self::Document(doc) => doc
                .field_at(idx)
                .map(|(key, value)| (PathSegment::Field(key.to_string()), value)),
            Self::List(items) => items.get(idx).map(|value| (PathSegment::Index(idx), value)),
        }
    }

    fn child(self, segment: &PathSegment) -> Result<&'a Value, PathError> {
        match (self, segment) {
            (Self::Document(doc), PathSegment::Field(name)) => doc
                .get(name)
                .ok_or_else(|| PathError::MissingField(name.clone())),
            (Self::List(items), PathSegment::Index(index)) => {
                items.get(*index).ok_or(PathError::IndexOutOfRange {
                    index: *index,
                    len: items.len(),
                })
            }
            _ => Err(PathError::NotAContainer(segment.to_string())),
        }
    }
}

impl Document {
    /// Resolve a path to the container it addresses.
    ///
    /// # Errors
    ///
    /// Fails if a segment is missing or addresses a scalar.
    pub fn node_at(&self, path: &ValuePath) -> Result<Node<'_>, PathError> {
        let mut node = Node::Document(self);
        for segment in path.segments() {
            node = match node.child(segment)? {
                Value::Document(doc) => Node::Document(doc),
                Value::List(items) => Node::List(items),
                _ => return Err(PathError::NotAContainer(path.to_string())),
            };
        }
        Ok(node)
    }

    /// Resolve a non-empty path to the value it addresses.
    ///
    /// # Errors
    ///
    /// Fails on the empty path or when any segment does not resolve.
    pub fn value_at(&self, path: &ValuePath) -> Result<&Value, PathError> {
        let Some((last, parents)) = path.segments().split_last() else {
            return Err(PathError::Root);
        };
        self.node_at(&ValuePath::from(parents.to_vec()))?.child(last)
    }

    /// Replace the value at `path`, returning what was there.
    ///
    /// # Errors
    ///
    /// Fails on the empty path, on a missing parent, or when the final
    /// segment does not fit its container (field on a list, index past the end).
    pub fn set_at(&mut self, path: &ValuePath, value: Value) -> Result<Value, PathError> {
        let Some((last, parents)) = path.segments().split_last() else {
            return Err(PathError::Root);
        };
        let slot = match parents.split_first() {
            None => match last {
                PathSegment::Field(name) => self
                    .get_mut(name)
                    .ok_or_else(|| PathError::MissingField(name.clone()))?,
                PathSegment::Index(_) => return Err(PathError::NotAContainer(path.to_string())),
            },
            Some((first, rest)) => {
                let mut current = root_child_mut(self, first)?;
                for segment in rest {
                    current = child_mut(current, segment)?;
                }
                child_mut(current, last)?
            }
        };
        Ok(std::mem::replace(slot, value))
    }
}

fn root_child_mut<'a>(doc: &'a mut Document, segment: &PathSegment) -> Result<&'a mut Value, PathError> {
    match segment {
        PathSegment::Field(name) => doc
            .get_mut(name)
            .ok_or_else(|| PathError::MissingField(name.clone())),
        PathSegment::Index(_) => Err(PathError::NotAContainer(segment.to_string())),
    }
}

fn child_mut<'a>(value: &'a mut Value, segment: &PathSegment) -> Result<&'a mut Value, PathError> {
    match (value, segment) {
        (Value::Document(doc), PathSegment::Field(_)) => root_child_mut(doc, segment),
        (Value::List(items), PathSegment::Index(index)) => {
            let len = items.len();
            items
                .get_mut(*index)
                .ok_or(PathError::IndexOutOfRange { index: *index, len })
        }
        _ => Err(PathError::NotAContainer(segment.to_string())),
    }
}
