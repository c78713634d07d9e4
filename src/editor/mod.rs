//! In-place value editing.
//!
//! Provides a rope-backed single-line field with cursor management, used
//! while a scalar value is being edited in its column.

mod field;

pub use field::EditField;
