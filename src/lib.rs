// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. store::StoreError)
    clippy::module_name_repetitions
)]

//! # docnav
//!
//! A terminal column browser and editor for document databases.
//!
//! Each level of the hierarchy gets a column: databases, collections,
//! documents, then nested lists and sub-documents. Scalars are edited in
//! place as extended-value text and whole documents are written back.
//!
//! ## Architecture
//!
//! docnav uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`app`]: Main application loop and state
//! - [`codec`]: Extended-value text encoding and decoding
//! - [`nav`]: Drill-down navigation stack
//! - [`sequence`]: Lazily pulled document cursor
//! - [`store`]: Document store trait, in-memory and server-backed stores
//! - [`value`]: Document tree and paths into it
//! - [`editor`]: Single-line edit field
//! - [`ui`]: Terminal UI components
//! - [`config`]: Saved default flags

pub mod app;
pub mod codec;
pub mod config;
pub mod editor;
pub mod nav;
pub mod perf;
pub mod sequence;
pub mod store;
pub mod ui;
pub mod value;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::codec::{DecodeError, decode, encode};
    pub use crate::nav::{Activation, NavError, Navigator};
    pub use crate::store::{CollectionRef, MemoryStore, Store, StoreError};
    pub use crate::value::{Document, Value, ValuePath};
}
