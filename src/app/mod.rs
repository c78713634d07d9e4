//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering
//!
//! Messages that reach the store (`Activate`, `Save`) are carried out by the
//! side-effect handler after `update`, since only [`App`] holds the store.

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{Model, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;

use crate::nav::Navigator;
use crate::store::{Store, StoreError};

/// Owns the store connection and runs the event loop.
pub struct App {
    store: Box<dyn Store>,
    database: Option<String>,
    source_label: String,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    /// Create a new application browsing `store`.
    pub fn new(store: Box<dyn Store>, source_label: impl Into<String>) -> Self {
        Self {
            store,
            database: None,
            source_label: source_label.into(),
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// Start inside `database` instead of at the database list.
    pub fn with_database(mut self, database: Option<String>) -> Self {
        self.database = database;
        self
    }

    /// Set config paths to show in help.
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Build the initial navigation stack.
    ///
    /// # Errors
    ///
    /// Fails when the store cannot list databases or the requested
    /// database's collections.
    pub fn connect(&self) -> Result<Navigator, StoreError> {
        Navigator::connect(self.store.as_ref(), self.database.as_deref())
    }

    /// Initial model for `nav` on a terminal of `size`.
    pub fn model(&self, nav: Navigator, size: (u16, u16)) -> Model {
        let mut model = Model::new(nav, self.source_label.clone(), size);
        model
            .config_global_path
            .clone_from(&self.config_global_path);
        model.config_local_path.clone_from(&self.config_local_path);
        model
    }

    /// Apply `msg`: the pure update, then its side effects.
    pub fn dispatch(&self, model: &mut Model, msg: Message) {
        let side_msg = msg.clone();
        *model = update(std::mem::take(model), msg);
        self.handle_message_side_effects(model, &side_msg);
    }
}
