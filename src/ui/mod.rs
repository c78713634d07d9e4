//! Terminal UI components.
//!
//! - [`render`]: Miller columns for the navigation stack
//! - status and toast bars along the bottom
//! - the help overlay

mod overlays;
mod render;
mod status;

pub use render::{MIN_COLUMN_WIDTH, column_window, render};

#[cfg(test)]
mod tests;
