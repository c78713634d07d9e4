use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::nav::Navigator;

/// How long a toast stays in the status area.
const TOAST_DURATION: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// The complete application state.
///
/// All state lives here; the store handle stays with [`crate::app::App`].
#[derive(Debug)]
pub struct Model {
    /// Navigation stack, one frame per column
    pub nav: Navigator,
    /// Focused column index
    pub focus: usize,
    /// Where the documents come from, shown in the status bar
    pub source_label: String,
    /// Terminal size (width, height)
    pub size: (u16, u16),
    /// Global config path shown in help
    pub config_global_path: Option<PathBuf>,
    /// Local override path shown in help
    pub config_local_path: Option<PathBuf>,
    /// Whether help overlay is visible
    pub help_visible: bool,
    toast: Option<Toast>,
    /// Whether the app should quit
    pub should_quit: bool,
    /// Set after first quit attempt with unsaved changes; allows second quit to proceed
    pub quit_confirmed: bool,
}

impl Default for Model {
    fn default() -> Self {
        Self::new(Navigator::default(), String::new(), (80, 24))
    }
}

impl Model {
    pub fn new(nav: Navigator, source_label: String, terminal_size: (u16, u16)) -> Self {
        Self {
            nav,
            focus: 0,
            source_label,
            size: terminal_size,
            config_global_path: None,
            config_local_path: None,
            help_visible: false,
            toast: None,
            should_quit: false,
            quit_confirmed: false,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.nav.editing_column().is_some()
    }

    /// Keep focus on an existing column after the stack shrinks.
    pub(super) fn clamp_focus(&mut self) {
        let last = self.nav.column_count().saturating_sub(1);
        self.focus = self.focus.min(last);
    }

    pub fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + TOAST_DURATION,
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}
