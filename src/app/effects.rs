use crate::app::{App, Message, Model, ToastLevel};
use crate::codec;
use crate::nav::{Activation, NavError};

impl App {
    pub(super) fn handle_message_side_effects(&self, model: &mut Model, msg: &Message) {
        match msg {
            Message::Activate => self.activate_selected(model),
            Message::Save => self.save_document(model),
            _ => {}
        }
    }

    fn activate_selected(&self, model: &mut Model) {
        // An open edit commits no matter which column has focus.
        let target = model
            .nav
            .editing_column()
            .and_then(|column| {
                let frame = model.nav.frame(column)?;
                Some((column, frame.edit()?.item()))
            })
            .or_else(|| {
                let item = model.nav.selected(model.focus)?;
                Some((model.focus, item))
            });
        let Some((column, item)) = target else {
            return;
        };

        match model.nav.activate(self.store.as_ref(), column, item) {
            Ok(Activation::Descended) => {
                model.focus = column + 1;
            }
            Ok(Activation::NotFound(id)) => {
                model.show_toast(
                    ToastLevel::Warning,
                    format!("No document with _id {}", codec::encode(&id)),
                );
            }
            Ok(Activation::EditStarted) => {
                model.focus = column;
            }
            Ok(Activation::Committed(value)) => {
                model.show_toast(
                    ToastLevel::Info,
                    format!("Set to {}", codec::encode(&value)),
                );
            }
            Err(err) => {
                tracing::warn!(%err, column, item, "activation failed");
                let level = match err {
                    NavError::Decode(_) | NavError::ReadOnlyIdentifier => ToastLevel::Warning,
                    _ => ToastLevel::Error,
                };
                model.show_toast(level, err.to_string());
            }
        }
        model.clamp_focus();
    }

    fn save_document(&self, model: &mut Model) {
        match model.nav.save(self.store.as_ref()) {
            Ok(()) => {
                model.show_toast(ToastLevel::Info, "Saved");
                if model.quit_confirmed {
                    model.should_quit = true;
                }
            }
            Err(NavError::NoDocument) => {
                model.show_toast(ToastLevel::Warning, "No document to save");
            }
            Err(err) => {
                tracing::warn!(%err, "save failed");
                model.show_toast(ToastLevel::Error, format!("Save failed: {err}"));
            }
        }
    }
}
