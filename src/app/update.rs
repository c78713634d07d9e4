use crate::app::{Model, ToastLevel};
use crate::editor::EditField;
use crate::nav::NavError;

/// All possible events and actions in the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Navigation
    /// Move the selection in the focused column up
    SelectUp,
    /// Move the selection in the focused column down
    SelectDown,
    /// Jump to the first item of the focused column
    SelectFirst,
    /// Focus the column to the left
    FocusLeft,
    /// Focus the column to the right
    FocusRight,
    /// Activate the selected item (descend, start or commit an edit)
    Activate,

    // Document
    /// Write the open document back to the store
    Save,

    // Editor
    /// Leave edit mode discarding the text
    CancelEdit,
    /// Insert a character at the cursor
    EditInsert(char),
    /// Delete character before cursor (Backspace)
    EditBackspace,
    /// Delete character at cursor (Delete)
    EditDelete,
    EditMoveLeft,
    EditMoveRight,
    EditMoveHome,
    EditMoveEnd,
    /// Move cursor one word left (Ctrl+Left)
    EditWordLeft,
    /// Move cursor one word right (Ctrl+Right)
    EditWordRight,

    // Help
    ToggleHelp,
    HideHelp,

    // Window
    /// Terminal resized
    Resize(u16, u16),

    // Application
    /// Quit, asking for confirmation when there are unsaved changes
    Quit,
    /// Ctrl-C: quit immediately
    Interrupt,
}

/// Pure function that updates the model based on a message.
///
/// Store-touching messages (`Activate`, `Save`) only reset confirmation
/// state here; their work happens in the side-effect handler.
pub fn update(mut model: Model, msg: Message) -> Model {
    // Reset confirmation on any action other than the confirmed one.
    // Save preserves it so `s` can complete a pending quit.
    if !matches!(msg, Message::Quit | Message::Save) {
        model.quit_confirmed = false;
    }

    match msg {
        Message::SelectUp => {
            let result = model.nav.select_prev(model.focus);
            report(&mut model, result);
        }
        Message::SelectDown => {
            let result = model.nav.select_next(model.focus);
            report(&mut model, result);
        }
        Message::SelectFirst => {
            let result = model.nav.select_first(model.focus);
            report(&mut model, result);
        }
        Message::FocusLeft => {
            model.focus = model.focus.saturating_sub(1);
        }
        Message::FocusRight => {
            model.focus += 1;
            model.clamp_focus();
        }
        // Activate/Save: handled in effects
        Message::Activate | Message::Save => {}

        Message::CancelEdit => {
            if let Some(column) = model.nav.editing_column() {
                model.nav.cancel_edit(column);
            }
        }
        Message::EditInsert(ch) => edit(&mut model, |field| field.insert_char(ch)),
        Message::EditBackspace => edit(&mut model, |field| {
            field.delete_back();
        }),
        Message::EditDelete => edit(&mut model, |field| {
            field.delete_forward();
        }),
        Message::EditMoveLeft => edit(&mut model, EditField::move_left),
        Message::EditMoveRight => edit(&mut model, EditField::move_right),
        Message::EditMoveHome => edit(&mut model, EditField::move_home),
        Message::EditMoveEnd => edit(&mut model, EditField::move_end),
        Message::EditWordLeft => edit(&mut model, EditField::move_word_left),
        Message::EditWordRight => edit(&mut model, EditField::move_word_right),

        Message::ToggleHelp => {
            model.help_visible = !model.help_visible;
        }
        Message::HideHelp => {
            model.help_visible = false;
        }
        Message::Resize(width, height) => {
            model.size = (width, height);
        }

        Message::Quit => {
            if model.nav.has_unsaved_changes() && !model.quit_confirmed {
                model.show_toast(
                    ToastLevel::Warning,
                    "Unsaved changes! Press q again to quit, or s to save",
                );
                model.quit_confirmed = true;
            } else {
                model.should_quit = true;
            }
        }
        Message::Interrupt => {
            model.should_quit = true;
        }
    }
    model
}

fn edit(model: &mut Model, f: impl FnOnce(&mut EditField)) {
    if let Some(column) = model.nav.editing_column()
        && let Some(field) = model.nav.edit_field_mut(column)
    {
        f(field);
    }
}

fn report<T>(model: &mut Model, result: Result<T, NavError>) {
    if let Err(err) = result {
        tracing::warn!(%err, "selection failed");
        model.show_toast(ToastLevel::Error, err.to_string());
    }
}
