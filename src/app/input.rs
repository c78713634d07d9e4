use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Frame;

use crate::app::{App, Message, Model};

impl App {
    pub(super) fn handle_event(event: &Event, model: &Model) -> Option<Message> {
        match event {
            Event::Key(key) => Self::handle_key(*key, model),
            Event::Resize(width, height) => Some(Message::Resize(*width, *height)),
            _ => None,
        }
    }

    /// Map a key press to a message; `None` leaves the key unconsumed.
    pub fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(Message::Interrupt);
        }
        if model.help_visible {
            return Some(Message::HideHelp);
        }
        if model.is_editing() {
            return Self::handle_edit_key(key);
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => Some(Message::SelectDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Message::SelectUp),
            KeyCode::Char('h') | KeyCode::Left => Some(Message::FocusLeft),
            KeyCode::Char('l') | KeyCode::Right => Some(Message::FocusRight),
            KeyCode::Char('g') | KeyCode::Home => Some(Message::SelectFirst),
            KeyCode::Enter | KeyCode::Char(' ') => Some(Message::Activate),
            KeyCode::Char('s') => Some(Message::Save),
            KeyCode::Char('?') | KeyCode::F(1) => Some(Message::ToggleHelp),
            KeyCode::Char('q') => Some(Message::Quit),
            _ => None,
        }
    }

    fn handle_edit_key(key: KeyEvent) -> Option<Message> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => Some(Message::Activate),
            KeyCode::Esc => Some(Message::CancelEdit),
            KeyCode::Backspace => Some(Message::EditBackspace),
            KeyCode::Delete => Some(Message::EditDelete),
            KeyCode::Left if ctrl => Some(Message::EditWordLeft),
            KeyCode::Right if ctrl => Some(Message::EditWordRight),
            KeyCode::Left => Some(Message::EditMoveLeft),
            KeyCode::Right => Some(Message::EditMoveRight),
            KeyCode::Home => Some(Message::EditMoveHome),
            KeyCode::End => Some(Message::EditMoveEnd),
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                Some(Message::EditInsert(c))
            }
            _ => None,
        }
    }

    pub(super) fn view(model: &mut Model, frame: &mut Frame) {
        crate::ui::render(model, frame);
    }
}
